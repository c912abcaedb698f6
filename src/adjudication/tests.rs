use super::generator::strip_code_fence;
use super::*;
use crate::candidates::{Candidate, CandidateScores};
use crate::taxonomy::fixture_taxonomy;

use std::sync::Arc;
use std::time::Duration;

const SODAS: &str = "01-010-101-101";
const EAUX: &str = "01-010-101-102";
const LESSIVE: &str = "03-030-301-601";

fn item(id: &str, keys: &[&str]) -> AdjudicationInputItem {
    let taxonomy = fixture_taxonomy();
    let candidates = keys
        .iter()
        .enumerate()
        .map(|(i, key)| {
            let fused = 1.0 - i as f32 * 0.25;
            Candidate::from_leaf(
                taxonomy.leaf(key).unwrap(),
                CandidateScores {
                    lexical: fused,
                    cosine: fused,
                    fused,
                },
            )
        })
        .collect();
    AdjudicationInputItem {
        id: id.to_string(),
        title_normalized: format!("title {id}"),
        candidates,
    }
}

fn items(n: usize) -> Vec<AdjudicationInputItem> {
    (0..n)
        .map(|i| item(&format!("item-{i}"), &[SODAS, EAUX, LESSIVE]))
        .collect()
}

fn fast_config() -> AdjudicatorConfig {
    AdjudicatorConfig::default()
        .with_model("mock-model")
        .with_retries(2, Duration::from_millis(1))
}

#[tokio::test]
async fn test_every_item_gets_a_verdict_in_order() {
    let generator = Arc::new(MockStructuredGenerator::new(MockBehavior::PickRank(1)));
    let adjudicator = Adjudicator::new(generator.clone(), fast_config());

    let input = items(60);
    let report = adjudicator.adjudicate(&input).await;

    assert_eq!(report.results.len(), 60);
    for (given, got) in input.iter().zip(&report.results) {
        assert_eq!(given.id, got.id);
        assert_eq!(got.rank(), 1);
        assert_eq!(got.candidate().unwrap().leaf_key, SODAS);
    }
    // 60 items in batches of 25
    assert_eq!(generator.calls(), 3);
    assert_eq!(report.calls, 3);
    assert_eq!(report.usage.input, 60 * MockStructuredGenerator::INPUT_TOKENS_PER_ITEM);
    assert_eq!(report.usage.output, 60 * MockStructuredGenerator::OUTPUT_TOKENS_PER_ITEM);
    assert_eq!(report.usage.total, report.usage.input + report.usage.output);
}

#[tokio::test]
async fn test_chosen_rank_follows_candidate_position() {
    let generator = Arc::new(MockStructuredGenerator::new(MockBehavior::PickRank(3)));
    let adjudicator = Adjudicator::new(generator, fast_config());

    let report = adjudicator.adjudicate(&items(2)).await;
    for result in &report.results {
        assert_eq!(result.rank(), 3);
        assert_eq!(result.candidate().unwrap().leaf_key, LESSIVE);
    }
}

#[tokio::test]
async fn test_in_flight_calls_reach_but_never_exceed_concurrency() {
    for concurrency in [1, 2, 3] {
        let generator = Arc::new(
            MockStructuredGenerator::new(MockBehavior::PickRank(1))
                .with_delay(Duration::from_millis(15)),
        );
        let config = fast_config()
            .with_batch_size(1)
            .with_concurrency(concurrency);
        let adjudicator = Adjudicator::new(generator.clone(), config);

        let report = adjudicator.adjudicate(&items(12)).await;

        assert_eq!(report.results.len(), 12);
        assert_eq!(generator.calls(), 12);
        assert_eq!(
            generator.max_in_flight(),
            concurrency,
            "in-flight peak should reach the cap of {concurrency}"
        );
    }
}

#[tokio::test]
async fn test_hallucinated_leaf_is_unresolved() {
    let generator = Arc::new(MockStructuredGenerator::new(MockBehavior::Hallucinate));
    let adjudicator = Adjudicator::new(generator, fast_config());

    let report = adjudicator.adjudicate(&items(3)).await;
    for result in &report.results {
        assert_eq!(result.rank(), 0);
        assert!(matches!(
            &result.verdict,
            Verdict::Unresolved {
                reason: UnresolvedReason::NotAmongCandidates { sous_famille_code, .. }
            } if sous_famille_code == "999"
        ));
    }
}

#[tokio::test]
async fn test_omitted_ids_are_unresolved() {
    let generator = Arc::new(MockStructuredGenerator::new(MockBehavior::DropAllButFirst));
    let adjudicator = Adjudicator::new(generator, fast_config().with_batch_size(2));

    let report = adjudicator.adjudicate(&items(4)).await;
    let ranks: Vec<usize> = report.results.iter().map(AdjudicatedItem::rank).collect();
    assert_eq!(ranks, vec![1, 0, 1, 0]);
    assert!(matches!(
        report.results[1].verdict,
        Verdict::Unresolved {
            reason: UnresolvedReason::MissingFromResponse
        }
    ));
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let generator =
        Arc::new(MockStructuredGenerator::new(MockBehavior::PickRank(1)).failing_first(2));
    let adjudicator = Adjudicator::new(generator.clone(), fast_config());

    let report = adjudicator.adjudicate(&items(5)).await;
    assert!(report.results.iter().all(|r| r.rank() == 1));
    assert_eq!(generator.calls(), 3);
    assert_eq!(report.calls, 3);
}

#[tokio::test]
async fn test_exhausted_retries_mark_batch_unresolved() {
    let generator = Arc::new(MockStructuredGenerator::new(MockBehavior::Fail));
    let config = fast_config()
        .with_batch_size(2)
        .with_retries(1, Duration::from_millis(1));
    let adjudicator = Adjudicator::new(generator.clone(), config);

    let report = adjudicator.adjudicate(&items(4)).await;
    assert_eq!(report.results.len(), 4);
    for result in &report.results {
        assert!(matches!(
            &result.verdict,
            Verdict::Unresolved {
                reason: UnresolvedReason::ProviderFailed { error }
            } if error.contains("mock outage")
        ));
    }
    // two batches, two attempts each
    assert_eq!(generator.calls(), 4);
    assert_eq!(report.usage, TokenUsage::default());
}

#[tokio::test]
async fn test_schema_mismatch_is_retried_then_unresolved() {
    let generator = Arc::new(MockStructuredGenerator::new(MockBehavior::Malformed));
    let adjudicator = Adjudicator::new(generator.clone(), fast_config());

    let report = adjudicator.adjudicate(&items(1)).await;
    assert_eq!(report.results[0].rank(), 0);
    assert_eq!(generator.calls(), 3);
    // usage of failed attempts still counts
    assert_eq!(report.usage.input, 3 * MockStructuredGenerator::INPUT_TOKENS_PER_ITEM);
}

#[tokio::test]
async fn test_timeout_counts_as_failure() {
    let generator = Arc::new(
        MockStructuredGenerator::new(MockBehavior::PickRank(1))
            .with_delay(Duration::from_millis(200)),
    );
    let config = fast_config()
        .with_retries(0, Duration::from_millis(1))
        .with_timeout(Duration::from_millis(10));
    let adjudicator = Adjudicator::new(generator, config);

    let report = adjudicator.adjudicate(&items(1)).await;
    assert!(matches!(
        &report.results[0].verdict,
        Verdict::Unresolved {
            reason: UnresolvedReason::ProviderFailed { error }
        } if error.contains("timed out")
    ));
}

#[tokio::test]
async fn test_items_without_candidates_are_not_sent() {
    let generator = Arc::new(MockStructuredGenerator::new(MockBehavior::PickRank(1)));
    let adjudicator = Adjudicator::new(generator.clone(), fast_config());

    let input = vec![item("empty", &[]), item("full", &[SODAS])];
    let report = adjudicator.adjudicate(&input).await;

    assert_eq!(report.results[0].id, "empty");
    assert!(matches!(
        report.results[0].verdict,
        Verdict::Unresolved {
            reason: UnresolvedReason::NoCandidates
        }
    ));
    assert_eq!(report.results[1].rank(), 1);
    assert_eq!(generator.calls(), 1);

    let none = adjudicator.adjudicate(&[item("empty", &[])]).await;
    assert_eq!(none.calls, 0);
    assert_eq!(generator.calls(), 1);
}

#[test]
fn test_prompt_carries_closed_world_rules_and_ranked_candidates() {
    let one = item("a1", &[SODAS, LESSIVE]);
    let request = prompt::build_request("gemini-2.5-flash", &[&one]).unwrap();

    assert_eq!(request.model, "gemini-2.5-flash");
    assert_eq!(request.system, prompt::SYSTEM_MESSAGE);
    let text = request.user_prompt();
    assert!(text.contains("CHOISISSEZ EXCLUSIVEMENT UNE sous-famille"));
    assert!(text.contains("INTERDICTION ABSOLUE"));

    let payload: PromptPayload = serde_json::from_value(request.payload).unwrap();
    assert_eq!(payload.items[0].id, "a1");
    assert_eq!(payload.items[0].title, "title a1");
    let ranks: Vec<usize> = payload.items[0].candidates.iter().map(|c| c.rank).collect();
    assert_eq!(ranks, vec![1, 2]);
    assert_eq!(payload.items[0].candidates[0].sous_famille_code, "101");
    assert_eq!(payload.items[0].candidates[0].sector_name, "EPICERIE");
}

#[test]
fn test_response_schema_requires_every_field() {
    let schema = prompt::response_schema();
    assert_eq!(schema["required"], serde_json::json!(["results"]));
    let required = schema["properties"]["results"]["items"]["required"]
        .as_array()
        .unwrap();
    assert_eq!(required.len(), 11);
    assert!(required.contains(&serde_json::json!("source_scores")));
}

#[test]
fn test_validation_requires_code_and_path_match() {
    let one = item("a1", &[SODAS, EAUX]);
    let payload = prompt::build_payload(&[&one]);
    let good = ResponseRow::choosing("a1", &payload.items[0].candidates[1]);

    let mut wrong_code = good.clone();
    wrong_code.sous_famille_code = "101".to_string();

    assert_eq!(match_rank(&one, &good), Some(2));
    assert_eq!(match_rank(&one, &wrong_code), None);
}

#[test]
fn test_validation_ignores_unknown_and_duplicate_ids() {
    let one = item("a1", &[SODAS, EAUX]);
    let payload = prompt::build_payload(&[&one]);
    let first = ResponseRow::choosing("a1", &payload.items[0].candidates[0]);
    let second = ResponseRow::choosing("a1", &payload.items[0].candidates[1]);
    let stranger = ResponseRow::choosing("zz", &payload.items[0].candidates[1]);

    let verdicts = validate_batch(&[&one], vec![stranger, first, second]);
    assert_eq!(verdicts.len(), 1);
    assert_eq!(verdicts[0].rank(), 1);
}

#[test]
fn test_strip_code_fence() {
    assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
    assert_eq!(strip_code_fence("  {\"a\":1} "), "{\"a\":1}");
}

#[test]
fn test_token_usage_accumulates() {
    let mut usage = TokenUsage::new(10, 5);
    usage += TokenUsage::new(1, 2);
    assert_eq!(usage, TokenUsage { input: 11, output: 7, total: 18 });
}
