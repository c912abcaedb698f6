use super::*;
use crate::adjudication::{
    Adjudicator, AdjudicatorConfig, MockBehavior, MockStructuredGenerator, UnresolvedReason,
};
use crate::candidates::{CandidateGenerator, CandidateOptions};
use crate::config::Config;
use crate::embedding::{
    EmbeddingConfig, EmbeddingStore, LeafEmbeddingBuilder, LeafEmbeddings, MockEmbeddingProvider,
};
use crate::lexical::Bm25Index;
use crate::taxonomy::{FIXTURE_HIERARCHY, fixture_taxonomy};

use std::sync::Arc;
use std::time::Duration;

async fn classifier(behavior: MockBehavior) -> (Classifier, Arc<MockStructuredGenerator>) {
    let taxonomy = Arc::new(fixture_taxonomy());
    let config = EmbeddingConfig::default().with_models(["mock"]);
    let artifact = LeafEmbeddingBuilder::new(Arc::new(MockEmbeddingProvider::new()), &config)
        .build(&taxonomy)
        .await
        .unwrap();

    let store = Arc::new(EmbeddingStore::new(
        Arc::new(MockEmbeddingProvider::new()),
        &config,
        Some(LeafEmbeddings::from_artifact(artifact)),
    ));
    let lexical = Arc::new(Bm25Index::build(&taxonomy));
    let candidates =
        CandidateGenerator::new(taxonomy, lexical, store, CandidateOptions::default());

    let generator = Arc::new(MockStructuredGenerator::new(behavior));
    let adjudicator = Adjudicator::new(
        generator.clone(),
        AdjudicatorConfig::default().with_retries(0, Duration::ZERO),
    );
    (Classifier::new(candidates, adjudicator), generator)
}

#[tokio::test]
async fn test_coca_cola_lands_on_sodas() {
    let (classifier, _) = classifier(MockBehavior::PickRank(1)).await;

    let item = classifier.classify("Coca-Cola 6x33cl").await.unwrap();
    assert_eq!(item.id, "1");
    assert_eq!(item.original, "Coca-Cola 6x33cl");
    assert_eq!(item.normalized, "coca cola");
    assert_eq!(item.candidates[0].leaf_key, "01-010-101-101");

    match &item.outcome {
        ClassificationOutcome::Classified { leaf, rank } => {
            assert_eq!(leaf.sous_famille.name, "SODAS COLA");
            assert_eq!(*rank, 1);
        }
        other => panic!("expected a classification, got {other:?}"),
    }
}

#[tokio::test]
async fn test_noise_title_has_no_candidates_and_skips_adjudication() {
    let (classifier, generator) = classifier(MockBehavior::PickRank(1)).await;

    let report = classifier.classify_batch(&["zzzz qqqq", "6x33cl"]).await;
    assert_eq!(report.items.len(), 2);
    for item in &report.items {
        assert_eq!(item.outcome, ClassificationOutcome::NoCandidates);
        assert!(item.candidates.is_empty());
    }
    assert_eq!(generator.calls(), 0);
    assert!(report.summary.rank_counts.is_empty());
    assert_eq!(report.summary.tokens.total, 0);
}

#[tokio::test]
async fn test_hallucinated_leaf_stays_unresolved() {
    let (classifier, _) = classifier(MockBehavior::Hallucinate).await;

    let report = classifier.classify_batch(&["Coca-Cola 6x33cl"]).await;
    let item = &report.items[0];
    assert!(!item.outcome.is_classified());
    assert!(item.outcome.leaf().is_none());
    assert!(matches!(
        item.outcome,
        ClassificationOutcome::Unresolved {
            reason: UnresolvedReason::NotAmongCandidates { .. }
        }
    ));
    assert_eq!(report.summary.rank_counts.get(&0), Some(&1));
}

#[tokio::test]
async fn test_provider_outage_is_unresolved_not_no_candidates() {
    let (classifier, _) = classifier(MockBehavior::Fail).await;

    let report = classifier
        .classify_batch(&["Coca-Cola 6x33cl", "zzzz"])
        .await;
    assert!(matches!(
        report.items[0].outcome,
        ClassificationOutcome::Unresolved {
            reason: UnresolvedReason::ProviderFailed { .. }
        }
    ));
    assert_eq!(report.items[1].outcome, ClassificationOutcome::NoCandidates);
}

#[tokio::test]
async fn test_batch_preserves_order_and_counts_ranks() {
    let (classifier, _) = classifier(MockBehavior::PickRank(1)).await;
    let titles = ["Coca-Cola 6x33cl", "zzzz", "Café moulu 250g", "Yaourt bio 4x125g"];

    let report = classifier.classify_batch(&titles).await;
    let ids: Vec<&str> = report.items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, ["1", "2", "3", "4"]);
    let originals: Vec<&str> = report.items.iter().map(|i| i.original.as_str()).collect();
    assert_eq!(originals, titles);

    assert_eq!(report.summary.count, 4);
    assert_eq!(report.summary.rank_counts.get(&1), Some(&3));
    assert_eq!(
        report.summary.tokens.input,
        3 * MockStructuredGenerator::INPUT_TOKENS_PER_ITEM
    );
    assert_eq!(
        report.items[2].outcome.leaf().map(|l| l.leaf_key.as_str()),
        Some("01-011-110-301")
    );
}

#[tokio::test]
async fn test_batch_truncated_to_max_items() {
    let (classifier, _) = classifier(MockBehavior::PickRank(1)).await;
    let classifier = classifier.with_max_items(2);

    let report = classifier
        .classify_batch(&["Coca-Cola", "Café moulu", "Lessive liquide"])
        .await;
    assert_eq!(report.summary.count, 2);
    assert_eq!(report.items.len(), 2);
}

#[test]
fn test_sample_titles_cycle_through_seeds() {
    let titles = sample_titles(DEFAULT_BENCH_SIZE);
    assert_eq!(titles.len(), 100);
    assert_eq!(titles[0], "Coca-Cola 6x33cl");
    assert_eq!(titles[49], "Croquettes chien adulte");
    assert_eq!(titles[50], titles[0]);
    assert!(sample_titles(0).is_empty());
}

#[tokio::test]
async fn test_benchmark_summary_covers_every_title() {
    let (classifier, _) = classifier(MockBehavior::PickRank(1)).await;

    let summary = run_benchmark(&classifier, 12).await;
    assert_eq!(summary.count, 12);
    let adjudicated: usize = summary.rank_counts.values().sum();
    assert!(adjudicated <= 12);
    assert!(summary.timings.total_ms >= summary.timings.llm_ms);

    let json = serde_json::to_value(&summary).unwrap();
    assert!(json.get("rankCounts").is_some());
    assert!(json["timings"].get("retrievalMs").is_some());
}

#[tokio::test]
async fn test_from_config_loads_source_and_runs_without_leaf_vectors() {
    let dir = tempfile::tempdir().unwrap();
    let hierarchy = dir.path().join("hierarchy.txt");
    std::fs::write(&hierarchy, FIXTURE_HIERARCHY).unwrap();

    let config = Config {
        hierarchy_path: hierarchy,
        taxonomy_cache_path: dir.path().join("taxonomy.json"),
        embeddings_path: dir.path().join("missing.json"),
        ..Config::default()
    };

    let classifier = Classifier::from_config(
        &config,
        Arc::new(MockEmbeddingProvider::new()),
        Arc::new(MockStructuredGenerator::new(MockBehavior::PickRank(1))),
    )
    .unwrap();
    assert!(classifier.candidates().embeddings().is_absent());
    assert!(dir.path().join("taxonomy.json").exists());

    let item = classifier.classify("Lessive liquide 3L").await.unwrap();
    assert_eq!(
        item.outcome.leaf().map(|l| l.leaf_key.as_str()),
        Some("03-030-301-601")
    );
}

#[test]
fn test_from_config_rejects_invalid_config() {
    let config = Config {
        adjudication_model: "  ".to_string(),
        ..Config::default()
    };

    let result = Classifier::from_config(
        &config,
        Arc::new(MockEmbeddingProvider::new()),
        Arc::new(MockStructuredGenerator::new(MockBehavior::PickRank(1))),
    );
    assert!(matches!(result, Err(PipelineError::Config(_))));
}

#[test]
fn test_from_config_reports_missing_taxonomy() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        hierarchy_path: dir.path().join("absent.txt"),
        taxonomy_cache_path: dir.path().join("absent.json"),
        ..Config::default()
    };

    let result = Classifier::from_config(
        &config,
        Arc::new(MockEmbeddingProvider::new()),
        Arc::new(MockStructuredGenerator::new(MockBehavior::PickRank(1))),
    );
    assert!(matches!(result, Err(PipelineError::Taxonomy(_))));
}
