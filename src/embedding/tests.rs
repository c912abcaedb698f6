use super::*;
use crate::taxonomy::fixture_taxonomy;

use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn vec_of(x: f32) -> Arc<[f32]> {
    Arc::from(vec![x])
}

fn test_config() -> EmbeddingConfig {
    EmbeddingConfig::default()
        .with_models(["primary", "fallback-a", "fallback-b"])
        .with_timeout(Duration::from_secs(2))
}

#[test]
fn test_cosine_similarity() {
    assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
    assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
    assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
}

#[test]
fn test_cosine_similarity_degenerate_inputs() {
    assert_eq!(cosine_similarity(&[], &[1.0]), 0.0);
    assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    // only the overlapping prefix counts
    assert!((cosine_similarity(&[1.0, 0.0, 5.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
}

#[test]
fn test_lru_evicts_least_recently_used() {
    let now = std::time::Instant::now();
    let mut arena = LruArena::new(2, Duration::from_secs(60));

    arena.insert("a", vec_of(1.0), now);
    arena.insert("b", vec_of(2.0), now);
    assert!(arena.get("a", now).is_some(), "bump a");

    let evicted = arena.insert("c", vec_of(3.0), now);
    assert_eq!(evicted.as_deref(), Some("b"));
    assert_eq!(arena.keys_by_recency(), vec!["c", "a"]);
    assert_eq!(arena.len(), 2);
}

#[test]
fn test_lru_is_deterministic_for_same_sequence() {
    let run = || {
        let now = std::time::Instant::now();
        let mut arena = LruArena::new(3, Duration::from_secs(60));
        for key in ["a", "b", "c", "a", "d", "b", "e"] {
            if arena.get(key, now).is_none() {
                arena.insert(key, vec_of(0.0), now);
            }
        }
        arena.keys_by_recency()
    };
    assert_eq!(run(), run());
    assert_eq!(run(), vec!["e", "b", "d"]);
}

#[test]
fn test_lru_entries_expire() {
    let start = std::time::Instant::now();
    let mut arena = LruArena::new(4, Duration::from_secs(10));
    arena.insert("a", vec_of(1.0), start);

    assert!(arena.get("a", start + Duration::from_secs(10)).is_none());
    assert!(arena.is_empty(), "expired entry is dropped");
}

#[test]
fn test_lru_hit_restarts_ttl() {
    let start = std::time::Instant::now();
    let mut arena = LruArena::new(4, Duration::from_secs(10));
    arena.insert("a", vec_of(1.0), start);

    assert!(arena.get("a", start + Duration::from_secs(9)).is_some());
    assert!(arena.get("a", start + Duration::from_secs(18)).is_some());
    assert!(arena.get("a", start + Duration::from_secs(28)).is_none());
}

#[test]
fn test_lru_reinsert_refreshes_ttl_and_reuses_slot() {
    let start = std::time::Instant::now();
    let mut arena = LruArena::new(1, Duration::from_secs(10));
    arena.insert("a", vec_of(1.0), start);
    arena.insert("a", vec_of(2.0), start + Duration::from_secs(8));

    let hit = arena.get("a", start + Duration::from_secs(15)).unwrap();
    assert_eq!(hit[0], 2.0);

    arena.insert("b", vec_of(3.0), start + Duration::from_secs(16));
    assert_eq!(arena.keys_by_recency(), vec!["b"]);
    assert_eq!(arena.capacity(), 1);
}

#[test]
fn test_query_cache_uses_injected_clock() {
    let clock = Arc::new(ManualClock::new());
    let cache = QueryEmbeddingCache::with_clock(8, Duration::from_secs(60), clock.clone());

    cache.insert("coca cola", vec_of(1.0));
    assert!(cache.get("coca cola").is_some());

    clock.advance(Duration::from_secs(61));
    assert!(cache.get("coca cola").is_none());
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_embed_query_caches_success() {
    let provider = Arc::new(MockEmbeddingProvider::new());
    let store = EmbeddingStore::new(provider.clone(), &test_config(), None);

    let first = store.embed_query("coca cola").await;
    let second = store.embed_query("coca cola").await;

    assert_eq!(first.len(), MockEmbeddingProvider::DEFAULT_DIM);
    assert_eq!(first, second);
    assert_eq!(provider.call_count(), 1);
    assert_eq!(store.cache().len(), 1);
}

#[tokio::test]
async fn test_embed_query_walks_fallback_chain() {
    let provider = Arc::new(
        MockEmbeddingProvider::new()
            .failing_model("primary")
            .failing_model("fallback-a"),
    );
    let store = EmbeddingStore::new(provider.clone(), &test_config(), None);

    let vector = store.embed_query("yaourt bio").await;
    assert!(!vector.is_empty());
    assert_eq!(provider.calls(), vec!["primary", "fallback-a", "fallback-b"]);
}

#[tokio::test]
async fn test_embed_query_degrades_to_empty_vector() {
    let provider = Arc::new(
        MockEmbeddingProvider::new()
            .failing_model("primary")
            .failing_model("fallback-a")
            .failing_model("fallback-b"),
    );
    let store = EmbeddingStore::new(provider.clone(), &test_config(), None);

    let vector = store.embed_query("yaourt bio").await;
    assert!(vector.is_empty());
    assert!(store.cache().is_empty(), "failures are not cached");

    let again = store.embed_query("yaourt bio").await;
    assert!(again.is_empty());
    assert_eq!(provider.call_count(), 6);
}

#[tokio::test]
async fn test_embed_query_timeout_degrades() {
    let provider = Arc::new(MockEmbeddingProvider::new().with_delay(Duration::from_millis(200)));
    let config = test_config()
        .with_models(["primary"])
        .with_timeout(Duration::from_millis(20));
    let store = EmbeddingStore::new(provider, &config, None);

    assert!(store.embed_query("cafe moulu").await.is_empty());
}

#[tokio::test]
async fn test_empty_title_skips_provider() {
    let provider = Arc::new(MockEmbeddingProvider::new());
    let store = EmbeddingStore::new(provider.clone(), &test_config(), None);

    assert!(store.embed_query("").await.is_empty());
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn test_builder_writes_loadable_artifact() {
    let taxonomy = fixture_taxonomy();
    let provider = Arc::new(MockEmbeddingProvider::new().failing_model("primary"));
    let config = test_config().with_batch_size(4);

    let artifact = LeafEmbeddingBuilder::new(provider.clone(), &config)
        .build(&taxonomy)
        .await
        .unwrap();

    assert_eq!(artifact.model, "fallback-a");
    assert_eq!(artifact.dim, MockEmbeddingProvider::DEFAULT_DIM);
    assert_eq!(artifact.vectors.len(), 10);
    assert_eq!(artifact.taxonomy_hash, taxonomy.hash());
    assert!(chrono::DateTime::parse_from_rfc3339(&artifact.created_at).is_ok());
    // 10 leaves in batches of 4: first batch tries primary then fallback-a, the rest are pinned.
    assert_eq!(
        provider.calls(),
        vec!["primary", "fallback-a", "fallback-a", "fallback-a"]
    );

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out").join("leaf-embeddings.json");
    artifact.write(&path).unwrap();

    let loaded = load_leaf_embeddings(&path, taxonomy.hash()).unwrap();
    assert_eq!(loaded.len(), 10);
    assert_eq!(loaded.model, "fallback-a");
    assert!(loaded.get("01-010-101-101").is_some());
}

#[tokio::test]
async fn test_builder_fails_when_every_model_fails() {
    let provider = Arc::new(
        MockEmbeddingProvider::new()
            .failing_model("primary")
            .failing_model("fallback-a")
            .failing_model("fallback-b"),
    );
    let err = LeafEmbeddingBuilder::new(provider, &test_config())
        .build(&fixture_taxonomy())
        .await
        .unwrap_err();
    assert!(matches!(err, EmbeddingError::AllModelsFailed { .. }));
}

#[test]
fn test_load_leaf_embeddings_absent_cases() {
    let dir = TempDir::new().unwrap();
    assert!(load_leaf_embeddings(&dir.path().join("missing.json"), "h").is_none());

    let garbage = dir.path().join("garbage.json");
    std::fs::write(&garbage, b"{not json").unwrap();
    assert!(load_leaf_embeddings(&garbage, "h").is_none());

    let empty = dir.path().join("empty.json");
    LeafEmbeddingsArtifact {
        model: "m".to_string(),
        dim: 0,
        taxonomy_hash: "h".to_string(),
        created_at: "2025-01-01T00:00:00Z".to_string(),
        vectors: Vec::new(),
    }
    .write(&empty)
    .unwrap();
    assert!(load_leaf_embeddings(&empty, "h").is_none());
}

#[test]
fn test_hash_mismatch_still_loads() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("leaf-embeddings.json");
    LeafEmbeddingsArtifact {
        model: "m".to_string(),
        dim: 2,
        taxonomy_hash: "stale".to_string(),
        created_at: "2025-01-01T00:00:00Z".to_string(),
        vectors: vec![LeafVectorRecord {
            leaf_id: "101".to_string(),
            leaf_key: "01-010-101-101".to_string(),
            full_path: "EPICERIE › BOISSONS › BOISSONS GAZEUSES › SODAS COLA".to_string(),
            labels: LeafLabels {
                sector: "EPICERIE".to_string(),
                rayon: "BOISSONS".to_string(),
                famille: "BOISSONS GAZEUSES".to_string(),
                sous_famille: "SODAS COLA".to_string(),
            },
            vector: vec![0.6, 0.8],
        }],
    }
    .write(&path)
    .unwrap();

    let loaded = load_leaf_embeddings(&path, "live-hash").unwrap();
    assert_eq!(loaded.taxonomy_hash, "stale");
    assert_eq!(loaded.get("01-010-101-101"), Some(&[0.6, 0.8][..]));
}

#[test]
fn test_cosine_to_leaf_without_artifact_is_zero() {
    let store = EmbeddingStore::new(
        Arc::new(MockEmbeddingProvider::new()),
        &test_config(),
        None,
    );
    assert!(store.is_absent());
    assert_eq!(store.cosine_to_leaf(&[1.0, 0.0], "01-010-101-101"), 0.0);
}

#[test]
fn test_mock_vectors_share_tokens() {
    let dim = MockEmbeddingProvider::DEFAULT_DIM;
    let query = MockEmbeddingProvider::vector_for("coca cola", dim);
    let sodas = MockEmbeddingProvider::vector_for(
        "EPICERIE › BOISSONS › BOISSONS GAZEUSES › SODAS COLA",
        dim,
    );
    assert!(cosine_similarity(&query, &sodas) > 0.0);
}
