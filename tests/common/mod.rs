//! Shared harness: a throwaway data directory with the fixture hierarchy and a
//! leaf-embeddings artifact built with the offline provider.

#![allow(dead_code)]

use std::sync::Arc;

use tempfile::TempDir;

use taxoclass::adjudication::{MockBehavior, MockStructuredGenerator};
use taxoclass::config::Config;
use taxoclass::embedding::{EmbeddingConfig, LeafEmbeddingBuilder, MockEmbeddingProvider};
use taxoclass::pipeline::Classifier;
use taxoclass::taxonomy::{FIXTURE_HIERARCHY, TaxonomyRepository};

pub struct Workspace {
    pub dir: TempDir,
    pub config: Config,
}

impl Workspace {
    /// Writes the fixture hierarchy only.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let hierarchy_path = dir.path().join("hierarchy.txt");
        std::fs::write(&hierarchy_path, FIXTURE_HIERARCHY).expect("write hierarchy");

        let config = Config {
            hierarchy_path,
            taxonomy_cache_path: dir.path().join("taxonomy.json"),
            embeddings_path: dir.path().join("leaf-embeddings.json"),
            embedding_model: "mock-embed".to_string(),
            embedding_fallbacks: Vec::new(),
            mock_provider: true,
            ..Config::default()
        };
        Self { dir, config }
    }

    /// Also builds and writes the leaf-embeddings artifact.
    pub async fn with_leaf_embeddings() -> Self {
        let workspace = Self::new();
        let repository = TaxonomyRepository::load(
            &workspace.config.hierarchy_path,
            &workspace.config.taxonomy_cache_path,
        )
        .expect("taxonomy loads");

        let artifact = LeafEmbeddingBuilder::new(
            Arc::new(MockEmbeddingProvider::new()),
            &EmbeddingConfig::from_config(&workspace.config),
        )
        .build(&repository.taxonomy())
        .await
        .expect("artifact builds");
        artifact
            .write(&workspace.config.embeddings_path)
            .expect("artifact writes");
        workspace
    }

    pub fn classifier(&self, behavior: MockBehavior) -> (Classifier, Arc<MockStructuredGenerator>) {
        let generator = Arc::new(MockStructuredGenerator::new(behavior));
        let classifier = Classifier::from_config(
            &self.config,
            Arc::new(MockEmbeddingProvider::new()),
            generator.clone(),
        )
        .expect("classifier builds");
        (classifier, generator)
    }
}
