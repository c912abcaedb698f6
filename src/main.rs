//! Taxoclass command-line entrypoint.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use tokio::io::AsyncReadExt;

use taxoclass::adjudication::{GenaiGenerator, StructuredGenerator};
use taxoclass::config::Config;
use taxoclass::embedding::{
    EmbeddingConfig, EmbeddingProvider, HttpEmbeddingProvider, LeafEmbeddingBuilder,
};
use taxoclass::pipeline::{Classifier, DEFAULT_BENCH_SIZE, run_benchmark};
use taxoclass::taxonomy::TaxonomyRepository;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser, Debug)]
#[command(
    name = "taxoclass",
    version,
    about = "Classify retail product titles into the sector/rayon/famille/sous-famille taxonomy"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Parse the hierarchy source and rewrite the taxonomy snapshot
    BuildTaxonomy,

    /// Embed every leaf and write the leaf-embeddings artifact
    EmbedLeaves,

    /// Classify one title per line from FILE (or stdin) and print JSON lines
    Classify {
        /// Input file; stdin when omitted
        file: Option<PathBuf>,
    },

    /// Classify N built-in sample titles and print the run summary
    Bench {
        #[arg(default_value_t = DEFAULT_BENCH_SIZE)]
        n: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;
    config.validate()?;

    match cli.command {
        Command::BuildTaxonomy => build_taxonomy(&config),
        Command::EmbedLeaves => embed_leaves(&config).await,
        Command::Classify { file } => classify(&config, file.as_deref()).await,
        Command::Bench { n } => bench(&config, n).await,
    }
}

fn build_taxonomy(config: &Config) -> anyhow::Result<()> {
    let repository =
        TaxonomyRepository::rebuild(&config.hierarchy_path, &config.taxonomy_cache_path)?;
    let taxonomy = repository.taxonomy();
    tracing::info!(
        path = %config.taxonomy_cache_path.display(),
        sectors = taxonomy.sectors().len(),
        leaves = taxonomy.len(),
        hash = %taxonomy.hash(),
        "Taxonomy snapshot written"
    );
    Ok(())
}

async fn embed_leaves(config: &Config) -> anyhow::Result<()> {
    let repository =
        TaxonomyRepository::load(&config.hierarchy_path, &config.taxonomy_cache_path)?;
    let (embedder, _) = providers(config)?;

    let artifact = LeafEmbeddingBuilder::new(embedder, &EmbeddingConfig::from_config(config))
        .build(&repository.taxonomy())
        .await?;
    artifact.write(&config.embeddings_path)?;

    tracing::info!(
        path = %config.embeddings_path.display(),
        model = %artifact.model,
        dim = artifact.dim,
        leaves = artifact.vectors.len(),
        "Leaf embeddings written"
    );
    Ok(())
}

async fn classify(config: &Config, input: Option<&Path>) -> anyhow::Result<()> {
    let text = match input {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            tokio::io::stdin().read_to_string(&mut buf).await?;
            buf
        }
    };
    let titles: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();

    let (embedder, generator) = providers(config)?;
    let classifier = Classifier::from_config(config, embedder, generator)?;
    let report = classifier.classify_batch(&titles).await;

    for item in &report.items {
        println!("{}", serde_json::to_string(item)?);
    }
    tracing::info!(summary = %serde_json::to_string(&report.summary)?, "Run summary");
    Ok(())
}

async fn bench(config: &Config, n: usize) -> anyhow::Result<()> {
    let (embedder, generator) = providers(config)?;
    let classifier = Classifier::from_config(config, embedder, generator)?;
    let summary = run_benchmark(&classifier, n).await;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

type Providers = (Arc<dyn EmbeddingProvider>, Arc<dyn StructuredGenerator>);

fn providers(config: &Config) -> anyhow::Result<Providers> {
    if config.mock_provider {
        tracing::warn!("TAXO_MOCK_PROVIDER set, using offline providers");
        return mock_providers();
    }

    let embedding = EmbeddingConfig::from_config(config);
    let embedder = HttpEmbeddingProvider::new(
        &embedding.base_url,
        embedding.api_key.as_deref(),
        embedding.timeout,
    )?;
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(embedder);
    let generator: Arc<dyn StructuredGenerator> = Arc::new(GenaiGenerator::new());
    Ok((embedder, generator))
}

#[cfg(feature = "mock")]
fn mock_providers() -> anyhow::Result<Providers> {
    use taxoclass::adjudication::{MockBehavior, MockStructuredGenerator};
    use taxoclass::embedding::MockEmbeddingProvider;

    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(MockEmbeddingProvider::new());
    let generator: Arc<dyn StructuredGenerator> =
        Arc::new(MockStructuredGenerator::new(MockBehavior::PickRank(1)));
    Ok((embedder, generator))
}

#[cfg(not(feature = "mock"))]
fn mock_providers() -> anyhow::Result<Providers> {
    anyhow::bail!("TAXO_MOCK_PROVIDER requires a build with the `mock` feature")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Command, clap::Error> {
        Cli::try_parse_from(std::iter::once("taxoclass").chain(args.iter().copied()))
            .map(|cli| cli.command)
    }

    #[test]
    fn test_bench_size_defaults_and_parses() {
        assert_eq!(
            parse(&["bench"]).unwrap(),
            Command::Bench {
                n: DEFAULT_BENCH_SIZE
            }
        );
        assert_eq!(parse(&["bench", "12"]).unwrap(), Command::Bench { n: 12 });
        assert!(parse(&["bench", "twelve"]).is_err());
    }

    #[test]
    fn test_classify_file_is_optional() {
        assert_eq!(parse(&["classify"]).unwrap(), Command::Classify { file: None });
        assert_eq!(
            parse(&["classify", "titles.txt"]).unwrap(),
            Command::Classify {
                file: Some(PathBuf::from("titles.txt"))
            }
        );
    }

    #[test]
    fn test_kebab_case_subcommands() {
        assert_eq!(parse(&["build-taxonomy"]).unwrap(), Command::BuildTaxonomy);
        assert_eq!(parse(&["embed-leaves"]).unwrap(), Command::EmbedLeaves);
        assert!(parse(&[]).is_err());
        assert!(parse(&["train"]).is_err());
    }
}
