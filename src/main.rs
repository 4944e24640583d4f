mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::Cli;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use upcycler::image_source::is_allowed_filename;
use upcycler::{RecommendationCatalog, ScanOptions, Scanner};

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let filename = cli
        .input
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_owned)
        .unwrap_or_default();
    if !is_allowed_filename(&filename) {
        bail!("{} is not a png, jpg, jpeg or gif file", cli.input.display());
    }

    let mut options = match &cli.config {
        Some(path) => ScanOptions::from_json_file(path)
            .with_context(|| format!("reading options from {}", path.display()))?,
        None => ScanOptions::default(),
    };
    if let Some(strategy) = cli.strategy {
        options.strategy = strategy;
    }
    if let Some(policy) = cli.policy {
        options.policy = policy;
    }
    options.annotate = cli.annotate_output.is_some();

    let catalog = match &cli.catalog {
        Some(path) => RecommendationCatalog::from_json_file(path)
            .with_context(|| format!("loading catalog from {}", path.display()))?,
        None => RecommendationCatalog::builtin()?,
    };
    let scanner = Scanner::new(catalog, options)?;

    info!("Scanning {}", cli.input.display());
    let bytes = std::fs::read(&cli.input)
        .with_context(|| format!("reading {}", cli.input.display()))?;
    let labels = (!cli.labels.is_empty()).then_some(cli.labels.as_slice());

    let outcome = match cli.seed {
        Some(seed) => scanner.classify_and_recommend_with_rng(
            &bytes,
            Some(&filename),
            labels,
            &mut StdRng::seed_from_u64(seed),
        )?,
        None => scanner.classify_and_recommend(&bytes, Some(&filename), labels)?,
    };

    println!("Material: {}", outcome.label);
    println!("{}", outcome.recommendation);

    if let (Some(path), Some(annotated)) = (&cli.annotate_output, &outcome.annotated) {
        std::fs::write(path, annotated)
            .with_context(|| format!("writing annotated image to {}", path.display()))?;
        println!("Annotated image written to {}", path.display());
    }

    Ok(())
}
