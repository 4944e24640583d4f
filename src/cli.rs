use clap::Parser;
use std::path::PathBuf;
use upcycler::{SelectionPolicy, StrategyKind};

#[derive(Parser)]
#[command(name = "upcycler")]
#[command(about = "Identify the material of a piece of trash and suggest how to upcycle it")]
#[command(version)]
pub struct Cli {
    /// Input image file (png, jpg, jpeg or gif)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Classification strategy (default: color, or the config file's)
    #[arg(short, long, value_enum)]
    pub strategy: Option<StrategyKind>,

    /// How to pick among recommendations (default: random)
    #[arg(short, long, value_enum)]
    pub policy: Option<SelectionPolicy>,

    /// Labels from an external detector, comma separated (external strategy)
    #[arg(short, long, value_delimiter = ',')]
    pub labels: Vec<String>,

    /// Recommendation catalog JSON (default: built-in)
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Scan options JSON
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Seed for reproducible random selection
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write an annotated copy with detected regions boxed
    #[arg(short, long)]
    pub annotate_output: Option<PathBuf>,
}
