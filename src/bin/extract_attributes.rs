use anyhow::Result;
use clap::Parser;
use shopping_concierge::processor::{FeatureExtractor, RuleBasedExtractor};
use std::io;
use tracing::info;

/// Prints the attributes detected in a product title and description.
#[derive(Parser, Debug)]
#[command(name = "extract_attributes", version, about)]
struct Args {
    /// Product title
    title: String,

    /// Snippet or description text
    #[arg(short, long, default_value = "")]
    description: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let args = Args::parse();

    let extractor = RuleBasedExtractor::new()?;
    let attributes = extractor.extract(&args.title, &args.description);
    info!("Detected {} attributes in '{}'", attributes.len(), args.title);

    println!("{}", serde_json::to_string_pretty(&attributes)?);
    Ok(())
}
