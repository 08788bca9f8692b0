use anyhow::{Context, Result};
use clap::Parser;
use shopping_concierge::config::{ConciergeConfig, Credentials, ExportBackend, ExportSection};
use shopping_concierge::fetcher::{SearchClient, SerpApiClient};
use shopping_concierge::processor::{CatalogAdvisor, RuleBasedExtractor};
use shopping_concierge::storage::{CsvSink, ExportSink, GoogleSheetsSink, PreferenceStore};
use shopping_concierge::workflow::{Concierge, Console};
use std::io;
use tracing::{info, warn};

/// Interactive shopping assistant: targeted and exploratory product search.
#[derive(Parser, Debug)]
#[command(name = "concierge", version, about)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, default_value = "concierge.toml")]
    config: String,

    /// Preference file, overrides [preferences].path
    #[arg(short, long)]
    preferences: Option<String>,

    /// Export backend: sheets, csv or none
    #[arg(short, long)]
    export: Option<ExportBackend>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they don't interleave with the conversation
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    dotenv::dotenv().ok();

    let args = Args::parse();

    let mut config = ConciergeConfig::load_or_default(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config))?;
    if let Some(path) = args.preferences {
        config.preferences.path = path;
    }
    if let Some(backend) = args.export {
        config.export.backend = backend;
    }
    config.validate()?;

    let credentials = Credentials::from_env(&config);

    let store = PreferenceStore::load(&config.preferences.path)
        .with_context(|| format!("Failed to load preferences from {}", config.preferences.path))?;
    info!(
        "Loaded preferences for {} categories from {}",
        store.categories().count(),
        store.path().display()
    );

    let provider = SerpApiClient::new(
        config.search.clone(),
        credentials.search_api_key().ok().map(str::to_string),
    )?;
    let search = SearchClient::new(
        Box::new(provider),
        Box::new(RuleBasedExtractor::new()?),
        config.search.timeout(),
    )?;

    let sink = build_sink(&config.export, &credentials)?;

    let mut concierge = Concierge::new(
        search,
        Box::new(CatalogAdvisor),
        sink,
        config.export.timeout(),
        store,
    );

    let stdin = io::stdin();
    let mut console = Console::new(stdin.lock(), io::stdout());
    concierge.run(&mut console).await
}

fn build_sink(config: &ExportSection, credentials: &Credentials) -> Result<Option<Box<dyn ExportSink>>> {
    match config.backend {
        ExportBackend::Sheets => match credentials.sheets_access_token() {
            Ok(token) => {
                info!("Exporting results to Google Sheets");
                Ok(Some(Box::new(GoogleSheetsSink::new(config, token.to_string())?)))
            }
            Err(_) => {
                warn!(
                    "{} is not set; exporting results as CSV into {}",
                    config.access_token_var(),
                    config.csv_dir().display()
                );
                Ok(Some(Box::new(CsvSink::new(config.csv_dir()))))
            }
        },
        ExportBackend::Csv => {
            info!("Exporting results as CSV into {}", config.csv_dir().display());
            Ok(Some(Box::new(CsvSink::new(config.csv_dir()))))
        }
        ExportBackend::None => {
            info!("Spreadsheet export disabled");
            Ok(None)
        }
    }
}
