pub mod console;
pub mod exploratory;
pub mod targeted;

pub use console::{Console, InputClosed};
pub use targeted::{Entry, parse_entry};

use anyhow::Result;
use chrono::Local;
use colored::Colorize;
use std::io::{BufRead, Write};
use std::time::Duration;
use tracing::error;

use crate::fetcher::SearchClient;
use crate::models::{AttributeSet, Preferences, Product};
use crate::processor::{DomainAdvisor, ScoredProduct, TOP_N};
use crate::storage::{ExportMode, ExportSink, PreferenceStore, export_products, sheet_name};

/// Owns every collaborator of an interactive session and drives the menu.
pub struct Concierge {
    search: SearchClient,
    advisor: Box<dyn DomainAdvisor>,
    sink: Option<Box<dyn ExportSink>>,
    export_timeout: Duration,
    store: PreferenceStore,
}

impl Concierge {
    pub fn new(
        search: SearchClient,
        advisor: Box<dyn DomainAdvisor>,
        sink: Option<Box<dyn ExportSink>>,
        export_timeout: Duration,
        store: PreferenceStore,
    ) -> Self {
        Concierge {
            search,
            advisor,
            sink,
            export_timeout,
            store,
        }
    }

    pub fn store(&self) -> &PreferenceStore {
        &self.store
    }

    /// Menu loop. Returns when the user types `exit` or input runs out.
    pub async fn run<R: BufRead, W: Write>(&mut self, console: &mut Console<R, W>) -> Result<()> {
        console.say(format!("\n🤖 {}", "Welcome to Smart Shopping Concierge!".bold()))?;
        console.say("I can help you find products in two ways:")?;
        console.say("  1. Targeted Search (you know what you want and what attributes are important).")?;
        console.say("  2. Exploratory Search (you are unsure what matters and want to understand it).")?;

        loop {
            let outcome = match console.ask("\nSelect mode (1 or 2, or 'exit' to quit): ") {
                Ok(choice) => match choice.as_str() {
                    "1" => self.targeted_mode(console).await,
                    "2" => self.exploratory_mode(console).await,
                    "exit" => break,
                    _ => console.say("Invalid choice. Please enter '1', '2' or 'exit'."),
                },
                Err(e) => Err(e),
            };

            if let Err(e) = outcome {
                if e.is::<InputClosed>() {
                    break;
                }
                return Err(e);
            }
        }

        console.say("\n👋 Thank you for using Smart Shopping Concierge. Goodbye!")?;
        Ok(())
    }

    fn save_preferences<R: BufRead, W: Write>(
        &mut self,
        console: &mut Console<R, W>,
        category: &str,
        preferences: Preferences,
        note: Option<&str>,
    ) -> Result<()> {
        match self.store.save(category, preferences, note) {
            Ok(()) => console.say(format!("{} Preferences for '{}' saved.", "[✔]".green(), category)),
            Err(e) => {
                error!("Failed to save preferences for '{}': {}", category, e);
                console.say(format!("{} Could not save preferences: {}", "[!]".red(), e))
            }
        }
    }

    async fn export<R: BufRead, W: Write>(
        &self,
        console: &mut Console<R, W>,
        products: &[Product],
        category: &str,
        mode: ExportMode,
    ) -> Result<()> {
        let Some(sink) = self.sink.as_deref() else {
            return console.say("[!] Spreadsheet export is disabled.");
        };

        let name = sheet_name(category, mode, Local::now());
        match export_products(sink, products, &name, self.export_timeout).await {
            Ok(Some(location)) => console.say(format!("{} Results exported: {}", "[✔]".green(), location)),
            Ok(None) => console.say("[!] No data to export."),
            Err(e) => {
                error!("Export to '{}' failed: {:#}", name, e);
                console.say(format!("{} Export failed: {}", "[!]".red(), e))
            }
        }
    }
}

fn format_attributes(attributes: &AttributeSet) -> String {
    attributes
        .iter()
        .map(|(k, v)| format!("{}: {}", k, v))
        .collect::<Vec<_>>()
        .join(", ")
}

fn show_product<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    position: usize,
    product: &Product,
    score: Option<u32>,
) -> Result<()> {
    let score = score.map(|s| format!(" | Score: {}", s)).unwrap_or_default();
    console.say(format!(
        " {}. {} | Price: {} | Store: {}{}\n    Link: {}",
        position,
        product.name,
        product.price_label(),
        product.source,
        score,
        product.url
    ))?;

    if !product.attributes.is_empty() {
        console.say(format!("    Detected attributes: {}", format_attributes(&product.attributes)))?;
    }
    Ok(())
}

fn show_products<R: BufRead, W: Write>(console: &mut Console<R, W>, products: &[Product]) -> Result<()> {
    for (i, product) in products.iter().take(TOP_N).enumerate() {
        show_product(console, i + 1, product, None)?;
    }
    Ok(())
}

fn show_ranked<R: BufRead, W: Write>(console: &mut Console<R, W>, ranked: &[ScoredProduct]) -> Result<()> {
    for (i, scored) in ranked.iter().take(TOP_N).enumerate() {
        show_product(console, i + 1, &scored.product, Some(scored.score))?;
    }
    Ok(())
}
