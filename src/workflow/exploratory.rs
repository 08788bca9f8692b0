use anyhow::Result;
use colored::Colorize;
use std::io::{BufRead, Write};

use super::{Concierge, Console, show_ranked};
use crate::models::{Preferences, Priorities, SearchFilters};
use crate::processor::{TOP_N, top_matches};
use crate::storage::ExportMode;

impl Concierge {
    /// Menu option 2: explain the category, collect importance ratings and rank an
    /// unfiltered search by them.
    pub(crate) async fn exploratory_mode<R: BufRead, W: Write>(
        &mut self,
        console: &mut Console<R, W>,
    ) -> Result<()> {
        let category = console
            .ask("Enter the product category you want to explore (e.g., composter, laptop, smartphone): ")?
            .to_lowercase();
        if category.is_empty() {
            return console.say("Category cannot be empty.");
        }

        console.say(format!("\n🚀 Exploratory search: {}", category.bold()))?;
        console.say(format!("\n{}", self.advisor.summarize(&category)))?;

        let priorities = match self.saved_priorities(console, &category)? {
            Some(priorities) => priorities,
            None => self.collect_priorities(console, &category)?,
        };

        console.say("\nYour priorities:")?;
        for (key, weight) in &priorities {
            console.say(format!("  - {}: {}", key, weight))?;
        }

        let results = self
            .search
            .search_products(&category, &SearchFilters::default())
            .await;
        let ranked = top_matches(&results, &priorities);

        if ranked.is_empty() {
            console.say(format!(
                "{} Could not find suitable products for your priorities. Try another category.",
                "❌".red()
            ))?;
        } else {
            console.say("\n✨ Best matches for your priorities:")?;
            show_ranked(console, &ranked)?;
            if results.len() > TOP_N
                || console.ask_yes_no("Do you want the list in a spreadsheet for comparison?")?
            {
                self.export(console, &results, &category, ExportMode::Exploratory).await?;
            }
        }

        self.save_preferences(console, &category, Preferences::Priorities(priorities), None)
    }

    fn saved_priorities<R: BufRead, W: Write>(
        &self,
        console: &mut Console<R, W>,
        category: &str,
    ) -> Result<Option<Priorities>> {
        let Some(record) = self.store.recall(category) else {
            return Ok(None);
        };
        let Preferences::Priorities(priorities) = &record.preferences else {
            return Ok(None);
        };

        console.say(format!("\n🔁 Found saved priorities for '{}':", category))?;
        for (key, weight) in priorities {
            console.say(format!("  - {}: {}", key, weight))?;
        }

        if console.ask_yes_no("Use them again?")? {
            Ok(Some(priorities.clone()))
        } else {
            Ok(None)
        }
    }

    fn collect_priorities<R: BufRead, W: Write>(
        &self,
        console: &mut Console<R, W>,
        category: &str,
    ) -> Result<Priorities> {
        console.say("\nRate how important each attribute is to you, from 1 (not important) to 5 (very important).")?;

        let mut priorities = Priorities::new();
        for (key, label) in self.advisor.suggested_attributes(category) {
            let rating = console.ask_rating(&format!("Importance of '{}' ({}): ", label, key))?;
            priorities.insert(key, rating);
        }
        Ok(priorities)
    }
}
