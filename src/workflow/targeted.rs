use anyhow::Result;
use colored::Colorize;
use std::io::{BufRead, Write};

use super::{Concierge, Console, show_products, show_ranked};
use crate::models::{AttributeValue, Preferences, Priorities, SearchFilters};
use crate::processor::{TOP_N, top_matches};
use crate::storage::ExportMode;

/// One line typed during targeted filter entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Done,
    Keyword(String),
    Attribute(String, AttributeValue),
    Invalid(String),
}

/// `key:value` becomes an attribute filter, anything else a keyword. Empty input ends entry.
pub fn parse_entry(input: &str) -> Entry {
    let input = input.trim();
    if input.is_empty() {
        return Entry::Done;
    }

    let Some((key, value)) = input.split_once(':') else {
        return Entry::Keyword(input.to_lowercase());
    };

    let key = key.trim().to_lowercase();
    if key.is_empty() {
        return Entry::Invalid(format!("Missing attribute name in '{}'", input));
    }

    let value = value.trim().to_lowercase();
    let value = match value.as_str() {
        "true" => AttributeValue::Bool(true),
        "false" => AttributeValue::Bool(false),
        v if !v.is_empty() && v.chars().all(|c| c.is_ascii_digit()) => v
            .parse::<i64>()
            .map(AttributeValue::Int)
            .unwrap_or(AttributeValue::Text(value.clone())),
        _ => AttributeValue::Text(value.clone()),
    };

    Entry::Attribute(key, value)
}

impl Concierge {
    /// Menu option 1: recall saved filters for a category or run a new targeted search.
    pub(crate) async fn targeted_mode<R: BufRead, W: Write>(
        &mut self,
        console: &mut Console<R, W>,
    ) -> Result<()> {
        let category = console
            .ask("Enter the product category you want to search for (e.g., laptop, kitchen composter): ")?
            .to_lowercase();
        if category.is_empty() {
            return console.say("Category cannot be empty.");
        }

        let (reused, note) = self.offer_saved(console, &category)?;
        match reused {
            Some(Preferences::Filters(filters)) => {
                console.say("✔ Using saved filters.")?;
                self.rerun_filters(console, &category, filters, note).await
            }
            Some(Preferences::Priorities(priorities)) => {
                console.say("✔ Using saved priorities.")?;
                self.rerun_priorities(console, &category, &priorities).await
            }
            None => {
                let filters = self.targeted_search(console, &category).await?;
                self.save_preferences(console, &category, Preferences::Filters(filters), note.as_deref())
            }
        }
    }

    /// Shows any saved record and asks whether to reuse it. Declining lets the user
    /// leave a fresh note for the new search.
    fn offer_saved<R: BufRead, W: Write>(
        &self,
        console: &mut Console<R, W>,
        category: &str,
    ) -> Result<(Option<Preferences>, Option<String>)> {
        let Some(record) = self.store.recall(category).cloned() else {
            return Ok((None, None));
        };

        console.say(format!("\n🔁 Found saved preferences for '{}':", category))?;
        console.say(format!(
            "Preferences: {}",
            serde_json::to_string_pretty(&record.preferences)?
        ))?;
        if !record.note.is_empty() {
            console.say(format!("📝 Previous note: {}", record.note))?;
        }

        if console.ask_yes_no("Use them again?")? {
            let note = Some(record.note).filter(|n| !n.is_empty());
            return Ok((Some(record.preferences), note));
        }

        let note = console.ask(
            "Enter a new note (e.g., 'For this search, quietness is important due to a new baby.') (optional): ",
        )?;
        Ok((None, Some(note).filter(|n| !n.is_empty())))
    }

    async fn rerun_filters<R: BufRead, W: Write>(
        &mut self,
        console: &mut Console<R, W>,
        category: &str,
        filters: SearchFilters,
        note: Option<String>,
    ) -> Result<()> {
        let results = self.search.search_products(category, &filters).await;

        if !results.is_empty() {
            console.say("\n🔍 Products found with saved filters:")?;
            show_products(console, &results)?;
            if results.len() > TOP_N && console.ask_yes_no("Export to a spreadsheet?")? {
                self.export(console, &results, category, ExportMode::Recalled).await?;
            }
            return Ok(());
        }

        console.say(format!(
            "{} No products found with saved filters. Perhaps the old criteria are too strict or the product is unavailable.",
            "❌".red()
        ))?;
        if console.ask_yes_no("Do you want to try a new targeted search for this category to update preferences?")? {
            let filters = self.targeted_search(console, category).await?;
            self.save_preferences(console, category, Preferences::Filters(filters), note.as_deref())
        } else {
            console.say("Returning to main menu.")
        }
    }

    async fn rerun_priorities<R: BufRead, W: Write>(
        &mut self,
        console: &mut Console<R, W>,
        category: &str,
        priorities: &Priorities,
    ) -> Result<()> {
        let results = self
            .search
            .search_products(category, &SearchFilters::default())
            .await;
        let ranked = top_matches(&results, priorities);

        if ranked.is_empty() {
            return console.say(format!(
                "{} No products found for '{}'. Try again later or change the category.",
                "❌".red(),
                category
            ));
        }

        console.say("\n✨ Best matches for your saved priorities:")?;
        show_ranked(console, &ranked)?;
        if results.len() > TOP_N && console.ask_yes_no("Export to a spreadsheet?")? {
            self.export(console, &results, category, ExportMode::Recalled).await?;
        }
        Ok(())
    }

    /// Collects keywords and `key:value` filters, searches, shows and optionally exports.
    pub(crate) async fn targeted_search<R: BufRead, W: Write>(
        &mut self,
        console: &mut Console<R, W>,
        category: &str,
    ) -> Result<SearchFilters> {
        console.say("Now specify the attributes that are important to you (e.g., electric:true, quietness:true, subscription_required:false).")?;
        let vocabulary = self.search.extractor().vocabulary();
        if !vocabulary.is_empty() {
            console.say(format!("Known attributes: {}", vocabulary.join(", ")))?;
        }
        console.say("Enter one attribute at a time in 'key:value' format, or press Enter to finish.")?;
        console.say("You can also enter general keywords without ':'.")?;

        let mut filters = SearchFilters::default();
        loop {
            match parse_entry(&console.ask("Attribute or keyword (Enter to finish): ")?) {
                Entry::Done => break,
                Entry::Keyword(word) => filters.keywords.push(word),
                Entry::Attribute(key, value) => {
                    filters.attributes.insert(key, value);
                }
                Entry::Invalid(reason) => console.say(reason)?,
            }
        }

        console.say(format!("\nYou are searching for: {}", category))?;
        if !filters.keywords.is_empty() {
            console.say(format!("With keywords: {}", filters.keywords.join(", ")))?;
        }
        if !filters.attributes.is_empty() {
            console.say(format!("With attributes: {}", super::format_attributes(&filters.attributes)))?;
        }

        let results = self.search.search_products(category, &filters).await;

        console.say("\n🔍 Found products:")?;
        if results.is_empty() {
            console.say(format!(
                "{} No products found matching your criteria. Try changing your query.",
                "❌".red()
            ))?;
            return Ok(filters);
        }

        show_products(console, &results)?;
        if results.len() > TOP_N
            || console.ask_yes_no("Do you want the list in a spreadsheet for comparison?")?
        {
            self.export(console, &results, category, ExportMode::Targeted).await?;
        }

        Ok(filters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::tests::{harness, hit, run_script};

    #[test]
    fn test_parse_entry() {
        assert_eq!(parse_entry("   "), Entry::Done);
        assert_eq!(parse_entry("Quiet"), Entry::Keyword("quiet".to_string()));
        assert_eq!(
            parse_entry(" Electric : TRUE "),
            Entry::Attribute("electric".to_string(), AttributeValue::Bool(true))
        );
        assert_eq!(
            parse_entry("subscription_required:false"),
            Entry::Attribute("subscription_required".to_string(), AttributeValue::Bool(false))
        );
        assert_eq!(
            parse_entry("bins:2"),
            Entry::Attribute("bins".to_string(), AttributeValue::Int(2))
        );
        assert_eq!(
            parse_entry("RAM:16GB"),
            Entry::Attribute("ram".to_string(), AttributeValue::text("16gb"))
        );
        assert_eq!(
            parse_entry("screen_size:15 inch"),
            Entry::Attribute("screen_size".to_string(), AttributeValue::text("15 inch"))
        );
        assert!(matches!(parse_entry(":true"), Entry::Invalid(_)));
    }

    #[test]
    fn test_parse_entry_splits_on_first_colon() {
        assert_eq!(
            parse_entry("note:ratio 1:2"),
            Entry::Attribute("note".to_string(), AttributeValue::text("ratio 1:2"))
        );
    }

    #[tokio::test]
    async fn test_new_targeted_search_saves_filters() {
        let mut h = harness(vec![
            hit("Quiet Electric Composter", "odor control"),
            hit("Manual Compost Tumbler", "quiet"),
            hit("Electric Composter", "loud"),
        ]);

        let script = "1\nkitchen composter\nelectric:true\nquiet\n\nno\nexit\n";
        let out = run_script(&mut h.concierge, script).await;

        assert_eq!(
            h.queries.lock().unwrap().as_slice(),
            ["kitchen composter quiet".to_string()]
        );
        assert!(out.contains("1. Quiet Electric Composter"));
        assert!(!out.contains("Manual Compost Tumbler |"));
        assert!(out.contains("Preferences for 'kitchen composter' saved."));
        assert!(h.sink.writes.lock().unwrap().is_empty());

        let record = h.concierge.store().recall("kitchen composter").unwrap();
        match &record.preferences {
            Preferences::Filters(filters) => {
                assert_eq!(filters.keywords, vec!["quiet".to_string()]);
                assert_eq!(filters.attributes["electric"], AttributeValue::Bool(true));
            }
            other => panic!("unexpected preferences {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_more_than_five_results_export_automatically() {
        let hits = (0..7)
            .map(|i| hit(&format!("Laptop {} Intel i5 8GB RAM", i), ""))
            .collect();
        let mut h = harness(hits);

        let out = run_script(&mut h.concierge, "1\nlaptop\n\nexit\n").await;

        assert!(out.contains(" 5. Laptop 4"));
        assert!(!out.contains(" 6. Laptop 5"));
        let writes = h.sink.writes.lock().unwrap();
        assert_eq!(writes.len(), 1);
        assert!(writes[0].0.starts_with("laptop_Targeted_Results_"));
        assert_eq!(writes[0].1.rows.len(), 7);
        assert!(writes[0].1.headers.contains(&"cpu".to_string()));
    }

    #[tokio::test]
    async fn test_recall_reuses_saved_filters() {
        let mut h = harness(vec![hit("Quiet Electric Composter", "")]);
        let mut filters = SearchFilters::default();
        filters
            .attributes
            .insert("electric".to_string(), AttributeValue::Bool(true));
        h.concierge
            .store
            .save("composter", Preferences::Filters(filters), Some("baby sleeps nearby"))
            .unwrap();

        let out = run_script(&mut h.concierge, "1\ncomposter\nyes\nexit\n").await;

        assert!(out.contains("Found saved preferences for 'composter'"));
        assert!(out.contains("Previous note: baby sleeps nearby"));
        assert!(out.contains("Products found with saved filters:"));
        assert!(out.contains("1. Quiet Electric Composter"));
        assert_eq!(h.queries.lock().unwrap().as_slice(), ["composter".to_string()]);
    }

    #[tokio::test]
    async fn test_declined_recall_keeps_new_note() {
        let mut h = harness(vec![hit("Small Compact Composter", "")]);
        h.concierge
            .store
            .save("composter", Preferences::Filters(SearchFilters::default()), Some("old"))
            .unwrap();

        let script = "1\ncomposter\nno\nfor the balcony\nsmall\n\nno\nexit\n";
        run_script(&mut h.concierge, script).await;

        let record = h.concierge.store().recall("composter").unwrap();
        assert_eq!(record.note, "for the balcony");
        assert_eq!(
            record.preferences,
            Preferences::Filters(SearchFilters {
                keywords: vec!["small".to_string()],
                attributes: Default::default(),
            })
        );
    }

    #[tokio::test]
    async fn test_recall_with_no_results_offers_new_search() {
        let mut h = harness(vec![hit("Manual Compost Bin", "")]);
        let mut filters = SearchFilters::default();
        filters
            .attributes
            .insert("electric".to_string(), AttributeValue::Bool(true));
        h.concierge
            .store
            .save("composter", Preferences::Filters(filters), Some("keep"))
            .unwrap();

        let script = "1\ncomposter\ny\nyes\nbin\n\nno\nexit\n";
        let out = run_script(&mut h.concierge, script).await;

        assert!(out.contains("No products found with saved filters."));
        let record = h.concierge.store().recall("composter").unwrap();
        assert_eq!(record.note, "keep");
        match &record.preferences {
            Preferences::Filters(f) => assert_eq!(f.keywords, vec!["bin".to_string()]),
            other => panic!("unexpected preferences {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_search_failure_reports_no_products() {
        let mut h = harness(Vec::new());
        let out = run_script(&mut h.concierge, "1\nlaptop\nwaterproof\n\nexit\n").await;

        assert!(out.contains("No products found matching your criteria."));
        assert!(h.concierge.store().recall("laptop").is_some());
    }
}
