use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;
use tracing::info;

use crate::models::Product;

pub const BASE_COLUMNS: [&str; 5] = ["name", "price", "url", "source", "image"];

/// Rows ready for a spreadsheet: fixed product columns followed by every attribute
/// key seen across the products, sorted.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ExportTable {
    pub fn from_products(products: &[Product]) -> Self {
        let attribute_keys: BTreeSet<&str> = products
            .iter()
            .flat_map(|p| p.attributes.keys().map(String::as_str))
            .filter(|key| !BASE_COLUMNS.contains(key))
            .collect();

        let headers: Vec<String> = BASE_COLUMNS
            .iter()
            .copied()
            .chain(attribute_keys.iter().copied())
            .map(str::to_string)
            .collect();

        let rows = products
            .iter()
            .map(|p| {
                let mut row = vec![
                    p.name.clone(),
                    p.price_label(),
                    p.url.clone(),
                    p.source.clone(),
                    p.image.clone(),
                ];
                row.extend(attribute_keys.iter().map(|key| {
                    p.attributes
                        .get(*key)
                        .map(|v| v.to_string())
                        .unwrap_or_default()
                }));
                row
            })
            .collect();

        Self { headers, rows }
    }

    /// Header row followed by the data rows.
    pub fn to_values(&self) -> Vec<Vec<String>> {
        std::iter::once(self.headers.clone())
            .chain(self.rows.iter().cloned())
            .collect()
    }
}

/// Destination for exported tables. Writing the same name again replaces its contents.
#[async_trait]
pub trait ExportSink: Send + Sync {
    /// Returns a human-readable location (URL or path) of the written table.
    async fn write_table(&self, sheet_name: &str, table: &ExportTable) -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportMode {
    Targeted,
    Exploratory,
    Recalled,
}

impl fmt::Display for ExportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ExportMode::Targeted => "Targeted",
            ExportMode::Exploratory => "Exploratory",
            ExportMode::Recalled => "Recalled",
        };
        write!(f, "{}", label)
    }
}

pub fn sheet_name(category: &str, mode: ExportMode, at: DateTime<Local>) -> String {
    format!(
        "{}_{}_Results_{}",
        category.trim().replace(' ', "_"),
        mode,
        at.format("%Y%m%d_%H%M%S")
    )
}

/// Writes `products` through `sink`. An empty list is a no-op and returns `None`.
pub async fn export_products(
    sink: &dyn ExportSink,
    products: &[Product],
    sheet_name: &str,
    timeout: Duration,
) -> Result<Option<String>> {
    if products.is_empty() {
        info!("No data to export");
        return Ok(None);
    }

    let table = ExportTable::from_products(products);
    info!(
        "Exporting {} rows x {} columns to '{}'",
        table.rows.len(),
        table.headers.len(),
        sheet_name
    );

    let location = tokio::time::timeout(timeout, sink.write_table(sheet_name, &table))
        .await
        .map_err(|_| anyhow!("Export to '{}' timed out after {:?}", sheet_name, timeout))??;

    info!("Export written: {}", location);
    Ok(Some(location))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttributeSet, AttributeValue};
    use chrono::TimeZone;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        writes: Mutex<Vec<(String, ExportTable)>>,
    }

    #[async_trait]
    impl ExportSink for RecordingSink {
        async fn write_table(&self, sheet_name: &str, table: &ExportTable) -> Result<String> {
            self.writes
                .lock()
                .unwrap()
                .push((sheet_name.to_string(), table.clone()));
            Ok(format!("memory://{}", sheet_name))
        }
    }

    fn product(name: &str, price: Option<f64>, attributes: &[(&str, AttributeValue)]) -> Product {
        Product {
            name: name.to_string(),
            price,
            url: format!("https://shop.example/{}", name),
            source: "Example".to_string(),
            image: String::new(),
            description: String::new(),
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect::<AttributeSet>(),
        }
    }

    #[test]
    fn test_headers_are_base_plus_sorted_attribute_union() {
        let products = vec![
            product("a", Some(10.5), &[("ram", AttributeValue::text("8gb"))]),
            product(
                "b",
                None,
                &[
                    ("cpu", AttributeValue::text("intel i5")),
                    ("electric", AttributeValue::Bool(true)),
                ],
            ),
        ];

        let table = ExportTable::from_products(&products);
        assert_eq!(
            table.headers,
            vec!["name", "price", "url", "source", "image", "cpu", "electric", "ram"]
        );
        assert_eq!(
            table.rows[0],
            vec!["a", "10.5", "https://shop.example/a", "Example", "", "", "", "8gb"]
        );
        assert_eq!(
            table.rows[1],
            vec!["b", "N/A", "https://shop.example/b", "Example", "", "intel i5", "true", ""]
        );
        assert_eq!(table.to_values().len(), 3);
    }

    #[test]
    fn test_sheet_name() {
        let at = Local.with_ymd_and_hms(2025, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            sheet_name("kitchen composter", ExportMode::Targeted, at),
            "kitchen_composter_Targeted_Results_20250309_140507"
        );
    }

    #[tokio::test]
    async fn test_empty_export_is_noop() {
        let sink = RecordingSink::default();
        let location = export_products(&sink, &[], "laptop_Exploratory", Duration::from_secs(1))
            .await
            .unwrap();

        assert!(location.is_none());
        assert!(sink.writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_export_writes_table() {
        let sink = RecordingSink::default();
        let products = vec![product("a", Some(1.0), &[])];

        let location = export_products(&sink, &products, "sheet", Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(location.as_deref(), Some("memory://sheet"));
        let writes = sink.writes.lock().unwrap();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].1.headers.len(), BASE_COLUMNS.len());
    }
}
