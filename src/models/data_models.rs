use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single detected product characteristic.
///
/// Values are kept in a normalised form (booleans, integers, lowercase strings) so
/// filtering and scoring can compare them with plain equality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl AttributeValue {
    pub fn text(value: &str) -> Self {
        AttributeValue::Text(value.to_lowercase())
    }

    /// Anything other than an explicit `false` counts as present for ranking.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, AttributeValue::Bool(false))
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Bool(b) => write!(f, "{}", b),
            AttributeValue::Int(i) => write!(f, "{}", i),
            AttributeValue::Text(s) => write!(f, "{}", s),
        }
    }
}

pub type AttributeSet = BTreeMap<String, AttributeValue>;

/// A search hit after normalisation and attribute extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub price: Option<f64>,
    pub url: String,
    pub source: String,
    pub image: String,
    #[serde(default)]
    pub description: String,
    pub attributes: AttributeSet,
}

impl Product {
    pub fn price_label(&self) -> String {
        match self.price {
            Some(price) => format!("{}", price),
            None => "N/A".to_string(),
        }
    }
}

/// Shopping results payload as returned by the search provider.
#[derive(Debug, Default, Deserialize)]
pub struct ShoppingResponse {
    #[serde(default)]
    pub shopping_results: Vec<ShoppingHit>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShoppingHit {
    #[serde(default)]
    pub title: String,
    pub snippet: Option<String>,
    pub extracted_price: Option<f64>,
    pub price: Option<String>,
    pub link: Option<String>,
    pub product_link: Option<String>,
    pub source: Option<String>,
    pub thumbnail: Option<String>,
}

/// Explicit filters entered in a targeted search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    pub keywords: Vec<String>,
    pub attributes: AttributeSet,
}

/// Importance ratings (1-5) per attribute key, collected in an exploratory search.
pub type Priorities = BTreeMap<String, u8>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Preferences {
    Filters(SearchFilters),
    Priorities(Priorities),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceRecord {
    pub preferences: Preferences,
    pub timestamp: String,
    #[serde(default)]
    pub note: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attribute_value_untagged_json() {
        let set: AttributeSet = serde_json::from_value(json!({
            "electric": true,
            "ram": "16gb",
            "bins": 2
        }))
        .unwrap();

        assert_eq!(set["electric"], AttributeValue::Bool(true));
        assert_eq!(set["ram"], AttributeValue::Text("16gb".to_string()));
        assert_eq!(set["bins"], AttributeValue::Int(2));
    }

    #[test]
    fn test_truthiness() {
        assert!(AttributeValue::Bool(true).is_truthy());
        assert!(AttributeValue::text("dedicated").is_truthy());
        assert!(AttributeValue::Int(0).is_truthy());
        assert!(!AttributeValue::Bool(false).is_truthy());
    }

    #[test]
    fn test_preferences_shapes() {
        let filters: Preferences = serde_json::from_value(json!({
            "keywords": ["quiet"],
            "attributes": {"electric": true}
        }))
        .unwrap();
        assert!(matches!(filters, Preferences::Filters(_)));

        let priorities: Preferences =
            serde_json::from_value(json!({"cpu": 5, "ram": 3})).unwrap();
        match priorities {
            Preferences::Priorities(p) => assert_eq!(p["cpu"], 5),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_price_label() {
        let mut product = Product {
            name: "Composter".to_string(),
            price: Some(349.99),
            url: String::new(),
            source: String::new(),
            image: String::new(),
            description: String::new(),
            attributes: AttributeSet::new(),
        };
        assert_eq!(product.price_label(), "349.99");
        product.price = None;
        assert_eq!(product.price_label(), "N/A");
    }
}
