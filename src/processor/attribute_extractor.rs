use anyhow::Result;
use regex::Regex;
use std::collections::BTreeSet;

use crate::models::{AttributeSet, AttributeValue};

/// Turns free product text into an [`AttributeSet`].
///
/// The built-in implementation is a keyword table; a text-understanding backend can
/// be plugged in behind the same trait without touching callers.
pub trait FeatureExtractor: Send + Sync {
    fn extract(&self, title: &str, description: &str) -> AttributeSet;

    /// Attribute keys this extractor can produce, if it knows them up front.
    fn vocabulary(&self) -> Vec<String> {
        Vec::new()
    }
}

#[derive(Debug, Clone, Copy)]
enum Fixed {
    Yes,
    No,
    Text(&'static str),
}

impl Fixed {
    fn to_value(self) -> AttributeValue {
        match self {
            Fixed::Yes => AttributeValue::Bool(true),
            Fixed::No => AttributeValue::Bool(false),
            Fixed::Text(s) => AttributeValue::text(s),
        }
    }
}

#[derive(Debug)]
enum Rule {
    /// Sets `key` whenever one of the keywords is present, unless `unless` is already set.
    Match {
        key: &'static str,
        any_of: &'static [&'static str],
        value: Fixed,
        unless: Option<&'static str>,
    },
    /// Needs one of `requires` first, then walks the options in order and stops at
    /// the first one that fires.
    FirstOf {
        key: &'static str,
        requires: &'static [&'static str],
        options: &'static [(&'static [&'static str], Fixed)],
    },
}

impl Rule {
    fn key(&self) -> &'static str {
        match self {
            Rule::Match { key, .. } | Rule::FirstOf { key, .. } => *key,
        }
    }
}

const fn flag(key: &'static str, any_of: &'static [&'static str]) -> Rule {
    Rule::Match { key, any_of, value: Fixed::Yes, unless: None }
}

const fn text(key: &'static str, any_of: &'static [&'static str], value: &'static str) -> Rule {
    Rule::Match { key, any_of, value: Fixed::Text(value), unless: None }
}

// Rules sharing a key are declared lowest precedence first: the last match wins.
// Size groups therefore keep the smallest size mentioned ("4GB RAM, up to 16GB RAM").
const RULES: &[Rule] = &[
    // General
    flag("electric", &["electric", "электрический"]),
    flag("quietness", &["quiet", "бесшумный", "silent"]),
    flag("wireless", &["wireless", "беспроводной"]),
    flag("waterproof", &["waterproof", "водонепроницаемый"]),
    flag("compact", &["compact", "компактный"]),
    flag("portable", &["portable", "портативный"]),
    flag("durable", &["durable", "долговечный"]),
    // Laptops
    Rule::FirstOf {
        key: "cpu",
        requires: &["intel", "amd"],
        options: &[
            (&["i3"], Fixed::Text("intel i3")),
            (&["i5"], Fixed::Text("intel i5")),
            (&["i7"], Fixed::Text("intel i7")),
            (&["i9"], Fixed::Text("intel i9")),
            (&["ryzen 3"], Fixed::Text("amd ryzen 3")),
            (&["ryzen 5"], Fixed::Text("amd ryzen 5")),
            (&["ryzen 7"], Fixed::Text("amd ryzen 7")),
            (&["ryzen 9"], Fixed::Text("amd ryzen 9")),
            (&["ryzen"], Fixed::Text("amd ryzen")),
            (&["intel"], Fixed::Text("intel")),
            (&["amd"], Fixed::Text("amd")),
        ],
    },
    text("ram", &["32gb ram", "32гб озу"], "32gb"),
    text("ram", &["16gb ram", "16гб озу"], "16gb"),
    text("ram", &["8gb ram", "8гб озу"], "8gb"),
    text("ram", &["4gb ram", "4гб озу"], "4gb"),
    text("storage", &["1tb ssd", "1тб ssd"], "1tb ssd"),
    text("storage", &["512gb ssd", "512гб ssd"], "512gb ssd"),
    text("storage", &["256gb ssd", "256гб ssd"], "256gb ssd"),
    text("storage", &["128gb ssd", "128гб ssd"], "128gb ssd"),
    Rule::Match {
        key: "storage_type",
        any_of: &["hdd", "жесткий диск"],
        value: Fixed::Text("hdd"),
        unless: Some("storage"),
    },
    text("gpu", &["integrated graphics", "intel iris"], "integrated"),
    text("gpu", &["nvidia", "geforce", "rtx", "radeon"], "dedicated"),
    text("screen_size", &["17 inch", "17\""], "17 inch"),
    text("screen_size", &["15 inch", "15\""], "15 inch"),
    text("screen_size", &["14 inch", "14\""], "14 inch"),
    text("screen_size", &["13 inch", "13\""], "13 inch"),
    flag("touchscreen", &["touchscreen", "сенсорный экран"]),
    text("resolution", &["full hd", "fhd"], "full hd"),
    text("resolution", &["4k", "uhd"], "4k"),
    text("battery_life", &["long battery life", "10+ hours"], "long"),
    // Composters
    text("bin_size", &["compact", "маленький", "small"], "small"),
    text("bin_size", &["large capacity", "большая емкость", "10l"], "large"),
    flag("odor_control", &["odor control", "контроль запаха", "odorless"]),
    Rule::Match {
        key: "subscription_required",
        any_of: &["no subscription", "без подписки"],
        value: Fixed::No,
        unless: None,
    },
];

/// Matches whole keywords only: "intel" does not fire inside "intelligent", nor
/// "4gb ram" inside "64gb ram".
#[derive(Debug)]
struct Keywords(Regex);

impl Keywords {
    fn new(any_of: &[&str]) -> Result<Self> {
        let alternatives = any_of
            .iter()
            .map(|k| regex::escape(k))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&format!(r"(?:^|\W)(?:{})(?:\W|$)", alternatives))?;
        Ok(Keywords(pattern))
    }

    fn found_in(&self, title: &str, description: &str) -> bool {
        self.0.is_match(title) || self.0.is_match(description)
    }
}

#[derive(Debug)]
enum Check {
    Match {
        key: &'static str,
        keywords: Keywords,
        value: Fixed,
        unless: Option<&'static str>,
    },
    FirstOf {
        key: &'static str,
        requires: Keywords,
        options: Vec<(Keywords, Fixed)>,
    },
}

impl Check {
    fn compile(rule: &Rule) -> Result<Self> {
        Ok(match rule {
            Rule::Match { key, any_of, value, unless } => Check::Match {
                key: *key,
                keywords: Keywords::new(any_of)?,
                value: *value,
                unless: *unless,
            },
            Rule::FirstOf { key, requires, options } => Check::FirstOf {
                key: *key,
                requires: Keywords::new(requires)?,
                options: options
                    .iter()
                    .map(|(any_of, value)| Ok((Keywords::new(any_of)?, *value)))
                    .collect::<Result<_>>()?,
            },
        })
    }
}

#[derive(Debug)]
pub struct RuleBasedExtractor {
    checks: Vec<Check>,
}

impl RuleBasedExtractor {
    pub fn new() -> Result<Self> {
        let checks = RULES.iter().map(Check::compile).collect::<Result<_>>()?;
        Ok(RuleBasedExtractor { checks })
    }
}

impl FeatureExtractor for RuleBasedExtractor {
    fn extract(&self, title: &str, description: &str) -> AttributeSet {
        let title = title.to_lowercase();
        let description = description.to_lowercase();

        let mut features = AttributeSet::new();
        for check in &self.checks {
            match check {
                Check::Match { key, keywords, value, unless } => {
                    if unless.is_some_and(|other| features.contains_key(other)) {
                        continue;
                    }
                    if keywords.found_in(&title, &description) {
                        features.insert(key.to_string(), value.to_value());
                    }
                }
                Check::FirstOf { key, requires, options } => {
                    if !requires.found_in(&title, &description) {
                        continue;
                    }
                    if let Some((_, value)) = options
                        .iter()
                        .find(|(keywords, _)| keywords.found_in(&title, &description))
                    {
                        features.insert(key.to_string(), value.to_value());
                    }
                }
            }
        }

        features
    }

    fn vocabulary(&self) -> Vec<String> {
        RULES
            .iter()
            .map(Rule::key)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}
