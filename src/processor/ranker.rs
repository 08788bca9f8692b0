use crate::models::{Priorities, Product};

pub const TOP_N: usize = 5;

/// Sum of the weights whose attribute is present on the product and not `false`.
pub fn score(product: &Product, priorities: &Priorities) -> u32 {
    priorities
        .iter()
        .filter(|(key, _)| {
            product
                .attributes
                .get(key.as_str())
                .is_some_and(|value| value.is_truthy())
        })
        .map(|(_, weight)| u32::from(*weight))
        .sum()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredProduct {
    pub score: u32,
    pub product: Product,
}

/// Scores and sorts descending. Equal scores keep their candidate order.
pub fn rank(products: &[Product], priorities: &Priorities) -> Vec<ScoredProduct> {
    let mut scored: Vec<ScoredProduct> = products
        .iter()
        .map(|p| ScoredProduct {
            score: score(p, priorities),
            product: p.clone(),
        })
        .collect();

    // sort_by is stable
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored
}

pub fn top_matches(products: &[Product], priorities: &Priorities) -> Vec<ScoredProduct> {
    let mut ranked = rank(products, priorities);
    ranked.truncate(TOP_N);
    ranked
}
