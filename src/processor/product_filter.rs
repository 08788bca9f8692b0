use crate::models::{AttributeSet, Product};

/// True when every keyword appears (case-insensitively) in the title or description.
pub fn matches_keywords(title: &str, description: &str, keywords: &[String]) -> bool {
    let title = title.to_lowercase();
    let description = description.to_lowercase();

    keywords.iter().all(|word| {
        let word = word.to_lowercase();
        title.contains(&word) || description.contains(&word)
    })
}

/// True when every required key is present with an exactly equal value.
pub fn matches_attributes(attributes: &AttributeSet, required: &AttributeSet) -> bool {
    required
        .iter()
        .all(|(key, value)| attributes.get(key) == Some(value))
}

/// Keeps the products satisfying both the keyword and attribute constraints, in input order.
pub fn filter_products(
    products: Vec<Product>,
    keywords: &[String],
    required: &AttributeSet,
) -> Vec<Product> {
    products
        .into_iter()
        .filter(|p| {
            matches_keywords(&p.name, &p.description, keywords)
                && matches_attributes(&p.attributes, required)
        })
        .collect()
}
