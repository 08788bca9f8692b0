use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use regex::Regex;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use wreq::Client;
use wreq_util::Emulation;

use crate::config::SearchSection;
use crate::models::{Product, SearchFilters, ShoppingHit, ShoppingResponse};
use crate::processor::{FeatureExtractor, filter_products};

/// Source of raw shopping hits for a free-text query.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn fetch_hits(&self, query: &str) -> Result<Vec<ShoppingHit>>;
}

/// Google Shopping results through SerpAPI.
pub struct SerpApiClient {
    client: Client,
    config: SearchSection,
    api_key: Option<String>,
}

impl SerpApiClient {
    pub fn new(config: SearchSection, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .emulation(Emulation::Firefox136)
            .build()?;

        if api_key.is_none() {
            warn!(
                "{} is not set; shopping searches will return no results",
                config.api_key_var()
            );
        }

        Ok(SerpApiClient { client, config, api_key })
    }

    fn query_params(&self, query: &str, api_key: &str) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("engine", self.config.engine.clone()),
            ("q", query.to_string()),
            ("tbm", self.config.tbm.clone()),
            ("api_key", api_key.to_string()),
        ];

        if let Some(country) = &self.config.country {
            params.push(("gl", country.clone()));
        }
        if let Some(language) = &self.config.language {
            params.push(("hl", language.clone()));
        }

        params
    }
}

#[async_trait]
impl SearchProvider for SerpApiClient {
    async fn fetch_hits(&self, query: &str) -> Result<Vec<ShoppingHit>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("Missing environment variable: {}", self.config.api_key_var()))?;

        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&self.query_params(query, api_key))
            .send()
            .await
            .context("Failed to send shopping search request")?;

        if !response.status().is_success() {
            return Err(anyhow!("HTTP error: {}", response.status()));
        }

        let body: ShoppingResponse = response
            .json()
            .await
            .context("Failed to parse shopping search response")?;

        if let Some(message) = body.error {
            return Err(anyhow!("Search provider error: {}", message));
        }

        Ok(body.shopping_results)
    }
}

/// Runs shopping searches and turns hits into [`Product`]s.
///
/// Provider failures and timeouts are logged and reported as an empty result list so
/// a workflow can carry on with "no products found".
pub struct SearchClient {
    provider: Box<dyn SearchProvider>,
    extractor: Box<dyn FeatureExtractor>,
    timeout: Duration,
    price_pattern: Regex,
}

impl SearchClient {
    pub fn new(
        provider: Box<dyn SearchProvider>,
        extractor: Box<dyn FeatureExtractor>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(SearchClient {
            provider,
            extractor,
            timeout,
            price_pattern: Regex::new(r"(\d+(?:\.\d+)?)")?,
        })
    }

    pub fn extractor(&self) -> &dyn FeatureExtractor {
        self.extractor.as_ref()
    }

    pub fn build_query(category: &str, keywords: &[String]) -> String {
        format!("{} {}", category, keywords.join(" ")).trim().to_string()
    }

    pub async fn fetch_hits(&self, query: &str) -> Vec<ShoppingHit> {
        let search_id = Uuid::new_v4();
        info!(%search_id, "Performing search query: '{}'", query);

        match tokio::time::timeout(self.timeout, self.provider.fetch_hits(query)).await {
            Ok(Ok(hits)) => {
                info!(%search_id, "Products found: {}", hits.len());
                hits
            }
            Ok(Err(e)) => {
                error!(%search_id, "Error during shopping search: {:#}", e);
                Vec::new()
            }
            Err(_) => {
                error!(%search_id, "Shopping search timed out after {:?}", self.timeout);
                Vec::new()
            }
        }
    }

    /// Searches `category` plus the filter keywords, then keeps the products that pass
    /// every keyword and attribute constraint.
    pub async fn search_products(&self, category: &str, filters: &SearchFilters) -> Vec<Product> {
        let query = Self::build_query(category, &filters.keywords);
        let products: Vec<Product> = self
            .fetch_hits(&query)
            .await
            .into_iter()
            .map(|hit| self.to_product(hit))
            .collect();

        let filtered = filter_products(products, &filters.keywords, &filters.attributes);
        info!("After filtering: {}", filtered.len());
        filtered
    }

    pub fn to_product(&self, hit: ShoppingHit) -> Product {
        let description = hit.snippet.unwrap_or_default();
        let attributes = self.extractor.extract(&hit.title, &description);
        debug!("Extracted {} attributes from '{}'", attributes.len(), hit.title);

        let price = hit
            .extracted_price
            .or_else(|| hit.price.as_deref().and_then(|p| self.parse_price(p)));

        Product {
            name: hit.title,
            price,
            url: hit.link.or(hit.product_link).unwrap_or_default(),
            source: hit.source.unwrap_or_default(),
            image: hit.thumbnail.unwrap_or_default(),
            description,
            attributes,
        }
    }

    fn parse_price(&self, raw: &str) -> Option<f64> {
        let cleaned = raw.replace(',', "");
        self.price_pattern
            .captures(&cleaned)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok())
    }
}
