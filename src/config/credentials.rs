use anyhow::{Context, Result};
use std::env;

use super::ConciergeConfig;

/// Secrets pulled from the environment. The config file only names the variables.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub search_api_key: Option<String>,
    pub sheets_access_token: Option<String>,
}

impl Credentials {
    pub fn from_env(config: &ConciergeConfig) -> Self {
        Self {
            search_api_key: read_var(config.search.api_key_var()),
            sheets_access_token: read_var(config.export.access_token_var()),
        }
    }

    pub fn search_api_key(&self) -> Result<&str> {
        self.search_api_key
            .as_deref()
            .context("Search API key not loaded")
    }

    pub fn sheets_access_token(&self) -> Result<&str> {
        self.sheets_access_token
            .as_deref()
            .context("Spreadsheet access token not loaded")
    }
}

fn read_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
