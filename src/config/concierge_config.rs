use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConciergeConfig {
    #[serde(default)]
    pub search: SearchSection,
    #[serde(default)]
    pub export: ExportSection,
    #[serde(default)]
    pub preferences: PreferencesSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSection {
    pub endpoint: String,
    pub engine: String,
    pub tbm: String,
    pub country: Option<String>,
    pub language: Option<String>,
    pub timeout_seconds: Option<u64>,
    // Name of the environment variable holding the API key
    pub env_api_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportBackend {
    Sheets,
    Csv,
    None,
}

impl FromStr for ExportBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sheets" => Ok(ExportBackend::Sheets),
            "csv" => Ok(ExportBackend::Csv),
            "none" => Ok(ExportBackend::None),
            other => Err(anyhow!("Unknown export backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSection {
    pub backend: ExportBackend,
    pub sheets_endpoint: String,
    pub drive_endpoint: String,
    pub timeout_seconds: Option<u64>,
    pub env_access_token: Option<String>,
    pub csv_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferencesSection {
    pub path: String,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            endpoint: "https://serpapi.com/search.json".to_string(),
            engine: "google".to_string(),
            tbm: "shop".to_string(),
            country: None,
            language: None,
            timeout_seconds: Some(20),
            env_api_key: None,
        }
    }
}

impl Default for ExportSection {
    fn default() -> Self {
        Self {
            backend: ExportBackend::Sheets,
            sheets_endpoint: "https://sheets.googleapis.com/v4".to_string(),
            drive_endpoint: "https://www.googleapis.com/drive/v3".to_string(),
            timeout_seconds: Some(30),
            env_access_token: None,
            csv_dir: None,
        }
    }
}

impl Default for PreferencesSection {
    fn default() -> Self {
        Self {
            path: "preferences.json".to_string(),
        }
    }
}

impl ConciergeConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: ConciergeConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        config.validate()?;
        Ok(config)
    }

    /// Loads `path` if it exists, otherwise falls back to the built-in defaults.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::from_file(path)
        } else {
            warn!("Config file not found at {}, using defaults", path);
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.search.endpoint.is_empty() {
            return Err(anyhow!("Search endpoint cannot be empty"));
        }

        if self.preferences.path.is_empty() {
            return Err(anyhow!("Preferences path cannot be empty"));
        }

        if self.export.backend == ExportBackend::Sheets
            && (self.export.sheets_endpoint.is_empty() || self.export.drive_endpoint.is_empty())
        {
            return Err(anyhow!("Sheets export needs both sheets_endpoint and drive_endpoint"));
        }

        Ok(())
    }
}

impl SearchSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.unwrap_or(20))
    }

    pub fn api_key_var(&self) -> &str {
        self.env_api_key.as_deref().unwrap_or("SERPAPI_KEY")
    }
}

impl ExportSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.unwrap_or(30))
    }

    pub fn access_token_var(&self) -> &str {
        self.env_access_token.as_deref().unwrap_or("GOOGLE_SHEETS_TOKEN")
    }

    pub fn csv_dir(&self) -> PathBuf {
        PathBuf::from(self.csv_dir.as_deref().unwrap_or("exports"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = ConciergeConfig::default();
        assert_eq!(config.search.endpoint, "https://serpapi.com/search.json");
        assert_eq!(config.search.api_key_var(), "SERPAPI_KEY");
        assert_eq!(config.search.timeout(), Duration::from_secs(20));
        assert_eq!(config.export.backend, ExportBackend::Sheets);
        assert_eq!(config.export.access_token_var(), "GOOGLE_SHEETS_TOKEN");
        assert_eq!(config.export.csv_dir(), PathBuf::from("exports"));
        assert_eq!(config.preferences.path, "preferences.json");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[search]
endpoint = "http://localhost:8080/search.json"
engine = "google"
tbm = "shop"
country = "us"
timeout_seconds = 5
env_api_key = "TEST_SEARCH_KEY"

[export]
backend = "csv"
sheets_endpoint = ""
drive_endpoint = ""
csv_dir = "out"
"#
        )
        .unwrap();

        let config = ConciergeConfig::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.search.country.as_deref(), Some("us"));
        assert_eq!(config.search.timeout(), Duration::from_secs(5));
        assert_eq!(config.search.api_key_var(), "TEST_SEARCH_KEY");
        assert_eq!(config.export.backend, ExportBackend::Csv);
        assert_eq!(config.export.csv_dir(), PathBuf::from("out"));
        assert_eq!(config.preferences.path, "preferences.json");
    }

    #[test]
    fn test_section_fields_default_individually() {
        let config: ConciergeConfig = toml::from_str("[search]\ncountry = \"de\"\n").unwrap();
        assert_eq!(config.search.country.as_deref(), Some("de"));
        assert_eq!(config.search.tbm, "shop");
        assert_eq!(config.search.timeout(), Duration::from_secs(20));
    }

    #[test]
    fn test_sheets_backend_requires_endpoints() {
        let mut config = ConciergeConfig::default();
        config.export.drive_endpoint.clear();
        assert!(config.validate().is_err());

        config.export.backend = ExportBackend::None;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = ConciergeConfig::load_or_default("/nonexistent/concierge.toml").unwrap();
        assert_eq!(config.search.engine, "google");
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!("CSV".parse::<ExportBackend>().unwrap(), ExportBackend::Csv);
        assert_eq!("sheets".parse::<ExportBackend>().unwrap(), ExportBackend::Sheets);
        assert!("excel".parse::<ExportBackend>().is_err());
    }
}
