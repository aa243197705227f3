// Ingestion source configuration
//
// The release listing lives on the GitHub API; each taxi color maps to a
// fixed release that holds one CSV asset per month.

use serde::{Deserialize, Serialize};

use crate::{IngestError, Result};

/// Release holding the yellow taxi monthly CSVs
const YELLOW_RELEASE_ID: &str = "71974786";

/// Release holding the green taxi monthly CSVs
const GREEN_RELEASE_ID: &str = "71979983";

/// Configuration for the release-asset discovery endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Base URL of the releases API (e.g., "https://api.github.com")
    pub api_base_url: String,

    /// Repository holding the trip-data releases ("owner/name")
    pub release_repo: String,

    /// HTTP timeout in seconds
    pub timeout_secs: u64,

    /// Page size for the asset listing
    pub page_size: u32,

    /// User agent sent with every request (the GitHub API requires one)
    pub user_agent: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        IngestConfig {
            api_base_url: "https://api.github.com".to_string(),
            release_repo: "DataTalksClub/nyc-tlc-data".to_string(),
            timeout_secs: 300,
            page_size: 100,
            user_agent: "tlc-ingest/0.1".to_string(),
        }
    }
}

impl IngestConfig {
    /// Create new config with builder pattern
    pub fn builder() -> IngestConfigBuilder {
        IngestConfigBuilder::default()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        IngestConfig {
            api_base_url: std::env::var("TLC_API_BASE_URL").unwrap_or(default.api_base_url),
            release_repo: std::env::var("TLC_RELEASE_REPO").unwrap_or(default.release_repo),
            timeout_secs: std::env::var("TLC_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.timeout_secs),
            page_size: std::env::var("TLC_PAGE_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.page_size),
            user_agent: std::env::var("TLC_USER_AGENT").unwrap_or(default.user_agent),
        }
    }

    /// URL of the asset listing for a release
    pub fn assets_url(&self, release_id: &str) -> String {
        format!(
            "{}/repos/{}/releases/{}/assets",
            self.api_base_url.trim_end_matches('/'),
            self.release_repo,
            release_id
        )
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_base_url.is_empty() {
            return Err(IngestError::Config("API base URL cannot be empty".to_string()));
        }

        if self.release_repo.is_empty() {
            return Err(IngestError::Config("Release repo cannot be empty".to_string()));
        }

        if self.timeout_secs == 0 {
            return Err(IngestError::Config("Timeout must be greater than 0".to_string()));
        }

        if self.page_size == 0 {
            return Err(IngestError::Config("Page size must be greater than 0".to_string()));
        }

        Ok(())
    }
}

/// Builder for IngestConfig
#[derive(Debug, Default)]
pub struct IngestConfigBuilder {
    api_base_url: Option<String>,
    release_repo: Option<String>,
    timeout_secs: Option<u64>,
    page_size: Option<u32>,
    user_agent: Option<String>,
}

impl IngestConfigBuilder {
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    pub fn release_repo(mut self, repo: impl Into<String>) -> Self {
        self.release_repo = Some(repo.into());
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn build(self) -> IngestConfig {
        let default = IngestConfig::default();

        IngestConfig {
            api_base_url: self.api_base_url.unwrap_or(default.api_base_url),
            release_repo: self.release_repo.unwrap_or(default.release_repo),
            timeout_secs: self.timeout_secs.unwrap_or(default.timeout_secs),
            page_size: self.page_size.unwrap_or(default.page_size),
            user_agent: self.user_agent.unwrap_or(default.user_agent),
        }
    }
}

// ============================================================================
// Taxi Color
// ============================================================================

/// Taxi color, mapped to its fixed release identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TaxiColor {
    Yellow,
    Green,
}

impl TaxiColor {
    /// Release identifier in the trip-data repository
    pub fn release_id(self) -> &'static str {
        match self {
            TaxiColor::Yellow => YELLOW_RELEASE_ID,
            TaxiColor::Green => GREEN_RELEASE_ID,
        }
    }

    /// Destination table name for this color
    pub fn table_name(self) -> String {
        format!("{}_taxi", self)
    }
}

impl std::fmt::Display for TaxiColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaxiColor::Yellow => write!(f, "yellow"),
            TaxiColor::Green => write!(f, "green"),
        }
    }
}

impl std::str::FromStr for TaxiColor {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "yellow" => Ok(TaxiColor::Yellow),
            "green" => Ok(TaxiColor::Green),
            other => Err(IngestError::Config(format!("Unknown taxi color: {}", other))),
        }
    }
}

// ============================================================================
// Period
// ============================================================================

/// Year-month period token ("YYYY-MM"), validated at construction.
///
/// Matching against asset URLs is plain substring containment; the token is
/// never normalized further.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Period(String);

impl Period {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Period {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self> {
        let pattern = regex::Regex::new(r"^(\d{4})-(\d{2})$")
            .map_err(|e| IngestError::Config(e.to_string()))?;

        let captures = pattern.captures(s).ok_or_else(|| {
            IngestError::Config(format!("Invalid period '{}': expected YYYY-MM", s))
        })?;

        let month: u32 = captures[2]
            .parse()
            .map_err(|_| IngestError::Config(format!("Invalid period '{}'", s)))?;
        if !(1..=12).contains(&month) {
            return Err(IngestError::Config(format!(
                "Invalid period '{}': month must be 01-12",
                s
            )));
        }

        Ok(Period(s.to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================
