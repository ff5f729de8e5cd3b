use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid base URL '{0}': expected an http(s) origin")]
    InvalidBaseUrl(String),
    #[error("Invalid detail prefix: {0}")]
    InvalidDetailPrefix(#[from] regex::Error),
    #[error("Invalid URL order '{0}'. Accepted values: 'sorted', 'discovery'")]
    InvalidUrlOrder(String),
}

/// Order in which discovered detail pages are fetched.
///
/// Discovery yields a set, so its native iteration order carries no meaning
/// and differs between runs. `Sorted` makes the output reproducible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UrlOrder {
    #[default]
    Sorted,
    Discovery,
}

impl FromStr for UrlOrder {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sorted" => Ok(UrlOrder::Sorted),
            "discovery" => Ok(UrlOrder::Discovery),
            _ => Err(ConfigError::InvalidUrlOrder(s.to_string())),
        }
    }
}

impl Display for UrlOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UrlOrder::Sorted => write!(f, "sorted"),
            UrlOrder::Discovery => write!(f, "discovery"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Origin prepended to every site-relative detail link.
    pub base_url: String,
    pub listing_url: String,
    /// Site-relative path every detail link starts with.
    pub detail_prefix: String,
    /// Pause between two consecutive requests.
    pub request_delay: Duration,
    pub timeout: Duration,
    pub accept_invalid_certs: bool,
    pub url_order: UrlOrder,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: crate::BASE_URL.to_string(),
            listing_url: format!("{}{}", crate::BASE_URL, crate::LISTING_PATH),
            detail_prefix: crate::DETAIL_PREFIX.to_string(),
            request_delay: Duration::from_millis(500),
            timeout: Duration::from_secs(30),
            accept_invalid_certs: false,
            url_order: UrlOrder::default(),
        }
    }
}

impl SiteConfig {
    /// Config pointing at another origin, listing page at the usual path.
    pub fn with_base_url(base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            listing_url: format!("{}{}", base_url, crate::LISTING_PATH),
            base_url,
            ..Self::default()
        }
    }

    pub fn origin(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn validate(self) -> Result<Self, ConfigError> {
        for url in [&self.base_url, &self.listing_url] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidBaseUrl(url.clone()));
            }
        }
        Ok(self)
    }
}
