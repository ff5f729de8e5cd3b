use std::collections::HashSet;

use reqwest::Client;

use crate::config::{ConfigError, SiteConfig, UrlOrder};
use crate::parser::{LinkDiscoverer, extract_fields};
use crate::types::{CollectionBuilder, ExtractedFields, Feature, FeatureCollection};
use crate::utils::HarvestStats;

#[derive(Debug, thiserror::Error)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone)]
pub struct WebScraper {
    client: Client,
    config: SiteConfig,
    discoverer: LinkDiscoverer,
}

impl WebScraper {
    pub fn new(config: SiteConfig) -> Result<Self, ScraperError> {
        let config = config.validate()?;
        let discoverer = LinkDiscoverer::new(&config)?;

        if config.accept_invalid_certs {
            log::warn!("TLS certificate verification is disabled");
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .user_agent(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self {
            client,
            config,
            discoverer,
        })
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Detail page URLs found on the listing page, in the configured order.
    pub async fn fetch_links(&self) -> Result<Vec<String>, ScraperError> {
        log::info!("Fetching listing page {}...", self.config.listing_url);
        let html = self.fetch_html(&self.config.listing_url).await?;
        let links = self.discoverer.discover(&html);
        log::info!(
            "Found {} pool links, fetching in {} order",
            links.len(),
            self.config.url_order
        );
        Ok(order_links(links, self.config.url_order))
    }

    pub async fn fetch_pool(&self, url: &str) -> Result<ExtractedFields, ScraperError> {
        let html = self.fetch_html(url).await?;
        Ok(extract_fields(&html))
    }

    /// Fetches every pool on the listing page, one at a time, and collects
    /// the ones that could be placed on a map.
    ///
    /// Only a failure to load the listing page is an error. A pool whose
    /// page cannot be fetched, or that has no coordinates, is skipped.
    pub async fn harvest(&self) -> Result<(FeatureCollection, HarvestStats), ScraperError> {
        let links = self.fetch_links().await?;
        let mut stats = HarvestStats {
            discovered: links.len(),
            ..HarvestStats::default()
        };
        let mut builder = CollectionBuilder::new();

        for (i, url) in links.iter().enumerate() {
            if i > 0 && !self.config.request_delay.is_zero() {
                tokio::time::sleep(self.config.request_delay).await;
            }

            log::info!("[{}/{}] Processing {}...", i + 1, links.len(), url);
            let fields = match self.fetch_pool(url).await {
                Ok(fields) => fields,
                Err(e) => {
                    log::warn!("Skipping {}: {}", url, e);
                    stats.fetch_failed += 1;
                    continue;
                }
            };

            match Feature::assemble(fields, url) {
                Some(feature) => builder.push(feature),
                None => stats.missing_coordinates += 1,
            }
        }

        stats.collected = builder.len();
        log::info!("Collected {} pools out of {}", stats.collected, stats.discovered);
        Ok((builder.build(), stats))
    }

    /// Body of a successful GET. Any non-2xx status is an error.
    pub async fn fetch_html(&self, url: &str) -> Result<String, ScraperError> {
        Ok(self
            .client
            .get(url)
            .send()
            .await
            .inspect_err(|e| log::error!("HTTP error: {e:?}"))?
            .error_for_status()?
            .text()
            .await
            .inspect_err(|e| log::error!("Decode error: {e:?}"))?)
    }
}

fn order_links(links: HashSet<String>, order: UrlOrder) -> Vec<String> {
    let mut links: Vec<String> = links.into_iter().collect();
    if order == UrlOrder::Sorted {
        links.sort();
    }
    links
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_links_sorted() {
        let links: HashSet<String> = ["https://x/lieux/c-3", "https://x/lieux/a-1", "https://x/lieux/b-2"]
            .into_iter()
            .map(str::to_string)
            .collect();

        assert_eq!(
            order_links(links, UrlOrder::Sorted),
            ["https://x/lieux/a-1", "https://x/lieux/b-2", "https://x/lieux/c-3"]
        );
    }

    #[test]
    fn test_order_links_discovery_keeps_every_link() {
        let links: HashSet<String> = ["https://x/lieux/c-3", "https://x/lieux/a-1"]
            .into_iter()
            .map(str::to_string)
            .collect();

        let mut ordered = order_links(links, UrlOrder::Discovery);
        assert_eq!(ordered.len(), 2);
        ordered.sort();
        assert_eq!(ordered, ["https://x/lieux/a-1", "https://x/lieux/c-3"]);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = SiteConfig {
            listing_url: "ftp://www.paris.fr/listing".to_string(),
            ..SiteConfig::default()
        };
        assert!(matches!(
            WebScraper::new(config),
            Err(ScraperError::Config(ConfigError::InvalidBaseUrl(_)))
        ));
    }
}
