pub mod config;
pub mod parser;
pub mod schedule;
pub mod scraper;
pub mod status;
pub mod text;
pub mod types;
pub mod utils;

pub use config::{SiteConfig, UrlOrder};
pub use scraper::{ScraperError, WebScraper};
pub use types::{CollectionBuilder, Day, ExtractedFields, Feature, FeatureCollection, Schedule};

pub(crate) const BASE_URL: &str = "https://www.paris.fr";
pub(crate) const LISTING_PATH: &str = "/lieux/piscines/tous-les-horaires";
pub(crate) const DETAIL_PREFIX: &str = "/lieux/";
