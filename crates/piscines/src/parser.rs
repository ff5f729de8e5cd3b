use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::{ConfigError, SiteConfig};
use crate::schedule::extract_schedule;
use crate::text::normalize;
use crate::types::{ADDRESS_NOT_FOUND, ExtractedFields, Position, UNKNOWN_NAME};

const SIDEBAR_BLOCK: &str = r#"<div class="sidebar-section-content">"#;
const TITLE_SUFFIX: &str = " - Ville de Paris";

static RE_NAME_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<h1[^>]*class="title is-level-1"[^>]*>(.*?)</h1>"#)
        .expect("invalid regex: name heading")
});

static RE_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"<title>(.*?){}</title>",
        regex::escape(TITLE_SUFFIX)
    ))
    .expect("invalid regex: title")
});

static RE_ADDRESS_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*<strong>.*?</strong>\s*<br\s*/?>(.*)$")
        .expect("invalid regex: address block")
});

static RE_MAP_MARKERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"data-map-markers="\[\[(.*?),(.*?)\]\]""#).expect("invalid regex: map markers")
});

static RE_BASIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<div class=['"]places--pool-characteristics-description['"]>(.*?)</div>"#)
        .expect("invalid regex: basin description")
});

/// Finds detail-page links on the listing page.
///
/// Any `href` shaped like `<prefix><slug>-<id>` counts. The listing page only
/// links to pools, so slugs are not inspected further.
#[derive(Debug, Clone)]
pub struct LinkDiscoverer {
    origin: String,
    pattern: Regex,
}

impl LinkDiscoverer {
    pub fn new(config: &SiteConfig) -> Result<Self, ConfigError> {
        let pattern = Regex::new(&format!(
            r#"href="({}[^"]+-\d+)""#,
            regex::escape(&config.detail_prefix)
        ))?;

        Ok(Self {
            origin: config.origin().to_string(),
            pattern,
        })
    }

    pub fn discover(&self, listing_html: &str) -> HashSet<String> {
        self.pattern
            .captures_iter(listing_html)
            .map(|caps| format!("{}{}", self.origin, &caps[1]))
            .collect()
    }
}

pub fn extract_name(html: &str) -> String {
    if let Some(caps) = RE_NAME_HEADING.captures(html) {
        return normalize(&caps[1]);
    }

    if let Some(caps) = RE_TITLE.captures(html) {
        log::debug!("No title heading, falling back to <title>");
        return caps[1].trim().to_string();
    }

    log::debug!("No name found");
    UNKNOWN_NAME.to_string()
}

/// Address from the first sidebar block laid out as
/// `<strong>label</strong><br />address`.
///
/// Each block is bounded by its own first `</div>` so a label in one block
/// can never pair with text from the next.
pub fn extract_address(html: &str) -> String {
    html.match_indices(SIDEBAR_BLOCK)
        .find_map(|(start, open)| {
            let body = &html[start + open.len()..];
            let block = &body[..body.find("</div>")?];
            RE_ADDRESS_BLOCK
                .captures(block)
                .map(|caps| normalize(&caps[1]))
        })
        .unwrap_or_else(|| {
            log::debug!("No address block found");
            ADDRESS_NOT_FOUND.to_string()
        })
}

/// The map marker is written `[[lat,lon]]`; the result is longitude first.
pub fn extract_coordinates(html: &str) -> Option<Position> {
    let caps = RE_MAP_MARKERS.captures(html)?;
    let lat = parse_coordinate(&caps[1])?;
    let lon = parse_coordinate(&caps[2])?;
    Some(Position::from_lat_lon(lat, lon))
}

fn parse_coordinate(raw: &str) -> Option<f64> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => {
            log::debug!("Unusable map marker value: {:?}", raw);
            None
        }
    }
}

pub fn extract_basins(html: &str) -> Vec<String> {
    RE_BASIN
        .captures_iter(html)
        .map(|caps| normalize(&caps[1]))
        .filter(|basin| !basin.is_empty())
        .collect()
}

/// Runs every field extractor over one detail page. Never fails: missing
/// fields come back as sentinels, empty lists or `None`.
pub fn extract_fields(html: &str) -> ExtractedFields {
    ExtractedFields {
        name: extract_name(html),
        address: extract_address(html),
        coordinates: extract_coordinates(html),
        basins: extract_basins(html),
        schedule: extract_schedule(html),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Day;
    use std::fs;

    fn discoverer() -> LinkDiscoverer {
        LinkDiscoverer::new(&SiteConfig::default()).expect("Failed to build discoverer")
    }

    #[test]
    fn test_discover_links_from_fixture() {
        let html = fs::read_to_string("fixtures/listing.html").expect("Failed to read fixture");

        let links = discoverer().discover(&html);

        assert_eq!(links.len(), 3, "Duplicates should collapse: {links:?}");
        assert!(links.contains("https://www.paris.fr/lieux/piscine-suzanne-berlioux-les-halles-2916"));
        assert!(links.contains("https://www.paris.fr/lieux/espace-sportif-pontoise-2918"));
        assert!(links.contains("https://www.paris.fr/lieux/piscine-georges-vallerey-2930"));
        assert!(
            links.iter().all(|l| !l.contains("tous-les-horaires")),
            "Links without a numeric id should be ignored"
        );
    }

    #[test]
    fn test_discover_no_links() {
        let html = r#"<a href="/actualites/piscines">Actus</a><a href="https://example.com">x</a>"#;
        assert!(discoverer().discover(html).is_empty());
        assert!(discoverer().discover("").is_empty());
    }

    #[test]
    fn test_discover_duplicate_links_collapse() {
        let html = r#"
            <a href="/lieux/piscine-keller-2939">Keller</a>
            <a class="card" href="/lieux/piscine-keller-2939"><img /></a>
        "#;
        let links = discoverer().discover(html);
        assert_eq!(links.len(), 1);
        assert!(links.contains("https://www.paris.fr/lieux/piscine-keller-2939"));
    }

    #[test]
    fn test_discover_uses_configured_origin_and_prefix() {
        let config = SiteConfig {
            base_url: "http://localhost:8080/".to_string(),
            detail_prefix: "/equipements/".to_string(),
            ..SiteConfig::default()
        };
        let discoverer = LinkDiscoverer::new(&config).expect("Failed to build discoverer");
        let html = r#"
            <a href="/equipements/bassin-nordique-12">a</a>
            <a href="/lieux/piscine-keller-2939">b</a>
        "#;

        let links = discoverer.discover(html);
        assert_eq!(links.len(), 1);
        assert!(links.contains("http://localhost:8080/equipements/bassin-nordique-12"));
    }

    #[test]
    fn test_discover_keeps_mixed_use_slugs() {
        let html = r#"<a href="/lieux/centre-sportif-et-bibliotheque-42">x</a>"#;
        assert_eq!(discoverer().discover(html).len(), 1);
    }

    #[test]
    fn test_extract_name_from_heading() {
        let html = r#"<h1 class="title is-level-1" id="main-title">
            Piscine Suzanne Berlioux (Les Halles)

        </h1>"#;
        assert_eq!(extract_name(html), "Piscine Suzanne Berlioux (Les Halles)");
    }

    #[test]
    fn test_extract_name_heading_wins_over_title() {
        let html = r#"<title>Autre nom - Ville de Paris</title>
            <h1 class="title is-level-1"><span>Piscine</span> Keller</h1>"#;
        assert_eq!(extract_name(html), "Piscine Keller");
    }

    #[test]
    fn test_extract_name_falls_back_to_title() {
        let html = "<title>  Piscine Keller - Ville de Paris</title><h1 class=\"title\">x</h1>";
        assert_eq!(extract_name(html), "Piscine Keller");
    }

    #[test]
    fn test_extract_name_unknown() {
        assert_eq!(extract_name("<title>Piscine Keller</title>"), "Unknown");
        assert_eq!(extract_name(""), "Unknown");
    }

    #[test]
    fn test_extract_address() {
        let html = r#"<div class="sidebar-section-content"><strong>Piscine Suzanne Berlioux (Les Halles)</strong><br />10 place de la rotonde Forum des halles, Paris 1e</div>"#;
        assert_eq!(
            extract_address(html),
            "10 place de la rotonde Forum des halles, Paris 1e"
        );
    }

    #[test]
    fn test_extract_address_skips_unrelated_blocks() {
        let html = r#"
            <div class="sidebar-section-content">Métro : Les Halles (ligne 4)</div>
            <div class="sidebar-section-content"><strong>Tarifs</strong> 3,50 €</div>
            <div class="sidebar-section-content">
                <strong>Piscine Keller</strong>
                <br>14 rue de l'Ingénieur Robert Keller, Paris 15e
            </div>
        "#;
        assert_eq!(
            extract_address(html),
            "14 rue de l'Ingénieur Robert Keller, Paris 15e"
        );
    }

    #[test]
    fn test_extract_address_does_not_straddle_blocks() {
        let html = r#"
            <div class="sidebar-section-content">Accès handicapés</div>
            <p><strong>Note</strong><br />pas une adresse</div>
        "#;
        assert_eq!(extract_address(html), "Address not found");
    }

    #[test]
    fn test_extract_address_not_found() {
        assert_eq!(extract_address("<div>nothing</div>"), "Address not found");
    }

    #[test]
    fn test_extract_coordinates_lon_lat_order() {
        let html = r#"<div class="map" data-map-markers="[[48.862644,2.343597]]"></div>"#;
        let position = extract_coordinates(html).expect("Should find coordinates");
        assert_eq!(position.lon(), 2.343597);
        assert_eq!(position.lat(), 48.862644);
        assert_eq!(position, Position(2.343597, 48.862644));
    }

    #[test]
    fn test_extract_coordinates_missing_or_malformed() {
        assert!(extract_coordinates("<div class=\"map\"></div>").is_none());
        assert!(extract_coordinates(r#"data-map-markers="[[abc,2.34]]""#).is_none());
        assert!(extract_coordinates(r#"data-map-markers="[[48.8,NaN]]""#).is_none());
        assert!(
            extract_coordinates(r#"data-map-markers="[[48.8,2.3],[48.9,2.4]]""#).is_none(),
            "Several markers do not form a single pair"
        );
    }

    #[test]
    fn test_extract_coordinates_tolerates_spaces() {
        let html = r#"data-map-markers="[[ 48.8275, 2.2913 ]]""#;
        assert_eq!(
            extract_coordinates(html),
            Some(Position::from_lat_lon(48.8275, 2.2913))
        );
    }

    #[test]
    fn test_extract_basins_keeps_order_and_duplicates() {
        let html = r#"
            <div class="places--pool-characteristics-description"><strong>Longueur du bassin&nbsp;: </strong>
                25 mètres</div>
            <div class='places--pool-characteristics-description'>   </div>
            <div class="places--pool-characteristics-description"><strong>Profondeur&nbsp;: </strong> 2 mètres</div>
            <div class="places--pool-characteristics-description"><strong>Profondeur&nbsp;: </strong> 2 mètres</div>
        "#;
        assert_eq!(
            extract_basins(html),
            [
                "Longueur du bassin : 25 mètres",
                "Profondeur : 2 mètres",
                "Profondeur : 2 mètres",
            ]
        );
    }

    #[test]
    fn test_extract_basins_none() {
        assert!(extract_basins("<div class=\"places--pool\">x</div>").is_empty());
    }

    #[test]
    fn test_extract_fields_from_fixture() {
        let html = fs::read_to_string("fixtures/piscine_suzanne_berlioux.html")
            .expect("Failed to read fixture");

        let fields = extract_fields(&html);

        assert_eq!(fields.name, "Piscine Suzanne Berlioux (Les Halles)");
        assert_eq!(
            fields.address,
            "10 place de la rotonde Forum des halles, Paris 1e"
        );
        assert_eq!(
            fields.coordinates,
            Some(Position::from_lat_lon(48.862644, 2.343597))
        );
        assert_eq!(
            fields.basins,
            [
                "Longueur du bassin : 50 mètres",
                "Largeur du bassin : 20 mètres",
                "Profondeur : de 1,20 à 2 mètres",
                "Longueur du bassin : 20 mètres",
            ]
        );
        assert_eq!(
            fields.schedule.get(Day::Monday),
            Some("06 h 30 – 08 h 30 11 h 30 – 13 h 30")
        );
        assert_eq!(
            fields.schedule.get(Day::Tuesday),
            Some("07 h 00 – 08 h 30 11 h 30 – 22 h 00")
        );
        assert_eq!(fields.schedule.get(Day::Wednesday), Some("Fermé"));
        assert_eq!(
            fields.schedule.get(Day::Thursday),
            Some("07 h 00 – 08 h 30 11 h 30 – 23 h 30")
        );
        let saturday = fields
            .schedule
            .get(Day::Saturday)
            .expect("Saturday should be present");
        assert!(
            saturday.starts_with("08 h 00 – 18 h 00") && saturday.ends_with("© Ville de Paris"),
            "Last row runs to the end of the document: {saturday:?}"
        );
        assert!(fields.schedule.get(Day::Sunday).is_none());
        assert_eq!(fields.schedule.len(), 6);
        println!("{}", fields);
    }

    #[test]
    fn test_extract_fields_without_coordinates_fixture() {
        let html = fs::read_to_string("fixtures/piscine_sans_coordonnees.html")
            .expect("Failed to read fixture");

        let fields = extract_fields(&html);

        assert_eq!(fields.name, "Piscine Georges Vallerey");
        assert_eq!(fields.address, "Address not found");
        assert!(fields.coordinates.is_none());
        assert!(fields.basins.is_empty());
        assert!(fields.schedule.is_empty());
    }

    #[test]
    fn test_extract_fields_unrelated_markup() {
        let fields = extract_fields("<html><body><p>Hello < world</p></body></html>");
        assert_eq!(fields.name, "Unknown");
        assert_eq!(fields.address, "Address not found");
        assert!(fields.coordinates.is_none());
        assert!(fields.basins.is_empty());
        assert!(fields.schedule.is_empty());
    }
}
