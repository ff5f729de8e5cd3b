use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

use schemars::{JsonSchema, Schema};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const UNKNOWN_NAME: &str = "Unknown";
pub const ADDRESS_NOT_FOUND: &str = "Address not found";

#[derive(Debug, thiserror::Error)]
#[error("Invalid day '{0}'. Accepted values: 'lundi' … 'dimanche' or 'monday' … 'sunday'")]
pub struct DayParseError(String);

/// A weekday, serialized under its French name as on paris.fr.
///
/// The derived ordering is the canonical scan order, Monday first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub enum Day {
    #[serde(rename = "Lundi")]
    Monday,
    #[serde(rename = "Mardi")]
    Tuesday,
    #[serde(rename = "Mercredi")]
    Wednesday,
    #[serde(rename = "Jeudi")]
    Thursday,
    #[serde(rename = "Vendredi")]
    Friday,
    #[serde(rename = "Samedi")]
    Saturday,
    #[serde(rename = "Dimanche")]
    Sunday,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
        Day::Sunday,
    ];

    /// The label used on the site and as the `horaires` key.
    pub fn label(&self) -> &'static str {
        match self {
            Day::Monday => "Lundi",
            Day::Tuesday => "Mardi",
            Day::Wednesday => "Mercredi",
            Day::Thursday => "Jeudi",
            Day::Friday => "Vendredi",
            Day::Saturday => "Samedi",
            Day::Sunday => "Dimanche",
        }
    }
}

impl From<chrono::Weekday> for Day {
    fn from(weekday: chrono::Weekday) -> Self {
        match weekday {
            chrono::Weekday::Mon => Day::Monday,
            chrono::Weekday::Tue => Day::Tuesday,
            chrono::Weekday::Wed => Day::Wednesday,
            chrono::Weekday::Thu => Day::Thursday,
            chrono::Weekday::Fri => Day::Friday,
            chrono::Weekday::Sat => Day::Saturday,
            chrono::Weekday::Sun => Day::Sunday,
        }
    }
}

impl FromStr for Day {
    type Err = DayParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lundi" | "monday" => Ok(Day::Monday),
            "mardi" | "tuesday" => Ok(Day::Tuesday),
            "mercredi" | "wednesday" => Ok(Day::Wednesday),
            "jeudi" | "thursday" => Ok(Day::Thursday),
            "vendredi" | "friday" => Ok(Day::Friday),
            "samedi" | "saturday" => Ok(Day::Saturday),
            "dimanche" | "sunday" => Ok(Day::Sunday),
            _ => Err(DayParseError(s.to_string())),
        }
    }
}

impl Display for Day {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.label())
    }
}

/// Free-text opening hours per weekday. Days missing from the page are
/// missing here too.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Schedule(BTreeMap<Day, String>);

impl Schedule {
    pub fn get(&self, day: Day) -> Option<&str> {
        self.0.get(&day).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Day, &str)> {
        self.0.iter().map(|(day, text)| (*day, text.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn insert(&mut self, day: Day, text: String) {
        self.0.insert(day, text);
    }
}

impl FromIterator<(Day, String)> for Schedule {
    fn from_iter<I: IntoIterator<Item = (Day, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A GeoJSON position, longitude first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Position(pub f64, pub f64);

impl Position {
    pub fn from_lat_lon(lat: f64, lon: f64) -> Self {
        Self(lon, lat)
    }

    pub fn lon(&self) -> f64 {
        self.0
    }

    pub fn lat(&self) -> f64 {
        self.1
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.lat(), self.lon())
    }
}

/// Everything pulled out of one detail page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExtractedFields {
    pub name: String,
    pub address: String,
    pub coordinates: Option<Position>,
    pub basins: Vec<String>,
    pub schedule: Schedule,
}

impl Display for ExtractedFields {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "  Adresse: {}", self.address)?;
        match &self.coordinates {
            Some(position) => writeln!(f, "  Coordonnées: {}", position)?,
            None => writeln!(f, "  Coordonnées: —")?,
        }
        if !self.basins.is_empty() {
            writeln!(f, "  Bassins:")?;
            for basin in &self.basins {
                writeln!(f, "    • {}", basin)?;
            }
        }
        if !self.schedule.is_empty() {
            writeln!(f, "  Horaires:")?;
            for (day, hours) in self.schedule.iter() {
                writeln!(f, "    {:<9} {}", day, hours)?;
            }
        }
        Ok(())
    }
}

/// Adds the `type` member that `#[serde(tag = "type")]` writes on a struct,
/// which the derived schema leaves out.
fn geojson_type(schema: &mut Schema, name: &str) {
    if let Some(properties) = schema.get_mut("properties").and_then(Value::as_object_mut) {
        properties.insert("type".to_string(), json!({ "type": "string", "const": name }));
    }
    match schema.get_mut("required").and_then(Value::as_array_mut) {
        Some(required) => required.insert(0, json!("type")),
        None => {
            schema.insert("required".to_string(), json!(["type"]));
        }
    }
}

fn point_type(schema: &mut Schema) {
    geojson_type(schema, "Point");
}

fn feature_type(schema: &mut Schema) {
    geojson_type(schema, "Feature");
}

fn feature_collection_type(schema: &mut Schema) {
    geojson_type(schema, "FeatureCollection");
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type")]
#[schemars(transform = point_type)]
pub struct Point {
    coordinates: Position,
}

impl Point {
    pub fn position(&self) -> Position {
        self.coordinates
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Properties {
    #[serde(rename = "nom")]
    name: String,
    #[serde(rename = "adresse")]
    address: String,
    url: String,
    #[serde(rename = "bassins")]
    basins: Vec<String>,
    #[serde(rename = "horaires")]
    schedule: Schedule,
}

/// One pool in the output collection. Always has a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type")]
#[schemars(transform = feature_type)]
pub struct Feature {
    geometry: Point,
    properties: Properties,
}

impl Feature {
    /// Builds the feature for a detail page, or `None` when the page had no
    /// usable coordinates.
    pub fn assemble(fields: ExtractedFields, source_url: &str) -> Option<Self> {
        let Some(coordinates) = fields.coordinates else {
            log::warn!("No coordinates found for {}", source_url);
            return None;
        };

        Some(Self {
            geometry: Point { coordinates },
            properties: Properties {
                name: fields.name,
                address: fields.address,
                url: source_url.to_string(),
                basins: fields.basins,
                schedule: fields.schedule,
            },
        })
    }

    pub fn position(&self) -> Position {
        self.geometry.coordinates
    }

    pub fn name(&self) -> &str {
        &self.properties.name
    }

    pub fn address(&self) -> &str {
        &self.properties.address
    }

    pub fn url(&self) -> &str {
        &self.properties.url
    }

    pub fn basins(&self) -> &[String] {
        &self.properties.basins
    }

    pub fn schedule(&self) -> &Schedule {
        &self.properties.schedule
    }
}

impl Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} — {} ({})",
            self.properties.name,
            self.properties.address,
            self.position()
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type")]
#[schemars(transform = feature_collection_type)]
pub struct FeatureCollection {
    features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl FromIterator<Feature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self {
            features: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a FeatureCollection {
    type Item = &'a Feature;
    type IntoIter = std::slice::Iter<'a, Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}

/// Append-only accumulator, frozen into a [`FeatureCollection`] by `build`.
#[derive(Debug, Default)]
pub struct CollectionBuilder {
    features: Vec<Feature>,
}

impl CollectionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn build(self) -> FeatureCollection {
        FeatureCollection {
            features: self.features,
        }
    }
}
