use crate::types::{BoundingBox, PrepError, PrepResult, HEIGHT, WIDTH};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Base URL of the weather-data API
pub const API_URL: &str = "https://api.meteomatics.com";

/// Timestamp format used in query URLs
pub const URL_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Products retrieved per timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Product {
    SatIr108,
    SatIr062,
    LiftedIndex,
    Precip5Min,
}

impl Product {
    pub const ALL: [Product; 4] = [
        Product::SatIr108,
        Product::SatIr062,
        Product::LiftedIndex,
        Product::Precip5Min,
    ];

    /// API parameter identifier (name:unit)
    pub fn parameter(&self) -> &'static str {
        match self {
            Product::SatIr108 => "sat_ir_108:K",
            Product::SatIr062 => "sat_ir_062:K",
            Product::LiftedIndex => "lifted_index:K",
            Product::Precip5Min => "precip_5min:mm",
        }
    }

    /// Directory the product is stored under inside a region
    pub fn store_dir(&self) -> &'static str {
        match self {
            Product::SatIr108 => "sat_ir_108",
            Product::SatIr062 => "sat_ir_062",
            Product::LiftedIndex => "lifted_index",
            Product::Precip5Min => "precip_5min:mm",
        }
    }

    /// Payload format, doubles as the file extension
    pub fn format(&self) -> &'static str {
        match self {
            Product::LiftedIndex => "csv",
            _ => "png",
        }
    }
}

impl std::fmt::Display for Product {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.parameter())
    }
}

/// Immutable query description for one region and timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParams {
    pub image_w: usize,
    pub image_h: usize,
    pub bbox: BoundingBox,
    pub timestamp: DateTime<Utc>,
}

impl QueryParams {
    /// Query for the default 800x600 image size
    pub fn new(bbox: BoundingBox, timestamp: DateTime<Utc>) -> Self {
        Self {
            image_w: WIDTH,
            image_h: HEIGHT,
            bbox,
            timestamp,
        }
    }

    /// URL for a product, e.g.
    /// `https://api.meteomatics.com/2022-02-28T13:25:05Z/sat_ir_108:K/60,-120_30,-85:800x600/png`
    pub fn url(&self, base_url: &str, product: Product) -> String {
        format!(
            "{}/{}/{}/{},{}_{},{}:{}x{}/{}",
            base_url.trim_end_matches('/'),
            self.timestamp.format(URL_TIME_FORMAT),
            product.parameter(),
            self.bbox.lat_0,
            self.bbox.lon_0,
            self.bbox.lat_1,
            self.bbox.lon_1,
            self.image_w,
            self.image_h,
            product.format(),
        )
        .trim()
        .to_string()
    }

    pub fn sat_ir_108_url(&self, base_url: &str) -> String {
        self.url(base_url, Product::SatIr108)
    }

    pub fn sat_ir_062_url(&self, base_url: &str) -> String {
        self.url(base_url, Product::SatIr062)
    }

    pub fn lifted_index_url(&self, base_url: &str) -> String {
        self.url(base_url, Product::LiftedIndex)
    }

    pub fn precip_5min_url(&self, base_url: &str) -> String {
        self.url(base_url, Product::Precip5Min)
    }
}

/// Region name to bounding box mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionTable {
    regions: BTreeMap<String, BoundingBox>,
}

impl RegionTable {
    /// Empty table, for synthetic regions
    pub fn empty() -> Self {
        Self {
            regions: BTreeMap::new(),
        }
    }

    /// Load a table from a JSON object `{ "name": { "lat_0": .., ... } }`
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> PrepResult<Self> {
        let path = path.as_ref();
        log::info!("Loading region table from: {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn insert(&mut self, name: impl Into<String>, bbox: BoundingBox) {
        self.regions.insert(name.into(), bbox);
    }

    pub fn get(&self, name: &str) -> PrepResult<&BoundingBox> {
        self.regions
            .get(name)
            .ok_or_else(|| PrepError::UnknownRegion(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.regions.contains_key(name)
    }

    /// Regions in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BoundingBox)> {
        self.regions.iter().map(|(name, bbox)| (name.as_str(), bbox))
    }

    pub fn names(&self) -> Vec<&str> {
        self.regions.keys().map(|k| k.as_str()).collect()
    }
}

impl Default for RegionTable {
    fn default() -> Self {
        let mut table = Self::empty();
        table.insert(
            "north_america",
            BoundingBox { lat_0: 60.0, lon_0: -120.0, lat_1: 30.0, lon_1: -85.0 },
        );
        table.insert(
            "central_europe",
            BoundingBox { lat_0: 65.0, lon_0: -15.0, lat_1: 35.0, lon_1: 20.0 },
        );
        table.insert(
            "mexico",
            BoundingBox { lat_0: 27.8417, lon_0: -112.1654, lat_1: 10.4812, lon_1: -76.1187 },
        );
        table
    }
}
