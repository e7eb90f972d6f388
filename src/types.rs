use ndarray::{Array2, Array3};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Default grid height delivered by the imagery API
pub const HEIGHT: usize = 600;

/// Default grid width delivered by the imagery API
pub const WIDTH: usize = 800;

/// Number of channels in a composite (two satellite channels + one reserved)
pub const CHANNELS: usize = 3;

/// One satellite channel at one timestamp (rows x cols)
pub type ChannelGrid = Array2<u8>;

/// Ground-truth precipitation samples, same shape as a channel
pub type TargetGrid = Array2<u8>;

/// Lifted index values decoded from the semicolon grid
pub type ScalarGrid = Array2<f64>;

/// Cells that participate in the selected regime
pub type RegimeMask = Array2<bool>;

/// Model input (rows x cols x CHANNELS)
pub type Composite = Array3<u8>;

/// Fixed grid shape shared by every artifact of one timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridShape {
    pub height: usize,
    pub width: usize,
}

impl GridShape {
    pub fn new(height: usize, width: usize) -> Self {
        Self { height, width }
    }

    /// (rows, cols) tuple in ndarray order
    pub fn dim(&self) -> (usize, usize) {
        (self.height, self.width)
    }
}

impl Default for GridShape {
    fn default() -> Self {
        Self {
            height: HEIGHT,
            width: WIDTH,
        }
    }
}

impl std::fmt::Display for GridShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.height, self.width)
    }
}

/// Atmospheric regime selected by the sign of the lifted index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RegimeSelector {
    /// No masking, the lifted index is never loaded
    #[default]
    None,
    /// Stable air: lifted index >= 0
    Stratiform,
    /// Unstable air: lifted index <= 0
    Convective,
}

impl RegimeSelector {
    /// Whether this selector needs the lifted index store
    pub fn requires_scalar_grid(&self) -> bool {
        !matches!(self, RegimeSelector::None)
    }
}

impl FromStr for RegimeSelector {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "none" => Ok(RegimeSelector::None),
            "stratiform" => Ok(RegimeSelector::Stratiform),
            "convective" => Ok(RegimeSelector::Convective),
            other => Err(PrepError::UnsupportedRegime(other.to_string())),
        }
    }
}

impl std::fmt::Display for RegimeSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegimeSelector::None => write!(f, "none"),
            RegimeSelector::Stratiform => write!(f, "stratiform"),
            RegimeSelector::Convective => write!(f, "convective"),
        }
    }
}

/// Geographic bounding box given as two corners (upper-left, lower-right)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub lat_0: f64,
    pub lon_0: f64,
    pub lat_1: f64,
    pub lon_1: f64,
}

/// Error types for sample preparation
#[derive(Debug, thiserror::Error)]
pub enum PrepError {
    #[error("missing {store} input for key {key}: {}", .path.display())]
    MissingInputFile {
        key: String,
        store: String,
        path: PathBuf,
    },

    #[error("shape mismatch in {what}: expected {expected}, found {found}")]
    ShapeMismatch {
        what: String,
        expected: String,
        found: String,
    },

    #[error("invalid number {value:?} in {} (record {record}, field {field})", .path.display())]
    NumericParseError {
        path: PathBuf,
        record: usize,
        field: usize,
        value: String,
    },

    #[error("unsupported regime: {0:?} (expected \"\", \"stratiform\" or \"convective\")")]
    UnsupportedRegime(String),

    #[error("grid file {} has only {records} record(s), at least 2 header records are required", .path.display())]
    TruncatedGrid { path: PathBuf, records: usize },

    #[error("failed to process {key}: {source}")]
    Sample {
        key: String,
        #[source]
        source: Box<PrepError>,
    },

    #[error("unknown region: {0}")]
    UnknownRegion(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Processing error: {0}")]
    Processing(String),
}

/// Result type for sample preparation
pub type PrepResult<T> = Result<T, PrepError>;
