use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
pub enum Error {
    #[error("Longitude '{longitude}' is out of range (valid: -180.0..=180.0)")]
    LongitudeOutOfRange { longitude: f64 },

    #[error("Latitude '{latitude}' is out of range (valid: -90.0..=90.0)")]
    LatitudeOutOfRange { latitude: f64 },

    #[error("Coordinate arrays have different lengths: {expected} and {found}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("Rows of a rectangular mesh must have the same length: row {row} has {found} points, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("At least {required} points are required, got {found}")]
    TooFewPoints { required: usize, found: usize },

    #[error("Mesh must have more than one row and more than one column, got {rows}x{cols}")]
    MeshTooSmall { rows: usize, cols: usize },

    #[error("Row {row} of the mesh is shallower than the previous one")]
    DepthDecreasesDownDip { row: usize },

    #[error("Points collection has longitudinal extent wider than 180 deg")]
    LongitudinalExtentTooWide,

    #[error("Point ({longitude}, {latitude}) is too far from the projection center")]
    BeyondProjectionHorizon { longitude: f64, latitude: f64 },

    #[error("Polygon edges intersect each other")]
    SelfIntersection,

    #[error("Spacing '{spacing}' must be positive")]
    NonPositiveSpacing { spacing: f64 },

    #[error("Number of points '{npoints}' must be at least 2")]
    TooFewSteps { npoints: usize },

    #[error("Dip '{dip}' is out of range (valid: 0.0 < dip <= 90.0)")]
    DipOutOfRange { dip: f64 },

    #[error("Seismogenic depths are inconsistent: upper '{upper}', lower '{lower}'")]
    InvalidSeismogenicDepths { upper: f64, lower: f64 },

    #[error("Fault trace must be horizontal, point {index} has depth '{depth}'")]
    TraceNotHorizontal { index: usize, depth: f64 },

    #[error("Upper seismogenic depth '{upper}' is shallower than the fault trace at '{trace_depth}'")]
    UpperDepthAboveTrace { upper: f64, trace_depth: f64 },

    #[error("At least two fault edges are required, got {found}")]
    TooFewEdges { found: usize },

    #[error("Mesh spacing {spacing} km is too big for mean length {length} km")]
    SpacingExceedsLength { spacing: f64, length: f64 },

    #[error("Mesh spacing {spacing} km is too big for mean width {width} km")]
    SpacingExceedsWidth { spacing: f64, width: f64 },

    #[error("ECEF position ({x}, {y}, {z}) has no geodetic counterpart")]
    InvalidEcef { x: f64, y: f64, z: f64 },
}

/// 設定ファイルの読み書きに関するエラー。
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    ReadError(#[source] std::io::Error),

    #[error("failed to write config: {0}")]
    WriteError(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    ParseError(#[source] ron::error::SpannedError),

    #[error("failed to serialize config: {0}")]
    SerializeError(#[source] ron::Error),
}
