//! Core sample preparation modules

pub mod composite;
pub mod dataset;
pub mod mask;

// Re-export main types
pub use composite::{Compositor, Sample};
pub use dataset::{
    ConversionSummary, ConvertConfig, DatasetLayout, DatasetWalker, ErrorPolicy, SamplePaths,
    DEFAULT_DATA_ROOT,
};
pub use mask::{apply_mask, apply_mask_to_composite, convective_mask, stratiform_mask, MaskBuilder};
