use crate::core::composite::{Compositor, Sample};
use crate::core::mask::MaskBuilder;
use crate::io::query::Product;
use crate::io::{ChannelReader, LiftedIndexReader, RasterWriter};
use crate::types::{GridShape, PrepError, PrepResult, RegimeSelector};
use std::path::{Path, PathBuf};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Dataset root used when none is given
pub const DEFAULT_DATA_ROOT: &str = "/datasets/meteomatics";

/// Output directory for composites inside a region
pub const COMPOSITE_DIR: &str = "sat_ir";

/// Output directory for (masked) targets inside a region
pub const TARGET_DIR: &str = "target";

/// What to do when one timestamp fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Stop the run at the first failing key
    ///
    /// In parallel runs no new key is started once one has failed, but keys already
    /// in flight on other workers still finish and write their outputs.
    #[default]
    Abort,
    /// Log the failing key and continue with the next one
    Skip,
}

/// Conversion run configuration
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    pub data_root: PathBuf,
    pub region: String,
    pub mode: RegimeSelector,
    pub error_policy: ErrorPolicy,
    /// Process keys on the rayon pool (needs the `parallel` feature)
    pub parallel: bool,
    pub shape: GridShape,
}

impl ConvertConfig {
    pub fn new(data_root: impl Into<PathBuf>, region: impl Into<String>) -> Self {
        Self {
            data_root: data_root.into(),
            region: region.into(),
            mode: RegimeSelector::None,
            error_policy: ErrorPolicy::Abort,
            parallel: false,
            shape: GridShape::default(),
        }
    }
}

/// Directory layout of one region
#[derive(Debug, Clone)]
pub struct DatasetLayout {
    region_dir: PathBuf,
}

impl DatasetLayout {
    pub fn new<P: AsRef<Path>>(data_root: P, region: &str) -> Self {
        Self {
            region_dir: data_root.as_ref().join(region),
        }
    }

    pub fn region_dir(&self) -> &Path {
        &self.region_dir
    }

    /// Input store of a downloaded product
    pub fn store(&self, product: Product) -> PathBuf {
        self.region_dir.join(product.store_dir())
    }

    pub fn composite_dir(&self) -> PathBuf {
        self.region_dir.join(COMPOSITE_DIR)
    }

    pub fn target_dir(&self) -> PathBuf {
        self.region_dir.join(TARGET_DIR)
    }
}

/// Every file touched for one key
#[derive(Debug, Clone, PartialEq)]
pub struct SamplePaths {
    pub key: String,
    pub ir062: PathBuf,
    pub ir108: PathBuf,
    pub target: PathBuf,
    /// Only resolved when a regime is selected
    pub lifted_index: Option<PathBuf>,
    pub composite_out: PathBuf,
    pub target_out: PathBuf,
}

/// Result of a conversion run
#[derive(Debug, Default)]
pub struct ConversionSummary {
    pub processed: Vec<String>,
    pub skipped: Vec<(String, String)>,
}

/// Walks the IR 6.2 store and converts every timestamp it finds
pub struct DatasetWalker {
    layout: DatasetLayout,
    mode: RegimeSelector,
    error_policy: ErrorPolicy,
    parallel: bool,
    channel_reader: ChannelReader,
    grid_reader: LiftedIndexReader,
    writer: RasterWriter,
}

impl DatasetWalker {
    pub fn new(config: &ConvertConfig) -> Self {
        Self {
            layout: DatasetLayout::new(&config.data_root, &config.region),
            mode: config.mode,
            error_policy: config.error_policy,
            parallel: config.parallel,
            channel_reader: ChannelReader::with_shape(config.shape),
            grid_reader: LiftedIndexReader::with_shape(config.shape),
            writer: RasterWriter::new(),
        }
    }

    pub fn layout(&self) -> &DatasetLayout {
        &self.layout
    }

    /// File names in the IR 6.2 store, sorted
    pub fn keys(&self) -> PrepResult<Vec<String>> {
        let store = self.layout.store(Product::SatIr062);
        let mut keys = Vec::new();

        for entry in std::fs::read_dir(&store)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            keys.push(name);
        }

        keys.sort();
        Ok(keys)
    }

    /// Resolve and check every input for `filename`
    pub fn resolve(&self, filename: &str) -> PrepResult<SamplePaths> {
        let require = |product: Product, name: &str| -> PrepResult<PathBuf> {
            let path = self.layout.store(product).join(name);
            if path.is_file() {
                Ok(path)
            } else {
                Err(PrepError::MissingInputFile {
                    key: filename.to_string(),
                    store: product.store_dir().to_string(),
                    path,
                })
            }
        };

        let ir062 = require(Product::SatIr062, filename)?;
        let ir108 = require(Product::SatIr108, filename)?;
        let target = require(Product::Precip5Min, filename)?;

        let lifted_index = if self.mode.requires_scalar_grid() {
            let stem = Path::new(filename)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| filename.to_string());
            Some(require(Product::LiftedIndex, &format!("{}.csv", stem))?)
        } else {
            None
        };

        Ok(SamplePaths {
            key: filename.to_string(),
            ir062,
            ir108,
            target,
            lifted_index,
            composite_out: self.layout.composite_dir().join(filename),
            target_out: self.layout.target_dir().join(filename),
        })
    }

    /// Load and compose the sample for one key without writing it
    pub fn build_sample(&self, paths: &SamplePaths) -> PrepResult<Sample> {
        let ir062 = self.channel_reader.read_channel(&paths.ir062)?;
        let ir108 = self.channel_reader.read_channel(&paths.ir108)?;
        let target = self.channel_reader.read_channel(&paths.target)?;

        let mask = match &paths.lifted_index {
            Some(path) => {
                let lifted_index = self.grid_reader.read(path)?;
                MaskBuilder::build(&lifted_index, self.mode)
            }
            None => None,
        };

        Compositor::compose(&ir062, &ir108, target, mask.as_ref())
    }

    /// Convert one key and persist both outputs
    pub fn process(&self, filename: &str) -> PrepResult<()> {
        log::info!("Processing: {}", filename);
        let paths = self.resolve(filename)?;
        let sample = self.build_sample(&paths)?;

        self.writer.write_composite(&paths.composite_out, &sample.composite)?;
        self.writer.write_grid(&paths.target_out, &sample.target)?;
        Ok(())
    }

    /// Convert every key of the region
    pub fn run(&self) -> PrepResult<ConversionSummary> {
        std::fs::create_dir_all(self.layout.composite_dir())?;
        std::fs::create_dir_all(self.layout.target_dir())?;

        let keys = self.keys()?;
        log::info!(
            "Converting {} timestamps in {} (mode: {})",
            keys.len(),
            self.layout.region_dir().display(),
            self.mode
        );

        let mut summary = ConversionSummary::default();

        #[cfg(feature = "parallel")]
        if self.parallel {
            if self.error_policy == ErrorPolicy::Abort {
                keys.par_iter().try_for_each(|key| {
                    self.process(key).map_err(|e| {
                        log::error!("Failed to process {}: {}", key, e);
                        PrepError::Sample {
                            key: key.clone(),
                            source: Box::new(e),
                        }
                    })
                })?;
                summary.processed = keys;
                return Ok(Self::finish(summary));
            }

            let results: Vec<(String, PrepResult<()>)> = keys
                .into_par_iter()
                .map(|key| {
                    let result = self.process(&key);
                    (key, result)
                })
                .collect();

            for (key, result) in results {
                self.record(&mut summary, key, result)?;
            }
            return Ok(Self::finish(summary));
        }

        #[cfg(not(feature = "parallel"))]
        if self.parallel {
            log::warn!("Built without the `parallel` feature, processing sequentially");
        }

        for key in keys {
            let result = self.process(&key);
            self.record(&mut summary, key, result)?;
        }

        Ok(Self::finish(summary))
    }

    fn finish(summary: ConversionSummary) -> ConversionSummary {
        log::info!(
            "Conversion finished: {} processed, {} skipped",
            summary.processed.len(),
            summary.skipped.len()
        );
        summary
    }

    fn record(
        &self,
        summary: &mut ConversionSummary,
        key: String,
        result: PrepResult<()>,
    ) -> PrepResult<()> {
        match result {
            Ok(()) => summary.processed.push(key),
            Err(e) => match self.error_policy {
                ErrorPolicy::Abort => {
                    log::error!("Failed to process {}: {}", key, e);
                    return Err(PrepError::Sample {
                        key,
                        source: Box::new(e),
                    });
                }
                ErrorPolicy::Skip => {
                    log::warn!("Skipping {}: {}", key, e);
                    summary.skipped.push((key, e.to_string()));
                }
            },
        }
        Ok(())
    }
}
