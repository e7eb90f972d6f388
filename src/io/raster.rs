use crate::types::{ChannelGrid, Composite, GridShape, PrepError, PrepResult};
use gdal::raster::Buffer;
use gdal::{Dataset, DriverManager};
use ndarray::{Array2, ArrayView2, Axis};
use std::path::Path;

/// Reader for single-band satellite and precipitation rasters
#[derive(Debug, Clone, Default)]
pub struct ChannelReader {
    shape: GridShape,
}

impl ChannelReader {
    /// Create a reader expecting the default 600x800 grid
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a reader expecting a custom grid shape
    pub fn with_shape(shape: GridShape) -> Self {
        Self { shape }
    }

    /// Read the first band of a raster as 8-bit samples
    ///
    /// Additional bands (alpha, palette expansions) are ignored. The stored size must
    /// match the configured shape exactly; nothing is cropped or resampled.
    pub fn read_channel<P: AsRef<Path>>(&self, path: P) -> PrepResult<ChannelGrid> {
        let path = path.as_ref();
        log::debug!("Reading channel raster: {}", path.display());

        let dataset = Dataset::open(path)?;
        let (width, height) = dataset.raster_size();

        if (height, width) != self.shape.dim() {
            return Err(PrepError::ShapeMismatch {
                what: path.display().to_string(),
                expected: self.shape.to_string(),
                found: format!("{}x{}", height, width),
            });
        }

        if dataset.raster_count() < 1 {
            return Err(PrepError::ShapeMismatch {
                what: path.display().to_string(),
                expected: "at least 1 band".to_string(),
                found: "0 bands".to_string(),
            });
        }

        let rasterband = dataset.rasterband(1)?;
        let band_data = rasterband.read_as::<u8>((0, 0), (width, height), (width, height), None)?;

        Array2::from_shape_vec((height, width), band_data.data)
            .map_err(|e| PrepError::Processing(format!("Failed to reshape {}: {}", path.display(), e)))
    }
}

/// Writer for finished composites and targets
///
/// Data is staged in a GDAL `MEM` dataset and copied to the format implied by the
/// file extension. The copy lands in a hidden temporary file next to the destination
/// and is renamed into place, so readers never see a half-written output.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterWriter;

impl RasterWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write a rows x cols x channels composite, one band per channel
    pub fn write_composite<P: AsRef<Path>>(&self, path: P, composite: &Composite) -> PrepResult<()> {
        let bands: Vec<ArrayView2<u8>> = composite.axis_iter(Axis(2)).collect();
        self.write_bands(path, &bands)
    }

    /// Write a single-band grid
    pub fn write_grid<P: AsRef<Path>>(&self, path: P, grid: &ChannelGrid) -> PrepResult<()> {
        self.write_bands(path, &[grid.view()])
    }

    /// Write equally shaped bands in order
    pub fn write_bands<P: AsRef<Path>>(&self, path: P, bands: &[ArrayView2<u8>]) -> PrepResult<()> {
        let path = path.as_ref();
        let (height, width) = match bands.first() {
            Some(band) => band.dim(),
            None => {
                return Err(PrepError::Processing(format!(
                    "No bands to write to {}",
                    path.display()
                )))
            }
        };

        if let Some(other) = bands.iter().find(|b| b.dim() != (height, width)) {
            return Err(PrepError::ShapeMismatch {
                what: path.display().to_string(),
                expected: format!("{}x{}", height, width),
                found: format!("{}x{}", other.nrows(), other.ncols()),
            });
        }

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("png")
            .to_ascii_lowercase();
        let driver_name = driver_for_extension(&extension);

        let mem_driver = DriverManager::get_driver_by_name("MEM")?;
        let staging = mem_driver.create_with_band_type::<u8, _>(
            "",
            width as isize,
            height as isize,
            bands.len() as isize,
        )?;

        for (i, band) in bands.iter().enumerate() {
            let mut rasterband = staging.rasterband(i as isize + 1)?;
            let flat_data: Vec<u8> = band.iter().copied().collect();
            let buffer = Buffer::new((width, height), flat_data);
            rasterband.write((0, 0), (width, height), &buffer)?;
        }

        let temp_path = tempfile::Builder::new()
            .prefix(".satprep-")
            .suffix(&format!(".{}", extension))
            .tempfile_in(dir)?
            .into_temp_path();

        {
            let driver = DriverManager::get_driver_by_name(driver_name)?;
            let _copy = staging.create_copy(&driver, &temp_path, &[])?;
        }

        temp_path.persist(path).map_err(|e| PrepError::Io(e.error))?;
        log::debug!("Wrote {} band(s) to {}", bands.len(), path.display());
        Ok(())
    }
}

/// GDAL driver used for an output file extension
fn driver_for_extension(extension: &str) -> &'static str {
    match extension {
        "tif" | "tiff" => "GTiff",
        _ => "PNG",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_selection() {
        assert_eq!(driver_for_extension("png"), "PNG");
        assert_eq!(driver_for_extension("tif"), "GTiff");
        assert_eq!(driver_for_extension("tiff"), "GTiff");
        assert_eq!(driver_for_extension("jpg"), "PNG");
    }

    #[test]
    fn test_grid_round_trip_and_shape_check() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("grid.png");

        let grid = Array2::from_shape_fn((4, 5), |(r, c)| (r * 10 + c) as u8);
        RasterWriter::new().write_grid(&path, &grid).unwrap();

        let loaded = ChannelReader::with_shape(GridShape::new(4, 5)).read_channel(&path).unwrap();
        assert_eq!(loaded, grid);

        let err = ChannelReader::with_shape(GridShape::new(5, 4)).read_channel(&path).unwrap_err();
        assert!(matches!(err, PrepError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_only_first_band_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rgb.png");

        let mut composite = Composite::zeros((2, 2, 3));
        composite.index_axis_mut(Axis(2), 0).fill(11);
        composite.index_axis_mut(Axis(2), 1).fill(22);
        RasterWriter::new().write_composite(&path, &composite).unwrap();

        let channel = ChannelReader::with_shape(GridShape::new(2, 2)).read_channel(&path).unwrap();
        assert!(channel.iter().all(|&v| v == 11));
    }

    #[test]
    fn test_no_temporary_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        RasterWriter::new().write_grid(&path, &Array2::zeros((3, 3))).unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(names.contains(&"out.png".to_string()));
        assert!(names.iter().all(|n| !n.starts_with(".satprep-")));
    }
}
