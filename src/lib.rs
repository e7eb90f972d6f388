//! satprep: satellite / precipitation training-sample preparation
//!
//! Turns per-timestamp IR 6.2 and IR 10.8 rasters, precipitation targets and lifted
//! index grids into fixed-shape input composites and targets for nowcasting models,
//! optionally restricted to the stratiform or convective regime.

pub mod types;
pub mod io;
pub mod core;

// Re-export main types and functions for easier access
pub use types::{
    BoundingBox, ChannelGrid, Composite, GridShape, PrepError, PrepResult, RegimeMask,
    RegimeSelector, ScalarGrid, TargetGrid, CHANNELS, HEIGHT, WIDTH,
};

pub use io::{ChannelReader, LiftedIndexReader, RasterWriter};
pub use crate::core::{Compositor, ConvertConfig, DatasetWalker, MaskBuilder, Sample};

#[cfg(feature = "python")]
mod python {
    use super::*;
    use numpy::{IntoPyArray, PyArray2, PyArray3};
    use pyo3::prelude::*;

    fn to_py_err(e: PrepError) -> PyErr {
        match e {
            PrepError::UnsupportedRegime(_) | PrepError::NumericParseError { .. } => {
                PyErr::new::<pyo3::exceptions::PyValueError, _>(e.to_string())
            }
            _ => PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(e.to_string()),
        }
    }

    /// Read a lifted index csv grid as a float64 array
    #[pyfunction]
    #[pyo3(signature = (path, height = HEIGHT, width = WIDTH))]
    fn read_lifted_index<'py>(
        py: Python<'py>,
        path: &str,
        height: usize,
        width: usize,
    ) -> PyResult<&'py PyArray2<f64>> {
        let grid = io::read_lifted_index(path, GridShape::new(height, width)).map_err(to_py_err)?;
        Ok(grid.into_pyarray(py))
    }

    /// Build (composite, target) for one timestamp without writing anything
    #[pyfunction]
    #[pyo3(signature = (ir062, ir108, target, lifted_index = None, mode = ""))]
    fn build_sample<'py>(
        py: Python<'py>,
        ir062: &str,
        ir108: &str,
        target: &str,
        lifted_index: Option<&str>,
        mode: &str,
    ) -> PyResult<(&'py PyArray3<u8>, &'py PyArray2<u8>)> {
        let selector: RegimeSelector = mode.parse().map_err(to_py_err)?;
        let reader = ChannelReader::new();

        let first = reader.read_channel(ir062).map_err(to_py_err)?;
        let second = reader.read_channel(ir108).map_err(to_py_err)?;
        let target = reader.read_channel(target).map_err(to_py_err)?;

        let mask = match (selector.requires_scalar_grid(), lifted_index) {
            (false, _) => None,
            (true, Some(path)) => {
                let grid = LiftedIndexReader::new().read(path).map_err(to_py_err)?;
                MaskBuilder::build(&grid, selector)
            }
            (true, None) => {
                return Err(PyErr::new::<pyo3::exceptions::PyValueError, _>(format!(
                    "mode {:?} requires a lifted index grid",
                    mode
                )))
            }
        };

        let sample = Compositor::compose(&first, &second, target, mask.as_ref()).map_err(to_py_err)?;
        Ok((sample.composite.into_pyarray(py), sample.target.into_pyarray(py)))
    }

    /// Python module definition
    #[pymodule]
    fn _core(_py: Python, m: &PyModule) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(read_lifted_index, m)?)?;
        m.add_function(wrap_pyfunction!(build_sample, m)?)?;
        m.add("HEIGHT", HEIGHT)?;
        m.add("WIDTH", WIDTH)?;
        Ok(())
    }
}
