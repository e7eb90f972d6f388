use crate::types::{Composite, PrepError, PrepResult, RegimeMask, RegimeSelector, ScalarGrid};
use ndarray::{Array2, Axis, Zip};

/// Builds regime masks from lifted index grids
///
/// Stratiform keeps cells with lifted index >= 0, convective keeps cells <= 0.
/// A value of exactly 0 belongs to both regimes.
pub struct MaskBuilder;

impl MaskBuilder {
    /// Mask for `selector`, or `None` when no masking applies
    pub fn build(scalar: &ScalarGrid, selector: RegimeSelector) -> Option<RegimeMask> {
        match selector {
            RegimeSelector::None => None,
            RegimeSelector::Stratiform => Some(stratiform_mask(scalar)),
            RegimeSelector::Convective => Some(convective_mask(scalar)),
        }
    }
}

pub fn stratiform_mask(scalar: &ScalarGrid) -> RegimeMask {
    scalar.mapv(|li| li >= 0.0)
}

pub fn convective_mask(scalar: &ScalarGrid) -> RegimeMask {
    scalar.mapv(|li| li <= 0.0)
}

/// Zero every cell of `grid` where the mask is false
pub fn apply_mask(grid: &mut Array2<u8>, mask: &RegimeMask) -> PrepResult<()> {
    check_mask_shape(grid.dim(), mask)?;
    Zip::from(grid).and(mask).for_each(|value, &keep| {
        if !keep {
            *value = 0;
        }
    });
    Ok(())
}

/// Zero every channel of `composite` where the mask is false
pub fn apply_mask_to_composite(composite: &mut Composite, mask: &RegimeMask) -> PrepResult<()> {
    let (rows, cols, _) = composite.dim();
    check_mask_shape((rows, cols), mask)?;
    for channel in composite.axis_iter_mut(Axis(2)) {
        Zip::from(channel).and(mask).for_each(|value, &keep| {
            if !keep {
                *value = 0;
            }
        });
    }
    Ok(())
}

fn check_mask_shape(dim: (usize, usize), mask: &RegimeMask) -> PrepResult<()> {
    if mask.dim() != dim {
        return Err(PrepError::ShapeMismatch {
            what: "regime mask".to_string(),
            expected: format!("{}x{}", dim.0, dim.1),
            found: format!("{}x{}", mask.nrows(), mask.ncols()),
        });
    }
    Ok(())
}
