use crate::core::mask::{apply_mask, apply_mask_to_composite};
use crate::types::{ChannelGrid, Composite, PrepError, PrepResult, RegimeMask, TargetGrid, CHANNELS};
use ndarray::{s, Array3};

/// Finished input/target pair for one timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// rows x cols x 3: IR 6.2, IR 10.8, zero
    pub composite: Composite,
    pub target: TargetGrid,
}

/// Assembles the model input composite and applies the regime mask
pub struct Compositor;

impl Compositor {
    /// Build a sample from the two satellite channels and the target
    ///
    /// The channel grids are only read. The target is taken by value and masked in
    /// place, so the returned target is the one that gets persisted.
    pub fn compose(
        first: &ChannelGrid,
        second: &ChannelGrid,
        mut target: TargetGrid,
        mask: Option<&RegimeMask>,
    ) -> PrepResult<Sample> {
        let dim = first.dim();
        for (name, other) in [("second channel", second.dim()), ("target", target.dim())] {
            if other != dim {
                return Err(PrepError::ShapeMismatch {
                    what: name.to_string(),
                    expected: format!("{}x{}", dim.0, dim.1),
                    found: format!("{}x{}", other.0, other.1),
                });
            }
        }

        let mut composite = Array3::<u8>::zeros((dim.0, dim.1, CHANNELS));
        composite.slice_mut(s![.., .., 0]).assign(first);
        composite.slice_mut(s![.., .., 1]).assign(second);

        if let Some(mask) = mask {
            apply_mask_to_composite(&mut composite, mask)?;
            apply_mask(&mut target, mask)?;
        }

        Ok(Sample { composite, target })
    }
}
