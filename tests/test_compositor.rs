use ndarray::{array, s, Array2, Array3, Axis};
use satprep::core::{apply_mask, apply_mask_to_composite, convective_mask, stratiform_mask};
use satprep::io::LiftedIndexReader;
use satprep::{Compositor, GridShape, MaskBuilder, RegimeSelector};
use std::path::Path;

fn channels(rows: usize, cols: usize) -> (Array2<u8>, Array2<u8>, Array2<u8>) {
    let first = Array2::from_shape_fn((rows, cols), |(r, c)| (r * 7 + c * 3) as u8);
    let second = Array2::from_shape_fn((rows, cols), |(r, c)| 255 - (r + c * 5) as u8);
    let target = Array2::from_shape_fn((rows, cols), |(r, c)| ((r * c) % 17) as u8);
    (first, second, target)
}

fn lifted_index(rows: usize, cols: usize) -> Array2<f64> {
    Array2::from_shape_fn((rows, cols), |(r, c)| r as f64 - c as f64 * 0.5)
}

#[test]
fn test_csv_to_mask_example() {
    let grid = LiftedIndexReader::with_shape(GridShape::new(1, 3))
        .parse("meta\nmeta\nx;1.0;-2.0;0.0\n".as_bytes(), Path::new("example.csv"))
        .unwrap();

    assert_eq!(grid, array![[1.0, -2.0, 0.0]]);
    assert_eq!(stratiform_mask(&grid), array![[true, false, true]]);
    assert_eq!(convective_mask(&grid), array![[false, true, true]]);
}

#[test]
fn test_no_regime_is_identity() {
    let (first, second, target) = channels(6, 9);
    let sample = Compositor::compose(&first, &second, target.clone(), None).unwrap();

    assert_eq!(sample.composite.dim(), (6, 9, 3));
    assert_eq!(sample.composite.slice(s![.., .., 0]), first);
    assert_eq!(sample.composite.slice(s![.., .., 1]), second);
    assert_eq!(sample.target, target);
}

#[test]
fn test_reserved_channel_is_always_zero() {
    let (first, second, target) = channels(5, 5);
    let li = lifted_index(5, 5);

    for selector in [RegimeSelector::None, RegimeSelector::Stratiform, RegimeSelector::Convective] {
        let mask = MaskBuilder::build(&li, selector);
        let sample = Compositor::compose(&first, &second, target.clone(), mask.as_ref()).unwrap();
        assert!(sample.composite.index_axis(Axis(2), 2).iter().all(|&v| v == 0));
    }

    let full = Array2::from_elem((5, 5), 255u8);
    let sample = Compositor::compose(&full, &full, full.clone(), None).unwrap();
    assert!(sample.composite.index_axis(Axis(2), 2).iter().all(|&v| v == 0));
}

#[test]
fn test_mask_hits_composite_and_target_alike() {
    let (first, second, target) = channels(8, 8);
    let li = lifted_index(8, 8);
    let mask = MaskBuilder::build(&li, RegimeSelector::Convective).unwrap();

    let sample = Compositor::compose(&first, &second, target.clone(), Some(&mask)).unwrap();

    for ((r, c), &keep) in mask.indexed_iter() {
        if keep {
            assert_eq!(sample.composite[[r, c, 0]], first[[r, c]]);
            assert_eq!(sample.composite[[r, c, 1]], second[[r, c]]);
            assert_eq!(sample.target[[r, c]], target[[r, c]]);
        } else {
            assert_eq!(sample.composite[[r, c, 0]], 0);
            assert_eq!(sample.composite[[r, c, 1]], 0);
            assert_eq!(sample.target[[r, c]], 0);
        }
    }
}

#[test]
fn test_masking_twice_changes_nothing() {
    let (first, second, target) = channels(7, 4);
    let mask = MaskBuilder::build(&lifted_index(7, 4), RegimeSelector::Stratiform).unwrap();

    let sample = Compositor::compose(&first, &second, target, Some(&mask)).unwrap();
    let mut composite: Array3<u8> = sample.composite.clone();
    let mut target = sample.target.clone();

    apply_mask_to_composite(&mut composite, &mask).unwrap();
    apply_mask(&mut target, &mask).unwrap();

    assert_eq!(composite, sample.composite);
    assert_eq!(target, sample.target);
}

#[test]
fn test_inputs_are_not_mutated() {
    let (first, second, target) = channels(3, 3);
    let (first_copy, second_copy) = (first.clone(), second.clone());
    let mask = Array2::from_elem((3, 3), false);

    let sample = Compositor::compose(&first, &second, target, Some(&mask)).unwrap();

    assert!(sample.composite.iter().all(|&v| v == 0));
    assert_eq!(first, first_copy);
    assert_eq!(second, second_copy);
}

#[test]
fn test_single_pixel_examples() {
    let unmasked = Compositor::compose(&array![[5u8]], &array![[9u8]], array![[7u8]], None).unwrap();
    assert_eq!(unmasked.composite.into_raw_vec(), vec![5, 9, 0]);
    assert_eq!(unmasked.target, array![[7u8]]);

    let mask = MaskBuilder::build(&array![[-1.0]], RegimeSelector::Stratiform).unwrap();
    assert_eq!(mask, array![[false]]);
    let masked =
        Compositor::compose(&array![[5u8]], &array![[9u8]], array![[7u8]], Some(&mask)).unwrap();
    assert_eq!(masked.composite.into_raw_vec(), vec![0, 0, 0]);
    assert_eq!(masked.target, array![[0u8]]);
}
