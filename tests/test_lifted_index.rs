use approx::assert_relative_eq;
use satprep::io::{read_lifted_index, LiftedIndexReader};
use satprep::{GridShape, PrepError, HEIGHT, WIDTH};
use std::fmt::Write as _;
use std::path::Path;

fn write_grid(dir: &Path, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, text).unwrap();
    path
}

/// Grid text with `rows` data records of `cols` values each, cell value = r * 1000 + c
fn synthetic_grid(header: &str, rows: usize, cols: usize) -> String {
    let mut text = String::new();
    text.push_str(header);
    for r in 0..rows {
        write!(text, "{:.3}", 60.0 - r as f64 * 0.05).unwrap();
        for c in 0..cols {
            write!(text, ";{}", (r * 1000 + c) as f64 / 10.0).unwrap();
        }
        text.push('\n');
    }
    text
}

#[test]
fn test_full_size_grid() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_grid(
        dir.path(),
        "full.csv",
        &synthetic_grid("validdate;lifted_index:K\ndata;-120.0;-119.95\n", HEIGHT, WIDTH),
    );

    let grid = LiftedIndexReader::new().read(&path).unwrap();
    assert_eq!(grid.dim(), (HEIGHT, WIDTH));
    assert_relative_eq!(grid[[0, 0]], 0.0);
    assert_relative_eq!(grid[[599, 799]], (599.0 * 1000.0 + 799.0) / 10.0);
    assert_relative_eq!(grid[[123, 45]], 12304.5);
}

#[test]
fn test_garbage_headers_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let header = "@@ not;a;number @@\n\u{fffd}\u{fffd};;;;;\n";
    let path = write_grid(dir.path(), "garbage.csv", &synthetic_grid(header, 3, 4));

    let grid = read_lifted_index(&path, GridShape::new(3, 4)).unwrap();
    assert_relative_eq!(grid[[2, 3]], 200.3);
}

#[test]
fn test_short_file_zero_fills_trailing_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_grid(dir.path(), "short.csv", &synthetic_grid("h\nh\n", 2, 5));

    let grid = read_lifted_index(&path, GridShape::new(4, 5)).unwrap();
    assert_eq!(grid.dim(), (4, 5));
    assert_relative_eq!(grid[[1, 4]], 100.4);
    assert!(grid.rows().into_iter().skip(2).all(|row| row.iter().all(|&v| v == 0.0)));
}

#[test]
fn test_long_file_is_truncated() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_grid(dir.path(), "long.csv", &synthetic_grid("h\nh\n", 10, 10));

    let grid = read_lifted_index(&path, GridShape::new(3, 6)).unwrap();
    assert_eq!(grid.dim(), (3, 6));
    assert_relative_eq!(grid[[2, 5]], 200.5);
}

#[test]
fn test_bad_value_reports_location() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_grid(dir.path(), "bad.csv", "h\nh\nx;1;2\ny;3;n/a\n");

    let err = read_lifted_index(&path, GridShape::new(2, 2)).unwrap_err();
    match &err {
        PrepError::NumericParseError { path: p, record, field, value } => {
            assert_eq!(p, &path);
            assert_eq!(*record, 4);
            assert_eq!(*field, 2);
            assert_eq!(value, "n/a");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(err.to_string().contains("n/a"));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = LiftedIndexReader::new().read(dir.path().join("absent.csv")).unwrap_err();
    assert!(matches!(err, PrepError::Io(_)));
}

#[test]
fn test_crlf_and_padded_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_grid(dir.path(), "crlf.csv", "h\r\nh\r\nx; 1.5 ;-0.25\r\n");

    let grid = read_lifted_index(&path, GridShape::new(1, 2)).unwrap();
    assert_relative_eq!(grid[[0, 0]], 1.5);
    assert_relative_eq!(grid[[0, 1]], -0.25);
}
