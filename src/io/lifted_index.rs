use crate::types::{GridShape, PrepError, PrepResult, ScalarGrid};
use ndarray::Array2;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Leading records of every lifted index grid that carry no cell data
pub const HEADER_RECORDS: usize = 2;

/// Field delimiter used by the API's csv payloads
pub const DELIMITER: u8 = b';';

/// Reader for semicolon-delimited lifted index grids
///
/// Layout of a grid file:
///
/// ```text
/// <header record>
/// <header record>
/// <label>;v0;v1;...;v(width-1)     -> row 0
/// <label>;v0;v1;...                -> row 1
/// ...
/// ```
///
/// Header contents are never interpreted. The label of each data record is dropped
/// and the remaining fields fill columns from 0. Cells not covered by the file stay
/// at 0.0; rows past `height` and fields past `width` are ignored.
#[derive(Debug, Clone, Default)]
pub struct LiftedIndexReader {
    shape: GridShape,
}

impl LiftedIndexReader {
    /// Create a reader for the default 600x800 grid
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a reader for a custom grid shape
    pub fn with_shape(shape: GridShape) -> Self {
        Self { shape }
    }

    /// Read a lifted index grid from disk
    pub fn read<P: AsRef<Path>>(&self, path: P) -> PrepResult<ScalarGrid> {
        let path = path.as_ref();
        log::debug!("Reading lifted index grid: {}", path.display());
        let file = File::open(path)?;
        self.parse(file, path)
    }

    /// Decode a grid from any byte source; `source` only labels errors
    ///
    /// Every line is one record, blank lines included: a blank header line still
    /// counts as a header and a blank data line leaves its row at 0.0.
    pub fn parse<R: Read>(&self, mut input: R, source: &Path) -> PrepResult<ScalarGrid> {
        let (height, width) = self.shape.dim();
        let mut grid = Array2::<f64>::zeros((height, width));

        let mut text = Vec::new();
        input.read_to_end(&mut text)?;
        let lines = split_lines(&text);

        if lines.len() < HEADER_RECORDS {
            return Err(PrepError::TruncatedGrid {
                path: source.to_path_buf(),
                records: lines.len(),
            });
        }

        let mut builder = csv::ReaderBuilder::new();
        builder.delimiter(DELIMITER).has_headers(false).flexible(true);
        let mut record = csv::ByteRecord::new();

        let data_lines = &lines[HEADER_RECORDS..];
        for (row, line) in data_lines.iter().take(height).enumerate() {
            record.clear();
            if !line.is_empty() {
                builder.from_reader(*line).read_byte_record(&mut record)?;
            }

            for (col, raw) in record.iter().skip(1).take(width).enumerate() {
                grid[[row, col]] = parse_field(raw).ok_or_else(|| PrepError::NumericParseError {
                    path: source.to_path_buf(),
                    record: HEADER_RECORDS + row + 1,
                    field: col + 1,
                    value: String::from_utf8_lossy(raw).into_owned(),
                })?;
            }
        }

        if data_lines.len() < height {
            log::debug!(
                "{}: {} of {} rows present, remaining rows left at 0.0",
                source.display(),
                data_lines.len(),
                height
            );
        }

        Ok(grid)
    }
}

/// Split on `\n`, dropping a trailing `\r` per line and the empty tail after a final newline
fn split_lines(text: &[u8]) -> Vec<&[u8]> {
    if text.is_empty() {
        return Vec::new();
    }
    let body = text.strip_suffix(b"\n").unwrap_or(text);
    body.split(|&b| b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .collect()
}

/// Parse one numeric field, tolerating surrounding whitespace
fn parse_field(raw: &[u8]) -> Option<f64> {
    std::str::from_utf8(raw).ok()?.trim().parse::<f64>().ok()
}

/// Read a lifted index grid of the given shape
pub fn read_lifted_index<P: AsRef<Path>>(path: P, shape: GridShape) -> PrepResult<ScalarGrid> {
    LiftedIndexReader::with_shape(shape).read(path)
}
