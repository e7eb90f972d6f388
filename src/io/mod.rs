//! I/O modules for lifted index grids, rasters and the imagery API

pub mod download;
pub mod lifted_index;
pub mod query;
pub mod raster;

pub use download::{DownloadSummary, Downloader, Fetcher, HttpFetcher};
pub use lifted_index::{read_lifted_index, LiftedIndexReader};
pub use query::{Product, QueryParams, RegionTable, API_URL};
pub use raster::{ChannelReader, RasterWriter};
