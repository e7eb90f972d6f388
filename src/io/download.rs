use crate::io::query::{Product, QueryParams, RegionTable, API_URL};
use crate::types::{BoundingBox, PrepError, PrepResult, HEIGHT, WIDTH};
use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Source of raw product payloads (PNG rasters or csv grids)
pub trait Fetcher {
    fn fetch(
        &self,
        product: Product,
        bbox: &BoundingBox,
        timestamp: DateTime<Utc>,
    ) -> PrepResult<Vec<u8>>;
}

/// Fetcher backed by the HTTP API with basic authentication
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    base_url: String,
    user: String,
    password: String,
    image_w: usize,
    image_h: usize,
}

impl HttpFetcher {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> PrepResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()?;

        Ok(Self {
            client,
            base_url: API_URL.to_string(),
            user: user.into(),
            password: password.into(),
            image_w: WIDTH,
            image_h: HEIGHT,
        })
    }

    /// Point the fetcher at another API endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(
        &self,
        product: Product,
        bbox: &BoundingBox,
        timestamp: DateTime<Utc>,
    ) -> PrepResult<Vec<u8>> {
        let params = QueryParams {
            image_w: self.image_w,
            image_h: self.image_h,
            bbox: *bbox,
            timestamp,
        };
        let url = params.url(&self.base_url, product);
        log::info!("Requesting {}", url);

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.user, Some(&self.password))
            .send()?
            .error_for_status()?;

        Ok(response.bytes()?.to_vec())
    }
}

/// Outcome of one download pass
#[derive(Debug, Default)]
pub struct DownloadSummary {
    pub written: Vec<PathBuf>,
    pub failed_regions: Vec<(String, String)>,
}

/// Stores every product of every region for a single timestamp
pub struct Downloader {
    data_root: PathBuf,
    regions: RegionTable,
}

impl Downloader {
    pub fn new(data_root: impl Into<PathBuf>, regions: RegionTable) -> Self {
        Self {
            data_root: data_root.into(),
            regions,
        }
    }

    /// Download all regions; a failing region is logged and skipped
    pub fn download_all(&self, fetcher: &dyn Fetcher, timestamp: DateTime<Utc>) -> DownloadSummary {
        let mut summary = DownloadSummary::default();

        for (region, bbox) in self.regions.iter() {
            log::info!("{} | Downloading data for region: {}", timestamp.timestamp(), region);

            match self.download_region(fetcher, region, bbox, timestamp) {
                Ok(paths) => summary.written.extend(paths),
                Err(e) => {
                    log::error!("ERROR: {}: {}", region, e);
                    summary.failed_regions.push((region.to_string(), e.to_string()));
                }
            }
        }

        summary
    }

    /// Download the products of one region, stopping at the first failure
    pub fn download_region(
        &self,
        fetcher: &dyn Fetcher,
        region: &str,
        bbox: &BoundingBox,
        timestamp: DateTime<Utc>,
    ) -> PrepResult<Vec<PathBuf>> {
        let region_dir = self.data_root.join(region);
        let mut written = Vec::with_capacity(Product::ALL.len());

        for product in Product::ALL {
            let payload = fetcher.fetch(product, bbox, timestamp)?;
            if payload.is_empty() {
                return Err(PrepError::Processing(format!("empty {} payload", product)));
            }

            let path = region_dir
                .join(product.store_dir())
                .join(format!("{}.{}", timestamp.timestamp(), product.format()));
            write_atomic(&path, &payload)?;
            log::debug!("Saved {} ({} bytes)", path.display(), payload.len());
            written.push(path);
        }

        Ok(written)
    }
}

/// Write bytes through a sibling temporary file and rename into place
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> PrepResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut temp_file = tempfile::Builder::new().prefix(".satprep-").tempfile_in(dir)?;
    temp_file.write_all(bytes)?;
    temp_file.as_file().sync_all()?;
    temp_file.persist(path).map_err(|e| PrepError::Io(e.error))?;
    Ok(())
}
