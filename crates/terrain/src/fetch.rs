use thiserror::Error;

use crate::tile::TileCoord;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("upstream returned HTTP {status} for {url}")]
    Status { status: u16, url: String },
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("no upstream configured for {0}")]
    Unconfigured(String),
}

/// Upstream seam: returns the raw bytes of one tile URL.
pub trait TileFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

impl<F> TileFetcher for F
where
    F: Fn(&str) -> Result<Vec<u8>, FetchError>,
{
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self(url)
    }
}

/// Fetcher for offline runs; every request fails and the sampler degrades.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFetch;

impl TileFetcher for NoFetch {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        Err(FetchError::Unconfigured(url.to_string()))
    }
}

pub fn tile_url(template: &str, coord: TileCoord) -> String {
    template
        .replace("{z}", &coord.z.to_string())
        .replace("{x}", &coord.x.to_string())
        .replace("{y}", &coord.y.to_string())
}

/// File extension for cached tiles: `{y}.<ext>` in the template, else the
/// URL path suffix, else `png`.
pub fn infer_extension(template: &str) -> String {
    if let Some((_, rest)) = template.split_once("{y}.") {
        let ext: String = rest
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect();
        if !ext.is_empty() {
            return ext;
        }
    }

    let without_scheme = template
        .split_once("://")
        .map_or(template, |(_, rest)| rest);
    let path = without_scheme
        .split(['?', '#'])
        .next()
        .unwrap_or(without_scheme);
    let path = path.split_once('/').map_or("", |(_, p)| p);
    let last = path.rsplit('/').next().unwrap_or("");
    match last.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext.to_string(),
        _ => "png".to_string(),
    }
}

#[cfg(feature = "http")]
pub use remote::HttpTileFetcher;

#[cfg(feature = "http")]
mod remote {
    use std::time::Duration;

    use super::{FetchError, TileFetcher};

    /// Per-request timeout for upstream tile fetches.
    pub const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

    /// Blocking HTTP fetcher; one attempt per tile, no retry.
    #[derive(Debug, Clone)]
    pub struct HttpTileFetcher {
        client: reqwest::blocking::Client,
    }

    impl HttpTileFetcher {
        pub fn new() -> Result<Self, FetchError> {
            let client = reqwest::blocking::Client::builder()
                .timeout(FETCH_TIMEOUT)
                .user_agent(concat!("trailgen/", env!("CARGO_PKG_VERSION")))
                .build()
                .map_err(|e| FetchError::Transport {
                    url: String::new(),
                    message: e.to_string(),
                })?;
            Ok(Self { client })
        }
    }

    impl TileFetcher for HttpTileFetcher {
        fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            let transport = |e: reqwest::Error| FetchError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            };
            let resp = self.client.get(url).send().map_err(transport)?;
            if !resp.status().is_success() {
                return Err(FetchError::Status {
                    status: resp.status().as_u16(),
                    url: url.to_string(),
                });
            }
            Ok(resp.bytes().map_err(transport)?.to_vec())
        }
    }
}
