//! Tile downloads over HTTP (or from disk) on the tokio runtime.

use std::io;
use std::path::PathBuf;

use bytes::Bytes;
use image::RgbaImage;
use render::TileImage;
use streaming::{Completion, CompletionSender, FetchError, FetchRequest, TileFetcher};
use tokio::runtime::Handle;
use tracing::{debug, trace};

/// Decoded tile pixels.
#[derive(Debug, Clone)]
pub struct Tile(pub RgbaImage);

impl TileImage for Tile {
    fn width(&self) -> u32 {
        self.0.width()
    }

    fn height(&self) -> u32 {
        self.0.height()
    }
}

/// Spawns one task per tile; each posts its completion back when done.
pub struct HttpFetcher {
    runtime: Handle,
    anonymous: reqwest::Client,
    credentialed: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(runtime: Handle) -> Result<Self, reqwest::Error> {
        Ok(Self {
            runtime,
            anonymous: reqwest::Client::builder().build()?,
            credentialed: reqwest::Client::builder().cookie_store(true).build()?,
        })
    }
}

impl TileFetcher for HttpFetcher {
    type Image = Tile;

    fn fetch(&mut self, request: FetchRequest, done: CompletionSender<Tile>) {
        let client = if request.credentialed {
            self.credentialed.clone()
        } else {
            self.anonymous.clone()
        };
        self.runtime.spawn(async move {
            let result = match local_path(&request.identifier) {
                Some(path) => read_file(path).await,
                None => download(&client, &request.identifier).await,
            };
            let result = match result {
                Ok(bytes) => decode_blocking(bytes).await,
                Err(err) => Err(err),
            };
            trace!(identifier = %request.identifier, ok = result.is_ok(), "tile fetch finished");
            // The view may already be gone at shutdown.
            let _ = done.send(Completion::for_request(&request, result));
        });
    }
}

/// Identifiers without a URL scheme, or with `file://`, name files on disk.
fn local_path(identifier: &str) -> Option<PathBuf> {
    if let Some(path) = identifier.strip_prefix("file://") {
        return Some(PathBuf::from(path));
    }
    if identifier.contains("://") {
        None
    } else {
        Some(PathBuf::from(identifier))
    }
}

async fn read_file(path: PathBuf) -> Result<Bytes, FetchError> {
    match tokio::fs::read(&path).await {
        Ok(data) => Ok(Bytes::from(data)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            Err(FetchError::NotFound(path.display().to_string()))
        }
        Err(err) => Err(FetchError::Network(err.to_string())),
    }
}

async fn download(client: &reqwest::Client, url: &str) -> Result<Bytes, FetchError> {
    debug!(url, "GET tile");
    let resp = client
        .get(url)
        .send()
        .await
        .map_err(|err| FetchError::Network(err.to_string()))?;
    if resp.status() == reqwest::StatusCode::NOT_FOUND {
        return Err(FetchError::NotFound(url.to_string()));
    }
    let resp = resp
        .error_for_status()
        .map_err(|err| FetchError::Network(err.to_string()))?;
    resp.bytes()
        .await
        .map_err(|err| FetchError::Network(err.to_string()))
}

async fn decode_blocking(bytes: Bytes) -> Result<Tile, FetchError> {
    tokio::task::spawn_blocking(move || decode(&bytes))
        .await
        .map_err(|err| FetchError::Decode(err.to_string()))?
}

pub fn decode(bytes: &[u8]) -> Result<Tile, FetchError> {
    image::load_from_memory(bytes)
        .map(|img| Tile(img.to_rgba8()))
        .map_err(|err| FetchError::Decode(err.to_string()))
}
