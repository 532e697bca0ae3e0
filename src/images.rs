//! Fetching the remote pictures that go into a preview image: author
//! avatars and reference thumbnails.

use crate::error::{Error, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use tracing::debug;
use url::Url;

const MAX_IMAGE_BYTES: u64 = 8 * 1024 * 1024;
const IPFS_GATEWAY: &str = "https://ipfs.io/ipfs/";

pub async fn fetch_image(client: &reqwest::Client, url: &str) -> Result<DynamicImage> {
    if let Some(data) = url.strip_prefix("data:") {
        return decode_data_uri(data);
    }

    let url = match url.strip_prefix("ipfs://") {
        Some(path) => Url::parse(IPFS_GATEWAY)?.join(path)?,
        None => Url::parse(url)?,
    };

    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::Generic(format!("unsupported image url scheme: {}", url.scheme())));
    }

    debug!("fetching image {}", url);
    let mut response = client.get(url.clone()).send().await?;
    if !response.status().is_success() {
        return Err(Error::Generic(format!("{} for image {}", response.status(), url)));
    }
    if response.content_length().is_some_and(|len| len > MAX_IMAGE_BYTES) {
        return Err(Error::Generic(format!("image too large: {}", url)));
    }

    // chunked responses have no length up front, so count as we go
    let mut bytes = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        if (bytes.len() + chunk.len()) as u64 > MAX_IMAGE_BYTES {
            return Err(Error::Generic(format!("image too large: {}", url)));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(image::load_from_memory(&bytes)?)
}

/// `image/png;base64,....` (the part after `data:`)
fn decode_data_uri(data: &str) -> Result<DynamicImage> {
    let (meta, payload) = data
        .split_once(',')
        .ok_or_else(|| Error::Generic("malformed data uri".to_string()))?;

    if !meta.ends_with(";base64") {
        return Err(Error::Generic(format!("unsupported data uri encoding: {}", meta)));
    }

    let bytes = STANDARD
        .decode(payload)
        .map_err(|err| Error::Generic(format!("bad base64 in data uri: {}", err)))?;
    Ok(image::load_from_memory(&bytes)?)
}
