use std::time::Duration;

use image::DynamicImage;
use thiserror::Error;

/// Per-image download deadline. A slow host must not stall the whole
/// invoice for longer than this.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),

    #[error("image decode failed: {0}")]
    Decode(#[from] image::ImageError),
}

pub(crate) async fn fetch_image(
    client: &reqwest::Client,
    url: &str,
) -> Result<DynamicImage, FetchError> {
    let response = client.get(url).timeout(FETCH_TIMEOUT).send().await?;
    if !response.status().is_success() {
        return Err(FetchError::Status(response.status()));
    }
    let bytes = response.bytes().await?;
    Ok(image::load_from_memory(&bytes)?)
}
