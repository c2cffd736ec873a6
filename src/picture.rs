//! Cat picture fetching.
//!
//! The handler-facing surface is the [`PictureProvider`] trait; the shipped
//! implementation queries a public cat-image API over HTTPS.

use std::io::{Cursor, Write};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum PictureError {
    /// Non-success status from the picture API.
    #[error("picture api returned {status} on {route}")]
    Api { status: u16, route: String },
    /// Transport / network error.
    #[error("picture transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The image listing did not parse.
    #[error("malformed picture listing: {0}")]
    Listing(#[from] serde_json::Error),
    /// The image listing parsed but contained no entries.
    #[error("picture listing was empty")]
    Empty,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// Source of cat pictures, injected into handlers that upload images.
#[async_trait]
pub trait PictureProvider: Send + Sync {
    /// Fetch a cat picture as an in-memory stream.
    ///
    /// The stream is returned positioned wherever the fetch left it (the end
    /// of the buffer, for the HTTP implementation). Callers must rewind it
    /// before reading.
    async fn fetch_cat_picture(&self) -> Result<Cursor<Vec<u8>>, PictureError>;
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

const SEARCH_URL: &str = "https://api.thecatapi.com/v1/images/search";

#[derive(Debug, Deserialize)]
struct CatListing {
    url: String,
}

/// HTTP-backed [`PictureProvider`].
pub struct PictureService {
    http: reqwest::Client,
}

impl PictureService {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }
}

impl Default for PictureService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PictureProvider for PictureService {
    async fn fetch_cat_picture(&self) -> Result<Cursor<Vec<u8>>, PictureError> {
        let resp = self.http.get(SEARCH_URL).send().await?;
        if !resp.status().is_success() {
            return Err(PictureError::Api {
                status: resp.status().as_u16(),
                route: SEARCH_URL.to_string(),
            });
        }
        let body = resp.bytes().await?;
        let listing: Vec<CatListing> = serde_json::from_slice(&body)?;
        let image = listing.first().ok_or(PictureError::Empty)?;

        debug!(url = %image.url, "fetching cat image");
        let resp = self.http.get(&image.url).send().await?;
        if !resp.status().is_success() {
            return Err(PictureError::Api {
                status: resp.status().as_u16(),
                route: image.url.clone(),
            });
        }
        let bytes = resp.bytes().await?;

        // Write through the cursor so its position ends at the end of the
        // buffer, like any freshly written stream.
        let mut stream = Cursor::new(Vec::with_capacity(bytes.len()));
        stream.write_all(&bytes)?;
        Ok(stream)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_parses_image_url() {
        let listing: Vec<CatListing> = serde_json::from_str(
            r#"[{ "id": "abc", "url": "https://example.com/cat.png", "width": 1, "height": 1 }]"#,
        )
        .unwrap();
        assert_eq!(listing[0].url, "https://example.com/cat.png");
    }

    #[test]
    fn empty_listing_is_an_error() {
        let listing: Vec<CatListing> = serde_json::from_str("[]").unwrap();
        assert!(matches!(
            listing.first().ok_or(PictureError::Empty),
            Err(PictureError::Empty)
        ));
    }
}
