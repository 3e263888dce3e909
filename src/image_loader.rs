//! # Image Loading and Decoding
//!
//! Resolves a panel's artwork to decoded RGBA pixels. Sources may be data
//! URIs, raw base64 (what image generators usually return), file paths, or
//! remote URLs. Remote URLs go through an [`ImageFetcher`] so the engine
//! itself never opens a socket; the `http` feature provides a blocking
//! `reqwest` fetcher for the CLI.
//!
//! Everything is decoded to 8-bit RGBA: panels are composited onto a
//! raster page, so JPEG pass-through buys nothing here.

use std::io::Cursor;

use crate::model::ComicPanel;

/// Decoded artwork, straight (non-premultiplied) RGBA.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub width_px: u32,
    pub height_px: u32,
    /// width * height * 4 bytes.
    pub rgba: Vec<u8>,
}

/// Retrieves the bytes behind a remote image URL.
pub trait ImageFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, String>;
}

/// Refuses every remote URL. Used when the host supplies no fetcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFetcher;

impl ImageFetcher for NoFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, String> {
        Err(format!("No image fetcher configured for remote image '{}'", url))
    }
}

/// Blocking HTTP(S) fetcher.
#[cfg(feature = "http")]
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

#[cfg(feature = "http")]
impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(feature = "http")]
impl ImageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, String> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| format!("Failed to fetch '{}': {}", url, e))?;
        if !response.status().is_success() {
            return Err(format!("Failed to fetch '{}': HTTP {}", url, response.status()));
        }
        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| format!("Failed to read '{}': {}", url, e))
    }
}

/// The source a panel's artwork is loaded from. Inline base64 wins over a
/// URL, matching how generators return both.
pub fn panel_image_source(panel: &ComicPanel) -> Option<&str> {
    panel
        .image_base64
        .as_deref()
        .filter(|s| !s.is_empty())
        .or_else(|| panel.image_url.as_deref().filter(|s| !s.is_empty()))
}

/// Load and decode an image from a source string.
///
/// Supported `src` formats:
/// - `data:image/...;base64,...`: data URI
/// - `http://` / `https://`: fetched through `fetcher`
/// - File path (absolute or `./`, `../` relative): read from disk
/// - Raw base64-encoded image data
pub fn load_image(src: &str, fetcher: &dyn ImageFetcher) -> Result<LoadedImage, String> {
    let raw_bytes = read_source_bytes(src, fetcher)?;
    decode_image_bytes(&raw_bytes)
}

fn read_source_bytes(src: &str, fetcher: &dyn ImageFetcher) -> Result<Vec<u8>, String> {
    if src.starts_with("data:") {
        let comma_pos = src
            .find(',')
            .ok_or_else(|| "Invalid data URI: missing comma".to_string())?;
        return base64_decode(&src[comma_pos + 1..]);
    }

    if src.starts_with("http://") || src.starts_with("https://") {
        return fetcher.fetch(src);
    }

    // Only explicit path prefixes count as files; base64 may contain '/'.
    if src.starts_with('/') || src.starts_with("./") || src.starts_with("../") {
        #[cfg(not(target_arch = "wasm32"))]
        {
            return std::fs::read(src).map_err(|e| format!("Failed to read image file '{}': {}", src, e));
        }
        #[cfg(target_arch = "wasm32")]
        {
            return Err(format!(
                "File path images not supported in WASM: '{}'. Use data URIs or base64.",
                src
            ));
        }
    }

    base64_decode(src)
}

fn base64_decode(input: &str) -> Result<Vec<u8>, String> {
    use base64::Engine;
    let cleaned: String = input.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(cleaned)
        .map_err(|e| format!("Base64 decode error: {}", e))
}

fn decode_image_bytes(data: &[u8]) -> Result<LoadedImage, String> {
    if data.len() < 4 {
        return Err("Image data too short".to_string());
    }

    let reader = image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| format!("Image format detection error: {}", e))?;
    if reader.format().is_none() {
        return Err("Unsupported image format (expected JPEG, PNG or WebP)".to_string());
    }

    let img = reader.decode().map_err(|e| format!("Failed to decode image: {}", e))?;
    let rgba = img.to_rgba8();
    let (width_px, height_px) = rgba.dimensions();
    if width_px == 0 || height_px == 0 {
        return Err("Image has no pixels".to_string());
    }

    Ok(LoadedImage {
        width_px,
        height_px,
        rgba: rgba.into_raw(),
    })
}
