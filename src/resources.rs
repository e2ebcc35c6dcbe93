//! Logo loading – local files, `data:` URIs, raw bytes and http(s) URLs.
//!
//! Loading blocks and is never retried; any failure is returned as
//! [`Error::Resource`] and aborts the document.

use std::path::PathBuf;

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use serde::Deserialize;

use crate::error::{Error, Result};

/// Where a company logo comes from.
///
/// Strings are classified the way they are written: `http…` is fetched,
/// `data:` is decoded in place, anything else is a file path.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum LogoSource {
    Path(PathBuf),
    Url(String),
    DataUri(String),
    Bytes(Vec<u8>),
}

impl From<String> for LogoSource {
    fn from(s: String) -> Self {
        if s.starts_with("http") {
            LogoSource::Url(s)
        } else if s.starts_with("data:") {
            LogoSource::DataUri(s)
        } else {
            LogoSource::Path(PathBuf::from(s))
        }
    }
}

impl From<&str> for LogoSource {
    fn from(s: &str) -> Self {
        LogoSource::from(s.to_string())
    }
}

impl From<Vec<u8>> for LogoSource {
    fn from(bytes: Vec<u8>) -> Self {
        LogoSource::Bytes(bytes)
    }
}

impl LogoSource {
    /// Short human-readable description for logs and errors.
    pub fn location(&self) -> String {
        match self {
            LogoSource::Path(p) => p.display().to_string(),
            LogoSource::Url(u) => u.clone(),
            LogoSource::DataUri(d) => {
                let header = d.split(',').next().unwrap_or("data:");
                format!("{header},…")
            }
            LogoSource::Bytes(b) => format!("<{} bytes>", b.len()),
        }
    }
}

/// Raw encoded image bytes plus where they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub location: String,
    pub bytes: Vec<u8>,
}

impl ImageData {
    /// Re-encode as a `data:` URI for the layout config.
    pub fn to_data_uri(&self) -> String {
        let mime = ::image::guess_format(&self.bytes)
            .map(|f| f.to_mime_type())
            .unwrap_or("application/octet-stream");
        format!("data:{mime};base64,{}", BASE64_STD.encode(&self.bytes))
    }
}

/// Load the bytes behind a logo source.
pub fn load_image(source: &LogoSource) -> Result<ImageData> {
    let location = source.location();
    log::debug!("Loading image from {location}");

    let bytes = match source {
        LogoSource::Path(path) => {
            std::fs::read(path).map_err(|e| Error::resource(location.clone(), e))?
        }
        LogoSource::Url(url) => fetch(url)?,
        LogoSource::DataUri(uri) => {
            parse_data_uri(uri).map_err(|e| Error::resource(location.clone(), e))?
        }
        LogoSource::Bytes(bytes) => bytes.clone(),
    };

    if bytes.is_empty() {
        return Err(Error::resource(location, "image is empty"));
    }
    Ok(ImageData { location, bytes })
}

fn fetch(url: &str) -> Result<Vec<u8>> {
    let response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| Error::resource(url, e))?;
    let body = response.bytes().map_err(|e| Error::resource(url, e))?;
    Ok(body.to_vec())
}

/// Parse a `data:<mime>;base64,<data>` URI and return the raw decoded bytes.
///
/// Returns `Err` if `src` is not a data URI or does not use base64 encoding.
pub fn parse_data_uri(src: &str) -> std::result::Result<Vec<u8>, String> {
    if !src.starts_with("data:") {
        let preview: String = src.chars().take(80).collect();
        return Err(format!(
            "Image src must be a base64 data URI \
             (e.g. `data:image/png;base64,...`). Got: {preview:?}"
        ));
    }
    let rest = &src["data:".len()..];
    let comma_pos = rest.find(',').ok_or_else(|| {
        "Invalid data URI: missing `,` separator between header and data".to_string()
    })?;
    let header = &rest[..comma_pos];
    if !header.contains(";base64") {
        return Err("Only base64-encoded data URIs are supported. \
             The header must contain `;base64` (e.g. `data:image/png;base64,...`)."
            .to_string());
    }
    let b64_data = rest[comma_pos + 1..].trim();
    BASE64_STD
        .decode(b64_data)
        .map_err(|e| format!("Base64 decode error: {e}"))
}
