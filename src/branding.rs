//! Branding logo, fetched once and shared by every report
//!
//! The logo is the only asset a report needs from outside its input record.
//! It is fetched at most once per process; a failed fetch is remembered as
//! "no logo" and page headers fall back to the brand name.

use crate::error::{ReportError, Result};
use crate::render::surface::Image;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

#[async_trait]
pub trait LogoSource: Send + Sync {
    async fn fetch(&self) -> Result<Image>;

    /// Where the logo comes from, for log lines
    fn describe(&self) -> String;
}

/// Logo served over HTTP(S)
pub struct HttpLogo {
    url: String,
    client: reqwest::Client,
}

impl HttpLogo {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), client: reqwest::Client::new() }
    }
}

#[async_trait]
impl LogoSource for HttpLogo {
    async fn fetch(&self) -> Result<Image> {
        let response = self.client.get(&self.url).send().await?.error_for_status()?;
        let mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
            .filter(|v| v.starts_with("image/"))
            .unwrap_or_else(|| mime_from_path(Path::new(&self.url)).to_string());
        let bytes = response.bytes().await?.to_vec();
        if bytes.is_empty() {
            return Err(ReportError::Branding(format!("{} returned an empty body", self.url)));
        }
        Ok(Image { mime, bytes })
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Logo read from the local filesystem
pub struct FileLogo {
    path: PathBuf,
}

impl FileLogo {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl LogoSource for FileLogo {
    async fn fetch(&self) -> Result<Image> {
        let bytes = tokio::fs::read(&self.path).await?;
        if bytes.is_empty() {
            return Err(ReportError::Branding(format!("{} is empty", self.path.display())));
        }
        Ok(Image { mime: mime_from_path(&self.path).to_string(), bytes })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// `http://` and `https://` locations are fetched, anything else is a path.
pub fn logo_source(location: &str) -> Box<dyn LogoSource> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Box::new(HttpLogo::new(location))
    } else {
        Box::new(FileLogo::new(location))
    }
}

fn mime_from_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Memoized logo. Clone the `Arc` it hands out; never refetches.
pub struct BrandingCache {
    source: Option<Box<dyn LogoSource>>,
    logo: OnceCell<Option<Arc<Image>>>,
}

impl BrandingCache {
    pub fn new(source: Box<dyn LogoSource>) -> Self {
        Self { source: Some(source), logo: OnceCell::new() }
    }

    /// A cache that always yields no logo
    pub fn disabled() -> Self {
        Self { source: None, logo: OnceCell::new() }
    }

    /// The logo, fetching it on the first call. Concurrent first calls share
    /// one fetch.
    pub async fn logo(&self) -> Option<Arc<Image>> {
        self.logo
            .get_or_init(|| async {
                let source = self.source.as_ref()?;
                match source.fetch().await {
                    Ok(image) => {
                        info!(source = %source.describe(), bytes = image.bytes.len(), "logo loaded");
                        Some(Arc::new(image))
                    }
                    Err(e) => {
                        warn!(source = %source.describe(), error = %e, "logo unavailable, rendering without it");
                        None
                    }
                }
            })
            .await
            .clone()
    }
}
