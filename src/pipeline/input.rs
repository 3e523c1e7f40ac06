//! Input resolution: turn a user-supplied path or URL into PDF bytes.
//!
//! pdfium can load straight from a byte slice, so unlike a rasteriser we
//! never need a temp file: local files are read, URLs are downloaded into
//! memory. We validate the PDF magic bytes (`%PDF`) before returning so
//! callers get a meaningful error rather than an opaque pdfium failure.

use crate::error::ChatError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// PDF bytes plus a display name for the "file uploaded" indicator.
#[derive(Debug, Clone)]
pub struct ResolvedInput {
    /// File name (local) or last URL segment (download).
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to PDF bytes.
///
/// If the input is a URL, download it. If the input is a local file,
/// validate it exists and is readable.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, ChatError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ChatError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(input).await
    }
}

/// Reject anything that does not start with `%PDF`.
pub fn check_magic(name: &str, bytes: &[u8]) -> Result<(), ChatError> {
    if bytes.len() >= 4 && &bytes[..4] == b"%PDF" {
        return Ok(());
    }
    let mut magic = [0u8; 4];
    let n = bytes.len().min(4);
    magic[..n].copy_from_slice(&bytes[..n]);
    Err(ChatError::NotAPdf {
        source_name: name.to_string(),
        magic,
    })
}

/// Read a local file, validating existence, permissions and PDF magic bytes.
async fn resolve_local(path_str: &str) -> Result<ResolvedInput, ChatError> {
    let path = PathBuf::from(path_str);

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ChatError::FileNotFound { path });
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ChatError::PermissionDenied { path });
        }
        Err(_) => return Err(ChatError::FileNotFound { path }),
    };

    let name = display_name(&path);
    check_magic(&name, &bytes)?;

    debug!("Resolved local PDF: {} ({} bytes)", path.display(), bytes.len());
    Ok(ResolvedInput { name, bytes })
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Download a URL into memory.
async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, ChatError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ChatError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            ChatError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            ChatError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(ChatError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ChatError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let name = filename_from_url(url);
    check_magic(&name, &bytes)?;

    info!("Downloaded {} bytes as '{}'", bytes.len(), name);
    Ok(ResolvedInput {
        name,
        bytes: bytes.to_vec(),
    })
}

/// Extract a reasonable filename from the URL path.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded.pdf".to_string()
}
