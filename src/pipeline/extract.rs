//! Text extraction: turn PDF bytes into one plain-text string.
//!
//! Extraction sits behind the [`TextExtractor`] trait so the session never
//! touches pdfium directly. Tests inject a fake; a different backend
//! (lopdf, an OCR service) only needs to implement one method.
//!
//! ## Joining rules
//!
//! Every backend yields text fragments per page, in page order starting at
//! page 1. [`join_pages`] then joins fragments within a page with a single
//! space, ends each page with a newline, and trims the whole result. No
//! per-page structure survives beyond the page count.
//!
//! ## Why spawn_blocking?
//!
//! pdfium is a C++ library with internal global state and no async API.
//! [`extract_blocking`] moves the work onto Tokio's blocking pool so a large
//! document does not stall the worker that is also driving in-flight sends.

use crate::config::ChatConfig;
use crate::error::ChatError;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Output of a [`TextExtractor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,
    pub page_count: usize,
}

/// A document-text-extraction capability: bytes in, text or failure out.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedText, ChatError>;
}

/// Join per-page fragments into the final document text.
pub fn join_pages<P, F>(pages: P) -> ExtractedText
where
    P: IntoIterator<Item = F>,
    F: IntoIterator,
    F::Item: AsRef<str>,
{
    let mut text = String::new();
    let mut page_count = 0;
    for fragments in pages {
        let mut first = true;
        for fragment in fragments {
            if !first {
                text.push(' ');
            }
            text.push_str(fragment.as_ref());
            first = false;
        }
        text.push('\n');
        page_count += 1;
    }
    ExtractedText {
        text: text.trim().to_string(),
        page_count,
    }
}

/// Run `extractor` on the blocking pool.
pub async fn extract_blocking(
    extractor: Arc<dyn TextExtractor>,
    bytes: Vec<u8>,
) -> Result<ExtractedText, ChatError> {
    tokio::task::spawn_blocking(move || extractor.extract(&bytes))
        .await
        .map_err(|e| ChatError::Internal(format!("Extraction task panicked: {}", e)))?
}

/// pdfium-backed extractor. Binds the library on every call so the value
/// itself stays plain data and can be shared freely.
#[derive(Debug, Clone, Default)]
pub struct PdfiumExtractor {
    library_path: Option<PathBuf>,
    password: Option<String>,
}

impl PdfiumExtractor {
    pub fn new(library_path: Option<PathBuf>, password: Option<String>) -> Self {
        Self {
            library_path,
            password,
        }
    }

    pub fn from_config(config: &ChatConfig) -> Self {
        Self::new(config.pdfium_lib_path.clone(), config.password.clone())
    }

    fn bind(&self) -> Result<Pdfium, ChatError> {
        let bindings = match &self.library_path {
            Some(path) => Pdfium::bind_to_library(path),
            None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library()),
        }
        .map_err(|e| ChatError::PdfiumBindingFailed(format!("{:?}", e)))?;
        Ok(Pdfium::new(bindings))
    }
}

impl TextExtractor for PdfiumExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedText, ChatError> {
        let pdfium = self.bind()?;
        let password = self.password.as_deref();

        let document = pdfium
            .load_pdf_from_byte_slice(bytes, password)
            .map_err(|e| {
                let err_str = format!("{:?}", e);
                if err_str.contains("Password") || err_str.contains("password") {
                    if password.is_some() {
                        ChatError::WrongPassword
                    } else {
                        ChatError::PasswordRequired
                    }
                } else {
                    ChatError::CorruptPdf { detail: err_str }
                }
            })?;

        let pages = document.pages();
        info!("PDF loaded: {} pages", pages.len());

        let mut per_page = Vec::with_capacity(pages.len() as usize);
        for (idx, page) in pages.iter().enumerate() {
            let text = page.text().map_err(|e| ChatError::ExtractionFailed {
                page: idx + 1,
                detail: format!("{:?}", e),
            })?;
            let fragments: Vec<String> = text.segments().iter().map(|s| s.text()).collect();
            debug!("Page {}: {} text fragments", idx + 1, fragments.len());
            per_page.push(fragments);
        }

        Ok(join_pages(per_page))
    }
}
