//! The attached document and the one-call way to load it.
//!
//! A session holds at most one [`ExtractedDocument`]. Each upload replaces
//! it wholesale; its text rides along verbatim on every later request.

use crate::config::ChatConfig;
use crate::error::ChatError;
use crate::pipeline::extract::{self, ExtractedText, PdfiumExtractor, TextExtractor};
use crate::pipeline::input;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Plain text of the most recently uploaded document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    /// File name or URL segment shown as "1 file uploaded: …".
    pub source: String,
    /// Concatenated page text.
    pub text: String,
    pub page_count: usize,
}

impl ExtractedDocument {
    pub fn new(source: impl Into<String>, text: impl Into<String>, page_count: usize) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
            page_count,
        }
    }

    pub(crate) fn from_extracted(source: impl Into<String>, extracted: ExtractedText) -> Self {
        Self::new(source, extracted.text, extracted.page_count)
    }

    /// Character count of the text, for status lines.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Resolve `input` (path or URL) and extract it with `extractor`.
pub async fn load_with(
    input_str: &str,
    extractor: Arc<dyn TextExtractor>,
    download_timeout_secs: u64,
) -> Result<ExtractedDocument, ChatError> {
    let resolved = input::resolve_input(input_str, download_timeout_secs).await?;
    let extracted = extract::extract_blocking(extractor, resolved.bytes).await?;
    let document = ExtractedDocument::from_extracted(resolved.name, extracted);

    info!(
        "Extracted '{}': {} pages, {} chars",
        document.source,
        document.page_count,
        document.char_count()
    );
    debug!("Parsed PDF content:\n{}", document.text);
    Ok(document)
}

/// Extract a PDF's text with pdfium, without any model or API key.
pub async fn load_document(
    input_str: impl AsRef<str>,
    config: &ChatConfig,
) -> Result<ExtractedDocument, ChatError> {
    let extractor: Arc<dyn TextExtractor> = Arc::new(PdfiumExtractor::from_config(config));
    load_with(input_str.as_ref(), extractor, config.download_timeout_secs).await
}
