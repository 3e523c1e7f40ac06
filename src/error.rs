//! Error types for the edgequake-pdf-chat library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ChatError`] — **Fatal** for the operation that raised it (bad input
//!   file, wrong password, missing API key). Returned as `Err(ChatError)`
//!   from document loading and session construction.
//!
//! * [`CompletionError`] — **Recovered**: a single send failed (network
//!   glitch, garbage body) but the conversation is fine. The session turns
//!   it into a fallback assistant message instead of propagating it, so the
//!   chat never aborts because one request went wrong.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-pdf-chat library.
///
/// Per-send failures use [`CompletionError`] and never surface here.
#[derive(Debug, Error)]
pub enum ChatError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The bytes were read, but they are not a PDF.
    #[error("'{source_name}' is not a valid PDF\nFirst bytes: {magic:?}")]
    NotAPdf { source_name: String, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF is corrupt: {detail}\nTry repairing with: qpdf --decrypt input.pdf output.pdf")]
    CorruptPdf { detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired,

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF")]
    WrongPassword,

    /// pdfium could not read the text layer of a page.
    #[error("Text extraction failed for page {page}: {detail}")]
    ExtractionFailed { page: usize, detail: String },

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Text extraction needs the pdfium shared library at runtime. You can:\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n\
  • Install pdfium system-wide so the dynamic loader can find it.\n\
  • Place libpdfium next to the working directory.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// No API key was configured for the remote model.
    #[error("No API key configured for the model endpoint.\nSet GEMINI_API_KEY or pass --api-key.")]
    MissingApiKey,

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the transcript file.
    #[error("Failed to write transcript '{path}': {source}")]
    TranscriptWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A recoverable error for a single send.
///
/// Never returned to the caller of [`crate::session::ChatSession::send`];
/// the session logs it and appends a fallback assistant message instead.
#[derive(Debug, Clone, Error)]
pub enum CompletionError {
    /// Connection refused, DNS failure, reset, TLS error.
    #[error("Request to model endpoint failed: {0}")]
    Transport(String),

    /// The configured request timeout elapsed.
    #[error("Request to model endpoint timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The endpoint answered but the body is not the expected JSON.
    #[error("Model endpoint returned an unreadable body (HTTP {status}): {detail}")]
    InvalidBody { status: u16, detail: String },
}
