//! # edgequake-pdf-chat
//!
//! Chat with a Gemini model about a PDF document.
//!
//! The crate is a thin client: the model does the thinking, and this side
//! keeps the conversation, pulls the text out of an uploaded PDF, and ships
//! both to the `generateContent` endpoint on every turn.
//!
//! ## Flow of one turn
//!
//! ```text
//! user input
//!  │
//!  ├─ 1. Trim    empty input is ignored
//!  ├─ 2. Store   append the user message (shown immediately)
//!  ├─ 3. Build   history turns + "prompt\n\n<document text>" context turn
//!  ├─ 4. POST    one request, no retries, no streaming
//!  └─ 5. Reply   first candidate's text, or a fixed fallback message
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf_chat::{ChatConfig, ChatSession};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // API key from GEMINI_API_KEY
//!     let config = ChatConfig::from_env();
//!     let session = ChatSession::new(&config)?;
//!     session.attach_document("paper.pdf").await?;
//!     if let Some(reply) = session.send("Summarise section 2").await {
//!         println!("{}", reply.text);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfchat` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-pdf-chat = { version = "0.1", default-features = false }
//! ```
//!
//! ## Runtime requirement
//!
//! Text extraction binds the pdfium shared library at runtime. Point
//! `PDFIUM_LIB_PATH` at it, or install it where the dynamic loader looks.
//! Chatting without a document needs no pdfium at all.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod conversation;
pub mod document;
pub mod error;
pub mod observer;
pub mod pipeline;
pub mod replies;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ChatConfig, ChatConfigBuilder};
pub use conversation::{Conversation, Message, MessageId, Origin};
pub use document::{load_document, ExtractedDocument};
pub use error::{ChatError, CompletionError};
pub use observer::{NoopObserver, Observer, SessionObserver};
pub use pipeline::completion::{CompletionBackend, GeminiClient};
pub use pipeline::extract::{ExtractedText, PdfiumExtractor, TextExtractor};
pub use pipeline::request::{GenerateContentRequest, GenerateContentResponse};
pub use replies::{ReplyOutcome, FAILURE_REPLY, NO_CANDIDATE_REPLY};
pub use session::ChatSession;
