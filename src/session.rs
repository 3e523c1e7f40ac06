//! The chat controller: one owner for conversation, document and typing state.
//!
//! ## Send lifecycle
//!
//! ```text
//! Idle ──send──▶ Sending ──reply──▶ Succeeded ─┐
//!                   │                           ├──▶ Idle
//!                   └──error──▶ Failed ─────────┘
//! ```
//!
//! 1. Trim the input; empty input is a silent no-op.
//! 2. Append the user message and snapshot the request **under the lock**,
//!    so a concurrent upload is seen either entirely or not at all.
//! 3. Await the backend with no lock held.
//! 4. Append exactly one assistant message, whatever happened.
//!
//! Sends are not serialised: callers may poll several `send` futures at
//! once. User messages land in call order, replies in completion order.

use crate::config::ChatConfig;
use crate::conversation::{Conversation, Message, Origin};
use crate::document::{self, ExtractedDocument};
use crate::error::ChatError;
use crate::observer::{NoopObserver, Observer};
use crate::pipeline::completion::{CompletionBackend, GeminiClient};
use crate::pipeline::extract::{self, PdfiumExtractor, TextExtractor};
use crate::pipeline::input;
use crate::pipeline::request::build_request;
use crate::replies::ReplyOutcome;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

#[derive(Default)]
struct SessionState {
    conversation: Conversation,
    document: Option<ExtractedDocument>,
    in_flight: usize,
}

/// A single chat with the remote model.
pub struct ChatSession {
    backend: Arc<dyn CompletionBackend>,
    extractor: Arc<dyn TextExtractor>,
    observer: Observer,
    download_timeout_secs: u64,
    state: Mutex<SessionState>,
}

impl ChatSession {
    /// Live session: Gemini over HTTP, pdfium for extraction.
    pub fn new(config: &ChatConfig) -> Result<Self, ChatError> {
        let backend = Arc::new(GeminiClient::from_config(config)?);
        let extractor = Arc::new(PdfiumExtractor::from_config(config));
        Ok(Self::with_backends(config, backend, extractor))
    }

    /// Session with injected backends. Only the observer and download
    /// timeout are read from `config`.
    pub fn with_backends(
        config: &ChatConfig,
        backend: Arc<dyn CompletionBackend>,
        extractor: Arc<dyn TextExtractor>,
    ) -> Self {
        Self {
            backend,
            extractor,
            observer: config
                .observer
                .clone()
                .unwrap_or_else(|| Arc::new(NoopObserver) as Observer),
            download_timeout_secs: config.download_timeout_secs,
            state: Mutex::new(SessionState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Send one user turn and wait for the reply.
    ///
    /// Returns `None` for empty or whitespace-only input (nothing is
    /// appended, no request is made). Otherwise returns the assistant
    /// message that was appended, which is a fallback text when the request
    /// failed or produced no candidate.
    pub async fn send(&self, input: &str) -> Option<Message> {
        let prompt = input.trim();
        if prompt.is_empty() {
            return None;
        }

        let request = {
            let mut st = self.state();
            let user = st.conversation.push(Origin::User, prompt);
            let document_text = st.document.as_ref().map_or("", |d| d.text.as_str());
            let request = build_request(st.conversation.messages(), prompt, document_text);
            st.in_flight += 1;
            self.observer.on_message(&user);
            if st.in_flight == 1 {
                self.observer.on_typing_changed(true);
            }
            request
        };
        let mut guard = InFlight { session: self, armed: true };

        info!(
            "Sending turn ({} turns, {} bytes of context)",
            request.contents.len(),
            request.last_text().map_or(0, str::len)
        );

        let outcome = ReplyOutcome::from_result(self.backend.generate(&request).await);
        match &outcome {
            ReplyOutcome::Answered(text) => debug!("Reply: {} chars", text.len()),
            ReplyOutcome::NoCandidate => warn!("Response carried no candidate text"),
            ReplyOutcome::Failed(e) => warn!("Completion request failed: {}", e),
        }

        guard.armed = false;
        self.finish_send(Some(outcome.text()))
    }

    /// Append the reply (if any), drop the in-flight count and notify.
    fn finish_send(&self, reply: Option<&str>) -> Option<Message> {
        let mut st = self.state();
        let message = reply.map(|text| st.conversation.push(Origin::Assistant, text));
        st.in_flight = st.in_flight.saturating_sub(1);
        if let Some(ref m) = message {
            self.observer.on_message(m);
        }
        if st.in_flight == 0 {
            self.observer.on_typing_changed(false);
        }
        message
    }

    /// Resolve a path or URL, extract it and make it the active document.
    ///
    /// On failure the previously attached document stays in place.
    pub async fn attach_document(&self, input_str: &str) -> Result<ExtractedDocument, ChatError> {
        let document =
            document::load_with(input_str, self.extractor.clone(), self.download_timeout_secs)
                .await?;
        self.replace_document(document.clone());
        Ok(document)
    }

    /// Extract in-memory PDF bytes and make them the active document.
    pub async fn attach_bytes(
        &self,
        name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<ExtractedDocument, ChatError> {
        let name = name.into();
        input::check_magic(&name, &bytes)?;
        let extracted = extract::extract_blocking(self.extractor.clone(), bytes).await?;
        let document = ExtractedDocument::from_extracted(name, extracted);
        self.replace_document(document.clone());
        Ok(document)
    }

    fn replace_document(&self, document: ExtractedDocument) {
        let mut st = self.state();
        if let Some(old) = st.document.as_ref() {
            debug!("Replacing document '{}'", old.source);
        }
        info!("Attached '{}' ({} pages)", document.source, document.page_count);
        self.observer.on_document_attached(&document);
        st.document = Some(document);
    }

    /// Snapshot of the conversation in display order.
    pub fn messages(&self) -> Vec<Message> {
        self.state().conversation.messages().to_vec()
    }

    /// The active document, if one was uploaded.
    pub fn document(&self) -> Option<ExtractedDocument> {
        self.state().document.clone()
    }

    /// Whether the "assistant is typing" indicator is up.
    pub fn is_typing(&self) -> bool {
        self.state().in_flight > 0
    }

    /// Number of sends awaiting a reply.
    pub fn in_flight(&self) -> usize {
        self.state().in_flight
    }

    /// Pretty JSON of every message.
    pub fn transcript_json(&self) -> Result<String, ChatError> {
        self.state()
            .conversation
            .to_json()
            .map_err(|e| ChatError::Internal(format!("Failed to serialise transcript: {}", e)))
    }

    /// Write the transcript to `path`.
    ///
    /// Uses atomic write (temp file + rename) to prevent partial files.
    pub async fn save_transcript(&self, path: impl AsRef<Path>) -> Result<(), ChatError> {
        let path = path.as_ref();
        let json = self.transcript_json()?;
        let write_err = |source: std::io::Error| ChatError::TranscriptWriteFailed {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, json).await.map_err(write_err)?;
        tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;

        info!("Transcript written to {}", path.display());
        Ok(())
    }
}

/// Keeps the in-flight count honest if a send future is dropped mid-request.
struct InFlight<'a> {
    session: &'a ChatSession,
    armed: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.session.finish_send(None);
        }
    }
}
