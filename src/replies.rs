//! What the assistant bubble says for each way a send can end.
//!
//! Centralising the canned wording here keeps the session free of string
//! literals and lets tests assert the exact text users see.

use crate::error::CompletionError;
use crate::pipeline::request::GenerateContentResponse;

/// Shown when the endpoint answered but produced no usable candidate.
pub const NO_CANDIDATE_REPLY: &str = "Sorry, I couldn't generate a response.";

/// Shown when the request itself failed (network, timeout, unreadable body).
pub const FAILURE_REPLY: &str = "Something went wrong. Please try again.";

/// How one send ended.
#[derive(Debug, Clone)]
pub enum ReplyOutcome {
    /// The first candidate's first text part, verbatim.
    Answered(String),
    /// Well-formed body without a usable candidate.
    NoCandidate,
    /// The request failed; the error is kept for logging only.
    Failed(CompletionError),
}

impl ReplyOutcome {
    pub fn from_result(result: Result<GenerateContentResponse, CompletionError>) -> Self {
        match result {
            Ok(response) => match response.first_text() {
                Some(text) => ReplyOutcome::Answered(text.to_string()),
                None => ReplyOutcome::NoCandidate,
            },
            Err(e) => ReplyOutcome::Failed(e),
        }
    }

    /// Text for the assistant bubble.
    pub fn text(&self) -> &str {
        match self {
            ReplyOutcome::Answered(text) => text,
            ReplyOutcome::NoCandidate => NO_CANDIDATE_REPLY,
            ReplyOutcome::Failed(_) => FAILURE_REPLY,
        }
    }

    pub fn is_answered(&self) -> bool {
        matches!(self, ReplyOutcome::Answered(_))
    }
}
