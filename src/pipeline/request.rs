//! Request assembly: conversation + document → `generateContent` body.
//!
//! ## Turn Layout
//!
//! The request contains (in order):
//! 1. **History** — every message so far, including the user message that
//!    was just appended, as `user` / `model` turns
//! 2. **Context turn** — one extra `user` turn holding the prompt, a blank
//!    line, and the attached document's full text (empty when none)
//!
//! The context turn is what lets the model read the PDF. It is sent on
//! every request but never stored in the conversation, so the user only
//! ever sees their own words.

use crate::conversation::{Message, Origin};
use serde::{Deserialize, Serialize};

/// Role tag on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl From<Origin> for Role {
    fn from(origin: Origin) -> Self {
        match origin {
            Origin::User => Role::User,
            Origin::Assistant => Role::Model,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

/// One turn of the request payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![Part { text: text.into() }],
        }
    }
}

/// `POST …:generateContent` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

impl GenerateContentRequest {
    /// Text of the final turn, i.e. the context turn.
    pub fn last_text(&self) -> Option<&str> {
        self.contents
            .last()
            .and_then(|c| c.parts.first())
            .map(|p| p.text.as_str())
    }
}

/// Build the request for one send.
///
/// `history` must already end with the user message for `prompt`.
pub fn build_request(history: &[Message], prompt: &str, document_text: &str) -> GenerateContentRequest {
    let mut contents: Vec<Content> = history
        .iter()
        .map(|m| Content::text(m.origin.into(), m.text.clone()))
        .collect();
    contents.push(Content::text(Role::User, context_turn(prompt, document_text)));
    GenerateContentRequest { contents }
}

/// The prompt followed by a blank line and the document text.
pub fn context_turn(prompt: &str, document_text: &str) -> String {
    format!("{prompt}\n\n{document_text}")
}

// ── Response ─────────────────────────────────────────────────────────────
//
// Every field is optional: a well-formed JSON body with missing pieces is
// a "no candidate" reply, not a parse failure.

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Option<Vec<ResponsePart>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
}

/// `generateContent` response body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Option<Vec<Candidate>>,
}

impl GenerateContentResponse {
    /// `candidates[0].content.parts[0].text`, if every step exists.
    pub fn first_text(&self) -> Option<&str> {
        self.candidates
            .as_ref()?
            .first()?
            .content
            .as_ref()?
            .parts
            .as_ref()?
            .first()?
            .text
            .as_deref()
    }

    /// A single-candidate response carrying `text`.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            candidates: Some(vec![Candidate {
                content: Some(CandidateContent {
                    parts: Some(vec![ResponsePart {
                        text: Some(text.into()),
                    }]),
                }),
            }]),
        }
    }
}
