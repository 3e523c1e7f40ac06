//! Pipeline stages between the user's keyboard and the remote model.
//!
//! Each submodule implements exactly one step. Keeping stages separate
//! makes each independently testable and lets us swap implementations
//! (another PDF backend, another model API) without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ (session) ──▶ request ──▶ completion
//! (path/URL)  (pdfium)   (history)     (JSON)      (HTTP POST)
//! ```
//!
//! 1. [`input`]      — read a local file or download a URL; check `%PDF`
//! 2. [`extract`]    — pdf bytes → one text string; runs in `spawn_blocking`
//!    because pdfium is not async-safe
//! 3. [`request`]    — history + prompt + document → wire types
//! 4. [`completion`] — the only stage with model network I/O

pub mod completion;
pub mod extract;
pub mod input;
pub mod request;
