//! Observer trait for session events.
//!
//! Inject an [`Arc<dyn SessionObserver>`] via
//! [`crate::config::ChatConfigBuilder::observer`] to hear about every
//! message the session appends, every document it attaches, and changes of
//! the "assistant is typing" indicator.
//!
//! Callbacks are the least-invasive integration point: the REPL drives a
//! spinner and prints bubbles from them, a GUI could forward them to its
//! event loop, and tests just count them.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdf_chat::{ChatConfig, Message, SessionObserver};
//! use std::sync::Arc;
//!
//! struct PrintReplies;
//!
//! impl SessionObserver for PrintReplies {
//!     fn on_message(&self, message: &Message) {
//!         println!("{}", message.text);
//!     }
//! }
//!
//! let config = ChatConfig::builder()
//!     .observer(Arc::new(PrintReplies))
//!     .build()
//!     .unwrap();
//! ```

use crate::conversation::Message;
use crate::document::ExtractedDocument;
use std::sync::Arc;

/// Called by [`crate::session::ChatSession`] as state changes.
///
/// Implementations must be `Send + Sync`: overlapping sends may finish on
/// different worker threads. Every method defaults to a no-op.
///
/// Callbacks run while the session's state lock is held, so events arrive
/// in the same order as the state changes they describe. Do not call back
/// into the session from a callback; copy what you need from the arguments.
pub trait SessionObserver: Send + Sync {
    /// The typing indicator turned on (`true`) or off (`false`).
    ///
    /// Fires on transitions only: a second overlapping send does not fire
    /// `true` again, and `false` fires once the last in-flight send settles.
    fn on_typing_changed(&self, typing: bool) {
        let _ = typing;
    }

    /// A message (user or assistant) was appended to the conversation.
    fn on_message(&self, message: &Message) {
        let _ = message;
    }

    /// A document replaced the previously attached one.
    fn on_document_attached(&self, document: &ExtractedDocument) {
        let _ = document;
    }
}

/// A no-op implementation used when no observer is configured.
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

/// Convenience alias matching the type stored in [`crate::config::ChatConfig`].
pub type Observer = Arc<dyn SessionObserver>;
