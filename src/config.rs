//! Configuration types for a chat session.
//!
//! All session behaviour is controlled through [`ChatConfig`], built via its
//! [`ChatConfigBuilder`]. Keeping every knob in one struct makes it trivial
//! to share a config between the REPL, one-shot mode and tests.
//!
//! The only value without a usable default is the API key; everything else
//! points at the public Gemini endpoint.

use crate::error::ChatError;
use crate::observer::Observer;
use std::fmt;
use std::path::PathBuf;

/// Default endpoint root for the Generative Language API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Configuration for a [`crate::session::ChatSession`].
///
/// Built via [`ChatConfig::builder()`] or using [`ChatConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_pdf_chat::ChatConfig;
///
/// let config = ChatConfig::builder()
///     .api_key("test-key")
///     .model("gemini-2.0-flash")
///     .build()
///     .unwrap();
/// assert!(config.endpoint_url().ends_with(":generateContent"));
/// ```
#[derive(Clone)]
pub struct ChatConfig {
    /// API key sent as the `key` query parameter. Required to build a live client.
    pub api_key: Option<String>,

    /// Model identifier, e.g. "gemini-2.0-flash". Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Endpoint root without trailing path. Default: [`DEFAULT_BASE_URL`].
    ///
    /// Pointing this at a local server is how the wire-format tests run
    /// without network access.
    pub base_url: String,

    /// Per-request timeout in seconds. Default: `None` (wait indefinitely).
    ///
    /// A send has no cancellation; without a timeout a hung endpoint keeps
    /// the typing indicator up until the connection drops.
    pub request_timeout_secs: Option<u64>,

    /// Download timeout for URL documents in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Explicit path to the pdfium shared library.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Receives typing, message and document events.
    pub observer: Option<Observer>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: None,
            download_timeout_secs: 120,
            password: None,
            pdfium_lib_path: None,
            observer: None,
        }
    }
}

impl fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field("observer", &self.observer.as_ref().map(|_| "<dyn SessionObserver>"))
            .finish()
    }
}

impl ChatConfig {
    /// Create a new builder for `ChatConfig`.
    pub fn builder() -> ChatConfigBuilder {
        ChatConfigBuilder {
            config: Self::default(),
        }
    }

    /// Default config with the API key taken from `GEMINI_API_KEY`, if set.
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty()),
            ..Self::default()
        }
    }

    /// The `generateContent` URL for the configured model, without the key.
    pub fn endpoint_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

/// Builder for [`ChatConfig`].
#[derive(Debug)]
pub struct ChatConfigBuilder {
    config: ChatConfig,
}

impl ChatConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = Some(secs.max(1));
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn observer(mut self, observer: Observer) -> Self {
        self.config.observer = Some(observer);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ChatConfig, ChatError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(ChatError::InvalidConfig("Model must not be empty".into()));
        }
        if !(c.base_url.starts_with("http://") || c.base_url.starts_with("https://")) {
            return Err(ChatError::InvalidConfig(format!(
                "Base URL must start with http:// or https://, got '{}'",
                c.base_url
            )));
        }
        if c.api_key.as_deref().is_some_and(|k| k.trim().is_empty()) {
            return Err(ChatError::InvalidConfig("API key must not be blank".into()));
        }
        Ok(self.config)
    }
}
