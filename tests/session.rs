//! Behavioural tests for `ChatSession` with fake backends.
//!
//! No network, no pdfium: the completion backend and text extractor are
//! injected, so these run everywhere and pin down the ordering and
//! fallback guarantees of a send.

use async_trait::async_trait;
use edgequake_pdf_chat::{
    ChatConfig, ChatError, ChatSession, CompletionBackend, CompletionError, ExtractedDocument,
    ExtractedText, GenerateContentRequest, GenerateContentResponse, Message, Origin,
    SessionObserver, TextExtractor, FAILURE_REPLY, NO_CANDIDATE_REPLY,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Replies with the text of the final (context) turn.
struct Echo;

#[async_trait]
impl CompletionBackend for Echo {
    async fn generate(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, CompletionError> {
        Ok(GenerateContentResponse::from_text(
            request.last_text().unwrap_or_default(),
        ))
    }
}

/// Records every request and answers with a fixed result.
struct Scripted {
    result: Result<GenerateContentResponse, CompletionError>,
    seen: Mutex<Vec<GenerateContentRequest>>,
}

impl Scripted {
    fn new(result: Result<GenerateContentResponse, CompletionError>) -> Arc<Self> {
        Arc::new(Self {
            result,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<GenerateContentRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionBackend for Scripted {
    async fn generate(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, CompletionError> {
        self.seen.lock().unwrap().push(request.clone());
        self.result.clone()
    }
}

/// Holds each reply until the test releases it, keyed by the user prompt.
#[derive(Default)]
struct Gated {
    gates: Mutex<HashMap<String, oneshot::Receiver<String>>>,
}

impl Gated {
    fn gate(&self, prompt: &str) -> oneshot::Sender<String> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(prompt.to_string(), rx);
        tx
    }
}

#[async_trait]
impl CompletionBackend for Gated {
    async fn generate(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, CompletionError> {
        let last = request.last_text().unwrap_or_default();
        let prompt = last.split("\n\n").next().unwrap_or_default().to_string();
        let rx = self
            .gates
            .lock()
            .unwrap()
            .remove(&prompt)
            .expect("no gate registered for prompt");
        let text = rx
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;
        Ok(GenerateContentResponse::from_text(text))
    }
}

/// Treats the PDF bytes after the `%PDF` header as the document text;
/// the body `BROKEN` fails like a corrupt file.
struct BytesAsText;

impl TextExtractor for BytesAsText {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedText, ChatError> {
        let body = String::from_utf8_lossy(&bytes[4..]).into_owned();
        if body == "BROKEN" {
            return Err(ChatError::CorruptPdf {
                detail: "xref table missing".into(),
            });
        }
        Ok(ExtractedText {
            text: body.trim().to_string(),
            page_count: 1,
        })
    }
}

fn pdf(text: &str) -> Vec<u8> {
    format!("%PDF{text}").into_bytes()
}

fn session_with(backend: Arc<dyn CompletionBackend>) -> ChatSession {
    ChatSession::with_backends(&ChatConfig::default(), backend, Arc::new(BytesAsText))
}

fn texts(messages: &[Message]) -> Vec<(Origin, String)> {
    messages.iter().map(|m| (m.origin, m.text.clone())).collect()
}

// ── Send semantics ───────────────────────────────────────────────────────────

#[tokio::test]
async fn empty_input_appends_nothing_and_sends_nothing() {
    let backend = Scripted::new(Ok(GenerateContentResponse::from_text("x")));
    let session = session_with(backend.clone());

    for input in ["", " ", "\n\t  \r\n"] {
        assert!(session.send(input).await.is_none());
    }
    assert!(session.messages().is_empty());
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn each_send_appends_exactly_one_pair() {
    let session = session_with(Arc::new(Echo));
    for (i, input) in ["a", "b", "c"].iter().enumerate() {
        session.send(input).await.unwrap();
        assert_eq!(session.messages().len(), 2 * (i + 1));
    }
    let origins: Vec<Origin> = session.messages().iter().map(|m| m.origin).collect();
    assert_eq!(
        origins,
        [
            Origin::User,
            Origin::Assistant,
            Origin::User,
            Origin::Assistant,
            Origin::User,
            Origin::Assistant
        ]
    );
}

#[tokio::test]
async fn ids_strictly_increase() {
    let session = session_with(Arc::new(Echo));
    for i in 0..20 {
        session.send(&format!("msg {i}")).await;
    }
    let messages = session.messages();
    assert_eq!(messages.len(), 40);
    assert!(messages.windows(2).all(|w| w[0].id < w[1].id));
}

#[tokio::test]
async fn hello_without_document_then_failure() {
    let backend = Scripted::new(Err(CompletionError::Transport("connection refused".into())));
    let session = session_with(backend.clone());

    let reply = session.send("Hello").await.unwrap();

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].last_text(), Some("Hello\n\n"));
    assert_eq!(reply.text, "Something went wrong. Please try again.");
    assert_eq!(reply.text, FAILURE_REPLY);
    assert_eq!(reply.origin, Origin::Assistant);
    assert!(!session.is_typing());
}

#[tokio::test]
async fn missing_candidates_gives_sorry_message() {
    let backend = Scripted::new(Ok(GenerateContentResponse::default()));
    let session = session_with(backend);

    let reply = session.send("anything").await.unwrap();
    assert_eq!(reply.text, "Sorry, I couldn't generate a response.");
    assert_eq!(reply.text, NO_CANDIDATE_REPLY);
}

#[tokio::test]
async fn echoed_text_is_rendered_verbatim() {
    struct EchoFirstTurn;

    #[async_trait]
    impl CompletionBackend for EchoFirstTurn {
        async fn generate(
            &self,
            request: &GenerateContentRequest,
        ) -> Result<GenerateContentResponse, CompletionError> {
            Ok(GenerateContentResponse::from_text(
                request.contents[0].parts[0].text.clone(),
            ))
        }
    }

    let session = session_with(Arc::new(EchoFirstTurn));
    let input = "Ünïcödé *markdown* `code`\n  second line";
    let reply = session.send(input).await.unwrap();
    assert_eq!(reply.text, input);
}

#[tokio::test]
async fn history_is_replayed_with_roles() {
    let backend = Scripted::new(Ok(GenerateContentResponse::from_text("ok")));
    let session = session_with(backend.clone());

    session.send("first").await;
    session.send("second").await;

    let requests = backend.requests();
    let value = serde_json::to_value(&requests[1]).unwrap();
    assert_eq!(
        value,
        serde_json::json!({
            "contents": [
                { "role": "user",  "parts": [{ "text": "first" }] },
                { "role": "model", "parts": [{ "text": "ok" }] },
                { "role": "user",  "parts": [{ "text": "second" }] },
                { "role": "user",  "parts": [{ "text": "second\n\n" }] }
            ]
        })
    );
}

// ── Documents ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn document_text_is_sent_but_not_displayed() {
    let backend = Scripted::new(Ok(GenerateContentResponse::from_text("ok")));
    let session = session_with(backend.clone());

    session.attach_bytes("spec.pdf", pdf("SECRET CONTEXT")).await.unwrap();
    session.send("question").await;

    assert_eq!(backend.requests()[0].last_text(), Some("question\n\nSECRET CONTEXT"));
    assert!(session
        .messages()
        .iter()
        .all(|m| !m.text.contains("SECRET CONTEXT")));
}

#[tokio::test]
async fn new_upload_replaces_old_text() {
    let backend = Scripted::new(Ok(GenerateContentResponse::from_text("ok")));
    let session = session_with(backend.clone());

    session.attach_bytes("old.pdf", pdf("OLD")).await.unwrap();
    session.send("one").await;
    session.attach_bytes("new.pdf", pdf("NEW")).await.unwrap();
    session.send("two").await;

    let requests = backend.requests();
    assert_eq!(requests[0].last_text(), Some("one\n\nOLD"));
    assert_eq!(requests[1].last_text(), Some("two\n\nNEW"));
    assert_eq!(
        session.document(),
        Some(ExtractedDocument::new("new.pdf", "NEW", 1))
    );
}

#[tokio::test]
async fn failed_extraction_keeps_previous_document() {
    let session = session_with(Arc::new(Echo));
    session.attach_bytes("good.pdf", pdf("GOOD")).await.unwrap();

    let err = session.attach_bytes("bad.pdf", pdf("BROKEN")).await.unwrap_err();
    assert!(matches!(err, ChatError::CorruptPdf { .. }));

    assert_eq!(session.document().unwrap().text, "GOOD");
    let reply = session.send("q").await.unwrap();
    assert_eq!(reply.text, "q\n\nGOOD");
}

#[tokio::test]
async fn attach_document_reads_local_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("local.pdf");
    std::fs::write(&path, pdf("FROM DISK")).unwrap();

    let session = session_with(Arc::new(Echo));
    let doc = session.attach_document(path.to_str().unwrap()).await.unwrap();
    assert_eq!(doc.source, "local.pdf");

    let reply = session.send("q").await.unwrap();
    assert_eq!(reply.text, "q\n\nFROM DISK");
}

// ── Overlapping sends ────────────────────────────────────────────────────────

#[tokio::test]
async fn overlapping_replies_append_in_completion_order() {
    let backend = Arc::new(Gated::default());
    let release_a = backend.gate("A");
    let release_b = backend.gate("B");
    let session = session_with(backend);

    let driver = async {
        // Both user messages are visible before either reply.
        while session.messages().len() < 2 {
            tokio::task::yield_now().await;
        }
        assert_eq!(
            texts(&session.messages()),
            [(Origin::User, "A".to_string()), (Origin::User, "B".to_string())]
        );
        assert_eq!(session.in_flight(), 2);
        assert!(session.is_typing());

        release_b.send("reply B".into()).unwrap();
        while session.messages().len() < 3 {
            tokio::task::yield_now().await;
        }
        // One still in flight: the indicator stays up.
        assert!(session.is_typing());
        release_a.send("reply A".into()).unwrap();
    };

    let (a, b, ()) = tokio::join!(session.send("A"), session.send("B"), driver);

    assert_eq!(a.unwrap().text, "reply A");
    assert_eq!(b.unwrap().text, "reply B");
    assert_eq!(
        texts(&session.messages()),
        [
            (Origin::User, "A".to_string()),
            (Origin::User, "B".to_string()),
            (Origin::Assistant, "reply B".to_string()),
            (Origin::Assistant, "reply A".to_string()),
        ]
    );
    assert!(!session.is_typing());
}

// ── Observer ─────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl SessionObserver for Recorder {
    fn on_typing_changed(&self, typing: bool) {
        self.events.lock().unwrap().push(format!("typing:{typing}"));
    }

    fn on_message(&self, message: &Message) {
        self.events
            .lock()
            .unwrap()
            .push(format!("{:?}:{}", message.origin, message.text));
    }

    fn on_document_attached(&self, document: &ExtractedDocument) {
        self.events
            .lock()
            .unwrap()
            .push(format!("doc:{}", document.source));
    }
}

#[tokio::test]
async fn observer_sees_events_in_order() {
    let recorder = Arc::new(Recorder::default());
    let config = ChatConfig::builder()
        .observer(recorder.clone())
        .build()
        .unwrap();
    let session = ChatSession::with_backends(
        &config,
        Scripted::new(Ok(GenerateContentResponse::from_text("hi!"))),
        Arc::new(BytesAsText),
    );

    session.attach_bytes("a.pdf", pdf("A")).await.unwrap();
    session.send("hi").await;
    session.send("   ").await;

    assert_eq!(
        *recorder.events.lock().unwrap(),
        [
            "doc:a.pdf",
            "User:hi",
            "typing:true",
            "Assistant:hi!",
            "typing:false"
        ]
    );
}
