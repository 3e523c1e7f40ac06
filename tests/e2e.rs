//! End-to-end tests against the live Generative Language API.
//!
//! They make real API calls (and, for the PDF test, need libpdfium), so
//! they are gated behind the `E2E_ENABLED` environment variable and do not
//! run in CI unless explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 GEMINI_API_KEY=... cargo test --test e2e -- --nocapture
//!
//! The PDF test also needs a document:
//!   E2E_PDF=/path/to/any.pdf PDFIUM_LIB_PATH=/path/to/libpdfium.so ...

use edgequake_pdf_chat::{load_document, ChatConfig, ChatSession, Origin, FAILURE_REPLY};
use std::path::PathBuf;

/// Skip this test unless E2E_ENABLED and GEMINI_API_KEY are both set.
macro_rules! e2e_skip_unless_ready {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let config = ChatConfig::from_env();
        if config.api_key.is_none() {
            println!("SKIP — GEMINI_API_KEY not set");
            return;
        }
        config
    }};
}

#[tokio::test]
async fn test_live_single_turn() {
    let config = e2e_skip_unless_ready!();
    let session = ChatSession::new(&config).expect("session should build");

    let reply = session
        .send("Reply with exactly the word: pong")
        .await
        .expect("non-empty input must produce a reply");

    assert_eq!(reply.origin, Origin::Assistant);
    assert_ne!(reply.text, FAILURE_REPLY, "request failed");
    assert!(
        reply.text.to_lowercase().contains("pong"),
        "unexpected reply: {:?}",
        reply.text
    );
    println!("reply: {}", reply.text);
}

#[tokio::test]
async fn test_live_two_turn_memory() {
    let config = e2e_skip_unless_ready!();
    let session = ChatSession::new(&config).expect("session should build");

    session.send("My favourite colour is teal. Just say OK.").await;
    let reply = session
        .send("What is my favourite colour? One word.")
        .await
        .unwrap();

    assert!(
        reply.text.to_lowercase().contains("teal"),
        "history was not replayed: {:?}",
        reply.text
    );
    assert_eq!(session.messages().len(), 4);
}

#[tokio::test]
async fn test_live_pdf_context() {
    let config = e2e_skip_unless_ready!();
    let Ok(pdf) = std::env::var("E2E_PDF") else {
        println!("SKIP — set E2E_PDF=/path/to/file.pdf");
        return;
    };
    let path = PathBuf::from(pdf);

    let doc = load_document(path.to_str().unwrap(), &config)
        .await
        .expect("extraction should succeed");
    assert!(doc.page_count > 0);
    println!("{} pages, {} chars", doc.page_count, doc.char_count());

    let session = ChatSession::new(&config).unwrap();
    session.attach_document(path.to_str().unwrap()).await.unwrap();
    let reply = session
        .send("In one sentence, what is this document about?")
        .await
        .unwrap();
    assert_ne!(reply.text, FAILURE_REPLY);
    println!("reply: {}", reply.text);
}
