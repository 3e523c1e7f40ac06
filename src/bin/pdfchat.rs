//! CLI binary for edgequake-pdf-chat.
//!
//! A thin REPL over the library crate: lines typed on stdin become chat
//! turns, `/upload` attaches a PDF, replies print as they arrive.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdf_chat::{
    load_document, ChatConfig, ChatError, ChatSession, ExtractedDocument, Message, Origin,
    SessionObserver,
};
use futures::stream::{self, FuturesUnordered, Stream, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

fn bubble(message: &Message) -> String {
    match message.origin {
        Origin::User => format!("{} {}", bold(&cyan("you ›")), message.text),
        Origin::Assistant => format!("{} {}", bold(&green("model ›")), message.text),
    }
}

fn uploaded_line(doc: &ExtractedDocument) -> String {
    format!(
        "{} 1 file uploaded: {}  {}",
        cyan("◆"),
        bold(&doc.source),
        dim(&format!("{} pages, {} chars", doc.page_count, doc.char_count())),
    )
}

// ── Typing spinner ───────────────────────────────────────────────────────────

/// Shows a "Typing…" spinner on stderr while any send is in flight.
struct SpinnerObserver {
    bar: Mutex<Option<ProgressBar>>,
}

impl SpinnerObserver {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            bar: Mutex::new(None),
        })
    }

    fn start_spinner(&self) -> ProgressBar {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_message(dim("Typing…"));
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    }

    /// Run `f` with the spinner hidden so terminal output never tears it.
    fn suspend<R>(&self, f: impl FnOnce() -> R) -> R {
        match self.bar.lock().unwrap_or_else(|e| e.into_inner()).as_ref() {
            Some(bar) => bar.suspend(f),
            None => f(),
        }
    }
}

impl SessionObserver for SpinnerObserver {
    fn on_typing_changed(&self, typing: bool) {
        let mut slot = self.bar.lock().unwrap_or_else(|e| e.into_inner());
        if typing {
            *slot = Some(self.start_spinner());
        } else if let Some(bar) = slot.take() {
            bar.finish_and_clear();
        }
    }
}

// ── Console: where the REPL writes ───────────────────────────────────────────

/// Replies go to `out`; status lines and errors go to `err`.
/// Quiet mode drops status lines only.
struct Console<O, E> {
    out: O,
    err: E,
    quiet: bool,
    spinner: Option<Arc<SpinnerObserver>>,
}

impl<O: Write, E: Write> Console<O, E> {
    fn new(out: O, err: E, quiet: bool, spinner: Option<Arc<SpinnerObserver>>) -> Self {
        Self {
            out,
            err,
            quiet,
            spinner,
        }
    }

    fn print(&mut self, line: &str) -> io::Result<()> {
        let out = &mut self.out;
        match &self.spinner {
            Some(s) => s.suspend(|| writeln!(out, "{line}")),
            None => writeln!(out, "{line}"),
        }
    }

    fn error(&mut self, line: &str) -> io::Result<()> {
        let err = &mut self.err;
        match &self.spinner {
            Some(s) => s.suspend(|| writeln!(err, "{line}")),
            None => writeln!(err, "{line}"),
        }
    }

    fn status(&mut self, line: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.error(line)
    }

    fn reply_landed(&mut self, reply: Option<Message>) -> Result<()> {
        if let Some(message) = reply {
            self.print(&bubble(&message))
                .context("Failed to write to stdout")?;
        }
        Ok(())
    }

    fn upload_landed(&mut self, result: Result<ExtractedDocument, ChatError>) -> Result<()> {
        let written = match result {
            Ok(doc) => self.status(&uploaded_line(&doc)),
            Err(e) => self.error(&format!("{} {}", red("✗"), red(&e.to_string()))),
        };
        written.context("Failed to write to stderr")
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Interactive chat
  pdfchat

  # Chat about a document
  pdfchat --document paper.pdf

  # One question, answer on stdout
  pdfchat --document https://arxiv.org/pdf/1706.03762v7.pdf -m "What is the main claim?"

  # Print the text the model will see (no API key needed)
  pdfchat --extract-only --document report.pdf

  # Keep a JSON transcript
  pdfchat --transcript chat.json

REPL COMMANDS:
  /upload <path|url>   Extract a PDF and attach it to every following turn
  /doc                 Show the attached document
  /history             Print the conversation so far
  /help                Show this list
  /quit                Wait for pending replies and exit (also Ctrl-D)
                       Ctrl-C exits at once, dropping pending replies

  Messages can be sent while earlier replies or an upload are still
  pending; results print in the order they arrive.

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY       Google Generative Language API key (required to chat)
  PDFCHAT_MODEL        Override model ID (default gemini-2.0-flash)
  PDFCHAT_BASE_URL     Override endpoint root
  PDFIUM_LIB_PATH      Path to libpdfium for text extraction
  RUST_LOG             Log filter, e.g. edgequake_pdf_chat=debug
"#;

/// Chat with a Gemini model about a PDF document.
#[derive(Parser, Debug)]
#[command(
    name = "pdfchat",
    version,
    about = "Chat with a Gemini model about a PDF document",
    long_about = "Interactive chat with Google's Gemini models. Attach a PDF (local file or URL) \
and its extracted text is sent as context with every message.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// API key for the Generative Language API.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model ID (e.g. gemini-2.0-flash, gemini-2.5-pro).
    #[arg(long, env = "PDFCHAT_MODEL", default_value = edgequake_pdf_chat::config::DEFAULT_MODEL)]
    model: String,

    /// Endpoint root URL.
    #[arg(long, env = "PDFCHAT_BASE_URL", default_value = edgequake_pdf_chat::config::DEFAULT_BASE_URL)]
    base_url: String,

    /// PDF file path or HTTP/HTTPS URL to attach at startup.
    #[arg(short, long)]
    document: Option<String>,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDFCHAT_PASSWORD")]
    password: Option<String>,

    /// Path to the pdfium shared library.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib_path: Option<PathBuf>,

    /// Per-request timeout in seconds (default: none).
    #[arg(long, env = "PDFCHAT_TIMEOUT")]
    timeout: Option<u64>,

    /// HTTP download timeout for URL documents in seconds.
    #[arg(long, env = "PDFCHAT_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Send one message, print the reply to stdout and exit.
    #[arg(short, long)]
    message: Option<String>,

    /// Print the document's extracted text and exit. Needs --document.
    #[arg(long, requires = "document")]
    extract_only: bool,

    /// Write the conversation as JSON to this file on exit.
    #[arg(long, env = "PDFCHAT_TRANSCRIPT")]
    transcript: Option<PathBuf>,

    /// Disable the typing spinner.
    #[arg(long, env = "PDFCHAT_NO_SPINNER")]
    no_spinner: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFCHAT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and replies.
    #[arg(short, long, env = "PDFCHAT_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Library INFO logs would interleave with the chat; keep them off unless
    // asked for.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Extract-only mode ────────────────────────────────────────────────
    if cli.extract_only {
        let config = build_config(&cli, None)?;
        let input = cli.document.as_deref().unwrap_or_default();
        let doc = load_document(input, &config)
            .await
            .context("Failed to extract document text")?;

        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(doc.text.as_bytes())
            .context("Failed to write to stdout")?;
        if !doc.text.ends_with('\n') {
            handle
                .write_all(b"\n")
                .context("Failed to write to stdout")?;
        }
        if !cli.quiet {
            eprintln!("{}", uploaded_line(&doc));
        }
        return Ok(());
    }

    // ── Build session ────────────────────────────────────────────────────
    let one_shot = cli.message.is_some();
    let spinner = (!one_shot && !cli.quiet && !cli.no_spinner).then(SpinnerObserver::new);
    let config = build_config(
        &cli,
        spinner.clone().map(|s| s as Arc<dyn SessionObserver>),
    )?;
    let session = ChatSession::new(&config).context("Failed to start chat session")?;

    if let Some(ref input) = cli.document {
        let doc = session
            .attach_document(input)
            .await
            .context("Failed to attach document")?;
        if !cli.quiet {
            eprintln!("{}", uploaded_line(&doc));
        }
    }

    // ── One-shot mode ────────────────────────────────────────────────────
    if let Some(ref text) = cli.message {
        let reply = session
            .send(text)
            .await
            .context("Message is empty; nothing to send")?;
        println!("{}", reply.text);
        save_transcript(&session, &cli).await?;
        return Ok(());
    }

    // ── REPL ─────────────────────────────────────────────────────────────
    if !cli.quiet {
        eprintln!(
            "{} {}  {}",
            cyan("◆"),
            bold(&format!("Chatting with {}", config.model)),
            dim("/help for commands, Ctrl-D to quit"),
        );
    }
    let mut console = Console::new(io::stdout(), io::stderr(), cli.quiet, spinner);
    let stdin = BufReader::new(tokio::io::stdin());
    repl(&session, stdin, &mut console, ctrl_c_presses()).await?;
    save_transcript(&session, &cli).await?;

    Ok(())
}

/// Every Ctrl-C press, as a stream. Ends if the handler cannot be installed.
fn ctrl_c_presses() -> impl Stream<Item = ()> + Unpin {
    Box::pin(stream::unfold((), |()| async {
        tokio::signal::ctrl_c().await.ok().map(|()| ((), ()))
    }))
}

/// Map CLI args to `ChatConfig`.
fn build_config(
    cli: &Cli,
    observer: Option<Arc<dyn SessionObserver>>,
) -> Result<ChatConfig> {
    let mut builder = ChatConfig::builder()
        .model(cli.model.clone())
        .base_url(cli.base_url.clone())
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key.clone());
    }
    if let Some(secs) = cli.timeout {
        builder = builder.request_timeout_secs(secs);
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(ref path) = cli.pdfium_lib_path {
        builder = builder.pdfium_lib_path(path.clone());
    }
    if let Some(obs) = observer {
        builder = builder.observer(obs);
    }

    builder.build().context("Invalid configuration")
}

async fn save_transcript(session: &ChatSession, cli: &Cli) -> Result<()> {
    if let Some(ref path) = cli.transcript {
        session
            .save_transcript(path)
            .await
            .context("Failed to save transcript")?;
        if !cli.quiet {
            eprintln!("{} transcript → {}", green("✔"), bold(&path.display().to_string()));
        }
    }
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Say(&'a str),
    Upload(&'a str),
    Doc,
    History,
    Help,
    Quit,
    Unknown(&'a str),
}

fn parse_command(line: &str) -> Command<'_> {
    let trimmed = line.trim();
    let Some(rest) = trimmed.strip_prefix('/') else {
        return Command::Say(line);
    };
    let (name, arg) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    match name {
        "upload" | "attach" => Command::Upload(arg.trim()),
        "doc" => Command::Doc,
        "history" => Command::History,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ => Command::Unknown(name),
    }
}

/// Read `input` until EOF or `/quit`, keeping every send and upload in
/// flight at once.
///
/// On EOF or `/quit` pending replies and uploads are awaited; an interrupt
/// during that wait, or any interrupt before it, drops them and returns.
async fn repl<R, O, E, I>(
    session: &ChatSession,
    input: R,
    console: &mut Console<O, E>,
    mut interrupts: I,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    O: Write,
    E: Write,
    I: Stream<Item = ()> + Unpin,
{
    let mut lines = input.lines();
    let mut pending = FuturesUnordered::new();
    let mut uploads = FuturesUnordered::new();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                match parse_command(&line) {
                    Command::Say(text) => {
                        let text = text.to_string();
                        pending.push(async move { session.send(&text).await });
                    }
                    Command::Upload("") => {
                        console.error(&format!("{} usage: /upload <path|url>", red("✗")))?;
                    }
                    Command::Upload(input) => {
                        let input = input.to_string();
                        uploads.push(async move { session.attach_document(&input).await });
                    }
                    Command::Doc => match session.document() {
                        Some(doc) => console.error(&uploaded_line(&doc))?,
                        None => console.error(&dim("No document attached."))?,
                    },
                    Command::History => {
                        for message in session.messages() {
                            console.print(&bubble(&message))?;
                        }
                    }
                    Command::Help => console.error(AFTER_HELP)?,
                    Command::Quit => break,
                    Command::Unknown(name) => {
                        console.error(&format!(
                            "{} unknown command '/{name}' (try /help)",
                            red("✗")
                        ))?;
                    }
                }
            }
            Some(reply) = pending.next(), if !pending.is_empty() => console.reply_landed(reply)?,
            Some(result) = uploads.next(), if !uploads.is_empty() => console.upload_landed(result)?,
            Some(()) = interrupts.next() => return Ok(()),
        }
    }

    // Let replies already on the wire land before exiting.
    let drain = async {
        loop {
            tokio::select! {
                Some(reply) = pending.next(), if !pending.is_empty() => console.reply_landed(reply)?,
                Some(result) = uploads.next(), if !uploads.is_empty() => console.upload_landed(result)?,
                else => break,
            }
        }
        Ok::<(), anyhow::Error>(())
    };
    tokio::select! {
        drained = drain => drained,
        Some(()) = interrupts.next() => Ok(()),
    }
}
