use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use pdf_chat_core::{
    format_answer, AnswerStream, ChatResponder, ChunkingOptions, ConversationSession, FormatPolicy,
    GeminiChatModel, GeminiEmbedder, PdfIngestor, LopdfExtractor, QueryError, UploadedDocument,
    VectorIndex, DEFAULT_CHAT_MODEL, DEFAULT_EMBEDDING_MODEL, DEFAULT_MEMORY_TURNS, DEFAULT_TOP_K,
};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pdf-chat", version, about = "Chat with an uploaded PDF through the Gemini API")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Chat model used for answers
    #[arg(long, env = "PDF_CHAT_MODEL", default_value = DEFAULT_CHAT_MODEL)]
    model: String,

    /// Embedding model used for the index
    #[arg(long, env = "PDF_CHAT_EMBEDDING_MODEL", default_value = DEFAULT_EMBEDDING_MODEL)]
    embedding_model: String,

    /// Characters per chunk
    #[arg(long, default_value_t = 500)]
    chunk_size: usize,

    /// Characters shared by consecutive chunks
    #[arg(long, default_value_t = 100)]
    chunk_overlap: usize,

    /// Retrieved chunks per question
    #[arg(long, default_value_t = DEFAULT_TOP_K)]
    top_k: usize,

    /// Conversation turns kept as model context
    #[arg(long, default_value_t = DEFAULT_MEMORY_TURNS)]
    memory_turns: usize,

    /// Answer formatting and reveal policy
    #[arg(long, value_enum, default_value = "structured")]
    policy: PolicyArg,

    /// Streaming delay per tick in milliseconds; 0 prints the answer at once
    #[arg(long)]
    stream_delay_ms: Option<u64>,
}

#[derive(Subcommand)]
enum Command {
    /// Load a PDF and chat with it interactively.
    Chat {
        /// PDF file to chat with
        #[arg(long)]
        pdf: PathBuf,
    },
    /// Load a PDF, ask one question, print the answer.
    Ask {
        /// PDF file to question
        #[arg(long)]
        pdf: PathBuf,

        /// Question to ask
        #[arg(long)]
        question: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    /// One token per line, character-by-character reveal
    SpacedLines,
    /// Bullets and paragraph breaks, word-by-word reveal
    Structured,
}

impl From<PolicyArg> for FormatPolicy {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::SpacedLines => FormatPolicy::SpacedLines,
            PolicyArg::Structured => FormatPolicy::Structured,
        }
    }
}

struct ChatShell {
    ingestor: PdfIngestor<LopdfExtractor>,
    embedder: GeminiEmbedder,
    responder: ChatResponder<GeminiEmbedder, GeminiChatModel>,
    options: ChunkingOptions,
    policy: FormatPolicy,
    delay: Duration,
    session: ConversationSession,
    index: Option<VectorIndex>,
}

impl ChatShell {
    /// Ingest and index one uploaded file. Failures are printed, not fatal:
    /// the shell drops back to the pre-upload state and the user may retry.
    async fn load_document(&mut self, path: &Path) -> bool {
        println!("Loading PDF...");
        let upload = match UploadedDocument::from_path(path) {
            Ok(upload) => upload,
            Err(error) => {
                warn!(path = %path.display(), %error, "upload failed");
                eprintln!("Error loading PDF: {error}");
                self.index = None;
                return false;
            }
        };

        let parsed = match self.ingestor.ingest(&upload) {
            Ok(parsed) => parsed,
            Err(error) => {
                warn!(path = %path.display(), %error, "pdf ingestion failed");
                eprintln!("Error loading PDF: {error}");
                self.index = None;
                return false;
            }
        };

        info!(
            document_id = %parsed.fingerprint.document_id,
            pages = parsed.fingerprint.page_count,
            "pdf parsed"
        );

        println!("Creating embedding...");
        match VectorIndex::build(parsed.fingerprint, &parsed.pages, &self.embedder, self.options)
            .await
        {
            Ok(index) => {
                println!(
                    "Uploaded successfully! {} page(s), {} chunk(s) indexed.",
                    index.document().page_count,
                    index.len()
                );
                self.session.reset();
                self.index = Some(index);
                true
            }
            Err(error) => {
                warn!(%error, "index build failed");
                eprintln!("Error creating embedding: {error}");
                self.index = None;
                false
            }
        }
    }

    /// One question, one answer. Query failures leave the transcript and the
    /// index untouched.
    async fn ask(&mut self, question: &str) {
        println!("Generating response...");
        match self
            .responder
            .answer(question, self.index.as_ref(), self.session.memory())
            .await
        {
            Ok(answer) => {
                self.session.record(question, answer.clone());
                print!("Bot: ");
                if let Err(error) = stream_to_stdout(&answer, self.policy, self.delay) {
                    warn!(%error, "stdout write failed");
                }
            }
            Err(QueryError::IndexNotReady) => {
                println!("Please upload a PDF file to begin.");
            }
            Err(error) => {
                warn!(%error, "query failed");
                eprintln!("Error during query: {error}");
            }
        }
    }

    fn print_history(&self) {
        if self.session.transcript().is_empty() {
            println!("No questions asked yet.");
            return;
        }
        for turn in self.session.transcript() {
            println!("You: {}", turn.question);
            println!("Bot: {}\n", format_answer(&turn.answer, self.policy));
        }
    }
}

fn stream_to_stdout(answer: &str, policy: FormatPolicy, delay: Duration) -> io::Result<()> {
    let mut printed = 0usize;
    let mut stdout = io::stdout().lock();
    for prefix in AnswerStream::new(answer, policy, delay) {
        write!(stdout, "{}", &prefix[printed..])?;
        stdout.flush()?;
        printed = prefix.len();
    }
    writeln!(stdout)?;
    Ok(())
}

async fn run_chat(mut shell: ChatShell, pdf: &Path) -> anyhow::Result<()> {
    if !shell.load_document(pdf).await {
        println!("Please upload a PDF file to begin (:load <path>).");
    }
    println!("Chat with your PDF. Type a question, :load <path>, :history, or :quit.");

    let stdin = io::stdin();
    loop {
        print!("\nEnter your question: ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix(":load") {
            let path = rest.trim();
            if path.is_empty() {
                eprintln!("usage: :load <path>");
            } else {
                shell.load_document(Path::new(path)).await;
            }
            continue;
        }

        match line {
            ":quit" | ":exit" => break,
            ":history" => shell.print_history(),
            _ => shell.ask(line).await,
        }
    }

    Ok(())
}

async fn run_ask(mut shell: ChatShell, pdf: &Path, question: &str) -> anyhow::Result<()> {
    if !shell.load_document(pdf).await {
        anyhow::bail!("could not load {}", pdf.display());
    }

    let answer = shell
        .responder
        .answer(question, shell.index.as_ref(), shell.session.memory())
        .await
        .map_err(|error| anyhow::anyhow!(error.to_string()))?;

    shell.session.record(question, answer.clone());
    stream_to_stdout(&answer, shell.policy, shell.delay)?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    let options = ChunkingOptions {
        chunk_size: cli.chunk_size,
        overlap: cli.chunk_overlap,
    };
    options
        .validate()
        .map_err(|error| anyhow::anyhow!(error.to_string()))?;

    let embedder = GeminiEmbedder::new(cli.api_key.clone(), cli.embedding_model.clone())
        .map_err(|error| anyhow::anyhow!(error.to_string()))?;
    let model = GeminiChatModel::new(cli.api_key.clone(), cli.model.clone())
        .map_err(|error| anyhow::anyhow!(error.to_string()))?;

    let policy = FormatPolicy::from(cli.policy);
    let delay = cli
        .stream_delay_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| policy.default_delay());

    let shell = ChatShell {
        ingestor: PdfIngestor::default(),
        responder: ChatResponder::new(embedder.clone(), model).with_top_k(cli.top_k),
        embedder,
        options,
        policy,
        delay,
        session: ConversationSession::new(cli.memory_turns),
        index: None,
    };

    info!(
        version = app_version,
        model = %cli.model,
        started_at = %Utc::now().to_rfc3339(),
        "pdf-chat boot"
    );

    match cli.command {
        Command::Chat { pdf } => run_chat(shell, &pdf).await,
        Command::Ask { pdf, question } => run_ask(shell, &pdf, &question).await,
    }
}
