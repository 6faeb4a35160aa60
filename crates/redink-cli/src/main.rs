use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use redink_ai::config::{
    ENV_API_KEY, ENV_BASE_URL, ENV_MAX_ATTEMPTS, ENV_MODEL, ENV_TIMEOUT_SECS,
};
use redink_ai::{ChatClient, ConfigError, OracleConfig, Pipeline};
use redink_core::lexicon::BUILTIN_VERSION;
use redink_core::{Finding, Lexicon, merge, renumber};
use tracing_subscriber::EnvFilter;

mod display;

#[derive(Parser)]
#[command(name = "redink", version, about = "Red-ink risk review for user agreements")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a document and write the annotated result
    Analyze {
        /// Document to analyze (reads stdin when omitted or `-`)
        input: Option<PathBuf>,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Page)]
        format: Format,
        /// Write output here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        lexicon: LexiconArgs,
        #[command(flatten)]
        oracle: OracleArgs,
    },
    /// Merge findings from a JSON file into a document without calling the oracle
    Mark {
        /// Document to annotate (reads stdin when omitted or `-`)
        input: Option<PathBuf>,
        /// JSON array of findings
        #[arg(long)]
        findings: PathBuf,
        /// Write markup here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        lexicon: LexiconArgs,
    },
    /// Print the active keyword lexicon
    Lexicon {
        #[command(flatten)]
        lexicon: LexiconArgs,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// Standalone HTML page with the verdict card
    Page,
    /// Annotated markup only
    Fragment,
    /// Full analysis record as JSON
    Json,
}

#[derive(Args)]
struct LexiconArgs {
    /// Keyword lexicon file, one phrase per line (defaults to the built-in list)
    #[arg(long, value_name = "FILE")]
    lexicon: Option<PathBuf>,
}

impl LexiconArgs {
    fn load(&self) -> anyhow::Result<Lexicon> {
        match &self.lexicon {
            Some(path) => Ok(Lexicon::from_path(path)?),
            None => Ok(Lexicon::default()),
        }
    }
}

/// Oracle settings. Each flag falls back to its environment variable;
/// validation and defaults live in [`OracleConfig::from_lookup`].
#[derive(Args)]
struct OracleArgs {
    /// API key for the chat-completions endpoint
    #[arg(long, env = "REDINK_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    /// Base URL of the OpenAI-compatible endpoint [default: https://api.deepseek.com]
    #[arg(long, env = "REDINK_API_BASE")]
    api_base: Option<String>,
    /// Model name [default: deepseek-chat]
    #[arg(long, env = "REDINK_MODEL")]
    model: Option<String>,
    /// Per-request timeout in seconds [default: 60]
    #[arg(long, env = "REDINK_TIMEOUT_SECS")]
    timeout_secs: Option<String>,
    /// Attempts per oracle call before giving up [default: 3]
    #[arg(long, env = "REDINK_MAX_ATTEMPTS")]
    max_attempts: Option<String>,
}

impl OracleArgs {
    fn setting(&self, key: &str) -> Option<String> {
        let value = match key {
            ENV_API_KEY => &self.api_key,
            ENV_BASE_URL => &self.api_base,
            ENV_MODEL => &self.model,
            ENV_TIMEOUT_SECS => &self.timeout_secs,
            ENV_MAX_ATTEMPTS => &self.max_attempts,
            _ => return None,
        };
        value.clone()
    }

    fn config(&self) -> Result<OracleConfig, ConfigError> {
        OracleConfig::from_lookup(|key| self.setting(key))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Analyze {
            input,
            format,
            output,
            lexicon,
            oracle,
        } => {
            let text = read_document(input.as_deref())?;
            let lexicon = lexicon.load()?;
            let client = ChatClient::new(&oracle.config()?).context("building oracle client")?;
            let pipeline = Pipeline::new(Arc::new(client), lexicon);

            tracing::info!("redink v{}", env!("CARGO_PKG_VERSION"));
            let state = pipeline.analyze(&text).await.context("analysis failed")?;

            let rendered = match format {
                Format::Page => display::render_page(&state),
                Format::Fragment => state.annotated_html.clone(),
                Format::Json => serde_json::to_string_pretty(&state)?,
            };
            write_output(output.as_deref(), &rendered)?;
            eprint!("{}", display::verdict_text(&state.verdict));
        }
        Command::Mark {
            input,
            findings,
            output,
            lexicon,
        } => {
            let text = read_input(input.as_deref())?;
            let lexicon = lexicon.load()?;
            let raw = std::fs::read_to_string(&findings)
                .with_context(|| format!("reading {}", findings.display()))?;
            let findings = parse_findings(&raw)?;

            let merged = merge(&text, &findings, &lexicon);
            tracing::info!(
                findings = findings.len(),
                placed = merged.placed(),
                "merged findings"
            );
            write_output(output.as_deref(), &merged.html)?;
        }
        Command::Lexicon { lexicon } => {
            let custom = lexicon.lexicon.is_some();
            let lexicon = lexicon.load()?;
            let mut stdout = std::io::stdout().lock();
            if !custom {
                writeln!(stdout, "# built-in lexicon v{BUILTIN_VERSION}")?;
            }
            for phrase in lexicon.phrases() {
                writeln!(stdout, "{phrase}")?;
            }
        }
    }
    Ok(())
}

/// Read the whole document from `path`, or from stdin for `None` and `-`.
fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display())),
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("reading stdin")?;
            Ok(text)
        }
    }
}

/// [`read_input`], rejecting documents with nothing but whitespace.
fn read_document(path: Option<&Path>) -> anyhow::Result<String> {
    let text = read_input(path)?;
    if text.trim().is_empty() {
        bail!("input document is empty");
    }
    Ok(text)
}

/// Findings as the identifier emits them: category labels or slugs, `id`
/// optional. Ids are reassigned densely in file order.
fn parse_findings(raw: &str) -> anyhow::Result<Vec<Finding>> {
    let mut findings: Vec<Finding> = serde_json::from_str(raw).context("parsing findings JSON")?;
    renumber(&mut findings);
    Ok(findings)
}

fn write_output(path: Option<&Path>, content: &str) -> anyhow::Result<()> {
    match path {
        Some(path) => std::fs::write(path, content)
            .with_context(|| format!("writing {}", path.display())),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            if !content.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
            Ok(())
        }
    }
}
