//! CLI binary for pdf2vars.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractorConfig` and prints results as JSON.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use futures::stream::{self, StreamExt, TryStreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use pdf2vars::variable::normalize_field_name;
use pdf2vars::{
    extract_file, refine, variable_list_schema, AnalysisResult, ExtractorConfig,
    RefinementRequest, Variable,
};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract variables from a PDF (JSON on stdout)
  pdf2vars extract invoice.pdf

  # Several PDFs, two at a time, into one JSON array
  pdf2vars extract --concurrency 2 a.pdf b.pdf -o results.json

  # Refine a previous result, adding a field the first pass missed
  pdf2vars refine --variables invoice.json --add "Discount" -o refined.json

  # Drop a row before refining
  pdf2vars refine --variables invoice.json --remove "Page Number"

  # Refine a bare variable array against a text file
  pdf2vars refine --text invoice.txt --variables vars.json

  # Print the JSON Schema the model is constrained to
  pdf2vars schema

ENVIRONMENT VARIABLES:
  OLLAMA_HOST             Ollama address (default http://127.0.0.1:11434)
  PDF2VARS_MODEL          Model name (default llama3)
  PDFIUM_LIB_PATH         Path to an existing libpdfium
  RUST_LOG                Log filter, overrides -v / -q

SETUP:
  1. Start Ollama:    ollama serve
  2. Pull the model:  ollama pull llama3
  3. Extract:         pdf2vars extract document.pdf
"#;

/// Extract and refine structured variables from PDFs with a local Ollama model.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2vars",
    version,
    about = "Extract and refine structured variables from PDFs with a local Ollama model",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Ollama address, e.g. http://localhost:11434.
    #[arg(long, env = "OLLAMA_HOST", global = true)]
    host: Option<String>,

    /// Model name.
    #[arg(long, env = "PDF2VARS_MODEL", default_value = "llama3", global = true)]
    model: String,

    /// Characters of document text shown to the model on extraction.
    #[arg(long, env = "PDF2VARS_CONTEXT_CHARS", default_value_t = 10_000, global = true)]
    context_chars: usize,

    /// Per-model-call timeout in seconds (default: no timeout).
    #[arg(long, env = "PDF2VARS_API_TIMEOUT", global = true)]
    api_timeout: Option<u64>,

    /// Disable the progress spinner.
    #[arg(long, env = "PDF2VARS_NO_PROGRESS", global = true)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2VARS_VERBOSE", global = true)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2VARS_QUIET", global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract variables from one or more PDF files.
    Extract(ExtractArgs),
    /// Complete or correct an edited variable list against the document text.
    Refine(RefineArgs),
    /// Print the JSON Schema used to constrain the model.
    Schema,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// PDF files to analyse.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Write JSON to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of files processed at once.
    #[arg(short, long, env = "PDF2VARS_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,
}

#[derive(Args, Debug)]
struct RefineArgs {
    /// JSON file: a previous result, a refinement request, or a bare variable array.
    #[arg(long, visible_alias = "request")]
    variables: PathBuf,

    /// Plain-text document; overrides any text stored in the variables file.
    #[arg(long)]
    text: Option<PathBuf>,

    /// Append a placeholder row with this field name (repeatable).
    #[arg(long = "add", value_name = "FIELD_NAME")]
    add: Vec<String>,

    /// Remove rows whose field name matches, ignoring case (repeatable).
    #[arg(long = "remove", value_name = "FIELD_NAME")]
    remove: Vec<String>,

    /// Write JSON to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// Shapes accepted by `refine --variables`.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum VariablesFile {
    Request(RefinementRequest),
    Result(AnalysisResult),
    List(Vec<Variable>),
}

impl VariablesFile {
    fn into_parts(self) -> (Option<String>, Vec<Variable>) {
        match self {
            VariablesFile::Request(r) => (Some(r.document_text), r.current_variables),
            VariablesFile::Result(r) => (Some(r.document_text), r.variables),
            VariablesFile::List(v) => (None, v),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Library INFO logs would interleave with the spinner; keep them off
    // unless asked for.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Schema => {
            let json = serde_json::to_string_pretty(variable_list_schema())
                .context("Failed to serialise schema")?;
            println!("{json}");
            Ok(())
        }
        Command::Extract(ref args) => {
            let config = build_config(&cli)?;
            run_extract(args, &config, show_progress, cli.quiet).await
        }
        Command::Refine(ref args) => {
            let config = build_config(&cli)?;
            run_refine(args, &config, show_progress, cli.quiet).await
        }
    }
}

/// Map CLI args to `ExtractorConfig`.
fn build_config(cli: &Cli) -> Result<ExtractorConfig> {
    let mut builder = ExtractorConfig::builder()
        .model(cli.model.clone())
        .context_chars(cli.context_chars);

    if let Some(ref host) = cli.host {
        builder = builder.host(host.clone());
    }
    if let Some(secs) = cli.api_timeout {
        builder = builder.api_timeout_secs(secs);
    }

    builder.build().context("Invalid configuration")
}

async fn run_extract(
    args: &ExtractArgs,
    config: &ExtractorConfig,
    show_progress: bool,
    quiet: bool,
) -> Result<()> {
    let start = Instant::now();
    let spinner = spinner(show_progress, &format!("Extracting {} file(s)…", args.files.len()));

    let results: Vec<AnalysisResult> = stream::iter(args.files.iter().map(|path| async move {
        extract_file(path, config)
            .await
            .with_context(|| format!("Extraction failed for {}", path.display()))
    }))
    .buffered(args.concurrency.max(1))
    .try_collect()
    .await
    .inspect_err(|_| spinner.finish_and_clear())?;

    spinner.finish_and_clear();

    let count: usize = results.iter().map(|r| r.variables.len()).sum();
    if results.len() == 1 {
        write_json(&results[0], args.output.as_deref()).await?;
    } else {
        write_json(&results, args.output.as_deref()).await?;
    }

    if !quiet {
        eprintln!(
            "{} {} variables from {} file(s)  {}",
            green("✔"),
            bold(&count.to_string()),
            results.len(),
            dim(&format!("{}ms", start.elapsed().as_millis())),
        );
    }
    Ok(())
}

async fn run_refine(
    args: &RefineArgs,
    config: &ExtractorConfig,
    show_progress: bool,
    quiet: bool,
) -> Result<()> {
    let start = Instant::now();
    let raw = tokio::fs::read_to_string(&args.variables)
        .await
        .with_context(|| format!("Failed to read {}", args.variables.display()))?;
    let (stored_text, variables) = parse_variables_file(&raw)
        .with_context(|| format!("Unrecognised variables file {}", args.variables.display()))?;

    let document_text = match args.text {
        Some(ref path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read document text from {}", path.display()))?,
        None => match stored_text {
            Some(t) => t,
            None => bail!("A bare variable array needs --text <FILE> with the document text"),
        },
    };

    let variables = edit_variables(variables, &args.add, &args.remove);
    let request = RefinementRequest::new(document_text, variables);

    let spinner = spinner(
        show_progress,
        &format!("Refining {} variables…", request.current_variables.len()),
    );
    let result = refine(&request, config).await;
    spinner.finish_and_clear();
    let result = result.context("Refinement failed")?;

    write_json(&result, args.output.as_deref()).await?;

    if !quiet {
        eprintln!(
            "{} {} variables refined  {}",
            green("✔"),
            bold(&result.variables.len().to_string()),
            dim(&format!("{}ms", start.elapsed().as_millis())),
        );
    }
    Ok(())
}

fn parse_variables_file(raw: &str) -> Result<(Option<String>, Vec<Variable>)> {
    let file: VariablesFile = serde_json::from_str(raw)?;
    Ok(file.into_parts())
}

/// Apply `--remove` then `--add` to the caller's list, keeping order.
fn edit_variables(mut variables: Vec<Variable>, add: &[String], remove: &[String]) -> Vec<Variable> {
    let removed: Vec<String> = remove.iter().filter_map(|n| normalize_field_name(n)).collect();
    if !removed.is_empty() {
        variables.retain(|v| v.identity_key().is_none_or(|k| !removed.contains(&k)));
    }
    variables.extend(add.iter().map(Variable::placeholder));
    variables
}

fn spinner(enabled: bool, message: &str) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}  ⏱ {elapsed_precise}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

/// Pretty-print `value` to `path` (temp file + rename) or stdout.
async fn write_json<T: Serialize + ?Sized>(value: &T, path: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialise output")?;

    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            let tmp_path = path.with_extension("json.tmp");
            tokio::fs::write(&tmp_path, json.as_bytes())
                .await
                .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
            tokio::fs::rename(&tmp_path, path)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(json.as_bytes())
                .and_then(|_| handle.write_all(b"\n"))
                .context("Failed to write to stdout")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variables_file_accepts_all_shapes() {
        let list = r#"[{"field_name":"A","value":"1","type":"string","description":"d"}]"#;
        let (text, vars) = parse_variables_file(list).unwrap();
        assert!(text.is_none());
        assert_eq!(vars.len(), 1);

        let request = r#"{"document_text":"doc","current_variables":[]}"#;
        let (text, vars) = parse_variables_file(request).unwrap();
        assert_eq!(text.as_deref(), Some("doc"));
        assert!(vars.is_empty());

        let result = r#"{"variables":[],"filename":"a.pdf","content_type":"application/pdf",
                         "size_bytes":10,"document_text":"doc"}"#;
        let (text, _) = parse_variables_file(result).unwrap();
        assert_eq!(text.as_deref(), Some("doc"));

        assert!(parse_variables_file(r#"{"foo":1}"#).is_err());
    }

    #[test]
    fn edit_removes_then_adds() {
        let vars = vec![
            Variable::new("Invoice Date", "2023-10-25", "date", "d"),
            Variable::new("Page Number", "1", "string", "d"),
        ];
        let out = edit_variables(vars, &["Discount".into()], &[" page number ".into()]);
        let names: Vec<_> = out.iter().map(|v| v.field_name.as_str()).collect();
        assert_eq!(names, ["Invoice Date", "Discount"]);
        assert_eq!(out[1], Variable::placeholder("Discount"));
    }

    #[test]
    fn cli_parses_refine() {
        let cli = Cli::try_parse_from([
            "pdf2vars", "refine", "--request", "r.json", "--add", "A", "--add", "B", "--model", "mistral",
        ])
        .unwrap();
        assert_eq!(cli.model, "mistral");
        match cli.command {
            Command::Refine(args) => {
                assert_eq!(args.variables, PathBuf::from("r.json"));
                assert_eq!(args.add, ["A", "B"]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
