//! CLI parsing and orchestration. Parses args, builds the renderer command, runs it. Maps errors to exit codes.

use crate::config;
use crate::error::PdfError;
use crate::options::{OptionValue, Options};
use crate::pdfkit::{ConvertOptions, PdfKit};
use crate::renderer::Configuration;
use crate::source::{FileStream, Inputs, Source, SourceKind};
use crate::PdfOutput;
use clap::{ArgAction, Parser};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// CLI error carrying exit code and message.
#[derive(Debug, Error)]
pub enum CliRunError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Pdf(#[from] PdfError),

    #[error("Failed to write output: {0}")]
    Output(#[source] std::io::Error),
}

impl CliRunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliRunError::InvalidInput(_) => 1,
            CliRunError::Pdf(e) => match e {
                PdfError::InputNotFound { .. }
                | PdfError::ImproperSource(_)
                | PdfError::Io { .. } => 1,
                PdfError::Conversion { .. } | PdfError::Process { .. } => 2,
                PdfError::Configuration(_) => 3,
            },
            CliRunError::Output(_) => 2,
        }
    }
}

/// How positional inputs are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Url,
    File,
    String,
    Stdin,
}

#[derive(Parser, Debug)]
#[command(name = "pdfwrap")]
#[command(about = "Convert HTML from URLs, files, strings or stdin to PDF with an external renderer")]
#[command(
    after_help = "Config file keys (renderer, meta_tag_prefix, output_dir, quiet, [options], [env]) are read from ./pdfwrap.toml or the user config dir. CLI flags override config."
)]
pub struct Args {
    /// URLs, HTML files, or an HTML string (with --kind string).
    pub inputs: Vec<String>,

    /// Input kind: url, file, string, or stdin. Default: url when every input starts with http:// or https://, else file.
    #[arg(long, value_parser = parse_kind)]
    pub kind: Option<InputKind>,

    /// Output PDF path. Default: PDF bytes on stdout, or {output_dir}/{input-stem}.pdf when output_dir is configured.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Renderer option as name or name=value, e.g. -O page-size=A4 -O outline. Repeatable.
    #[arg(short = 'O', long = "option", value_parser = parse_option, action = ArgAction::Append)]
    pub options: Vec<(String, Option<String>)>,

    /// Cookie passed to the renderer. Repeatable.
    #[arg(long, num_args = 2, value_names = ["NAME", "VALUE"], action = ArgAction::Append)]
    pub cookie: Vec<String>,

    /// Extra HTTP header for every request the renderer makes. Repeatable.
    #[arg(long, num_args = 2, value_names = ["NAME", "VALUE"], action = ArgAction::Append)]
    pub custom_header: Vec<String>,

    /// Insert a table of contents.
    #[arg(long)]
    pub toc: bool,

    /// Table-of-contents option as name or name=value. Implies --toc. Repeatable.
    #[arg(long, value_parser = parse_option, action = ArgAction::Append)]
    pub toc_option: Vec<(String, Option<String>)>,

    /// URL or file of a cover page.
    #[arg(long)]
    pub cover: Option<String>,

    /// Put the cover before the table of contents.
    #[arg(long)]
    pub cover_first: bool,

    /// Stylesheet injected into the document (single file or string input only). Repeatable.
    #[arg(long, action = ArgAction::Append)]
    pub css: Vec<PathBuf>,

    /// Renderer executable (overrides config; default: wkhtmltopdf on PATH).
    #[arg(long)]
    pub renderer: Option<PathBuf>,

    /// Prefix of directive meta tags (overrides config; default pdfkit-).
    #[arg(long)]
    pub meta_prefix: Option<String>,

    /// Print the renderer command as JSON and exit without running it.
    #[arg(long)]
    pub print_command: bool,

    /// Pass --quiet to the renderer and suppress progress output.
    #[arg(short, long)]
    pub quiet: bool,

    /// Print verbose error chain.
    #[arg(long)]
    pub verbose: bool,
}

fn parse_kind(s: &str) -> Result<InputKind, String> {
    match s.to_lowercase().as_str() {
        "url" => Ok(InputKind::Url),
        "file" | "path" => Ok(InputKind::File),
        "string" | "html" => Ok(InputKind::String),
        "stdin" | "-" => Ok(InputKind::Stdin),
        _ => Err(format!(
            "Invalid --kind value: '{}'. Use url, file, string, or stdin.",
            s
        )),
    }
}

/// `name` or `name=value`. Only the first `=` splits, so values may contain `=`.
fn parse_option(s: &str) -> Result<(String, Option<String>), String> {
    let (name, value) = match s.split_once('=') {
        Some((name, value)) => (name.trim(), Some(value.to_string())),
        None => (s.trim(), None),
    };
    if name.is_empty() || name == "--" {
        return Err(format!("Invalid option '{}': missing name", s));
    }
    Ok((name.to_string(), value))
}

fn detect_kind(inputs: &[String]) -> InputKind {
    let is_url = |s: &String| s.starts_with("http://") || s.starts_with("https://");
    if !inputs.is_empty() && inputs.iter().all(is_url) {
        InputKind::Url
    } else {
        InputKind::File
    }
}

/// Pair up flat NAME VALUE lists produced by two-valued flags.
fn collect_pairs(flat: &[String]) -> Vec<(String, String)> {
    flat.chunks_exact(2)
        .map(|c| (c[0].clone(), c[1].clone()))
        .collect()
}

fn to_options(pairs: &[(String, Option<String>)]) -> Options {
    pairs
        .iter()
        .map(|(k, v)| (k.clone(), OptionValue::from(v.clone())))
        .collect()
}

/// Sanitize an input name to a safe file stem: lowercase, replace spaces/special with `-`.
fn sanitize_stem(input: &str) -> String {
    let stem = Path::new(input)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut s = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect::<String>();
    // Collapse multiple dashes and trim
    while s.contains("--") {
        s = s.replace("--", "-");
    }
    s = s.trim_matches('-').to_string();
    if s.is_empty() {
        s = "document".to_string();
    }
    s
}

/// Ensure output path parent exists.
fn validate_output_path(path: &Path) -> Result<(), CliRunError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(CliRunError::InvalidInput(format!(
                "Cannot write output: {}: parent directory does not exist.",
                path.display()
            )));
        }
    }
    Ok(())
}

fn build_source(args: &Args) -> Result<Source, CliRunError> {
    let kind = args.kind.unwrap_or_else(|| detect_kind(&args.inputs));
    if kind == InputKind::Stdin {
        if !args.inputs.is_empty() {
            return Err(CliRunError::InvalidInput(
                "No positional inputs are accepted with --kind stdin.".to_string(),
            ));
        }
        return Ok(Source::stream(
            FileStream::new(std::io::stdin()).with_name("<stdin>"),
        ));
    }
    let inputs = match args.inputs.as_slice() {
        [] => {
            return Err(CliRunError::InvalidInput(
                "Expected at least one input (URL, file, or string). Use --kind stdin to read HTML from standard input.".to_string(),
            ))
        }
        [one] => Inputs::One(one.clone()),
        many => Inputs::Many(many.to_vec()),
    };
    let kind = match kind {
        InputKind::Url => SourceKind::Url,
        InputKind::File => SourceKind::File,
        InputKind::String | InputKind::Stdin => SourceKind::String,
    };
    Ok(Source::from_kind(kind, inputs)?)
}

/// Entry point for the CLI. Returns Ok(()) on success; Err with exit code and message on failure.
pub fn run(args: &Args) -> Result<(), CliRunError> {
    let config = config::load_config().map_err(CliRunError::InvalidInput)?;

    let source = build_source(args)?;

    let quiet = args.quiet || config.as_ref().and_then(|c| c.quiet).unwrap_or(false);

    let mut builder = Configuration::builder();
    if let Some(renderer) = args
        .renderer
        .clone()
        .or_else(|| config.as_ref().and_then(|c| c.renderer.clone()))
    {
        builder = builder.renderer(renderer);
    }
    if let Some(prefix) = args
        .meta_prefix
        .clone()
        .or_else(|| config.as_ref().and_then(|c| c.meta_tag_prefix.clone()))
    {
        builder = builder.meta_tag_prefix(prefix);
    }
    if let Some(env) = config.as_ref().and_then(|c| c.env.as_ref()) {
        for (k, v) in env {
            builder = builder.env(k.clone(), v.clone());
        }
    }
    let configuration = builder.build()?;

    let mut cli_options = to_options(&args.options);
    if quiet {
        cli_options.insert("quiet", OptionValue::Flag);
    }
    if !args.cookie.is_empty() {
        cli_options.insert("cookie", OptionValue::Repeated(collect_pairs(&args.cookie)));
    }
    if !args.custom_header.is_empty() {
        cli_options.insert(
            "custom-header",
            OptionValue::Repeated(collect_pairs(&args.custom_header)),
        );
    }
    let options = match config.as_ref().and_then(|c| c.options.as_ref()) {
        Some(defaults) => Options::merge(defaults, &cli_options),
        None => cli_options,
    };

    let settings = ConvertOptions {
        options,
        toc: (args.toc || !args.toc_option.is_empty()).then(|| to_options(&args.toc_option)),
        cover: args.cover.clone(),
        cover_first: args.cover_first,
        css: args.css.clone(),
    };

    let output_path: Option<PathBuf> = match &args.output {
        Some(p) => Some(p.clone()),
        None => config
            .as_ref()
            .and_then(|c| c.output_dir.clone())
            .map(|dir| {
                let first = args.inputs.first().map(String::as_str).unwrap_or_default();
                let base = if source.is_inline_string() || source.is_file_stream() {
                    "document".to_string()
                } else {
                    sanitize_stem(first)
                };
                dir.join(format!("{}.pdf", base))
            }),
    };

    let mut kit = PdfKit::new(source, configuration, &settings);

    if args.print_command {
        let command = kit.command(output_path.as_deref())?;
        let json = serde_json::to_string(&command)
            .map_err(|e| CliRunError::InvalidInput(format!("Failed to encode command: {}", e)))?;
        println!("{}", json);
        return Ok(());
    }

    if let Some(ref path) = output_path {
        validate_output_path(path)?;
    }

    let spinner = if quiet || output_path.is_none() {
        None
    } else {
        let pb = indicatif::ProgressBar::new_spinner();
        if let Ok(style) =
            indicatif::ProgressStyle::default_spinner().template("{spinner} {msg} ({elapsed})")
        {
            pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "));
        }
        pb.set_message("Rendering PDF");
        pb.enable_steady_tick(Duration::from_millis(80));
        Some(pb)
    };
    let result = kit.to_pdf(output_path.as_deref());
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    match result? {
        PdfOutput::Bytes(bytes) => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(&bytes)
                .and_then(|_| stdout.flush())
                .map_err(CliRunError::Output)?;
        }
        PdfOutput::Written(path) => {
            if !quiet {
                eprintln!("Wrote {}", path.display());
            }
        }
    }
    Ok(())
}
