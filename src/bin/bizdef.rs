//! Business Definition Resolver CLI
//!
//! Command-line interface for resolving and checking business definition
//! references in OpenAPI and ODCS documents.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use bizdef_resolver::{
    check, process, render_document, resolve_file, DocumentKind, FileStatus, ResolveOptions,
    Severity,
};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

const DEFAULT_OPENAPI: &str = "order-api.yaml";
const DEFAULT_ODCS: &str = "order-data-contract.yaml";

#[derive(Parser)]
#[command(name = "bizdef")]
#[command(about = "Resolve business definition references in OpenAPI and ODCS documents")]
#[command(version)]
struct Cli {
    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors and suppress progress output
    #[arg(long, short, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the references of one document
    Resolve {
        /// Input document (.yaml, .yml or .json)
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Document kind
        #[arg(long, value_enum, default_value_t = KindArg::Auto)]
        kind: KindArg,

        /// Parse each definition file once per run
        #[arg(long)]
        cache: bool,
    },

    /// Resolve an OpenAPI document and a data contract into an output directory
    Build {
        /// OpenAPI document (default: order-api.yaml when no input is given)
        #[arg(long)]
        openapi: Option<PathBuf>,

        /// ODCS data contract (default: order-data-contract.yaml when no input is given)
        #[arg(long)]
        odcs: Option<PathBuf>,

        /// Directory for resolved documents, created if missing
        #[arg(long, default_value = "gen")]
        out_dir: PathBuf,

        /// Parse each definition file once per run
        #[arg(long)]
        cache: bool,
    },

    /// Check documents for broken business definition references
    Check {
        /// File or directory to check
        path: PathBuf,

        /// Output format: text (default) or json
        #[arg(long, default_value = "text")]
        format: String,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Auto,
    Openapi,
    Odcs,
}

impl KindArg {
    fn kind(self) -> Option<DocumentKind> {
        match self {
            KindArg::Auto => None,
            KindArg::Openapi => Some(DocumentKind::OpenApi),
            KindArg::Odcs => Some(DocumentKind::Odcs),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Resolve {
            input,
            output,
            kind,
            cache,
        } => run_resolve(&input, output.as_deref(), kind.kind(), cache, cli.quiet),

        Commands::Build {
            openapi,
            odcs,
            out_dir,
            cache,
        } => run_build(openapi, odcs, &out_dir, cache, cli.quiet),

        Commands::Check {
            path,
            format,
            strict,
        } => run_check(&path, &format, strict, cli.quiet),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

/// Log to stderr; `RUST_LOG` overrides the verbosity flags.
fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .init();
}

fn run_resolve(
    input: &Path,
    output: Option<&Path>,
    kind: Option<DocumentKind>,
    cache: bool,
    quiet: bool,
) -> Result<(), u8> {
    let options = ResolveOptions::new().cache_definitions(cache);

    match output {
        Some(output) => {
            let report = process(input, output, kind, &options).map_err(|e| {
                eprintln!("Error: {}", e);
                e.exit_code() as u8
            })?;
            if !quiet {
                println!(
                    "Processed {} {} -> {}",
                    report.kind,
                    input.display(),
                    output.display()
                );
            }
        }
        None => {
            let resolved = resolve_file(input, kind, &options).map_err(|e| {
                eprintln!("Error: {}", e);
                e.exit_code() as u8
            })?;
            let rendered = render_document(&resolved.document, resolved.format).map_err(|e| {
                eprintln!("Error: {}", e);
                e.exit_code() as u8
            })?;
            print!("{}", rendered);
        }
    }

    Ok(())
}

fn run_build(
    openapi: Option<PathBuf>,
    odcs: Option<PathBuf>,
    out_dir: &Path,
    cache: bool,
    quiet: bool,
) -> Result<(), u8> {
    let inputs: Vec<(PathBuf, DocumentKind)> = if openapi.is_none() && odcs.is_none() {
        vec![
            (PathBuf::from(DEFAULT_OPENAPI), DocumentKind::OpenApi),
            (PathBuf::from(DEFAULT_ODCS), DocumentKind::Odcs),
        ]
    } else {
        openapi
            .map(|p| (p, DocumentKind::OpenApi))
            .into_iter()
            .chain(odcs.map(|p| (p, DocumentKind::Odcs)))
            .collect()
    };

    std::fs::create_dir_all(out_dir).map_err(|e| {
        eprintln!("Error creating {}: {}", out_dir.display(), e);
        3u8
    })?;

    let options = ResolveOptions::new().cache_definitions(cache);
    for (input, kind) in inputs {
        let output = out_dir.join(resolved_file_name(&input));
        let report = process(&input, &output, Some(kind), &options).map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })?;
        if !quiet {
            println!(
                "Processed {} {} -> {}",
                report.kind,
                input.display(),
                output.display()
            );
        }
    }

    Ok(())
}

/// `order-api.yaml` -> `order-api-resolved.yaml`
fn resolved_file_name(input: &Path) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    match input.extension() {
        Some(ext) => format!("{}-resolved.{}", stem, ext.to_string_lossy()),
        None => format!("{}-resolved", stem),
    }
}

fn run_check(path: &Path, format: &str, strict: bool, quiet: bool) -> Result<(), u8> {
    if !path.exists() {
        eprintln!("Error: path not found: {}", path.display());
        return Err(3);
    }

    let result = check(path, strict);

    if format == "json" {
        let output = serde_json::to_string_pretty(&result).map_err(|e| {
            eprintln!("Error serializing output: {}", e);
            2u8
        })?;
        println!("{}", output);
    } else {
        if !quiet {
            println!("Checking {} ...\n", path.display());
        }

        for file_result in &result.results {
            let status_icon = match file_result.status {
                FileStatus::Ok => "\x1b[32m✓\x1b[0m",
                FileStatus::Warning => "\x1b[33m⚠\x1b[0m",
                FileStatus::Error => "\x1b[31m✗\x1b[0m",
            };

            if !quiet || file_result.status != FileStatus::Ok {
                println!(
                    "  {} {} ({} references)",
                    status_icon,
                    file_result.file.display(),
                    file_result.references
                );
            }

            for diag in &file_result.diagnostics {
                let (color, label) = match diag.severity {
                    Severity::Error => ("\x1b[31m", "error"),
                    Severity::Warning => ("\x1b[33m", "warning"),
                };
                if !quiet || diag.severity == Severity::Error {
                    println!(
                        "    {}{}[{}]\x1b[0m: {} - {}",
                        color, label, diag.code, diag.path, diag.message
                    );
                }
            }
        }

        println!();
        if result.failed == 0 {
            println!(
                "\x1b[32m✓ {} documents checked, all passed\x1b[0m",
                result.files_checked
            );
        } else {
            println!(
                "\x1b[31m✗ {} documents checked: {} passed, {} failed ({} errors, {} warnings)\x1b[0m",
                result.files_checked, result.passed, result.failed, result.errors, result.warnings
            );
        }
    }

    if result.failed == 0 {
        Ok(())
    } else {
        Err(1)
    }
}
