//! draftschema CLI
//!
//! Command-line interface for compiling schemas and validating instance
//! documents against them.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use draftschema::{load_json, load_json_auto, CompileOptions, Draft};

#[derive(Parser)]
#[command(name = "draftschema")]
#[command(about = "Compile JSON Schemas and validate documents against them")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a schema and report whether it is usable
    Check {
        /// Schema source: file path or URL (http:// or https://)
        schema: String,

        /// Force a draft dialect instead of detecting it from $schema
        #[arg(long, value_parser = parse_draft)]
        draft: Option<Draft>,

        /// Base URI for resolving relative references
        #[arg(long)]
        base_uri: Option<String>,

        /// Output result as JSON (for automation)
        #[arg(long)]
        json: bool,

        /// Suppress output, only set the exit code
        #[arg(long, short)]
        quiet: bool,
    },

    /// Validate instance documents against a schema
    Validate {
        /// Schema source: file path or URL (http:// or https://)
        schema: String,

        /// Instance files to validate
        #[arg(required = true)]
        instances: Vec<PathBuf>,

        /// Force a draft dialect instead of detecting it from $schema
        #[arg(long, value_parser = parse_draft)]
        draft: Option<Draft>,

        /// Base URI for resolving relative references
        #[arg(long)]
        base_uri: Option<String>,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,

        /// Suppress per-file output, only set the exit code
        #[arg(long, short)]
        quiet: bool,
    },
}

fn parse_draft(value: &str) -> Result<Draft, String> {
    match value {
        "3" | "draft3" | "draft-03" => Ok(Draft::Draft3),
        "4" | "draft4" | "draft-04" => Ok(Draft::Draft4),
        "6" | "draft6" | "draft-06" => Ok(Draft::Draft6),
        "7" | "draft7" | "draft-07" => Ok(Draft::Draft7),
        other => Err(format!(
            "unknown draft {other:?} (expected 3, 4, 6, or 7)"
        )),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check {
            schema,
            draft,
            base_uri,
            json,
            quiet,
        } => run_check(&schema, draft, base_uri, json, quiet),

        Commands::Validate {
            schema,
            instances,
            draft,
            base_uri,
            json,
            quiet,
        } => run_validate(&schema, &instances, draft, base_uri, json, quiet),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn build_options(draft: Option<Draft>, base_uri: Option<String>) -> CompileOptions {
    let mut options = CompileOptions::new();
    if let Some(draft) = draft {
        options = options.draft(draft);
    }
    if let Some(base_uri) = base_uri {
        options = options.base_uri(base_uri);
    }
    options
}

fn run_check(
    schema_source: &str,
    draft: Option<Draft>,
    base_uri: Option<String>,
    json_output: bool,
    quiet: bool,
) -> Result<(), u8> {
    let schema = load_json_auto(schema_source).map_err(|e| {
        report_error(json_output, &e.to_string());
        e.exit_code() as u8
    })?;

    let compiled = build_options(draft, base_uri).compile(&schema).map_err(|e| {
        report_error(json_output, &e.to_string());
        e.exit_code() as u8
    })?;

    if json_output {
        println!(r#"{{"ok":true,"draft":"{}"}}"#, compiled.draft());
    } else if !quiet {
        println!("Schema compiled ({})", compiled.draft());
    }
    Ok(())
}

fn run_validate(
    schema_source: &str,
    instances: &[PathBuf],
    draft: Option<Draft>,
    base_uri: Option<String>,
    json_output: bool,
    quiet: bool,
) -> Result<(), u8> {
    let schema = load_json_auto(schema_source).map_err(|e| {
        report_error(json_output, &format!("loading schema: {}", e));
        e.exit_code() as u8
    })?;

    let compiled = build_options(draft, base_uri).compile(&schema).map_err(|e| {
        report_error(json_output, &e.to_string());
        e.exit_code() as u8
    })?;

    let mut failures = 0usize;
    for path in instances {
        let instance = load_json(path).map_err(|e| {
            report_error(json_output, &format!("loading instance: {}", e));
            e.exit_code() as u8
        })?;

        let valid = compiled.is_valid(&instance);
        if !valid {
            failures += 1;
        }
        if json_output {
            let line = serde_json::json!({
                "file": path.display().to_string(),
                "valid": valid,
            });
            println!("{}", line);
        } else if !quiet {
            if valid {
                println!("{}: Valid", path.display());
            } else {
                eprintln!("{}: Validation failed", path.display());
            }
        }
    }

    if failures == 0 {
        Ok(())
    } else {
        Err(1)
    }
}

/// Output an error message in plain text or JSON format.
fn report_error(json_output: bool, msg: &str) {
    if json_output {
        let line = serde_json::json!({ "valid": false, "error": msg });
        println!("{}", line);
    } else {
        eprintln!("Error: {}", msg);
    }
}
