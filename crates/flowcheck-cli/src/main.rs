//! FlowCheck CLI
//!
//! Command-line interface for checking C and C++ sources.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use flowcheck_analysis::{Checker, CheckRegistry, FileLister};
use flowcheck_core::{Config, Diagnostic};
use flowcheck_parser::{PreprocessOptions, PreprocessedFile, Preprocessor, Tokenizer};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "flowcheck")]
#[command(author, version, about = "Static checker for C and C++ code", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check files and directories
    Check {
        /// Files or directories to check
        #[arg(value_name = "PATHS", required = true)]
        paths: Vec<PathBuf>,

        /// Descend into subdirectories
        #[arg(short, long)]
        recursive: bool,

        /// Also report findings that may be false positives
        #[arg(short, long)]
        all: bool,

        /// Report style findings
        #[arg(short, long)]
        style: bool,

        /// Do not print progress
        #[arg(short, long)]
        quiet: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        preprocess: PreprocessArgs,
    },

    /// List the configurations of a file
    Configs {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[command(flatten)]
        preprocess: PreprocessArgs,
    },

    /// Print preprocessed code
    Preprocess {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Only this configuration ("" is the default configuration)
        #[arg(long)]
        cfg: Option<String>,

        #[command(flatten)]
        preprocess: PreprocessArgs,
    },

    /// Print the tokens of one configuration
    Tokens {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Configuration to tokenize
        #[arg(long, default_value = "")]
        cfg: String,

        #[command(flatten)]
        preprocess: PreprocessArgs,
    },

    /// List every diagnostic the checks can report
    Errorlist {
        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },
}

#[derive(Args)]
struct PreprocessArgs {
    /// Configuration file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Include search path
    #[arg(short = 'I', value_name = "DIR")]
    include_paths: Vec<PathBuf>,

    /// Splice quoted #include files
    #[arg(long)]
    includes: bool,
}

impl PreprocessArgs {
    /// Configuration file with command line overrides applied
    fn load(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => Config::default(),
        };
        if self.includes {
            config.preprocess.expand_includes = true;
        }
        config.preprocess.include_paths.extend(self.include_paths.iter().cloned());
        Ok(config)
    }

    fn preprocess(&self, file: &Path) -> Result<PreprocessedFile> {
        let config = self.load()?;
        let preprocessor = Preprocessor::new(PreprocessOptions::from(&config.preprocess));
        preprocessor
            .preprocess_file(file)
            .with_context(|| format!("Failed to read {}", file.display()))
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> Result<ExitCode> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            paths,
            recursive,
            all,
            style,
            quiet,
            format,
            output,
            preprocess,
        } => {
            let mut config = preprocess.load()?;
            config.checks.show_all |= all;
            config.checks.style |= style;
            let found = cmd_check(
                &paths,
                config,
                recursive,
                quiet || format == Format::Json,
                format,
                output.as_deref(),
            )?;
            return Ok(if found { ExitCode::FAILURE } else { ExitCode::SUCCESS });
        }
        Commands::Configs { file, preprocess } => {
            cmd_configs(&file, &preprocess)?;
        }
        Commands::Preprocess { file, cfg, preprocess } => {
            cmd_preprocess(&file, cfg.as_deref(), &preprocess)?;
        }
        Commands::Tokens { file, cfg, preprocess } => {
            cmd_tokens(&file, &cfg, &preprocess)?;
        }
        Commands::Errorlist { format } => {
            cmd_errorlist(format)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Returns whether anything was found
fn cmd_check(
    paths: &[PathBuf],
    config: Config,
    recursive: bool,
    quiet: bool,
    format: Format,
    output: Option<&Path>,
) -> Result<bool> {
    let files = FileLister::new(&config.files)?
        .recursive(recursive || config.files.recursive)
        .collect(paths);
    if files.is_empty() {
        anyhow::bail!("No source files found");
    }
    debug!("Checking {} files", files.len());

    let mut checker = Checker::new(config);
    if !quiet {
        checker = checker.with_progress(|event| {
            println!(
                "{}/{} files checked {}% done ({})",
                event.current,
                event.total,
                event.current * 100 / event.total,
                event.file.display()
            );
        });
    }

    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let mut failed = 0;
    for report in checker.check_files(&files) {
        match report.result {
            Ok(found) => diagnostics.extend(found),
            Err(e) => {
                eprintln!("{}: {}", report.path.display(), e);
                failed += 1;
            }
        }
    }

    let text = match format {
        Format::Json => serde_json::to_string_pretty(&diagnostics)?,
        Format::Text => diagnostics
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n"),
    };

    if let Some(out_path) = output {
        std::fs::write(out_path, &text)?;
        if !quiet {
            println!("Output written to: {}", out_path.display());
        }
    } else if format == Format::Json {
        println!("{}", text);
    } else if !text.is_empty() {
        eprintln!("{}", text);
    }

    if !quiet {
        println!(
            "\n{} files, {} findings, {} unreadable",
            files.len(),
            diagnostics.len(),
            failed
        );
    }
    Ok(!diagnostics.is_empty())
}

fn cmd_configs(file: &Path, preprocess: &PreprocessArgs) -> Result<()> {
    let preprocessed = preprocess.preprocess(file)?;
    for cfg in preprocessed.all_configurations() {
        if cfg.is_empty() {
            println!("(default)");
        } else {
            println!("{}", cfg);
        }
    }
    Ok(())
}

fn cmd_preprocess(file: &Path, cfg: Option<&str>, preprocess: &PreprocessArgs) -> Result<()> {
    let preprocessed = preprocess.preprocess(file)?;

    if let Some(cfg) = cfg {
        print!("{}", preprocessed.code_for(cfg));
        return Ok(());
    }

    for cfg in preprocessed.all_configurations() {
        println!("// configuration: {}", if cfg.is_empty() { "(default)" } else { cfg });
        print!("{}", preprocessed.code_for(cfg));
    }
    Ok(())
}

fn cmd_tokens(file: &Path, cfg: &str, preprocess: &PreprocessArgs) -> Result<()> {
    let preprocessed = preprocess.preprocess(file)?;
    let stream = Tokenizer::new(file.to_string_lossy()).tokenize(&preprocessed.code_for(cfg));

    for id in stream.iter() {
        let token = &stream[id];
        let location = stream.location(id);
        if token.var_id() == 0 {
            println!("{}: {}", location, token.text());
        } else {
            println!("{}: {} @{}", location, token.text(), token.var_id());
        }
    }
    Ok(())
}

fn cmd_errorlist(format: Format) -> Result<()> {
    let mut messages: Vec<Diagnostic> = Vec::new();
    CheckRegistry::builtin().error_messages(&mut messages);

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&messages)?),
        Format::Text => {
            for diag in &messages {
                println!("{}: {}", diag.id, diag);
            }
        }
    }
    Ok(())
}
