//! DroidCHC CLI
//!
//! # Usage
//!
//! ```bash
//! # Compile a program model into an SMT-LIB2 fixedpoint file
//! cargo run --bin droidchc --release -- compile --program app.json --output app.smt2
//!
//! # Use a YAML configuration and extra sinks
//! cargo run --bin droidchc -- compile --program app.json --config droidchc.yaml \
//!     --sinks 'Landroid/util/Log;->d(Ljava/lang/String;Ljava/lang/String;)I'
//!
//! # Print a preset as YAML
//! cargo run --bin droidchc -- config --preset precise
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use droidchc_ir::{AnalysisConfig, Orchestrator, Preset, Program};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "droidchc")]
#[command(about = "Compile Dalvik program models into Horn clauses for taint analysis", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a JSON program model
    Compile {
        /// Program model (JSON)
        #[arg(short, long)]
        program: PathBuf,

        /// Analysis configuration (YAML v1)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Source signatures, replacing the configured ones
        #[arg(long, num_args = 1..)]
        sources: Vec<String>,

        /// Sink signatures, replacing the configured ones
        #[arg(long, num_args = 1..)]
        sinks: Vec<String>,
    },

    /// Print a preset configuration as YAML
    Config {
        /// fast, precise or custom
        #[arg(short, long, default_value = "custom")]
        preset: String,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Compile {
            program,
            config,
            output,
            sources,
            sinks,
        } => compile(program, config, output, sources, sinks),
        Commands::Config { preset } => {
            let preset = Preset::parse(&preset)?;
            print!("{}", AnalysisConfig::preset(preset).to_yaml()?);
            Ok(())
        }
    }
}

fn compile(
    program_path: PathBuf,
    config_path: Option<PathBuf>,
    output: Option<PathBuf>,
    sources: Vec<String>,
    sinks: Vec<String>,
) -> anyhow::Result<()> {
    let mut config = match &config_path {
        Some(path) => AnalysisConfig::from_yaml(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    if !sources.is_empty() {
        config = config.sources(sources);
    }
    if !sinks.is_empty() {
        config = config.sinks(sinks);
    }

    let program = Program::from_path(&program_path)
        .with_context(|| format!("reading program model {}", program_path.display()))?;

    let orchestrator = Orchestrator::new(config);
    let compilation = orchestrator.compile(&program)?;
    let smt2 = compilation.to_smt2(orchestrator.config())?;

    match &output {
        Some(path) => std::fs::write(path, &smt2)
            .with_context(|| format!("writing {}", path.display()))?,
        None => print!("{}", smt2),
    }

    let report = &compilation.report;
    eprintln!(
        "relations: {}, clauses: {}, queries: {} ({} methods compiled, {} skipped)",
        report.relations,
        report.clauses,
        report.queries,
        report.methods_compiled,
        report.methods_skipped
    );
    Ok(())
}
