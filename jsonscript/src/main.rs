///
/// jsonscript CLI - Run programs assembled from JSON descriptors
///
/// Provides commands for working with a descriptor directory:
/// - jsonscript run <dir>: Compile and invoke the configured entry point
/// - jsonscript check <dir>: Compile and report diagnostics only
/// - jsonscript show <dir>: Print the assembled program as source text
/// - jsonscript init <dir>: Scaffold a runnable example directory
///

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use tracing::Level;

use jsonscript::config::read_settings;
use jsonscript::pipeline::assemble;
use jsonscript::{
    init_project, render, CompilerConfig, DiagnosticReporter, Pipeline, RawSettings, RunError, ScriptBackend,
};

#[derive(Parser)]
#[command(name = "jsonscript")]
#[command(author, version, about = "Run programs assembled from JSON descriptors", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a descriptor directory and invoke its entry point
    Run {
        /// The descriptor directory
        dir: PathBuf,

        #[command(flatten)]
        settings: SettingsArgs,
    },

    /// Compile without invoking anything
    Check {
        /// The descriptor directory
        dir: PathBuf,

        #[command(flatten)]
        settings: SettingsArgs,
    },

    /// Print the assembled program as source text
    Show {
        /// The descriptor directory
        dir: PathBuf,

        /// Keep going when descriptors are orphaned
        #[arg(long)]
        tolerate_orphans: bool,
    },

    /// Create a runnable example descriptor directory
    Init {
        /// Directory to initialize
        dir: PathBuf,
    },
}

/// Overrides for values in `compilerSettings.json`.
#[derive(Args)]
struct SettingsArgs {
    /// Entry type, in the form Namespace.Type
    #[arg(long)]
    entry_namespace: Option<String>,

    /// Entry method name
    #[arg(long)]
    entry_method: Option<String>,

    /// Name of the compiled assembly
    #[arg(long)]
    assembly_name: Option<String>,

    /// Only log warnings and errors
    #[arg(long)]
    silent: bool,

    /// Print the generated source when compilation fails
    #[arg(long)]
    visualize_on_error: bool,

    /// Keep going when descriptors are orphaned
    #[arg(long)]
    tolerate_orphans: bool,

    /// Log per-file loading detail
    #[arg(long, short)]
    verbose: bool,
}

impl SettingsArgs {
    fn overrides(&self) -> RawSettings {
        RawSettings {
            entry_method: self.entry_method.clone(),
            entry_namespace: self.entry_namespace.clone(),
            assembly_name: self.assembly_name.clone(),
            silent_compilation: self.silent.then_some(true),
            visualize_on_error: self.visualize_on_error.then_some(true),
            tolerate_orphans: self.tolerate_orphans.then_some(true),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { dir, settings } => {
            run_dir(&dir, &settings, true);
        }
        Commands::Check { dir, settings } => {
            run_dir(&dir, &settings, false);
        }
        Commands::Show { dir, tolerate_orphans } => {
            show_dir(&dir, tolerate_orphans);
        }
        Commands::Init { dir } => {
            init_dir(&dir);
        }
    }
}

fn init_logging(level: Level) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_max_level(level)
        .without_time()
        .init();
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("error: {}", message);
    std::process::exit(1);
}

fn run_dir(dir: &Path, settings: &SettingsArgs, invoke: bool) {
    let config = match CompilerConfig::load(dir, settings.overrides()) {
        Ok(config) => config,
        Err(e) => fail(e),
    };

    let level = if settings.verbose {
        Level::DEBUG
    } else if config.silent {
        Level::WARN
    } else {
        Level::INFO
    };
    init_logging(level);

    let pipeline = Pipeline::new(dir, config);
    let backend = ScriptBackend::new();

    let unit = match pipeline.assemble() {
        Ok(unit) => unit,
        Err(e) => fail(e),
    };

    let assembly = match pipeline.compile(&backend, &unit) {
        Ok(assembly) => assembly,
        Err(RunError::Compile(failure)) => {
            DiagnosticReporter::new(&unit).report_all(&failure.diagnostics);
            if let Some(rendering) = &failure.rendering {
                eprintln!("Generated visual for debugging:");
                eprintln!("{}", rendering);
            }
            fail(failure);
        }
        Err(e) => fail(e),
    };

    if !invoke {
        println!("No errors found");
        return;
    }

    match pipeline.invoke(&assembly) {
        Ok(outcome) => {
            if !outcome.value.is_void() {
                println!("{}", outcome.value);
            }
        }
        Err(e) => fail(e),
    }
}

fn show_dir(dir: &Path, tolerate_orphans: bool) {
    init_logging(Level::WARN);

    let tolerate = match read_settings(dir) {
        Ok(settings) => tolerate_orphans || settings.and_then(|s| s.tolerate_orphans).unwrap_or(false),
        Err(e) => fail(e),
    };

    match assemble(dir, tolerate) {
        Ok(unit) => print!("{}", render(&unit)),
        Err(e) => fail(e),
    }
}

fn init_dir(dir: &Path) {
    init_logging(Level::INFO);

    match init_project(dir) {
        Ok(()) => {
            println!("Initialized jsonscript project in {}", dir.display());
            println!("Run it with: jsonscript run {}", dir.display());
        }
        Err(e) => fail(e),
    }
}
