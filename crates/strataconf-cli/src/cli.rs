//! strataconf CLI - Inspect layered property configuration
//!
//! Usage:
//!   strataconf dump --base config/application -- -server.port=9090
//!   strataconf get server.port --default 8080
//!   strataconf check config/application.yaml config/bootstrap.properties
//!   strataconf pending

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use strataconf_core::config::{DEFAULT_BASE_PATH, DEFAULT_BOOT_PATH, DEFAULT_PROFILE_KEY};
use strataconf_core::{format, Config, ConfigOptions, Error, ErrorKind, Format, Layer};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// strataconf - Layered properties with placeholder resolution
#[derive(Parser, Debug)]
#[command(name = "strataconf")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the resolved properties sorted by key
    Dump {
        #[command(flatten)]
        load: LoadArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Show the source of each key instead of its value
        #[arg(long)]
        sources: bool,

        /// Only print the boot layer
        #[arg(long, conflicts_with = "sources")]
        boot_only: bool,
    },

    /// Get a single resolved value
    Get {
        /// Property key (e.g., server.port)
        key: String,

        /// Value to print if the key is not set
        #[arg(short, long)]
        default: Option<String>,

        #[command(flatten)]
        load: LoadArgs,
    },

    /// Syntax check property files
    Check {
        /// Files to check (.yaml, .yml, .json, .properties)
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// List keys whose placeholders could not be resolved
    Pending {
        #[command(flatten)]
        load: LoadArgs,
    },
}

/// Options shared by every command that loads the full configuration
#[derive(Args, Debug)]
struct LoadArgs {
    /// Base name of the global property files
    #[arg(long, default_value = DEFAULT_BASE_PATH)]
    base: PathBuf,

    /// Base name of the boot property files
    #[arg(long, default_value = DEFAULT_BOOT_PATH)]
    boot: PathBuf,

    /// Key listing the active profiles
    #[arg(long, default_value = DEFAULT_PROFILE_KEY)]
    profile_key: String,

    /// Do not read the process environment
    #[arg(long)]
    no_env: bool,

    /// Overrides in -key=value form, after `--`
    #[arg(last = true, allow_hyphen_values = true)]
    overrides: Vec<String>,
}

impl LoadArgs {
    fn options(&self) -> ConfigOptions {
        ConfigOptions::default()
            .with_base_path(&self.base)
            .with_boot_path(&self.boot)
            .with_profile_key(&self.profile_key)
            .with_environment(!self.no_env)
            .with_args(self.overrides.iter().cloned())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Yaml,
}

/// Run the CLI with the process arguments
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    match cli.command {
        Commands::Dump {
            load,
            format,
            sources,
            boot_only,
        } => cmd_dump(&load, format, sources, boot_only),
        Commands::Get { key, default, load } => cmd_get(&load, &key, default),
        Commands::Check { files } => cmd_check(files),
        Commands::Pending { load } => cmd_pending(&load),
    }
}

fn setup_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Unresolved placeholders are a resolution failure; everything else failed to load
fn failure_code(err: &Error) -> u8 {
    match err.kind {
        ErrorKind::Unresolved { .. } => 1,
        _ => 2,
    }
}

fn load_config(load: &LoadArgs) -> Result<Config, ExitCode> {
    Config::load(&load.options()).map_err(|e| {
        eprintln!("{} Failed to load configuration\n", "✗".red());
        eprintln!("{}", e);
        ExitCode::from(failure_code(&e))
    })
}

fn cmd_dump(load: &LoadArgs, format: OutputFormat, sources: bool, boot_only: bool) -> ExitCode {
    let config = match load_config(load) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let entries: Vec<(&str, &str)> = if sources {
        config
            .keys(Layer::Resolved)
            .into_iter()
            .map(|key| (key, config.source_of(key).unwrap_or("unknown")))
            .collect()
    } else if boot_only {
        config.entries(Layer::Boot)
    } else {
        config.entries(Layer::Resolved)
    };

    match render(&entries, format, sources) {
        Ok(content) => {
            print!("{}", content);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            ExitCode::from(1)
        }
    }
}

/// Render sorted `(key, value)` pairs; `sources` switches text output to `key: source`
fn render(entries: &[(&str, &str)], format: OutputFormat, sources: bool) -> Result<String, String> {
    let map: BTreeMap<&str, &str> = entries.iter().copied().collect();
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(&map)
            .map(|s| s + "\n")
            .map_err(|e| e.to_string()),
        OutputFormat::Yaml => serde_yaml::to_string(&map).map_err(|e| e.to_string()),
        OutputFormat::Text => {
            let sep = if sources { ": " } else { "=" };
            Ok(map
                .iter()
                .map(|(k, v)| format!("{}{}{}\n", k, sep, v))
                .collect())
        }
    }
}

fn cmd_get(load: &LoadArgs, key: &str, default: Option<String>) -> ExitCode {
    let config = match load_config(load) {
        Ok(c) => c,
        Err(code) => return code,
    };

    match (config.get(key), default) {
        (Some(value), _) => {
            println!("{}", value);
            ExitCode::SUCCESS
        }
        (None, Some(default_val)) => {
            println!("{}", default_val);
            ExitCode::SUCCESS
        }
        (None, None) => {
            eprintln!("{}: Key '{}' not found", "Error".red(), key);
            ExitCode::from(1)
        }
    }
}

fn cmd_check(files: Vec<PathBuf>) -> ExitCode {
    let mut all_valid = true;

    for file in files {
        match check_file(&file) {
            Ok(summary) => println!("{} {}: {}", "✓".green(), file.display(), summary),
            Err(e) => {
                eprintln!("{} {}: {}", "✗".red(), file.display(), e);
                all_valid = false;
            }
        }
    }

    if all_valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

fn check_file(file: &std::path::Path) -> Result<String, String> {
    let fmt = Format::from_path(file).ok_or_else(|| "unsupported file extension".to_string())?;
    let content = std::fs::read_to_string(file).map_err(|e| e.to_string())?;
    let pairs =
        format::parse(fmt, &content, &file.display().to_string()).map_err(|e| e.to_string())?;
    Ok(format!("valid {} ({} keys)", fmt.name(), pairs.len()))
}

fn cmd_pending(load: &LoadArgs) -> ExitCode {
    let config = match Config::load_lenient(&load.options()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{} Failed to load configuration\n", "✗".red());
            eprintln!("{}", e);
            return ExitCode::from(2);
        }
    };

    let resolution = config.resolution();
    if resolution.is_complete() {
        println!(
            "{} All keys resolved ({} rounds, {} defaults applied)",
            "✓".green(),
            resolution.rounds,
            resolution.defaults_applied
        );
        return ExitCode::SUCCESS;
    }

    eprintln!(
        "{} {} key(s) still pending\n",
        "✗".red(),
        resolution.unresolved.len()
    );
    for entry in &resolution.unresolved {
        println!("{} = {}", entry.key.bold(), entry.raw);
        println!("    unresolved: {}", entry.tokens.join(", ").yellow());
    }
    ExitCode::from(1)
}
