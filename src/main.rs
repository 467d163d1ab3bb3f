use clap::{Parser, Subcommand, ValueEnum};
use packs_builder::config::{self, SettingsOverrides};
use packs_builder::output;
use packs_builder::pipeline::Pipeline;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser)]
#[command(name = "packs-builder")]
#[command(about = "Build major-system image packs into archives and a master index")]
#[command(long_about = "\
Build major-system image packs into archives and a master index

Every directory under the packs root that holds a manifest.json is a pack:

  packs/
  └── italian/
      ├── manifest.json            # international_name, version, ...
      ├── defaults.json            # written by 'defaults'
      └── major_system/images/
          └── numbers/
              ├── 00_sasso.png     # token \"00\"
              └── 01_seta.png

'build' writes italian_1.0.0.tar.gz and packs.json to the output directory.
Archives that already exist are never rebuilt; bump the version instead.

Run 'packs-builder gen-config' to generate a documented packs.toml.")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./packs.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Base URL prepended to archive filenames in packs.json
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Directory for archives and packs.json
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Log level (RUST_LOG takes precedence when set)
    #[arg(long, value_enum, default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List packs under a root directory
    Discover {
        /// Packs root
        #[arg(default_value = "packs")]
        root: PathBuf,
    },
    /// Create or extend defaults.json for one pack
    Defaults {
        /// Pack directory
        pack: PathBuf,
    },
    /// Archive every pack and update packs.json
    Build {
        /// Packs root
        #[arg(default_value = "packs")]
        root: PathBuf,
    },
    /// Regenerate packs.json from the archives in the output directory
    RebuildIndex,
    /// Print a stock packs.toml with all options documented
    GenConfig,
}

/// Logs go to stderr so stdout carries only the command report.
fn initialize_tracing(log_level: &LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_filter_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    initialize_tracing(&cli.log_level);

    let overrides = SettingsOverrides {
        base_download_url: cli.base_url,
        output_directory: cli.output_dir,
    };
    let config_file = cli.config;
    let load_pipeline = || -> Result<_, config::ConfigError> {
        let settings = config::load_settings(config_file.as_deref(), &overrides)?;
        output::print_settings(&settings);
        println!();
        Ok((Pipeline::new(&settings), settings))
    };

    match cli.command {
        Command::Discover { root } => {
            let (pipeline, _) = load_pipeline()?;
            let packs = pipeline.discover_packs(&root)?;
            output::print_discovered_packs(&packs);
        }
        Command::Defaults { pack } => {
            let (pipeline, _) = load_pipeline()?;
            let report = pipeline.init_defaults(&pack)?;
            output::print_defaults_report(&pack, &report);
        }
        Command::Build { root } => {
            let (pipeline, _) = load_pipeline()?;
            println!("==> Building packs from {}", root.display());
            let summary = pipeline.build_all(&root)?;
            output::print_batch_summary(&summary);
        }
        Command::RebuildIndex => {
            let (pipeline, settings) = load_pipeline()?;
            let catalog = pipeline.rebuild_catalog()?;
            output::print_rebuild_output(&settings.output_directory, catalog.as_ref());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
