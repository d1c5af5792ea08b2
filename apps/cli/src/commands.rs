//! CLI command definitions, routing, and tracing setup.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use prompttree_artifacts::{Format, RenderOptions};
use prompttree_core::{Aggregator, Inventory, Validator, WorkspaceLister};
use prompttree_shared::{
    AppConfig, Partition, Scope, ValidationReport, init_config, load_config, load_config_from,
};
use prompttree_storage::FsStore;
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// prompttree: assemble documentation into AI-ready context bundles.
#[derive(Parser)]
#[command(
    name = "prompttree",
    version,
    about = "Aggregate a partitioned documentation tree into JSON, XML, or Markdown context bundles.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Explicit config file (defaults to ./prompttree.toml, then ~/.prompttree/).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Documentation store directory, overriding the config file.
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Aggregate a scoped slice of the store and render it.
    Aggregate {
        /// Scope: system, package, application, workflow, or full.
        #[arg(short, long)]
        scope: Scope,

        /// Package, application, or workflow name.
        #[arg(short, long)]
        target: Option<String>,

        /// Output format: json, xml, or markdown (defaults to the config value).
        #[arg(short, long)]
        format: Option<String>,

        /// Omit the metadata block.
        #[arg(long)]
        no_metadata: bool,

        /// Compact JSON output.
        #[arg(long)]
        minify: bool,

        /// Write to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check the store against the project's packages and applications.
    Validate {
        /// Host project root, overriding the config file.
        #[arg(long)]
        project: Option<PathBuf>,

        /// Create empty directories for missing components.
        #[arg(long)]
        create_missing: bool,
    },

    /// List the names each partition of the store exposes.
    List,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write a default prompttree.toml into the current directory.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
///
/// Logs go to stderr; stdout is reserved for rendered bundles.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "prompttree=info",
        1 => "prompttree=debug",
        _ => "prompttree=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir().wrap_err("cannot determine working directory")?;

    let config = || resolve_config(&cwd, cli.config.as_deref(), cli.store.as_deref());

    match cli.command {
        Command::Aggregate {
            scope,
            target,
            format,
            no_metadata,
            minify,
            output,
        } => {
            let config = config()?;
            let format = format
                .as_deref()
                .unwrap_or(&config.output.format)
                .parse::<Format>()?;
            let options = RenderOptions {
                include_metadata: config.output.include_metadata && !no_metadata,
                minify: config.output.minify || minify,
            };
            cmd_aggregate(&config, scope, target.as_deref(), format, &options, output.as_deref())
        }
        Command::Validate {
            project,
            create_missing,
        } => {
            let mut config = config()?;
            if let Some(project) = project {
                config.project.root = absolutize(&cwd, &project);
            }
            cmd_validate(&config, create_missing)
        }
        Command::List => cmd_list(&config()?),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(&cwd),
            ConfigAction::Show => cmd_config_show(&config()?),
        },
    }
}

/// Load config (explicit file, discovered file, or defaults) and apply the
/// `--store` override.
fn resolve_config(cwd: &Path, explicit: Option<&Path>, store: Option<&Path>) -> Result<AppConfig> {
    let mut config = match explicit {
        Some(path) => load_config_from(&absolutize(cwd, path))?,
        None => load_config(cwd)?,
    };
    if let Some(store) = store {
        config.store.root = absolutize(cwd, store);
    }
    Ok(config)
}

fn absolutize(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_aggregate(
    config: &AppConfig,
    scope: Scope,
    target: Option<&str>,
    format: Format,
    options: &RenderOptions,
    output: Option<&Path>,
) -> Result<()> {
    let store = FsStore::new(&config.store.root);
    info!(store = %config.store.root.display(), %scope, %format, "aggregating");

    let aggregation = Aggregator::new(&store).aggregate(scope, target)?;
    let rendered = prompttree_artifacts::render(
        format,
        &aggregation.context,
        &aggregation.metadata,
        options,
    )?;

    match output {
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(rendered.as_bytes())
                .wrap_err("failed to write to stdout")?;
            stdout.flush()?;
        }
        Some(path) => {
            let meta = prompttree_core::write_output(path, &rendered)?;
            println!();
            println!("  Bundle written!");
            println!("  Scope:   {scope}");
            println!("  Format:  {format}");
            println!("  Prompts: {}", aggregation.metadata.total_prompts);
            println!("  Size:    {} bytes", meta.size_bytes);
            println!("  SHA-256: {}", meta.sha256);
            println!("  Path:    {}", meta.path.display());
            println!();
        }
    }

    Ok(())
}

fn cmd_validate(config: &AppConfig, create_missing: bool) -> Result<()> {
    let store = FsStore::new(&config.store.root);
    let lister = WorkspaceLister::from_config(&config.project);
    let validator = Validator::new(&store, &lister);

    info!(
        store = %config.store.root.display(),
        project = %config.project.root.display(),
        "validating structure"
    );

    let mut report = validator.validate()?;
    print_report(&report);

    if create_missing && !report.missing.is_empty() {
        let created = prompttree_core::create_missing(&store, &report)?;
        println!("  Created {} director(ies):", created.len());
        for location in &created {
            println!("    + {location}");
        }
        println!();
        report = validator.validate()?;
    }

    if report.is_success() {
        println!("  Structure is valid.");
        Ok(())
    } else {
        Err(eyre!(
            "validation failed: {} missing, {} orphaned",
            report.missing.len(),
            report.orphaned.len()
        ))
    }
}

fn print_report(report: &ValidationReport) {
    println!();
    println!("  Components:");
    if report.checks.is_empty() {
        println!("    (none)");
    }
    for check in &report.checks {
        let mark = if check.exists { "ok" } else { "MISSING" };
        println!(
            "    [{mark:>7}] {} {} -> {}",
            check.component.kind, check.component.name, check.location
        );
    }

    if !report.orphaned.is_empty() {
        println!();
        println!("  Orphaned:");
        for orphan in &report.orphaned {
            println!("    [ORPHAN] {}", orphan.location);
        }
    }
    println!();
}

fn cmd_list(config: &AppConfig) -> Result<()> {
    let store = FsStore::new(&config.store.root);
    let inventory = Inventory::collect(&store);

    println!();
    for partition in Partition::ALL {
        let names = inventory.names(partition);
        println!("  {partition} ({}):", names.len());
        for name in names {
            println!("    - {name}");
        }
    }
    println!();

    Ok(())
}

fn cmd_config_init(cwd: &Path) -> Result<()> {
    let path = init_config(cwd)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}
