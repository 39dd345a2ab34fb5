use anyhow::Result;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use plugscan::{
    access::{
        AccessCoordinator, DenyPrompter, GrantStore, GrantingCoordinator, OpenAccess,
        TerminalPrompter,
    },
    config::Config,
    filter::PluginFilter,
    model::{Domain, PluginKind, ScanReport},
    output::{format_result_to_string, print_plugin_detail, print_result, OutputFormat},
    platform::{absolute_root, system_library_dir},
    service::{PluginScanService, Root},
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Exit codes for scripting
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const ERROR: u8 = 1;
    pub const NOT_FOUND: u8 = 2;
}

#[derive(Parser)]
#[command(name = "plugscan")]
#[command(
    author,
    version,
    about = "List installed audio plugins (AudioUnit, VST, VST3, AAX)"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan library roots for plugin bundles
    Scan {
        /// Library root to scan instead of the configured ones (repeatable)
        #[arg(short, long)]
        root: Vec<PathBuf>,

        /// Only show one kind (au, vst, vst3, aax)
        #[arg(short, long)]
        kind: Option<String>,

        /// Only show plugins whose name, identifier or description contains this text
        #[arg(short, long)]
        search: Option<String>,

        /// Output format (table, json)
        #[arg(short, long)]
        format: Option<String>,

        /// Write JSON output to file
        #[arg(short, long)]
        output: Option<String>,

        /// Never prompt; only scan roots that already have a stored grant
        #[arg(long)]
        no_prompt: bool,
    },

    /// Show details for one plugin, by name or path
    Show {
        query: String,

        /// Never prompt; only scan roots that already have a stored grant
        #[arg(long)]
        no_prompt: bool,
    },

    /// List or revoke persisted folder-access grants
    Grants {
        /// Revoke the grant for this root
        #[arg(long)]
        revoke: Option<PathBuf>,
    },

    /// Show or create config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },

    /// List recognized plugin kinds
    ListKinds,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("PLUGSCAN_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

async fn run() -> Result<u8> {
    let cli = Cli::parse();
    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        Config::default()
    });

    match cli.command {
        Commands::Scan {
            root,
            kind,
            search,
            format,
            output,
            no_prompt,
        } => {
            let kind = kind
                .map(|k| PluginKind::from_str(&k).map_err(|e| anyhow::anyhow!(e)))
                .transpose()?;
            let format_str = format.unwrap_or(config.default_format.clone());
            let format = OutputFormat::from_str(&format_str).map_err(|e| anyhow::anyhow!(e))?;

            let roots = if root.is_empty() {
                config.scan_roots()
            } else {
                root.into_iter().map(root_for_path).collect()
            };

            let filter = PluginFilter::new(&config.ignore)?
                .with_kind(kind)
                .with_search(search.as_deref());
            let report = run_scan(&config, &roots, no_prompt, format == OutputFormat::Table).await?;
            let report = filter.apply(report);

            if let Some(path) = output {
                std::fs::write(&path, format_result_to_string(&report)?)?;
                if format == OutputFormat::Table {
                    println!("Results written to: {}", path);
                }
            } else {
                print_result(&report, format)?;
            }
            Ok(exit_codes::SUCCESS)
        }
        Commands::Show { query, no_prompt } => {
            let report = run_scan(&config, &config.scan_roots(), no_prompt, false).await?;
            match report.records.find(&query) {
                Some(record) => {
                    print_plugin_detail(record);
                    Ok(exit_codes::SUCCESS)
                }
                None => {
                    eprintln!("No plugin matching '{}' found.", query);
                    Ok(exit_codes::NOT_FOUND)
                }
            }
        }
        Commands::Grants { revoke } => {
            handle_grants(revoke)?;
            Ok(exit_codes::SUCCESS)
        }
        Commands::Config { init, path } => {
            handle_config(init, path)?;
            Ok(exit_codes::SUCCESS)
        }
        Commands::ListKinds => {
            list_kinds();
            Ok(exit_codes::SUCCESS)
        }
    }
}

fn root_for_path(path: PathBuf) -> Root {
    let domain = if path == system_library_dir() {
        Domain::System
    } else {
        Domain::User
    };
    Root::new(path, domain)
}

/// Picks how roots are unlocked.
///
/// With prompting disabled in the config every readable root is scanned.
/// `--no-prompt` keeps stored grants but turns each would-be prompt into
/// a denial.
fn coordinator(config: &Config, no_prompt: bool) -> Result<Box<dyn AccessCoordinator>> {
    if !config.prompt {
        Ok(Box::new(OpenAccess))
    } else if no_prompt {
        Ok(Box::new(GrantingCoordinator::load(DenyPrompter)?))
    } else {
        Ok(Box::new(GrantingCoordinator::load(TerminalPrompter)?))
    }
}

async fn run_scan(
    config: &Config,
    roots: &[Root],
    no_prompt: bool,
    is_interactive: bool,
) -> Result<ScanReport> {
    let service =
        PluginScanService::with_extensions(coordinator(config, no_prompt)?, config.extension_set());

    // Prompts and a spinner would fight over the terminal.
    let progress = if is_interactive && (no_prompt || !config.prompt) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Scanning plugin folders...");
        Some(pb)
    } else {
        None
    };

    let report = service.scan(roots).await;

    if let Some(pb) = progress {
        pb.finish_with_message(format!("Found {} plugins", report.records.len()));
    }

    Ok(report)
}

fn handle_grants(revoke: Option<PathBuf>) -> Result<()> {
    let mut store = GrantStore::load(GrantStore::default_path())?;

    if let Some(root) = revoke.map(absolute_root) {
        if store.revoke(&root).is_some() {
            store.save()?;
            println!("Revoked access to {}", root.display());
        } else {
            println!("No grant stored for {}", root.display());
        }
        return Ok(());
    }

    if store.is_empty() {
        println!("No folder-access grants stored.");
        println!("Grants file: {}", store.path().display());
        return Ok(());
    }

    println!("Stored grants ({}):", store.path().display());
    println!();
    for grant in store.list() {
        let state = if grant.is_valid() { "valid" } else { "stale" };
        println!(
            "  {:<40} granted {}  [{}]",
            grant.root.display(),
            grant.granted_at.format("%Y-%m-%d %H:%M"),
            state
        );
    }
    Ok(())
}

fn handle_config(init: bool, show_path: bool) -> Result<()> {
    let config_path = Config::config_path();

    if show_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("Config file already exists at: {}", config_path.display());
        } else {
            Config::default().save_to(&config_path)?;
            println!("Created config file at: {}", config_path.display());
        }
        return Ok(());
    }

    // Surface parse and validation errors here instead of falling back.
    let config = Config::load_from(&config_path)?;
    if config_path.exists() {
        println!("Config file: {}", config_path.display());
    } else {
        println!("No config file; using defaults.");
        println!("Run 'plugscan config --init' to create {}", config_path.display());
    }
    println!();

    println!("Roots:");
    for root in config.scan_roots() {
        println!("  {:<8} {}", root.domain, root.path.display());
    }
    let extension_set = config.extension_set();
    let extensions: Vec<&str> = extension_set.iter().collect();
    println!("Extensions: {}", extensions.join(", "));
    println!("Format:     {}", config.default_format);
    println!(
        "Prompt:     {}",
        if config.prompt { "ask for ungranted roots" } else { "off (scan readable roots)" }
    );
    if config.ignore.plugins.is_empty() {
        println!("Ignored:    none");
    } else {
        println!("Ignored:    {}", config.ignore.plugins.join(", "));
    }

    Ok(())
}

fn list_kinds() {
    println!("Recognized plugin kinds:");
    println!();

    for kind in PluginKind::ALL {
        let metadata = if kind.has_bundle_metadata() {
            "Info.plist"
        } else {
            "-"
        };
        println!(
            "  {:<10} .{:<12} [metadata: {}]",
            kind.display_name(),
            kind.extension(),
            metadata
        );
    }
}
