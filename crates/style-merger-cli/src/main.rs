use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;

use style_merger_core::custom_code::{fold_application_status, CustomCodeClient};
use style_merger_core::host::{MemoryHost, SiteSnapshot};
use style_merger_core::{logging, Config, LogLevel, StyleMerger};

#[derive(Parser)]
#[command(name = "style-merger")]
#[command(about = "Find and safely merge duplicate Webflow styles")]
#[command(version)]
struct Cli {
    /// Site snapshot to operate on
    #[arg(short, long, global = true, default_value = "site.json")]
    site: PathBuf,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbosity level
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Write logs to this directory instead of stderr
    #[arg(long, global = true)]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List groups of numbered duplicate styles
    Duplicates,

    /// List styles whose name starts with a prefix
    Search {
        /// Case-sensitive name prefix
        query: String,
    },

    /// Compare the properties of two styles
    Compare {
        /// Name of the first style
        base: String,

        /// Name of the second style
        other: String,
    },

    /// Merge duplicate styles into a base style
    Merge {
        /// Name of the style to keep
        #[arg(long)]
        base: String,

        /// Names of the styles to fold into the base
        #[arg(long, required = true, num_args = 1..)]
        targets: Vec<String>,

        /// Merge even when the styles have different properties
        #[arg(long)]
        yes: bool,

        /// Run without saving changes
        #[arg(long)]
        dry_run: bool,
    },

    /// List component definitions
    Components,

    /// List custom code scripts registered for a site
    Scripts {
        /// Webflow site id
        #[arg(long)]
        site_id: String,
    },

    /// Show where a registered script is applied
    ScriptStatus {
        /// Webflow site id
        #[arg(long)]
        site_id: String,

        /// Registered script id
        #[arg(long)]
        script_id: String,

        /// Page ids to check besides the site itself
        #[arg(long, num_args = 0..)]
        pages: Vec<String>,
    },

    /// Generate default configuration file
    GenerateConfig {
        /// Path to save configuration file
        #[arg(default_value = "style-merger.json")]
        path: PathBuf,
    },
}

fn main() -> Result<(), anyhow::Error> {
    dotenv::dotenv().ok();

    // Parse command line arguments
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    }
    .with_env_overrides();

    // Set log level based on verbosity
    config.log_level = match cli.verbose {
        0 => config.log_level,
        1 => LogLevel::Debug,
        _ => LogLevel::Trace,
    };

    match &cli.log_dir {
        Some(dir) => logging::init_logger(dir, config.log_level)
            .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?,
        None => env_logger::Builder::from_default_env()
            .filter_level(config.log_level.into())
            .init(),
    }

    config.validate()?;

    // Commands that do not need a site snapshot
    match &cli.command {
        Commands::GenerateConfig { path } => {
            config.save_to_file(path)?;
            println!("Configuration file generated at: {}", path.display());
            return Ok(());
        }
        Commands::Scripts { site_id } => {
            let client = CustomCodeClient::new(&config.custom_code)?;
            let scripts = client.list_scripts(site_id)?;
            if scripts.is_empty() {
                println!("No scripts registered for site {}.", site_id);
            }
            for script in scripts {
                println!(
                    "{} v{}  [{}]",
                    script.display_name,
                    script.version,
                    script.id.as_deref().unwrap_or("-")
                );
            }
            return Ok(());
        }
        Commands::ScriptStatus {
            site_id,
            script_id,
            pages,
        } => {
            let client = CustomCodeClient::new(&config.custom_code)?;
            let status = if pages.is_empty() {
                fold_application_status(&client.batch_status(site_id, &[]), script_id)
            } else {
                client.application_status(site_id, script_id, pages)
            };
            for (target, application) in status {
                match (application.is_applied, application.location) {
                    (true, Some(location)) => println!("{}: applied ({:?})", target, location),
                    (true, None) => println!("{}: applied", target),
                    (false, _) => println!("{}: not applied", target),
                }
            }
            return Ok(());
        }
        _ => {}
    }

    let snapshot = SiteSnapshot::from_file(&cli.site)
        .with_context(|| format!("Failed to load site snapshot {}", cli.site.display()))?;
    let host = Arc::new(MemoryHost::new(snapshot));
    let merger = StyleMerger::new(host.clone(), config)?;

    match cli.command {
        Commands::Duplicates => {
            let groups = merger.find_duplicates()?;
            if groups.is_empty() {
                println!("No duplicate styles found.");
            }
            for group in groups {
                println!("{} ({} styles)", group.base_name, group.styles.len());
                for style in group.styles {
                    println!("  {}  [{}]", style.name, style.id);
                }
            }
        }

        Commands::Search { query } => {
            let styles = merger.directory().find_by_prefix(&query)?;
            if styles.is_empty() {
                println!("No styles found starting with \"{}\".", query);
            }
            for style in styles {
                println!("{}  [{}]", style.name, style.id);
            }
        }

        Commands::Compare { base, other } => {
            let directory = merger.directory();
            let base_style = directory
                .find_by_name(&base)?
                .with_context(|| format!("No style named {:?}", base))?;
            let other_style = directory
                .find_by_name(&other)?
                .with_context(|| format!("No style named {:?}", other))?;

            let differences = merger.comparator().differences(&base_style.id, &other_style.id)?;
            if differences.is_empty() {
                println!("{:?} and {:?} are identical.", base, other);
            }
            for diff in differences {
                println!(
                    "{}: {} -> {}",
                    diff.property,
                    diff.base.map_or("(unset)".to_string(), |v| v.to_string()),
                    diff.other.map_or("(unset)".to_string(), |v| v.to_string()),
                );
            }
        }

        Commands::Merge {
            base,
            targets,
            yes,
            dry_run,
        } => {
            let planner = merger.planner();
            let request = merger.plan_by_name(&base, &targets)?;

            if planner.needs_confirmation(&request) && !yes {
                warn!("Merge of {:?} needs confirmation", base);
                println!("The selected styles have different properties:");
                for target in planner.differences(&request)? {
                    println!("  {}", target.target.name);
                    for diff in target.differences {
                        println!(
                            "    {}: {} -> {}",
                            diff.property,
                            diff.base.map_or("(unset)".to_string(), |v| v.to_string()),
                            diff.other.map_or("(unset)".to_string(), |v| v.to_string()),
                        );
                    }
                }
                bail!("Re-run with --yes to merge anyway");
            }

            info!("Starting style merge...");
            let report = merger.executor().execute_request(&request);
            for merged in &report.merged {
                println!(
                    "Merged {} ({} element(s) repointed)",
                    merged.style, merged.elements_repointed
                );
            }

            for element in &report.unsettled {
                warn!("Element {} had a change time out; check its styles", element);
            }

            if dry_run {
                println!("Dry run: {} not modified", cli.site.display());
            } else {
                host.snapshot().save_to_file(&cli.site)?;
            }

            if !report.success {
                bail!(report
                    .error
                    .unwrap_or_else(|| "Failed to merge styles".to_string()));
            }
            println!("Styles merged successfully!");
        }

        Commands::Components => {
            for component in merger.components().list()? {
                println!("{}  [{}]", component.name, component.id);
            }
        }

        Commands::GenerateConfig { .. } | Commands::Scripts { .. } | Commands::ScriptStatus { .. } => {}
    }

    Ok(())
}
