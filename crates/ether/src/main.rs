//! Ether - install, remove and pin Swift package dependencies.

use clap::{Parser, Subcommand};
use commands::{Context, InstallOptions, Requirement};
use config::Configuration;
use ether_diagnostics::EtherError;
use miette::Result;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod metadata;
mod process;
mod prompt;

#[derive(Parser)]
#[command(name = "ether")]
#[command(version, about = "Manage Swift package dependencies from the command line", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct GlobalOptions {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress log output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Directory containing Package.swift (defaults to the current directory)
    #[arg(long, global = true)]
    project: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a package and attach its products to targets
    Install {
        /// Package name, owner/repo or repository URL
        name: String,
        /// Repository URL, skipping the catalog lookup
        #[arg(long)]
        url: Option<String>,
        /// Version to require (defaults to the latest release)
        #[arg(long)]
        version: Option<String>,
        /// Targets to attach the products to, comma separated
        #[arg(long, value_delimiter = ',')]
        targets: Option<Vec<String>>,
        /// Require exactly this version
        #[arg(long)]
        exact: bool,
        /// Accept a pre-release as the latest version
        #[arg(long)]
        pre: bool,
    },

    /// Remove a package and every target reference to it
    Remove {
        /// Resolved package name
        name: String,
    },

    /// Inspect or change dependency versions
    Version {
        #[command(subcommand)]
        action: VersionAction,
    },

    /// Update packages within their requirements
    Update,

    /// Search the package catalog
    Search {
        /// Name or owner to look for
        query: String,
        /// Maximum number of results
        #[arg(short = 'm', long, default_value = "20")]
        max_results: usize,
    },

    /// Show the configuration, or set a value with key:value
    Config {
        /// key:value to set; key: clears the key
        assignment: Option<String>,
    },
}

#[derive(Subcommand)]
enum VersionAction {
    /// Change the version requirement of one dependency
    Set {
        /// Resolved package name
        name: String,
        /// Version, branch, revision or range; `latest` for the newest release
        version: String,
        #[command(flatten)]
        requirement: RequirementFlags,
        /// Accept a pre-release as `latest`
        #[arg(long)]
        pre: bool,
    },

    /// Move every version-based dependency to its latest release
    Latest {
        /// Accept pre-releases
        #[arg(long)]
        pre: bool,
    },

    /// List every resolved package and its version
    All,
}

#[derive(clap::Args)]
#[group(required = false, multiple = false)]
struct RequirementFlags {
    /// .exact("<version>")
    #[arg(long)]
    exact: bool,
    /// from: "<version>"
    #[arg(long)]
    from: bool,
    /// .upToNextMajor(from: "<version>")
    #[arg(long)]
    up_to_next_major: bool,
    /// .upToNextMinor(from: "<version>")
    #[arg(long)]
    up_to_next_minor: bool,
    /// .branch("<version>")
    #[arg(long)]
    branch: bool,
    /// .revision("<version>")
    #[arg(long)]
    revision: bool,
    /// "<lower>"..<"<upper>" or "<lower>"..."<upper>"
    #[arg(long)]
    range: bool,
}

impl RequirementFlags {
    fn requirement(&self) -> Requirement {
        if self.exact {
            Requirement::Exact
        } else if self.from {
            Requirement::From
        } else if self.up_to_next_major {
            Requirement::UpToNextMajor
        } else if self.up_to_next_minor {
            Requirement::UpToNextMinor
        } else if self.branch {
            Requirement::Branch
        } else if self.revision {
            Requirement::Revision
        } else if self.range {
            Requirement::Range
        } else {
            Requirement::Keep
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup error handling
    ether_diagnostics::setup();

    let cli = Cli::parse();

    if cli.global.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    // Setup logging
    let log_level = match cli.global.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    if !cli.global.quiet {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    let root = match cli.global.project {
        Some(path) => path,
        None => std::env::current_dir()
            .map_err(|e| EtherError::Generic(format!("Cannot read the current directory: {}", e)))?,
    };

    let config_path = match Configuration::default_path() {
        Ok(path) => Some(path),
        Err(e) => {
            tracing::debug!("{}", e);
            None
        }
    };
    let config = match &config_path {
        Some(path) => Configuration::load_from(path).map_err(|e| EtherError::config(e.to_string()))?,
        None => Configuration::default(),
    };

    let ctx = Context {
        root,
        config,
        config_path,
    };

    match cli.command {
        Commands::Install {
            name,
            url,
            version,
            targets,
            exact,
            pre,
        } => {
            let options = InstallOptions {
                name,
                url,
                version,
                targets,
                exact,
                pre,
            };
            commands::install(&ctx, options).await?;
        }
        Commands::Remove { name } => {
            commands::remove(&ctx, &name).await?;
        }
        Commands::Version { action } => match action {
            VersionAction::Set {
                name,
                version,
                requirement,
                pre,
            } => {
                commands::version_set(&ctx, &name, &version, requirement.requirement(), pre).await?
            }
            VersionAction::Latest { pre } => commands::version_latest(&ctx, pre).await?,
            VersionAction::All => commands::version_all(&ctx).await?,
        },
        Commands::Update => {
            commands::update(&ctx).await?;
        }
        Commands::Search { query, max_results } => {
            commands::search(&ctx, &query, max_results).await?;
        }
        Commands::Config { assignment } => {
            commands::config(&ctx, assignment.as_deref()).await?;
        }
    }

    Ok(())
}
