//! cardwatch command-line interface

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cardwatch::{
    AliasResolver, AliasStore, CardMonitor, ConditionSink, Config, PcscConnector, ResolvePolicy,
    Watcher, batch_channel,
};

#[derive(Parser)]
#[command(
    version,
    about = "Watch smart-card readers and publish card aliases to a condition document"
)]
struct Cli {
    /// Trace level output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available readers
    List,

    /// Watch readers and publish the card alias on removal
    Watch {
        /// Path to the JSON alias store
        #[arg(long)]
        aliases: Option<PathBuf>,

        /// Path to the condition XML document (per-OS default if omitted)
        #[arg(long)]
        conditions: Option<PathBuf>,

        /// Value written to the condition id attribute
        #[arg(long)]
        id: Option<String>,

        /// Prompt for a name when an unknown card is inserted
        #[arg(long, conflicts_with = "silent")]
        register: bool,

        /// Do not log a notice for unknown cards
        #[arg(long)]
        silent: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    match cli.command {
        Commands::List => list_readers()?,
        Commands::Watch {
            aliases,
            conditions,
            id,
            register,
            silent,
        } => {
            let policy = if register {
                ResolvePolicy::InteractiveRegister
            } else if silent {
                ResolvePolicy::SilentDefault
            } else {
                ResolvePolicy::ReadOnly
            };

            let mut config = Config::new().with_policy(policy);
            if let Some(path) = aliases {
                config = config.with_alias_path(path);
            }
            if let Some(path) = conditions {
                config = config.with_condition_path(path);
            }
            if let Some(id) = id {
                config = config.with_condition_id(id);
            }

            watch(config)?;
        }
    }

    Ok(())
}

fn list_readers() -> cardwatch::Result<()> {
    let connector = PcscConnector::new()?;
    let readers = connector.list_readers()?;

    println!("Available readers:");
    for (i, reader) in readers.iter().enumerate() {
        let status = if reader.has_card() {
            "card present"
        } else {
            "no card"
        };
        println!("{}. {} ({})", i + 1, reader.name(), status);
    }

    Ok(())
}

fn watch(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    // A broken store is reported but never fatal; the watcher starts empty
    let store = match AliasStore::load(&config.alias_path) {
        Ok(store) => store,
        Err(e) => {
            warn!(error = %e, path = %config.alias_path.display(), "could not load alias store, starting empty");
            AliasStore::new()
        }
    };
    info!(
        aliases = store.len(),
        path = %config.alias_path.display(),
        "alias store loaded"
    );

    let connector = PcscConnector::new()?;
    let monitor = CardMonitor::create()?;
    let (sender, receiver) = batch_channel();
    monitor.watch_channel(sender)?;

    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    ctrlc::set_handler(move || {
        flag.store(false, Ordering::SeqCst);
    })?;

    let resolver = AliasResolver::new(config.policy, config.alias_path.clone());
    let sink = ConditionSink::new(&config.condition_path).with_id(&config.condition_id);

    info!(
        conditions = %config.condition_path.display(),
        "watching for card events, Ctrl+C to exit"
    );

    let mut watcher = Watcher::new(connector, store, resolver, sink);
    watcher.run(&receiver, &running);

    monitor.stop();
    info!("monitor stopped");

    Ok(())
}

fn setup_logging(verbose: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .with_ansi(true)
        .init();
}

/// Filter defaulting to INFO (DEBUG with `--verbose`); `RUST_LOG` overrides
fn env_filter(verbose: bool) -> EnvFilter {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Card insertion/removal outcomes are logged at INFO; the default filter
    // must let them through without RUST_LOG being set.
    #[test]
    fn default_filter_admits_info_events() {
        assert!(env_filter(false).to_string().contains("info"));
    }

    #[test]
    fn verbose_filter_admits_debug_events() {
        assert!(env_filter(true).to_string().contains("debug"));
    }
}
