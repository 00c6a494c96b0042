//! fleetwatch - fleet status aggregator
//!
//! Polls a fixed set of peer agents for health, recent knowledge
//! exchanges and shared tasks, and publishes one consistent snapshot of
//! the fleet per aggregation round, together with the mesh topology
//! derived from it.

mod api;
mod cli;
mod collector;
mod config;
mod error;
mod logging;
mod monitor;
mod peer;
mod protocol;
mod scheduler;
mod transport;
mod types;
mod version;

use std::sync::Arc;

use clap::Parser;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use crate::cli::{Cli, Commands, ConfigSubcommand};
use crate::config::FleetwatchConfig;
use crate::error::{Error, Result};
use crate::monitor::FleetMonitor;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = dispatch(cli) {
        eprint!("{}", e.format_for_terminal());
        std::process::exit(e.exit_code());
    }
}

fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Version { json } => version::print_version(json),
        Commands::Config { subcommand } => {
            logging::init_simple(tracing::Level::WARN)?;
            handle_config_command(subcommand)
        }
        Commands::Snapshot {
            config,
            peers,
            topology,
            pretty,
        } => {
            let config = FleetwatchConfig::load(config.as_deref())?;
            // Keep stderr quiet unless asked; the JSON goes to stdout
            let verbose = cli.verbose;
            let quiet = cli.quiet || verbose == 0;
            let _log_guards = logging::init_logging(&config.logging, verbose, quiet)?;

            let runtime = build_runtime(1)?;
            runtime.block_on(print_snapshot(config, peers, topology, pretty))
        }
        Commands::Run {
            config,
            listen,
            interval_ms,
            no_auto_refresh,
        } => {
            let mut config = FleetwatchConfig::load(config.as_deref())?;
            apply_run_overrides(&mut config, listen, interval_ms, no_auto_refresh)?;

            let _log_guards = logging::init_logging(&config.logging, cli.verbose, cli.quiet)?;

            let build = version::build_info();
            info!(
                version = %build.full_version(),
                target = %build.target,
                profile = %build.profile,
                "Starting fleetwatch"
            );

            let runtime = build_runtime(num_cpus::get().min(4))?;
            runtime.block_on(run_aggregator(config)).map_err(|e| {
                error!(error = %e.format_for_log(), "Aggregator stopped");
                e
            })
        }
    }
}

fn build_runtime(worker_threads: usize) -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(worker_threads.max(1))
        .thread_name("fleetwatch")
        .build()
        .map_err(|e| Error::Internal(format!("Failed to create async runtime: {}", e)))
}

/// Fold `run` flags into the loaded configuration and re-validate
fn apply_run_overrides(
    config: &mut FleetwatchConfig,
    listen: Option<String>,
    interval_ms: Option<u64>,
    no_auto_refresh: bool,
) -> Result<()> {
    if let Some(addr) = listen {
        config.api.enabled = true;
        config.api.listen_addr = addr;
    }
    if let Some(ms) = interval_ms {
        config.aggregator.interval_ms = ms;
    }
    if no_auto_refresh {
        config.aggregator.auto_refresh = false;
    }

    config.validate()
}

// ─────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────

/// Run one round and print the result
async fn print_snapshot(
    config: FleetwatchConfig,
    extra_peers: Vec<String>,
    topology: bool,
    pretty: bool,
) -> Result<()> {
    let monitor = FleetMonitor::from_config(&config)?;
    for address in &extra_peers {
        let id = monitor.add_peer(address, address, "")?;
        debug!(peer_id = %id, address = %address, "Added peer from command line");
    }

    let snapshot = monitor.refresh_now().await;
    let value = if topology {
        serde_json::to_value(monitor.topology())?
    } else {
        serde_json::to_value(snapshot.as_ref())?
    };

    let output = if pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    println!("{}", output);
    Ok(())
}

/// Aggregate until Ctrl+C
async fn run_aggregator(config: FleetwatchConfig) -> Result<()> {
    let monitor = Arc::new(FleetMonitor::from_config(&config)?);

    if !monitor.has_peers() {
        warn!("No peers configured; snapshots will be empty");
    }
    info!(
        peers = monitor.peer_count(),
        auto_refresh = config.aggregator.auto_refresh,
        interval_ms = config.aggregator.interval_ms,
        primary_peer = config.aggregator.primary_peer.as_deref().unwrap_or("(first)"),
        "Configuration loaded"
    );

    let mut snapshots = monitor.subscribe();

    if config.aggregator.auto_refresh {
        monitor.set_auto_refresh(true, config.aggregator.refresh_interval())?;
    } else {
        monitor.trigger_refresh();
    }

    // Query API
    let (api_stop_tx, api_stop_rx) = oneshot::channel::<()>();
    let api_handle = config.api.enabled.then(|| {
        let monitor = monitor.clone();
        let addr = config.api.listen_addr.clone();
        tokio::spawn(async move {
            let shutdown = async move {
                let _ = api_stop_rx.await;
            };
            api::serve(monitor, &addr, shutdown).await
        })
    });
    let mut api_done = api_handle.is_none();
    let api_task = async move {
        match api_handle {
            Some(handle) => handle.await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(api_task);

    let shutdown_signal = tokio::signal::ctrl_c();
    tokio::pin!(shutdown_signal);

    info!("Aggregator running");

    let result = loop {
        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Shutdown signal received");
                break Ok(());
            }

            changed = snapshots.changed() => {
                if changed.is_err() {
                    break Err(Error::Internal("snapshot channel closed".into()));
                }
                let snapshot = snapshots.borrow_and_update().clone();
                let down: Vec<&str> = snapshot
                    .peers
                    .iter()
                    .filter(|p| !p.reachable)
                    .map(|p| p.peer_id.as_str())
                    .collect();
                if !down.is_empty() {
                    warn!(round = snapshot.round, peers = ?down, "Peers unreachable");
                }
            }

            joined = &mut api_task, if !api_done => {
                api_done = true;
                match joined {
                    Ok(Ok(())) => debug!("Query API exited"),
                    Ok(Err(e)) => break Err(e),
                    Err(e) => break Err(Error::Internal(format!("query API task failed: {}", e))),
                }
            }
        }
    };

    let _ = api_stop_tx.send(());
    if !api_done {
        match api_task.await {
            Ok(Err(e)) => warn!(error = %e, "Query API stopped with error"),
            Err(e) => warn!(error = %e, "Query API task failed"),
            Ok(Ok(())) => {}
        }
    }

    monitor.shutdown().await;
    info!("fleetwatch stopped");

    result
}

fn handle_config_command(subcommand: ConfigSubcommand) -> Result<()> {
    match subcommand {
        ConfigSubcommand::Show { config } => {
            let cfg = FleetwatchConfig::load(config.as_deref())?;
            println!("{}", toml::to_string_pretty(&cfg)?);
        }
        ConfigSubcommand::Init { path, force } => {
            let written = config::init_config(path.as_deref(), force)?;
            println!("Configuration written to {}", written.display());
        }
        ConfigSubcommand::Validate { config } => {
            let cfg = FleetwatchConfig::load(config.as_deref())?;
            println!("Configuration is valid ({} peers).", cfg.peers.len());
        }
    }

    Ok(())
}
