// SPDX-License-Identifier: MIT

//! `lightschedd`: the cluster controller binary. Wires the state store, the
//! live node cache, the scheduler, and the two HTTP listeners together, then
//! runs until asked to stop.

use clap::Parser;
use lightsched_controller::http::{client_api, node_api, AppState};
use lightsched_controller::{Cli, Config, ControlLoopConfig, CycleCounter, DirtyFlag, NodeCache};
use lightsched_core::{ResourceSet, SystemClock};
use lightsched_storage::{workspace::ensure_data_path, JobWorkspace, KvStore, StateStore};
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = match Config::load(&cli) {
        Ok(c) => c,
        Err(err) => {
            eprintln!("lightschedd: {err}");
            std::process::exit(1);
        }
    };

    init_logging(config.log_dir.as_deref());

    if let Err(err) = ensure_data_path(&config.data_dir) {
        tracing::error!(error = %err, "failed to create data directory");
        std::process::exit(1);
    }

    let db_path = config.data_dir.join("lightsched.db");
    let kv = match KvStore::open(&db_path) {
        Ok(kv) => kv,
        Err(err) => {
            tracing::error!(error = %err, "failed to open state database");
            std::process::exit(1);
        }
    };
    let store = StateStore::new(kv, SystemClock);
    if let Err(err) = store.bootstrap() {
        tracing::error!(error = %err, "failed to bootstrap state store");
        std::process::exit(1);
    }
    let store = Arc::new(store);

    let cache = Arc::new(NodeCache::new(config.outbox_shard_count));
    let dirty = Arc::new(DirtyFlag::new());
    let cycles = Arc::new(CycleCounter::new());
    let workspace = Arc::new(JobWorkspace::new(config.data_dir.join("jobs")));
    let reserved = ResourceSet {
        memory: config.reserved_memory_mib,
        ..ResourceSet::zero().with_cpu_cores(config.reserved_cores)
    };

    let state = AppState {
        store: store.clone(),
        cache: cache.clone(),
        dirty: dirty.clone(),
        cycles: cycles.clone(),
        workspace,
        reserved,
    };

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let loop_config = ControlLoopConfig {
        offline_threshold_secs: config.offline_threshold_secs,
        ..ControlLoopConfig::default()
    };
    let control_loop = tokio::spawn(lightsched_controller::control_loop::run(
        store.clone(),
        cache.clone(),
        dirty.clone(),
        cycles.clone(),
        loop_config,
        shutdown_rx.clone(),
    ));

    let client_router = client_api::router::<SystemClock>().with_state(state.clone());
    let node_router = node_api::router::<SystemClock>().with_state(state.clone());

    let client_listener = match tokio::net::TcpListener::bind(config.client_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(addr = %config.client_addr, error = %err, "failed to bind client API listener");
            std::process::exit(1);
        }
    };
    let node_listener = match tokio::net::TcpListener::bind(config.node_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(addr = %config.node_addr, error = %err, "failed to bind node API listener");
            std::process::exit(1);
        }
    };

    tracing::info!(client_addr = %config.client_addr, node_addr = %config.node_addr, "lightschedd starting");

    let mut client_shutdown = shutdown_rx.clone();
    let client_server = tokio::spawn(async move {
        axum::serve(client_listener, client_router)
            .with_graceful_shutdown(async move {
                let _ = client_shutdown.changed().await;
            })
            .await
    });

    let mut node_shutdown = shutdown_rx.clone();
    let node_server = tokio::spawn(async move {
        axum::serve(node_listener, node_router)
            .with_graceful_shutdown(async move {
                let _ = node_shutdown.changed().await;
            })
            .await
    });

    if tokio::signal::ctrl_c().await.is_err() {
        tracing::warn!("failed to install ctrl-c handler, running without graceful shutdown");
    }
    tracing::info!("shutdown requested");
    let _ = shutdown_tx.send(true);

    let _ = tokio::join!(control_loop, client_server, node_server);
}

fn init_logging(log_dir: Option<&std::path::Path>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "lightschedd.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            // Leaked deliberately: the guard must outlive the process, and the
            // process never tears this down before exit.
            Box::leak(Box::new(guard));
            registry.with(tracing_subscriber::fmt::layer().with_writer(writer)).init();
        }
        None => {
            registry.with(tracing_subscriber::fmt::layer()).init();
        }
    }
}
