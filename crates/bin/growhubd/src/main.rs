//! # growhubd — enclosure controller daemon
//!
//! Composition root that wires the control core to its adapters and runs it.
//!
//! ## Responsibilities
//! - Load configuration (`growhub.toml` + `GROWHUB_*` overrides)
//! - Initialize tracing
//! - Open the `SQLite` audit log and run migrations
//! - Build the output and sensor drivers, the control loop and the outbound
//!   writer
//! - Start the periodic tasks, the MQTT transport (when enabled) and the HTTP
//!   server
//! - On SIGINT/SIGTERM: stop every task, disengage every actuator, release the
//!   outputs, flush the outbound queue, mark the controller offline and only
//!   then close the MQTT session
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use growhub_adapter_http_axum::state::AppState;
use growhub_adapter_mqtt::MqttPublisher;
use growhub_adapter_storage_sqlite_sqlx::SqliteAuditLog;
use growhub_adapter_virtual::{Enclosure, VirtualOutputs, VirtualSensor};
use growhub_app::audit_writer::{AuditWriter, outbound_queue};
use growhub_app::control::control_loop;
use growhub_app::controller::ActuatorController;
use growhub_app::dispatcher::CommandDispatcher;
use growhub_app::ports::StatePublisher;
use growhub_app::scheduler::SyncScheduler;
use growhub_app::snapshot_bus::SnapshotBus;
use growhub_domain::time::now;
use tokio_util::sync::CancellationToken;

use crate::config::Config;

/// Buffered snapshots per SSE subscriber.
const SNAPSHOT_BUS_CAPACITY: usize = 16;

/// Grace period for in-flight HTTP requests once shutdown starts.
const HTTP_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("loading configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.logging.filter))
        .init();

    // Database
    let db = growhub_adapter_storage_sqlite_sqlx::Config {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await
    .context("opening audit database")?;
    let audit_log = Arc::new(SqliteAuditLog::new(db.pool().clone()));

    // Drivers
    let enclosure = Enclosure::new(config.simulation, config.outputs);
    let sensor = Arc::new(VirtualSensor::new(enclosure.clone()));
    let controller = ActuatorController::new(VirtualOutputs::new(enclosure), config.outputs);

    // Publication
    let snapshots = SnapshotBus::new(SNAPSHOT_BUS_CAPACITY);
    let (mqtt_publisher, mqtt_listener) = if config.mqtt.enabled {
        let (publisher, listener) = growhub_adapter_mqtt::connect(&config.mqtt.connection);
        tracing::info!(
            broker = %config.mqtt.connection.broker_host,
            port = config.mqtt.connection.broker_port,
            device = %config.mqtt.connection.device_id,
            "mqtt transport enabled"
        );
        (Some(publisher), Some(listener))
    } else {
        (None, None)
    };
    let publisher: Arc<(SnapshotBus, Option<MqttPublisher>)> =
        Arc::new((snapshots.clone(), mqtt_publisher));

    // Control core
    let (outbound, receiver) = outbound_queue(config.control.channel_capacity);
    let writer = tokio::spawn(
        AuditWriter::new(receiver, Arc::clone(&audit_log), Arc::clone(&publisher)).run(),
    );

    let mut dispatcher = CommandDispatcher::new(controller, config.dispatcher_config()?, outbound);
    dispatcher
        .initialize(now())
        .context("initialising output lines")?;

    let cancel = CancellationToken::new();
    let (handle, control) =
        control_loop(dispatcher, config.control.channel_capacity, cancel.clone());
    let control = tokio::spawn(control.run());

    let periodic = SyncScheduler::new(
        handle.clone(),
        sensor,
        Arc::clone(&publisher),
        Arc::clone(&audit_log),
        config.scheduler_config(),
        cancel.clone(),
    )
    .spawn();

    // stopped last so the final publications still reach the broker
    let mqtt_cancel = CancellationToken::new();
    let listener_task = mqtt_listener
        .map(|listener| tokio::spawn(listener.run(handle.clone(), mqtt_cancel.clone())));

    // HTTP
    let state = AppState::new(handle, Arc::clone(&audit_log), snapshots);
    let app = growhub_adapter_http_axum::router::build(state);

    let bind_addr = config.bind_addr();
    let tcp = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    tracing::info!(address = %bind_addr, "growhubd listening");

    let server = axum::serve(tcp, app)
        .with_graceful_shutdown(shutdown_signal(cancel.clone()))
        .into_future();
    // open SSE streams never finish on their own
    let drain = async {
        cancel.cancelled().await;
        tokio::time::sleep(HTTP_DRAIN_TIMEOUT).await;
    };
    tokio::select! {
        result = server => result.context("serving http")?,
        () = drain => tracing::warn!("http connections still open, closing them"),
    }

    // Shutdown
    cancel.cancel();
    for task in periodic {
        let _ = task.await;
    }
    let controller = control.await.context("control loop panicked")?;
    if let Err(err) = controller.release() {
        tracing::error!(error = %err, "could not release output lines");
    }

    // the dispatcher held the last queue producer
    let _ = writer.await;
    if !matches!(
        tokio::time::timeout(config.publish_timeout(), publisher.mark_offline()).await,
        Ok(Ok(()))
    ) {
        tracing::warn!("could not mark the controller offline");
    }
    mqtt_cancel.cancel();
    if let Some(task) = listener_task {
        let _ = task.await;
    }
    db.close().await;

    tracing::info!("shutdown complete");
    Ok(())
}

/// Resolve on SIGINT, SIGTERM or an internal cancellation.
async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "could not listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "could not listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let signal = tokio::select! {
        () = ctrl_c => "SIGINT",
        () = terminate => "SIGTERM",
        () = cancel.cancelled() => "cancelled",
    };
    tracing::warn!(signal, "shutting down, disengaging every actuator");
    cancel.cancel();
}
