//! Energy Wastage Core - Main Entry Point

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use energy_wastage_core::constants::{APP_NAME, APP_VERSION};
use energy_wastage_core::logic::dataset::HistoricalDataset;
use energy_wastage_core::logic::features::FEATURE_LAYOUT;
use energy_wastage_core::logic::pipeline::Pipeline;
use energy_wastage_core::logic::transport::{StdioTransport, Transport, TransportError};
use energy_wastage_core::{AppError, AppResult, Classifier, Config, ModelTrainer};

/// Grace period for the transport to flush after the pipeline stops
const TRANSPORT_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // One pipeline task plus the transport; a single thread is enough
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("Failed to start async runtime: {}", e);
            std::process::exit(1);
        }
    };

    let result = runtime.block_on(run());
    // A blocked stdin read must not hold the process open
    runtime.shutdown_timeout(Duration::from_secs(1));

    if let Err(e) = result {
        log::error!("{}", e);
        if let AppError::Training(err) = &e {
            if err.is_data_format() {
                log::error!("Expected columns: {}", FEATURE_LAYOUT.join(", "));
            }
        }
        std::process::exit(e.exit_code());
    }
}

async fn run() -> AppResult<()> {
    log::info!("Starting {} v{}...", APP_NAME, APP_VERSION);

    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    log::info!(
        "Dataset: {} ({}), topics: {} -> {}",
        config.dataset_path.display(),
        config.dataset_format,
        config.input_topic,
        config.output_topic
    );

    // Training must finish before any reading is served
    let classifier = Arc::new(Classifier::new());
    {
        let dataset = HistoricalDataset::load(&config.dataset_path, config.dataset_format)?;
        let (model, report) = ModelTrainer::new(config.trainer_config()).fit(&dataset)?;
        log::info!(
            "Training finished in {}ms, wastage cluster = {}",
            report.duration_ms,
            report.wastage_cluster
        );
        classifier.install(model)?;
    }

    let (in_tx, in_rx) = mpsc::channel(config.channel_capacity);
    let (out_tx, out_rx) = mpsc::channel(config.channel_capacity);

    let transport = StdioTransport::stdio(config.input_topic.as_str());
    log::info!("Transport: {}", transport.name());
    let mut transport_handle = transport.spawn(in_tx, out_rx);

    let pipeline = Pipeline::new(Arc::clone(&classifier), config.topics());
    pipeline.run(in_rx, out_tx, shutdown_signal()).await?;

    // Outbound is closed now; let the writer drain, then give up on stdin
    match tokio::time::timeout(TRANSPORT_DRAIN_TIMEOUT, &mut transport_handle).await {
        Ok(joined) => joined.map_err(TransportError::from)??,
        Err(_) => {
            log::debug!("Transport still reading input, aborting it");
            transport_handle.abort();
        }
    }

    log::info!("{} stopped", APP_NAME);
    Ok(())
}

/// Resolves on SIGINT or SIGTERM (Ctrl-C only off Unix)
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => log::info!("Shutdown signal received (SIGTERM)"),
                    _ = tokio::signal::ctrl_c() => log::info!("Shutdown signal received (SIGINT)"),
                }
            }
            Err(e) => {
                log::warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
                log::info!("Shutdown signal received (SIGINT)");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        log::info!("Shutdown signal received (Ctrl-C)");
    }
}
