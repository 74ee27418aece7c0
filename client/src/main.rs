mod process;
mod state;

use std::path::PathBuf;

use process::BridgeProcess;
use silhouette_bridge_common::config::Config;
use state::{BridgeView, Change};
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() {
    let config_path = std::env::args().nth(1).map(PathBuf::from);

    let config = match Config::load_or_default(config_path.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.parse().unwrap_or_default()),
        )
        .init();

    let (bridge, mut notifications) = match BridgeProcess::spawn(&config.client) {
        Ok(p) => p,
        Err(e) => {
            error!(error = %e, "failed to start bridge");
            std::process::exit(1);
        }
    };

    let mut view = BridgeView::default();
    let outcome = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, stopping bridge");
                break Outcome::Interrupted;
            }
            next = notifications.next() => match next {
                Ok(Some(n)) => {
                    let change = view.apply(n);
                    if log_change(&view, change) {
                        break Outcome::NoSensor;
                    }
                }
                Ok(None) => break Outcome::Closed,
                Err(e) => {
                    error!(error = %e, "lost bridge output");
                    break Outcome::Closed;
                }
            },
        }
    };

    info!(
        ready = view.ready,
        skipped = notifications.skipped(),
        "closing bridge connection"
    );
    let result = match outcome {
        Outcome::NoSensor | Outcome::Interrupted => bridge.kill().await,
        Outcome::Closed => bridge.stop().await,
    };
    match result {
        Ok(status) => debug!(%status, "bridge exited"),
        Err(e) => warn!(error = %e, "bridge did not stop cleanly"),
    }
    if view.sensor_missing {
        std::process::exit(1);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Interrupted,
    NoSensor,
    Closed,
}

/// Returns true when the bridge reported that no sensor is available.
fn log_change(view: &BridgeView, change: Change) -> bool {
    match change {
        Change::Ready => info!("bridge ready"),
        Change::SensorMissing => {
            error!("bridge found no compatible sensor");
            return true;
        }
        Change::HeadMoved => {
            if let Some(h) = view.head {
                debug!(x = h.x, y = h.y, z = h.z, "head");
            }
        }
        Change::OutlineAppeared { points } => info!(points, "outline appeared"),
        Change::OutlineUpdated { points } => debug!(points, "outline updated"),
        Change::OutlineCleared => info!("outline cleared"),
        Change::SilhouetteUpdated { runs } => {
            if let Some(s) = &view.silhouette {
                debug!(runs, width = s.width, height = s.height, "silhouette updated");
            }
        }
        Change::SilhouetteCleared => debug!("silhouette cleared"),
        Change::Unchanged => {}
    }
    false
}
