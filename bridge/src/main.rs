mod bridge;
mod outline;
mod publish;
mod sensor;
mod session;

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bridge::{Bridge, BridgeError};
use publish::writer::LineWriter;
use sensor::mapper::{CoordinateMapper, PinholeMapper};
use sensor::record::CaptureRecorder;
use sensor::Sensor;
use session::Session;
use silhouette_bridge_common::capture::CaptureRecord;
use silhouette_bridge_common::config::Config;
use silhouette_bridge_common::frame::DepthFrame;
use silhouette_bridge_common::protocol::Notification;
use silhouette_bridge_common::skeleton::TrackedSubject;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Ticks buffered per event source before the pump starts dropping.
const EVENT_QUEUE_DEPTH: usize = 4;

type StdoutBridge = Bridge<std::io::Stdout>;

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

    // stdout carries the protocol, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.parse().unwrap_or_default()),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(
        mode = config.sensor.mode,
        fps = config.sensor.fps,
        stride = config.outline.stride,
        max_points = config.outline.max_points,
        include_depth = config.outline.include_depth,
        silhouette = config.silhouette.enabled,
        "starting silhouette bridge"
    );

    let writer = Arc::new(LineWriter::new(std::io::stdout()));

    let sensor = match sensor::open(&config.sensor) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "no compatible sensor found");
            if let Err(e) = writer.emit(&Notification::NoSensor) {
                error!(error = %e, "failed to write to stdout");
                std::process::exit(1);
            }
            info!("press Enter to exit");
            // unreadable stdin counts as exit too
            operator_exit().await.ok();
            return;
        }
    };

    let (width, height) = match sensor.dimensions() {
        (0, 0) => (config.sensor.width, config.sensor.height),
        dims => dims,
    };
    let mapper: Arc<dyn CoordinateMapper> = Arc::new(PinholeMapper::for_frame(width, height));
    let session = Session::new(
        width,
        height,
        &config.outline,
        &config.silhouette,
        Arc::clone(&mapper),
    );
    let bridge = Arc::new(Bridge::new(session, writer, mapper));

    if let Err(e) = bridge.announce(&Notification::Ready) {
        error!(error = %e, "failed to write to stdout");
        std::process::exit(1);
    }

    let recorder = if config.sensor.record_path.is_empty() {
        None
    } else {
        match CaptureRecorder::create(&config.sensor.record_path) {
            Ok(r) => {
                info!(path = config.sensor.record_path, "recording sensor ticks");
                Some(r)
            }
            Err(e) => {
                error!(error = %e, "failed to open record file");
                std::process::exit(1);
            }
        }
    };

    let (skeleton_tx, skeleton_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
    let (depth_tx, depth_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
    let (fatal_tx, mut fatal_rx) = mpsc::channel::<BridgeError>(1);

    let tick = Duration::from_secs_f64(1.0 / config.sensor.fps);
    let pump = tokio::spawn(run_pump(sensor, tick, recorder, skeleton_tx, depth_tx));
    let skeleton = tokio::spawn(run_skeleton_events(
        Arc::clone(&bridge),
        skeleton_rx,
        fatal_tx.clone(),
    ));
    let depth = tokio::spawn(run_depth_events(Arc::clone(&bridge), depth_rx, fatal_tx));

    info!("bridge running, press Enter to exit");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("interrupted"),
        _ = operator_exit() => info!("operator requested exit"),
        Some(e) = fatal_rx.recv() => {
            error!(error = %e, "output channel failed");
            std::process::exit(1);
        }
    }

    pump.abort();
    skeleton.abort();
    depth.abort();
    if let Err(e) = bridge.finish_stream() {
        warn!(error = %e, "failed to retract outline on exit");
    }
    info!("silhouette bridge stopped");
}

/// Resolves once the operator presses Enter or stdin reaches EOF.
///
/// Reads on a plain thread so a pending read never holds up runtime shutdown.
fn operator_exit() -> oneshot::Receiver<()> {
    let (tx, rx) = oneshot::channel();
    std::thread::spawn(move || {
        let mut line = String::new();
        if let Err(e) = std::io::stdin().lock().read_line(&mut line) {
            debug!(error = %e, "stdin read failed");
        }
        tx.send(()).ok();
    });
    rx
}

/// Reads sensor ticks at the configured rate and fans them out to the
/// skeleton and depth handlers. Ticks are dropped, not queued, when a
/// handler falls behind.
async fn run_pump(
    mut sensor: Box<dyn Sensor>,
    tick: Duration,
    mut recorder: Option<CaptureRecorder>,
    skeleton_tx: mpsc::Sender<Vec<TrackedSubject>>,
    depth_tx: mpsc::Sender<Option<DepthFrame>>,
) {
    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut ticks: u64 = 0;
    let mut dropped: u64 = 0;

    loop {
        interval.tick().await;
        let record = match sensor.next_record() {
            Ok(Some(r)) => r,
            Ok(None) => {
                info!(sensor = sensor.name(), ticks, dropped, "sensor stream ended");
                break;
            }
            Err(e) => {
                error!(sensor = sensor.name(), error = %e, "sensor read failed");
                break;
            }
        };

        if let Some(r) = recorder.as_mut() {
            if let Err(e) = r.append(&record) {
                warn!(error = %e, written = r.written(), "recording failed, disabling");
                recorder = None;
            }
        }

        let CaptureRecord { seq, subjects, frame, .. } = record;
        match (forward(&skeleton_tx, subjects), forward(&depth_tx, frame)) {
            (Err(()), _) | (_, Err(())) => break,
            (Ok(true), Ok(true)) => {}
            _ => {
                dropped += 1;
                debug!(seq, dropped, "handler busy, tick dropped");
            }
        }
        ticks += 1;
    }
}

/// `Ok(false)` when the queue is full, `Err` once the receiver is gone.
fn forward<T>(tx: &mpsc::Sender<T>, value: T) -> Result<bool, ()> {
    match tx.try_send(value) {
        Ok(()) => Ok(true),
        Err(TrySendError::Full(_)) => Ok(false),
        Err(TrySendError::Closed(_)) => Err(()),
    }
}

async fn run_skeleton_events(
    bridge: Arc<StdoutBridge>,
    mut rx: mpsc::Receiver<Vec<TrackedSubject>>,
    fatal: mpsc::Sender<BridgeError>,
) {
    while let Some(subjects) = rx.recv().await {
        if let Err(e) = bridge.handle_skeleton(subjects) {
            fatal.send(e).await.ok();
            return;
        }
    }
}

async fn run_depth_events(
    bridge: Arc<StdoutBridge>,
    mut rx: mpsc::Receiver<Option<DepthFrame>>,
    fatal: mpsc::Sender<BridgeError>,
) {
    while let Some(frame) = rx.recv().await {
        if let Err(e) = bridge.handle_depth(frame.as_ref()) {
            fatal.send(e).await.ok();
            return;
        }
    }
    if let Err(e) = bridge.finish_stream() {
        fatal.send(e).await.ok();
    }
}
