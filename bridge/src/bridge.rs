use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};

use silhouette_bridge_common::frame::DepthFrame;
use silhouette_bridge_common::protocol::{HeadPosition, Notification};
use silhouette_bridge_common::skeleton::{estimate_head, first_tracked, SkeletonPoint, TrackedSubject};
use tracing::{debug, trace};

use crate::publish::writer::LineWriter;
use crate::sensor::mapper::CoordinateMapper;
use crate::session::Session;

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("failed to write notification: {0}")]
    Output(#[from] std::io::Error),
}

/// Shared state behind the skeleton and depth event sources.
///
/// Lock order: session, then subjects, then writer.
pub struct Bridge<W: Write + Send> {
    session: Mutex<Session>,
    subjects: Mutex<Vec<TrackedSubject>>,
    writer: Arc<LineWriter<W>>,
    mapper: Arc<dyn CoordinateMapper>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl<W: Write + Send> Bridge<W> {
    pub fn new(session: Session, writer: Arc<LineWriter<W>>, mapper: Arc<dyn CoordinateMapper>) -> Self {
        Self {
            session: Mutex::new(session),
            subjects: Mutex::new(Vec::new()),
            writer,
            mapper,
        }
    }

    pub fn announce(&self, notification: &Notification) -> Result<(), BridgeError> {
        self.writer.emit(notification)?;
        Ok(())
    }

    /// Skeleton event: remember the slots, then emit the head position or,
    /// with nobody tracked, take the empty-outline path.
    pub fn handle_skeleton(&self, subjects: Vec<TrackedSubject>) -> Result<(), BridgeError> {
        let head = first_tracked(&subjects).map(|s| estimate_head(s).and_then(|p| self.project_head(p)));
        *lock(&self.subjects) = subjects;

        match head {
            None => {
                let mut session = lock(&self.session);
                if let Some(n) = session.clear() {
                    self.writer.emit(&n)?;
                }
            }
            Some(Some(position)) => self.writer.emit(&Notification::Head(position))?,
            Some(None) => trace!("tracked subject without a projectable head"),
        }
        Ok(())
    }

    /// Depth event: extract and publish the outline for `frame`.
    pub fn handle_depth(&self, frame: Option<&DepthFrame>) -> Result<(), BridgeError> {
        let mut session = lock(&self.session);
        let outline = {
            let subjects = lock(&self.subjects);
            session.process_frame(frame, &subjects)
        };

        // wire order must match publication order: write under the session lock
        if let Some(n) = outline {
            self.writer.emit(&n)?;
        }
        if let Some(n) = session.silhouette(frame) {
            self.writer.emit(&n)?;
        }
        Ok(())
    }

    /// The sensor stream ended; retract whatever is still on the wire.
    pub fn finish_stream(&self) -> Result<(), BridgeError> {
        lock(&self.subjects).clear();
        let mut session = lock(&self.session);
        if let Some(n) = session.process_frame(None, &[]) {
            self.writer.emit(&n)?;
        }
        if let Some(n) = session.silhouette(None) {
            self.writer.emit(&n)?;
        }
        debug!("sensor stream finished");
        Ok(())
    }

    fn project_head(&self, p: SkeletonPoint) -> Option<HeadPosition> {
        let (x, y) = self.mapper.skeleton_to_depth(p);
        if !x.is_finite() || !y.is_finite() || !p.z.is_finite() {
            return None;
        }
        Some(HeadPosition {
            x: x.round() as i32,
            y: y.round() as i32,
            z: p.z,
        })
    }
}
