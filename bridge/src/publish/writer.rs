use std::io::Write;
use std::sync::Mutex;

use silhouette_bridge_common::protocol::Notification;

/// Serializes notifications onto one output so concurrent producers never
/// interleave partial lines.
pub struct LineWriter<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> LineWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Render `notification` and write it as one newline-terminated line.
    pub fn emit(&self, notification: &Notification) -> std::io::Result<()> {
        let mut line = notification.to_string();
        line.push('\n');
        // poisoning leaves the sink usable
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        out.write_all(line.as_bytes())?;
        out.flush()
    }

    #[cfg(test)]
    pub(crate) fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}
