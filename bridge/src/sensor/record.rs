use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};

use silhouette_bridge_common::capture::{CaptureError, CaptureRecord};

use super::SensorError;

/// Appends every tick to a capture file that [`super::replay::ReplaySensor`]
/// can play back later.
pub struct CaptureRecorder<W: Write + Send = BufWriter<File>> {
    out: W,
    written: u64,
}

impl CaptureRecorder {
    pub fn create(path: &str) -> Result<Self, SensorError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| SensorError::Open(path.to_string(), e))?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write + Send> CaptureRecorder<W> {
    pub fn new(out: W) -> Self {
        Self { out, written: 0 }
    }

    /// Each record is flushed so a killed process leaves whole records only.
    pub fn append(&mut self, record: &CaptureRecord) -> Result<(), CaptureError> {
        record.write_to(&mut self.out)?;
        self.out.flush()?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}
