use std::fs::File;
use std::io::{BufReader, Read};

use silhouette_bridge_common::capture::CaptureRecord;
use tracing::debug;

use super::{Sensor, SensorError};

/// Plays back a file of concatenated [`CaptureRecord`]s.
pub struct ReplaySensor<R: Read + Send = BufReader<File>> {
    name: String,
    reader: R,
    pending: Option<CaptureRecord>,
    width: usize,
    height: usize,
}

impl ReplaySensor {
    pub fn open(path: &str) -> Result<Self, SensorError> {
        let file = File::open(path).map_err(|e| SensorError::Open(path.to_string(), e))?;
        Self::from_reader(path, BufReader::new(file))
    }
}

impl<R: Read + Send> ReplaySensor<R> {
    /// Reads ahead one record to learn the frame dimensions; a capture whose
    /// first record carries no depth frame reports 0x0.
    pub fn from_reader(name: &str, mut reader: R) -> Result<Self, SensorError> {
        let first =
            CaptureRecord::read_from(&mut reader)?.ok_or_else(|| SensorError::Empty(name.to_string()))?;
        let (width, height) = first
            .frame
            .as_ref()
            .map_or((0, 0), |f| (f.width(), f.height()));
        Ok(Self {
            name: format!("replay:{name}"),
            reader,
            pending: Some(first),
            width,
            height,
        })
    }
}

impl<R: Read + Send> Sensor for ReplaySensor<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn next_record(&mut self) -> Result<Option<CaptureRecord>, SensorError> {
        if let Some(first) = self.pending.take() {
            return Ok(Some(first));
        }
        let record = CaptureRecord::read_from(&mut self.reader)?;
        if let Some(r) = &record {
            debug!(seq = r.seq, subjects = r.subjects.len(), "replayed capture record");
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use silhouette_bridge_common::frame::DepthFrame;
    use std::io::Cursor;

    fn record(seq: u64, frame: Option<DepthFrame>) -> CaptureRecord {
        CaptureRecord {
            captured_at_ms: 1_700_000_000_000 + seq as i64,
            seq,
            subjects: Vec::new(),
            frame,
        }
    }

    #[test]
    fn plays_every_record_in_order() {
        let mut buf = Vec::new();
        for seq in 0..3 {
            record(seq, Some(DepthFrame::empty(8, 6))).write_to(&mut buf).unwrap();
        }
        let mut sensor = ReplaySensor::from_reader("mem", Cursor::new(buf)).unwrap();
        assert_eq!(sensor.dimensions(), (8, 6));
        assert_eq!(sensor.name(), "replay:mem");

        let seqs: Vec<u64> = std::iter::from_fn(|| sensor.next_record().unwrap())
            .map(|r| r.seq)
            .collect();
        assert_eq!(seqs, vec![0, 1, 2]);
    }

    #[test]
    fn empty_capture_is_rejected() {
        let result = ReplaySensor::from_reader("mem", Cursor::new(Vec::new()));
        assert!(matches!(result, Err(SensorError::Empty(_))));
    }

    #[test]
    fn corrupt_tail_surfaces_as_error() {
        let mut buf = Vec::new();
        record(0, None).write_to(&mut buf).unwrap();
        buf.extend_from_slice(&[0x01, 0x00, 0x00]);
        let mut sensor = ReplaySensor::from_reader("mem", Cursor::new(buf)).unwrap();
        assert_eq!(sensor.dimensions(), (0, 0));
        assert!(sensor.next_record().unwrap().is_some());
        assert!(matches!(sensor.next_record(), Err(SensorError::Capture(_))));
    }
}
