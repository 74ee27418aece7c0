use std::io::{Read, Write};

use tracing::debug;

use crate::frame::{DepthFrame, DepthPixel};
use crate::skeleton::{Joint, JointState, SkeletonPoint, SubjectState, TrackedSubject, JOINT_COUNT};

/// One sensor tick: the skeleton slots plus the depth frame, if any.
///
/// Binary wire format (all integers big-endian):
///   [0]       version = 0x01
///   [1..9]    captured_at_ms  (i64, Unix millis)
///   [9..17]   seq             (u64)
///   [17..19]  width           (u16, 0 = no depth frame this tick)
///   [19..21]  height          (u16)
///   [21]      subject_count   (u8)
///   subjects: player_index u8, state u8, then 20 x (state u8, x f32, y f32, z f32)
///   pixels:   width * height x u16 packed depth samples
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureRecord {
    pub captured_at_ms: i64,
    pub seq: u64,
    pub subjects: Vec<TrackedSubject>,
    pub frame: Option<DepthFrame>,
}

const VERSION: u8 = 0x01;
const HEADER_SIZE: usize = 22;
const JOINT_SIZE: usize = 1 + 3 * 4;
const SUBJECT_SIZE: usize = 2 + JOINT_COUNT * JOINT_SIZE;

impl CaptureRecord {
    /// Fails when the frame dimensions or subject count do not fit the
    /// header fields.
    pub fn serialize(&self) -> Result<Vec<u8>, CaptureError> {
        let (width, height) = match &self.frame {
            Some(f) => (f.width(), f.height()),
            None => (0, 0),
        };
        let header_width = u16::try_from(width).map_err(|_| CaptureError::Oversized("width", width))?;
        let header_height =
            u16::try_from(height).map_err(|_| CaptureError::Oversized("height", height))?;
        let subject_count = u8::try_from(self.subjects.len())
            .map_err(|_| CaptureError::Oversized("subject count", self.subjects.len()))?;
        let mut buf = Vec::with_capacity(
            HEADER_SIZE + self.subjects.len() * SUBJECT_SIZE + width * height * 2,
        );
        buf.push(VERSION);
        buf.extend_from_slice(&self.captured_at_ms.to_be_bytes());
        buf.extend_from_slice(&self.seq.to_be_bytes());
        buf.extend_from_slice(&header_width.to_be_bytes());
        buf.extend_from_slice(&header_height.to_be_bytes());
        buf.push(subject_count);

        for subject in &self.subjects {
            buf.push(subject.player_index);
            buf.push(subject.state as u8);
            for joint in &subject.joints {
                buf.push(joint.state as u8);
                buf.extend_from_slice(&joint.position.x.to_be_bytes());
                buf.extend_from_slice(&joint.position.y.to_be_bytes());
                buf.extend_from_slice(&joint.position.z.to_be_bytes());
            }
        }

        if let Some(frame) = &self.frame {
            for px in frame.pixels() {
                buf.extend_from_slice(&px.to_packed().to_be_bytes());
            }
        }
        Ok(buf)
    }

    /// Decode one record occupying all of `data`.
    pub fn deserialize(data: &[u8]) -> Result<Self, CaptureError> {
        let header = Header::parse(data)?;
        let expected = header.record_len();
        if data.len() < expected {
            return Err(CaptureError::TooShort {
                got: data.len(),
                expected,
            });
        }
        header.decode_body(&data[HEADER_SIZE..expected])
    }

    /// Read the next record from a stream. A clean end of stream before the
    /// first header byte yields `Ok(None)`.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Option<Self>, CaptureError> {
        let mut head = [0u8; HEADER_SIZE];
        let mut filled = 0;
        while filled < HEADER_SIZE {
            let n = reader.read(&mut head[filled..])?;
            if n == 0 {
                if filled == 0 {
                    return Ok(None);
                }
                debug!(bytes = filled, "capture stream ended inside a record header");
                return Err(CaptureError::TooShort {
                    got: filled,
                    expected: HEADER_SIZE,
                });
            }
            filled += n;
        }

        let header = Header::parse(&head)?;
        let mut body = vec![0u8; header.record_len() - HEADER_SIZE];
        reader.read_exact(&mut body).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                CaptureError::TooShort {
                    got: HEADER_SIZE,
                    expected: header.record_len(),
                }
            } else {
                CaptureError::Io(e)
            }
        })?;
        header.decode_body(&body).map(Some)
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), CaptureError> {
        writer.write_all(&self.serialize()?)?;
        Ok(())
    }
}

struct Header {
    captured_at_ms: i64,
    seq: u64,
    width: usize,
    height: usize,
    subject_count: usize,
}

impl Header {
    fn parse(data: &[u8]) -> Result<Self, CaptureError> {
        if data.len() < HEADER_SIZE {
            return Err(CaptureError::TooShort {
                got: data.len(),
                expected: HEADER_SIZE,
            });
        }
        if data[0] != VERSION {
            return Err(CaptureError::UnsupportedVersion(data[0]));
        }
        Ok(Self {
            captured_at_ms: i64::from_be_bytes(array(&data[1..9])),
            seq: u64::from_be_bytes(array(&data[9..17])),
            width: u16::from_be_bytes(array(&data[17..19])) as usize,
            height: u16::from_be_bytes(array(&data[19..21])) as usize,
            subject_count: data[21] as usize,
        })
    }

    fn record_len(&self) -> usize {
        HEADER_SIZE + self.subject_count * SUBJECT_SIZE + self.width * self.height * 2
    }

    fn decode_body(&self, body: &[u8]) -> Result<CaptureRecord, CaptureError> {
        let mut subjects = Vec::with_capacity(self.subject_count);
        let mut pos = 0;
        for _ in 0..self.subject_count {
            let player_index = body[pos];
            let state = SubjectState::try_from(body[pos + 1])
                .map_err(|v| CaptureError::InvalidEnum("subject state", v))?;
            pos += 2;

            let mut subject = TrackedSubject::new(player_index, state);
            for joint in subject.joints.iter_mut() {
                let state = JointState::try_from(body[pos])
                    .map_err(|v| CaptureError::InvalidEnum("joint state", v))?;
                let x = f32::from_be_bytes(array(&body[pos + 1..pos + 5]));
                let y = f32::from_be_bytes(array(&body[pos + 5..pos + 9]));
                let z = f32::from_be_bytes(array(&body[pos + 9..pos + 13]));
                *joint = Joint {
                    state,
                    position: SkeletonPoint::new(x, y, z),
                };
                pos += JOINT_SIZE;
            }
            subjects.push(subject);
        }

        let frame = if self.width == 0 || self.height == 0 {
            None
        } else {
            let pixels: Vec<DepthPixel> = body[pos..]
                .chunks_exact(2)
                .take(self.width * self.height)
                .map(|c| DepthPixel::from_packed(u16::from_be_bytes([c[0], c[1]])))
                .collect();
            Some(
                DepthFrame::new(self.width, self.height, pixels)
                    .map_err(|e| CaptureError::Frame(e.to_string()))?,
            )
        };

        Ok(CaptureRecord {
            captured_at_ms: self.captured_at_ms,
            seq: self.seq,
            subjects,
            frame,
        })
    }
}

fn array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    out
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("capture record too short: got {got} bytes, expected at least {expected}")]
    TooShort { got: usize, expected: usize },
    #[error("unsupported capture record version {0:#04x}")]
    UnsupportedVersion(u8),
    #[error("invalid {0} code {1}")]
    InvalidEnum(&'static str, u8),
    #[error("{0} {1} does not fit the record header")]
    Oversized(&'static str, usize),
    #[error("malformed depth frame: {0}")]
    Frame(String),
    #[error("capture I/O failed: {0}")]
    Io(#[from] std::io::Error),
}
