use std::fmt::{self, Write as _};
use std::str::FromStr;

pub const NO_SENSOR: &str = "NO_KINECT";
pub const READY: &str = "BRIDGE_READY";
pub const HEAD: &str = "HEAD";
pub const OUTLINE: &str = "OUTLINE";
pub const SILHOUETTE: &str = "SILHOUETTE";

/// Head position in frame space plus distance from the sensor in metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadPosition {
    pub x: i32,
    pub y: i32,
    pub z: f32,
}

/// One outline vertex as sent on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutlinePoint {
    pub x: u32,
    pub y: u32,
    pub depth: Option<u16>,
}

/// Maximal horizontal span of pixels owned by one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SilhouetteRun {
    pub y: u32,
    pub start_x: u32,
    pub length: u32,
    pub player_index: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Silhouette {
    pub width: u32,
    pub height: u32,
    pub runs: Vec<SilhouetteRun>,
}

impl Silhouette {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.runs.is_empty()
    }
}

/// One line of the bridge's stdout protocol:
///
/// ```text
/// NO_KINECT
/// BRIDGE_READY
/// HEAD <x> <y> <z>
/// OUTLINE <count> [<x> <y> [<depth>]]...
/// SILHOUETTE <width> <height> <runCount> [<y> <startX> <length> <playerIndex>]...
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// No compatible sensor at startup.
    NoSensor,
    Ready,
    Head(HeadPosition),
    /// Non-empty outline in trace order.
    Outline(Vec<OutlinePoint>),
    /// `OUTLINE 0`: the previously published outline is gone.
    OutlineCleared,
    Silhouette(Silhouette),
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::NoSensor => f.write_str(NO_SENSOR),
            Notification::Ready => f.write_str(READY),
            Notification::Head(h) => write!(f, "{HEAD} {} {} {:.2}", h.x, h.y, h.z),
            Notification::Outline(points) => {
                let mut line = String::with_capacity(points.len() * 12 + 16);
                write!(line, "{OUTLINE} {}", points.len())?;
                for p in points {
                    write!(line, " {} {}", p.x, p.y)?;
                    if let Some(depth) = p.depth {
                        write!(line, " {depth}")?;
                    }
                }
                f.write_str(&line)
            }
            Notification::OutlineCleared => write!(f, "{OUTLINE} 0"),
            Notification::Silhouette(s) => {
                let mut line = String::with_capacity(s.runs.len() * 16 + 32);
                write!(line, "{SILHOUETTE} {} {} {}", s.width, s.height, s.runs.len())?;
                for r in &s.runs {
                    write!(line, " {} {} {} {}", r.y, r.start_x, r.length, r.player_index)?;
                }
                f.write_str(&line)
            }
        }
    }
}

impl FromStr for Notification {
    type Err = ProtocolError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut tokens = line.split_whitespace();
        let command = tokens.next().ok_or(ProtocolError::Empty)?;
        match command {
            NO_SENSOR => Ok(Notification::NoSensor),
            READY => Ok(Notification::Ready),
            HEAD => {
                let x = next_number(&mut tokens, "head x")?;
                let y = next_number(&mut tokens, "head y")?;
                let z = next_number(&mut tokens, "head z")?;
                Ok(Notification::Head(HeadPosition { x, y, z }))
            }
            OUTLINE => parse_outline(tokens),
            SILHOUETTE => parse_silhouette(tokens),
            other => Err(ProtocolError::UnknownCommand(other.to_string())),
        }
    }
}

fn parse_outline<'a>(mut tokens: impl Iterator<Item = &'a str>) -> Result<Notification, ProtocolError> {
    let count: usize = next_number(&mut tokens, "outline count")?;
    let values = tokens
        .map(|t| {
            t.parse::<u32>()
                .map_err(|_| ProtocolError::InvalidNumber("outline value", t.to_string()))
        })
        .collect::<Result<Vec<u32>, _>>()?;

    if count == 0 {
        return if values.is_empty() {
            Ok(Notification::OutlineCleared)
        } else {
            Err(ProtocolError::CountMismatch {
                count,
                values: values.len(),
            })
        };
    }

    let with_depth = if count.checked_mul(3) == Some(values.len()) {
        true
    } else if count.checked_mul(2) == Some(values.len()) {
        false
    } else {
        return Err(ProtocolError::CountMismatch {
            count,
            values: values.len(),
        });
    };

    let stride = if with_depth { 3 } else { 2 };
    let mut points = Vec::with_capacity(values.len() / stride);
    for chunk in values.chunks_exact(stride) {
        let depth = if with_depth {
            let d = u16::try_from(chunk[2]).map_err(|_| {
                ProtocolError::InvalidNumber("outline depth", chunk[2].to_string())
            })?;
            Some(d)
        } else {
            None
        };
        points.push(OutlinePoint {
            x: chunk[0],
            y: chunk[1],
            depth,
        });
    }
    Ok(Notification::Outline(points))
}

fn parse_silhouette<'a>(
    mut tokens: impl Iterator<Item = &'a str>,
) -> Result<Notification, ProtocolError> {
    let width = next_number(&mut tokens, "silhouette width")?;
    let height = next_number(&mut tokens, "silhouette height")?;
    let run_count: usize = next_number(&mut tokens, "silhouette run count")?;

    // run_count comes off the wire
    let mut runs = Vec::new();
    for _ in 0..run_count {
        runs.push(SilhouetteRun {
            y: next_number(&mut tokens, "run y")?,
            start_x: next_number(&mut tokens, "run start")?,
            length: next_number(&mut tokens, "run length")?,
            player_index: next_number(&mut tokens, "run player")?,
        });
    }
    let extra = tokens.count();
    if extra > 0 {
        return Err(ProtocolError::CountMismatch {
            count: run_count,
            values: run_count * 4 + extra,
        });
    }
    Ok(Notification::Silhouette(Silhouette {
        width,
        height,
        runs,
    }))
}

fn next_number<'a, T: FromStr>(
    tokens: &mut impl Iterator<Item = &'a str>,
    what: &'static str,
) -> Result<T, ProtocolError> {
    let token = tokens.next().ok_or(ProtocolError::MissingToken(what))?;
    token
        .parse()
        .map_err(|_| ProtocolError::InvalidNumber(what, token.to_string()))
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("empty line")]
    Empty,
    #[error("unknown command {0:?}")]
    UnknownCommand(String),
    #[error("missing {0}")]
    MissingToken(&'static str),
    #[error("invalid {0}: {1:?}")]
    InvalidNumber(&'static str, String),
    #[error("declared {count} entries but found {values} values")]
    CountMismatch { count: usize, values: usize },
}
