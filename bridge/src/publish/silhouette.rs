use silhouette_bridge_common::frame::DepthFrame;
use silhouette_bridge_common::protocol::{Notification, Silhouette, SilhouetteRun};

use super::state::{Emission, PublishState};

/// Run-length encode every owned pixel of `frame`, row by row.
pub fn encode_runs(frame: &DepthFrame) -> Vec<SilhouetteRun> {
    let mut runs = Vec::new();
    for y in 0..frame.height() {
        let row = frame.row(y);
        let mut x = 0;
        while x < row.len() {
            let player = row[x].player_index;
            let start = x;
            while x < row.len() && row[x].player_index == player {
                x += 1;
            }
            if player != 0 {
                runs.push(SilhouetteRun {
                    y: y as u32,
                    start_x: start as u32,
                    length: (x - start) as u32,
                    player_index: player,
                });
            }
        }
    }
    runs
}

/// Same suppression rule as the outline channel, applied to silhouettes.
#[derive(Default)]
pub struct SilhouettePublisher {
    state: PublishState,
}

impl SilhouettePublisher {
    pub fn publish(&mut self, frame: Option<&DepthFrame>) -> Option<Notification> {
        let (width, height, runs) = match frame {
            Some(f) if !f.is_empty() => (f.width() as u32, f.height() as u32, encode_runs(f)),
            _ => (0, 0, Vec::new()),
        };
        match self.state.advance(!runs.is_empty()) {
            Emission::Nothing => None,
            Emission::Cleared => Some(Notification::Silhouette(Silhouette {
                width,
                height,
                runs: Vec::new(),
            })),
            Emission::Content => Some(Notification::Silhouette(Silhouette {
                width,
                height,
                runs,
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use silhouette_bridge_common::frame::DepthPixel;

    fn frame(rows: &[&str]) -> DepthFrame {
        let mut f = DepthFrame::empty(rows[0].len(), rows.len());
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.bytes().enumerate() {
                if let Some(p) = (c as char).to_digit(10) {
                    f.set(x, y, DepthPixel::new(1500, p as u8));
                }
            }
        }
        f
    }

    #[test]
    fn runs_split_on_player_change() {
        let f = frame(&[
            "..11122.", //
            "........", //
            "1......1",
        ]);
        let runs: Vec<(u32, u32, u32, u8)> = encode_runs(&f)
            .iter()
            .map(|r| (r.y, r.start_x, r.length, r.player_index))
            .collect();
        assert_eq!(
            runs,
            vec![(0, 2, 3, 1), (0, 5, 2, 2), (2, 0, 1, 1), (2, 7, 1, 1)]
        );
    }

    #[test]
    fn empty_frames_are_suppressed_until_something_was_shown() {
        let mut p = SilhouettePublisher::default();
        let blank = frame(&["....", "...."]);
        assert!(p.publish(Some(&blank)).is_none());
        assert!(p.publish(None).is_none());

        let shown = p.publish(Some(&frame(&[".1..", "...."]))).unwrap();
        assert_eq!(shown.to_string(), "SILHOUETTE 4 2 1 0 1 1 1");

        let cleared = p.publish(Some(&blank)).unwrap();
        assert_eq!(cleared.to_string(), "SILHOUETTE 4 2 0");
        assert!(p.publish(Some(&blank)).is_none());
    }
}
