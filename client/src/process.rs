use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use silhouette_bridge_common::config::ClientConfig;
use silhouette_bridge_common::protocol::{Notification, ProtocolError};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, info, warn};

/// Grace period after asking the bridge to exit before it is killed.
const EXIT_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("failed to spawn bridge {0:?}: {1}")]
    Spawn(String, std::io::Error),
    #[error("bridge process has no {0} pipe")]
    MissingPipe(&'static str),
    #[error("failed to read bridge output: {0}")]
    Read(std::io::Error),
    #[error("failed to stop bridge: {0}")]
    Stop(std::io::Error),
}

/// Parses bridge output line by line, skipping lines that are not
/// notifications.
pub struct NotificationStream<R> {
    lines: Lines<R>,
    skipped: u64,
}

impl<R: AsyncBufRead + Unpin> NotificationStream<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            skipped: 0,
        }
    }

    /// Next well-formed notification, or `None` at end of stream.
    pub async fn next(&mut self) -> Result<Option<Notification>, ClientError> {
        while let Some(line) = self.lines.next_line().await.map_err(ClientError::Read)? {
            match line.parse::<Notification>() {
                Ok(n) => return Ok(Some(n)),
                Err(ProtocolError::Empty) => {}
                Err(e @ ProtocolError::UnknownCommand(_)) => {
                    self.skipped += 1;
                    debug!(error = %e, line, "ignoring unknown line");
                }
                Err(e) => {
                    self.skipped += 1;
                    warn!(error = %e, line, "ignoring malformed line");
                }
            }
        }
        Ok(None)
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

/// A running bridge child process.
pub struct BridgeProcess {
    child: Child,
    stdin: Option<ChildStdin>,
}

impl BridgeProcess {
    pub fn spawn(
        config: &ClientConfig,
    ) -> Result<(Self, NotificationStream<BufReader<ChildStdout>>), ClientError> {
        let mut child = Command::new(&config.command)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ClientError::Spawn(config.command.clone(), e))?;

        let stdout = child.stdout.take().ok_or(ClientError::MissingPipe("stdout"))?;
        let stdin = child.stdin.take().ok_or(ClientError::MissingPipe("stdin"))?;

        info!(command = config.command, pid = child.id(), "bridge started");
        Ok((
            Self {
                child,
                stdin: Some(stdin),
            },
            NotificationStream::new(BufReader::new(stdout)),
        ))
    }

    /// Press Enter on the bridge's console and wait for it to exit, killing
    /// it if it does not within [`EXIT_GRACE`].
    pub async fn stop(mut self) -> Result<ExitStatus, ClientError> {
        if let Some(mut stdin) = self.stdin.take() {
            if let Err(e) = stdin.write_all(b"\n").await {
                debug!(error = %e, "bridge stdin already closed");
            }
        }
        match tokio::time::timeout(EXIT_GRACE, self.child.wait()).await {
            Ok(status) => status.map_err(ClientError::Stop),
            Err(_) => {
                warn!("bridge did not exit in time, killing");
                self.kill().await
            }
        }
    }

    pub async fn kill(mut self) -> Result<ExitStatus, ClientError> {
        self.child.kill().await.map_err(ClientError::Stop)?;
        self.child.wait().await.map_err(ClientError::Stop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn skips_noise_between_notifications() {
        let output = b"BRIDGE_READY\n\nDEBUG tracer warmed up\nOUTLINE 2 1 1\nOUTLINE 0\n";
        let mut stream = NotificationStream::new(BufReader::new(&output[..]));

        assert_eq!(stream.next().await.unwrap(), Some(Notification::Ready));
        assert_eq!(stream.next().await.unwrap(), Some(Notification::OutlineCleared));
        assert_eq!(stream.next().await.unwrap(), None);
        assert_eq!(stream.skipped(), 2);
    }

    #[tokio::test]
    async fn missing_command_fails_to_spawn() {
        let config = ClientConfig {
            command: "/nonexistent/silhouette-bridge".into(),
            args: Vec::new(),
        };
        assert!(matches!(BridgeProcess::spawn(&config), Err(ClientError::Spawn(..))));
    }
}
