//! Engine Session
//!
//! Owns one long-lived UCI engine subprocess. Requests are matched to
//! responses purely by order, so the session serves a single search at a
//! time; `&mut self` on every operation makes that a compile-time guarantee.

use std::fmt;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, info, trace, warn};

use super::analysis::{EngineResult, SearchLimits};
use super::uci;
use crate::error::{Error, Result};

/// Default wait for `readyok` after spawning
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(10);

/// Wait for the stale `bestmove` after interrupting a timed-out search
const DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Starting,
    Ready,
    Busy,
    Stopped,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Starting => "starting",
            SessionState::Ready => "ready",
            SessionState::Busy => "busy",
            SessionState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Pipes of a running engine
struct EngineProcess {
    child: Child,
    stdin: ChildStdin,
    lines: Lines<BufReader<ChildStdout>>,
}

impl EngineProcess {
    fn spawn(path: &str) -> Result<Self> {
        let mut child = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::EngineUnavailable(format!("{}: {}", path, e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::EngineUnavailable("failed to open engine stdin".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::EngineUnavailable("failed to open engine stdout".into()))?;

        Ok(EngineProcess {
            child,
            stdin,
            lines: BufReader::new(stdout).lines(),
        })
    }

    async fn send(&mut self, cmd: &str) -> Result<()> {
        trace!("UCI >> {}", cmd);
        self.stdin.write_all(cmd.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;
        Ok(())
    }

    async fn handshake(&mut self, ready_timeout: Duration) -> Result<Option<String>> {
        self.send("uci").await?;
        self.send("isready").await?;
        match tokio::time::timeout(ready_timeout, uci::wait_for_ready(&mut self.lines)).await {
            Ok(result) => result,
            Err(_) => Err(Error::EngineTimeout(ready_timeout)),
        }
    }

    async fn search(&mut self, fen: &str, limits: &SearchLimits) -> Result<EngineResult> {
        self.send(&uci::position_command(fen)).await?;
        self.send(&uci::go_command(limits)).await?;

        let deadline = limits.response_deadline();
        match tokio::time::timeout(deadline, uci::read_search(&mut self.lines)).await {
            Ok(result) => result,
            Err(_) => Err(Error::AnalysisTimeout(deadline)),
        }
    }

    /// Interrupts the running search and consumes its `bestmove`
    async fn interrupt(&mut self) -> bool {
        if self.send("stop").await.is_err() {
            return false;
        }
        matches!(
            tokio::time::timeout(DRAIN_TIMEOUT, uci::drain_until_bestmove(&mut self.lines)).await,
            Ok(Ok(()))
        )
    }

    async fn shutdown(mut self) {
        let _ = self.send("quit").await;
        if let Err(e) = self.child.kill().await {
            debug!("Engine already exited: {}", e);
        }
    }
}

/// One engine subprocess and its protocol state
pub struct EngineSession {
    path: String,
    ready_timeout: Duration,
    state: SessionState,
    process: Option<EngineProcess>,
    engine_name: Option<String>,
}

impl EngineSession {
    /// Creates a session for the engine at `path` (or a name on `PATH`).
    /// Nothing is spawned until the first `start` or `analyze`.
    pub fn new(path: impl Into<String>) -> Self {
        EngineSession {
            path: path.into(),
            ready_timeout: DEFAULT_READY_TIMEOUT,
            state: SessionState::Uninitialized,
            process: None,
            engine_name: None,
        }
    }

    pub fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = timeout;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == SessionState::Ready
    }

    /// Name reported by the engine's `id name` line
    pub fn engine_name(&self) -> Option<&str> {
        self.engine_name.as_deref()
    }

    /// Spawns the engine and completes the `uci`/`isready` handshake.
    ///
    /// A no-op when the session is already ready.
    pub async fn start(&mut self) -> Result<()> {
        if self.state == SessionState::Ready {
            return Ok(());
        }
        self.reset().await;
        self.state = SessionState::Starting;
        info!("Starting analysis engine: {}", self.path);

        let mut process = match EngineProcess::spawn(&self.path) {
            Ok(process) => process,
            Err(e) => {
                warn!("{}", e);
                self.state = SessionState::Uninitialized;
                return Err(e);
            }
        };

        match process.handshake(self.ready_timeout).await {
            Ok(name) => {
                info!(
                    "Analysis engine ready ({})",
                    name.as_deref().unwrap_or("unnamed engine")
                );
                self.engine_name = name;
                self.process = Some(process);
                self.state = SessionState::Ready;
                Ok(())
            }
            Err(e) => {
                warn!("Engine handshake failed: {}", e);
                process.shutdown().await;
                self.state = SessionState::Uninitialized;
                // a broken pipe while handshaking means the engine is not usable at all
                Err(match e {
                    Error::Io(io) => Error::EngineUnavailable(io.to_string()),
                    other => other,
                })
            }
        }
    }

    /// Runs one search on `fen`, starting the engine first if needed.
    ///
    /// A timed-out search is interrupted and its stale output discarded
    /// before returning, so the session stays usable. Any other failure kills
    /// the process and the next call starts a fresh one.
    pub async fn analyze(&mut self, fen: &str, limits: &SearchLimits) -> Result<EngineResult> {
        let state = self.state;
        match state {
            SessionState::Ready => {}
            SessionState::Busy => {
                // a previous caller dropped its future mid-search; the pipe
                // still carries that search's output
                warn!("Abandoned search detected, restarting engine");
                self.reset().await;
                self.start().await?;
            }
            _ => self.start().await?,
        }

        let Some(process) = self.process.as_mut() else {
            self.state = SessionState::Uninitialized;
            return Err(Error::AnalysisFailed("engine process is not running".into()));
        };

        self.state = SessionState::Busy;
        debug!("Analyzing {} (depth {}, {} ms)", fen, limits.depth, limits.movetime_ms);

        match process.search(fen, limits).await {
            Ok(result) => {
                self.state = SessionState::Ready;
                Ok(result)
            }
            Err(Error::AnalysisTimeout(deadline)) => {
                warn!("Analysis exceeded {:?}, interrupting search", deadline);
                if process.interrupt().await {
                    self.state = SessionState::Ready;
                } else {
                    warn!("Engine did not stop cleanly, restarting on next request");
                    self.reset().await;
                }
                Err(Error::AnalysisTimeout(deadline))
            }
            Err(e) => {
                warn!("Analysis failed, restarting engine on next request: {}", e);
                self.reset().await;
                Err(e)
            }
        }
    }

    /// Terminates the engine. Safe to call repeatedly or before `start`.
    pub async fn stop(&mut self) {
        if let Some(process) = self.process.take() {
            info!("Stopping analysis engine");
            process.shutdown().await;
        }
        self.state = SessionState::Stopped;
    }

    async fn reset(&mut self) {
        if let Some(process) = self.process.take() {
            process.shutdown().await;
        }
        self.state = SessionState::Uninitialized;
    }
}

impl fmt::Debug for EngineSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineSession")
            .field("path", &self.path)
            .field("state", &self.state)
            .field("engine_name", &self.engine_name)
            .finish()
    }
}
