// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Remote shells through the system OpenSSH client
//!
//! Each session is one `ssh` child process with piped stdio and these tasks:
//!
//! - an input forwarder that drains the session's input queue into stdin,
//! - two output pumps (stdout, stderr) that frame reads into whole lines and
//!   turn them into output events,
//! - a supervisor that owns the child, handles terminate requests, and
//!   reports the exit.
//!
//! Input sent before the connection is established waits in the queue (and
//! then in the client's own buffers); it is not dropped.

use async_trait::async_trait;
use futures::future::join_all;
use std::process::Stdio;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::output::OutputDecoder;
use super::{Liveness, SessionEvent, SessionEvents, SessionHandle, SessionId, Transport};
use crate::endpoint::Endpoint;
use crate::error::{SendError, SpawnError, TerminateError};

pub const DEFAULT_SSH_PROGRAM: &str = "ssh";

/// `-tt` forces a remote tty even though our stdin is a pipe, so the remote
/// side runs an interactive shell and input lines execute as typed.
pub const DEFAULT_SSH_ARGS: &[&str] = &["-tt"];

/// How long a terminated session may take to exit before it is killed.
pub const DEFAULT_TERMINATE_GRACE: Duration = Duration::from_secs(3);

const OUTPUT_CHUNK_SIZE: usize = 8192;

/// Quiet time after which a partial line (a prompt, usually) is shown.
const PARTIAL_LINE_FLUSH: Duration = Duration::from_millis(50);

/// Stand-in deadline for the grace timer before a terminate request arrives.
const IDLE_TIMER: Duration = Duration::from_secs(86_400 * 365);

#[derive(Debug, Clone)]
pub struct SshTransport {
    program: String,
    args: Vec<String>,
    terminate_grace: Duration,
    supervisors: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl Default for SshTransport {
    fn default() -> Self {
        Self::new(
            DEFAULT_SSH_PROGRAM,
            DEFAULT_SSH_ARGS.iter().map(|arg| arg.to_string()).collect(),
        )
    }
}

impl SshTransport {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            terminate_grace: DEFAULT_TERMINATE_GRACE,
            supervisors: Arc::default(),
        }
    }

    pub fn with_terminate_grace(mut self, grace: Duration) -> Self {
        self.terminate_grace = grace;
        self
    }

    /// Wait until every session opened through this transport has been
    /// reaped. Sessions that were asked to terminate are killed after the
    /// grace period, so this is bounded once all of them were terminated.
    pub async fn wait_for_exit(&self) {
        let supervisors: Vec<JoinHandle<()>> = self
            .supervisors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for result in join_all(supervisors).await {
            if let Err(e) = result {
                tracing::debug!("Session supervisor failed: {e}");
            }
        }
    }

    fn command(&self, endpoint: &Endpoint) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg("-l")
            .arg(&endpoint.user)
            .arg("--")
            .arg(&endpoint.host)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

#[async_trait]
impl Transport for SshTransport {
    async fn open(
        &self,
        id: SessionId,
        endpoint: &Endpoint,
        events: SessionEvents,
    ) -> Result<Box<dyn SessionHandle>, SpawnError> {
        let mut child = self
            .command(endpoint)
            .spawn()
            .map_err(|e| SpawnError::new(endpoint, format!("{}: {e}", self.program)))?;

        tracing::debug!(
            "Spawned {} for {} (pid {:?})",
            self.program,
            endpoint,
            child.id()
        );

        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        let liveness = Liveness::new();

        if let Some(stdin) = child.stdin.take() {
            tokio::spawn(forward_input(stdin, input_rx, shutdown.clone()));
        }
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(pump_output(id, stdout, events.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(pump_output(id, stderr, events.clone()));
        }

        let supervisor = tokio::spawn(supervise(
            id,
            child,
            shutdown.clone(),
            liveness.clone(),
            events,
            self.terminate_grace,
        ));
        self.supervisors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(supervisor);

        Ok(Box::new(SshSession {
            input: input_tx,
            shutdown,
            liveness,
        }))
    }
}

struct SshSession {
    input: mpsc::UnboundedSender<Vec<u8>>,
    shutdown: CancellationToken,
    liveness: Liveness,
}

impl SessionHandle for SshSession {
    fn send(&self, data: &[u8]) -> Result<(), SendError> {
        self.input
            .send(data.to_vec())
            .map_err(|_| SendError::Closed)
    }

    fn terminate(&self) -> Result<(), TerminateError> {
        self.shutdown.cancel();
        Ok(())
    }

    fn is_alive(&self) -> bool {
        self.liveness.is_alive()
    }
}

async fn forward_input(
    mut stdin: ChildStdin,
    mut input: mpsc::UnboundedReceiver<Vec<u8>>,
    shutdown: CancellationToken,
) {
    loop {
        let data = tokio::select! {
            _ = shutdown.cancelled() => break,
            data = input.recv() => match data {
                Some(data) => data,
                None => break,
            },
        };

        let write = async {
            stdin.write_all(&data).await?;
            stdin.flush().await
        };
        tokio::select! {
            _ = shutdown.cancelled() => break,
            result = write => {
                if let Err(e) = result {
                    tracing::debug!("Session input pipe closed: {}", e);
                    break;
                }
            }
        }
    }
    // Dropping stdin here hands EOF to the remote shell
}

async fn pump_output<R>(id: SessionId, mut reader: R, events: SessionEvents)
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; OUTPUT_CHUNK_SIZE];
    let mut decoder = OutputDecoder::new();
    let mut flushed = false;

    loop {
        let read = if decoder.pending() > 0 && !flushed {
            match tokio::time::timeout(PARTIAL_LINE_FLUSH, reader.read(&mut buf)).await {
                Ok(read) => read,
                Err(_) => {
                    flushed = true;
                    if !emit(id, &events, decoder.flush()) {
                        return;
                    }
                    continue;
                }
            }
        } else {
            reader.read(&mut buf).await
        };

        match read {
            Ok(0) => break,
            Ok(n) => {
                flushed = false;
                if !emit(id, &events, decoder.feed(&buf[..n])) {
                    return;
                }
            }
            Err(e) => {
                tracing::debug!("Output pipe for session {} failed: {}", id, e);
                break;
            }
        }
    }

    emit(id, &events, decoder.finish());
}

/// Send decoded output, if any. False once the receiving side is gone.
fn emit(id: SessionId, events: &SessionEvents, text: Option<String>) -> bool {
    match text {
        Some(text) => events.send(SessionEvent::Output { id, text }).is_ok(),
        None => true,
    }
}

async fn supervise(
    id: SessionId,
    mut child: Child,
    shutdown: CancellationToken,
    liveness: Liveness,
    events: SessionEvents,
    grace: Duration,
) {
    let grace_timer = tokio::time::sleep(IDLE_TIMER);
    tokio::pin!(grace_timer);
    let mut terminating = false;
    let mut killed = false;

    let status = loop {
        tokio::select! {
            status = child.wait() => break status,
            _ = shutdown.cancelled(), if !terminating => {
                terminating = true;
                request_exit(id, &mut child);
                grace_timer.as_mut().reset(Instant::now() + grace);
            }
            _ = &mut grace_timer, if terminating && !killed => {
                killed = true;
                tracing::warn!("Session {} did not exit within {:?}, killing it", id, grace);
                if let Err(e) = child.start_kill() {
                    tracing::debug!("Failed to kill session {}: {}", id, e);
                }
            }
        }
    };

    let code = match status {
        Ok(status) => status.code(),
        Err(e) => {
            tracing::warn!("Failed to reap session {}: {}", id, e);
            None
        }
    };
    tracing::debug!("Session {} exited with {:?}", id, code);

    liveness.mark_dead();
    shutdown.cancel();
    let _ = events.send(SessionEvent::Exited { id, code });
}

#[cfg(unix)]
fn request_exit(id: SessionId, child: &mut Child) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let Some(pid) = child.id().and_then(|pid| i32::try_from(pid).ok()) else {
        return;
    };
    if let Err(e) = kill(Pid::from_raw(pid), Signal::SIGTERM) {
        tracing::debug!("Failed to signal session {}: {}", id, e);
    }
}

#[cfg(not(unix))]
fn request_exit(id: SessionId, child: &mut Child) {
    if let Err(e) = child.start_kill() {
        tracing::debug!("Failed to stop session {}: {}", id, e);
    }
}
