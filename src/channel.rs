//! Byte-to-line transport to the engine subprocess.
//!
//! Spawning the engine is the only place this crate acquires an OS
//! resource. Output is read by one task per stream; each task buffers
//! partial chunks and delivers only complete, newline-delimited lines
//! into a single merged channel. Every line is tagged with the stream
//! it came from, so stderr chatter can never be mistaken for a
//! protocol reply while still being available for diagnostics.

use std::process::Stdio;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{Mutex, mpsc};

use crate::error::{EngineError, Result};

/// Which stream of the engine process a line arrived on.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Source {
    Stdout,
    Stderr,
}

/// One complete line of engine output.
#[derive(Clone, Debug)]
pub struct EngineLine {
    pub source: Source,
    pub text: String,
}

/// Cloneable write handle for the engine's stdin.
#[derive(Clone)]
pub struct EngineWriter {
    stdin: Arc<Mutex<ChildStdin>>,
}

impl EngineWriter {
    /// Send one protocol line, appending the line terminator.
    pub async fn send(&self, line: &str) -> Result<()> {
        let mut stdin = self.stdin.lock().await;
        stdin.write_all(line.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        stdin.flush().await?;
        Ok(())
    }
}

/// Capacity of the merged output-line channel.
const LINE_BUFFER: usize = 64;

/// Owns the engine subprocess and its line-delivery tasks.
pub struct EngineChannel {
    child: Child,
    writer: EngineWriter,
}

impl EngineChannel {
    /// Spawn the engine executable and wire up its pipes.
    ///
    /// Returns the channel together with the merged stream of output
    /// lines. The subprocess is killed when the channel is dropped, so
    /// no exit path can leak it.
    pub fn spawn(program: &str, args: &[String]) -> Result<(Self, mpsc::Receiver<EngineLine>)> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(EngineError::Spawn)?;

        let stdin = child.stdin.take().ok_or(EngineError::NotRunning)?;
        let stdout = child.stdout.take().ok_or(EngineError::NotRunning)?;
        let stderr = child.stderr.take().ok_or(EngineError::NotRunning)?;

        let (tx, rx) = mpsc::channel(LINE_BUFFER);
        tokio::spawn(read_lines(stdout, Source::Stdout, tx.clone()));
        tokio::spawn(read_lines(stderr, Source::Stderr, tx));

        let writer = EngineWriter {
            stdin: Arc::new(Mutex::new(stdin)),
        };
        Ok((Self { child, writer }, rx))
    }

    /// A write handle that can be shared with the line router.
    pub fn writer(&self) -> EngineWriter {
        self.writer.clone()
    }

    /// Terminate the subprocess. Idempotent; drop does the same.
    pub async fn shutdown(&mut self) {
        let _ = self.child.kill().await;
    }
}

/// Read one output stream to EOF, forwarding complete lines.
async fn read_lines<R>(stream: R, source: Source, tx: mpsc::Sender<EngineLine>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(text)) = lines.next_line().await {
        if tx.send(EngineLine { source, text }).await.is_err() {
            break; // receiver gone, stop reading
        }
    }
}
