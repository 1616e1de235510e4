//! Spawns the PUT with deadlined pipes for all three standard streams and
//! handles forced termination.
//!
//! `std::process`'s pipes have no per-call read/write deadline, so each
//! output stream is handed to a dedicated reader thread that blocks on the
//! OS pipe and forwards chunks over an `mpsc` channel; the caller enforces
//! the deadline with `recv_timeout` against an absolute instant. Stdin
//! writes go through an analogous writer thread.

use std::io::{Read, Write};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crate::error::Error;

/// A chunk read from a child's output stream, or the end of it.
enum Chunk {
    Data(Vec<u8>),
    Eof,
    Err(std::io::Error),
}

pub struct OutputPipe {
    rx: mpsc::Receiver<Chunk>,
    closed: bool,
}

impl OutputPipe {
    fn spawn<R: Read + Send + 'static>(mut reader: R) -> Self {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let mut buf = [0u8; 4096];
            loop {
                match reader.read(&mut buf) {
                    Ok(0) => {
                        let _ = tx.send(Chunk::Eof);
                        break;
                    }
                    Ok(n) => {
                        if tx.send(Chunk::Data(buf[..n].to_vec())).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Chunk::Err(e));
                        break;
                    }
                }
            }
        });
        Self { rx, closed: false }
    }

    /// Block for at most until `deadline`, returning the next chunk.
    ///
    /// Returns `Ok(None)` on EOF, `Err(deadline)` on timeout.
    pub fn recv_until(&mut self, deadline: Instant) -> Result<Option<Vec<u8>>, RecvError> {
        if self.closed {
            return Ok(None);
        }
        let now = Instant::now();
        let budget = deadline.saturating_duration_since(now);
        if budget.is_zero() && now >= deadline {
            return Err(RecvError::Deadline);
        }
        match self.rx.recv_timeout(budget) {
            Ok(Chunk::Data(data)) => Ok(Some(data)),
            Ok(Chunk::Eof) => {
                self.closed = true;
                Ok(None)
            }
            Ok(Chunk::Err(e)) => {
                self.closed = true;
                Err(RecvError::Io(e))
            }
            Err(mpsc::RecvTimeoutError::Timeout) => Err(RecvError::Deadline),
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                self.closed = true;
                Ok(None)
            }
        }
    }
}

pub enum RecvError {
    Deadline,
    Io(std::io::Error),
}

/// A handle to a spawned PUT with deadlined access to its three std streams.
pub struct Handle {
    child: Child,
    stdin: Option<StdinPipe>,
    stdout: Option<OutputPipe>,
    stderr: Option<OutputPipe>,
    deadline: Instant,
}

struct StdinPipe {
    tx: mpsc::SyncSender<Vec<u8>>,
    done_rx: mpsc::Receiver<std::io::Result<()>>,
}

impl StdinPipe {
    fn spawn(mut stdin: std::process::ChildStdin) -> Self {
        let (tx, rx) = mpsc::sync_channel::<Vec<u8>>(0);
        let (done_tx, done_rx) = mpsc::channel();
        std::thread::spawn(move || {
            while let Ok(data) = rx.recv() {
                let result = stdin.write_all(&data).and_then(|_| stdin.flush());
                let failed = result.is_err();
                if done_tx.send(result).is_err() || failed {
                    break;
                }
            }
        });
        Self { tx, done_rx }
    }

    fn write(&self, data: Vec<u8>, deadline: Instant) -> Result<(), RecvError> {
        if self.tx.send(data).is_err() {
            return Err(RecvError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "stdin writer thread exited",
            )));
        }
        let budget = deadline.saturating_duration_since(Instant::now());
        match self.done_rx.recv_timeout(budget) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(RecvError::Io(e)),
            Err(mpsc::RecvTimeoutError::Timeout) => Err(RecvError::Deadline),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(RecvError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "stdin writer thread exited",
            ))),
        }
    }
}

impl Handle {
    /// Spawn `argv` (with `test_path` appended as the final argument),
    /// wiring all three standard streams to deadlined pipes.
    pub fn spawn(argv: &[String], test_path: &std::path::Path, deadline: Instant) -> Result<Self, Error> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| Error::fatal("No program specified"))?;

        let mut cmd = Command::new(program);
        cmd.args(args);
        cmd.arg(test_path);
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .map_err(|e| Error::other(format!("spawning {}: {e}", program.as_str())))?;

        let stdin = child.stdin.take().map(StdinPipe::spawn);
        let stdout = child.stdout.take().map(OutputPipe::spawn);
        let stderr = child.stderr.take().map(OutputPipe::spawn);

        tracing::debug!(program = %program, "spawned PUT");

        Ok(Self {
            child,
            stdin,
            stdout,
            stderr,
            deadline,
        })
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Write `data` to stdin, blocking up to the harness deadline.
    pub fn write_stdin(&mut self, data: &[u8]) -> Result<(), RecvError> {
        let pipe = self
            .stdin
            .as_ref()
            .ok_or(RecvError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "stdin already closed",
            )))?;
        pipe.write(data.to_vec(), self.deadline)
    }

    /// Access stdout's pipe. Panics if it has already been closed; callers
    /// are expected to stop touching a stream once they've closed it.
    pub fn stdout(&mut self) -> &mut OutputPipe {
        self.stdout.as_mut().expect("stdout accessed after close")
    }

    pub fn stderr(&mut self) -> &mut OutputPipe {
        self.stderr.as_mut().expect("stderr accessed after close")
    }

    /// Close stdin, signalling EOF to the PUT.
    pub fn close_stdin(&mut self) {
        self.stdin = None;
    }

    pub fn close_stdout(&mut self) {
        self.stdout = None;
    }

    pub fn close_stderr(&mut self) {
        self.stderr = None;
    }

    /// Wait for the child to exit, honoring the harness deadline; on
    /// timeout force-kill and reap so no zombie is left behind.
    pub fn wait(&mut self) -> Result<std::process::ExitStatus, Error> {
        let remaining = self.deadline.saturating_duration_since(Instant::now());
        match wait_timeout::ChildExt::wait_timeout(&mut self.child, remaining) {
            Ok(Some(status)) => Ok(status),
            Ok(None) => {
                let _ = self.child.kill();
                self.child
                    .wait()
                    .map_err(|e| Error::fail(format!("time limit exceeded: {e}")))?;
                Err(Error::fail("time limit exceeded"))
            }
            Err(e) => Err(Error::fail(format!("waiting on PUT: {e}"))),
        }
    }

    /// Close all remaining pipes, then tear down the child in the
    /// background: wait 50ms, force-kill if still alive, then reap.
    pub fn close(mut self) {
        self.stdin = None;
        self.stdout = None;
        self.stderr = None;
        let mut child = self.child;
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            if let Ok(None) = child.try_wait() {
                let _ = child.kill();
            }
            let _ = child.wait();
        });
    }
}
