//! Incremental byte-for-byte comparator that consumes a read-pipe and
//! expected text, deciding match / diverge / incomplete / io_error as bytes
//! arrive.

use std::time::Instant;

use crate::error::Error;
use crate::harness::{OutputPipe, RecvError};

/// Which standard stream a diagnostic refers to, purely for message text.
#[derive(Copy, Clone, Debug)]
pub enum Stream {
    Stdout,
    Stderr,
}

impl Stream {
    fn label(self) -> &'static str {
        match self {
            Self::Stdout => "output",
            Self::Stderr => "error output",
        }
    }
}

/// Append-only actual-bytes buffer for one output stream. Survives across
/// directives: unmatched bytes left over from a successful match remain for
/// the next directive on the same stream.
#[derive(Default)]
pub struct ActualBuffer {
    bytes: Vec<u8>,
}

impl ActualBuffer {
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Consume bytes from `pipe` into `actual` until `want` is matched, a
/// divergence is detected, EOF truncates the expected text, or an I/O /
/// deadline error occurs.
pub fn expect(
    pipe: &mut OutputPipe,
    what: Stream,
    want: &[u8],
    actual: &mut ActualBuffer,
    deadline: Instant,
) -> Result<(), Error> {
    loop {
        if actual.bytes.len() >= want.len() {
            if &actual.bytes[..want.len()] == want {
                actual.bytes.drain(..want.len());
                return Ok(());
            }
            let divergence = first_divergence(want, &actual.bytes);
            return Err(Error::fail(diverged_message(what, want, &actual.bytes, divergence)));
        }
        // actual is a strict prefix candidate; check it agrees with `want` so far.
        if let Some(i) = first_divergence(want, &actual.bytes) {
            if i < actual.bytes.len() {
                return Err(Error::fail(diverged_message(what, want, &actual.bytes, Some(i))));
            }
        }

        match pipe.recv_until(deadline) {
            Ok(Some(chunk)) => actual.bytes.extend_from_slice(&chunk),
            Ok(None) => {
                return Err(Error::fail(incomplete_message(what, want, &actual.bytes)));
            }
            Err(RecvError::Deadline) => return Err(Error::fail("time limit exceeded")),
            Err(RecvError::Io(e)) => {
                return Err(Error::fail(format!("reading {}: {e}", what.label())));
            }
        }
    }
}

fn first_divergence(want: &[u8], actual: &[u8]) -> Option<usize> {
    let n = want.len().min(actual.len());
    (0..n).find(|&i| want[i] != actual[i])
}

fn first_line(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|&b| b == b'\n') {
        Some(i) => &bytes[..=i],
        None => bytes,
    }
}

fn diverged_message(what: Stream, want: &[u8], actual: &[u8], _at: Option<usize>) -> String {
    let label = match what {
        Stream::Stdout => "incorrect test output",
        Stream::Stderr => "incorrect test error output",
    };
    field_message(label, want, first_line(actual))
}

fn incomplete_message(what: Stream, want: &[u8], actual: &[u8]) -> String {
    let label = match what {
        Stream::Stdout => "incomplete test output",
        Stream::Stderr => "incomplete test error output",
    };
    field_message(label, want, actual)
}

/// `want` already carries its own trailing newline (the directive's line
/// tail, per the script format), so only insert a separating newline before
/// `  actual:` when `want` didn't supply one itself.
fn field_message(label: &str, want: &[u8], actual: &[u8]) -> String {
    let sep = if want.ends_with(b"\n") { "" } else { "\n" };
    format!(
        "{label}\nexpected: {}{sep}  actual: {}",
        String::from_utf8_lossy(want),
        String::from_utf8_lossy(actual),
    )
}

/// Read up to `limit` bytes without any expected text, used for the
/// post-pass residual check. Returns `Ok(None)` if the stream was at EOF
/// before yielding anything.
pub fn read_residual(
    pipe: &mut OutputPipe,
    limit: usize,
    deadline: Instant,
) -> Result<Option<Vec<u8>>, Error> {
    match pipe.recv_until(deadline) {
        Ok(Some(mut chunk)) => {
            chunk.truncate(limit);
            Ok(Some(chunk))
        }
        Ok(None) => Ok(None),
        Err(RecvError::Deadline) => Ok(None),
        Err(RecvError::Io(_)) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diverged_message_has_no_blank_line_after_newline_terminated_want() {
        let msg = diverged_message(Stream::Stderr, b"Nonsense!\n", b"Blimey!\n", Some(0));
        assert_eq!(msg, "incorrect test error output\nexpected: Nonsense!\n  actual: Blimey!\n");
    }

    #[test]
    fn diverged_message_inserts_separator_for_unterminated_want() {
        let msg = diverged_message(Stream::Stdout, b"abc", b"xyz", Some(0));
        assert_eq!(msg, "incorrect test output\nexpected: abc\n  actual: xyz");
    }
}
