//! Walks a parsed [`Script`] against a spawned PUT, dispatching each
//! directive to the harness and matcher, and validates the exit code.

use std::io::Write;
use std::time::{Duration, Instant};

use crate::error::{Error, Kind};
use crate::harness::Handle;
use crate::matcher::{self, ActualBuffer, Stream};
use crate::script::{Directive, Script};

const RESIDUAL_LIMIT: usize = 64;

/// Run one test case: spawn the PUT, walk `script` against it, and validate
/// its exit status. Returns `Ok(())` on a fully-matched, correctly-exited
/// run, or the first [`Error`] encountered.
pub fn run(
    argv: &[String],
    test_path: &std::path::Path,
    script: &Script,
    limit: Duration,
    verbose: bool,
    stdout: &mut dyn Write,
) -> Result<(), Error> {
    let deadline = Instant::now() + limit;
    let mut handle = Handle::spawn(argv, test_path, deadline)?;

    if verbose {
        let _ = writeln!(stdout);
        let _ = writeln!(stdout, "{}", test_path.display());
    }

    let result = drive(&mut handle, script, verbose, stdout);

    match result {
        Ok(saw_err_directive) => finish(handle, saw_err_directive),
        Err(e) => {
            handle.close();
            Err(e)
        }
    }
}

/// Write inputs, match outputs, in script order. Returns whether any
/// `ExpectErr` directive was satisfied.
fn drive(
    handle: &mut Handle,
    script: &Script,
    verbose: bool,
    stdout: &mut dyn Write,
) -> Result<bool, Error> {
    let mut remaining_inputs = script.input_count() as isize;
    let mut stdin_closed = false;
    let mut saw_err_directive = false;
    let mut out_actual = ActualBuffer::default();
    let mut err_actual = ActualBuffer::default();

    for directive in script.directives() {
        if remaining_inputs == 0 && !stdin_closed {
            handle.close_stdin();
            stdin_closed = true;
            remaining_inputs = -1;
        }

        if verbose {
            echo(stdout, directive);
        }

        match directive {
            Directive::Input(data) => {
                handle
                    .write_stdin(data)
                    .map_err(|e| lift_recv_error(e, "writing to stdin"))?;
                remaining_inputs -= 1;
            }
            Directive::ExpectOut(want) => {
                matcher::expect(handle.stdout(), Stream::Stdout, want, &mut out_actual, handle.deadline())?;
            }
            Directive::ExpectErr(want) => {
                saw_err_directive = true;
                matcher::expect(handle.stderr(), Stream::Stderr, want, &mut err_actual, handle.deadline())?;
            }
        }
    }

    if remaining_inputs > 0 {
        return Err(Error::fatal(
            "internal error: script executor and parser disagree on input count",
        ));
    }
    if !stdin_closed {
        handle.close_stdin();
    }

    check_residual(handle.stdout(), Stream::Stdout, &out_actual, handle.deadline())?;
    check_residual(handle.stderr(), Stream::Stderr, &err_actual, handle.deadline())?;
    handle.close_stdout();
    handle.close_stderr();

    Ok(saw_err_directive)
}

fn echo(stdout: &mut dyn Write, directive: &Directive) {
    let _ = stdout.write_all(&[directive.marker()]);
    let data = directive.data();
    let _ = stdout.write_all(data);
    if !data.ends_with(b"\n") {
        let _ = stdout.write_all(b"\n");
    }
}

fn check_residual(
    pipe: &mut crate::harness::OutputPipe,
    what: Stream,
    actual: &ActualBuffer,
    deadline: Instant,
) -> Result<(), Error> {
    if !actual.is_empty() {
        return Err(Error::fail(residual_message(what, actual.bytes())));
    }
    if let Some(extra) = matcher::read_residual(pipe, RESIDUAL_LIMIT, deadline)? {
        if !extra.is_empty() {
            return Err(Error::fail(residual_message(what, &extra)));
        }
    }
    Ok(())
}

fn residual_message(what: Stream, bytes: &[u8]) -> String {
    let label = match what {
        Stream::Stdout => "extra output",
        Stream::Stderr => "extra error output",
    };
    format!("{label}: {}", String::from_utf8_lossy(bytes))
}

fn finish(mut handle: Handle, saw_err_directive: bool) -> Result<(), Error> {
    let status = match handle.wait() {
        Ok(status) => status,
        Err(e) => {
            handle.close();
            return Err(e);
        }
    };
    handle.close();

    if saw_err_directive {
        if status.success() {
            return Err(Error::fail("produced error output but exit code was 0"));
        }
    } else if !status.success() {
        return Err(Error::fail(exit_code_message(status)));
    }
    Ok(())
}

fn exit_code_message(status: std::process::ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit code {code}"),
        None => "exit code <interrupted>".to_owned(),
    }
}

/// Lift an I/O-layer [`harness::RecvError`] into the common [`Error`] type,
/// used for stdin-write failures (the matcher handles its own read-side
/// conversions).
pub(crate) fn lift_recv_error(e: crate::harness::RecvError, context: &str) -> Error {
    match e {
        crate::harness::RecvError::Deadline => Error::fail("time limit exceeded"),
        crate::harness::RecvError::Io(io_err) => Error::new(Kind::Fail, format!("{context}: {io_err}")),
    }
}
