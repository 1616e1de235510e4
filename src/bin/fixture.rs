//! A tiny, env-var-scripted program-under-test used by this crate's own
//! integration tests. Not part of the public binary; never shipped as
//! advice to end users on how to write a PUT.

use std::env;
use std::io::{self, BufRead, Write};
use std::process;

fn run() -> io::Result<i32> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    if let Ok(text) = env::var("FIXTURE_STDOUT") {
        write!(stdout, "{text}")?;
        stdout.flush()?;
    }
    if let Ok(text) = env::var("FIXTURE_STDERR") {
        eprint!("{text}");
    }

    if let Ok(prompt) = env::var("FIXTURE_PROMPT") {
        write!(stdout, "{prompt}")?;
        stdout.flush()?;
        let mut line = String::new();
        stdin.lock().read_line(&mut line)?;
        let name = line.trim_end_matches(['\n', '\r']);
        writeln!(stdout, "Hello, {name}")?;
        stdout.flush()?;
    }

    if env::var("FIXTURE_ECHO_STDIN").as_deref() == Ok("1") {
        for line in stdin.lock().lines() {
            writeln!(stdout, "{}", line?)?;
            stdout.flush()?;
        }
    }

    if let Some(millis) = env::var("FIXTURE_SLEEP_MS").ok().and_then(|s| s.parse().ok()) {
        std::thread::sleep(std::time::Duration::from_millis(millis));
    }

    if let Ok(text) = env::var("FIXTURE_EXTRA_STDOUT") {
        write!(stdout, "{text}")?;
        stdout.flush()?;
    }

    let code = env::var("FIXTURE_EXIT")
        .ok()
        .map(|v| v.parse::<i32>().unwrap_or(0))
        .unwrap_or(0);
    Ok(code)
}

fn main() {
    let code = match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("fixture: {e}");
            1
        }
    };
    process::exit(code);
}
