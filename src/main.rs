use std::io::Write;

use invigilate::cli::{Options, Parsed};
use invigilate::error::Kind;
use invigilate::{discovery, engine, script, Summary};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("INVIGILATE_LOG")
                .or_else(|_| tracing_subscriber::EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let code = run(std::env::args().skip(1));
    std::process::exit(code);
}

fn run(args: impl IntoIterator<Item = String>) -> i32 {
    let opts = match Options::parse(args) {
        Ok(Parsed::Help) => {
            eprintln!("{}", invigilate::cli::USAGE);
            return 0;
        }
        Ok(Parsed::Options(opts)) => opts,
        Err(e) => {
            eprintln!("{}", invigilate::cli::USAGE);
            eprintln!("{e}");
            return 1;
        }
    };

    let rx = discovery::discover(opts.roots.clone(), opts.extension.clone());
    let mut summary = Summary::default();
    let stdout = std::io::stdout();

    for job in rx {
        let mut stdout_lock = stdout.lock();
        match job.content {
            Err(e) => {
                eprintln!("{}: {e}", job.path.display());
                summary.record(&e);
            }
            Ok(content) => {
                let script = script::parse(&content, opts.comment.as_bytes());
                let result = engine::run(
                    &opts.argv,
                    &job.path,
                    &script,
                    opts.limit,
                    opts.verbose,
                    &mut stdout_lock,
                );
                if let Err(e) = result {
                    if *e.kind() == Kind::Fatal {
                        eprintln!("{}: {e}", job.path.display());
                        let _ = stdout_lock.flush();
                        eprintln!("{}", summary.summary_line());
                        return 1;
                    }
                    eprintln!("{}: {e}", job.path.display());
                    summary.record(&e);
                }
            }
        }
        let _ = stdout_lock.flush();
    }

    eprintln!("{}", summary.summary_line());
    summary.exit_code()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_with_missing_separator_is_usage_failure() {
        let code = run(["myprog".to_owned(), "a.test".to_owned()]);
        assert_eq!(code, 1);
    }
}
