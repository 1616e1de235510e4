//! Parses `invigilate`'s own argv. This layer is intentionally thin: an
//! external collaborator by the original design, kept here only so the
//! binary is runnable end-to-end.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::Error;

pub const USAGE: &str = "\
invigilate [options] <program-argv...> -- <path>...

Options:
  -c <string>   comment prefix required at column 0 of a directive line [default: #]
  -e <string>   extension filter when walking directories [default: .test]
  -t <duration> per-test wall-clock limit [default: 2s]
  -v            verbose echo of directives to stdout
  -h            print this help and exit
";

pub struct Options {
    pub comment: String,
    pub extension: String,
    pub limit: Duration,
    pub verbose: bool,
    pub argv: Vec<String>,
    pub roots: Vec<PathBuf>,
}

/// Outcome of parsing argv: either a ready-to-run [`Options`], a bare
/// request for help (exit 0), or a usage error (exit non-zero).
pub enum Parsed {
    Options(Options),
    Help,
}

impl Options {
    pub fn parse(args: impl IntoIterator<Item = String>) -> Result<Parsed, Error> {
        let mut comment = "#".to_owned();
        let mut extension = ".test".to_owned();
        let mut limit = Duration::from_secs(2);
        let mut verbose = false;

        let mut args = args.into_iter().peekable();
        while let Some(arg) = args.peek() {
            match arg.as_str() {
                "-h" | "--help" => return Ok(Parsed::Help),
                "-v" => {
                    verbose = true;
                    args.next();
                }
                "-c" => {
                    args.next();
                    comment = next_value(&mut args, "-c")?;
                }
                "-e" => {
                    args.next();
                    extension = next_value(&mut args, "-e")?;
                }
                "-t" => {
                    args.next();
                    let raw = next_value(&mut args, "-t")?;
                    limit = humantime::parse_duration(&raw)
                        .map_err(|e| Error::fatal(format!("invalid -t duration {raw:?}: {e}")))?;
                }
                _ => break,
            }
        }

        let rest: Vec<String> = args.collect();
        let sep = rest
            .iter()
            .position(|a| a == "--")
            .ok_or_else(|| Error::fatal("missing `--` separator between program and test paths"))?;

        let argv = rest[..sep].to_vec();
        if argv.is_empty() {
            return Err(Error::fatal("No program specified"));
        }

        let roots: Vec<PathBuf> = rest[sep + 1..].iter().map(PathBuf::from).collect();
        if roots.is_empty() {
            return Err(Error::fatal("No test cases specified"));
        }

        Ok(Parsed::Options(Self {
            comment,
            extension,
            limit,
            verbose,
            argv,
            roots,
        }))
    }
}

fn next_value(
    args: &mut std::iter::Peekable<impl Iterator<Item = String>>,
    flag: &str,
) -> Result<String, Error> {
    args.next()
        .ok_or_else(|| Error::fatal(format!("{flag} requires a value")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    fn unwrap_opts(parsed: Parsed) -> Options {
        match parsed {
            Parsed::Options(opts) => opts,
            Parsed::Help => panic!("expected Options, got Help"),
        }
    }

    #[test]
    fn parses_defaults() {
        let opts = unwrap_opts(Options::parse(args("myprog -- tests/")).unwrap());
        assert_eq!(opts.comment, "#");
        assert_eq!(opts.extension, ".test");
        assert_eq!(opts.limit, Duration::from_secs(2));
        assert!(!opts.verbose);
        assert_eq!(opts.argv, vec!["myprog".to_owned()]);
        assert_eq!(opts.roots, vec![PathBuf::from("tests/")]);
    }

    #[test]
    fn parses_flags_before_separator() {
        let opts = unwrap_opts(
            Options::parse(args("-c // -t 500ms -v myprog --arg -- a.test b.test")).unwrap(),
        );
        assert_eq!(opts.comment, "//");
        assert_eq!(opts.limit, Duration::from_millis(500));
        assert!(opts.verbose);
        assert_eq!(opts.argv, vec!["myprog".to_owned(), "--arg".to_owned()]);
        assert_eq!(opts.roots.len(), 2);
    }

    #[test]
    fn help_flag_short_circuits() {
        assert!(matches!(Options::parse(args("-h")).unwrap(), Parsed::Help));
    }

    #[test]
    fn missing_separator_is_fatal() {
        let err = Options::parse(args("myprog a.test")).unwrap_err();
        assert_eq!(*err.kind(), crate::error::Kind::Fatal);
    }

    #[test]
    fn missing_program_is_fatal() {
        let err = Options::parse(args("-- a.test")).unwrap_err();
        assert_eq!(err.message(), "No program specified");
    }

    #[test]
    fn missing_roots_is_fatal() {
        let err = Options::parse(args("myprog --")).unwrap_err();
        assert_eq!(err.message(), "No test cases specified");
    }
}
