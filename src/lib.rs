//! # invigilate
//!
//! A black-box test driver for a single program-under-test (PUT). Each test
//! case is a file that embeds, in specially-marked comment lines, a complete
//! script of the standard input the PUT should receive and the standard
//! output and standard error it must produce. The driver runs the PUT once
//! per test file and verifies, in real time and in order, that the PUT's
//! actual I/O matches the scripted I/O.
//!
//! The hard part lives in [`engine`]: it spawns a child process, streams
//! input to it, reads two concurrent output streams back, and synchronises
//! all of that against a single ordered [`script::Script`] under an absolute
//! wall-clock deadline. Everything else in this crate — [`discovery`],
//! [`cli`] — exists only to make that engine into a runnable binary.

pub mod cli;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod harness;
pub mod matcher;
pub mod script;

pub use error::{Error, Kind};

/// Aggregate pass/fail counters for one invocation of the driver, and the
/// exit-code policy built on top of them.
#[derive(Default, Debug, Clone, Copy)]
pub struct Summary {
    pub fail_count: usize,
    pub error_count: usize,
}

impl Summary {
    pub fn record(&mut self, error: &Error) {
        match error.kind() {
            Kind::Fail => self.fail_count += 1,
            Kind::Other => self.error_count += 1,
            Kind::Fatal => {}
        }
    }

    /// `0` if every test passed and no other errors occurred, `1` otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.fail_count == 0 && self.error_count == 0 {
            0
        } else {
            1
        }
    }

    pub fn summary_line(&self) -> String {
        if self.error_count > 0 {
            format!(
                "{} failed tests; {} other errors",
                self.fail_count, self.error_count
            )
        } else {
            format!("{} failed tests", self.fail_count)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_line_without_errors() {
        let summary = Summary {
            fail_count: 3,
            error_count: 0,
        };
        assert_eq!(summary.summary_line(), "3 failed tests");
        assert_eq!(summary.exit_code(), 1);
    }

    #[test]
    fn summary_line_with_errors() {
        let summary = Summary {
            fail_count: 0,
            error_count: 1,
        };
        assert_eq!(summary.summary_line(), "0 failed tests; 1 other errors");
        assert_eq!(summary.exit_code(), 1);
    }

    #[test]
    fn clean_run_exits_zero() {
        let summary = Summary::default();
        assert_eq!(summary.exit_code(), 0);
    }
}
