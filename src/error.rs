//! A single string-based error type shared by every layer of the engine.
//!
//! One place (the CLI shell's summary) ever needs to branch on *kind* of
//! error, so we tag a message with a [`Kind`] instead of building a
//! `std::error::Error` source chain nobody walks.

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Kind {
    /// The PUT violated a scripted expectation; counts toward `failCount`.
    Fail,
    /// Infrastructure problem not attributable to the PUT; counts toward `errorCount`.
    Other,
    /// Usage error or internal invariant violation; aborts the whole run.
    Fatal,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Error {
    kind: Kind,
    message: String,
}

impl Error {
    pub fn new(kind: Kind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self::new(Kind::Fail, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(Kind::Other, message)
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self::new(Kind::Fatal, message)
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.message.fmt(f)
    }
}

impl std::error::Error for Error {}
