//! Error model shared by CST construction and evaluation.
//!
//! Errors carry an [`ErrorKind`] (static, dynamic, internal) and an XPath-style
//! [`ErrorCode`]. Static errors abort a compilation; dynamic errors abort only
//! the evaluation call that raised them.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Static,
    Dynamic,
    /// A parse-tree shape the grammar cannot produce reached the builder.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Static => write!(f, "static"),
            ErrorKind::Dynamic => write!(f, "dynamic"),
            ErrorKind::Internal => write!(f, "internal"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    XPST0003, // syntax error
    XPST0008, // unbound variable
    XPST0017, // unknown function name/arity
    XPST0081, // prefix not expandable
    XQST0070, // namespace misuse
    MPST0001, // project specific: nesting depth limit exceeded
    XPDY0002, // context is empty
    XPTY0004, // type error
    XPTY0018, // path result mixes nodes and atomic values
    XPTY0019, // path step on a non-node
    XPTY0020, // axis step with atomic focus
    FORG0006, // invalid argument type (effective boolean value)
    FOAR0001, // division by zero
    FOAR0002, // numeric overflow
    FOTY0012, // node has no typed value
    FOCA0002, // invalid lexical value
    FOER0000, // unidentified error
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        use ErrorCode::*;
        match self {
            XPST0003 => "err:XPST0003",
            XPST0008 => "err:XPST0008",
            XPST0017 => "err:XPST0017",
            XPST0081 => "err:XPST0081",
            XQST0070 => "err:XQST0070",
            MPST0001 => "err:MPST0001",
            XPDY0002 => "err:XPDY0002",
            XPTY0004 => "err:XPTY0004",
            XPTY0018 => "err:XPTY0018",
            XPTY0019 => "err:XPTY0019",
            XPTY0020 => "err:XPTY0020",
            FORG0006 => "err:FORG0006",
            FOAR0001 => "err:FOAR0001",
            FOAR0002 => "err:FOAR0002",
            FOTY0012 => "err:FOTY0012",
            FOCA0002 => "err:FOCA0002",
            FOER0000 => "err:FOER0000",
            Internal => "err:INTERNAL",
        }
    }

    pub fn from_code(s: &str) -> Option<Self> {
        use ErrorCode::*;
        Some(match s {
            "err:XPST0003" => XPST0003,
            "err:XPST0008" => XPST0008,
            "err:XPST0017" => XPST0017,
            "err:XPST0081" => XPST0081,
            "err:XQST0070" => XQST0070,
            "err:MPST0001" => MPST0001,
            "err:XPDY0002" => XPDY0002,
            "err:XPTY0004" => XPTY0004,
            "err:XPTY0018" => XPTY0018,
            "err:XPTY0019" => XPTY0019,
            "err:XPTY0020" => XPTY0020,
            "err:FORG0006" => FORG0006,
            "err:FOAR0001" => FOAR0001,
            "err:FOAR0002" => FOAR0002,
            "err:FOTY0012" => FOTY0012,
            "err:FOCA0002" => FOCA0002,
            "err:FOER0000" => FOER0000,
            "err:INTERNAL" => Internal,
            _ => return None,
        })
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} error: {message} ({code})")]
pub struct Error {
    pub kind: ErrorKind,
    pub code: ErrorCode,
    pub message: String,
}

impl Error {
    pub fn static_err(code: ErrorCode, msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Static, code, message: msg.into() }
    }

    pub fn dynamic(code: ErrorCode, msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Dynamic, code, message: msg.into() }
    }

    /// Builder/grammar disagreement. Trips in debug builds; surfaces as an
    /// internal error in release builds.
    pub fn defect(msg: impl Into<String>) -> Self {
        let message = msg.into();
        debug_assert!(false, "CST builder defect: {message}");
        Self { kind: ErrorKind::Internal, code: ErrorCode::Internal, message }
    }

    pub fn is_static(&self) -> bool {
        self.kind == ErrorKind::Static
    }

    pub fn is_dynamic(&self) -> bool {
        self.kind == ErrorKind::Dynamic
    }

    pub fn context_empty() -> Self {
        Self::dynamic(ErrorCode::XPDY0002, "context is empty")
    }
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
