//! Errors raised while translating VM code.
//!
//! Parsing and segment addressing failures are tied to the unit and line
//! they came from via [`UnitError`]; [`Error`] adds the file-system side of
//! the driver.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A line of VM text that does not form a valid command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown command `{0}`")]
    UnknownCommand(String),

    #[error("`{command}` is missing its {operand} operand")]
    MissingOperand {
        command: &'static str,
        operand: &'static str,
    },

    #[error("`{0}` is not a non-negative integer in 0..=32767")]
    InvalidNumber(String),

    #[error("unknown segment `{0}`")]
    UnknownSegment(String),

    #[error("`{0}` is not a valid symbol")]
    InvalidSymbol(String),

    #[error("unexpected trailing input `{0}`")]
    TrailingInput(String),

    #[error("label `{0}` clashes with generated return addresses")]
    ReservedLabel(String),
}

/// A segment access the target memory layout cannot express.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentRangeError {
    #[error("pointer index {0} is out of range (expected 0 or 1)")]
    Pointer(u16),

    #[error("temp index {0} is out of range (expected 0..=7)")]
    Temp(u16),

    #[error("cannot pop into the constant segment")]
    PopConstant,
}

/// Translator settings the target cannot honour.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OptionsError {
    #[error("entry function `{0}` is not a valid symbol")]
    Entry(String),

    #[error("stack base {0} does not fit an address literal (expected 0..=32767)")]
    StackBase(u16),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Segment(#[from] SegmentRangeError),
}

/// A failure inside one translation unit, located by 1-based line number.
/// Line 0 means the unit as a whole, such as a name that is not a symbol.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{origin}:{line}: {kind}")]
pub struct UnitError {
    pub origin: String,
    pub line: usize,
    #[source]
    pub kind: ErrorKind,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}: not a .vm file", .0.display())]
    NotVmFile(PathBuf),

    #[error("{}: no .vm files found", .0.display())]
    NoSources(PathBuf),

    #[error(transparent)]
    Options(#[from] OptionsError),

    #[error(transparent)]
    Unit(#[from] UnitError),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
