//! Translator from the stack-based VM language to Hack assembly.
//!
//! A program is one or more translation units (`.vm` files). They are fed
//! through a single [`Translator`] in order, which bootstraps the program,
//! lays out the call frames and keeps every generated symbol unique.

pub mod ast;
pub mod driver;
pub mod error;
pub mod labels;
pub mod parser;
pub mod segment;
pub mod translator;

pub use ast::{Command, Op, Segment};
pub use error::{Error, ErrorKind, OptionsError, ParseError, SegmentRangeError, UnitError};
pub use parser::Parser;
pub use translator::{Options, Translator};

/// Translates in-memory units, given as `(unit name, source)` pairs, into
/// one listing.
pub fn translate_units<'a>(
    units: impl IntoIterator<Item = (&'a str, &'a str)>,
    options: Options,
) -> Result<Vec<String>, Error> {
    let mut translator = Translator::new(options)?;
    for (unit, source) in units {
        translator.translate_unit(unit, unit, source)?;
    }
    Ok(translator.finish())
}
