//! Maps VM memory segments onto the target's RAM layout.

use crate::ast::Segment;
use crate::error::SegmentRangeError;
use crate::labels::Labels;

/// RAM address of `pointer 0`; `pointer 1` follows it.
pub const POINTER_BASE: u16 = 3;
/// RAM address of `temp 0`; temp runs through `TEMP_BASE + 7`.
pub const TEMP_BASE: u16 = 5;
const TEMP_SIZE: u16 = 8;

/// Where a segment access reads from or writes to.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Location {
    /// The index itself, no memory involved.
    Literal(u16),
    /// `RAM[RAM[base] + index]`.
    Based { base: &'static str, index: u16 },
    /// `RAM[symbol]`, where the symbol is an address or a label.
    Direct(String),
}

fn base_register(segment: Segment) -> Option<&'static str> {
    match segment {
        Segment::Local => Some("LCL"),
        Segment::Argument => Some("ARG"),
        Segment::This => Some("THIS"),
        Segment::That => Some("THAT"),
        _ => None,
    }
}

/// Resolves a `push` source.
pub fn resolve(
    segment: Segment,
    index: u16,
    labels: &mut Labels,
) -> Result<Location, SegmentRangeError> {
    if let Some(base) = base_register(segment) {
        return Ok(Location::Based { base, index });
    }

    match segment {
        Segment::Constant => Ok(Location::Literal(index)),
        Segment::Pointer if index < 2 => Ok(Location::Direct((POINTER_BASE + index).to_string())),
        Segment::Pointer => Err(SegmentRangeError::Pointer(index)),
        Segment::Temp if index < TEMP_SIZE => Ok(Location::Direct((TEMP_BASE + index).to_string())),
        Segment::Temp => Err(SegmentRangeError::Temp(index)),
        _ => Ok(Location::Direct(labels.static_slot(index))),
    }
}

/// Resolves a `pop` destination; literals are not writable.
pub fn destination(
    segment: Segment,
    index: u16,
    labels: &mut Labels,
) -> Result<Location, SegmentRangeError> {
    match resolve(segment, index, labels)? {
        Location::Literal(_) => Err(SegmentRangeError::PopConstant),
        location => Ok(location),
    }
}
