//! Per-sentence field parsers under one shared contract: field counts are
//! checked against the variant's published shape, positional fields are
//! read by index, tagged fields through a tag→value map, the `-9…` sentinel
//! family becomes NULL, and numeric fields are validated against the frozen
//! bounds catalogue in [`fields`].

use crate::record::{ParsedRecord, Prefix};
use adcp_common::error::ParseErrorKind;

pub mod fields;

mod altimeter;
mod current;
mod instrument;
mod sensor;
mod spectra;
mod waves;

/// Why a frame of a known type did not produce a [`ParsedRecord`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, message: impl Into<String>) -> ParseError {
        ParseError {
            kind,
            message: message.into(),
        }
    }
}

/// Knobs the field catalogue leaves open.
#[derive(Debug, Clone)]
pub struct ParserOptions {
    /// Maximum accepted head-id length; instrument families disagree
    /// (20 vs 30), so both pass under the default.
    pub head_id_max_len: usize,
}

impl Default for ParserOptions {
    fn default() -> ParserOptions {
        ParserOptions {
            head_id_max_len: 30,
        }
    }
}

/// Parses the comma-separated fields of a sentence (prefix and checksum
/// excluded) into the typed record for `prefix`.
pub fn parse(
    prefix: Prefix,
    fields: &[&str],
    options: &ParserOptions,
) -> Result<ParsedRecord, ParseError> {
    match prefix {
        Prefix::Pnori => instrument::parse_positional(fields, options).map(ParsedRecord::Pnori),
        Prefix::Pnori1 => instrument::parse_positional(fields, options).map(ParsedRecord::Pnori1),
        Prefix::Pnori2 => instrument::parse_tagged(fields, options).map(ParsedRecord::Pnori2),
        Prefix::Pnors => sensor::parse_pnors(fields).map(ParsedRecord::Pnors),
        Prefix::Pnors1 => sensor::parse_pnors1(fields).map(ParsedRecord::Pnors1),
        Prefix::Pnors2 => sensor::parse_pnors2(fields).map(ParsedRecord::Pnors2),
        Prefix::Pnors3 => sensor::parse_pnors3(fields).map(ParsedRecord::Pnors3),
        Prefix::Pnors4 => sensor::parse_pnors4(fields).map(ParsedRecord::Pnors4),
        Prefix::Pnorc => current::parse_pnorc(fields).map(ParsedRecord::Pnorc),
        Prefix::Pnorc1 => current::parse_pnorc1(fields).map(ParsedRecord::Pnorc1),
        Prefix::Pnorc2 => current::parse_pnorc2(fields).map(ParsedRecord::Pnorc2),
        Prefix::Pnorc3 => current::parse_pnorc3(fields).map(ParsedRecord::Pnorc3),
        Prefix::Pnorc4 => current::parse_pnorc4(fields).map(ParsedRecord::Pnorc4),
        Prefix::Pnorh3 => sensor::parse_pnorh3(fields).map(ParsedRecord::Pnorh3),
        Prefix::Pnorh4 => sensor::parse_pnorh4(fields).map(ParsedRecord::Pnorh4),
        Prefix::Pnora => altimeter::parse(fields).map(ParsedRecord::Pnora),
        Prefix::Pnorw => waves::parse_pnorw(fields).map(ParsedRecord::Pnorw),
        Prefix::Pnorb => waves::parse_pnorb(fields).map(ParsedRecord::Pnorb),
        Prefix::Pnore => spectra::parse_pnore(fields).map(ParsedRecord::Pnore),
        Prefix::Pnorf => spectra::parse_pnorf(fields).map(ParsedRecord::Pnorf),
        Prefix::Pnorwd => spectra::parse_pnorwd(fields).map(ParsedRecord::Pnorwd),
    }
}
