//! Maps each frame to exactly one classification outcome: a typed record,
//! or a diagnosis explaining why there is none. Either way the frame also
//! lands in the raw table; the outcome only decides which second row is
//! written next to it.

use crate::checksum;
use crate::frame::Frame;
use crate::parser::{self, ParserOptions};
use crate::record::{ParsedRecord, Prefix};
use adcp_common::error::ParseErrorKind;

/// Everything a `parse_errors` row needs.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameError {
    pub kind: ParseErrorKind,
    pub message: String,
    pub prefix: Option<String>,
    pub checksum_expected: Option<String>,
    pub checksum_actual: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Parsed(ParsedRecord),
    Failed(FrameError),
}

impl Outcome {
    pub fn is_parsed(&self) -> bool {
        matches!(self, Outcome::Parsed(_))
    }
}

pub fn classify(frame: &Frame, options: &ParserOptions) -> Outcome {
    let computed = checksum::to_hex(frame.computed_checksum());
    let asserted_text = frame.asserted_checksum_text().into_owned();
    let prefix_text = frame.prefix().into_owned();

    let Some(asserted) = frame.asserted_checksum() else {
        return Outcome::Failed(FrameError {
            kind: ParseErrorKind::BadChecksumFormat,
            message: format!("checksum {asserted_text:?} is not two hex digits"),
            prefix: Some(prefix_text),
            checksum_expected: Some(computed),
            checksum_actual: Some(asserted_text),
        });
    };
    if asserted != frame.computed_checksum() {
        return Outcome::Failed(FrameError {
            kind: ParseErrorKind::ChecksumMismatch,
            message: format!("computed {computed}, sentence asserts {asserted_text}"),
            prefix: Some(prefix_text),
            checksum_expected: Some(computed),
            checksum_actual: Some(asserted_text),
        });
    }

    let Ok(body) = std::str::from_utf8(frame.body()) else {
        return Outcome::Failed(FrameError {
            kind: ParseErrorKind::DecodeError,
            message: "sentence body is not valid ASCII text".to_owned(),
            prefix: Some(prefix_text),
            checksum_expected: Some(computed),
            checksum_actual: Some(asserted_text),
        });
    };
    let mut parts = body.split(',');
    let token = parts.next().unwrap_or_default();
    let Some(prefix) = Prefix::from_token(token) else {
        return Outcome::Failed(FrameError {
            kind: ParseErrorKind::UnknownPrefix,
            message: format!("prefix {token:?} is not in the sentence registry"),
            prefix: Some(prefix_text),
            checksum_expected: Some(computed),
            checksum_actual: Some(asserted_text),
        });
    };
    let fields: Vec<&str> = parts.collect();
    match parser::parse(prefix, &fields, options) {
        Ok(record) => Outcome::Parsed(record),
        Err(err) => Outcome::Failed(FrameError {
            kind: err.kind,
            message: err.message,
            prefix: Some(prefix_text),
            checksum_expected: Some(computed),
            checksum_actual: Some(asserted_text),
        }),
    }
}
