//! Shared error vocabulary for the ingestion pipeline.

use serde::Serialize;

/// The closed set of reasons a received frame can fail classification.
///
/// Every `parse_errors` row carries exactly one kind, persisted via
/// [`ParseErrorKind::as_str`]. Parse failures are data, not exceptions: the
/// pipeline records the row and moves on to the next frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum ParseErrorKind {
    /// Computed XOR of the body differs from the asserted checksum.
    ChecksumMismatch = 0,
    /// The two bytes after `*` are not ASCII hex digits.
    BadChecksumFormat = 1,
    /// Prefix token not present in the sentence registry.
    UnknownPrefix = 2,
    /// Field count inconsistent with the variant's published shape.
    FieldCount = 3,
    /// Tagged variant lacking a required tag.
    MissingField = 4,
    /// Tagged variant carrying an unregistered tag.
    UnknownTag = 5,
    /// Same tag present twice in one sentence.
    DuplicateTag = 6,
    /// Numeric field outside its declared bounds.
    RangeViolation = 7,
    /// Field could not be parsed as its declared type.
    DecodeError = 8,
    /// Residue discarded after exceeding the maximum frame length.
    FrameTooLong = 9,
}

impl ParseErrorKind {
    pub const ALL: [ParseErrorKind; 10] = [
        ParseErrorKind::ChecksumMismatch,
        ParseErrorKind::BadChecksumFormat,
        ParseErrorKind::UnknownPrefix,
        ParseErrorKind::FieldCount,
        ParseErrorKind::MissingField,
        ParseErrorKind::UnknownTag,
        ParseErrorKind::DuplicateTag,
        ParseErrorKind::RangeViolation,
        ParseErrorKind::DecodeError,
        ParseErrorKind::FrameTooLong,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ParseErrorKind::ChecksumMismatch => "CHECKSUM_MISMATCH",
            ParseErrorKind::BadChecksumFormat => "BAD_CHECKSUM_FORMAT",
            ParseErrorKind::UnknownPrefix => "UNKNOWN_PREFIX",
            ParseErrorKind::FieldCount => "FIELD_COUNT",
            ParseErrorKind::MissingField => "MISSING_FIELD",
            ParseErrorKind::UnknownTag => "UNKNOWN_TAG",
            ParseErrorKind::DuplicateTag => "DUPLICATE_TAG",
            ParseErrorKind::RangeViolation => "RANGE_VIOLATION",
            ParseErrorKind::DecodeError => "DECODE_ERROR",
            ParseErrorKind::FrameTooLong => "FRAME_TOO_LONG",
        }
    }
}

impl std::fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::ParseErrorKind;

    #[test]
    fn kinds_round_trip_through_labels() {
        for kind in ParseErrorKind::ALL {
            let label = kind.as_str();
            assert!(label.chars().all(|c| c.is_ascii_uppercase() || c == '_'));
        }
        assert_eq!(ParseErrorKind::ALL.len(), 10);
    }
}
