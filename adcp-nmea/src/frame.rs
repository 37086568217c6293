//! The immutable frame unit emitted by the assembler.

use crate::checksum;
use std::borrow::Cow;

/// One complete `$…*HH` span as it appeared on the wire, CR/LF stripped.
///
/// Invariants, upheld by the assembler: starts with `$`, contains exactly
/// one terminating `*` followed by exactly two bytes, total length at most
/// [`crate::MAX_FRAME_LEN`]. The two trailing bytes are the *asserted*
/// checksum and may be arbitrary garbage; classification decides what to do
/// about that. The frame is never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    raw: Vec<u8>,
}

impl Frame {
    /// Wraps a raw span; the caller guarantees the framing invariants.
    /// The assembler is the normal producer of frames. This exists for
    /// tests and tooling that need a frame with a hostile checksum tail.
    pub fn from_span(raw: Vec<u8>) -> Frame {
        debug_assert!(raw.len() >= 4, "minimum frame is $*HH");
        debug_assert_eq!(raw.first(), Some(&b'$'));
        debug_assert_eq!(raw.get(raw.len() - 3), Some(&b'*'));
        Frame { raw }
    }

    /// Builds a frame from a body, computing the checksum. Test and
    /// serialisation helper; wire frames come from the assembler.
    pub fn from_body(body: &str) -> Frame {
        let cs = checksum::to_hex(checksum::compute(body.as_bytes()));
        Frame {
            raw: format!("${body}*{cs}").into_bytes(),
        }
    }

    /// The verbatim bytes from `$` through the second checksum digit.
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// The verbatim sentence as text. Hostile bytes inside a span are
    /// replaced so the raw line can always be recorded.
    pub fn sentence(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.raw)
    }

    fn star_index(&self) -> usize {
        self.raw.len() - 3
    }

    /// Bytes strictly between `$` and `*`.
    pub fn body(&self) -> &[u8] {
        &self.raw[1..self.star_index()]
    }

    /// The token between `$` and the first `,` (or the `*` when the frame
    /// has no fields).
    pub fn prefix(&self) -> Cow<'_, str> {
        let body = self.body();
        let end = body.iter().position(|&b| b == b',').unwrap_or(body.len());
        String::from_utf8_lossy(&body[..end])
    }

    /// The two bytes after `*` exactly as received.
    pub fn asserted_checksum_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.raw[self.star_index() + 1..])
    }

    /// The asserted checksum, if the two bytes are hex digits.
    pub fn asserted_checksum(&self) -> Option<u8> {
        let tail = &self.raw[self.star_index() + 1..];
        checksum::parse_hex_pair(tail[0], tail[1])
    }

    pub fn computed_checksum(&self) -> u8 {
        checksum::compute(self.body())
    }

    pub fn checksum_valid(&self) -> bool {
        self.asserted_checksum() == Some(self.computed_checksum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_on_a_real_sentence() {
        let frame = Frame::from_body("PNORI,4,Signature1000900001,4,20,0.20,1.00,0");
        assert_eq!(
            frame.sentence(),
            "$PNORI,4,Signature1000900001,4,20,0.20,1.00,0*1A"
        );
        assert_eq!(frame.prefix(), "PNORI");
        assert_eq!(frame.asserted_checksum(), Some(0x1A));
        assert!(frame.checksum_valid());
    }

    #[test]
    fn prefix_of_fieldless_frame() {
        let frame = Frame::from_body("PNORA");
        assert_eq!(frame.prefix(), "PNORA");
        assert_eq!(frame.body(), b"PNORA");
    }

    #[test]
    fn mismatched_checksum_detected() {
        let frame = Frame::from_span(b"$PNORI,4*FF".to_vec());
        assert!(!frame.checksum_valid());
        assert_eq!(frame.asserted_checksum(), Some(0xFF));
        assert_eq!(frame.asserted_checksum_text(), "FF");
    }

    #[test]
    fn non_hex_checksum_is_none() {
        let frame = Frame::from_span(b"$PNORI,4*ZZ".to_vec());
        assert_eq!(frame.asserted_checksum(), None);
        assert!(!frame.checksum_valid());
    }
}
