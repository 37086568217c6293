//! Reassembles arbitrary-sized byte chunks into complete frames, and
//! diverts sustained binary input away from the framing path.
//!
//! The assembler is a pure state machine: the caller owns the clock (the
//! quiet-interval exit is signalled via [`FrameAssembler::quiet_elapsed`])
//! and all file I/O (binary bytes are surfaced as events, not written here).

use crate::frame::Frame;
use crate::MAX_FRAME_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Text,
    Binary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryExitReason {
    /// A `$` appeared in the binary stream; framing resumes from it.
    Resync,
    /// The configured quiet interval elapsed with no bytes at all.
    Quiet,
    /// The device reconnected; nothing mid-stream can be trusted.
    Reset,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AssemblerEvent {
    /// A complete `$…*HH` span, CR/LF consumed.
    Frame(Frame),
    /// Residue discarded after exceeding [`MAX_FRAME_LEN`] without
    /// completing a frame. One FRAME_TOO_LONG record per event.
    OversizeDiscard { len: usize },
    /// The consecutive-binary-byte run crossed the threshold. The caller
    /// opens a blob file; the bytes follow as `BinaryData`.
    BinaryEntered,
    /// Bytes to append to the current blob file, in arrival order.
    BinaryData(Vec<u8>),
    BinaryExited(BinaryExitReason),
}

/// Printable ASCII plus CR/LF is "text"; everything else feeds the
/// binary-run counter.
fn is_text_byte(b: u8) -> bool {
    (0x20..=0x7E).contains(&b) || b == b'\r' || b == b'\n'
}

#[derive(Debug)]
pub struct FrameAssembler {
    residue: Vec<u8>,
    /// Length of the current run of consecutive non-text bytes.
    binary_run: usize,
    binary_threshold: usize,
    mode: Mode,
}

impl FrameAssembler {
    pub fn new(binary_threshold: usize) -> FrameAssembler {
        FrameAssembler {
            residue: Vec::new(),
            binary_run: 0,
            binary_threshold,
            mode: Mode::Text,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[cfg(test)]
    fn residue_len(&self) -> usize {
        self.residue.len()
    }

    /// Feeds one chunk and returns the events it produced, in order.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<AssemblerEvent> {
        let mut events = Vec::new();
        let mut input = chunk;
        while !input.is_empty() {
            input = match self.mode {
                Mode::Binary => self.advance_binary(input, &mut events),
                Mode::Text => self.advance_text(input, &mut events),
            };
        }
        events
    }

    /// The caller observed `binary_quiet_ms` of silence while in Binary
    /// mode; close out and return to framing.
    pub fn quiet_elapsed(&mut self) -> Option<AssemblerEvent> {
        if self.mode != Mode::Binary {
            return None;
        }
        self.mode = Mode::Text;
        self.binary_run = 0;
        self.residue.clear();
        Some(AssemblerEvent::BinaryExited(BinaryExitReason::Quiet))
    }

    /// Discards all carry-over after a device reconnect. A device that
    /// dropped is not guaranteed to resume mid-sentence, so gluing the two
    /// byte runs together would fabricate frames that never existed.
    pub fn reset(&mut self) -> Option<AssemblerEvent> {
        self.residue.clear();
        self.binary_run = 0;
        if self.mode == Mode::Binary {
            self.mode = Mode::Text;
            return Some(AssemblerEvent::BinaryExited(BinaryExitReason::Reset));
        }
        None
    }

    fn advance_binary<'a>(
        &mut self,
        input: &'a [u8],
        events: &mut Vec<AssemblerEvent>,
    ) -> &'a [u8] {
        match input.iter().position(|&b| b == b'$') {
            Some(pos) => {
                if pos > 0 {
                    events.push(AssemblerEvent::BinaryData(input[..pos].to_vec()));
                }
                events.push(AssemblerEvent::BinaryExited(BinaryExitReason::Resync));
                self.mode = Mode::Text;
                self.binary_run = 0;
                &input[pos..]
            }
            None => {
                events.push(AssemblerEvent::BinaryData(input.to_vec()));
                &[]
            }
        }
    }

    fn advance_text<'a>(&mut self, input: &'a [u8], events: &mut Vec<AssemblerEvent>) -> &'a [u8] {
        // Track the consecutive-binary run across chunk boundaries; any
        // text byte (which includes every byte of a well-formed frame)
        // resets it.
        for (i, &b) in input.iter().enumerate() {
            if is_text_byte(b) {
                self.binary_run = 0;
                continue;
            }
            self.binary_run += 1;
            if self.binary_run >= self.binary_threshold {
                events.push(AssemblerEvent::BinaryEntered);
                let mut blob = std::mem::take(&mut self.residue);
                blob.extend_from_slice(&input[..=i]);
                if !blob.is_empty() {
                    events.push(AssemblerEvent::BinaryData(blob));
                }
                self.mode = Mode::Binary;
                self.binary_run = 0;
                return &input[i + 1..];
            }
        }
        self.residue.extend_from_slice(input);
        self.drain_frames(events);
        &[]
    }

    fn drain_frames(&mut self, events: &mut Vec<AssemblerEvent>) {
        loop {
            let Some(dollar) = self.residue.iter().position(|&b| b == b'$') else {
                // Nothing frameable; bound how long we wait for a `$`.
                if self.residue.len() > MAX_FRAME_LEN {
                    let len = self.residue.len();
                    self.residue.clear();
                    events.push(AssemblerEvent::OversizeDiscard { len });
                }
                return;
            };
            if dollar > 0 {
                // Pre-`$` noise; already accounted by the binary-run scan.
                self.residue.drain(..dollar);
                continue;
            }
            let Some(star) = self.residue[1..].iter().position(|&b| b == b'*').map(|p| p + 1)
            else {
                if self.residue.len() > MAX_FRAME_LEN {
                    self.discard_oversize(events);
                    continue;
                }
                return;
            };
            let end = star + 3;
            if end > self.residue.len() {
                // Checksum digits not yet arrived.
                if self.residue.len() > MAX_FRAME_LEN {
                    self.discard_oversize(events);
                    continue;
                }
                return;
            }
            if end > MAX_FRAME_LEN {
                self.discard_oversize(events);
                continue;
            }
            let span: Vec<u8> = self.residue.drain(..end).collect();
            if self.residue.first() == Some(&b'\r') {
                self.residue.remove(0);
            }
            if self.residue.first() == Some(&b'\n') {
                self.residue.remove(0);
            }
            events.push(AssemblerEvent::Frame(Frame::from_span(span)));
        }
    }

    /// The residue starts at a `$` but cannot complete a frame within
    /// bounds. Restart the search from the latest `$` whose tail could
    /// still frame; discard everything ahead of it.
    fn discard_oversize(&mut self, events: &mut Vec<AssemblerEvent>) {
        let keep = self.residue[1..]
            .iter()
            .rposition(|&b| b == b'$')
            .map(|p| p + 1)
            .filter(|&p| self.residue.len() - p <= MAX_FRAME_LEN);
        let len = match keep {
            Some(p) => {
                self.residue.drain(..p);
                p
            }
            None => {
                let len = self.residue.len();
                self.residue.clear();
                len
            }
        };
        events.push(AssemblerEvent::OversizeDiscard { len });
    }
}
