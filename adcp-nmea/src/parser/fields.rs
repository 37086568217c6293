//! Shared field-level validation: the sentinel family, the bounds
//! catalogue, and the positional/tagged readers every parser builds on.

use super::ParseError;
use adcp_common::error::ParseErrorKind;
use regex::Regex;
use std::sync::OnceLock;

/// Inclusive numeric bounds for one field of the catalogue.
#[derive(Debug, Clone, Copy)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const fn new(min: f64, max: f64) -> Bounds {
        Bounds { min, max }
    }

    fn contains(&self, v: f64) -> bool {
        v >= self.min && v <= self.max
    }
}

/// The frozen bounds catalogue. Reference data, not design: values come
/// from the DF100-series instrument documentation.
pub mod bounds {
    use super::Bounds;

    pub const INSTRUMENT_TYPE: Bounds = Bounds::new(0.0, 10.0);
    pub const BEAM_COUNT: Bounds = Bounds::new(1.0, 4.0);
    pub const CELL_COUNT: Bounds = Bounds::new(1.0, 1000.0);
    pub const BLANKING_DISTANCE: Bounds = Bounds::new(0.0, 100.0);
    pub const CELL_SIZE: Bounds = Bounds::new(0.01, 100.0);
    pub const BATTERY_VOLTAGE: Bounds = Bounds::new(0.0, 30.0);
    pub const SOUND_SPEED: Bounds = Bounds::new(1300.0, 1700.0);
    pub const DIRECTION: Bounds = Bounds::new(0.0, 360.0);
    pub const TILT: Bounds = Bounds::new(-90.0, 90.0);
    pub const PRESSURE: Bounds = Bounds::new(0.0, 1000.0);
    pub const TEMPERATURE: Bounds = Bounds::new(-4.0, 40.0);
    pub const ANALOG_INPUT: Bounds = Bounds::new(0.0, 65535.0);
    pub const CELL_NUMBER: Bounds = Bounds::new(1.0, 1000.0);
    pub const VELOCITY: Bounds = Bounds::new(-25.0, 25.0);
    pub const SPEED: Bounds = Bounds::new(0.0, 25.0);
    pub const AMPLITUDE: Bounds = Bounds::new(0.0, 255.0);
    pub const CORRELATION: Bounds = Bounds::new(0.0, 100.0);
    pub const WAVE_HEIGHT: Bounds = Bounds::new(0.0, 100.0);
    pub const WAVE_PERIOD: Bounds = Bounds::new(0.0, 100.0);
    pub const FREQUENCY: Bounds = Bounds::new(0.0, 10.0);
    pub const SPECTRUM_BASIS: Bounds = Bounds::new(0.0, 3.0);
    pub const PROCESSING_METHOD: Bounds = Bounds::new(0.0, 10.0);
    pub const DETECT_COUNT: Bounds = Bounds::new(0.0, 100_000.0);
    pub const UNIDIRECTIVITY: Bounds = Bounds::new(0.0, 1.0);
    pub const ALTIMETER_DISTANCE: Bounds = Bounds::new(0.0, 200.0);
    pub const ALTIMETER_QUALITY: Bounds = Bounds::new(0.0, 65535.0);
    pub const BIN_COUNT: Bounds = Bounds::new(1.0, 2048.0);
    pub const ENERGY_DENSITY: Bounds = Bounds::new(0.0, 1_000_000.0);
    pub const FOURIER_COEFFICIENT: Bounds = Bounds::new(-1.0, 1.0);
}

/// The INVALID sentinel family: `-9` followed by nothing but nines or
/// nothing but zeros, with an optional all-zero fraction. Covers `-9`,
/// `-9.0`, `-9.00`, `-90`, `-900`, `-999`, `-9999`, `-999.000`, …
pub fn is_invalid_sentinel(raw: &str) -> bool {
    let Some(rest) = raw.strip_prefix("-9") else {
        return false;
    };
    let (int_part, frac_part) = match rest.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rest, None),
    };
    let int_ok = int_part.is_empty()
        || int_part.bytes().all(|b| b == b'9')
        || int_part.bytes().all(|b| b == b'0');
    let frac_ok = match frac_part {
        Some(f) => !f.is_empty() && f.bytes().all(|b| b == b'0'),
        None => true,
    };
    int_ok && frac_ok
}

fn is_six_digit(raw: &str) -> bool {
    raw.len() == 6 && raw.bytes().all(|b| b.is_ascii_digit())
}

fn is_hex_word(raw: &str) -> bool {
    !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_hexdigit())
}

fn head_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9 ._-]*$").expect("head-id pattern is valid")
    })
}

/// Head ids are free-form instrument serial labels; the length limit is a
/// knob because the documentation disagrees with itself (20 vs 30).
pub fn validate_head_id(raw: &str, max_len: usize) -> Result<String, ParseError> {
    if raw.len() > max_len {
        return Err(ParseError::new(
            ParseErrorKind::DecodeError,
            format!("head id longer than {max_len} characters: {raw:?}"),
        ));
    }
    if !head_id_pattern().is_match(raw) {
        return Err(ParseError::new(
            ParseErrorKind::DecodeError,
            format!("head id is not a serial label: {raw:?}"),
        ));
    }
    Ok(raw.to_owned())
}

/// Coordinate system as either the numeric code or the name the tagged
/// variants carry. Canonical storage is the code: 0=ENU, 1=XYZ, 2=BEAM.
pub fn coord_system_code(raw: &str) -> Result<Option<i64>, ParseError> {
    if raw.is_empty() {
        return Ok(None);
    }
    match raw.to_ascii_uppercase().as_str() {
        "0" | "ENU" => Ok(Some(0)),
        "1" | "XYZ" => Ok(Some(1)),
        "2" | "BEAM" => Ok(Some(2)),
        other if other.bytes().all(|b| b.is_ascii_digit()) => Err(ParseError::new(
            ParseErrorKind::RangeViolation,
            format!("coordinate system code out of range: {other}"),
        )),
        other => Err(ParseError::new(
            ParseErrorKind::DecodeError,
            format!("unrecognised coordinate system: {other}"),
        )),
    }
}

fn decode_f64(
    name: &str,
    raw: &str,
    limits: Bounds,
    invalid: &mut bool,
) -> Result<Option<f64>, ParseError> {
    if raw.is_empty() {
        return Ok(None);
    }
    if is_invalid_sentinel(raw) {
        *invalid = true;
        return Ok(None);
    }
    let value: f64 = raw.parse().map_err(|_| {
        ParseError::new(
            ParseErrorKind::DecodeError,
            format!("{name} is not a number: {raw:?}"),
        )
    })?;
    if !limits.contains(value) {
        return Err(ParseError::new(
            ParseErrorKind::RangeViolation,
            format!(
                "{name}={value} outside [{}, {}]",
                limits.min, limits.max
            ),
        ));
    }
    Ok(Some(value))
}

fn decode_i64(
    name: &str,
    raw: &str,
    limits: Bounds,
    invalid: &mut bool,
) -> Result<Option<i64>, ParseError> {
    if raw.is_empty() {
        return Ok(None);
    }
    if is_invalid_sentinel(raw) {
        *invalid = true;
        return Ok(None);
    }
    let value: i64 = raw.parse().map_err(|_| {
        ParseError::new(
            ParseErrorKind::DecodeError,
            format!("{name} is not an integer: {raw:?}"),
        )
    })?;
    if !limits.contains(value as f64) {
        return Err(ParseError::new(
            ParseErrorKind::RangeViolation,
            format!(
                "{name}={value} outside [{}, {}]",
                limits.min, limits.max
            ),
        ));
    }
    Ok(Some(value))
}

fn decode_date(name: &str, raw: &str) -> Result<Option<String>, ParseError> {
    if raw.is_empty() {
        return Ok(None);
    }
    if !is_six_digit(raw) {
        return Err(ParseError::new(
            ParseErrorKind::DecodeError,
            format!("{name} is not a six-digit stamp: {raw:?}"),
        ));
    }
    Ok(Some(raw.to_owned()))
}

fn decode_hex(name: &str, raw: &str) -> Result<Option<String>, ParseError> {
    if raw.is_empty() {
        return Ok(None);
    }
    if !is_hex_word(raw) {
        return Err(ParseError::new(
            ParseErrorKind::DecodeError,
            format!("{name} is not hex: {raw:?}"),
        ));
    }
    Ok(Some(raw.to_owned()))
}

/// Index-addressed field access for positional variants.
#[derive(Debug)]
pub struct PositionalReader<'a> {
    fields: &'a [&'a str],
    index: usize,
    invalid: bool,
}

impl<'a> PositionalReader<'a> {
    /// Fixed-shape constructor: the variant publishes exactly `expected`
    /// fields.
    pub fn exact(
        variant: &str,
        fields: &'a [&'a str],
        expected: usize,
    ) -> Result<PositionalReader<'a>, ParseError> {
        if fields.len() != expected {
            return Err(ParseError::new(
                ParseErrorKind::FieldCount,
                format!("{variant} expects {expected} fields, got {}", fields.len()),
            ));
        }
        Ok(PositionalReader {
            fields,
            index: 0,
            invalid: false,
        })
    }

    /// Variable-shape constructor for length-prefixed variants; the header
    /// must be present, the tail is checked by the caller once the length
    /// field has been read.
    pub fn at_least(
        variant: &str,
        fields: &'a [&'a str],
        header: usize,
    ) -> Result<PositionalReader<'a>, ParseError> {
        if fields.len() < header {
            return Err(ParseError::new(
                ParseErrorKind::FieldCount,
                format!(
                    "{variant} expects at least {header} fields, got {}",
                    fields.len()
                ),
            ));
        }
        Ok(PositionalReader {
            fields,
            index: 0,
            invalid: false,
        })
    }

    fn next(&mut self) -> &'a str {
        let raw = self.fields.get(self.index).copied().unwrap_or("");
        self.index += 1;
        raw
    }

    pub fn remaining(&self) -> usize {
        self.fields.len().saturating_sub(self.index)
    }

    /// Free-text field; empty is lawful and becomes `None`.
    pub fn string(&mut self) -> Option<String> {
        let raw = self.next();
        (!raw.is_empty()).then(|| raw.to_owned())
    }

    pub fn raw(&mut self) -> &'a str {
        self.next()
    }

    pub fn date(&mut self, name: &str) -> Result<Option<String>, ParseError> {
        decode_date(name, self.next())
    }

    pub fn hex(&mut self, name: &str) -> Result<Option<String>, ParseError> {
        decode_hex(name, self.next())
    }

    pub fn f64(&mut self, name: &str, limits: Bounds) -> Result<Option<f64>, ParseError> {
        let raw = self.next();
        decode_f64(name, raw, limits, &mut self.invalid)
    }

    pub fn i64(&mut self, name: &str, limits: Bounds) -> Result<Option<i64>, ParseError> {
        let raw = self.next();
        decode_i64(name, raw, limits, &mut self.invalid)
    }

    /// True when any field carried the INVALID sentinel.
    pub fn saw_invalid(&self) -> bool {
        self.invalid
    }
}

/// Tag→value access for tagged variants. Construction rejects duplicate
/// tags and malformed pairs; [`TagMap::finish`] rejects leftovers.
#[derive(Debug)]
pub struct TagMap<'a> {
    variant: &'static str,
    entries: Vec<(&'a str, &'a str)>,
    invalid: bool,
}

impl<'a> TagMap<'a> {
    pub fn new(variant: &'static str, fields: &'a [&'a str]) -> Result<TagMap<'a>, ParseError> {
        let mut entries: Vec<(&str, &str)> = Vec::with_capacity(fields.len());
        for field in fields {
            if field.is_empty() {
                continue;
            }
            let Some((tag, value)) = field.split_once('=') else {
                return Err(ParseError::new(
                    ParseErrorKind::DecodeError,
                    format!("{variant} carries a field without '=': {field:?}"),
                ));
            };
            if entries.iter().any(|(t, _)| *t == tag) {
                return Err(ParseError::new(
                    ParseErrorKind::DuplicateTag,
                    format!("{variant} carries {tag} twice"),
                ));
            }
            entries.push((tag, value));
        }
        Ok(TagMap {
            variant,
            entries,
            invalid: false,
        })
    }

    fn take(&mut self, tag: &str) -> Option<&'a str> {
        let pos = self.entries.iter().position(|(t, _)| *t == tag)?;
        Some(self.entries.remove(pos).1)
    }

    fn require(&mut self, tag: &str) -> Result<&'a str, ParseError> {
        self.take(tag).ok_or_else(|| {
            ParseError::new(
                ParseErrorKind::MissingField,
                format!("{} is missing required tag {tag}", self.variant),
            )
        })
    }

    pub fn required_string(&mut self, tag: &str) -> Result<String, ParseError> {
        self.require(tag).map(str::to_owned)
    }

    pub fn optional_string(&mut self, tag: &str) -> Option<String> {
        self.take(tag).filter(|v| !v.is_empty()).map(str::to_owned)
    }

    pub fn required_date(&mut self, tag: &str) -> Result<Option<String>, ParseError> {
        let raw = self.require(tag)?;
        decode_date(tag, raw)
    }

    pub fn required_hex(&mut self, tag: &str) -> Result<Option<String>, ParseError> {
        let raw = self.require(tag)?;
        decode_hex(tag, raw)
    }

    pub fn required_f64(&mut self, tag: &str, limits: Bounds) -> Result<Option<f64>, ParseError> {
        let raw = self.require(tag)?;
        decode_f64(tag, raw, limits, &mut self.invalid)
    }

    pub fn optional_f64(&mut self, tag: &str, limits: Bounds) -> Result<Option<f64>, ParseError> {
        match self.take(tag) {
            Some(raw) => decode_f64(tag, raw, limits, &mut self.invalid),
            None => Ok(None),
        }
    }

    pub fn required_i64(&mut self, tag: &str, limits: Bounds) -> Result<Option<i64>, ParseError> {
        let raw = self.require(tag)?;
        decode_i64(tag, raw, limits, &mut self.invalid)
    }

    pub fn optional_i64(&mut self, tag: &str, limits: Bounds) -> Result<Option<i64>, ParseError> {
        match self.take(tag) {
            Some(raw) => decode_i64(tag, raw, limits, &mut self.invalid),
            None => Ok(None),
        }
    }

    /// Consumes the map; any tag never asked for is unregistered.
    pub fn finish(self) -> Result<bool, ParseError> {
        if let Some((tag, _)) = self.entries.first() {
            return Err(ParseError::new(
                ParseErrorKind::UnknownTag,
                format!("{} carries unregistered tag {tag}", self.variant),
            ));
        }
        Ok(self.invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_family() {
        for raw in ["-9", "-9.0", "-9.00", "-90", "-900", "-999", "-9999", "-999.000", "-90.00"] {
            assert!(is_invalid_sentinel(raw), "{raw} should be INVALID");
        }
        for raw in ["-9.5", "-95", "-8", "9", "-9.01", "-909", "-9.", "0", "-9a", ""] {
            assert!(!is_invalid_sentinel(raw), "{raw} should be a real value");
        }
    }

    #[test]
    fn sentinel_becomes_null_and_flags_the_row() {
        let fields = ["-9.00"];
        let mut reader = PositionalReader::exact("T", &fields, 1).unwrap();
        assert_eq!(reader.f64("h3", bounds::WAVE_HEIGHT).unwrap(), None);
        assert!(reader.saw_invalid());
    }

    #[test]
    fn empty_field_is_lawful_not_invalid() {
        let fields = [""];
        let mut reader = PositionalReader::exact("T", &fields, 1).unwrap();
        assert_eq!(reader.f64("v4", bounds::VELOCITY).unwrap(), None);
        assert!(!reader.saw_invalid());
    }

    #[test]
    fn out_of_range_is_a_range_violation() {
        let fields = ["361.0"];
        let mut reader = PositionalReader::exact("T", &fields, 1).unwrap();
        let err = reader.f64("heading", bounds::DIRECTION).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::RangeViolation);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let fields = ["abc"];
        let mut reader = PositionalReader::exact("T", &fields, 1).unwrap();
        let err = reader.f64("heading", bounds::DIRECTION).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::DecodeError);
    }

    #[test]
    fn wrong_field_count_is_rejected() {
        let fields = ["1", "2"];
        let err = PositionalReader::exact("T", &fields, 3).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::FieldCount);
    }

    #[test]
    fn tag_map_rejects_duplicates() {
        let fields = ["CN=3", "CN=4"];
        let err = TagMap::new("T", &fields).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::DuplicateTag);
    }

    #[test]
    fn tag_map_rejects_positional_field() {
        let fields = ["3"];
        let err = TagMap::new("T", &fields).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::DecodeError);
    }

    #[test]
    fn tag_map_reports_missing_and_unknown() {
        let fields = ["CN=3", "ZZ=1"];
        let mut map = TagMap::new("T", &fields).unwrap();
        assert_eq!(
            map.required_f64("SP", bounds::SPEED).unwrap_err().kind,
            ParseErrorKind::MissingField
        );
        let mut map = TagMap::new("T", &fields).unwrap();
        map.required_i64("CN", bounds::CELL_NUMBER).unwrap();
        assert_eq!(map.finish().unwrap_err().kind, ParseErrorKind::UnknownTag);
    }

    #[test]
    fn tag_map_skips_empty_fields() {
        let fields = ["", "CN=3", ""];
        let mut map = TagMap::new("T", &fields).unwrap();
        assert_eq!(map.required_i64("CN", bounds::CELL_NUMBER).unwrap(), Some(3));
        assert!(!map.finish().unwrap());
    }

    #[test]
    fn head_id_limit_is_configurable() {
        let long = "Signature1000900001Signature100";
        assert!(validate_head_id(long, 30).is_err());
        assert!(validate_head_id(long, 40).is_ok());
        assert!(validate_head_id("Signature1000900001", 20).is_ok());
        assert!(validate_head_id("bad\u{7}id", 30).is_err());
    }

    #[test]
    fn coord_system_accepts_codes_and_names() {
        assert_eq!(coord_system_code("0").unwrap(), Some(0));
        assert_eq!(coord_system_code("BEAM").unwrap(), Some(2));
        assert_eq!(coord_system_code("beam").unwrap(), Some(2));
        assert_eq!(coord_system_code("xyz").unwrap(), Some(1));
        assert_eq!(coord_system_code("").unwrap(), None);
        assert_eq!(
            coord_system_code("7").unwrap_err().kind,
            ParseErrorKind::RangeViolation
        );
        assert_eq!(
            coord_system_code("POLAR").unwrap_err().kind,
            ParseErrorKind::DecodeError
        );
    }

    #[test]
    fn dates_must_be_six_digits() {
        assert_eq!(decode_date("date", "102115").unwrap(), Some("102115".into()));
        assert!(decode_date("date", "1021155").is_err());
        assert!(decode_date("date", "10211a").is_err());
        assert_eq!(decode_date("date", "").unwrap(), None);
    }
}
