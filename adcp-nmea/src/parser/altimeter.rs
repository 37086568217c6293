//! Altimeter sentence: PNORA.

use super::fields::{bounds, PositionalReader};
use super::ParseError;
use crate::record::AltimeterData;

pub(super) fn parse(fields: &[&str]) -> Result<AltimeterData, ParseError> {
    let mut reader = PositionalReader::exact("PNORA", fields, 5)?;
    let date = reader.date("date")?;
    let time = reader.date("time")?;
    let distance = reader.f64("altimeter distance", bounds::ALTIMETER_DISTANCE)?;
    let quality = reader.i64("altimeter quality", bounds::ALTIMETER_QUALITY)?;
    let status = reader.hex("status")?;
    Ok(AltimeterData {
        date,
        time,
        distance,
        quality,
        status,
        has_invalid_data: reader.saw_invalid(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use adcp_common::error::ParseErrorKind;

    #[test]
    fn happy_path() {
        let fields: Vec<&str> = "102115,135734,12.82,82,0".split(',').collect();
        let record = parse(&fields).unwrap();
        assert_eq!(record.distance, Some(12.82));
        assert_eq!(record.quality, Some(82));
        assert_eq!(record.status.as_deref(), Some("0"));
    }

    #[test]
    fn sentinel_distance() {
        let fields: Vec<&str> = "102115,135734,-9.00,82,0".split(',').collect();
        let record = parse(&fields).unwrap();
        assert_eq!(record.distance, None);
        assert!(record.has_invalid_data);
    }

    #[test]
    fn short_sentence_is_field_count() {
        let fields: Vec<&str> = "102115,135734,12.82".split(',').collect();
        assert_eq!(parse(&fields).unwrap_err().kind, ParseErrorKind::FieldCount);
    }
}
