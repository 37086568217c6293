//! Sensor and attitude sentences: the PNORS family and the PNORH headers.
//! All seven variants project onto the same record; absent fields stay
//! `None`.

use super::fields::{bounds, PositionalReader, TagMap};
use super::ParseError;
use crate::record::SensorData;

fn empty() -> SensorData {
    SensorData {
        date: None,
        time: None,
        error_code: None,
        status_code: None,
        battery_voltage: None,
        sound_speed: None,
        heading: None,
        pitch: None,
        roll: None,
        pressure: None,
        temperature: None,
        analog_input1: None,
        analog_input2: None,
        has_invalid_data: false,
    }
}

pub(super) fn parse_pnors(fields: &[&str]) -> Result<SensorData, ParseError> {
    let mut reader = PositionalReader::exact("PNORS", fields, 13)?;
    let mut record = empty();
    record.date = reader.date("date")?;
    record.time = reader.date("time")?;
    record.error_code = reader.hex("error code")?;
    record.status_code = reader.hex("status code")?;
    record.battery_voltage = reader.f64("battery voltage", bounds::BATTERY_VOLTAGE)?;
    record.sound_speed = reader.f64("sound speed", bounds::SOUND_SPEED)?;
    record.heading = reader.f64("heading", bounds::DIRECTION)?;
    record.pitch = reader.f64("pitch", bounds::TILT)?;
    record.roll = reader.f64("roll", bounds::TILT)?;
    record.pressure = reader.f64("pressure", bounds::PRESSURE)?;
    record.temperature = reader.f64("temperature", bounds::TEMPERATURE)?;
    record.analog_input1 = reader.i64("analog input 1", bounds::ANALOG_INPUT)?;
    record.analog_input2 = reader.i64("analog input 2", bounds::ANALOG_INPUT)?;
    record.has_invalid_data = reader.saw_invalid();
    Ok(record)
}

pub(super) fn parse_pnors1(fields: &[&str]) -> Result<SensorData, ParseError> {
    let mut reader = PositionalReader::exact("PNORS1", fields, 11)?;
    let mut record = empty();
    record.date = reader.date("date")?;
    record.time = reader.date("time")?;
    record.error_code = reader.hex("error code")?;
    record.status_code = reader.hex("status code")?;
    record.battery_voltage = reader.f64("battery voltage", bounds::BATTERY_VOLTAGE)?;
    record.sound_speed = reader.f64("sound speed", bounds::SOUND_SPEED)?;
    record.heading = reader.f64("heading", bounds::DIRECTION)?;
    record.pitch = reader.f64("pitch", bounds::TILT)?;
    record.roll = reader.f64("roll", bounds::TILT)?;
    record.pressure = reader.f64("pressure", bounds::PRESSURE)?;
    record.temperature = reader.f64("temperature", bounds::TEMPERATURE)?;
    record.has_invalid_data = reader.saw_invalid();
    Ok(record)
}

pub(super) fn parse_pnors2(fields: &[&str]) -> Result<SensorData, ParseError> {
    let mut map = TagMap::new("PNORS2", fields)?;
    let mut record = empty();
    record.date = map.required_date("DATE")?;
    record.time = map.required_date("TIME")?;
    record.error_code = map.required_hex("EC")?;
    record.status_code = map.required_hex("SC")?;
    record.battery_voltage = map.required_f64("BV", bounds::BATTERY_VOLTAGE)?;
    record.sound_speed = map.required_f64("SS", bounds::SOUND_SPEED)?;
    record.heading = map.required_f64("H", bounds::DIRECTION)?;
    record.pitch = map.required_f64("PI", bounds::TILT)?;
    record.roll = map.required_f64("R", bounds::TILT)?;
    record.pressure = map.required_f64("P", bounds::PRESSURE)?;
    record.temperature = map.required_f64("T", bounds::TEMPERATURE)?;
    record.has_invalid_data = map.finish()?;
    Ok(record)
}

pub(super) fn parse_pnors3(fields: &[&str]) -> Result<SensorData, ParseError> {
    let mut map = TagMap::new("PNORS3", fields)?;
    let mut record = empty();
    record.heading = map.required_f64("H", bounds::DIRECTION)?;
    record.pitch = map.required_f64("PI", bounds::TILT)?;
    record.roll = map.required_f64("R", bounds::TILT)?;
    record.pressure = map.required_f64("P", bounds::PRESSURE)?;
    record.temperature = map.required_f64("T", bounds::TEMPERATURE)?;
    record.has_invalid_data = map.finish()?;
    Ok(record)
}

pub(super) fn parse_pnors4(fields: &[&str]) -> Result<SensorData, ParseError> {
    let mut map = TagMap::new("PNORS4", fields)?;
    let mut record = empty();
    record.date = map.required_date("DATE")?;
    record.time = map.required_date("TIME")?;
    record.battery_voltage = map.required_f64("BV", bounds::BATTERY_VOLTAGE)?;
    record.sound_speed = map.required_f64("SS", bounds::SOUND_SPEED)?;
    record.heading = map.required_f64("H", bounds::DIRECTION)?;
    record.pitch = map.required_f64("PI", bounds::TILT)?;
    record.roll = map.required_f64("R", bounds::TILT)?;
    record.pressure = map.required_f64("P", bounds::PRESSURE)?;
    record.temperature = map.required_f64("T", bounds::TEMPERATURE)?;
    record.has_invalid_data = map.finish()?;
    Ok(record)
}

pub(super) fn parse_pnorh3(fields: &[&str]) -> Result<SensorData, ParseError> {
    let mut map = TagMap::new("PNORH3", fields)?;
    let mut record = empty();
    record.date = map.required_date("DATE")?;
    record.time = map.required_date("TIME")?;
    record.error_code = map.required_hex("EC")?;
    record.status_code = map.required_hex("SC")?;
    record.has_invalid_data = map.finish()?;
    Ok(record)
}

pub(super) fn parse_pnorh4(fields: &[&str]) -> Result<SensorData, ParseError> {
    let mut map = TagMap::new("PNORH4", fields)?;
    let mut record = empty();
    record.date = map.required_date("DATE")?;
    record.time = map.required_date("TIME")?;
    record.error_code = map.required_hex("EC")?;
    record.status_code = map.required_hex("SC")?;
    record.battery_voltage = map.required_f64("BV", bounds::BATTERY_VOLTAGE)?;
    record.has_invalid_data = map.finish()?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use adcp_common::error::ParseErrorKind;

    fn split(body: &str) -> Vec<&str> {
        body.split(',').collect()
    }

    #[test]
    fn pnors_happy_path() {
        let fields =
            split("102115,135734,0,2A480000,23.9,1525.6,114.9,-0.9,-0.3,22.413,21.7,0,0");
        let record = parse_pnors(&fields).unwrap();
        assert_eq!(record.date.as_deref(), Some("102115"));
        assert_eq!(record.status_code.as_deref(), Some("2A480000"));
        assert_eq!(record.battery_voltage, Some(23.9));
        assert_eq!(record.heading, Some(114.9));
        assert_eq!(record.pitch, Some(-0.9));
        assert_eq!(record.temperature, Some(21.7));
        assert_eq!(record.analog_input1, Some(0));
        assert!(!record.has_invalid_data);
    }

    #[test]
    fn pnors_rejects_heading_out_of_range() {
        let fields =
            split("102115,135734,0,2A480000,23.9,1525.6,514.9,-0.9,-0.3,22.413,21.7,0,0");
        assert_eq!(
            parse_pnors(&fields).unwrap_err().kind,
            ParseErrorKind::RangeViolation
        );
    }

    #[test]
    fn pnors1_has_no_analog_inputs() {
        let fields = split("102115,135734,0,2A480000,23.9,1525.6,114.9,-0.9,-0.3,22.413,21.7");
        let record = parse_pnors1(&fields).unwrap();
        assert_eq!(record.analog_input1, None);
        assert_eq!(record.pressure, Some(22.413));
    }

    #[test]
    fn pnors2_tagged_round_trip() {
        let fields = split(
            "DATE=102115,TIME=135734,EC=0,SC=2A480000,BV=23.9,SS=1525.6,H=114.9,PI=-0.9,R=-0.3,P=22.413,T=20.3",
        );
        let record = parse_pnors2(&fields).unwrap();
        assert_eq!(record.sound_speed, Some(1525.6));
        assert_eq!(record.roll, Some(-0.3));
        assert_eq!(record.temperature, Some(20.3));
    }

    #[test]
    fn pnors2_reordered_tags_parse_identically() {
        let a = split(
            "DATE=102115,TIME=135734,EC=0,SC=2A480000,BV=23.9,SS=1525.6,H=114.9,PI=-0.9,R=-0.3,P=22.413,T=20.3",
        );
        let b = split(
            "T=20.3,P=22.413,R=-0.3,PI=-0.9,H=114.9,SS=1525.6,BV=23.9,SC=2A480000,EC=0,TIME=135734,DATE=102115",
        );
        assert_eq!(parse_pnors2(&a).unwrap(), parse_pnors2(&b).unwrap());
    }

    #[test]
    fn pnors3_is_attitude_only() {
        let fields = split("H=114.9,PI=-0.9,R=-0.3,P=22.413,T=20.3");
        let record = parse_pnors3(&fields).unwrap();
        assert_eq!(record.date, None);
        assert_eq!(record.heading, Some(114.9));
    }

    #[test]
    fn pnorh3_header_and_pnorh4_battery() {
        let h3 = split("DATE=102115,TIME=135734,EC=0,SC=2A480000");
        let record = parse_pnorh3(&h3).unwrap();
        assert_eq!(record.error_code.as_deref(), Some("0"));
        assert_eq!(record.battery_voltage, None);

        let h4 = split("DATE=102115,TIME=135734,EC=0,SC=2A480000,BV=23.9");
        let record = parse_pnorh4(&h4).unwrap();
        assert_eq!(record.battery_voltage, Some(23.9));
    }

    #[test]
    fn sentinel_pitch_becomes_null() {
        let fields = split("102115,135734,0,2A480000,23.9,1525.6,114.9,-9.00,-0.3,22.413,21.7");
        let record = parse_pnors1(&fields).unwrap();
        assert_eq!(record.pitch, None);
        assert!(record.has_invalid_data);
    }

    #[test]
    fn pnors2_missing_temperature_tag() {
        let fields = split(
            "DATE=102115,TIME=135734,EC=0,SC=2A480000,BV=23.9,SS=1525.6,H=114.9,PI=-0.9,R=-0.3,P=22.413",
        );
        assert_eq!(
            parse_pnors2(&fields).unwrap_err().kind,
            ParseErrorKind::MissingField
        );
    }

    #[test]
    fn bad_status_code_is_a_decode_error() {
        let fields =
            split("102115,135734,0,XYZ,23.9,1525.6,114.9,-0.9,-0.3,22.413,21.7,0,0");
        assert_eq!(
            parse_pnors(&fields).unwrap_err().kind,
            ParseErrorKind::DecodeError
        );
    }
}
