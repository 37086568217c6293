//! Per-cell current sentences: the PNORC family. Empty velocity/amplitude
//! fields are lawful (the fourth beam of a three-beam head).

use super::fields::{bounds, PositionalReader, TagMap};
use super::ParseError;
use crate::record::CurrentData;

fn empty() -> CurrentData {
    CurrentData {
        date: None,
        time: None,
        cell_number: None,
        velocity1: None,
        velocity2: None,
        velocity3: None,
        velocity4: None,
        speed: None,
        direction: None,
        amplitude_unit: None,
        amplitude1: None,
        amplitude2: None,
        amplitude3: None,
        amplitude4: None,
        correlation1: None,
        correlation2: None,
        correlation3: None,
        correlation4: None,
        has_invalid_data: false,
    }
}

pub(super) fn parse_pnorc(fields: &[&str]) -> Result<CurrentData, ParseError> {
    let mut reader = PositionalReader::exact("PNORC", fields, 18)?;
    let mut record = empty();
    record.date = reader.date("date")?;
    record.time = reader.date("time")?;
    record.cell_number = reader.i64("cell number", bounds::CELL_NUMBER)?;
    record.velocity1 = reader.f64("velocity 1", bounds::VELOCITY)?;
    record.velocity2 = reader.f64("velocity 2", bounds::VELOCITY)?;
    record.velocity3 = reader.f64("velocity 3", bounds::VELOCITY)?;
    record.velocity4 = reader.f64("velocity 4", bounds::VELOCITY)?;
    record.speed = reader.f64("speed", bounds::SPEED)?;
    record.direction = reader.f64("direction", bounds::DIRECTION)?;
    record.amplitude_unit = reader.string();
    record.amplitude1 = reader.i64("amplitude 1", bounds::AMPLITUDE)?;
    record.amplitude2 = reader.i64("amplitude 2", bounds::AMPLITUDE)?;
    record.amplitude3 = reader.i64("amplitude 3", bounds::AMPLITUDE)?;
    record.amplitude4 = reader.i64("amplitude 4", bounds::AMPLITUDE)?;
    record.correlation1 = reader.i64("correlation 1", bounds::CORRELATION)?;
    record.correlation2 = reader.i64("correlation 2", bounds::CORRELATION)?;
    record.correlation3 = reader.i64("correlation 3", bounds::CORRELATION)?;
    record.correlation4 = reader.i64("correlation 4", bounds::CORRELATION)?;
    record.has_invalid_data = reader.saw_invalid();
    Ok(record)
}

pub(super) fn parse_pnorc1(fields: &[&str]) -> Result<CurrentData, ParseError> {
    let mut reader = PositionalReader::exact("PNORC1", fields, 11)?;
    let mut record = empty();
    record.date = reader.date("date")?;
    record.time = reader.date("time")?;
    record.cell_number = reader.i64("cell number", bounds::CELL_NUMBER)?;
    record.velocity1 = reader.f64("velocity 1", bounds::VELOCITY)?;
    record.velocity2 = reader.f64("velocity 2", bounds::VELOCITY)?;
    record.velocity3 = reader.f64("velocity 3", bounds::VELOCITY)?;
    record.velocity4 = reader.f64("velocity 4", bounds::VELOCITY)?;
    record.amplitude1 = reader.i64("amplitude 1", bounds::AMPLITUDE)?;
    record.amplitude2 = reader.i64("amplitude 2", bounds::AMPLITUDE)?;
    record.amplitude3 = reader.i64("amplitude 3", bounds::AMPLITUDE)?;
    record.amplitude4 = reader.i64("amplitude 4", bounds::AMPLITUDE)?;
    record.has_invalid_data = reader.saw_invalid();
    Ok(record)
}

pub(super) fn parse_pnorc2(fields: &[&str]) -> Result<CurrentData, ParseError> {
    let mut map = TagMap::new("PNORC2", fields)?;
    let mut record = empty();
    record.date = map.required_date("DATE")?;
    record.time = map.required_date("TIME")?;
    record.cell_number = map.required_i64("CN", bounds::CELL_NUMBER)?;
    record.velocity1 = map.optional_f64("V1", bounds::VELOCITY)?;
    record.velocity2 = map.optional_f64("V2", bounds::VELOCITY)?;
    record.velocity3 = map.optional_f64("V3", bounds::VELOCITY)?;
    record.velocity4 = map.optional_f64("V4", bounds::VELOCITY)?;
    record.speed = map.optional_f64("SP", bounds::SPEED)?;
    record.direction = map.optional_f64("DIR", bounds::DIRECTION)?;
    record.amplitude1 = map.optional_i64("A1", bounds::AMPLITUDE)?;
    record.amplitude2 = map.optional_i64("A2", bounds::AMPLITUDE)?;
    record.amplitude3 = map.optional_i64("A3", bounds::AMPLITUDE)?;
    record.amplitude4 = map.optional_i64("A4", bounds::AMPLITUDE)?;
    record.has_invalid_data = map.finish()?;
    Ok(record)
}

pub(super) fn parse_pnorc3(fields: &[&str]) -> Result<CurrentData, ParseError> {
    let mut map = TagMap::new("PNORC3", fields)?;
    let mut record = empty();
    record.cell_number = map.required_i64("CN", bounds::CELL_NUMBER)?;
    record.speed = map.required_f64("SP", bounds::SPEED)?;
    record.direction = map.required_f64("DIR", bounds::DIRECTION)?;
    record.has_invalid_data = map.finish()?;
    Ok(record)
}

pub(super) fn parse_pnorc4(fields: &[&str]) -> Result<CurrentData, ParseError> {
    let mut map = TagMap::new("PNORC4", fields)?;
    let mut record = empty();
    record.cell_number = map.required_i64("CN", bounds::CELL_NUMBER)?;
    record.velocity1 = map.required_f64("VE", bounds::VELOCITY)?;
    record.velocity2 = map.required_f64("VN", bounds::VELOCITY)?;
    record.velocity3 = map.required_f64("VU", bounds::VELOCITY)?;
    record.speed = map.required_f64("SP", bounds::SPEED)?;
    record.direction = map.required_f64("DIR", bounds::DIRECTION)?;
    record.has_invalid_data = map.finish()?;
    Ok(record)
}
