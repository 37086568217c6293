//! Instrument configuration sentences: PNORI, PNORI1, PNORI2.

use super::fields::{bounds, coord_system_code, validate_head_id, PositionalReader, TagMap};
use super::{ParseError, ParserOptions};
use crate::record::InstrumentConfig;
use adcp_common::error::ParseErrorKind;

/// Instrument type code reported by Signature-series heads.
const SIGNATURE_TYPE_CODE: i64 = 4;

/// Signature heads always carry four beams; a config sentence claiming
/// otherwise is corrupt even when each field decodes on its own.
fn check_signature_beams(
    instrument_type_code: Option<i64>,
    beam_count: Option<i64>,
) -> Result<(), ParseError> {
    if instrument_type_code == Some(SIGNATURE_TYPE_CODE) {
        if let Some(beams) = beam_count {
            if beams != 4 {
                return Err(ParseError::new(
                    ParseErrorKind::RangeViolation,
                    format!("Signature instrument reports {beams} beams, expected 4"),
                ));
            }
        }
    }
    Ok(())
}

pub(super) fn parse_positional(
    fields: &[&str],
    options: &ParserOptions,
) -> Result<InstrumentConfig, ParseError> {
    let mut reader = PositionalReader::exact("PNORI", fields, 7)?;
    let instrument_type_code = reader.i64("instrument type", bounds::INSTRUMENT_TYPE)?;
    let head_id = validate_head_id(reader.raw(), options.head_id_max_len)?;
    let beam_count = reader.i64("beam count", bounds::BEAM_COUNT)?;
    let cell_count = reader.i64("cell count", bounds::CELL_COUNT)?;
    let blanking_distance = reader.f64("blanking distance", bounds::BLANKING_DISTANCE)?;
    let cell_size = reader.f64("cell size", bounds::CELL_SIZE)?;
    let coord_system = coord_system_code(reader.raw())?;
    check_signature_beams(instrument_type_code, beam_count)?;
    Ok(InstrumentConfig {
        instrument_type_code,
        head_id,
        beam_count,
        cell_count,
        blanking_distance,
        cell_size,
        coord_system_code: coord_system,
        has_invalid_data: reader.saw_invalid(),
    })
}

pub(super) fn parse_tagged(
    fields: &[&str],
    options: &ParserOptions,
) -> Result<InstrumentConfig, ParseError> {
    let mut map = TagMap::new("PNORI2", fields)?;
    let instrument_type_code = map.required_i64("IT", bounds::INSTRUMENT_TYPE)?;
    let head_id = validate_head_id(&map.required_string("SN")?, options.head_id_max_len)?;
    let beam_count = map.required_i64("NB", bounds::BEAM_COUNT)?;
    let cell_count = map.required_i64("NC", bounds::CELL_COUNT)?;
    let blanking_distance = map.required_f64("BD", bounds::BLANKING_DISTANCE)?;
    let cell_size = map.required_f64("CS", bounds::CELL_SIZE)?;
    let coord_system = coord_system_code(&map.required_string("CY")?)?;
    let has_invalid_data = map.finish()?;
    check_signature_beams(instrument_type_code, beam_count)?;
    Ok(InstrumentConfig {
        instrument_type_code,
        head_id,
        beam_count,
        cell_count,
        blanking_distance,
        cell_size,
        coord_system_code: coord_system,
        has_invalid_data,
    })
}
