//! Integral wave sentences: PNORW (full set) and PNORB (per-band).

use super::fields::{bounds, PositionalReader};
use super::ParseError;
use crate::record::{WaveBand, WaveParameters};

pub(super) fn parse_pnorw(fields: &[&str]) -> Result<WaveParameters, ParseError> {
    let mut reader = PositionalReader::exact("PNORW", fields, 21)?;
    let record = WaveParameters {
        date: reader.date("date")?,
        time: reader.date("time")?,
        spectrum_basis: reader.i64("spectrum basis", bounds::SPECTRUM_BASIS)?,
        processing_method: reader.i64("processing method", bounds::PROCESSING_METHOD)?,
        hm0: reader.f64("Hm0", bounds::WAVE_HEIGHT)?,
        h3: reader.f64("H3", bounds::WAVE_HEIGHT)?,
        h10: reader.f64("H10", bounds::WAVE_HEIGHT)?,
        hmax: reader.f64("Hmax", bounds::WAVE_HEIGHT)?,
        tm02: reader.f64("Tm02", bounds::WAVE_PERIOD)?,
        tp: reader.f64("Tp", bounds::WAVE_PERIOD)?,
        tz: reader.f64("Tz", bounds::WAVE_PERIOD)?,
        dir_tp: reader.f64("DirTp", bounds::DIRECTION)?,
        spr_tp: reader.f64("SprTp", bounds::DIRECTION)?,
        main_direction: reader.f64("main direction", bounds::DIRECTION)?,
        unidirectivity_index: reader.f64("unidirectivity index", bounds::UNIDIRECTIVITY)?,
        mean_pressure: reader.f64("mean pressure", bounds::PRESSURE)?,
        num_no_detects: reader.i64("no-detects", bounds::DETECT_COUNT)?,
        num_bad_detects: reader.i64("bad-detects", bounds::DETECT_COUNT)?,
        near_surface_speed: reader.f64("near-surface speed", bounds::SPEED)?,
        near_surface_direction: reader.f64("near-surface direction", bounds::DIRECTION)?,
        error_code: reader.hex("error code")?,
        has_invalid_data: false,
    };
    Ok(WaveParameters {
        has_invalid_data: reader.saw_invalid(),
        ..record
    })
}

pub(super) fn parse_pnorb(fields: &[&str]) -> Result<WaveBand, ParseError> {
    let mut reader = PositionalReader::exact("PNORB", fields, 11)?;
    let record = WaveBand {
        date: reader.date("date")?,
        time: reader.date("time")?,
        low_frequency: reader.f64("low frequency", bounds::FREQUENCY)?,
        high_frequency: reader.f64("high frequency", bounds::FREQUENCY)?,
        hm0: reader.f64("Hm0", bounds::WAVE_HEIGHT)?,
        tm02: reader.f64("Tm02", bounds::WAVE_PERIOD)?,
        tp: reader.f64("Tp", bounds::WAVE_PERIOD)?,
        dir_tp: reader.f64("DirTp", bounds::DIRECTION)?,
        spr_tp: reader.f64("SprTp", bounds::DIRECTION)?,
        main_direction: reader.f64("main direction", bounds::DIRECTION)?,
        error_code: reader.hex("error code")?,
        has_invalid_data: false,
    };
    Ok(WaveBand {
        has_invalid_data: reader.saw_invalid(),
        ..record
    })
}
