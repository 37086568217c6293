//! Length-prefixed spectrum sentences: PNORE (energy densities), PNORF
//! (Fourier coefficients, four-part compound) and PNORWD (direction and
//! spread, two-part compound). The numeric field after the fixed header
//! declares how many bins follow; exactly that many are consumed.

use super::fields::{bounds, Bounds, PositionalReader};
use super::ParseError;
use crate::record::{DirectionSpectrum, EnergySpectrum, FourierSpectrum};
use adcp_common::error::ParseErrorKind;

fn read_bin_count(reader: &mut PositionalReader<'_>, variant: &str) -> Result<i64, ParseError> {
    reader.i64("bin count", bounds::BIN_COUNT)?.ok_or_else(|| {
        ParseError::new(
            ParseErrorKind::DecodeError,
            format!("{variant} bin count must be a real value"),
        )
    })
}

fn read_bins(
    reader: &mut PositionalReader<'_>,
    variant: &str,
    bin_count: i64,
    limits: Bounds,
) -> Result<Vec<Option<f64>>, ParseError> {
    if reader.remaining() != bin_count as usize {
        return Err(ParseError::new(
            ParseErrorKind::FieldCount,
            format!(
                "{variant} declares {bin_count} bins but carries {}",
                reader.remaining()
            ),
        ));
    }
    let mut bins = Vec::with_capacity(bin_count as usize);
    for i in 0..bin_count {
        bins.push(reader.f64(&format!("bin {i}"), limits)?);
    }
    Ok(bins)
}

pub(super) fn parse_pnore(fields: &[&str]) -> Result<EnergySpectrum, ParseError> {
    let mut reader = PositionalReader::at_least("PNORE", fields, 6)?;
    let date = reader.date("date")?;
    let time = reader.date("time")?;
    let spectrum_basis = reader.i64("spectrum basis", bounds::SPECTRUM_BASIS)?;
    let start_frequency = reader.f64("start frequency", bounds::FREQUENCY)?;
    let step_frequency = reader.f64("step frequency", bounds::FREQUENCY)?;
    let bin_count = read_bin_count(&mut reader, "PNORE")?;
    let energies = read_bins(&mut reader, "PNORE", bin_count, bounds::ENERGY_DENSITY)?;
    Ok(EnergySpectrum {
        date,
        time,
        spectrum_basis,
        start_frequency,
        step_frequency,
        bin_count,
        energies,
        has_invalid_data: reader.saw_invalid(),
    })
}

const PNORF_SENTENCE_IDS: [&str; 4] = ["A1", "B1", "A2", "B2"];

pub(super) fn parse_pnorf(fields: &[&str]) -> Result<FourierSpectrum, ParseError> {
    let mut reader = PositionalReader::at_least("PNORF", fields, 7)?;
    let sentence_id = reader.raw();
    if !PNORF_SENTENCE_IDS.contains(&sentence_id) {
        return Err(ParseError::new(
            ParseErrorKind::DecodeError,
            format!("PNORF sentence id must be one of A1/B1/A2/B2, got {sentence_id:?}"),
        ));
    }
    let date = reader.date("date")?;
    let time = reader.date("time")?;
    let spectrum_basis = reader.i64("spectrum basis", bounds::SPECTRUM_BASIS)?;
    let start_frequency = reader.f64("start frequency", bounds::FREQUENCY)?;
    let step_frequency = reader.f64("step frequency", bounds::FREQUENCY)?;
    let bin_count = read_bin_count(&mut reader, "PNORF")?;
    let coefficients = read_bins(&mut reader, "PNORF", bin_count, bounds::FOURIER_COEFFICIENT)?;
    Ok(FourierSpectrum {
        sentence_id: sentence_id.to_owned(),
        date,
        time,
        spectrum_basis,
        start_frequency,
        step_frequency,
        bin_count,
        coefficients,
        has_invalid_data: reader.saw_invalid(),
    })
}

const PNORWD_SENTENCE_IDS: [&str; 2] = ["MD", "DS"];

pub(super) fn parse_pnorwd(fields: &[&str]) -> Result<DirectionSpectrum, ParseError> {
    let mut reader = PositionalReader::at_least("PNORWD", fields, 6)?;
    let sentence_id = reader.raw();
    if !PNORWD_SENTENCE_IDS.contains(&sentence_id) {
        return Err(ParseError::new(
            ParseErrorKind::DecodeError,
            format!("PNORWD sentence id must be MD or DS, got {sentence_id:?}"),
        ));
    }
    let date = reader.date("date")?;
    let time = reader.date("time")?;
    let start_frequency = reader.f64("start frequency", bounds::FREQUENCY)?;
    let step_frequency = reader.f64("step frequency", bounds::FREQUENCY)?;
    let bin_count = read_bin_count(&mut reader, "PNORWD")?;
    let values = read_bins(&mut reader, "PNORWD", bin_count, bounds::DIRECTION)?;
    Ok(DirectionSpectrum {
        sentence_id: sentence_id.to_owned(),
        date,
        time,
        start_frequency,
        step_frequency,
        bin_count,
        values,
        has_invalid_data: reader.saw_invalid(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(body: &str) -> Vec<&str> {
        body.split(',').collect()
    }

    #[test]
    fn pnore_consumes_exactly_declared_bins() {
        let fields = split("102115,135734,3,0.02,0.01,5,0.11,0.22,0.33,0.44,0.55");
        let record = parse_pnore(&fields).unwrap();
        assert_eq!(record.bin_count, 5);
        assert_eq!(
            record.energies,
            vec![Some(0.11), Some(0.22), Some(0.33), Some(0.44), Some(0.55)]
        );
    }

    #[test]
    fn pnore_bin_shortfall_is_field_count() {
        let fields = split("102115,135734,3,0.02,0.01,5,0.11,0.22");
        assert_eq!(
            parse_pnore(&fields).unwrap_err().kind,
            ParseErrorKind::FieldCount
        );
    }

    #[test]
    fn pnore_bin_excess_is_field_count() {
        let fields = split("102115,135734,3,0.02,0.01,2,0.11,0.22,0.33");
        assert_eq!(
            parse_pnore(&fields).unwrap_err().kind,
            ParseErrorKind::FieldCount
        );
    }

    #[test]
    fn pnore_sentinel_bin_is_null_not_error() {
        let fields = split("102115,135734,3,0.02,0.01,3,0.11,-9.00,0.33");
        let record = parse_pnore(&fields).unwrap();
        assert_eq!(record.energies, vec![Some(0.11), None, Some(0.33)]);
        assert!(record.has_invalid_data);
    }

    #[test]
    fn pnorf_accepts_each_compound_part() {
        for id in ["A1", "B1", "A2", "B2"] {
            let body = format!("{id},102115,135734,3,0.02,0.01,4,0.10,0.20,0.30,0.40");
            let fields = split(&body);
            let record = parse_pnorf(&fields).unwrap();
            assert_eq!(record.sentence_id, id);
            assert_eq!(record.coefficients.len(), 4);
        }
    }

    #[test]
    fn pnorf_rejects_unknown_part() {
        let fields = split("C1,102115,135734,3,0.02,0.01,1,0.10");
        assert_eq!(
            parse_pnorf(&fields).unwrap_err().kind,
            ParseErrorKind::DecodeError
        );
    }

    #[test]
    fn pnorwd_direction_and_spread_parts() {
        let md = split("MD,102115,135734,0.02,0.01,4,181.1,182.2,183.3,184.4");
        let record = parse_pnorwd(&md).unwrap();
        assert_eq!(record.sentence_id, "MD");
        assert_eq!(record.values.len(), 4);

        let ds = split("DS,102115,135734,0.02,0.01,4,30.1,31.2,32.3,33.4");
        assert_eq!(parse_pnorwd(&ds).unwrap().sentence_id, "DS");
    }

    #[test]
    fn pnorwd_missing_header_field() {
        let fields = split("MD,102115,135734,0.02,0.01");
        assert_eq!(
            parse_pnorwd(&fields).unwrap_err().kind,
            ParseErrorKind::FieldCount
        );
    }
}
