//! The closed sentence registry and the typed records parsers produce.

use serde::Serialize;

/// Every sentence type the recorder understands. The registry is closed:
/// anything else is an UNKNOWN_PREFIX classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Prefix {
    Pnori,
    Pnori1,
    Pnori2,
    Pnors,
    Pnors1,
    Pnors2,
    Pnors3,
    Pnors4,
    Pnorc,
    Pnorc1,
    Pnorc2,
    Pnorc3,
    Pnorc4,
    Pnorh3,
    Pnorh4,
    Pnora,
    Pnorw,
    Pnorb,
    Pnore,
    Pnorf,
    Pnorwd,
}

impl Prefix {
    pub const ALL: [Prefix; 21] = [
        Prefix::Pnori,
        Prefix::Pnori1,
        Prefix::Pnori2,
        Prefix::Pnors,
        Prefix::Pnors1,
        Prefix::Pnors2,
        Prefix::Pnors3,
        Prefix::Pnors4,
        Prefix::Pnorc,
        Prefix::Pnorc1,
        Prefix::Pnorc2,
        Prefix::Pnorc3,
        Prefix::Pnorc4,
        Prefix::Pnorh3,
        Prefix::Pnorh4,
        Prefix::Pnora,
        Prefix::Pnorw,
        Prefix::Pnorb,
        Prefix::Pnore,
        Prefix::Pnorf,
        Prefix::Pnorwd,
    ];

    pub fn from_token(token: &str) -> Option<Prefix> {
        let prefix = match token {
            "PNORI" => Prefix::Pnori,
            "PNORI1" => Prefix::Pnori1,
            "PNORI2" => Prefix::Pnori2,
            "PNORS" => Prefix::Pnors,
            "PNORS1" => Prefix::Pnors1,
            "PNORS2" => Prefix::Pnors2,
            "PNORS3" => Prefix::Pnors3,
            "PNORS4" => Prefix::Pnors4,
            "PNORC" => Prefix::Pnorc,
            "PNORC1" => Prefix::Pnorc1,
            "PNORC2" => Prefix::Pnorc2,
            "PNORC3" => Prefix::Pnorc3,
            "PNORC4" => Prefix::Pnorc4,
            "PNORH3" => Prefix::Pnorh3,
            "PNORH4" => Prefix::Pnorh4,
            "PNORA" => Prefix::Pnora,
            "PNORW" => Prefix::Pnorw,
            "PNORB" => Prefix::Pnorb,
            "PNORE" => Prefix::Pnore,
            "PNORF" => Prefix::Pnorf,
            "PNORWD" => Prefix::Pnorwd,
            _ => return None,
        };
        Some(prefix)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Prefix::Pnori => "PNORI",
            Prefix::Pnori1 => "PNORI1",
            Prefix::Pnori2 => "PNORI2",
            Prefix::Pnors => "PNORS",
            Prefix::Pnors1 => "PNORS1",
            Prefix::Pnors2 => "PNORS2",
            Prefix::Pnors3 => "PNORS3",
            Prefix::Pnors4 => "PNORS4",
            Prefix::Pnorc => "PNORC",
            Prefix::Pnorc1 => "PNORC1",
            Prefix::Pnorc2 => "PNORC2",
            Prefix::Pnorc3 => "PNORC3",
            Prefix::Pnorc4 => "PNORC4",
            Prefix::Pnorh3 => "PNORH3",
            Prefix::Pnorh4 => "PNORH4",
            Prefix::Pnora => "PNORA",
            Prefix::Pnorw => "PNORW",
            Prefix::Pnorb => "PNORB",
            Prefix::Pnore => "PNORE",
            Prefix::Pnorf => "PNORF",
            Prefix::Pnorwd => "PNORWD",
        }
    }

    /// Database table holding this type's parsed rows.
    pub fn table_name(&self) -> &'static str {
        match self {
            Prefix::Pnori => "pnori",
            Prefix::Pnori1 => "pnori1",
            Prefix::Pnori2 => "pnori2",
            Prefix::Pnors => "pnors",
            Prefix::Pnors1 => "pnors1",
            Prefix::Pnors2 => "pnors2",
            Prefix::Pnors3 => "pnors3",
            Prefix::Pnors4 => "pnors4",
            Prefix::Pnorc => "pnorc",
            Prefix::Pnorc1 => "pnorc1",
            Prefix::Pnorc2 => "pnorc2",
            Prefix::Pnorc3 => "pnorc3",
            Prefix::Pnorc4 => "pnorc4",
            Prefix::Pnorh3 => "pnorh3",
            Prefix::Pnorh4 => "pnorh4",
            Prefix::Pnora => "pnora",
            Prefix::Pnorw => "pnorw",
            Prefix::Pnorb => "pnorb",
            Prefix::Pnore => "pnore",
            Prefix::Pnorf => "pnorf",
            Prefix::Pnorwd => "pnorwd",
        }
    }
}

impl std::fmt::Display for Prefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A column value destined for a parsed-record row. The storage crate maps
/// these onto its own placeholder types; keeping the projection here spares
/// the parser crate a database dependency.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl FieldValue {
    fn opt_i(v: Option<i64>) -> FieldValue {
        v.map_or(FieldValue::Null, FieldValue::Integer)
    }

    fn opt_f(v: Option<f64>) -> FieldValue {
        v.map_or(FieldValue::Null, FieldValue::Real)
    }

    fn opt_s(v: &Option<String>) -> FieldValue {
        v.as_ref()
            .map_or(FieldValue::Null, |s| FieldValue::Text(s.clone()))
    }

    fn json(values: &[Option<f64>]) -> FieldValue {
        FieldValue::Text(serde_json::to_string(values).unwrap_or_default())
    }
}

/// Instrument configuration: PNORI, PNORI1 (positional), PNORI2 (tagged).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstrumentConfig {
    pub instrument_type_code: Option<i64>,
    pub head_id: String,
    pub beam_count: Option<i64>,
    pub cell_count: Option<i64>,
    pub blanking_distance: Option<f64>,
    pub cell_size: Option<f64>,
    /// 0 = ENU, 1 = XYZ, 2 = BEAM. Tagged variants carry the name; it is
    /// mapped to the code so all three variants share columns.
    pub coord_system_code: Option<i64>,
    pub has_invalid_data: bool,
}

/// Sensor/attitude data: the PNORS family and the PNORH headers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorData {
    pub date: Option<String>,
    pub time: Option<String>,
    pub error_code: Option<String>,
    pub status_code: Option<String>,
    pub battery_voltage: Option<f64>,
    pub sound_speed: Option<f64>,
    pub heading: Option<f64>,
    pub pitch: Option<f64>,
    pub roll: Option<f64>,
    pub pressure: Option<f64>,
    pub temperature: Option<f64>,
    pub analog_input1: Option<i64>,
    pub analog_input2: Option<i64>,
    pub has_invalid_data: bool,
}

/// Per-cell current data: the PNORC family.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentData {
    pub date: Option<String>,
    pub time: Option<String>,
    pub cell_number: Option<i64>,
    pub velocity1: Option<f64>,
    pub velocity2: Option<f64>,
    pub velocity3: Option<f64>,
    pub velocity4: Option<f64>,
    pub speed: Option<f64>,
    pub direction: Option<f64>,
    pub amplitude_unit: Option<String>,
    pub amplitude1: Option<i64>,
    pub amplitude2: Option<i64>,
    pub amplitude3: Option<i64>,
    pub amplitude4: Option<i64>,
    pub correlation1: Option<i64>,
    pub correlation2: Option<i64>,
    pub correlation3: Option<i64>,
    pub correlation4: Option<i64>,
    pub has_invalid_data: bool,
}

/// Altimeter reading: PNORA.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AltimeterData {
    pub date: Option<String>,
    pub time: Option<String>,
    pub distance: Option<f64>,
    pub quality: Option<i64>,
    pub status: Option<String>,
    pub has_invalid_data: bool,
}

/// Integral wave parameters: PNORW.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaveParameters {
    pub date: Option<String>,
    pub time: Option<String>,
    pub spectrum_basis: Option<i64>,
    pub processing_method: Option<i64>,
    pub hm0: Option<f64>,
    pub h3: Option<f64>,
    pub h10: Option<f64>,
    pub hmax: Option<f64>,
    pub tm02: Option<f64>,
    pub tp: Option<f64>,
    pub tz: Option<f64>,
    pub dir_tp: Option<f64>,
    pub spr_tp: Option<f64>,
    pub main_direction: Option<f64>,
    pub unidirectivity_index: Option<f64>,
    pub mean_pressure: Option<f64>,
    pub num_no_detects: Option<i64>,
    pub num_bad_detects: Option<i64>,
    pub near_surface_speed: Option<f64>,
    pub near_surface_direction: Option<f64>,
    pub error_code: Option<String>,
    pub has_invalid_data: bool,
}

/// Wave parameters over one frequency band: PNORB.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaveBand {
    pub date: Option<String>,
    pub time: Option<String>,
    pub low_frequency: Option<f64>,
    pub high_frequency: Option<f64>,
    pub hm0: Option<f64>,
    pub tm02: Option<f64>,
    pub tp: Option<f64>,
    pub dir_tp: Option<f64>,
    pub spr_tp: Option<f64>,
    pub main_direction: Option<f64>,
    pub error_code: Option<String>,
    pub has_invalid_data: bool,
}

/// Energy density spectrum: PNORE. `bin_count` declares the array length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnergySpectrum {
    pub date: Option<String>,
    pub time: Option<String>,
    pub spectrum_basis: Option<i64>,
    pub start_frequency: Option<f64>,
    pub step_frequency: Option<f64>,
    pub bin_count: i64,
    pub energies: Vec<Option<f64>>,
    pub has_invalid_data: bool,
}

/// Fourier coefficient spectra: PNORF. One frame per `sentence_id` of the
/// four-part compound record (A1, B1, A2, B2); pairing across frames is the
/// consumer's analytical concern, not the recorder's.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FourierSpectrum {
    pub sentence_id: String,
    pub date: Option<String>,
    pub time: Option<String>,
    pub spectrum_basis: Option<i64>,
    pub start_frequency: Option<f64>,
    pub step_frequency: Option<f64>,
    pub bin_count: i64,
    pub coefficients: Vec<Option<f64>>,
    pub has_invalid_data: bool,
}

/// Direction/spread spectra: PNORWD, two-part compound record (MD, DS).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectionSpectrum {
    pub sentence_id: String,
    pub date: Option<String>,
    pub time: Option<String>,
    pub start_frequency: Option<f64>,
    pub step_frequency: Option<f64>,
    pub bin_count: i64,
    pub values: Vec<Option<f64>>,
    pub has_invalid_data: bool,
}

/// The tagged union over all 21 concrete sentence shapes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ParsedRecord {
    Pnori(InstrumentConfig),
    Pnori1(InstrumentConfig),
    Pnori2(InstrumentConfig),
    Pnors(SensorData),
    Pnors1(SensorData),
    Pnors2(SensorData),
    Pnors3(SensorData),
    Pnors4(SensorData),
    Pnorc(CurrentData),
    Pnorc1(CurrentData),
    Pnorc2(CurrentData),
    Pnorc3(CurrentData),
    Pnorc4(CurrentData),
    Pnorh3(SensorData),
    Pnorh4(SensorData),
    Pnora(AltimeterData),
    Pnorw(WaveParameters),
    Pnorb(WaveBand),
    Pnore(EnergySpectrum),
    Pnorf(FourierSpectrum),
    Pnorwd(DirectionSpectrum),
}

impl ParsedRecord {
    pub fn prefix(&self) -> Prefix {
        match self {
            ParsedRecord::Pnori(_) => Prefix::Pnori,
            ParsedRecord::Pnori1(_) => Prefix::Pnori1,
            ParsedRecord::Pnori2(_) => Prefix::Pnori2,
            ParsedRecord::Pnors(_) => Prefix::Pnors,
            ParsedRecord::Pnors1(_) => Prefix::Pnors1,
            ParsedRecord::Pnors2(_) => Prefix::Pnors2,
            ParsedRecord::Pnors3(_) => Prefix::Pnors3,
            ParsedRecord::Pnors4(_) => Prefix::Pnors4,
            ParsedRecord::Pnorc(_) => Prefix::Pnorc,
            ParsedRecord::Pnorc1(_) => Prefix::Pnorc1,
            ParsedRecord::Pnorc2(_) => Prefix::Pnorc2,
            ParsedRecord::Pnorc3(_) => Prefix::Pnorc3,
            ParsedRecord::Pnorc4(_) => Prefix::Pnorc4,
            ParsedRecord::Pnorh3(_) => Prefix::Pnorh3,
            ParsedRecord::Pnorh4(_) => Prefix::Pnorh4,
            ParsedRecord::Pnora(_) => Prefix::Pnora,
            ParsedRecord::Pnorw(_) => Prefix::Pnorw,
            ParsedRecord::Pnorb(_) => Prefix::Pnorb,
            ParsedRecord::Pnore(_) => Prefix::Pnore,
            ParsedRecord::Pnorf(_) => Prefix::Pnorf,
            ParsedRecord::Pnorwd(_) => Prefix::Pnorwd,
        }
    }

    pub fn has_invalid_data(&self) -> bool {
        match self {
            ParsedRecord::Pnori(r) | ParsedRecord::Pnori1(r) | ParsedRecord::Pnori2(r) => {
                r.has_invalid_data
            }
            ParsedRecord::Pnors(r)
            | ParsedRecord::Pnors1(r)
            | ParsedRecord::Pnors2(r)
            | ParsedRecord::Pnors3(r)
            | ParsedRecord::Pnors4(r)
            | ParsedRecord::Pnorh3(r)
            | ParsedRecord::Pnorh4(r) => r.has_invalid_data,
            ParsedRecord::Pnorc(r)
            | ParsedRecord::Pnorc1(r)
            | ParsedRecord::Pnorc2(r)
            | ParsedRecord::Pnorc3(r)
            | ParsedRecord::Pnorc4(r) => r.has_invalid_data,
            ParsedRecord::Pnora(r) => r.has_invalid_data,
            ParsedRecord::Pnorw(r) => r.has_invalid_data,
            ParsedRecord::Pnorb(r) => r.has_invalid_data,
            ParsedRecord::Pnore(r) => r.has_invalid_data,
            ParsedRecord::Pnorf(r) => r.has_invalid_data,
            ParsedRecord::Pnorwd(r) => r.has_invalid_data,
        }
    }

    /// Projects the record onto its table's typed columns, in declaration
    /// order. Shared columns (id, timestamps, raw-line linkage) are the
    /// storage layer's concern.
    pub fn columns(&self) -> Vec<(&'static str, FieldValue)> {
        match self {
            ParsedRecord::Pnori(r) | ParsedRecord::Pnori1(r) | ParsedRecord::Pnori2(r) => vec![
                ("instrument_type_code", FieldValue::opt_i(r.instrument_type_code)),
                ("head_id", FieldValue::Text(r.head_id.clone())),
                ("beam_count", FieldValue::opt_i(r.beam_count)),
                ("cell_count", FieldValue::opt_i(r.cell_count)),
                ("blanking_distance", FieldValue::opt_f(r.blanking_distance)),
                ("cell_size", FieldValue::opt_f(r.cell_size)),
                ("coord_system_code", FieldValue::opt_i(r.coord_system_code)),
                ("has_invalid_data", FieldValue::Integer(r.has_invalid_data as i64)),
            ],
            ParsedRecord::Pnors(r)
            | ParsedRecord::Pnors1(r)
            | ParsedRecord::Pnors2(r)
            | ParsedRecord::Pnors3(r)
            | ParsedRecord::Pnors4(r)
            | ParsedRecord::Pnorh3(r)
            | ParsedRecord::Pnorh4(r) => vec![
                ("date", FieldValue::opt_s(&r.date)),
                ("time", FieldValue::opt_s(&r.time)),
                ("error_code", FieldValue::opt_s(&r.error_code)),
                ("status_code", FieldValue::opt_s(&r.status_code)),
                ("battery_voltage", FieldValue::opt_f(r.battery_voltage)),
                ("sound_speed", FieldValue::opt_f(r.sound_speed)),
                ("heading", FieldValue::opt_f(r.heading)),
                ("pitch", FieldValue::opt_f(r.pitch)),
                ("roll", FieldValue::opt_f(r.roll)),
                ("pressure", FieldValue::opt_f(r.pressure)),
                ("temperature", FieldValue::opt_f(r.temperature)),
                ("analog_input1", FieldValue::opt_i(r.analog_input1)),
                ("analog_input2", FieldValue::opt_i(r.analog_input2)),
                ("has_invalid_data", FieldValue::Integer(r.has_invalid_data as i64)),
            ],
            ParsedRecord::Pnorc(r)
            | ParsedRecord::Pnorc1(r)
            | ParsedRecord::Pnorc2(r)
            | ParsedRecord::Pnorc3(r)
            | ParsedRecord::Pnorc4(r) => vec![
                ("date", FieldValue::opt_s(&r.date)),
                ("time", FieldValue::opt_s(&r.time)),
                ("cell_number", FieldValue::opt_i(r.cell_number)),
                ("velocity1", FieldValue::opt_f(r.velocity1)),
                ("velocity2", FieldValue::opt_f(r.velocity2)),
                ("velocity3", FieldValue::opt_f(r.velocity3)),
                ("velocity4", FieldValue::opt_f(r.velocity4)),
                ("speed", FieldValue::opt_f(r.speed)),
                ("direction", FieldValue::opt_f(r.direction)),
                ("amplitude_unit", FieldValue::opt_s(&r.amplitude_unit)),
                ("amplitude1", FieldValue::opt_i(r.amplitude1)),
                ("amplitude2", FieldValue::opt_i(r.amplitude2)),
                ("amplitude3", FieldValue::opt_i(r.amplitude3)),
                ("amplitude4", FieldValue::opt_i(r.amplitude4)),
                ("correlation1", FieldValue::opt_i(r.correlation1)),
                ("correlation2", FieldValue::opt_i(r.correlation2)),
                ("correlation3", FieldValue::opt_i(r.correlation3)),
                ("correlation4", FieldValue::opt_i(r.correlation4)),
                ("has_invalid_data", FieldValue::Integer(r.has_invalid_data as i64)),
            ],
            ParsedRecord::Pnora(r) => vec![
                ("date", FieldValue::opt_s(&r.date)),
                ("time", FieldValue::opt_s(&r.time)),
                ("distance", FieldValue::opt_f(r.distance)),
                ("quality", FieldValue::opt_i(r.quality)),
                ("status", FieldValue::opt_s(&r.status)),
                ("has_invalid_data", FieldValue::Integer(r.has_invalid_data as i64)),
            ],
            ParsedRecord::Pnorw(r) => vec![
                ("date", FieldValue::opt_s(&r.date)),
                ("time", FieldValue::opt_s(&r.time)),
                ("spectrum_basis", FieldValue::opt_i(r.spectrum_basis)),
                ("processing_method", FieldValue::opt_i(r.processing_method)),
                ("hm0", FieldValue::opt_f(r.hm0)),
                ("h3", FieldValue::opt_f(r.h3)),
                ("h10", FieldValue::opt_f(r.h10)),
                ("hmax", FieldValue::opt_f(r.hmax)),
                ("tm02", FieldValue::opt_f(r.tm02)),
                ("tp", FieldValue::opt_f(r.tp)),
                ("tz", FieldValue::opt_f(r.tz)),
                ("dir_tp", FieldValue::opt_f(r.dir_tp)),
                ("spr_tp", FieldValue::opt_f(r.spr_tp)),
                ("main_direction", FieldValue::opt_f(r.main_direction)),
                ("unidirectivity_index", FieldValue::opt_f(r.unidirectivity_index)),
                ("mean_pressure", FieldValue::opt_f(r.mean_pressure)),
                ("num_no_detects", FieldValue::opt_i(r.num_no_detects)),
                ("num_bad_detects", FieldValue::opt_i(r.num_bad_detects)),
                ("near_surface_speed", FieldValue::opt_f(r.near_surface_speed)),
                ("near_surface_direction", FieldValue::opt_f(r.near_surface_direction)),
                ("error_code", FieldValue::opt_s(&r.error_code)),
                ("has_invalid_data", FieldValue::Integer(r.has_invalid_data as i64)),
            ],
            ParsedRecord::Pnorb(r) => vec![
                ("date", FieldValue::opt_s(&r.date)),
                ("time", FieldValue::opt_s(&r.time)),
                ("low_frequency", FieldValue::opt_f(r.low_frequency)),
                ("high_frequency", FieldValue::opt_f(r.high_frequency)),
                ("hm0", FieldValue::opt_f(r.hm0)),
                ("tm02", FieldValue::opt_f(r.tm02)),
                ("tp", FieldValue::opt_f(r.tp)),
                ("dir_tp", FieldValue::opt_f(r.dir_tp)),
                ("spr_tp", FieldValue::opt_f(r.spr_tp)),
                ("main_direction", FieldValue::opt_f(r.main_direction)),
                ("error_code", FieldValue::opt_s(&r.error_code)),
                ("has_invalid_data", FieldValue::Integer(r.has_invalid_data as i64)),
            ],
            ParsedRecord::Pnore(r) => vec![
                ("date", FieldValue::opt_s(&r.date)),
                ("time", FieldValue::opt_s(&r.time)),
                ("spectrum_basis", FieldValue::opt_i(r.spectrum_basis)),
                ("start_frequency", FieldValue::opt_f(r.start_frequency)),
                ("step_frequency", FieldValue::opt_f(r.step_frequency)),
                ("bin_count", FieldValue::Integer(r.bin_count)),
                ("energies", FieldValue::json(&r.energies)),
                ("has_invalid_data", FieldValue::Integer(r.has_invalid_data as i64)),
            ],
            ParsedRecord::Pnorf(r) => vec![
                ("sentence_id", FieldValue::Text(r.sentence_id.clone())),
                ("date", FieldValue::opt_s(&r.date)),
                ("time", FieldValue::opt_s(&r.time)),
                ("spectrum_basis", FieldValue::opt_i(r.spectrum_basis)),
                ("start_frequency", FieldValue::opt_f(r.start_frequency)),
                ("step_frequency", FieldValue::opt_f(r.step_frequency)),
                ("bin_count", FieldValue::Integer(r.bin_count)),
                ("coefficients", FieldValue::json(&r.coefficients)),
                ("has_invalid_data", FieldValue::Integer(r.has_invalid_data as i64)),
            ],
            ParsedRecord::Pnorwd(r) => vec![
                ("sentence_id", FieldValue::Text(r.sentence_id.clone())),
                ("date", FieldValue::opt_s(&r.date)),
                ("time", FieldValue::opt_s(&r.time)),
                ("start_frequency", FieldValue::opt_f(r.start_frequency)),
                ("step_frequency", FieldValue::opt_f(r.step_frequency)),
                ("bin_count", FieldValue::Integer(r.bin_count)),
                ("values", FieldValue::json(&r.values)),
                ("has_invalid_data", FieldValue::Integer(r.has_invalid_data as i64)),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_is_closed_and_total() {
        for prefix in Prefix::ALL {
            assert_eq!(Prefix::from_token(prefix.as_str()), Some(prefix));
        }
        assert_eq!(Prefix::from_token("GPGGA"), None);
        assert_eq!(Prefix::from_token("PNORX"), None);
        assert_eq!(Prefix::from_token("pnori"), None);
    }

    #[test]
    fn table_names_are_lowercase_prefixes() {
        for prefix in Prefix::ALL {
            assert_eq!(prefix.table_name(), prefix.as_str().to_lowercase());
        }
    }

    #[test]
    fn spectra_columns_serialise_arrays_as_json() {
        let record = ParsedRecord::Pnore(EnergySpectrum {
            date: Some("102115".into()),
            time: Some("135734".into()),
            spectrum_basis: Some(3),
            start_frequency: Some(0.02),
            step_frequency: Some(0.01),
            bin_count: 3,
            energies: vec![Some(0.1), None, Some(0.3)],
            has_invalid_data: true,
        });
        let columns = record.columns();
        let energies = columns.iter().find(|(name, _)| *name == "energies").unwrap();
        assert_eq!(energies.1, FieldValue::Text("[0.1,null,0.3]".into()));
        assert!(record.has_invalid_data());
    }
}
