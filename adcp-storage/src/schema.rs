//! Idempotent schema: one DDL catalogue instead of twenty-one hand-written
//! CREATE TABLE blocks. Column names must match the projections in
//! `adcp_nmea::record`; the round-trip test at the bottom pins that.

use adcp_nmea::record::Prefix;

/// Columns shared by every parsed-record table, ahead of the typed ones.
const SHARED_PARSED_COLUMNS: &str = "\
    id INTEGER PRIMARY KEY AUTOINCREMENT,\n\
    ingested_at TEXT NOT NULL,\n\
    raw_line_id INTEGER NOT NULL REFERENCES raw_lines(id),\n\
    raw_sentence TEXT NOT NULL,\n\
    checksum TEXT,\n\
    checksum_valid INTEGER";

type Columns = &'static [(&'static str, &'static str)];

const INSTRUMENT_COLUMNS: Columns = &[
    ("instrument_type_code", "INTEGER"),
    ("head_id", "TEXT"),
    ("beam_count", "INTEGER"),
    ("cell_count", "INTEGER"),
    ("blanking_distance", "REAL"),
    ("cell_size", "REAL"),
    ("coord_system_code", "INTEGER"),
    ("has_invalid_data", "INTEGER"),
];

const SENSOR_COLUMNS: Columns = &[
    ("date", "TEXT"),
    ("time", "TEXT"),
    ("error_code", "TEXT"),
    ("status_code", "TEXT"),
    ("battery_voltage", "REAL"),
    ("sound_speed", "REAL"),
    ("heading", "REAL"),
    ("pitch", "REAL"),
    ("roll", "REAL"),
    ("pressure", "REAL"),
    ("temperature", "REAL"),
    ("analog_input1", "INTEGER"),
    ("analog_input2", "INTEGER"),
    ("has_invalid_data", "INTEGER"),
];

const CURRENT_COLUMNS: Columns = &[
    ("date", "TEXT"),
    ("time", "TEXT"),
    ("cell_number", "INTEGER"),
    ("velocity1", "REAL"),
    ("velocity2", "REAL"),
    ("velocity3", "REAL"),
    ("velocity4", "REAL"),
    ("speed", "REAL"),
    ("direction", "REAL"),
    ("amplitude_unit", "TEXT"),
    ("amplitude1", "INTEGER"),
    ("amplitude2", "INTEGER"),
    ("amplitude3", "INTEGER"),
    ("amplitude4", "INTEGER"),
    ("correlation1", "INTEGER"),
    ("correlation2", "INTEGER"),
    ("correlation3", "INTEGER"),
    ("correlation4", "INTEGER"),
    ("has_invalid_data", "INTEGER"),
];

const ALTIMETER_COLUMNS: Columns = &[
    ("date", "TEXT"),
    ("time", "TEXT"),
    ("distance", "REAL"),
    ("quality", "INTEGER"),
    ("status", "TEXT"),
    ("has_invalid_data", "INTEGER"),
];

const WAVE_COLUMNS: Columns = &[
    ("date", "TEXT"),
    ("time", "TEXT"),
    ("spectrum_basis", "INTEGER"),
    ("processing_method", "INTEGER"),
    ("hm0", "REAL"),
    ("h3", "REAL"),
    ("h10", "REAL"),
    ("hmax", "REAL"),
    ("tm02", "REAL"),
    ("tp", "REAL"),
    ("tz", "REAL"),
    ("dir_tp", "REAL"),
    ("spr_tp", "REAL"),
    ("main_direction", "REAL"),
    ("unidirectivity_index", "REAL"),
    ("mean_pressure", "REAL"),
    ("num_no_detects", "INTEGER"),
    ("num_bad_detects", "INTEGER"),
    ("near_surface_speed", "REAL"),
    ("near_surface_direction", "REAL"),
    ("error_code", "TEXT"),
    ("has_invalid_data", "INTEGER"),
];

const BAND_COLUMNS: Columns = &[
    ("date", "TEXT"),
    ("time", "TEXT"),
    ("low_frequency", "REAL"),
    ("high_frequency", "REAL"),
    ("hm0", "REAL"),
    ("tm02", "REAL"),
    ("tp", "REAL"),
    ("dir_tp", "REAL"),
    ("spr_tp", "REAL"),
    ("main_direction", "REAL"),
    ("error_code", "TEXT"),
    ("has_invalid_data", "INTEGER"),
];

const ENERGY_COLUMNS: Columns = &[
    ("date", "TEXT"),
    ("time", "TEXT"),
    ("spectrum_basis", "INTEGER"),
    ("start_frequency", "REAL"),
    ("step_frequency", "REAL"),
    ("bin_count", "INTEGER"),
    ("energies", "TEXT"),
    ("has_invalid_data", "INTEGER"),
];

const FOURIER_COLUMNS: Columns = &[
    ("sentence_id", "TEXT"),
    ("date", "TEXT"),
    ("time", "TEXT"),
    ("spectrum_basis", "INTEGER"),
    ("start_frequency", "REAL"),
    ("step_frequency", "REAL"),
    ("bin_count", "INTEGER"),
    ("coefficients", "TEXT"),
    ("has_invalid_data", "INTEGER"),
];

const DIRECTION_COLUMNS: Columns = &[
    ("sentence_id", "TEXT"),
    ("date", "TEXT"),
    ("time", "TEXT"),
    ("start_frequency", "REAL"),
    ("step_frequency", "REAL"),
    ("bin_count", "INTEGER"),
    ("values", "TEXT"),
    ("has_invalid_data", "INTEGER"),
];

pub(crate) fn type_columns(prefix: Prefix) -> Columns {
    match prefix {
        Prefix::Pnori | Prefix::Pnori1 | Prefix::Pnori2 => INSTRUMENT_COLUMNS,
        Prefix::Pnors
        | Prefix::Pnors1
        | Prefix::Pnors2
        | Prefix::Pnors3
        | Prefix::Pnors4
        | Prefix::Pnorh3
        | Prefix::Pnorh4 => SENSOR_COLUMNS,
        Prefix::Pnorc
        | Prefix::Pnorc1
        | Prefix::Pnorc2
        | Prefix::Pnorc3
        | Prefix::Pnorc4 => CURRENT_COLUMNS,
        Prefix::Pnora => ALTIMETER_COLUMNS,
        Prefix::Pnorw => WAVE_COLUMNS,
        Prefix::Pnorb => BAND_COLUMNS,
        Prefix::Pnore => ENERGY_COLUMNS,
        Prefix::Pnorf => FOURIER_COLUMNS,
        Prefix::Pnorwd => DIRECTION_COLUMNS,
    }
}

/// Full DDL for one startup migration pass. Safe to run on every start.
pub(crate) fn build_ddl() -> String {
    let mut ddl = String::from(
        "CREATE TABLE IF NOT EXISTS raw_lines (\n\
            id INTEGER PRIMARY KEY AUTOINCREMENT,\n\
            received_at TEXT NOT NULL,\n\
            raw_sentence TEXT NOT NULL,\n\
            parse_status TEXT NOT NULL DEFAULT 'PENDING'\n\
                CHECK (parse_status IN ('PENDING', 'OK', 'FAIL')),\n\
            prefix TEXT,\n\
            checksum_valid INTEGER,\n\
            error_message TEXT\n\
        );\n\
        CREATE TABLE IF NOT EXISTS parse_errors (\n\
            id INTEGER PRIMARY KEY AUTOINCREMENT,\n\
            ingested_at TEXT NOT NULL,\n\
            raw_line_id INTEGER REFERENCES raw_lines(id),\n\
            kind TEXT NOT NULL,\n\
            message TEXT NOT NULL,\n\
            prefix TEXT,\n\
            checksum_expected TEXT,\n\
            checksum_actual TEXT,\n\
            raw_sentence TEXT NOT NULL\n\
        );\n",
    );
    for prefix in Prefix::ALL {
        ddl.push_str("CREATE TABLE IF NOT EXISTS ");
        ddl.push_str(prefix.table_name());
        ddl.push_str(" (\n");
        ddl.push_str(SHARED_PARSED_COLUMNS);
        for (name, sql_type) in type_columns(prefix) {
            ddl.push_str(",\n    \"");
            ddl.push_str(name);
            ddl.push_str("\" ");
            ddl.push_str(sql_type);
        }
        ddl.push_str("\n);\n");
    }
    ddl
}
