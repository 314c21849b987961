//! Waveform CSV ingest and normalization.
//!
//! One file per event with three named numeric columns: `Time` (time axis),
//! `Channel A` (primary signal) and `Channel B` (trigger). Two dialects are
//! accepted, matching the scope exports seen in practice:
//!
//! - comma-delimited with `.` decimals
//! - semicolon-delimited with `,` decimals (some locale-configured scopes)
//!
//! A units row directly under the header (e.g. `(ms),(V),(V)`) is skipped.
//! No fitting logic lives here; the reader only normalizes to numeric
//! sequences.

use std::fs;
use std::path::Path;

use crate::domain::Waveform;
use crate::error::AppError;

const COL_TIME: &str = "Time";
const COL_SIGNAL: &str = "Channel A";
const COL_TRIGGER: &str = "Channel B";

/// Read one waveform file, trying the comma dialect first and falling back
/// to the semicolon/decimal-comma dialect.
pub fn read_waveform(path: &Path) -> Result<Waveform, AppError> {
    let content = fs::read_to_string(path)
        .map_err(|e| AppError::io(format!("Failed to read '{}': {e}", path.display())))?;

    if let Some(wave) = parse_dialect(&content, b',', false, path)? {
        return Ok(wave);
    }
    if let Some(wave) = parse_dialect(&content, b';', true, path)? {
        return Ok(wave);
    }
    Err(AppError::io(format!(
        "'{}' is missing required columns '{COL_TIME}', '{COL_SIGNAL}', '{COL_TRIGGER}'",
        path.display()
    )))
}

/// Parse with one dialect. `Ok(None)` means the header did not match this
/// dialect (so the caller may try another); a malformed body is an error.
fn parse_dialect(
    content: &str,
    delimiter: u8,
    decimal_comma: bool,
    path: &Path,
) -> Result<Option<Waveform>, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| AppError::io(format!("Failed to read headers of '{}': {e}", path.display())))?
        .clone();

    let find = |name: &str| headers.iter().position(|h| h == name);
    let (Some(i_time), Some(i_sig), Some(i_trig)) =
        (find(COL_TIME), find(COL_SIGNAL), find(COL_TRIGGER))
    else {
        return Ok(None);
    };

    let mut time = Vec::new();
    let mut signal = Vec::new();
    let mut trigger = Vec::new();

    for (row, record) in reader.records().enumerate() {
        let record = record
            .map_err(|e| AppError::io(format!("Malformed row in '{}': {e}", path.display())))?;
        let mut parse = |col: usize| -> Option<f64> {
            let field = record.get(col)?;
            if decimal_comma {
                field.replace(',', ".").parse().ok()
            } else {
                field.parse().ok()
            }
        };
        match (parse(i_time), parse(i_sig), parse(i_trig)) {
            (Some(t), Some(s), Some(g)) => {
                time.push(t);
                signal.push(s);
                trigger.push(g);
            }
            // The first data row may be a units row; anything later is a
            // corrupt file.
            _ if row == 0 => continue,
            _ => {
                return Err(AppError::io(format!(
                    "Non-numeric value at data row {} of '{}'",
                    row + 1,
                    path.display()
                )));
            }
        }
    }

    Ok(Some(Waveform { time, signal, trigger }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn temp_file(name: &str, content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("pulsefit-ingest-{}-{name}", std::process::id()));
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn reads_comma_dialect_with_units_row() {
        let path = temp_file(
            "comma.csv",
            "Time,Channel A,Channel B\n(ms),(V),(V)\n0.0,1.5,0.1\n0.5,1.6,0.2\n",
        );
        let wave = read_waveform(&path).unwrap();
        assert_eq!(wave.time, vec![0.0, 0.5]);
        assert_eq!(wave.signal, vec![1.5, 1.6]);
        assert_eq!(wave.trigger, vec![0.1, 0.2]);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn reads_semicolon_decimal_comma_dialect() {
        let path = temp_file(
            "semi.csv",
            "Time;Channel A;Channel B\n0,0;1,5;0,1\n0,5;1,6;0,2\n",
        );
        let wave = read_waveform(&path).unwrap();
        assert_eq!(wave.time, vec![0.0, 0.5]);
        assert_eq!(wave.signal, vec![1.5, 1.6]);
        assert_eq!(wave.trigger, vec![0.1, 0.2]);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_columns_are_an_error() {
        let path = temp_file("cols.csv", "Time,Voltage\n0.0,1.5\n");
        assert!(read_waveform(&path).is_err());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn nan_text_parses_into_rejectable_waveform() {
        // "NaN" is a valid float literal; validation happens downstream.
        let path = temp_file(
            "nan.csv",
            "Time,Channel A,Channel B\n0.0,NaN,0.1\n0.5,1.6,0.2\n",
        );
        let wave = read_waveform(&path).unwrap();
        assert!(wave.signal[0].is_nan());
        std::fs::remove_file(&path).ok();
    }
}
