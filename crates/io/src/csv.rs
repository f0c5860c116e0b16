// CSV/TSV import into data frames

use std::io::Read;
use std::path::Path;

use dataprobe_core::{Column, DType, DataFrame, Value};

use crate::error::IoError;

/// Field values treated as missing.
const NA_VALUES: &[&str] = &["", "NA", "N/A", "n/a", "NaN", "nan", "-nan", "null", "NULL", "None", "#N/A"];

/// Read a delimited file with a header row into a frame.
///
/// The delimiter is sniffed from the first lines, and each column's dtype is
/// inferred from its non-missing fields.
pub fn import(path: &Path) -> Result<DataFrame, IoError> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    import_from_string(&content, delimiter).map_err(|e| e.with_path(path))
}

/// Delimiters tried by [`sniff_delimiter`], in tie-break order.
const DELIMITERS: [u8; 4] = [b'\t', b';', b',', b'|'];

/// Pick the delimiter that splits the first lines into the same number of
/// fields. A candidate must yield at least two fields on the header line; it
/// scores one point per field on every line agreeing with the header's
/// count. Falls back to comma.
pub fn sniff_delimiter(content: &str) -> u8 {
    let sample: Vec<&str> = content.lines().take(10).collect();

    let mut best = (0usize, b',');
    for delim in DELIMITERS {
        let widths: Vec<usize> = sample.iter().map(|line| field_count(line, delim)).collect();
        let Some(&header) = widths.first() else { break };
        if header < 2 {
            continue;
        }
        let score = header * widths.iter().filter(|&&w| w == header).count();
        if score > best.0 {
            best = (score, delim);
        }
    }
    best.1
}

fn field_count(line: &str, delimiter: u8) -> usize {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());
    match reader.records().next() {
        Some(Ok(record)) => record.len(),
        _ => 1,
    }
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, IoError> {
    let mut file = std::fs::File::open(path).map_err(|e| IoError::from_io(path, e))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| IoError::from_io(path, e))?;

    let text = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            let bytes = e.into_bytes();
            // Fall back to Windows-1252 (common for Excel-exported CSVs)
            log::debug!("{} is not valid UTF-8, decoding as Windows-1252", path.display());
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
    };
    Ok(match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    })
}

pub fn import_from_string(content: &str, delimiter: u8) -> Result<DataFrame, IoError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();
    let header = match records.next() {
        Some(r) => r.map_err(parse_error)?,
        None => return Err(IoError::Empty(None)),
    };
    let header = header_names(header.iter());
    let width = header.len();

    let mut fields: Vec<Vec<String>> = vec![Vec::new(); width];
    for (idx, result) in records.enumerate() {
        let record = result.map_err(parse_error)?;
        // Blank lines are skipped by the reader; a lone empty field is one too
        if record.len() == 1 && record.get(0) == Some("") && width > 1 {
            continue;
        }
        if record.len() > width {
            return Err(IoError::Parse {
                path: None,
                line: idx as u64 + 2,
                message: format!("expected {} fields, saw {}", width, record.len()),
            });
        }
        for (col, slot) in fields.iter_mut().enumerate() {
            slot.push(record.get(col).unwrap_or("").to_string());
        }
    }

    let columns = header
        .into_iter()
        .zip(fields)
        .map(|(name, raw)| infer_column(name, &raw))
        .collect();
    DataFrame::new(columns).map_err(|e| IoError::Parse { path: None, line: 1, message: e.to_string() })
}

fn parse_error(e: csv::Error) -> IoError {
    let line = e.position().map(|p| p.line()).unwrap_or(0);
    IoError::Parse { path: None, line, message: e.to_string() }
}

/// Blank header cells become `Unnamed: <i>`; repeats get `.1`, `.2`, ...
fn header_names<'a>(cells: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for (i, cell) in cells.enumerate() {
        let base = cell.trim();
        let base = if base.is_empty() { format!("Unnamed: {i}") } else { base.to_string() };
        let mut name = base.clone();
        let mut n = 1;
        while names.contains(&name) {
            name = format!("{base}.{n}");
            n += 1;
        }
        names.push(name);
    }
    names
}

fn is_na(field: &str) -> bool {
    NA_VALUES.contains(&field.trim())
}

fn parse_bool(field: &str) -> Option<bool> {
    match field.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Pick the narrowest dtype that parses every present field: int, float,
/// bool, else string. A column with no present fields is float.
fn infer_column(name: String, raw: &[String]) -> Column {
    let present: Vec<&str> = raw.iter().map(String::as_str).filter(|f| !is_na(f)).collect();

    let dtype = if present.is_empty() {
        DType::Float
    } else if present.iter().all(|f| f.trim().parse::<i64>().is_ok()) {
        DType::Int
    } else if present.iter().all(|f| f.trim().parse::<f64>().is_ok()) {
        DType::Float
    } else if present.iter().all(|f| parse_bool(f).is_some()) {
        DType::Bool
    } else {
        DType::Str
    };

    let values = raw
        .iter()
        .map(|f| {
            if is_na(f) {
                return Value::Null;
            }
            let t = f.trim();
            match dtype {
                DType::Int => t.parse().map(Value::Int).unwrap_or(Value::Null),
                DType::Float => t.parse().map(Value::Float).unwrap_or(Value::Null),
                DType::Bool => parse_bool(t).map(Value::Bool).unwrap_or(Value::Null),
                DType::Str => Value::Str(f.clone()),
            }
        })
        .collect();
    Column::with_dtype(name, dtype, values)
}
