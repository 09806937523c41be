//! Per-run CSV logger for metric rows.
//!
//! The first write to a file within one logger truncates it and emits the
//! header; later writes append. Every value is followed by a comma, so a row
//! of six values reads `a,b,c,d,e,f,`.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::trace;

use crate::fl_error::{FlError, Result};

/// Significant digits of a default-formatted C++ output stream
const PRECISION: usize = 6;

/// Per-file state, kept for the lifetime of the logger
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileState {
    pub rows: usize,
}

pub struct CsvLogger {
    dir: PathBuf,
    // insertion order = order files were first written
    files: IndexMap<PathBuf, FileState>,
}

impl CsvLogger {
    /// Logger writing into `dir`. The directory must already exist.
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            files: IndexMap::new(),
        }
    }

    /// Append one row to `filename`, writing `header` first if this logger
    /// has not written that file yet. Returns the full path written.
    pub fn log(&mut self, filename: &str, header: &str, values: &[f64]) -> Result<PathBuf> {
        let path = self.dir.join(filename);
        let initialized = self.files.contains_key(&path);

        let opened = if initialized {
            OpenOptions::new().append(true).open(&path)
        } else {
            File::create(&path)
        };
        let file = opened.map_err(|source| FlError::Csv {
            path: path.clone(),
            source,
        })?;

        write_row(file, if initialized { None } else { Some(header) }, values).map_err(
            |source| FlError::Csv {
                path: path.clone(),
                source,
            },
        )?;

        // only a file whose header made it to disk counts as initialized
        self.files.entry(path.clone()).or_default().rows += 1;
        trace!("csv row {} -> {}", values.len(), path.display());

        Ok(path)
    }

    pub fn is_initialized(&self, filename: &str) -> bool {
        self.files.contains_key(&self.dir.join(filename))
    }

    pub fn files(&self) -> impl Iterator<Item = (&Path, &FileState)> {
        self.files.iter().map(|(p, s)| (p.as_path(), s))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn write_row(file: File, header: Option<&str>, values: &[f64]) -> std::io::Result<()> {
    let mut writer = BufWriter::new(file);
    if let Some(header) = header {
        writeln!(writer, "{}", header)?;
    }
    for value in values {
        write!(writer, "{},", format_value(*value))?;
    }
    writeln!(writer)?;
    writer.flush()
}

/// Render a double like `%g` with six significant digits: fixed notation for
/// exponents in [-4, 6), scientific otherwise, trailing zeros removed.
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    // exponent after rounding to PRECISION digits decides the notation
    let scientific = format!("{:.*e}", PRECISION - 1, value);
    let parsed = scientific
        .split_once('e')
        .and_then(|(mantissa, exp)| exp.parse::<i32>().ok().map(|exp| (mantissa, exp)));
    let (mantissa, exp) = match parsed {
        Some(parts) => parts,
        None => return value.to_string(),
    };

    if exp < -4 || exp >= PRECISION as i32 {
        format!(
            "{}e{}{:02}",
            trim_fraction(mantissa),
            if exp < 0 { '-' } else { '+' },
            exp.abs()
        )
    } else {
        let decimals = (PRECISION as i32 - 1 - exp) as usize;
        trim_fraction(&format!("{:.*}", decimals, value))
    }
}

fn trim_fraction(s: &str) -> String {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s.to_string()
    }
}
