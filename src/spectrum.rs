use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::error::EprError;
use crate::units::{convert, parse_number, FieldUnit};

/// One point of a spectrum: field reading and signal intensity (arbitrary units).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Measurement {
    pub field: f64,
    pub intensity: f64,
}

/// An ordered field sweep read from one spectrometer export.
#[derive(Clone, Debug)]
pub struct Spectrum {
    pub name: String,    // file stem, used for titles and output names
    pub unit: FieldUnit, // unit of every `Measurement::field`
    pub measurements: Vec<Measurement>,
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn is_number(token: &str) -> bool {
    token.parse::<f64>().is_ok()
}

// a header like `index  Field [G]  Intensity []` names the field unit in
// brackets; empty or unknown brackets are ignored
fn unit_from_header(line: &str) -> Option<FieldUnit> {
    line.split('[')
        .skip(1)
        .filter_map(|rest| rest.split(']').next())
        .find_map(|inner| inner.parse::<FieldUnit>().ok())
}

fn parse_cell(token: &str, what: &str, line: usize) -> Result<f64, EprError> {
    parse_number(token).map_err(|_| EprError::Parse {
        line,
        message: format!("{} {:?} is not a number", what, token),
    })
}

impl Spectrum {
    pub fn new(name: &str, unit: FieldUnit, measurements: Vec<Measurement>) -> Spectrum {
        Spectrum {
            name: name.to_string(),
            unit,
            measurements,
        }
    }

    /// Reads a whitespace-delimited Bruker ASCII export from disk.
    pub fn from_bruker_ascii(path: &Path) -> Result<Spectrum, EprError> {
        info!("Loading spectrum: {}", path.display());
        let content = fs::read_to_string(path)?;
        Spectrum::parse_bruker_ascii(&file_stem(path), &content)
    }

    /// Parses the text of a Bruker ASCII export.
    ///
    /// Header lines are accepted only before the first data row. Data rows
    /// are `index field intensity [...]` (trailing columns ignored) or just
    /// `field intensity`. The field unit comes from a bracketed header token
    /// and defaults to Gauss.
    pub fn parse_bruker_ascii(name: &str, content: &str) -> Result<Spectrum, EprError> {
        let mut unit = FieldUnit::Gauss;
        let mut measurements = Vec::new();

        for (i, raw) in content.lines().enumerate() {
            let line_number = i + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('%') {
                continue;
            }

            let tokens: Vec<&str> = line.split_whitespace().collect();
            if measurements.is_empty() && !is_number(tokens[0]) {
                if let Some(header_unit) = unit_from_header(line) {
                    unit = header_unit;
                }
                debug!("header line {}: {:?}, field unit {}", line_number, line, unit);
                continue;
            }

            let (field, intensity) = match tokens.len() {
                1 => {
                    return Err(EprError::Parse {
                        line: line_number,
                        message: "expected a field and an intensity column".to_string(),
                    })
                }
                2 => (tokens[0], tokens[1]),
                _ => (tokens[1], tokens[2]),
            };

            measurements.push(Measurement {
                field: parse_cell(field, "field", line_number)?,
                intensity: parse_cell(intensity, "intensity", line_number)?,
            });
        }

        if measurements.is_empty() {
            return Err(EprError::EmptySpectrum(name.to_string()));
        }
        debug!("{}: {} measurements in {}", name, measurements.len(), unit);

        Ok(Spectrum::new(name, unit, measurements))
    }

    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }

    pub fn fields_in(&self, unit: FieldUnit) -> Vec<f64> {
        self.measurements
            .iter()
            .map(|m| convert(m.field, self.unit, unit))
            .collect()
    }

    pub fn intensities(&self) -> Vec<f64> {
        self.measurements.iter().map(|m| m.intensity).collect()
    }

    /// (min, max) of the field axis, `None` for an empty spectrum.
    pub fn field_range_in(&self, unit: FieldUnit) -> Option<(f64, f64)> {
        min_max(&self.fields_in(unit))
    }
}

pub(crate) fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    values.iter().fold(None, |acc, &v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// A named intensity column of a [`MultiSpectrum`].
#[derive(Clone, Debug)]
pub struct Trace {
    pub name: String,
    pub intensities: Vec<f64>,
}

/// Several spectra sharing one field column, laid out `X,Y1,Y2,...` with
/// the field in mT.
#[derive(Clone, Debug)]
pub struct MultiSpectrum {
    pub name: String,
    pub unit: FieldUnit,
    pub fields: Vec<f64>,
    pub traces: Vec<Trace>,
}

fn split_csv_row(line: &str) -> Vec<&str> {
    line.split(',')
        .map(|cell| cell.trim().trim_matches('"'))
        .collect()
}

impl MultiSpectrum {
    pub fn from_csv(path: &Path) -> Result<MultiSpectrum, EprError> {
        info!("Loading multi-trace CSV: {}", path.display());
        let content = fs::read_to_string(path)?;
        MultiSpectrum::parse_csv(&file_stem(path), &content)
    }

    pub fn parse_csv(name: &str, content: &str) -> Result<MultiSpectrum, EprError> {
        let mut names: Option<Vec<String>> = None;
        let mut columns: Option<usize> = None;
        let mut fields = Vec::new();
        let mut data: Vec<Vec<f64>> = Vec::new();

        for (i, raw) in content.lines().enumerate() {
            let line_number = i + 1;
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            let cells = split_csv_row(line);

            if fields.is_empty() && names.is_none() && !is_number(cells[0]) {
                names = Some(cells[1..].iter().map(|s| s.to_string()).collect());
                continue;
            }

            let expected = *columns.get_or_insert(cells.len());
            if expected < 2 {
                return Err(EprError::Parse {
                    line: line_number,
                    message: "expected a field column and at least one signal column".to_string(),
                });
            }
            if cells.len() != expected {
                return Err(EprError::Parse {
                    line: line_number,
                    message: format!("expected {} columns, found {}", expected, cells.len()),
                });
            }
            if data.is_empty() {
                data = vec![Vec::new(); expected - 1];
            }

            fields.push(parse_cell(cells[0], "field", line_number)?);
            for (trace, cell) in data.iter_mut().zip(&cells[1..]) {
                trace.push(parse_cell(cell, "signal", line_number)?);
            }
        }

        if fields.is_empty() {
            return Err(EprError::EmptySpectrum(name.to_string()));
        }

        let names = names.unwrap_or_default();
        let traces = data
            .into_iter()
            .enumerate()
            .map(|(i, intensities)| Trace {
                name: names
                    .get(i)
                    .filter(|n| !n.is_empty())
                    .cloned()
                    .unwrap_or_else(|| format!("Signal {}", i + 1)),
                intensities,
            })
            .collect();

        Ok(MultiSpectrum {
            name: name.to_string(),
            unit: FieldUnit::MilliTesla,
            fields,
            traces,
        })
    }

    pub fn fields_in(&self, unit: FieldUnit) -> Vec<f64> {
        crate::units::convert_all(&self.fields, self.unit, unit)
    }
}
