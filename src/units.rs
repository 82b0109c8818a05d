use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::constants::{BOHR_MAGNETON, GAUSS_PER_TESLA, MILLITESLA_PER_TESLA, PLANCK};
use crate::error::EprError;

const GAUSS_PER_MILLITESLA: f64 = GAUSS_PER_TESLA / MILLITESLA_PER_TESLA;

// the scalings divide rather than multiply by the reciprocal, so 100 G is
// exactly the 0.01 T literal instead of 0.010000000000000002
pub fn gauss_to_tesla(gauss: f64) -> f64 {
    gauss / GAUSS_PER_TESLA
}

pub fn tesla_to_gauss(tesla: f64) -> f64 {
    tesla * GAUSS_PER_TESLA
}

pub fn millitesla_to_tesla(millitesla: f64) -> f64 {
    millitesla / MILLITESLA_PER_TESLA
}

pub fn tesla_to_millitesla(tesla: f64) -> f64 {
    tesla * MILLITESLA_PER_TESLA
}

pub fn gauss_to_millitesla(gauss: f64) -> f64 {
    gauss / GAUSS_PER_MILLITESLA
}

pub fn millitesla_to_gauss(millitesla: f64) -> f64 {
    millitesla * GAUSS_PER_MILLITESLA
}

/// Unit of a magnetic field reading.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum FieldUnit {
    #[default]
    Gauss,
    MilliTesla,
    Tesla,
}

impl FieldUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            FieldUnit::Gauss => "G",
            FieldUnit::MilliTesla => "mT",
            FieldUnit::Tesla => "T",
        }
    }

    pub fn to_tesla(&self, value: f64) -> f64 {
        match self {
            FieldUnit::Gauss => gauss_to_tesla(value),
            FieldUnit::MilliTesla => millitesla_to_tesla(value),
            FieldUnit::Tesla => value,
        }
    }

    pub fn from_tesla(&self, tesla: f64) -> f64 {
        match self {
            FieldUnit::Gauss => tesla_to_gauss(tesla),
            FieldUnit::MilliTesla => tesla_to_millitesla(tesla),
            FieldUnit::Tesla => tesla,
        }
    }
}

impl fmt::Display for FieldUnit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for FieldUnit {
    type Err = EprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "G" | "Gauss" => Ok(FieldUnit::Gauss),
            "mT" | "milliTesla" => Ok(FieldUnit::MilliTesla),
            "T" | "Tesla" => Ok(FieldUnit::Tesla),
            other => Err(EprError::UnknownUnit(other.to_string())),
        }
    }
}

impl TryFrom<String> for FieldUnit {
    type Error = EprError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Converts a field value between any two units.
pub fn convert(value: f64, from: FieldUnit, to: FieldUnit) -> f64 {
    match (from, to) {
        (FieldUnit::Gauss, FieldUnit::MilliTesla) => gauss_to_millitesla(value),
        (FieldUnit::MilliTesla, FieldUnit::Gauss) => millitesla_to_gauss(value),
        _ if from == to => value,
        _ => to.from_tesla(from.to_tesla(value)),
    }
}

/// Element-wise [`convert`], same length and order as `values`.
pub fn convert_all(values: &[f64], from: FieldUnit, to: FieldUnit) -> Vec<f64> {
    values.iter().map(|&v| convert(v, from, to)).collect()
}

pub(crate) fn check_frequency(frequency_hz: f64) -> Result<(), EprError> {
    if frequency_hz.is_finite() && frequency_hz > 0.0 {
        Ok(())
    } else {
        Err(EprError::InvalidFrequency(frequency_hz))
    }
}

/// Resonance condition `h·ν = g·μB·B` solved for g.
///
/// Fails with [`EprError::ZeroField`] at `field_tesla == 0`; the singularity is
/// never turned into an infinite or clamped number.
pub fn g_value(field_tesla: f64, frequency_hz: f64) -> Result<f64, EprError> {
    check_frequency(frequency_hz)?;
    if !field_tesla.is_finite() {
        return Err(EprError::NonFiniteValue(field_tesla));
    }
    if field_tesla == 0.0 {
        return Err(EprError::ZeroField);
    }
    Ok((PLANCK * frequency_hz) / (BOHR_MAGNETON * field_tesla))
}

/// Inverse of [`g_value`]: the resonant field in Tesla for a given g.
pub fn field_from_g_value(g_value: f64, frequency_hz: f64) -> Result<f64, EprError> {
    check_frequency(frequency_hz)?;
    if !g_value.is_finite() {
        return Err(EprError::NonFiniteValue(g_value));
    }
    if g_value == 0.0 {
        return Err(EprError::ZeroGValue);
    }
    Ok((PLANCK * frequency_hz) / (BOHR_MAGNETON * g_value))
}

/// [`g_value`] applied to every element. The first failing element aborts
/// the whole mapping and is reported by index.
pub fn g_values(fields_tesla: &[f64], frequency_hz: f64) -> Result<Vec<f64>, EprError> {
    check_frequency(frequency_hz)?;
    fields_tesla
        .iter()
        .enumerate()
        .map(|(i, &b)| g_value(b, frequency_hz).map_err(|e| e.at_index(i)))
        .collect()
}

pub fn fields_from_g_values(g_values: &[f64], frequency_hz: f64) -> Result<Vec<f64>, EprError> {
    check_frequency(frequency_hz)?;
    g_values
        .iter()
        .enumerate()
        .map(|(i, &g)| field_from_g_value(g, frequency_hz).map_err(|e| e.at_index(i)))
        .collect()
}

// `nan` and `inf` parse as f64 but are not readings
pub(crate) fn parse_number(text: &str) -> Result<f64, EprError> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| EprError::InvalidNumber(text.to_string()))
}

/// A field reading together with its unit, e.g. `343.3 mT`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MagneticField {
    pub value: f64,
    pub unit: FieldUnit,
}

impl MagneticField {
    pub fn new(value: f64, unit: FieldUnit) -> MagneticField {
        MagneticField { value, unit }
    }

    pub fn to(&self, unit: FieldUnit) -> MagneticField {
        MagneticField {
            value: convert(self.value, self.unit, unit),
            unit,
        }
    }

    pub fn tesla(&self) -> f64 {
        self.unit.to_tesla(self.value)
    }

    pub fn g_value(&self, frequency_hz: f64) -> Result<f64, EprError> {
        g_value(self.tesla(), frequency_hz)
    }
}

impl fmt::Display for MagneticField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

impl FromStr for MagneticField {
    type Err = EprError;

    /// Accepts a number followed by a unit, with or without a space:
    /// `3433G`, `343.3 mT`, `3.433e-1T`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .char_indices()
            .rev()
            .take_while(|(_, c)| c.is_alphabetic())
            .last()
            .map(|(i, _)| i)
            .unwrap_or(s.len());
        let (number, unit) = s.split_at(split);
        let unit: FieldUnit = unit.parse()?;
        let value = parse_number(number)?;
        Ok(MagneticField { value, unit })
    }
}
