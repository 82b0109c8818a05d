use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::EprError;
use crate::spectrum::Spectrum;
use crate::units::{g_value, FieldUnit};

pub const CSV_HEADER: &str = "Field(T),Field(mT),Field(G),g-value,Intensity";

/// `<dir>/CSV_<stem>.csv`
pub fn csv_output_path(dir: &Path, input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "spectrum".to_string());
    dir.join(format!("CSV_{}.csv", stem))
}

/// Writes the spectrum as CSV with Tesla, milliTesla, Gauss, g-value and
/// intensity columns, one row per measurement in file order.
///
/// A measurement at zero field has no g-value; its row carries `inf` in that
/// column instead of being dropped.
pub fn write_csv<W: Write>(
    spectrum: &Spectrum,
    frequency_hz: f64,
    writer: &mut W,
) -> Result<(), EprError> {
    crate::units::check_frequency(frequency_hz)?;
    writeln!(writer, "{}", CSV_HEADER)?;

    for (i, m) in spectrum.measurements.iter().enumerate() {
        let tesla = spectrum.unit.to_tesla(m.field);
        let millitesla = FieldUnit::MilliTesla.from_tesla(tesla);
        let gauss = crate::units::convert(m.field, spectrum.unit, FieldUnit::Gauss);

        let g = match g_value(tesla, frequency_hz) {
            Ok(g) => g.to_string(),
            Err(EprError::ZeroField) => {
                warn!(
                    "{}: row {} is at zero field, g-value written as inf",
                    spectrum.name,
                    i + 1
                );
                "inf".to_string()
            }
            Err(e) => return Err(e.at_index(i)),
        };

        writeln!(
            writer,
            "{},{},{},{},{}",
            tesla, millitesla, gauss, g, m.intensity
        )?;
    }
    Ok(())
}

pub fn write_csv_file(
    spectrum: &Spectrum,
    frequency_hz: f64,
    output_path: &Path,
) -> Result<(), EprError> {
    let file = File::create(output_path)?;
    let mut writer = BufWriter::new(file);
    write_csv(spectrum, frequency_hz, &mut writer)?;
    writer.flush()?;
    info!("CSV for {} written to {}", spectrum.name, output_path.display());
    Ok(())
}
