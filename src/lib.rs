pub mod cli;
pub mod constants;
mod error;
pub mod export;
#[cfg(feature = "plot")]
pub mod plot;
pub mod session;
mod spectrum;
pub mod units;

use std::path::{Path, PathBuf};

use tracing::info;

pub use error::EprError;
pub use session::Session;
pub use spectrum::{Measurement, MultiSpectrum, Spectrum, Trace};
pub use units::{
    convert, convert_all, field_from_g_value, fields_from_g_values, g_value, g_values,
    gauss_to_millitesla, gauss_to_tesla, millitesla_to_gauss, millitesla_to_tesla,
    tesla_to_gauss, tesla_to_millitesla, FieldUnit, MagneticField,
};

// converts every export to CSV_<stem>.csv in `output_dir`, returning the written paths
pub fn export_csv_files(
    files: &[PathBuf],
    frequency_hz: f64,
    output_dir: &Path,
) -> Result<Vec<PathBuf>, EprError> {
    info!("converting {} file(s) at {} Hz", files.len(), frequency_hz);
    let mut written = Vec::with_capacity(files.len());
    for file in files {
        let spectrum = Spectrum::from_bruker_ascii(file)?;
        let output_path = export::csv_output_path(output_dir, file);
        export::write_csv_file(&spectrum, frequency_hz, &output_path)?;
        written.push(output_path);
    }
    Ok(written)
}

#[cfg_attr(not(feature = "plot"), allow(dead_code))]
fn is_csv(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}

// `.csv` inputs are multi-trace tables in mT, anything else a Bruker ASCII export
#[cfg(feature = "plot")]
pub fn load_series(files: &[PathBuf]) -> Result<Vec<plot::Series>, EprError> {
    let mut series = Vec::new();
    for file in files {
        if is_csv(file) {
            series.extend(MultiSpectrum::from_csv(file)?.series());
        } else {
            series.push(plot::Series::from(&Spectrum::from_bruker_ascii(file)?));
        }
    }
    Ok(series)
}

// one plot for all inputs, overlaid when there is more than one
#[cfg(feature = "plot")]
pub fn plot_files(
    files: &[PathBuf],
    frequency_hz: f64,
    unit: FieldUnit,
    g_markers: &[f64],
    output_path: &Path,
) -> Result<(), EprError> {
    let title = match files {
        [single] => single
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "Spectrum".to_string()),
        _ => "Multiplot".to_string(),
    };
    let plot = plot::SpectrumPlot {
        title,
        frequency_hz,
        unit,
        series: load_series(files)?,
        g_markers: g_markers.to_vec(),
    };
    info!("plotting {} series", plot.series.len());
    plot::generate_html_plot(&plot, output_path)
}

/// Default plot location: `<dir>/<stem>.html` for one input, `<dir>/multiplot.html` otherwise.
pub fn plot_output_path(dir: &Path, files: &[PathBuf]) -> PathBuf {
    match files {
        [single] => {
            let stem = single
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "spectrum".to_string());
            dir.join(format!("{}.html", stem))
        }
        _ => dir.join("multiplot.html"),
    }
}

/// Runs a loaded session and returns every file it wrote.
pub fn run_session(session: &Session, session_path: &Path) -> Result<Vec<PathBuf>, EprError> {
    let frequency_hz = session.frequency_hz();
    let output_dir = session.output_dir();
    std::fs::create_dir_all(&output_dir)?;

    let mut written = Vec::new();
    if session.csv {
        written.extend(export_csv_files(&session.files, frequency_hz, &output_dir)?);
    }

    if session.plot {
        #[cfg(feature = "plot")]
        {
            let stem = session_path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "session".to_string());
            let output_path = output_dir.join(format!("{}.html", stem));
            plot_files(
                &session.files,
                frequency_hz,
                session.plot_unit,
                &session.g_markers,
                &output_path,
            )?;
            written.push(output_path);
        }
        #[cfg(not(feature = "plot"))]
        {
            let _ = session_path;
            tracing::warn!("session asks for a plot but the `plot` feature is disabled");
        }
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    #[test]
    fn plot_path_single_and_many() {
        let dir = std::path::Path::new("out");
        let one = vec![PathBuf::from("data/radical.txt")];
        assert_eq!(super::plot_output_path(dir, &one), PathBuf::from("out/radical.html"));
        let two = vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")];
        assert_eq!(super::plot_output_path(dir, &two), PathBuf::from("out/multiplot.html"));
    }

    #[test]
    fn csv_extension_detection() {
        assert!(super::is_csv(std::path::Path::new("x/overlay.CSV")));
        assert!(!super::is_csv(std::path::Path::new("x/radical.txt")));
    }
}
