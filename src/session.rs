use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::constants::{DEFAULT_FREQUENCY_GHZ, HZ_PER_GHZ};
use crate::error::EprError;
use crate::units::FieldUnit;

/// One acquisition session: the microwave frequency shared by a set of
/// exports, and what to produce from them.
///
/// ```toml
/// frequency_ghz = 9.63
/// files = ["sample_a.txt", "sample_b.txt"]
/// plot = true
/// g_markers = [2.0023]
/// ```
#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct Session {
    pub frequency_ghz: Option<f64>,
    pub output_dir: Option<PathBuf>,
    pub files: Vec<PathBuf>,
    #[serde(default = "default_csv")]
    pub csv: bool,
    #[serde(default)]
    pub plot: bool,
    #[serde(default = "default_plot_unit")]
    pub plot_unit: FieldUnit,
    #[serde(default)]
    pub g_markers: Vec<f64>,
}

fn default_csv() -> bool {
    true
}

fn default_plot_unit() -> FieldUnit {
    FieldUnit::MilliTesla
}

/// GHz → Hz, falling back to the nominal X-band frequency when absent.
pub fn frequency_hz_or_default(frequency_ghz: Option<f64>) -> f64 {
    match frequency_ghz {
        Some(ghz) => ghz * HZ_PER_GHZ,
        None => {
            info!(
                "no microwave frequency given, using default {} GHz",
                DEFAULT_FREQUENCY_GHZ
            );
            DEFAULT_FREQUENCY_GHZ * HZ_PER_GHZ
        }
    }
}

impl Session {
    pub fn parse(content: &str) -> Result<Session, EprError> {
        let session: Session = toml::from_str(content)?;
        if session.files.is_empty() {
            return Err(EprError::Usage("session lists no files".to_string()));
        }
        Ok(session)
    }

    /// Loads a session file and makes its paths relative to the file's directory.
    pub fn load(path: &Path) -> Result<Session, EprError> {
        info!("Loading session: {}", path.display());
        let content = fs::read_to_string(path)?;
        let mut session = Session::parse(&content)?;
        debug!("Session: {:#?}", session);

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        session.files = session.files.iter().map(|f| base_dir.join(f)).collect();
        session.output_dir = Some(match session.output_dir.take() {
            Some(dir) => base_dir.join(dir),
            None => base_dir.to_path_buf(),
        });
        Ok(session)
    }

    pub fn frequency_hz(&self) -> f64 {
        frequency_hz_or_default(self.frequency_ghz)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let session = Session::parse("files = [\"a.txt\"]").unwrap();
        assert_eq!(session.frequency_ghz, None);
        assert!(session.csv);
        assert!(!session.plot);
        assert_eq!(session.plot_unit, FieldUnit::MilliTesla);
        assert!(session.g_markers.is_empty());
        assert_eq!(session.frequency_hz(), 9.48314e9);
    }

    #[test]
    fn full_session() {
        let content = r#"
            frequency_ghz = 9.63
            output_dir = "out"
            files = ["a.txt", "b.txt"]
            csv = false
            plot = true
            plot_unit = "G"
            g_markers = [2.0023, 4.3]
        "#;
        let session = Session::parse(content).unwrap();
        assert_eq!(session.frequency_hz(), 9.63e9);
        assert_eq!(session.files.len(), 2);
        assert!(!session.csv);
        assert_eq!(session.plot_unit, FieldUnit::Gauss);
        assert_eq!(session.g_markers, vec![2.0023, 4.3]);
    }

    #[test]
    fn unknown_unit_rejected() {
        let content = "files = [\"a.txt\"]\nplot_unit = \"kG\"";
        assert!(matches!(Session::parse(content), Err(EprError::Config(_))));
    }

    #[test]
    fn no_files_rejected() {
        assert!(matches!(
            Session::parse("files = []"),
            Err(EprError::Usage(_))
        ));
    }

    #[test]
    fn paths_relative_to_session_file() {
        let session = Session::load(Path::new("files/session.toml")).unwrap();
        assert_eq!(session.files[0], Path::new("files/radical.txt"));
        assert_eq!(session.output_dir(), Path::new("files"));
    }
}
