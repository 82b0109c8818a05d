use std::path::{Path, PathBuf};

use tracing::debug;

use crate::constants::HZ_PER_GHZ;
use crate::session::{frequency_hz_or_default, Session};
use crate::units::{field_from_g_value, parse_number, FieldUnit, MagneticField};
use crate::{export_csv_files, run_session, EprError};

#[derive(Debug, PartialEq)]
pub enum Command {
    Csv {
        files: Vec<PathBuf>,
        output_dir: Option<PathBuf>,
    },
    Plot {
        files: Vec<PathBuf>,
        output_dir: Option<PathBuf>,
        unit: FieldUnit,
        g_markers: Vec<f64>,
    },
    GValue {
        field: MagneticField,
    },
    Field {
        g_value: f64,
    },
    Session {
        path: PathBuf,
    },
    Help,
    Version,
}

#[derive(Debug)]
pub struct Config {
    pub command: Command,
    pub frequency_ghz: Option<f64>,
}

fn usage(message: impl Into<String>) -> EprError {
    EprError::Usage(message.into())
}

#[derive(Default)]
struct Options {
    frequency_ghz: Option<f64>,
    output_dir: Option<PathBuf>,
    unit: Option<FieldUnit>,
    g_markers: Vec<f64>,
    positional: Vec<String>,
}

// a leading minus followed by a digit is a negative number, not a flag
fn is_flag(arg: &str) -> bool {
    arg.starts_with('-')
        && !arg
            .chars()
            .nth(1)
            .map(|c| c.is_ascii_digit() || c == '.')
            .unwrap_or(false)
}

fn parse_options(args: &[String]) -> Result<Options, EprError> {
    let mut options = Options::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if !is_flag(arg) {
            options.positional.push(arg.clone());
            continue;
        }
        let mut value = || {
            iter.next()
                .ok_or_else(|| usage(format!("option {} needs a value", arg)))
        };
        match arg.as_str() {
            "-f" | "--frequency" => {
                let ghz = parse_number(value()?)?;
                if !(ghz.is_finite() && ghz > 0.0) {
                    return Err(EprError::InvalidFrequency(ghz * HZ_PER_GHZ));
                }
                options.frequency_ghz = Some(ghz);
            }
            "-o" | "--out-dir" => options.output_dir = Some(PathBuf::from(value()?)),
            "-u" | "--unit" => options.unit = Some(value()?.parse()?),
            "-m" | "--mark" => options.g_markers.push(parse_number(value()?)?),
            other => return Err(usage(format!("unknown option {}", other))),
        }
    }
    Ok(options)
}

impl Config {
    pub fn build(args: &[String]) -> Result<Config, EprError> {
        if args.len() < 2 {
            return Err(usage("not enough arguments"));
        }

        let command_name = args[1].as_str();
        match command_name {
            "--version" | "-v" => {
                return Ok(Config {
                    command: Command::Version,
                    frequency_ghz: None,
                })
            }
            "--help" | "-h" => {
                return Ok(Config {
                    command: Command::Help,
                    frequency_ghz: None,
                })
            }
            _ => {}
        }

        let options = parse_options(&args[2..])?;
        let only_for = |name: &str, allowed: bool| {
            if allowed {
                Ok(())
            } else {
                Err(usage(format!("option {} is not valid for `{}`", name, command_name)))
            }
        };

        let command = match command_name {
            "csv" | "plot" => {
                if options.positional.is_empty() {
                    return Err(usage(format!("`{}` needs at least one input file", command_name)));
                }
                let files: Vec<PathBuf> = options.positional.iter().map(PathBuf::from).collect();
                if command_name == "csv" {
                    only_for("--unit", options.unit.is_none())?;
                    only_for("--mark", options.g_markers.is_empty())?;
                    Command::Csv {
                        files,
                        output_dir: options.output_dir,
                    }
                } else {
                    Command::Plot {
                        files,
                        output_dir: options.output_dir,
                        unit: options.unit.unwrap_or(FieldUnit::MilliTesla),
                        g_markers: options.g_markers,
                    }
                }
            }
            "gvalue" | "field" => {
                only_for("--out-dir", options.output_dir.is_none())?;
                only_for("--unit", options.unit.is_none())?;
                only_for("--mark", options.g_markers.is_empty())?;
                // `343.3 mT` arrives as two arguments
                let joined = options.positional.concat();
                if joined.is_empty() {
                    return Err(usage(format!("`{}` needs a value", command_name)));
                }
                if command_name == "gvalue" {
                    Command::GValue {
                        field: joined.parse()?,
                    }
                } else {
                    Command::Field {
                        g_value: parse_number(&joined)?,
                    }
                }
            }
            path if path.ends_with(".toml") => {
                if !options.positional.is_empty() {
                    return Err(usage(
                        "too many arguments, a session runs as `eprtools [-f GHZ] session.toml`",
                    ));
                }
                only_for("--out-dir", options.output_dir.is_none())?;
                only_for("--unit", options.unit.is_none())?;
                only_for("--mark", options.g_markers.is_empty())?;
                Command::Session {
                    path: PathBuf::from(path),
                }
            }
            other => return Err(usage(format!("unknown command `{}`", other))),
        };

        debug!("parsed command {:?}", command);
        Ok(Config {
            command,
            frequency_ghz: options.frequency_ghz,
        })
    }

    pub fn run(args: &[String]) -> Result<Config, Box<dyn std::error::Error>> {
        let config = Config::build(args)?;
        config.execute()?;
        Ok(config)
    }

    fn frequency_hz(&self) -> f64 {
        frequency_hz_or_default(self.frequency_ghz)
    }

    pub fn execute(&self) -> Result<(), EprError> {
        match &self.command {
            Command::Help => print_help(),
            Command::Version => print_version(),
            Command::GValue { field } => {
                let g = field.g_value(self.frequency_hz())?;
                println!("{} - g-value {:.3}", field, g);
            }
            Command::Field { g_value } => {
                let frequency_hz = self.frequency_hz();
                let tesla = field_from_g_value(*g_value, frequency_hz)?;
                println!(
                    "g-value {} at {:.5} GHz - {:.2} G, {:.3} mT, {:.5} T",
                    g_value,
                    frequency_hz / HZ_PER_GHZ,
                    FieldUnit::Gauss.from_tesla(tesla),
                    FieldUnit::MilliTesla.from_tesla(tesla),
                    tesla
                );
            }
            Command::Csv { files, output_dir } => {
                let cwd = std::env::current_dir()?;
                let dir = output_dir.clone().unwrap_or(cwd);
                std::fs::create_dir_all(&dir)?;
                for path in export_csv_files(files, self.frequency_hz(), &dir)? {
                    println!("CSV written: {}", path.display());
                }
            }
            Command::Plot {
                files,
                output_dir,
                unit,
                g_markers,
            } => self.plot(files, output_dir.as_deref(), *unit, g_markers)?,
            Command::Session { path } => {
                let session = self.load_session(path)?;
                for path in run_session(&session, path)? {
                    println!("Written: {}", path.display());
                }
            }
        }
        Ok(())
    }

    /// Loads a session file; `-f` on the command line wins over its frequency.
    pub fn load_session(&self, path: &Path) -> Result<Session, EprError> {
        let session = Session::load(path)?;
        Ok(Session {
            frequency_ghz: self.frequency_ghz.or(session.frequency_ghz),
            ..session
        })
    }

    #[cfg(feature = "plot")]
    fn plot(
        &self,
        files: &[PathBuf],
        output_dir: Option<&Path>,
        unit: FieldUnit,
        g_markers: &[f64],
    ) -> Result<(), EprError> {
        let first = files
            .first()
            .ok_or_else(|| usage("`plot` needs at least one input file"))?;
        // next to the first input unless told otherwise
        let dir = match output_dir {
            Some(dir) => dir.to_path_buf(),
            None => first
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."))
                .to_path_buf(),
        };
        std::fs::create_dir_all(&dir)?;
        let output_path = crate::plot_output_path(&dir, files);
        println!("Generating HTML plot at: {}", output_path.display());
        crate::plot_files(files, self.frequency_hz(), unit, g_markers, &output_path)
    }

    #[cfg(not(feature = "plot"))]
    fn plot(
        &self,
        _files: &[PathBuf],
        _output_dir: Option<&Path>,
        _unit: FieldUnit,
        _g_markers: &[f64],
    ) -> Result<(), EprError> {
        Err(usage("eprtools was built without the `plot` feature"))
    }
}

pub fn print_version() {
    println!("eprtools {}", env!("CARGO_PKG_VERSION"));
}

pub fn print_error(error: &str) {
    const RED: &str = "\x1b[31m";
    const RESET: &str = "\x1b[0m";
    println!("{}Problem running eprtools: {error}{}", RED, RESET);
}

pub fn print_help() {
    // ANSI color codes
    const BOLD: &str = "\x1b[1m";
    const CYAN: &str = "\x1b[36m";
    const GREEN: &str = "\x1b[32m";
    const YELLOW: &str = "\x1b[33m";
    const RESET: &str = "\x1b[0m";

    println!("🧲 eprtools - EPR export conversion and g-value calculator{}", RESET);
    println!();
    println!("{}{}VERSION:{}", BOLD, YELLOW, RESET);
    println!("    {}{}{}", GREEN, env!("CARGO_PKG_VERSION"), RESET);
    println!();
    println!("{}{}USAGE:{}", BOLD, YELLOW, RESET);
    println!("    {} eprtools csv    [-f GHZ] [-o DIR] <FILE>...{}", GREEN, RESET);
    println!(
        "    {} eprtools plot   [-f GHZ] [-o DIR] [-u UNIT] [-m G]... <FILE>...{}",
        GREEN, RESET
    );
    println!("    {} eprtools gvalue [-f GHZ] <VALUE><UNIT>{}", GREEN, RESET);
    println!("    {} eprtools field  [-f GHZ] <G-VALUE>{}", GREEN, RESET);
    println!("    {} eprtools <SESSION.toml> [-f GHZ]{}", GREEN, RESET);
    println!();
    println!("     FILE: Bruker ASCII export (index, field, intensity columns),");
    println!("           or for `plot` a .csv with the field in mT and one column per trace");
    println!("     UNIT: G, mT or T");
    println!();
    println!("     `csv` writes CSV_<name>.csv with Field(T), Field(mT), Field(G), g-value");
    println!("     and Intensity columns. `plot` writes an html file with the field on the");
    println!("     bottom axis and the g-value on the top axis.");
    println!();
    println!("{}{}OPTIONS:{}", BOLD, YELLOW, RESET);
    println!(
        "    {}  -f, --frequency{}  Microwave frequency in GHz (default 9.48314)",
        GREEN, RESET
    );
    println!(
        "    {}  -o, --out-dir{}    Output directory (csv: current dir, plot: next to input)",
        GREEN, RESET
    );
    println!("    {}  -u, --unit{}       Field unit of the plot axis (default mT)", GREEN, RESET);
    println!("    {}  -m, --mark{}       Draw a reference line at this g-value", GREEN, RESET);
    println!("    {}  -v, --version{}    Print version information", GREEN, RESET);
    println!("    {}  -h, --help{}       Print help information", GREEN, RESET);
    println!();
    println!("{}{}EXAMPLES:{}", BOLD, YELLOW, RESET);
    println!("    {} # g-value of a line at 3433 G, measured at 9.63 GHz{}", CYAN, RESET);
    println!("    {} eprtools gvalue -f 9.63 3433G{}", GREEN, RESET);
    println!();
    println!("    {} # Convert two exports{}", CYAN, RESET);
    println!("    {} eprtools csv files/radical.txt files/copper.txt{}", GREEN, RESET);
    println!();
}
