/// Planck constant in J·s (exact, SI 2019).
pub const PLANCK: f64 = 6.626_070_15e-34;

/// Bohr magneton in J/T.
pub const BOHR_MAGNETON: f64 = 9.274_009_994e-24;

/// Gauss per Tesla.
pub const GAUSS_PER_TESLA: f64 = 1.0e4;

/// milliTesla per Tesla.
pub const MILLITESLA_PER_TESLA: f64 = 1.0e3;

/// Hz per GHz, frequencies are entered in GHz on the command line.
pub const HZ_PER_GHZ: f64 = 1.0e9;

/// Nominal X-band microwave frequency used when none is supplied (GHz).
/// Only the command line and session layer fall back to this.
pub const DEFAULT_FREQUENCY_GHZ: f64 = 9.483_14;
