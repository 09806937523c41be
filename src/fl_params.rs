// Run parameters

use std::path::PathBuf;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::fl_error::{FlError, Result};
use crate::fl_interface::{secs_to_sim_time, Mode, StationCount, MAX_SPAN_SECS, STATION_SWEEP};

/// Parameters of one harness run. Fixed once parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationParams {
    /// Stations in the simulated topology (not used by the metrics)
    pub n_sta: StationCount,

    /// Simulated duration in seconds
    pub sim_time: f64,

    /// Differential privacy budget
    pub dp_epsilon: f64,

    pub modes: Vec<Mode>,

    /// Station counts the metrics are evaluated over
    pub n_sta_values: Vec<StationCount>,

    /// Random seed (None = generate random)
    pub seed: Option<[u8; 32]>,

    /// Directory receiving the results files
    pub output_dir: PathBuf,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            n_sta: 500,
            sim_time: 10.0,
            dp_epsilon: 1.0,
            modes: Mode::ALL.to_vec(),
            n_sta_values: STATION_SWEEP.to_vec(),
            seed: None,
            output_dir: PathBuf::from("."),
        }
    }
}

impl SimulationParams {
    pub fn validate(&self) -> Result<()> {
        if !self.dp_epsilon.is_finite() || self.dp_epsilon <= 0.0 {
            return Err(FlError::invalid(
                "dpEpsilon",
                format!("must be a positive number, got {}", self.dp_epsilon),
            ));
        }
        if !(self.sim_time >= 0.0 && self.sim_time <= MAX_SPAN_SECS) {
            return Err(FlError::invalid(
                "simTime",
                format!(
                    "must be between 0 and {} seconds, got {}",
                    MAX_SPAN_SECS, self.sim_time
                ),
            ));
        }
        if self.n_sta_values.iter().any(|&n| n == 0) {
            return Err(FlError::invalid("nSta sweep", "station counts must be positive"));
        }
        Ok(())
    }

    pub fn sim_duration(&self) -> Duration {
        secs_to_sim_time(self.sim_time)
    }

    /// Get or generate seed
    pub fn resolve_seed(&self) -> [u8; 32] {
        self.seed.unwrap_or_else(|| {
            let mut temp_rng = StdRng::from_entropy();
            let mut seed = [0u8; 32];
            temp_rng.fill_bytes(&mut seed);
            seed
        })
    }
}

/// Parse a hex seed, optional `0x` prefix. Shorter input is zero-padded,
/// longer input is truncated to 32 bytes.
pub fn parse_seed_hex(hex: &str) -> Result<[u8; 32]> {
    let hex = hex.trim();
    let hex = hex.strip_prefix("0x").unwrap_or(hex);
    if hex.is_empty() || hex.len() % 2 != 0 {
        return Err(FlError::invalid(
            "seed",
            "expected an even number of hex digits",
        ));
    }

    let mut seed = [0u8; 32];
    for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
        if i >= 32 {
            break;
        }
        let byte_str = std::str::from_utf8(chunk)
            .map_err(|_| FlError::invalid("seed", "not ASCII hex"))?;
        seed[i] = u8::from_str_radix(byte_str, 16)
            .map_err(|e| FlError::invalid("seed", format!("{}: {}", byte_str, e)))?;
    }

    Ok(seed)
}

/// Hex rendering used in logs so a run can be repeated with `--seed`
pub fn seed_to_hex(seed: &[u8; 32]) -> String {
    let mut out = String::with_capacity(66);
    out.push_str("0x");
    for b in seed {
        out.push_str(&format!("{:02x}", b));
    }
    out
}
