//! Command line of the harness binary.

use std::path::PathBuf;

use clap::Parser;

use crate::fl_config::ScenarioFile;
use crate::fl_error::Result;
use crate::fl_interface::StationCount;
use crate::fl_params::{parse_seed_hex, SimulationParams};
use crate::fl_scenario::ScenarioConfig;

/// Comparative AITP / CAIP / NAP metrics over a simulated Wi-Fi cell
#[derive(Parser, Debug)]
#[command(
    name = "fl_aitp_simulation",
    version,
    about = "Writes latency, throughput, energy, privacy and robustness CSVs for AITP, CAIP and NAP"
)]
pub struct Cli {
    /// Number of stations [default: 500]
    #[arg(long = "nSta")]
    pub n_sta: Option<StationCount>,

    /// Differential privacy budget ε [default: 1.0]
    #[arg(long = "dpEpsilon", allow_hyphen_values = true)]
    pub dp_epsilon: Option<f64>,

    /// Simulated duration in seconds [default: 10.0]
    #[arg(long = "simTime", allow_hyphen_values = true)]
    pub sim_time: Option<f64>,

    /// 32-byte hex seed; random when omitted
    #[arg(long)]
    pub seed: Option<String>,

    /// Directory for the results CSV files [default: .]
    #[arg(long = "outputDir")]
    pub output_dir: Option<PathBuf>,

    /// YAML scenario file; explicit flags win over its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Defaults, then the scenario file, then explicit flags
    pub fn resolve(&self) -> Result<(SimulationParams, ScenarioConfig)> {
        let mut params = SimulationParams::default();
        let mut scenario = ScenarioConfig::default();

        if let Some(ref path) = self.config {
            let file = ScenarioFile::load(path)?;
            file.apply(&mut params)?;
            scenario = file.scenario;
        }

        if let Some(v) = self.n_sta {
            params.n_sta = v;
        }
        if let Some(v) = self.dp_epsilon {
            params.dp_epsilon = v;
        }
        if let Some(v) = self.sim_time {
            params.sim_time = v;
        }
        if let Some(ref v) = self.seed {
            params.seed = Some(parse_seed_hex(v)?);
        }
        if let Some(ref v) = self.output_dir {
            params.output_dir = v.clone();
        }

        Ok((params, scenario))
    }
}
