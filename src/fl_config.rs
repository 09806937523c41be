//! YAML scenario files.
//!
//! ```yaml
//! meta:
//!   name: Strict privacy
//! params:
//!   n_sta: 100
//!   dp_epsilon: 0.5
//! scenario:
//!   wifi:
//!     active_probing: true
//!   energy:
//!     initial_energy_j: 5.0
//! ```
//!
//! Every section and field is optional; missing values keep their defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::fl_error::{FlError, Result};
use crate::fl_interface::StationCount;
use crate::fl_params::{parse_seed_hex, SimulationParams};
use crate::fl_scenario::ScenarioConfig;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ScenarioFile {
    pub meta: ScenarioMeta,
    pub params: ParamOverrides,
    pub scenario: ScenarioConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScenarioMeta {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParamOverrides {
    pub n_sta: Option<StationCount>,
    pub dp_epsilon: Option<f64>,
    pub sim_time: Option<f64>,
    /// Hex, as accepted by `--seed`
    pub seed: Option<String>,
    pub output_dir: Option<PathBuf>,
}

impl ScenarioFile {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| FlError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Apply the `params` section on top of `params`
    pub fn apply(&self, params: &mut SimulationParams) -> Result<()> {
        let o = &self.params;
        if let Some(v) = o.n_sta {
            params.n_sta = v;
        }
        if let Some(v) = o.dp_epsilon {
            params.dp_epsilon = v;
        }
        if let Some(v) = o.sim_time {
            params.sim_time = v;
        }
        if let Some(ref v) = o.seed {
            params.seed = Some(parse_seed_hex(v)?);
        }
        if let Some(ref v) = o.output_dir {
            params.output_dir = v.clone();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fl_scenario::WifiStandard;
    use std::net::Ipv4Addr;
    use tempfile::TempDir;

    #[test]
    fn test_empty_file_is_all_defaults() {
        let file = ScenarioFile::parse("{}").unwrap();
        assert_eq!(file.scenario, ScenarioConfig::default());

        let mut params = SimulationParams::default();
        file.apply(&mut params).unwrap();
        assert_eq!(params, SimulationParams::default());
    }

    #[test]
    fn test_overrides() {
        let yaml = r#"
meta:
  name: dense
params:
  n_sta: 100
  dp_epsilon: 0.5
  seed: "0x2a"
scenario:
  wifi:
    ssid: lab
    standard: "802.11ac"
    active_probing: true
  energy:
    initial_energy_j: 5.0
    currents:
      tx_a: 0.5
  addressing:
    base: 192.168.0.0
    mask: 255.255.0.0
"#;
        let file = ScenarioFile::parse(yaml).unwrap();
        assert_eq!(file.meta.name.as_deref(), Some("dense"));
        assert_eq!(file.scenario.wifi.ssid, "lab");
        assert_eq!(file.scenario.wifi.standard, WifiStandard::Ac);
        assert!(file.scenario.wifi.active_probing);
        assert_eq!(file.scenario.wifi.beacon_interval_us, 102_400);
        assert_eq!(file.scenario.energy.initial_energy_j, 5.0);
        assert_eq!(file.scenario.energy.supply_voltage_v, 3.0);
        assert_eq!(file.scenario.energy.currents.tx_a, 0.5);
        assert_eq!(file.scenario.energy.currents.idle_a, 0.273);
        assert_eq!(file.scenario.addressing.base, Ipv4Addr::new(192, 168, 0, 0));

        let mut params = SimulationParams::default();
        file.apply(&mut params).unwrap();
        assert_eq!(params.n_sta, 100);
        assert_eq!(params.dp_epsilon, 0.5);
        assert_eq!(params.sim_time, 10.0);
        assert_eq!(params.seed.unwrap()[0], 0x2a);
    }

    #[test]
    fn test_unknown_param_rejected() {
        let err = ScenarioFile::parse("params:\n  nSweep: [1, 2]\n").unwrap_err();
        assert!(matches!(err, FlError::Yaml(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = ScenarioFile::load(dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, FlError::ConfigRead { .. }));
    }
}
