//! Topology construction: one access point, N stations, their Wi-Fi devices,
//! addresses, mobility and the access point's energy model.

use std::net::Ipv4Addr;

use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::fl_address::{AddressingConfig, Ipv4Allocator, Mac48, MacAllocator};
use crate::fl_energy::{BasicEnergySource, EnergyConfig, WifiRadioEnergyModel};
use crate::fl_error::Result;
use crate::fl_interface::{NodeId, SimTime, StationCount};
use crate::fl_mobility::{MobilityConfig, MobilityModel, RandomWaypoint};

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WifiStandard {
    #[serde(rename = "802.11n")]
    N,
    #[serde(rename = "802.11ac")]
    Ac,
    #[serde(rename = "802.11ax")]
    Ax,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateManager {
    Ideal,
    ConstantRate,
    Minstrel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WifiConfig {
    pub ssid: String,
    pub standard: WifiStandard,
    pub rate_manager: RateManager,
    /// Stations probe at start instead of waiting for a beacon
    pub active_probing: bool,
    pub beacon_interval_us: u64,
}

impl Default for WifiConfig {
    fn default() -> Self {
        Self {
            ssid: "ns3-wifi".to_string(),
            standard: WifiStandard::Ax,
            rate_manager: RateManager::Ideal,
            active_probing: false,
            beacon_interval_us: 102_400,
        }
    }
}

/// Everything the scenario builder needs besides the station count
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub wifi: WifiConfig,
    pub mobility: MobilityConfig,
    pub energy: EnergyConfig,
    pub addressing: AddressingConfig,
}

impl ScenarioConfig {
    pub fn validate(&self) -> Result<()> {
        if self.wifi.beacon_interval_us == 0 {
            return Err(crate::fl_error::FlError::invalid(
                "wifi.beacon_interval_us",
                "must be positive",
            ));
        }
        self.mobility.validate()?;
        self.energy.validate()?;
        self.addressing.prefix_len()?;
        Ok(())
    }
}

// ============================================================================
// Nodes
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    AccessPoint,
    Station,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WifiDevice {
    pub mac: Mac48,
    pub ssid: String,
    /// Access point this station is associated with
    pub associated: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub device: WifiDevice,
    pub ipv4: Ipv4Addr,
    pub mobility: MobilityModel,
}

/// Built topology, ready to be handed to the simulator
#[derive(Debug, Clone)]
pub struct Scenario {
    pub config: ScenarioConfig,
    pub nodes: Vec<Node>,
    pub ap: NodeId,
    pub network: Ipv4Addr,
    pub prefix: u8,
    pub energy_source: BasicEnergySource,
    pub radio_energy: WifiRadioEnergyModel,
}

impl Scenario {
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id as usize)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id as usize)
    }

    pub fn stations(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.kind == NodeKind::Station)
    }

    pub fn num_stations(&self) -> usize {
        self.stations().count()
    }

    pub fn associated_stations(&self) -> usize {
        self.stations()
            .filter(|n| n.device.associated.is_some())
            .count()
    }
}

// ============================================================================
// Builder
// ============================================================================

pub struct ScenarioBuilder<'a> {
    config: &'a ScenarioConfig,
}

impl<'a> ScenarioBuilder<'a> {
    pub fn new(config: &'a ScenarioConfig) -> Self {
        Self { config }
    }

    /// Stations get ids `0..n_sta` and the access point `n_sta`. Devices are
    /// installed and addressed in that order.
    pub fn build<R: Rng>(&self, n_sta: StationCount, rng: &mut R) -> Result<Scenario> {
        self.config.validate()?;

        let hosts = n_sta as usize + 1;
        let prefix = self.config.addressing.prefix_len()?;
        let mut ips = Ipv4Allocator::fitting(self.config.addressing.base, prefix, hosts)?;
        if ips.prefix() != prefix {
            debug!(
                "address pool widened to {}/{} for {} hosts",
                ips.network(),
                ips.prefix(),
                hosts
            );
        }
        let mut macs = MacAllocator::new();

        let area = self.config.mobility.area;
        let mut nodes = Vec::with_capacity(hosts);

        for id in 0..n_sta {
            let start = area.random_position(rng);
            nodes.push(Node {
                id,
                kind: NodeKind::Station,
                device: WifiDevice {
                    mac: macs.allocate(),
                    ssid: self.config.wifi.ssid.clone(),
                    associated: None,
                },
                ipv4: ips.allocate()?,
                mobility: MobilityModel::RandomWaypoint(RandomWaypoint::new(
                    self.config.mobility.clone(),
                    start,
                    SimTime::ZERO,
                )),
            });
        }

        let ap = n_sta;
        nodes.push(Node {
            id: ap,
            kind: NodeKind::AccessPoint,
            device: WifiDevice {
                mac: macs.allocate(),
                ssid: self.config.wifi.ssid.clone(),
                associated: None,
            },
            ipv4: ips.allocate()?,
            mobility: MobilityModel::ConstantPosition(area.center()),
        });

        let energy = &self.config.energy;
        Ok(Scenario {
            config: self.config.clone(),
            nodes,
            ap,
            network: ips.network(),
            prefix: ips.prefix(),
            energy_source: BasicEnergySource::new(energy.initial_energy_j, energy.supply_voltage_v),
            radio_energy: WifiRadioEnergyModel::new(energy.currents),
        })
    }
}
