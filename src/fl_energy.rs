//! Basic energy source and the Wi-Fi radio energy model drawing from it.
//!
//! Energy drawn over an interval is `V * I(state) * dt`, charged lazily
//! whenever the radio changes state or the source runs its periodic update.

use serde::{Deserialize, Serialize};

use crate::fl_error::{FlError, Result};
use crate::fl_interface::{SimTime, MAX_SPAN_SECS};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyConfig {
    pub initial_energy_j: f64,
    pub supply_voltage_v: f64,
    /// Period of the source's own update, seconds
    pub update_interval_s: f64,
    pub currents: StateCurrents,
    /// Time a beacon keeps the radio in TX, microseconds
    pub beacon_airtime_us: u64,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            initial_energy_j: 10.0,
            supply_voltage_v: 3.0,
            update_interval_s: 1.0,
            currents: StateCurrents::default(),
            beacon_airtime_us: 200,
        }
    }
}

impl EnergyConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.supply_voltage_v > 0.0 && self.supply_voltage_v.is_finite()) {
            return Err(FlError::Energy(format!(
                "supply voltage must be positive, got {}",
                self.supply_voltage_v
            )));
        }
        if !(self.initial_energy_j >= 0.0 && self.initial_energy_j.is_finite()) {
            return Err(FlError::Energy(format!(
                "initial energy must be >= 0, got {}",
                self.initial_energy_j
            )));
        }
        if !(self.update_interval_s > 0.0 && self.update_interval_s <= MAX_SPAN_SECS) {
            return Err(FlError::Energy(format!(
                "update interval must be in (0, {}] seconds, got {}",
                MAX_SPAN_SECS, self.update_interval_s
            )));
        }
        let c = &self.currents;
        if [c.idle_a, c.cca_busy_a, c.tx_a, c.rx_a, c.sleep_a]
            .iter()
            .any(|i| !(*i >= 0.0 && i.is_finite()))
        {
            return Err(FlError::Energy("state currents must be >= 0".into()));
        }
        Ok(())
    }
}

/// Current drawn per radio state, amperes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateCurrents {
    pub idle_a: f64,
    pub cca_busy_a: f64,
    pub tx_a: f64,
    pub rx_a: f64,
    pub sleep_a: f64,
}

impl Default for StateCurrents {
    fn default() -> Self {
        Self {
            idle_a: 0.273,
            cca_busy_a: 0.273,
            tx_a: 0.380,
            rx_a: 0.313,
            sleep_a: 0.033,
        }
    }
}

// ============================================================================
// Energy Source
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct BasicEnergySource {
    initial_j: f64,
    remaining_j: f64,
    voltage_v: f64,
}

impl BasicEnergySource {
    pub fn new(initial_j: f64, voltage_v: f64) -> Self {
        Self {
            initial_j,
            remaining_j: initial_j,
            voltage_v,
        }
    }

    pub fn supply_voltage(&self) -> f64 {
        self.voltage_v
    }

    pub fn remaining(&self) -> f64 {
        self.remaining_j
    }

    pub fn consumed(&self) -> f64 {
        self.initial_j - self.remaining_j
    }

    pub fn is_depleted(&self) -> bool {
        self.remaining_j <= 0.0
    }

    /// Take up to `joules`, returns what was actually drawn
    pub fn draw(&mut self, joules: f64) -> f64 {
        let taken = joules.max(0.0).min(self.remaining_j);
        self.remaining_j -= taken;
        taken
    }
}

// ============================================================================
// Radio Energy Model
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioState {
    Idle,
    CcaBusy,
    Tx,
    Rx,
    Sleep,
    /// Source depleted, radio powered down for good
    Off,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WifiRadioEnergyModel {
    currents: StateCurrents,
    state: RadioState,
    last_update: SimTime,
    total_j: f64,
}

impl WifiRadioEnergyModel {
    pub fn new(currents: StateCurrents) -> Self {
        Self {
            currents,
            state: RadioState::Idle,
            last_update: SimTime::ZERO,
            total_j: 0.0,
        }
    }

    pub fn state(&self) -> RadioState {
        self.state
    }

    /// Energy charged to the source by this model so far
    pub fn total_energy(&self) -> f64 {
        self.total_j
    }

    fn current(&self) -> f64 {
        match self.state {
            RadioState::Idle => self.currents.idle_a,
            RadioState::CcaBusy => self.currents.cca_busy_a,
            RadioState::Tx => self.currents.tx_a,
            RadioState::Rx => self.currents.rx_a,
            RadioState::Sleep => self.currents.sleep_a,
            RadioState::Off => 0.0,
        }
    }

    /// Charge the source for the time spent in the current state up to `now`
    pub fn update(&mut self, now: SimTime, source: &mut BasicEnergySource) {
        let dt = now.saturating_sub(self.last_update).as_secs_f64();
        let wanted = dt * self.current() * source.supply_voltage();
        self.total_j += source.draw(wanted);
        if now > self.last_update {
            self.last_update = now;
        }
        if source.is_depleted() && self.state != RadioState::Off {
            self.state = RadioState::Off;
        }
    }

    /// Settle the energy of the old state, then switch. A radio that is off
    /// stays off.
    pub fn set_state(&mut self, state: RadioState, now: SimTime, source: &mut BasicEnergySource) {
        self.update(now, source);
        if self.state != RadioState::Off {
            self.state = state;
        }
    }
}
