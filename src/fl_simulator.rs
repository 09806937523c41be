//! Discrete-event network simulator.
//!
//! Runs the built [`Scenario`]: access point beacons and station
//! association, random-waypoint movement and the access point's energy
//! accounting. Events are kept in a `BTreeMap` keyed by (time, sequence), so
//! equal-time events run in scheduling order and a seed fully determines a
//! run.

use std::collections::BTreeMap;
use std::time::Duration;

use log::debug;
use rand::rngs::StdRng;
use rand::Rng;

use crate::fl_energy::RadioState;
use crate::fl_error::{FlError, Result};
use crate::fl_interface::{secs_to_sim_time, Event, EventSink, NodeId, SimTime};
use crate::fl_mobility::MobilityModel;
use crate::fl_scenario::{NodeKind, Scenario};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct EventKey {
    time: SimTime,
    sequence: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SimEvent {
    Beacon,
    BeaconEnd,
    ProbeRequest { station: NodeId },
    Mobility { node: NodeId },
    EnergyUpdate,
    Stop,
}

/// What happened during one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimReport {
    pub stop_time: SimTime,
    pub events_processed: usize,
    pub beacons_sent: usize,
    pub associations: usize,
    pub waypoints_reached: usize,
    pub ap_energy_consumed_j: f64,
    pub ap_energy_remaining_j: f64,
    pub ap_depleted_at: Option<SimTime>,
}

pub struct Simulator<S: EventSink> {
    scenario: Scenario,
    queue: BTreeMap<EventKey, SimEvent>,
    now: SimTime,
    sequence: u64,
    stop_at: Option<SimTime>,
    rng: StdRng,
    sink: S,
    report: SimReport,
}

impl<S: EventSink> Simulator<S> {
    pub fn new(scenario: Scenario, rng: StdRng, sink: S) -> Self {
        let mut sim = Self {
            scenario,
            queue: BTreeMap::new(),
            now: SimTime::ZERO,
            sequence: 0,
            stop_at: None,
            rng,
            sink,
            report: SimReport::default(),
        };
        sim.schedule_initial();
        sim
    }

    fn schedule_initial(&mut self) {
        let wifi = &self.scenario.config.wifi;
        let active_probing = wifi.active_probing;

        // first beacon jittered within one interval
        let jitter = Duration::from_micros(self.rng.gen_range(0..wifi.beacon_interval_us));
        self.schedule(jitter, SimEvent::Beacon);

        let stations: Vec<NodeId> = self.scenario.stations().map(|n| n.id).collect();
        for &station in &stations {
            if active_probing {
                self.schedule(SimTime::ZERO, SimEvent::ProbeRequest { station });
            }
            self.schedule(SimTime::ZERO, SimEvent::Mobility { node: station });
        }

        let update = secs_to_sim_time(self.scenario.config.energy.update_interval_s);
        self.schedule(update, SimEvent::EnergyUpdate);
    }

    fn schedule(&mut self, time: SimTime, event: SimEvent) {
        let key = EventKey {
            time,
            sequence: self.sequence,
        };
        self.sequence += 1;
        self.queue.insert(key, event);
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Stop the run `after` from now
    pub fn stop(&mut self, after: Duration) {
        let at = self.now.saturating_add(after);
        self.stop_at = Some(at);
        self.schedule(at, SimEvent::Stop);
    }

    /// Process events until the stop time. Beacons reschedule themselves
    /// forever, so a stop time is required.
    pub fn run(&mut self) -> Result<SimReport> {
        let stop_at = self.stop_at.ok_or_else(|| {
            FlError::invalid("simTime", "simulator run without a stop time would not end")
        })?;

        while let Some((key, event)) = self.queue.pop_first() {
            if key.time > stop_at {
                break;
            }
            self.now = key.time;
            self.report.events_processed += 1;
            if self.handle(event) {
                break;
            }
        }
        self.queue.clear();

        self.report.stop_time = self.now;
        self.report.ap_energy_consumed_j = self.scenario.energy_source.consumed();
        self.report.ap_energy_remaining_j = self.scenario.energy_source.remaining();
        debug!(
            "simulation stopped at {:.3}s after {} events",
            self.now.as_secs_f64(),
            self.report.events_processed
        );
        Ok(self.report.clone())
    }

    /// Returns true once the stop event is reached
    fn handle(&mut self, event: SimEvent) -> bool {
        match event {
            SimEvent::Beacon => self.on_beacon(),
            SimEvent::BeaconEnd => self.set_ap_radio(RadioState::Idle),
            SimEvent::ProbeRequest { station } => {
                if self.scenario.radio_energy.state() != RadioState::Off {
                    self.associate(station);
                }
            }
            SimEvent::Mobility { node } => self.on_mobility(node),
            SimEvent::EnergyUpdate => self.on_energy_update(),
            SimEvent::Stop => {
                let now = self.now;
                let scenario = &mut self.scenario;
                scenario
                    .radio_energy
                    .update(now, &mut scenario.energy_source);
                self.check_depletion();
                self.sink.log(now, self.scenario.ap, Event::Stopped);
                return true;
            }
        }
        false
    }

    fn on_beacon(&mut self) {
        if self.scenario.radio_energy.state() == RadioState::Off {
            return;
        }
        let now = self.now;
        let ap = self.scenario.ap;
        let wifi = &self.scenario.config.wifi;
        let interval = Duration::from_micros(wifi.beacon_interval_us);
        let ssid = wifi.ssid.clone();
        let airtime = Duration::from_micros(self.scenario.config.energy.beacon_airtime_us);

        self.set_ap_radio(RadioState::Tx);
        if self.scenario.radio_energy.state() == RadioState::Off {
            return;
        }
        self.report.beacons_sent += 1;
        self.sink.log(now, ap, Event::Beacon { ssid });

        // ideal channel: every station hears every beacon
        let waiting: Vec<NodeId> = self
            .scenario
            .stations()
            .filter(|n| n.device.associated.is_none())
            .map(|n| n.id)
            .collect();
        for station in waiting {
            self.associate(station);
        }

        self.schedule(now.saturating_add(airtime), SimEvent::BeaconEnd);
        self.schedule(now.saturating_add(interval), SimEvent::Beacon);
    }

    fn associate(&mut self, station: NodeId) {
        let ap = self.scenario.ap;
        if let Some(node) = self.scenario.node_mut(station) {
            if node.kind != NodeKind::Station || node.device.associated.is_some() {
                return;
            }
            node.device.associated = Some(ap);
            self.report.associations += 1;
            self.sink.log(self.now, station, Event::Associated { ap });
        }
    }

    fn on_mobility(&mut self, id: NodeId) {
        let now = self.now;
        let step = match self.scenario.nodes.get_mut(id as usize) {
            Some(node) => match &mut node.mobility {
                MobilityModel::RandomWaypoint(walk) => Some(walk.advance(now, &mut self.rng)),
                MobilityModel::ConstantPosition(_) => None,
            },
            None => None,
        };

        if let Some((arrived, next)) = step {
            if let Some(p) = arrived {
                self.report.waypoints_reached += 1;
                self.sink
                    .log(now, id, Event::WaypointReached { x: p.x, y: p.y });
            }
            self.schedule(next, SimEvent::Mobility { node: id });
        }
    }

    fn on_energy_update(&mut self) {
        let now = self.now;
        let scenario = &mut self.scenario;
        scenario
            .radio_energy
            .update(now, &mut scenario.energy_source);
        self.sink.log(
            now,
            self.scenario.ap,
            Event::EnergyUpdate {
                consumed_j: self.scenario.energy_source.consumed(),
                remaining_j: self.scenario.energy_source.remaining(),
            },
        );
        self.check_depletion();

        if !self.scenario.energy_source.is_depleted() {
            let update = secs_to_sim_time(self.scenario.config.energy.update_interval_s);
            self.schedule(now.saturating_add(update), SimEvent::EnergyUpdate);
        }
    }

    fn set_ap_radio(&mut self, state: RadioState) {
        let now = self.now;
        let scenario = &mut self.scenario;
        scenario
            .radio_energy
            .set_state(state, now, &mut scenario.energy_source);
        self.check_depletion();
    }

    fn check_depletion(&mut self) {
        if self.report.ap_depleted_at.is_none() && self.scenario.energy_source.is_depleted() {
            self.report.ap_depleted_at = Some(self.now);
            self.sink.log(self.now, self.scenario.ap, Event::EnergyDepleted);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fl_event_sinks::CollectorEventSink;
    use crate::fl_interface::NoOpSink;
    use crate::fl_scenario::{ScenarioBuilder, ScenarioConfig};
    use rand::SeedableRng;

    fn scenario(config: &ScenarioConfig, n_sta: u32) -> Scenario {
        let mut rng = StdRng::from_seed([0u8; 32]);
        ScenarioBuilder::new(config).build(n_sta, &mut rng).unwrap()
    }

    #[test]
    fn test_run_requires_stop() {
        let config = ScenarioConfig::default();
        let mut sim = Simulator::new(scenario(&config, 2), StdRng::from_seed([1u8; 32]), NoOpSink);
        assert!(matches!(sim.run(), Err(FlError::InvalidParameter { .. })));
    }

    #[test]
    fn test_ten_second_run() {
        let config = ScenarioConfig::default();
        let mut sink = CollectorEventSink::new();
        let mut sim = Simulator::new(
            scenario(&config, 5),
            StdRng::from_seed([1u8; 32]),
            &mut sink,
        );
        sim.stop(Duration::from_secs(10));
        let report = sim.run().unwrap();
        drop(sim);

        assert_eq!(report.stop_time, Duration::from_secs(10));
        // one beacon per 102.4ms after a sub-interval jitter
        assert!(report.beacons_sent == 97 || report.beacons_sent == 98);
        assert_eq!(report.associations, 5);
        assert!(report.ap_depleted_at.is_none());

        let extra_tx = (0.380 - 0.273) * 0.0002 * report.beacons_sent as f64;
        let expected = 3.0 * (0.273 * 10.0 + extra_tx);
        assert!((report.ap_energy_consumed_j - expected).abs() < 1e-4);
        assert!((report.ap_energy_consumed_j + report.ap_energy_remaining_j - 10.0).abs() < 1e-9);

        let counts = sink.count_by_type();
        assert_eq!(counts.beacon, report.beacons_sent);
        assert_eq!(counts.associated, 5);
        // the tick due at 10s was scheduled after the stop event
        assert_eq!(counts.energy_update, 9);
        assert_eq!(counts.stopped, 1);

        // passive scanning: everyone joins on the first beacon
        let first_beacon = sink
            .events
            .iter()
            .find(|e| matches!(e.event, Event::Beacon { .. }))
            .map(|e| e.time)
            .unwrap();
        assert!(sink
            .events
            .iter()
            .filter(|e| matches!(e.event, Event::Associated { .. }))
            .all(|e| e.time == first_beacon));
    }

    #[test]
    fn test_active_probing_associates_at_start() {
        let mut config = ScenarioConfig::default();
        config.wifi.active_probing = true;
        let mut sink = CollectorEventSink::new();
        let mut sim = Simulator::new(
            scenario(&config, 4),
            StdRng::from_seed([2u8; 32]),
            &mut sink,
        );
        sim.stop(Duration::from_secs(1));
        let report = sim.run().unwrap();
        drop(sim);

        assert_eq!(report.associations, 4);
        assert!(sink
            .events
            .iter()
            .filter(|e| matches!(e.event, Event::Associated { .. }))
            .all(|e| e.time == Duration::ZERO));
    }

    #[test]
    fn test_depleted_access_point_stops_beaconing() {
        let mut config = ScenarioConfig::default();
        config.energy.initial_energy_j = 1.0;
        let mut sim = Simulator::new(scenario(&config, 3), StdRng::from_seed([3u8; 32]), NoOpSink);
        sim.stop(Duration::from_secs(10));
        let report = sim.run().unwrap();

        let depleted = report.ap_depleted_at.unwrap();
        // 1J at ~0.82W
        assert!(depleted > Duration::from_millis(1100));
        assert!(depleted < Duration::from_millis(1400));
        assert!(report.beacons_sent < 20);
        assert_eq!(report.ap_energy_remaining_j, 0.0);
        assert_eq!(sim.scenario().radio_energy.state(), RadioState::Off);
    }

    #[test]
    fn test_empty_access_point_never_beacons() {
        let mut config = ScenarioConfig::default();
        config.energy.initial_energy_j = 0.0;
        let mut sim = Simulator::new(scenario(&config, 3), StdRng::from_seed([6u8; 32]), NoOpSink);
        sim.stop(Duration::from_secs(2));
        let report = sim.run().unwrap();

        assert_eq!(report.beacons_sent, 0);
        assert_eq!(report.associations, 0);
        assert!(report.ap_depleted_at.unwrap() < Duration::from_micros(102_400));
        assert_eq!(report.ap_energy_consumed_j, 0.0);
    }

    #[test]
    fn test_stations_walk() {
        let mut config = ScenarioConfig::default();
        config.mobility.pause_s = 0.0;
        let mut sim = Simulator::new(scenario(&config, 3), StdRng::from_seed([4u8; 32]), NoOpSink);
        sim.stop(Duration::from_secs(3600));
        let report = sim.run().unwrap();

        // any leg across the 100m box at >= 0.3 m/s ends within 472s
        assert!(report.waypoints_reached >= 3 * 7);
        let area = config.mobility.area;
        for node in sim.scenario().stations() {
            assert!(area.contains(&node.mobility.position_at(sim.now())));
        }
    }

    #[test]
    fn test_same_seed_same_report() {
        let config = ScenarioConfig::default();
        let run = || {
            let mut sim =
                Simulator::new(scenario(&config, 8), StdRng::from_seed([9u8; 32]), NoOpSink);
            sim.stop(Duration::from_secs(30));
            sim.run().unwrap()
        };
        assert_eq!(run(), run());
    }
}
