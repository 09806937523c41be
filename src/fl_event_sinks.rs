//! Event sinks for the network simulator

use hashbrown::HashMap;
use log::{debug, trace};

use crate::fl_interface::{Event, EventSink, NodeId, SimTime};

// ============================================================================
// Logging Sink
// ============================================================================

/// Writes events through the `log` facade. Beacons and energy ticks go to
/// trace, everything else to debug.
pub struct LoggingEventSink;

impl EventSink for LoggingEventSink {
    fn log(&mut self, time: SimTime, node: NodeId, event: Event) {
        let t = time.as_secs_f64();
        match event {
            Event::Beacon { ssid } => {
                trace!("{:>10.6} {:>5} Beacon          ssid:{}", t, node, ssid);
            }
            Event::Associated { ap } => {
                debug!("{:>10.6} {:>5} Associated      ap:{}", t, node, ap);
            }
            Event::WaypointReached { x, y } => {
                debug!("{:>10.6} {:>5} WaypointReached ({:.1}, {:.1})", t, node, x, y);
            }
            Event::EnergyUpdate {
                consumed_j,
                remaining_j,
            } => {
                trace!(
                    "{:>10.6} {:>5} EnergyUpdate    used:{:.4}J left:{:.4}J",
                    t,
                    node,
                    consumed_j,
                    remaining_j
                );
            }
            Event::EnergyDepleted => {
                debug!("{:>10.6} {:>5} EnergyDepleted", t, node);
            }
            Event::Stopped => {
                debug!("{:>10.6} {:>5} Stopped", t, node);
            }
        }
    }
}

// ============================================================================
// Collector Event Sink (In-Memory)
// ============================================================================

/// Collects events in memory for programmatic analysis
#[derive(Default)]
pub struct CollectorEventSink {
    pub events: Vec<EventRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub time: SimTime,
    pub node: NodeId,
    pub event: Event,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct EventTypeCounts {
    pub beacon: usize,
    pub associated: usize,
    pub waypoint_reached: usize,
    pub energy_update: usize,
    pub energy_depleted: usize,
    pub stopped: usize,
}

impl CollectorEventSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn for_node(&self, node: NodeId) -> impl Iterator<Item = &EventRecord> {
        self.events.iter().filter(move |e| e.node == node)
    }

    pub fn in_time_range(&self, start: SimTime, end: SimTime) -> impl Iterator<Item = &EventRecord> {
        self.events
            .iter()
            .filter(move |e| e.time >= start && e.time <= end)
    }

    /// Number of events each node produced
    pub fn events_per_node(&self) -> HashMap<NodeId, usize> {
        let mut counts = HashMap::new();
        for record in &self.events {
            *counts.entry(record.node).or_insert(0) += 1;
        }
        counts
    }

    pub fn count_by_type(&self) -> EventTypeCounts {
        let mut counts = EventTypeCounts::default();
        for record in &self.events {
            match record.event {
                Event::Beacon { .. } => counts.beacon += 1,
                Event::Associated { .. } => counts.associated += 1,
                Event::WaypointReached { .. } => counts.waypoint_reached += 1,
                Event::EnergyUpdate { .. } => counts.energy_update += 1,
                Event::EnergyDepleted => counts.energy_depleted += 1,
                Event::Stopped => counts.stopped += 1,
            }
        }
        counts
    }
}

impl EventSink for CollectorEventSink {
    fn log(&mut self, time: SimTime, node: NodeId, event: Event) {
        self.events.push(EventRecord { time, node, event });
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn log(&mut self, time: SimTime, node: NodeId, event: Event) {
        (**self).log(time, node, event)
    }
}
