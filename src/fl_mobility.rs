//! Node mobility: fixed positions and random-waypoint walks over a
//! rectangular area.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::fl_error::{FlError, Result};
use crate::fl_interface::{secs_to_sim_time, SimTime, MAX_SPAN_SECS};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Position) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Point `fraction` of the way from `self` to `to`
    pub fn lerp(&self, to: &Position, fraction: f64) -> Position {
        Position {
            x: self.x + (to.x - self.x) * fraction,
            y: self.y + (to.y - self.y) * fraction,
        }
    }
}

/// Rectangular area nodes move in (metres)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Area {
    pub fn center(&self) -> Position {
        Position::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn contains(&self, p: &Position) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    pub fn random_position<R: Rng>(&self, rng: &mut R) -> Position {
        Position::new(
            sample_range(rng, self.min_x, self.max_x),
            sample_range(rng, self.min_y, self.max_y),
        )
    }
}

/// Mobility parameters shared by all stations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MobilityConfig {
    pub area: Area,
    /// Speed range in m/s, drawn uniformly per leg
    pub min_speed: f64,
    pub max_speed: f64,
    /// Pause at every waypoint, seconds
    pub pause_s: f64,
}

impl Default for MobilityConfig {
    fn default() -> Self {
        Self {
            area: Area {
                min_x: 0.0,
                min_y: 0.0,
                max_x: 100.0,
                max_y: 100.0,
            },
            min_speed: 0.3,
            max_speed: 0.7,
            pause_s: 2.0,
        }
    }
}

impl MobilityConfig {
    pub fn validate(&self) -> Result<()> {
        let a = &self.area;
        let width = a.max_x - a.min_x;
        let height = a.max_y - a.min_y;
        if !(width >= 0.0 && height >= 0.0 && width.is_finite() && height.is_finite()) {
            return Err(FlError::invalid(
                "mobility.area",
                "bounds must be finite with min not above max",
            ));
        }
        if !(self.min_speed > 0.0 && self.min_speed <= self.max_speed && self.max_speed.is_finite())
        {
            return Err(FlError::invalid(
                "mobility.speed",
                format!("need 0 < min <= max, got {}..{}", self.min_speed, self.max_speed),
            ));
        }
        // slowest crossing of the area diagonal bounds every leg
        let longest_leg = width.hypot(height) / self.min_speed;
        if !(longest_leg <= MAX_SPAN_SECS) {
            return Err(FlError::invalid(
                "mobility.speed",
                format!("a leg may take {}s, limit is {}s", longest_leg, MAX_SPAN_SECS),
            ));
        }
        if !(self.pause_s >= 0.0 && self.pause_s <= MAX_SPAN_SECS) {
            return Err(FlError::invalid(
                "mobility.pause_s",
                format!("must be in [0, {}] seconds", MAX_SPAN_SECS),
            ));
        }
        Ok(())
    }
}

fn sample_range<R: Rng>(rng: &mut R, low: f64, high: f64) -> f64 {
    if high > low {
        rng.gen_range(low..high)
    } else {
        low
    }
}

// ============================================================================
// Random Waypoint
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum WalkPhase {
    Moving {
        from: Position,
        to: Position,
        depart: SimTime,
        arrive: SimTime,
    },
    Paused {
        at: Position,
        until: SimTime,
    },
}

/// Walk to a uniform destination at a uniform speed, pause, repeat
#[derive(Debug, Clone, PartialEq)]
pub struct RandomWaypoint {
    config: MobilityConfig,
    phase: WalkPhase,
}

impl RandomWaypoint {
    /// Start at `start`, already paused until `now` so the first
    /// [`advance`](Self::advance) begins a leg
    pub fn new(config: MobilityConfig, start: Position, now: SimTime) -> Self {
        Self {
            config,
            phase: WalkPhase::Paused {
                at: start,
                until: now,
            },
        }
    }

    pub fn position_at(&self, now: SimTime) -> Position {
        match &self.phase {
            WalkPhase::Paused { at, .. } => *at,
            WalkPhase::Moving {
                from,
                to,
                depart,
                arrive,
            } => {
                let total = arrive.saturating_sub(*depart).as_secs_f64();
                if total <= 0.0 || now >= *arrive {
                    return *to;
                }
                let done = now.saturating_sub(*depart).as_secs_f64();
                from.lerp(to, done / total)
            }
        }
    }

    pub fn is_moving(&self) -> bool {
        matches!(self.phase, WalkPhase::Moving { .. })
    }

    /// Complete the current phase at `now`. Returns the waypoint reached when
    /// a leg ends, and the time the next phase ends.
    pub fn advance<R: Rng>(&mut self, now: SimTime, rng: &mut R) -> (Option<Position>, SimTime) {
        match self.phase.clone() {
            WalkPhase::Moving { to, .. } => {
                let until = now.saturating_add(secs_to_sim_time(self.config.pause_s));
                self.phase = WalkPhase::Paused { at: to, until };
                (Some(to), until)
            }
            WalkPhase::Paused { at, .. } => {
                let to = self.config.area.random_position(rng);
                let speed = sample_range(rng, self.config.min_speed, self.config.max_speed);
                let arrive = now.saturating_add(secs_to_sim_time(at.distance(&to) / speed));
                self.phase = WalkPhase::Moving {
                    from: at,
                    to,
                    depart: now,
                    arrive,
                };
                (None, arrive)
            }
        }
    }
}

/// Mobility model installed on a node
#[derive(Debug, Clone, PartialEq)]
pub enum MobilityModel {
    ConstantPosition(Position),
    RandomWaypoint(RandomWaypoint),
}

impl MobilityModel {
    pub fn position_at(&self, now: SimTime) -> Position {
        match self {
            MobilityModel::ConstantPosition(p) => *p,
            MobilityModel::RandomWaypoint(w) => w.position_at(now),
        }
    }
}
