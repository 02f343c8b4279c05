//! Ray-cast range sensors.
//!
//! Two sensors sit just outside the body rim, left and right of the heading.
//! Each sweeps a small cone of rays and reports the first ray that hits
//! something, in sweep order. Readings are throttled to one refresh per
//! `update_interval_ms`; callers between refreshes get the previous pair.

use serde::Serialize;

use crate::config::SensorConfig;
use crate::constants::{DISTANCE_NORMALIZER, INPUT_SIZE};
use crate::environment::{Cell, Classifier};
use crate::world::Pose;

/// What a sensor ray stopped on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    Wall,
    Beacon,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensorReading {
    pub distance: f64,
    pub detected: bool,
    pub kind: SensorKind,
}

impl SensorReading {
    /// Nothing within range.
    pub fn miss(range: u32) -> Self {
        Self {
            distance: range as f64,
            detected: false,
            kind: SensorKind::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensorPair {
    pub left: SensorReading,
    pub right: SensorReading,
}

impl SensorPair {
    pub fn empty(range: u32) -> Self {
        Self {
            left: SensorReading::miss(range),
            right: SensorReading::miss(range),
        }
    }

    /// Network input: `[left distance / 100, left detected, right distance / 100, right detected]`.
    pub fn normalized(&self) -> [f64; INPUT_SIZE] {
        let flag = |r: &SensorReading| if r.detected { 1.0 } else { 0.0 };
        [
            self.left.distance / DISTANCE_NORMALIZER,
            flag(&self.left),
            self.right.distance / DISTANCE_NORMALIZER,
            flag(&self.right),
        ]
    }

    pub fn readings(&self) -> [&SensorReading; 2] {
        [&self.left, &self.right]
    }

    pub fn beacon_sensed(&self) -> bool {
        self.readings().iter().any(|r| r.kind == SensorKind::Beacon)
    }

    /// Nearest sensed beacon distance, if either side sees one.
    pub fn beacon_distance(&self) -> Option<f64> {
        self.readings()
            .iter()
            .filter(|r| r.kind == SensorKind::Beacon)
            .map(|r| r.distance)
            .min_by(|a, b| a.total_cmp(b))
    }

    pub fn wall_within(&self, distance: f64) -> bool {
        self.readings()
            .iter()
            .any(|r| r.kind == SensorKind::Wall && r.distance < distance)
    }
}

/// The pair of throttled ray-cast sensors.
#[derive(Debug, Clone)]
pub struct SensorModel {
    config: SensorConfig,
    data: SensorPair,
    last_updated: Option<u64>,
}

impl SensorModel {
    pub fn new(config: SensorConfig) -> Self {
        Self {
            data: SensorPair::empty(config.range),
            config,
            last_updated: None,
        }
    }

    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    /// Last computed pair, without refreshing.
    pub fn last(&self) -> SensorPair {
        self.data
    }

    /// Readings for `pose`, recomputed only if the refresh interval has passed.
    ///
    /// Between refreshes the cached pair is returned even if the body has
    /// moved. The first call always computes.
    ///
    /// # Arguments
    /// * `pose` - body position, heading and radius
    /// * `map` - anything that can classify a pixel
    /// * `now_ms` - caller's clock; a clock that runs backwards never refreshes early
    pub fn sensor_data<C: Classifier + ?Sized>(&mut self, pose: Pose, map: &C, now_ms: u64) -> SensorPair {
        let due = match self.last_updated {
            None => true,
            Some(t) => now_ms.saturating_sub(t) >= self.config.update_interval_ms,
        };
        if due {
            self.refresh(pose, map, now_ms)
        } else {
            self.data
        }
    }

    /// Recompute both sensors now, ignoring the throttle.
    pub fn refresh<C: Classifier + ?Sized>(&mut self, pose: Pose, map: &C, now_ms: u64) -> SensorPair {
        self.data = SensorPair {
            left: self.read_side(pose, Side::Left, map),
            right: self.read_side(pose, Side::Right, map),
        };
        self.last_updated = Some(now_ms);
        self.data
    }

    /// Where the `side` sensor sits for a body at `pose`.
    pub fn origin(&self, pose: Pose, side: Side) -> (f64, f64) {
        let sign = match side {
            Side::Left => -1.0,
            Side::Right => 1.0,
        };
        let offset = sign * self.config.lateral_offset / pose.radius;
        let angle = pose.angle + offset;
        let reach = pose.radius + self.config.standoff;
        (pose.x + reach * angle.cos(), pose.y + reach * angle.sin())
    }

    /// Sampled ray angles, swept from the low edge of the cone upward.
    pub fn sample_angles(&self, heading: f64) -> Vec<f64> {
        let cone = self.config.cone_degrees.to_radians();
        let n = self.config.samples;
        if n <= 1 {
            return vec![heading];
        }
        let step = cone / (n - 1) as f64;
        (0..n).map(|i| heading - cone / 2.0 + i as f64 * step).collect()
    }

    /// Reading for one side: the first sampled angle that hits, else a miss.
    pub fn read_side<C: Classifier + ?Sized>(&self, pose: Pose, side: Side, map: &C) -> SensorReading {
        let (ox, oy) = self.origin(pose, side);
        self.sample_angles(pose.angle)
            .into_iter()
            .find_map(|angle| self.cast_ray(ox, oy, angle, map))
            .unwrap_or_else(|| SensorReading::miss(self.config.range))
    }

    /// March one pixel at a time from (ox, oy) and stop on the first wall or beacon.
    ///
    /// Step `i` samples the pixel nearest `(ox + i·cos a, oy + i·sin a)` for
    /// `i` in `0..range`, so an origin already inside an obstacle reads
    /// distance 0. What lies off the map is up to `map`.
    ///
    /// # Returns
    /// The first hit with its distance in pixels, or `None` if the whole
    /// range is free.
    pub fn cast_ray<C: Classifier + ?Sized>(&self, ox: f64, oy: f64, angle: f64, map: &C) -> Option<SensorReading> {
        let (dx, dy) = (angle.cos(), angle.sin());
        (0..self.config.range).find_map(|i| {
            let step = i as f64;
            let x = (ox + step * dx).round() as i64;
            let y = (oy + step * dy).round() as i64;
            let kind = match map.classify(x, y) {
                Cell::Free => return None,
                Cell::Wall => SensorKind::Wall,
                Cell::Beacon => SensorKind::Beacon,
            };
            Some(SensorReading {
                distance: step,
                detected: true,
                kind,
            })
        })
    }
}
