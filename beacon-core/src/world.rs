//! The World: the agent's body inside a map, with one beacon.
//!
//! Owns motion and collision. The agent only sees it through
//! `Classifier` (for its sensors) and `ActionExecutor` (for its motors).

use std::fmt;

use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::environment::{Beacon, Cell, Classifier, GridMap};

/// Motor command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    MoveForward,
    TurnLeft,
    TurnRight,
}

impl Action {
    pub const ALL: [Action; 3] = [Action::MoveForward, Action::TurnLeft, Action::TurnRight];
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::MoveForward => "moveForward",
            Action::TurnLeft => "turnLeft",
            Action::TurnRight => "turnRight",
        };
        f.write_str(name)
    }
}

/// What happened to a dispatched command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Moved,
    Turned,
    /// Movement refused because the body would overlap a wall.
    Blocked,
    /// Movement refused because the body is pressed against the beacon.
    /// Not a collision: this is how the body arrives.
    ReachedBeacon,
}

impl ActionOutcome {
    /// Only walls count as collisions.
    pub fn is_collision(self) -> bool {
        self == ActionOutcome::Blocked
    }
}

/// Position and heading of a round body. Heading is in radians, y grows downward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub angle: f64,
    pub radius: f64,
}

impl Pose {
    pub fn new(x: f64, y: f64, angle: f64) -> Self {
        Self {
            x,
            y,
            angle,
            radius: BODY_RADIUS,
        }
    }
}

/// Moves the body. Implemented by whatever owns collision.
pub trait ActionExecutor {
    fn pose(&self) -> Pose;
    fn execute(&mut self, action: Action) -> ActionOutcome;
}

/// Map + beacon + body.
#[derive(Debug, Clone)]
pub struct World {
    pub map: GridMap,
    pub beacon: Beacon,
    pose: Pose,
    start: Pose,
    /// Set when the last forward move was refused by the beacon itself.
    touching_beacon: bool,
}

impl World {
    pub fn new(map: GridMap, beacon: Beacon, start: Pose) -> Self {
        Self {
            map,
            beacon,
            pose: start,
            start,
            touching_beacon: false,
        }
    }

    /// The default arena with the body near the bottom and the beacon above it.
    pub fn arena(width: usize, height: usize) -> Self {
        let map = GridMap::arena(width, height);
        let beacon = Beacon::new(width as f64 / 2.0, height as f64 * 2.0 / 3.0 - 40.0);
        let start = Pose::new(width as f64 / 2.0, height as f64 * 5.0 / 6.0, 0.0);
        Self::new(map, beacon, start)
    }

    /// A loaded map: body starts at the centre facing east, beacon placed at random.
    pub fn from_map<R: Rng + ?Sized>(map: GridMap, rng: &mut R) -> Self {
        let start = Pose::new(map.width() as f64 / 2.0, map.height() as f64 / 2.0, 0.0);
        let mut beacon = Beacon::new(0.0, 0.0);
        beacon.relocate(&map, rng);
        Self::new(map, beacon, start)
    }

    pub fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
        self.touching_beacon = false;
    }

    pub fn reset_to_start(&mut self) {
        self.pose = self.start;
        self.touching_beacon = false;
    }

    pub fn start(&self) -> Pose {
        self.start
    }

    /// Inside the reach margin, or pressed against the beacon by a refused move.
    pub fn beacon_reached(&self) -> bool {
        self.touching_beacon || self.beacon.is_reached(self.pose.x, self.pose.y)
    }

    pub fn relocate_beacon<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.beacon.relocate(&self.map, rng);
        self.touching_beacon = false;
        debug!("Beacon relocated to ({:.0}, {:.0})", self.beacon.x, self.beacon.y);
    }

    /// True if a body of the current radius centred at (x, y) touches a non-free pixel.
    pub fn overlaps_obstacle(&self, x: f64, y: f64) -> bool {
        self.first_obstacle(x, y).is_some()
    }

    /// What stops a body centred at (x, y): `Wall` if any wall pixel lies
    /// under it, else `Beacon` if it overlaps the beacon, else `None`.
    fn first_obstacle(&self, x: f64, y: f64) -> Option<Cell> {
        let r = self.pose.radius;
        let (x0, x1) = ((x - r).round() as i64, (x + r).round() as i64);
        let (y0, y1) = ((y - r).round() as i64, (y + r).round() as i64);
        let mut found = None;
        for py in y0..y1 {
            for px in x0..x1 {
                match self.classify(px, py) {
                    Cell::Wall => return Some(Cell::Wall),
                    Cell::Beacon => found = Some(Cell::Beacon),
                    Cell::Free => {}
                }
            }
        }
        found
    }

    fn move_forward(&mut self, distance: f64) -> ActionOutcome {
        let nx = self.pose.x + distance * self.pose.angle.cos();
        let ny = self.pose.y + distance * self.pose.angle.sin();
        match self.first_obstacle(nx, ny) {
            Some(Cell::Beacon) => {
                self.touching_beacon = true;
                return ActionOutcome::ReachedBeacon;
            }
            Some(_) => {
                debug!("Collision prevented at ({:.1}, {:.1})", nx, ny);
                self.touching_beacon = false;
                return ActionOutcome::Blocked;
            }
            None => {}
        }
        self.pose.x = nx;
        self.pose.y = ny;
        self.touching_beacon = false;
        ActionOutcome::Moved
    }
}

impl Classifier for World {
    fn classify(&self, x: i64, y: i64) -> Cell {
        if self.beacon.contains(x, y) {
            return Cell::Beacon;
        }
        self.map.get(x, y)
    }
}

impl ActionExecutor for World {
    fn pose(&self) -> Pose {
        self.pose
    }

    fn execute(&mut self, action: Action) -> ActionOutcome {
        match action {
            Action::MoveForward => self.move_forward(MOVE_STEP),
            Action::TurnLeft => {
                self.pose.angle -= TURN_STEP;
                ActionOutcome::Turned
            }
            Action::TurnRight => {
                self.pose.angle += TURN_STEP;
                ActionOutcome::Turned
            }
        }
    }
}
