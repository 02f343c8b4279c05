//! The Environment: what occupies each pixel of the arena.
//!
//! The learning core only ever asks `classify(x, y)`. `GridMap` is the raster
//! implementation used by the simulator; renderers can provide their own.

use rand::Rng;

use crate::constants::*;
use crate::error::{CoreError, Result};

/// Occupant of a single pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Free,
    Wall,
    Beacon,
}

/// Answers "what occupies pixel (x, y)?".
///
/// Out-of-bounds coordinates must classify as `Cell::Free`.
pub trait Classifier {
    fn classify(&self, x: i64, y: i64) -> Cell;
}

impl<F> Classifier for F
where
    F: Fn(i64, i64) -> Cell,
{
    fn classify(&self, x: i64, y: i64) -> Cell {
        self(x, y)
    }
}

/// A raster of cells.
#[derive(Debug, Clone)]
pub struct GridMap {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl GridMap {
    /// An all-free map.
    pub fn empty(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::Free; width * height],
        }
    }

    /// A walled arena with a few interior obstacles.
    pub fn arena(width: usize, height: usize) -> Self {
        let mut map = Self::empty(width, height);
        let border = 4;
        map.fill_rect(0, 0, width, border, Cell::Wall);
        map.fill_rect(0, height.saturating_sub(border), width, border, Cell::Wall);
        map.fill_rect(0, 0, border, height, Cell::Wall);
        map.fill_rect(width.saturating_sub(border), 0, border, height, Cell::Wall);

        // Two pillars and a partial divider
        map.fill_rect(width / 4, height / 4, 40, 40, Cell::Wall);
        map.fill_rect(3 * width / 4 - 40, 3 * height / 4 - 40, 40, 40, Cell::Wall);
        map.fill_rect(width / 2 - 5, 0, 10, height / 3, Cell::Wall);
        map
    }

    /// Parse a map from text, one row per line.
    /// `#` is a wall, `B` a beacon pixel, anything else free.
    /// Short rows are padded with free cells.
    pub fn from_ascii(text: &str) -> Result<Self> {
        let rows: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
        let height = rows.len();
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        if width == 0 || height == 0 {
            return Err(CoreError::Map("map text has no rows".into()));
        }

        let mut map = Self::empty(width, height);
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let cell = match ch {
                    '#' => Cell::Wall,
                    'B' => Cell::Beacon,
                    _ => Cell::Free,
                };
                map.cells[y * width + x] = cell;
            }
        }
        Ok(map)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: i64, y: i64) -> Cell {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return Cell::Free;
        }
        self.cells[y as usize * self.width + x as usize]
    }

    pub fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    /// Fill a rectangle, clipped to the map.
    pub fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, cell: Cell) {
        let x_end = (x + w).min(self.width);
        let y_end = (y + h).min(self.height);
        for yy in y.min(self.height)..y_end {
            for xx in x.min(self.width)..x_end {
                self.cells[yy * self.width + xx] = cell;
            }
        }
    }

    /// True if no wall lies inside the given rectangle.
    pub fn is_clear(&self, x: usize, y: usize, w: usize, h: usize) -> bool {
        (y..y + h).all(|yy| (x..x + w).all(|xx| self.get(xx as i64, yy as i64) != Cell::Wall))
    }
}

impl Classifier for GridMap {
    fn classify(&self, x: i64, y: i64) -> Cell {
        self.get(x, y)
    }
}

/// The goal marker: an axis-aligned square the agent tries to reach.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Beacon {
    pub x: f64,
    pub y: f64,
    pub size: f64,
}

impl Beacon {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            size: BEACON_SIZE as f64,
        }
    }

    pub fn contains(&self, px: i64, py: i64) -> bool {
        let (px, py) = (px as f64, py as f64);
        px >= self.x && px < self.x + self.size && py >= self.y && py < self.y + self.size
    }

    /// An entity centred at (x, y) has reached the beacon when it is
    /// inside or within `BEACON_REACH_MARGIN` of the square.
    pub fn is_reached(&self, x: f64, y: f64) -> bool {
        x + BEACON_REACH_MARGIN >= self.x
            && x - BEACON_REACH_MARGIN <= self.x + self.size
            && y + BEACON_REACH_MARGIN >= self.y
            && y - BEACON_REACH_MARGIN <= self.y + self.size
    }

    pub fn set_location(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
    }

    /// Pick a new wall-free location at least `BEACON_PADDING` from the edges.
    ///
    /// Gives up after a bounded number of attempts and keeps the last candidate.
    pub fn relocate<R: Rng + ?Sized>(&mut self, map: &GridMap, rng: &mut R) {
        let size = self.size as usize;
        let span_x = map.width().saturating_sub(size + 2 * BEACON_PADDING).max(1);
        let span_y = map.height().saturating_sub(size + 2 * BEACON_PADDING).max(1);

        for _ in 0..64 {
            let x = rng.gen_range(0..span_x) + BEACON_PADDING;
            let y = rng.gen_range(0..span_y) + BEACON_PADDING;
            self.set_location(x as f64, y as f64);
            if map.is_clear(x, y, size, size) {
                return;
            }
        }
    }
}
