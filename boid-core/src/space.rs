//! Continuous 2D space holding the authoritative position of every agent.

use std::collections::BTreeMap;

use crate::agent::AgentId;
use crate::error::SimError;
use crate::Vector2D;

/// Rectangular space `[0, width) x [0, height)`, optionally wrapping on both
/// axes (a torus).
///
/// Neighbor queries scan every agent unless a bucket grid was requested with
/// [`ContinuousSpace::with_bucket_size`]; both give identical answers.
#[derive(Debug, Clone)]
pub struct ContinuousSpace {
    width: f64,
    height: f64,
    torus: bool,
    positions: BTreeMap<AgentId, Vector2D>,
    grid: Option<BucketGrid>,
}

impl ContinuousSpace {
    pub fn new(width: f64, height: f64, torus: bool) -> Result<Self, SimError> {
        if !(width.is_finite() && width > 0.0) {
            return Err(SimError::invalid("width", "must be positive and finite"));
        }
        if !(height.is_finite() && height > 0.0) {
            return Err(SimError::invalid("height", "must be positive and finite"));
        }
        Ok(Self {
            width,
            height,
            torus,
            positions: BTreeMap::new(),
            grid: None,
        })
    }

    /// Index agents in square-ish buckets with an edge of at least `cell_size`.
    ///
    /// Agents already placed are re-bucketed.
    pub fn with_bucket_size(mut self, cell_size: f64) -> Result<Self, SimError> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(SimError::invalid(
                "bucket size",
                "must be positive and finite",
            ));
        }
        let mut grid = BucketGrid::new(self.width, self.height, cell_size);
        for (&id, &pos) in &self.positions {
            grid.insert(id, pos);
        }
        self.grid = Some(grid);
        Ok(self)
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn is_torus(&self) -> bool {
        self.torus
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn contains(&self, id: AgentId) -> bool {
        self.positions.contains_key(&id)
    }

    pub fn position(&self, id: AgentId) -> Option<Vector2D> {
        self.positions.get(&id).copied()
    }

    /// Every tracked agent with its position, in id order.
    pub fn iter(&self) -> impl Iterator<Item = (AgentId, Vector2D)> + '_ {
        self.positions.iter().map(|(&id, &pos)| (id, pos))
    }

    pub fn out_of_bounds(&self, pos: Vector2D) -> bool {
        !(pos.x >= 0.0 && pos.x < self.width && pos.y >= 0.0 && pos.y < self.height)
    }

    /// Wrap a point onto the torus; the identity when wrapping is disabled.
    pub fn torus_adj(&self, pos: Vector2D) -> Vector2D {
        if self.torus {
            Vector2D::new(wrap(pos.x, self.width), wrap(pos.y, self.height))
        } else {
            pos
        }
    }

    /// The position an agent sent to `pos` would occupy.
    ///
    /// Fails for non-finite points, and for points outside the bounds when
    /// wrapping is disabled.
    pub fn admit(&self, pos: Vector2D) -> Result<Vector2D, SimError> {
        if !pos.is_finite() {
            return Err(SimError::OutOfBounds { x: pos.x, y: pos.y });
        }
        let adjusted = self.torus_adj(pos);
        if self.out_of_bounds(adjusted) {
            return Err(SimError::OutOfBounds { x: pos.x, y: pos.y });
        }
        Ok(adjusted)
    }

    /// Insert an agent, or relocate it if it is already tracked.
    pub fn place_agent(&mut self, id: AgentId, pos: Vector2D) -> Result<(), SimError> {
        let pos = self.admit(pos)?;
        let previous = self.positions.insert(id, pos);
        if let Some(grid) = self.grid.as_mut() {
            match previous {
                Some(old) => grid.relocate(id, old, pos),
                None => grid.insert(id, pos),
            }
        }
        Ok(())
    }

    pub fn move_agent(&mut self, id: AgentId, pos: Vector2D) -> Result<(), SimError> {
        if !self.contains(id) {
            return Err(SimError::UnknownAgent { id });
        }
        self.place_agent(id, pos)
    }

    pub fn remove_agent(&mut self, id: AgentId) -> Option<Vector2D> {
        let pos = self.positions.remove(&id)?;
        if let Some(grid) = self.grid.as_mut() {
            grid.remove(id, pos);
        }
        Some(pos)
    }

    /// Shortest vector from `a` to `b`. On a torus each axis takes the wrapped
    /// difference whenever it is shorter than the direct one.
    pub fn get_heading(&self, a: Vector2D, b: Vector2D) -> Vector2D {
        let mut heading = b - a;
        if self.torus {
            heading.x = shortest_offset(heading.x, self.width);
            heading.y = shortest_offset(heading.y, self.height);
        }
        heading
    }

    pub fn get_distance(&self, a: Vector2D, b: Vector2D) -> f64 {
        self.get_heading(a, b).magnitude()
    }

    /// Agents within `radius` of `pos` (inclusive), sorted by id.
    ///
    /// `exclude` names the querying agent; other agents sharing its exact
    /// position are still returned.
    pub fn get_neighbors(&self, pos: Vector2D, radius: f64, exclude: Option<AgentId>) -> Vec<AgentId> {
        if radius.is_nan() || radius < 0.0 {
            return Vec::new();
        }
        let center = self.torus_adj(pos);
        let within = |(&id, &other): (&AgentId, &Vector2D)| {
            (Some(id) != exclude && self.get_distance(center, other) <= radius).then_some(id)
        };

        match &self.grid {
            Some(grid) => {
                let mut found: Vec<AgentId> = grid
                    .candidates(center, radius, self.torus)
                    .into_iter()
                    .filter_map(|id| self.positions.get_key_value(&id).and_then(&within))
                    .collect();
                found.sort_unstable();
                found
            }
            None => self.positions.iter().filter_map(&within).collect(),
        }
    }
}

fn wrap(value: f64, extent: f64) -> f64 {
    let wrapped = value.rem_euclid(extent);
    // rem_euclid can round up to `extent` for tiny negative inputs
    if wrapped >= extent {
        0.0
    } else {
        wrapped
    }
}

fn shortest_offset(delta: f64, extent: f64) -> f64 {
    // points given off the torus can be several extents apart
    let delta = if delta.abs() > extent {
        delta % extent
    } else {
        delta
    };
    if delta.abs() > extent / 2.0 {
        delta - extent * delta.signum()
    } else {
        delta
    }
}

/// Uniform grid of agent buckets, kept in step with the position table.
#[derive(Debug, Clone)]
struct BucketGrid {
    cols: usize,
    rows: usize,
    cell_w: f64,
    cell_h: f64,
    cells: Vec<Vec<AgentId>>,
}

impl BucketGrid {
    fn new(width: f64, height: f64, cell_size: f64) -> Self {
        // cells only need to be at least `cell_size` wide, so coarser is fine
        let cols = axis_len(width, cell_size);
        let rows = axis_len(height, cell_size);
        Self {
            cols,
            rows,
            cell_w: width / cols as f64,
            cell_h: height / rows as f64,
            cells: vec![Vec::new(); cols * rows],
        }
    }

    fn cell_index(&self, pos: Vector2D) -> usize {
        let cx = ((pos.x / self.cell_w).floor().max(0.0) as usize).min(self.cols - 1);
        let cy = ((pos.y / self.cell_h).floor().max(0.0) as usize).min(self.rows - 1);
        cy * self.cols + cx
    }

    fn insert(&mut self, id: AgentId, pos: Vector2D) {
        let cell = self.cell_index(pos);
        self.cells[cell].push(id);
    }

    fn remove(&mut self, id: AgentId, pos: Vector2D) {
        let cell = self.cell_index(pos);
        let bucket = &mut self.cells[cell];
        if let Some(slot) = bucket.iter().position(|&other| other == id) {
            bucket.swap_remove(slot);
        }
    }

    fn relocate(&mut self, id: AgentId, from: Vector2D, to: Vector2D) {
        if self.cell_index(from) != self.cell_index(to) {
            self.remove(id, from);
            self.insert(id, to);
        }
    }

    /// Every agent bucketed in a cell that may overlap the query disc.
    fn candidates(&self, center: Vector2D, radius: f64, torus: bool) -> Vec<AgentId> {
        let mut found = Vec::new();
        for gy in axis_cells(center.y, radius, self.cell_h, self.rows, torus) {
            for gx in axis_cells(center.x, radius, self.cell_w, self.cols, torus) {
                found.extend_from_slice(&self.cells[gy * self.cols + gx]);
            }
        }
        found
    }
}

/// Upper bound on buckets along one axis.
const MAX_AXIS_CELLS: usize = 256;

fn axis_len(extent: f64, cell_size: f64) -> usize {
    let cells = (extent / cell_size).floor().min(MAX_AXIS_CELLS as f64);
    (cells as usize).max(1)
}

/// Distinct cell indices along one axis overlapping `center +- radius`.
///
/// Bounds stay in f64 until they are known to fit the grid, so any radius
/// and any query point are safe.
fn axis_cells(center: f64, radius: f64, cell: f64, len: usize, torus: bool) -> Vec<usize> {
    // one cell of slack absorbs rounding at cell borders
    let lo = ((center - radius) / cell).floor() - 1.0;
    let hi = ((center + radius) / cell).floor() + 1.0;
    if torus {
        if !(hi - lo + 1.0 < len as f64) {
            return (0..len).collect();
        }
        let len_i = len as i64;
        (lo as i64..=hi as i64)
            .map(|c| c.rem_euclid(len_i) as usize)
            .collect()
    } else {
        let lo = lo.max(0.0);
        let hi = hi.min((len - 1) as f64);
        if !(lo <= hi) {
            return Vec::new();
        }
        (lo as usize..=hi as usize).collect()
    }
}
