use glam::Vec3;
use std::sync::atomic::{AtomicBool, Ordering};

pub const DEFAULT_EXTENT: f32 = 30.0;
pub const DEFAULT_STEP: f32 = 2.0;
pub const MIN_STEP: f32 = 0.1;
pub const MAX_EXTENT: f32 = 500.0;
/// Cells per side; finer steps are coarsened to fit.
pub const MAX_COLUMNS: usize = 1024;

/// (scale, amplitude) of the three sinusoidal layers.
const OCTAVES: [(f32, f32); 3] = [(0.05, 8.0), (0.15, 3.0), (0.3, 1.0)];
const RIDGE_SCALE: f32 = 0.08;
const RIDGE_AMPLITUDE: f32 = 5.0;

/// Procedural terrain height at a world position. Pure and deterministic.
pub fn terrain_height(x: f32, z: f32) -> f32 {
    let layers: f32 = OCTAVES
        .iter()
        .map(|&(scale, amplitude)| (x * scale).sin() * (z * scale).cos() * amplitude)
        .sum();
    let ridge = (x * RIDGE_SCALE).sin().abs() * (z * RIDGE_SCALE).cos().abs() * RIDGE_AMPLITUDE;
    layers + ridge
}

/// One quad of the terrain grid.
///
/// Footprint is `[x, x_end) × [z, z_end)`. Inside a grid the ends are the
/// next cell's origins, bit for bit. Corner heights are fixed at
/// construction: h1 bottom-left, h2 bottom-right, h3 top-right, h4 top-left.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub x: f32,
    pub z: f32,
    pub x_end: f32,
    pub z_end: f32,
    pub step: f32,
    pub heights: [f32; 4],
}

impl Cell {
    pub fn new(x: f32, z: f32, step: f32, height: impl Fn(f32, f32) -> f32) -> Self {
        Self::spanning([x, x + step], [z, z + step], step, height)
    }

    /// Cell between explicit edges, `[start, end)` along each axis.
    pub fn spanning(
        [x, x_end]: [f32; 2],
        [z, z_end]: [f32; 2],
        step: f32,
        height: impl Fn(f32, f32) -> f32,
    ) -> Self {
        Self {
            x,
            z,
            x_end,
            z_end,
            step,
            heights: [height(x, z), height(x_end, z), height(x_end, z_end), height(x, z_end)],
        }
    }

    #[inline]
    pub fn contains(&self, x: f32, z: f32) -> bool {
        x >= self.x && x < self.x_end && z >= self.z && z < self.z_end
    }

    /// Bilinear blend of the corner heights. Exact at the corners.
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        let u = (x - self.x) / (self.x_end - self.x);
        let v = (z - self.z) / (self.z_end - self.z);
        let [h1, h2, h3, h4] = self.heights;

        let bottom = h1 * (1.0 - u) + h2 * u;
        let top = h4 * (1.0 - u) + h3 * u;
        bottom * (1.0 - v) + top * v
    }

    /// Corner positions in the same order as `heights`.
    pub fn corners(&self) -> [Vec3; 4] {
        let [h1, h2, h3, h4] = self.heights;
        [
            Vec3::new(self.x, h1, self.z),
            Vec3::new(self.x_end, h2, self.z),
            Vec3::new(self.x_end, h3, self.z_end),
            Vec3::new(self.x, h4, self.z_end),
        ]
    }

    pub fn center(&self) -> Vec3 {
        let x = (self.x + self.x_end) * 0.5;
        let z = (self.z + self.z_end) * 0.5;
        Vec3::new(x, self.height_at(x, z), z)
    }
}

/// Square grid of cells around the origin.
///
/// Cells are stored row-major (z rows, x columns) so a lookup is an index
/// computation instead of a scan.
pub struct HeightField {
    extent: f32,
    step: f32,
    origin: f32,
    columns: usize,
    cells: Vec<Cell>,
    /// Set once a lookup miss has been reported for the current grid.
    miss_reported: AtomicBool,
}

impl HeightField {
    pub fn new(extent: f32, step: f32) -> Self {
        let mut field = Self {
            extent: 0.0,
            step: MIN_STEP,
            origin: 0.0,
            columns: 0,
            cells: Vec::new(),
            miss_reported: AtomicBool::new(false),
        };
        field.regenerate(extent, step);
        field
    }

    pub fn extent(&self) -> f32 {
        self.extent
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Throws away every cell and tiles `[-2·extent, 2·extent]` again.
    ///
    /// The new grid is built off to the side and swapped in whole.
    pub fn regenerate(&mut self, extent: f32, step: f32) {
        let (extent, step) = normalize_dimensions(extent, step);
        let origin = -2.0 * extent;
        let columns = (((4.0 * extent) / step).floor() as usize + 1).min(MAX_COLUMNS);
        let edge = |i: usize| origin + i as f32 * step;

        let mut cells = Vec::with_capacity(columns * columns);
        for row in 0..columns {
            for column in 0..columns {
                cells.push(Cell::spanning(
                    [edge(column), edge(column + 1)],
                    [edge(row), edge(row + 1)],
                    step,
                    terrain_height,
                ));
            }
        }

        self.extent = extent;
        self.step = step;
        self.origin = origin;
        self.columns = columns;
        self.cells = cells;
        self.miss_reported.store(false, Ordering::Relaxed);

        log::info!(
            "terrain regenerated: {} cells, extent {}, step {}",
            self.cells.len(),
            extent,
            step
        );
    }

    /// Cell whose half-open footprint contains the point, if any.
    pub fn cell_at(&self, x: f32, z: f32) -> Option<&Cell> {
        if !x.is_finite() || !z.is_finite() {
            return None;
        }
        let column = self.index_along(x)?;
        let row = self.index_along(z)?;

        // The division can land one slot off at a shared edge; check neighbours.
        for r in row.saturating_sub(1)..=(row + 1).min(self.columns - 1) {
            for c in column.saturating_sub(1)..=(column + 1).min(self.columns - 1) {
                let cell = &self.cells[r * self.columns + c];
                if cell.contains(x, z) {
                    return Some(cell);
                }
            }
        }
        None
    }

    /// Interpolated terrain height. Outside the grid the procedural function
    /// is evaluated directly; only the first miss per grid is logged at warn.
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        match self.cell_at(x, z) {
            Some(cell) => cell.height_at(x, z),
            None => {
                if self.miss_reported.swap(true, Ordering::Relaxed) {
                    log::trace!("no terrain cell at ({x}, {z})");
                } else {
                    log::warn!("no terrain cell at ({x}, {z}); evaluating height directly");
                }
                terrain_height(x, z)
            }
        }
    }

    fn index_along(&self, coordinate: f32) -> Option<usize> {
        let offset = ((coordinate - self.origin) / self.step).floor();
        if offset < -1.0 || offset > self.columns as f32 {
            return None;
        }
        Some((offset.max(0.0) as usize).min(self.columns - 1))
    }
}

impl Default for HeightField {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENT, DEFAULT_STEP)
    }
}

fn normalize_dimensions(extent: f32, step: f32) -> (f32, f32) {
    let extent = if extent.is_finite() { extent.abs() } else { DEFAULT_EXTENT };
    let extent = if extent > MAX_EXTENT {
        log::warn!("terrain extent {extent} lowered to {MAX_EXTENT}");
        MAX_EXTENT
    } else {
        extent
    };
    let step = if step.is_finite() && step >= MIN_STEP {
        step
    } else {
        log::warn!("terrain step {step} raised to {MIN_STEP}");
        MIN_STEP
    };
    let coarsest = 4.0 * extent / (MAX_COLUMNS - 1) as f32;
    if step < coarsest {
        log::warn!("terrain step {step} raised to {coarsest} to stay within {MAX_COLUMNS} columns");
        return (extent, coarsest);
    }
    (extent, step)
}
