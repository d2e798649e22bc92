use crate::errors::EngineError;
use crate::geometry::{Point, Region};

/// Rasterized occupancy grid for one region.
///
/// The polygon's bounding box is translated to the origin and scaled by the
/// reciprocal cell size; each cell holds whether its sample point lies on or
/// inside the boundary (even-odd rule, boundary counts as inside).
#[derive(Debug, Clone)]
pub struct RegionMask {
    cells: Vec<bool>,
    rows: usize,
    cols: usize,
    origin: Point,
    cell_size: f64,
}

impl RegionMask {
    /// Rasterize `region` at the given cell size.
    ///
    /// Fails with [`EngineError::InvalidRegion`] for fewer than 3 vertices,
    /// a non-positive cell size, or non-finite coordinates.
    pub fn build(region: &Region, cell_size: f64) -> Result<Self, EngineError> {
        let verts = region.vertices();
        if verts.len() < 3 {
            return Err(EngineError::InvalidRegion("fewer than 3 vertices"));
        }
        if !(cell_size > 0.0) || !cell_size.is_finite() {
            return Err(EngineError::InvalidRegion("cell size must be positive"));
        }
        if verts.iter().any(|v| !v.x.is_finite() || !v.y.is_finite()) {
            return Err(EngineError::InvalidRegion("non-finite vertex"));
        }

        let mut min = verts[0];
        let mut max = verts[0];
        for v in verts {
            min.x = min.x.min(v.x);
            min.y = min.y.min(v.y);
            max.x = max.x.max(v.x);
            max.y = max.y.max(v.y);
        }

        let cols = ((max.x - min.x) / cell_size).round() as usize + 1;
        let rows = ((max.y - min.y) / cell_size).round() as usize + 1;

        let mut cells = vec![false; rows * cols];
        for r in 0..rows {
            for c in 0..cols {
                let p = Point::new(
                    min.x + c as f64 * cell_size,
                    min.y + r as f64 * cell_size,
                );
                cells[r * cols + c] = contains(verts, p);
            }
        }

        Ok(Self {
            cells,
            rows,
            cols,
            origin: min,
            cell_size,
        })
    }

    /// Whether the segment from `p0` to `p1` crosses any occupied cell;
    /// pass `p0 == p1` for a single-point test.
    ///
    /// The sample count is `max(|Δrow|, |Δcol|, 1)` between the endpoint
    /// grid indices, so a pointer that jumps several cells between two
    /// frames cannot step over a thin region. Samples falling outside the
    /// grid are misses, never errors.
    pub fn test(&self, p0: Point, p1: Point) -> bool {
        let (r0, c0) = self.grid_index(p0);
        let (r1, c1) = self.grid_index(p1);
        let steps = (r1 - r0).abs().max((c1 - c0).abs()).max(1);

        for k in 0..steps {
            let t = if steps == 1 {
                1.0
            } else {
                k as f64 / (steps - 1) as f64
            };
            let sample = Point::new(p0.x + (p1.x - p0.x) * t, p0.y + (p1.y - p0.y) * t);
            if self.occupied(sample) {
                return true;
            }
        }
        false
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    fn grid_index(&self, p: Point) -> (i64, i64) {
        let r = ((p.y - self.origin.y) / self.cell_size).round();
        let c = ((p.x - self.origin.x) / self.cell_size).round();
        (r as i64, c as i64)
    }

    fn occupied(&self, p: Point) -> bool {
        let (r, c) = self.grid_index(p);
        if r < 0 || c < 0 || r >= self.rows as i64 || c >= self.cols as i64 {
            return false;
        }
        self.cells[r as usize * self.cols + c as usize]
    }
}

/// Even-odd point-in-polygon test with an inclusive boundary.
fn contains(verts: &[Point], p: Point) -> bool {
    let mut inside = false;
    let mut j = verts.len() - 1;
    for i in 0..verts.len() {
        let a = verts[i];
        let b = verts[j];
        if on_segment(a, b, p) {
            return true;
        }
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

fn on_segment(a: Point, b: Point, p: Point) -> bool {
    const EPS: f64 = 1e-12;
    let cross = (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x);
    if cross.abs() > EPS {
        return false;
    }
    let dot = (p.x - a.x) * (b.x - a.x) + (p.y - a.y) * (b.y - a.y);
    let len2 = (b.x - a.x) * (b.x - a.x) + (b.y - a.y) * (b.y - a.y);
    (-EPS..=len2 + EPS).contains(&dot)
}
