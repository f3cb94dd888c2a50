//! Double-description vertex enumeration.
//!
//! Converts the H-representation held in a [`ProblemMatrix`] into the
//! V-representation of the feasible polyhedron: the true vertices plus the
//! edge adjacency between them. The polyhedron is homogenized into a cone in
//! R^4 (`y = (y0, x, y, z)`, each row `r · y >= 0`, with the implicit
//! `y0 >= 0` row appended), halfspaces are inserted one at a time, and the
//! extreme-ray set is maintained throughout. Rays that survive with a
//! positive leading coordinate are vertices; rays with a zero leading
//! coordinate point to infinity and are skipped.

use crate::error::EngineError;
use crate::matrix::ProblemMatrix;

/// Homogeneous dimension: leading coordinate plus x, y, z.
const DIM: usize = 4;

/// Zero-set masks are u128 bitfields, one bit per homogenized row.
const MAX_ROWS: usize = 128;

/// V-representation of the feasible region, restricted to true vertices.
#[derive(Debug, Clone, Default)]
pub struct Generators {
    /// Extreme points of the feasible polyhedron.
    pub vertices: Vec<[f64; 3]>,
    /// For each vertex, the indices of the vertices sharing an edge with it.
    pub adjacency: Vec<Vec<usize>>,
    /// Count of extreme rays pointing to infinity (unbounded directions).
    pub rays: usize,
}

/// One extreme ray of the homogenized cone.
#[derive(Debug, Clone)]
struct Ray {
    coords: [f64; DIM],
    /// Bit i set when homogenized row i is tight at this ray.
    zero_set: u128,
}

/// Double-description enumerator over the homogenized cone.
pub struct DoubleDescription {
    tolerance: f64,
}

impl Default for DoubleDescription {
    fn default() -> Self {
        Self { tolerance: 1e-9 }
    }
}

impl DoubleDescription {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    /// Enumerate the vertices of the feasible region and their adjacency.
    pub fn enumerate(&self, matrix: &ProblemMatrix) -> Result<Generators, EngineError> {
        let rows = self.homogenize(matrix)?;

        let (mut rays, mut processed, seeded) = self.initial_rays(&rows)?;

        for (index, row) in rows.iter().enumerate() {
            if seeded & bit(index) != 0 {
                continue;
            }
            self.insert_halfspace(&rows, &mut rays, &mut processed, index, row);
            if rays.is_empty() {
                break;
            }
        }

        Ok(self.extract(&rays))
    }

    /// Homogenized row list: constraint rows (equality rows entered twice
    /// with opposite signs), the `y0 >= 0` row, and a pinned lineality space
    /// so the cone is pointed and extreme rays exist.
    fn homogenize(&self, matrix: &ProblemMatrix) -> Result<Vec<[f64; DIM]>, EngineError> {
        let mut rows: Vec<[f64; DIM]> = Vec::with_capacity(matrix.row_count() * 2 + DIM);
        for (i, row) in matrix.rows().iter().enumerate() {
            rows.push(normalized(*row));
            if matrix.is_linearity(i) {
                rows.push(normalized(negated(*row)));
            }
        }
        rows.push([1.0, 0.0, 0.0, 0.0]);

        // Directions no row constrains would make the cone non-pointed; pin
        // each of them to zero so every surviving ray is extreme. Vertices
        // reported for such a polyhedron are representatives within the
        // pinned subspace, which is also what cddlib produces.
        for direction in kernel(&rows, self.tolerance) {
            rows.push(direction);
            rows.push(negated(direction));
        }

        if rows.len() > MAX_ROWS {
            return Err(EngineError::TooManyRows(rows.len()));
        }
        Ok(rows)
    }

    /// Seed the ray set from a full-rank subset of rows: the simplicial cone
    /// cut by those four rows alone has the columns of their inverse as its
    /// extreme rays.
    fn initial_rays(&self, rows: &[[f64; DIM]]) -> Result<(Vec<Ray>, u128, u128), EngineError> {
        let mut chosen: Vec<usize> = Vec::with_capacity(DIM);
        let mut basis: Vec<[f64; DIM]> = Vec::with_capacity(DIM);
        for (index, row) in rows.iter().enumerate() {
            basis.push(*row);
            if rank(&basis, self.tolerance) == basis.len() {
                chosen.push(index);
                if chosen.len() == DIM {
                    break;
                }
            } else {
                basis.pop();
            }
        }
        if chosen.len() < DIM {
            return Err(EngineError::SingularBasis);
        }

        let inverse = invert(&basis, self.tolerance).ok_or(EngineError::SingularBasis)?;

        let mut seeded = 0u128;
        for &index in &chosen {
            seeded |= bit(index);
        }

        let mut rays = Vec::with_capacity(DIM);
        for j in 0..DIM {
            let mut coords = [0.0; DIM];
            for i in 0..DIM {
                coords[i] = inverse[i][j];
            }
            // Tight on every seed row except its own
            let zero_set = seeded & !bit(chosen[j]);
            rays.push(Ray {
                coords: normalized(coords),
                zero_set,
            });
        }

        Ok((rays, seeded, seeded))
    }

    /// One DD step: cut the current cone with `row`.
    fn insert_halfspace(
        &self,
        rows: &[[f64; DIM]],
        rays: &mut Vec<Ray>,
        processed: &mut u128,
        index: usize,
        row: &[f64; DIM],
    ) {
        let values: Vec<f64> = rays.iter().map(|ray| dot(row, &ray.coords)).collect();

        let mut positive = Vec::new();
        let mut negative = Vec::new();
        for (i, &value) in values.iter().enumerate() {
            if value > self.tolerance {
                positive.push(i);
            } else if value < -self.tolerance {
                negative.push(i);
            } else {
                rays[i].zero_set |= bit(index);
            }
        }
        *processed |= bit(index);

        if negative.is_empty() {
            return;
        }

        let mut next: Vec<Ray> = Vec::new();
        for (i, ray) in rays.iter().enumerate() {
            if values[i] >= -self.tolerance {
                next.push(ray.clone());
            }
        }

        // Every adjacent (+,-) pair meets the new hyperplane in a fresh ray
        for &p in &positive {
            for &n in &negative {
                if !self.adjacent(rays, p, n) {
                    continue;
                }
                let mut coords = [0.0; DIM];
                for k in 0..DIM {
                    coords[k] = values[p] * rays[n].coords[k] - values[n] * rays[p].coords[k];
                }
                // Cancellation noise must not get scaled up into a fake ray
                if coords.iter().all(|c| c.abs() <= self.tolerance) {
                    continue;
                }
                let coords = normalized(coords);
                // Recompute the zero set by evaluation; the combinatorial
                // estimate misses incidental tightness on degenerate input
                let mut zero_set = 0u128;
                for (r, processed_row) in rows.iter().enumerate() {
                    if *processed & bit(r) != 0 && dot(processed_row, &coords).abs() <= self.tolerance
                    {
                        zero_set |= bit(r);
                    }
                }
                next.push(Ray { coords, zero_set });
            }
        }

        *rays = next;
    }

    /// Combinatorial adjacency test: the common zero set must be large
    /// enough to span an edge and must not be dominated by any third ray.
    fn adjacent(&self, rays: &[Ray], p: usize, n: usize) -> bool {
        let common = rays[p].zero_set & rays[n].zero_set;
        if (common.count_ones() as usize) < DIM - 2 {
            return false;
        }
        !rays
            .iter()
            .enumerate()
            .any(|(k, ray)| k != p && k != n && common & !ray.zero_set == 0)
    }

    /// Split the final rays into vertices and directions at infinity, and
    /// derive the per-vertex neighbor lists.
    fn extract(&self, rays: &[Ray]) -> Generators {
        let mut vertex_rays: Vec<&Ray> = Vec::new();
        let mut ray_count = 0usize;
        for ray in rays {
            if ray.coords[0] > self.tolerance {
                vertex_rays.push(ray);
            } else {
                ray_count += 1;
            }
        }

        let vertices: Vec<[f64; 3]> = vertex_rays
            .iter()
            .map(|ray| {
                let w = ray.coords[0];
                [ray.coords[1] / w, ray.coords[2] / w, ray.coords[3] / w]
            })
            .collect();

        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); vertices.len()];
        for i in 0..vertex_rays.len() {
            for j in (i + 1)..vertex_rays.len() {
                let common = vertex_rays[i].zero_set & vertex_rays[j].zero_set;
                if (common.count_ones() as usize) < DIM - 2 {
                    continue;
                }
                let dominated = rays.iter().any(|ray| {
                    !std::ptr::eq(ray, vertex_rays[i])
                        && !std::ptr::eq(ray, vertex_rays[j])
                        && common & !ray.zero_set == 0
                });
                if !dominated {
                    adjacency[i].push(j);
                    adjacency[j].push(i);
                }
            }
        }

        // A neighbor list spanning the entire vertex set is a degeneracy
        // artifact, not topology; clear it. Heuristic carried over from the
        // cddlib-based predecessor of this engine.
        let count = vertices.len();
        for list in &mut adjacency {
            if count > 0 && list.len() >= count {
                list.clear();
            }
        }

        Generators {
            vertices,
            adjacency,
            rays: ray_count,
        }
    }
}

fn bit(index: usize) -> u128 {
    1u128 << index
}

fn dot(a: &[f64; DIM], b: &[f64; DIM]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

fn negated(row: [f64; DIM]) -> [f64; DIM] {
    let mut out = row;
    for value in &mut out {
        *value = -*value;
    }
    out
}

/// Scale so the largest magnitude entry is 1; keeps the epsilon comparisons
/// meaningful as rays are combined over and over.
fn normalized(row: [f64; DIM]) -> [f64; DIM] {
    let max = row.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
    if max == 0.0 {
        return row;
    }
    let mut out = row;
    for value in &mut out {
        *value /= max;
    }
    out
}

/// Rank of a small row set via Gaussian elimination.
fn rank(rows: &[[f64; DIM]], tol: f64) -> usize {
    let mut work: Vec<[f64; DIM]> = rows.to_vec();
    let mut r = 0;
    for col in 0..DIM {
        if r >= work.len() {
            break;
        }
        let mut best = r;
        for i in r..work.len() {
            if work[i][col].abs() > work[best][col].abs() {
                best = i;
            }
        }
        if work[best][col].abs() <= tol {
            continue;
        }
        work.swap(r, best);
        for i in 0..work.len() {
            if i != r && work[i][col].abs() > 0.0 {
                let factor = work[i][col] / work[r][col];
                for c in 0..DIM {
                    work[i][c] -= factor * work[r][c];
                }
            }
        }
        r += 1;
    }
    r
}

/// Basis of the nullspace of `rows`, via reduced row echelon form.
fn kernel(rows: &[[f64; DIM]], tol: f64) -> Vec<[f64; DIM]> {
    let mut work: Vec<[f64; DIM]> = rows.to_vec();
    let mut pivot_cols: Vec<usize> = Vec::new();
    let mut r = 0;
    for col in 0..DIM {
        if r >= work.len() {
            break;
        }
        let mut best = r;
        for i in r..work.len() {
            if work[i][col].abs() > work[best][col].abs() {
                best = i;
            }
        }
        if work[best][col].abs() <= tol {
            continue;
        }
        work.swap(r, best);
        let pivot = work[r][col];
        for c in 0..DIM {
            work[r][c] /= pivot;
        }
        for i in 0..work.len() {
            if i != r && work[i][col] != 0.0 {
                let factor = work[i][col];
                for c in 0..DIM {
                    work[i][c] -= factor * work[r][c];
                }
            }
        }
        pivot_cols.push(col);
        r += 1;
    }

    let mut basis = Vec::new();
    for col in 0..DIM {
        if pivot_cols.contains(&col) {
            continue;
        }
        let mut vector = [0.0; DIM];
        vector[col] = 1.0;
        for (row, &pivot_col) in pivot_cols.iter().enumerate() {
            vector[pivot_col] = -work[row][col];
        }
        basis.push(vector);
    }
    basis
}

/// Invert a DIM x DIM matrix given as rows; `None` when singular.
fn invert(rows: &[[f64; DIM]], tol: f64) -> Option<Vec<[f64; DIM]>> {
    let mut work: Vec<[f64; DIM]> = rows.to_vec();
    let mut inverse: Vec<[f64; DIM]> = (0..DIM)
        .map(|i| {
            let mut row = [0.0; DIM];
            row[i] = 1.0;
            row
        })
        .collect();

    for col in 0..DIM {
        let mut best = col;
        for i in col..DIM {
            if work[i][col].abs() > work[best][col].abs() {
                best = i;
            }
        }
        if work[best][col].abs() <= tol {
            return None;
        }
        work.swap(col, best);
        inverse.swap(col, best);

        let pivot = work[col][col];
        for c in 0..DIM {
            work[col][c] /= pivot;
            inverse[col][c] /= pivot;
        }
        for i in 0..DIM {
            if i != col {
                let factor = work[i][col];
                if factor != 0.0 {
                    for c in 0..DIM {
                        work[i][c] -= factor * work[col][c];
                        inverse[i][c] -= factor * inverse[col][c];
                    }
                }
            }
        }
    }
    Some(inverse)
}
