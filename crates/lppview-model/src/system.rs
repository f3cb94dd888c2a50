use std::collections::{BTreeSet, VecDeque};

use lppview_solver::{DoubleDescription, LpOutcome, ProblemMatrix, Simplex};

use crate::error::{ModelError, SolveError};
use crate::events::SystemEvent;
use crate::plane::LimitPlane;
use crate::solution::{Solution, SolveStatus};

/// The editable linear-programming problem: an ordered list of limit planes
/// plus an objective function, with the latest solution attached.
///
/// Plane order is insertion order. The solve itself does not care about it,
/// but editing surfaces list planes by index and expect the order to hold.
///
/// Solving is synchronous and restarts from scratch every time; problems are
/// a handful of planes over three variables, so there is nothing to warm up.
#[derive(Debug, Default)]
pub struct ConstraintSystem {
    planes: Vec<LimitPlane>,
    /// Indices edited into the all-zero degenerate form, kept until the next
    /// inspection point (count or solve) so open edit loops keep their
    /// indices valid.
    pointless: BTreeSet<usize>,
    objective: [f64; 3],
    /// Optimization direction: minimize when set, maximize otherwise
    pub minimize: bool,
    solution: Solution,
    events: VecDeque<SystemEvent>,
}

impl ConstraintSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a plane and return the new plane count.
    ///
    /// A fully degenerate plane (all-zero coefficients and bound) carries no
    /// information and is silently dropped.
    pub fn add_limit_plane(&mut self, plane: impl Into<LimitPlane>) -> usize {
        let plane = plane.into();
        if !plane.is_degenerate() {
            self.planes.push(plane);
            self.events
                .push_back(SystemEvent::PlaneAdded(self.planes.len() - 1));
        }
        self.planes.len()
    }

    /// Overwrite the plane at `index` in place.
    ///
    /// Editing a plane into the degenerate form does not remove it here;
    /// removal is deferred to the next inspection point. Editing it back to
    /// a non-degenerate form before then cancels the pending removal.
    pub fn edit_limit_plane(
        &mut self,
        index: usize,
        plane: impl Into<LimitPlane>,
    ) -> Result<(), ModelError> {
        if index >= self.planes.len() {
            return Err(ModelError::OutOfRange {
                index,
                count: self.planes.len(),
            });
        }
        let plane = plane.into();
        self.planes[index] = plane;
        if plane.is_degenerate() {
            self.pointless.insert(index);
        } else {
            self.pointless.remove(&index);
        }
        self.events.push_back(SystemEvent::PlaneUpdated(index));
        Ok(())
    }

    pub fn get_limit_plane(&self, index: usize) -> Result<LimitPlane, ModelError> {
        self.planes
            .get(index)
            .copied()
            .ok_or(ModelError::OutOfRange {
                index,
                count: self.planes.len(),
            })
    }

    /// Erase the plane at `index`; a no-op when out of range.
    pub fn remove_limit_plane(&mut self, index: usize) {
        if index >= self.planes.len() {
            return;
        }
        self.planes.remove(index);
        // Later pending indices shift down with the erase
        self.pointless = self
            .pointless
            .iter()
            .filter_map(|&pending| match pending.cmp(&index) {
                std::cmp::Ordering::Less => Some(pending),
                std::cmp::Ordering::Equal => None,
                std::cmp::Ordering::Greater => Some(pending - 1),
            })
            .collect();
        self.events.push_back(SystemEvent::PlaneRemoved(index));
    }

    /// Erase the last plane; a no-op when the system is empty.
    pub fn remove_last(&mut self) {
        if let Some(last) = self.planes.len().checked_sub(1) {
            self.remove_limit_plane(last);
        }
    }

    /// Number of live planes. Purges pending degenerate planes first, so the
    /// count never includes rows that are already known to be pointless.
    pub fn equation_count(&mut self) -> usize {
        self.collect_pointless();
        self.planes.len()
    }

    pub fn set_objective(&mut self, coefficients: [f64; 3]) {
        self.objective = coefficients;
    }

    pub fn objective(&self) -> [f64; 3] {
        self.objective
    }

    /// Clear everything back to the empty-system initial state.
    pub fn reset(&mut self) {
        for index in (0..self.planes.len()).rev() {
            self.events.push_back(SystemEvent::PlaneRemoved(index));
        }
        self.planes.clear();
        self.pointless.clear();
        self.objective = [0.0; 3];
        self.minimize = false;
        self.solution = Solution::unsolved();
    }

    /// The latest solution; [`Solution::unsolved`] before the first solve.
    pub fn solution(&self) -> &Solution {
        &self.solution
    }

    /// Drain the queued structural-change events.
    pub fn drain_events(&mut self) -> impl Iterator<Item = SystemEvent> + '_ {
        self.events.drain(..)
    }

    /// Solve the current system from scratch and store the result.
    ///
    /// Infeasible, unbounded and non-converging systems are normal outcomes
    /// and land in the stored solution's status. Only a hard engine failure
    /// returns an error, and then the previously stored solution is left
    /// untouched.
    pub fn solve(&mut self) -> Result<&Solution, SolveError> {
        self.collect_pointless();

        let mut matrix = ProblemMatrix::new();
        for plane in &self.planes {
            matrix.push(plane.coefficients, plane.bound, plane.relation)?;
        }
        matrix.set_objective(self.objective, self.minimize)?;

        let generators = DoubleDescription::new().enumerate(&matrix)?;

        let mut next = match Simplex::new().solve(&matrix) {
            LpOutcome::Optimal { point, value } => Solution {
                status: SolveStatus::Optimal,
                minimized: self.minimize,
                optimal_value: value,
                optimal_point: point,
                vertices: Vec::new(),
                adjacency: Vec::new(),
            },
            LpOutcome::Infeasible => Solution::infeasible(self.minimize),
            LpOutcome::Unbounded => Solution::unbounded(self.minimize),
            LpOutcome::NumericallyInconsistent => Solution {
                status: SolveStatus::NumericallyInconsistent,
                minimized: self.minimize,
                ..Solution::unsolved()
            },
        };
        next.vertices = generators.vertices;
        next.adjacency = generators.adjacency;

        self.solution = next;
        self.events.push_back(SystemEvent::SolutionSolved);
        Ok(&self.solution)
    }

    /// Remove every plane marked pending, highest index first so the
    /// remaining pending indices stay valid while we erase.
    fn collect_pointless(&mut self) {
        while let Some(index) = self.pointless.iter().next_back().copied() {
            self.remove_limit_plane(index);
        }
    }
}
