use crate::matrix::{ProblemMatrix, VARIABLES};

/// Column count after the free-variable split: each of x, y, z becomes
/// a non-negative pair `x = x⁺ - x⁻`.
const SPLIT: usize = VARIABLES * 2;

/// Terminal state of one LP solve.
///
/// All four variants are normal outcomes of the algorithm; none of them is
/// an error. Hard engine failures surface as [`crate::EngineError`] before
/// the simplex ever runs.
#[derive(Debug, Clone, PartialEq)]
pub enum LpOutcome {
    /// An optimal basic solution was found
    Optimal { point: [f64; VARIABLES], value: f64 },
    /// The constraints admit no point at all
    Infeasible,
    /// The objective is unbounded in the optimizing direction
    Unbounded,
    /// The iteration cap was hit before convergence (cycling or numeric noise)
    NumericallyInconsistent,
}

/// Two-phase simplex solver over a [`ProblemMatrix`]
///
/// Decision variables are free; the split into non-negative pairs happens
/// internally, so the caller controls sign restrictions entirely through
/// explicit constraint rows.
pub struct Simplex {
    /// Maximum pivots per phase before giving up
    max_iterations: usize,
    /// Tolerance for floating point comparisons
    tolerance: f64,
}

impl Default for Simplex {
    fn default() -> Self {
        Self {
            max_iterations: 10000,
            tolerance: 1e-9,
        }
    }
}

impl Simplex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    /// Solve the LP held in `matrix` with the two-phase simplex method.
    pub fn solve(&self, matrix: &ProblemMatrix) -> LpOutcome {
        let mut tableau = self.build_tableau(matrix);

        // Phase 1: drive the artificial variables out of the basis
        if tableau.has_artificial {
            match self.phase1(&mut tableau) {
                Phase1Result::Feasible => {}
                Phase1Result::Infeasible => return LpOutcome::Infeasible,
                Phase1Result::IterationLimit => return LpOutcome::NumericallyInconsistent,
            }
        }

        // Phase 2: optimize
        match self.phase2(&mut tableau) {
            SimplexResult::Optimal => {}
            SimplexResult::Unbounded => return LpOutcome::Unbounded,
            SimplexResult::IterationLimit => return LpOutcome::NumericallyInconsistent,
        }

        self.extract(&tableau, matrix)
    }

    fn build_tableau(&self, matrix: &ProblemMatrix) -> Tableau {
        // Normalize every row to a non-negative right-hand side first; the
        // slack/surplus/artificial split depends on the final orientation.
        let mut specs = Vec::with_capacity(matrix.row_count());
        for i in 0..matrix.row_count() {
            let (coefficients, mut rhs, linear) = matrix.constraint(i);

            let mut split = [0.0; SPLIT];
            for (j, &coefficient) in coefficients.iter().enumerate() {
                split[j] = coefficient;
                split[j + VARIABLES] = -coefficient;
            }

            let mut kind = if linear { RowKind::Equality } else { RowKind::Upper };
            if rhs < 0.0 {
                rhs = -rhs;
                for value in &mut split {
                    *value = -*value;
                }
                if kind == RowKind::Upper {
                    kind = RowKind::Lower;
                }
            }
            specs.push((split, rhs, kind));
        }

        let n_slack = specs
            .iter()
            .filter(|(_, _, kind)| *kind != RowKind::Equality)
            .count();
        let n_artificial = specs
            .iter()
            .filter(|(_, _, kind)| *kind != RowKind::Upper)
            .count();

        let n_constraints = specs.len();
        let total_cols = SPLIT + n_slack + n_artificial + 1; // +1 for RHS
        let total_rows = n_constraints + 1; // +1 for objective

        let mut tableau = Tableau {
            data: vec![vec![0.0; total_cols]; total_rows],
            basic_vars: vec![0; n_constraints],
            n_slack,
            n_artificial,
            has_artificial: n_artificial > 0,
        };

        let mut slack_idx = SPLIT;
        let mut artificial_idx = SPLIT + n_slack;

        for (i, (split, rhs, kind)) in specs.iter().enumerate() {
            tableau.data[i][..SPLIT].copy_from_slice(split);
            tableau.data[i][total_cols - 1] = *rhs;

            match kind {
                RowKind::Upper => {
                    tableau.data[i][slack_idx] = 1.0;
                    tableau.basic_vars[i] = slack_idx;
                    slack_idx += 1;
                }
                RowKind::Lower => {
                    tableau.data[i][slack_idx] = -1.0; // surplus
                    slack_idx += 1;
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    artificial_idx += 1;
                }
                RowKind::Equality => {
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    artificial_idx += 1;
                }
            }
        }

        // Objective row (last row). The tableau always maximizes, so
        // minimization negates the coefficients; the true value is
        // recomputed from the extracted point at the end.
        let obj_row = n_constraints;
        let objective = matrix.objective();
        for (j, &coefficient) in objective.iter().enumerate() {
            let c = if matrix.minimize() { -coefficient } else { coefficient };
            tableau.data[obj_row][j] = c;
            tableau.data[obj_row][j + VARIABLES] = -c;
        }

        tableau
    }

    fn phase1(&self, tableau: &mut Tableau) -> Phase1Result {
        // Auxiliary objective: maximize -sum of artificials (= minimize sum)
        let n_constraints = tableau.data.len() - 1;
        let n_cols = tableau.data[0].len();
        let art_start = SPLIT + tableau.n_slack;

        // Save original objective
        let orig_obj = tableau.data[n_constraints].clone();

        for j in 0..n_cols {
            tableau.data[n_constraints][j] = 0.0;
        }
        for j in art_start..(art_start + tableau.n_artificial) {
            tableau.data[n_constraints][j] = -1.0;
        }

        // Make the objective row consistent with the basic artificials
        for i in 0..n_constraints {
            if tableau.basic_vars[i] >= art_start {
                for j in 0..n_cols {
                    tableau.data[n_constraints][j] += tableau.data[i][j];
                }
            }
        }

        let mut converged = false;
        for _ in 0..self.max_iterations {
            let Some(pivot_col) = self.find_pivot_column(tableau, n_cols - 1) else {
                converged = true;
                break;
            };
            let Some(pivot_row) = self.find_pivot_row(tableau, pivot_col) else {
                // Unbounded phase-1 objective cannot happen with a bounded
                // artificial sum; treat it as numeric breakdown.
                return Phase1Result::IterationLimit;
            };
            self.pivot(tableau, pivot_row, pivot_col);
        }
        if !converged {
            return Phase1Result::IterationLimit;
        }

        // Feasible only if every artificial ended at zero
        let rhs_col = n_cols - 1;
        for i in 0..n_constraints {
            if tableau.basic_vars[i] >= art_start
                && tableau.data[i][rhs_col].abs() > self.tolerance
            {
                return Phase1Result::Infeasible;
            }
        }

        // Restore the original objective, re-expressed in the current basis
        tableau.data[n_constraints] = orig_obj;
        for i in 0..n_constraints {
            let basic = tableau.basic_vars[i];
            if tableau.data[n_constraints][basic].abs() > self.tolerance {
                let ratio = tableau.data[n_constraints][basic];
                for j in 0..n_cols {
                    tableau.data[n_constraints][j] -= ratio * tableau.data[i][j];
                }
            }
        }

        Phase1Result::Feasible
    }

    fn phase2(&self, tableau: &mut Tableau) -> SimplexResult {
        // Artificial columns stay out of the basis from here on
        let exclude_from = SPLIT + tableau.n_slack;

        for _ in 0..self.max_iterations {
            let Some(pivot_col) = self.find_pivot_column(tableau, exclude_from) else {
                return SimplexResult::Optimal;
            };
            let Some(pivot_row) = self.find_pivot_row(tableau, pivot_col) else {
                return SimplexResult::Unbounded;
            };
            self.pivot(tableau, pivot_row, pivot_col);
        }
        SimplexResult::IterationLimit
    }

    fn find_pivot_column(&self, tableau: &Tableau, n_cols: usize) -> Option<usize> {
        let obj_row = tableau.data.len() - 1;

        // Most positive reduced cost (can improve the objective)
        let mut max_val = self.tolerance;
        let mut max_col = None;

        for j in 0..n_cols {
            if tableau.data[obj_row][j] > max_val {
                max_val = tableau.data[obj_row][j];
                max_col = Some(j);
            }
        }

        max_col
    }

    fn find_pivot_row(&self, tableau: &Tableau, col: usize) -> Option<usize> {
        let n_constraints = tableau.data.len() - 1;
        let rhs_col = tableau.data[0].len() - 1;

        let mut min_ratio = f64::INFINITY;
        let mut min_row = None;

        for i in 0..n_constraints {
            let val = tableau.data[i][col];
            if val > self.tolerance {
                let ratio = tableau.data[i][rhs_col] / val;
                if ratio >= 0.0 && ratio < min_ratio {
                    min_ratio = ratio;
                    min_row = Some(i);
                }
            }
        }

        min_row
    }

    fn pivot(&self, tableau: &mut Tableau, row: usize, col: usize) {
        let n_rows = tableau.data.len();
        let n_cols = tableau.data[0].len();

        tableau.basic_vars[row] = col;

        let pivot_val = tableau.data[row][col];
        for j in 0..n_cols {
            tableau.data[row][j] /= pivot_val;
        }

        for i in 0..n_rows {
            if i != row {
                let factor = tableau.data[i][col];
                if factor != 0.0 {
                    for j in 0..n_cols {
                        tableau.data[i][j] -= factor * tableau.data[row][j];
                    }
                }
            }
        }
    }

    fn extract(&self, tableau: &Tableau, matrix: &ProblemMatrix) -> LpOutcome {
        let n_constraints = tableau.data.len() - 1;
        let rhs_col = tableau.data[0].len() - 1;

        // Basic split variables carry the solution; x = x⁺ - x⁻
        let mut split = [0.0; SPLIT];
        for i in 0..n_constraints {
            let basic = tableau.basic_vars[i];
            if basic < SPLIT {
                split[basic] = tableau.data[i][rhs_col];
            }
        }

        let mut point = [0.0; VARIABLES];
        for j in 0..VARIABLES {
            point[j] = split[j] - split[j + VARIABLES];
        }

        let objective = matrix.objective();
        let value = objective
            .iter()
            .zip(point.iter())
            .map(|(c, x)| c * x)
            .sum();

        LpOutcome::Optimal { point, value }
    }
}

struct Tableau {
    data: Vec<Vec<f64>>,
    basic_vars: Vec<usize>,
    n_slack: usize,
    n_artificial: usize,
    has_artificial: bool,
}

#[derive(PartialEq, Eq, Clone, Copy)]
enum RowKind {
    /// `a·x <= b` with `b >= 0`; gets a slack variable
    Upper,
    /// `a·x >= b` after RHS normalization; surplus plus artificial
    Lower,
    /// `a·x = b`; artificial only
    Equality,
}

enum SimplexResult {
    Optimal,
    Unbounded,
    IterationLimit,
}

enum Phase1Result {
    Feasible,
    Infeasible,
    IterationLimit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Relation;

    fn matrix(
        constraints: &[([f64; 3], f64, Relation)],
        objective: [f64; 3],
        minimize: bool,
    ) -> ProblemMatrix {
        let mut m = ProblemMatrix::new();
        for &(coefficients, bound, relation) in constraints {
            m.push(coefficients, bound, relation).unwrap();
        }
        m.set_objective(objective, minimize).unwrap();
        m
    }

    #[test]
    fn test_simple_maximization() {
        // Maximize: 3x + 2y
        // Subject to:
        //   x + y <= 4
        //   x <= 3
        //   y <= 3
        //   x, y >= 0
        // Optimal: x=3, y=1, obj=11
        let m = matrix(
            &[
                ([1.0, 1.0, 0.0], 4.0, Relation::Le),
                ([1.0, 0.0, 0.0], 3.0, Relation::Le),
                ([0.0, 1.0, 0.0], 3.0, Relation::Le),
                ([1.0, 0.0, 0.0], 0.0, Relation::Ge),
                ([0.0, 1.0, 0.0], 0.0, Relation::Ge),
            ],
            [3.0, 2.0, 0.0],
            false,
        );

        let LpOutcome::Optimal { point, value } = Simplex::new().solve(&m) else {
            panic!("expected an optimal outcome");
        };
        assert!((point[0] - 3.0).abs() < 1e-6, "x = {} (expected 3)", point[0]);
        assert!((point[1] - 1.0).abs() < 1e-6, "y = {} (expected 1)", point[1]);
        assert!((value - 11.0).abs() < 1e-6, "obj = {} (expected 11)", value);
    }

    #[test]
    fn test_minimization_with_ge() {
        // Minimize: 2x + 3y
        // Subject to:
        //   x + y >= 4
        //   x <= 3
        //   y <= 3
        //   x, y >= 0
        // Optimal: x=3, y=1, obj=9
        let m = matrix(
            &[
                ([1.0, 1.0, 0.0], 4.0, Relation::Ge),
                ([1.0, 0.0, 0.0], 3.0, Relation::Le),
                ([0.0, 1.0, 0.0], 3.0, Relation::Le),
                ([1.0, 0.0, 0.0], 0.0, Relation::Ge),
                ([0.0, 1.0, 0.0], 0.0, Relation::Ge),
            ],
            [2.0, 3.0, 0.0],
            true,
        );

        let LpOutcome::Optimal { point, value } = Simplex::new().solve(&m) else {
            panic!("expected an optimal outcome");
        };
        assert!((point[0] - 3.0).abs() < 1e-6, "x = {} (expected 3)", point[0]);
        assert!((point[1] - 1.0).abs() < 1e-6, "y = {} (expected 1)", point[1]);
        assert!((value - 9.0).abs() < 1e-6, "obj = {} (expected 9)", value);
    }

    #[test]
    fn test_equality_row() {
        // Maximize: 2x + 2y
        // Subject to:
        //   x - 3y = -7
        //   -3x + y >= -7
        //   x, y >= 0
        // Optimal: x=3.5, y=3.5, obj=14
        let m = matrix(
            &[
                ([1.0, -3.0, 0.0], -7.0, Relation::Eq),
                ([-3.0, 1.0, 0.0], -7.0, Relation::Ge),
                ([1.0, 0.0, 0.0], 0.0, Relation::Ge),
                ([0.0, 1.0, 0.0], 0.0, Relation::Ge),
            ],
            [2.0, 2.0, 0.0],
            false,
        );

        let LpOutcome::Optimal { point, value } = Simplex::new().solve(&m) else {
            panic!("expected an optimal outcome");
        };
        assert!((point[0] - 3.5).abs() < 1e-6, "x = {} (expected 3.5)", point[0]);
        assert!((point[1] - 3.5).abs() < 1e-6, "y = {} (expected 3.5)", point[1]);
        assert!((value - 14.0).abs() < 1e-6, "obj = {} (expected 14)", value);
    }

    #[test]
    fn test_free_variable_stays_put() {
        // z is unconstrained and carries no objective weight; the optimum
        // must not wander off in it.
        let m = matrix(
            &[
                ([1.0, 0.0, 0.0], 1.0, Relation::Le),
                ([0.0, 1.0, 0.0], 1.0, Relation::Le),
                ([1.0, 0.0, 0.0], 0.0, Relation::Ge),
                ([0.0, 1.0, 0.0], 0.0, Relation::Ge),
            ],
            [3.0, 4.0, 0.0],
            false,
        );

        let LpOutcome::Optimal { point, value } = Simplex::new().solve(&m) else {
            panic!("expected an optimal outcome");
        };
        assert!((point[0] - 1.0).abs() < 1e-6);
        assert!((point[1] - 1.0).abs() < 1e-6);
        assert!(point[2].abs() < 1e-6, "z = {} (expected 0)", point[2]);
        assert!((value - 7.0).abs() < 1e-6);
    }

    #[test]
    fn test_infeasible() {
        // x >= 7 and x <= 5 cannot both hold
        let m = matrix(
            &[
                ([1.0, 0.0, 0.0], 5.0, Relation::Le),
                ([1.0, 0.0, 0.0], 7.0, Relation::Ge),
            ],
            [1.0, 1.0, 0.0],
            false,
        );

        assert_eq!(Simplex::new().solve(&m), LpOutcome::Infeasible);
    }

    #[test]
    fn test_unbounded() {
        // Maximize x with only a lower bound on it
        let m = matrix(
            &[([1.0, 0.0, 0.0], 0.0, Relation::Ge)],
            [1.0, 0.0, 0.0],
            false,
        );

        assert_eq!(Simplex::new().solve(&m), LpOutcome::Unbounded);
    }

    #[test]
    fn test_zero_objective_is_optimal() {
        // Any feasible point is optimal when the objective is identically zero
        let m = matrix(
            &[
                ([1.0, 0.0, 0.0], 1.0, Relation::Le),
                ([1.0, 0.0, 0.0], 0.0, Relation::Ge),
            ],
            [0.0, 0.0, 0.0],
            false,
        );

        let LpOutcome::Optimal { value, .. } = Simplex::new().solve(&m) else {
            panic!("expected an optimal outcome");
        };
        assert!(value.abs() < 1e-6);
    }
}
