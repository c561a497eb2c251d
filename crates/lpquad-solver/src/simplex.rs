use tracing::{debug, warn};

use crate::problem::{ConstraintOp, LpProblem, Sense};
use crate::solution::{Analysis, ConstraintReport, ReducedCost, Solution, SolutionStatus};

/// Simplex solver for linear programming problems
#[derive(Debug, Clone)]
pub struct Solver {
    /// Maximum pivots per phase before giving up
    max_iterations: usize,
    /// Tolerance for floating point comparisons
    tolerance: f64,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            max_iterations: 10000,
            tolerance: 1e-9,
        }
    }
}

impl Solver {
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

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Solve the LP problem using the two-phase simplex method
    pub fn solve(&self, problem: &LpProblem) -> Solution {
        if let Err(e) = problem.validate() {
            warn!(problem = %problem.name, error = %e, "malformed problem; not solving");
            return Solution::without_point(SolutionStatus::Undefined, problem, 0);
        }

        let mut tableau = Tableau::build(problem);
        debug!(
            problem = %problem.name,
            rows = tableau.data.len(),
            cols = tableau.data[0].len(),
            artificial = tableau.n_artificial,
            "built simplex tableau"
        );

        // Phase 1: Find initial basic feasible solution
        if tableau.n_artificial > 0 {
            match self.phase1(&mut tableau) {
                PhaseOutcome::Optimal => {}
                PhaseOutcome::Unbounded => {
                    // The phase 1 objective is bounded above by zero
                    warn!(problem = %problem.name, "phase 1 reported unbounded");
                    return Solution::without_point(SolutionStatus::Undefined, problem, tableau.iterations);
                }
                PhaseOutcome::IterationLimit => {
                    warn!(problem = %problem.name, limit = self.max_iterations, "phase 1 hit the iteration limit");
                    return Solution::without_point(SolutionStatus::Undefined, problem, tableau.iterations);
                }
            }
            if !self.is_phase1_feasible(&tableau) {
                debug!(problem = %problem.name, "artificial variables remain positive; infeasible");
                return Solution::without_point(SolutionStatus::Infeasible, problem, tableau.iterations);
            }
            self.drive_out_artificials(&mut tableau);
            self.restore_objective(&mut tableau, problem);
        }

        // Phase 2: Optimize
        match self.phase2(&mut tableau) {
            PhaseOutcome::Optimal => {}
            PhaseOutcome::Unbounded => {
                debug!(problem = %problem.name, "no leaving row for an improving column; unbounded");
                return Solution::without_point(SolutionStatus::Unbounded, problem, tableau.iterations);
            }
            PhaseOutcome::IterationLimit => {
                warn!(problem = %problem.name, limit = self.max_iterations, "phase 2 hit the iteration limit");
                return Solution::without_point(SolutionStatus::Undefined, problem, tableau.iterations);
            }
        }

        debug!(problem = %problem.name, pivots = tableau.iterations, "simplex reached optimality");
        self.extract_solution(&tableau, problem)
    }

    fn phase1(&self, tableau: &mut Tableau) -> PhaseOutcome {
        // Auxiliary objective: maximize -sum(artificials)
        let obj_row = tableau.obj_row();
        let n_cols = tableau.n_cols();
        let art_start = tableau.art_start();

        for j in 0..n_cols {
            tableau.data[obj_row][j] = 0.0;
        }
        for j in art_start..(art_start + tableau.n_artificial) {
            tableau.data[obj_row][j] = -1.0;
        }

        // Price out the basic artificials so their reduced costs are zero
        for i in 0..obj_row {
            if tableau.basic_vars[i] >= art_start {
                for j in 0..n_cols {
                    tableau.data[obj_row][j] += tableau.data[i][j];
                }
            }
        }

        self.iterate(tableau, n_cols - 1)
    }

    fn is_phase1_feasible(&self, tableau: &Tableau) -> bool {
        let rhs_col = tableau.n_cols() - 1;
        let art_start = tableau.art_start();
        (0..tableau.obj_row()).all(|i| {
            tableau.basic_vars[i] < art_start || tableau.data[i][rhs_col].abs() <= self.tolerance
        })
    }

    /// Pivot zero-level artificials out of the basis so phase 2 cannot move them
    fn drive_out_artificials(&self, tableau: &mut Tableau) {
        let art_start = tableau.art_start();
        for i in 0..tableau.obj_row() {
            if tableau.basic_vars[i] < art_start {
                continue;
            }
            let entering = (0..art_start).find(|&j| tableau.data[i][j].abs() > self.tolerance);
            if let Some(col) = entering {
                tableau.pivot(i, col);
            }
            // Otherwise the row is redundant and the artificial stays at zero
        }
    }

    fn restore_objective(&self, tableau: &mut Tableau, problem: &LpProblem) {
        let obj_row = tableau.obj_row();
        let n_cols = tableau.n_cols();

        tableau.data[obj_row] = tableau.objective_row(problem);
        for i in 0..obj_row {
            let basic = tableau.basic_vars[i];
            let ratio = tableau.data[obj_row][basic];
            if ratio.abs() > self.tolerance {
                for j in 0..n_cols {
                    tableau.data[obj_row][j] -= ratio * tableau.data[i][j];
                }
            }
        }
    }

    fn phase2(&self, tableau: &mut Tableau) -> PhaseOutcome {
        // Artificial columns never re-enter
        let exclude_from = tableau.art_start();
        self.iterate(tableau, exclude_from)
    }

    fn iterate(&self, tableau: &mut Tableau, exclude_from: usize) -> PhaseOutcome {
        for _ in 0..self.max_iterations {
            let Some(pivot_col) = self.find_pivot_column(tableau, exclude_from) else {
                return PhaseOutcome::Optimal;
            };
            let Some(pivot_row) = self.find_pivot_row(tableau, pivot_col) else {
                return PhaseOutcome::Unbounded;
            };
            tableau.pivot(pivot_row, pivot_col);
        }

        if self.find_pivot_column(tableau, exclude_from).is_none() {
            PhaseOutcome::Optimal
        } else {
            PhaseOutcome::IterationLimit
        }
    }

    fn find_pivot_column(&self, tableau: &Tableau, exclude_from: usize) -> Option<usize> {
        let obj_row = tableau.obj_row();

        // Look for the most positive reduced cost (can improve objective)
        let mut max_val = self.tolerance;
        let mut max_col = None;

        for j in 0..exclude_from {
            if tableau.data[obj_row][j] > max_val {
                max_val = tableau.data[obj_row][j];
                max_col = Some(j);
            }
        }

        max_col
    }

    fn find_pivot_row(&self, tableau: &Tableau, col: usize) -> Option<usize> {
        let rhs_col = tableau.n_cols() - 1;

        let mut min_ratio = f64::INFINITY;
        let mut min_row = None;

        for i in 0..tableau.obj_row() {
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

    fn extract_solution(&self, tableau: &Tableau, problem: &LpProblem) -> Solution {
        let n_vars = problem.num_variables();
        let rhs_col = tableau.n_cols() - 1;

        let mut values = vec![0.0; n_vars];
        for i in 0..tableau.obj_row() {
            let basic = tableau.basic_vars[i];
            if basic < n_vars {
                values[basic] = tableau.data[i][rhs_col];
            }
        }
        // Clamp pivot round-off so reported quantities respect x >= 0
        for v in values.iter_mut() {
            if *v < 0.0 && *v > -self.tolerance {
                *v = 0.0;
            }
        }

        let objective_value = problem
            .objective
            .coefficients
            .iter()
            .zip(&values)
            .map(|(c, v)| c * v)
            .sum();

        let analysis = self.analyze(tableau, problem, &values);

        Solution {
            status: SolutionStatus::Optimal,
            variables: problem.variables.iter().map(|v| v.name.clone()).collect(),
            values,
            objective_value,
            iterations: tableau.iterations,
            analysis,
        }
    }

    fn analyze(&self, tableau: &Tableau, problem: &LpProblem, values: &[f64]) -> Analysis {
        let obj_row = tableau.obj_row();
        // Internal rows always maximize; flip duals back for minimization
        let sense_sign = match problem.objective.sense {
            Sense::Maximize => 1.0,
            Sense::Minimize => -1.0,
        };

        let constraints: Vec<ConstraintReport> = problem
            .constraints
            .iter()
            .zip(&tableau.duals)
            .map(|(c, dual)| {
                let activity = c.activity(values);
                let shadow_price = sense_sign * dual.scale * tableau.data[obj_row][dual.col];
                ConstraintReport {
                    constraint: c.name.clone(),
                    activity,
                    rhs: c.rhs,
                    slack: (c.rhs - activity).abs(),
                    shadow_price: if shadow_price.abs() < self.tolerance { 0.0 } else { shadow_price },
                }
            })
            .collect();

        let reduced_costs = problem
            .variables
            .iter()
            .enumerate()
            .map(|(j, var)| {
                let is_basic = tableau.basic_vars.contains(&j);
                let rc = if is_basic { 0.0 } else { sense_sign * tableau.data[obj_row][j] };
                ReducedCost {
                    variable: var.name.clone(),
                    value: values[j],
                    reduced_cost: rc,
                    is_basic,
                }
            })
            .collect();

        let binding_constraints = constraints
            .iter()
            .filter(|c| c.slack <= self.tolerance.max(1e-9 * c.rhs.abs()))
            .map(|c| c.constraint.clone())
            .collect();

        Analysis {
            constraints,
            reduced_costs,
            binding_constraints,
        }
    }
}

/// Where to read a constraint's dual value from the final objective row
#[derive(Debug, Clone, Copy)]
struct DualColumn {
    col: usize,
    scale: f64,
}

struct Tableau {
    data: Vec<Vec<f64>>,
    basic_vars: Vec<usize>,
    n_vars: usize,
    n_slack: usize,
    n_artificial: usize,
    duals: Vec<DualColumn>,
    iterations: usize,
}

impl Tableau {
    fn build(problem: &LpProblem) -> Self {
        let n_vars = problem.num_variables();
        let n_constraints = problem.num_constraints();

        // Rows with a negative RHS are negated, which swaps <= and >=
        let effective: Vec<(ConstraintOp, f64)> = problem
            .constraints
            .iter()
            .map(|c| {
                if c.rhs < 0.0 {
                    let op = match c.op {
                        ConstraintOp::Le => ConstraintOp::Ge,
                        ConstraintOp::Ge => ConstraintOp::Le,
                        ConstraintOp::Eq => ConstraintOp::Eq,
                    };
                    (op, -1.0)
                } else {
                    (c.op, 1.0)
                }
            })
            .collect();

        let n_slack = effective.iter().filter(|(op, _)| *op != ConstraintOp::Eq).count();
        let n_artificial = effective.iter().filter(|(op, _)| *op != ConstraintOp::Le).count();

        let total_cols = n_vars + n_slack + n_artificial + 1; // +1 for RHS
        let total_rows = n_constraints + 1; // +1 for objective

        let mut tableau = Tableau {
            data: vec![vec![0.0; total_cols]; total_rows],
            basic_vars: vec![0; n_constraints],
            n_vars,
            n_slack,
            n_artificial,
            duals: Vec::with_capacity(n_constraints),
            iterations: 0,
        };

        let mut slack_idx = n_vars;
        let mut artificial_idx = n_vars + n_slack;

        for (i, (c, &(op, flip))) in problem.constraints.iter().zip(&effective).enumerate() {
            for (j, &coef) in c.coefficients.iter().enumerate() {
                tableau.data[i][j] = flip * coef;
            }
            tableau.data[i][total_cols - 1] = flip * c.rhs;

            let dual = match op {
                ConstraintOp::Le => {
                    tableau.data[i][slack_idx] = 1.0;
                    tableau.basic_vars[i] = slack_idx;
                    slack_idx += 1;
                    DualColumn { col: slack_idx - 1, scale: -flip }
                }
                ConstraintOp::Ge => {
                    tableau.data[i][slack_idx] = -1.0; // surplus
                    slack_idx += 1;
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    artificial_idx += 1;
                    DualColumn { col: slack_idx - 1, scale: flip }
                }
                ConstraintOp::Eq => {
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    artificial_idx += 1;
                    DualColumn { col: artificial_idx - 1, scale: -flip }
                }
            };
            tableau.duals.push(dual);
        }

        tableau.data[n_constraints] = tableau.objective_row(problem);
        tableau
    }

    /// Phase 2 objective row: c for maximization, -c for minimization
    fn objective_row(&self, problem: &LpProblem) -> Vec<f64> {
        let mut row = vec![0.0; self.n_cols()];
        let sign = if problem.is_maximize() { 1.0 } else { -1.0 };
        for (j, &coef) in problem.objective.coefficients.iter().enumerate() {
            row[j] = sign * coef;
        }
        row
    }

    fn obj_row(&self) -> usize {
        self.data.len() - 1
    }

    fn n_cols(&self) -> usize {
        self.data[0].len()
    }

    fn art_start(&self) -> usize {
        self.n_vars + self.n_slack
    }

    fn pivot(&mut self, row: usize, col: usize) {
        let n_rows = self.data.len();
        let n_cols = self.n_cols();

        self.basic_vars[row] = col;
        self.iterations += 1;

        let pivot_val = self.data[row][col];
        for j in 0..n_cols {
            self.data[row][j] /= pivot_val;
        }

        for i in 0..n_rows {
            if i != row {
                let factor = self.data[i][col];
                if factor != 0.0 {
                    for j in 0..n_cols {
                        self.data[i][j] -= factor * self.data[row][j];
                    }
                }
            }
        }
    }
}

enum PhaseOutcome {
    Optimal,
    Unbounded,
    IterationLimit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{ModelBuilder, beverage_model};
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_beverage_optimum() {
        let problem = beverage_model();
        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert_abs_diff_eq!(solution.values[0], 30.0, epsilon = 1e-9);
        assert_abs_diff_eq!(solution.values[1], 20.0, epsilon = 1e-9);
        assert_abs_diff_eq!(solution.objective_value, 50.0, epsilon = 1e-9);
        assert!(solution.check(&problem, 1e-9).is_empty());
    }

    #[test]
    fn test_beverage_analysis() {
        let problem = beverage_model();
        let solution = Solver::new().solve(&problem);
        let analysis = &solution.analysis;

        assert_eq!(
            analysis.binding_constraints,
            vec!["LemonJuice_Constraint".to_string(), "FruitPuree_Constraint".to_string()]
        );

        let water = &analysis.constraints[0];
        assert_abs_diff_eq!(water.activity, 80.0, epsilon = 1e-9);
        assert_abs_diff_eq!(water.slack, 20.0, epsilon = 1e-9);
        assert_eq!(water.shadow_price, 0.0);

        // One more unit of lemon juice buys one more lemonade
        assert_abs_diff_eq!(analysis.constraints[2].shadow_price, 1.0, epsilon = 1e-9);
        // Two units of puree per juice
        assert_abs_diff_eq!(analysis.constraints[3].shadow_price, 0.5, epsilon = 1e-9);

        assert!(analysis.reduced_costs.iter().all(|rc| rc.is_basic));
    }

    #[test]
    fn test_simple_maximization() {
        // Maximize: 3x + 2y
        // Subject to:
        //   x + y <= 4
        //   x <= 3
        //   y <= 3
        // Optimal: x=3, y=1, obj=11
        let problem = ModelBuilder::new("max", Sense::Maximize)
            .variable("x")
            .variable("y")
            .objective("profit", vec![3.0, 2.0])
            .constraint("sum", vec![1.0, 1.0], ConstraintOp::Le, 4.0)
            .constraint("x_max", vec![1.0, 0.0], ConstraintOp::Le, 3.0)
            .constraint("y_max", vec![0.0, 1.0], ConstraintOp::Le, 3.0)
            .build()
            .unwrap();

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.values[0] - 3.0).abs() < 1e-6, "x = {} (expected 3)", solution.values[0]);
        assert!((solution.values[1] - 1.0).abs() < 1e-6, "y = {} (expected 1)", solution.values[1]);
        assert!((solution.objective_value - 11.0).abs() < 1e-6, "obj = {} (expected 11)", solution.objective_value);
    }

    #[test]
    fn test_minimization_with_ge() {
        // Minimize: 2x + 3y
        // Subject to:
        //   x + y >= 4
        //   x <= 3
        //   y <= 3
        // Optimal: x=3, y=1, obj=9
        let problem = ModelBuilder::new("min", Sense::Minimize)
            .variable("x")
            .variable("y")
            .objective("cost", vec![2.0, 3.0])
            .constraint("sum", vec![1.0, 1.0], ConstraintOp::Ge, 4.0)
            .constraint("x_max", vec![1.0, 0.0], ConstraintOp::Le, 3.0)
            .constraint("y_max", vec![0.0, 1.0], ConstraintOp::Le, 3.0)
            .build()
            .unwrap();

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert_abs_diff_eq!(solution.values[0], 3.0, epsilon = 1e-6);
        assert_abs_diff_eq!(solution.values[1], 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(solution.objective_value, 9.0, epsilon = 1e-6);

        // Requiring one more unit in total costs one more y
        assert_abs_diff_eq!(solution.analysis.constraints[0].shadow_price, 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_equality_and_negative_rhs() {
        // Maximize x + y with x + y = 5 and -x <= -2 (x >= 2), y <= 1
        let problem = ModelBuilder::new("eq", Sense::Maximize)
            .variable("x")
            .variable("y")
            .objective("total", vec![1.0, 1.0])
            .constraint("total_fixed", vec![1.0, 1.0], ConstraintOp::Eq, 5.0)
            .constraint("x_floor", vec![-1.0, 0.0], ConstraintOp::Le, -2.0)
            .constraint("y_cap", vec![0.0, 1.0], ConstraintOp::Le, 1.0)
            .build()
            .unwrap();

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert_abs_diff_eq!(solution.objective_value, 5.0, epsilon = 1e-9);
        assert!(solution.check(&problem, 1e-9).is_empty());
    }

    #[test]
    fn test_infeasible() {
        // x >= 5
        // x <= 3
        let problem = ModelBuilder::new("infeasible", Sense::Minimize)
            .variable("x")
            .objective("cost", vec![1.0])
            .constraint("lower", vec![1.0], ConstraintOp::Ge, 5.0)
            .constraint("upper", vec![1.0], ConstraintOp::Le, 3.0)
            .build()
            .unwrap();

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Infeasible);
        assert!(solution.values.is_empty());
    }

    #[test]
    fn test_unbounded() {
        // Maximize x subject to x - y <= 1
        let problem = ModelBuilder::new("unbounded", Sense::Maximize)
            .variable("x")
            .variable("y")
            .objective("x", vec![1.0, 0.0])
            .constraint("gap", vec![1.0, -1.0], ConstraintOp::Le, 1.0)
            .build()
            .unwrap();

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Unbounded);
        assert_eq!(solution.objective_value, f64::INFINITY);
    }

    #[test]
    fn test_iteration_limit_is_undefined() {
        // The beverage optimum needs two pivots
        let solution = Solver::new().with_max_iterations(1).solve(&beverage_model());

        assert_eq!(solution.status, SolutionStatus::Undefined);
        assert_eq!(solution.iterations, 1);
    }

    #[test]
    fn test_no_constraints_zero_objective() {
        let problem = ModelBuilder::new("trivial", Sense::Minimize)
            .variable("x")
            .objective("cost", vec![1.0])
            .build()
            .unwrap();

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert_eq!(solution.values, vec![0.0]);
        // Each unit of x would add its full cost
        let rc = &solution.analysis.reduced_costs[0];
        assert!(!rc.is_basic);
        assert_abs_diff_eq!(rc.reduced_cost, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_hand_edited_problem_is_undefined() {
        let mut problem = beverage_model();
        problem.constraints[0].coefficients.push(1.0);

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Undefined);
        assert_eq!(solution.iterations, 0);
        assert!(solution.values.is_empty());
    }
}
