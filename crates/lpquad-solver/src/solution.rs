use std::fmt;

use crate::problem::LpProblem;

/// The result of solving an LP problem
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Solution {
    /// Solution status
    pub status: SolutionStatus,
    /// Variable names, in model order
    pub variables: Vec<String>,
    /// Optimal values for each variable
    pub values: Vec<f64>,
    /// Optimal objective value
    pub objective_value: f64,
    /// Simplex pivots performed across both phases
    pub iterations: usize,
    /// Detailed analysis (empty unless optimal)
    pub analysis: Analysis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SolutionStatus {
    /// An optimal solution was found
    Optimal,
    /// No point satisfies every constraint
    Infeasible,
    /// The objective has no finite optimum
    Unbounded,
    /// The solver stopped before reaching a conclusion
    Undefined,
}

impl fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SolutionStatus::Optimal => "Optimal",
            SolutionStatus::Infeasible => "Infeasible",
            SolutionStatus::Unbounded => "Unbounded",
            SolutionStatus::Undefined => "Undefined",
        };
        f.write_str(s)
    }
}

/// Detailed analysis of the optimal solution
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Analysis {
    /// One entry per constraint, in model order
    pub constraints: Vec<ConstraintReport>,

    /// Reduced costs for each variable
    /// For non-basic variables, indicates how much the objective coefficient must change to enter
    pub reduced_costs: Vec<ReducedCost>,

    /// Which constraints are binding (tight) at optimum
    pub binding_constraints: Vec<String>,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ConstraintReport {
    pub constraint: String,
    /// Left-hand side at the optimum
    pub activity: f64,
    pub rhs: f64,
    /// Distance to the bound; zero when tight
    pub slack: f64,
    /// Objective change per unit increase of the RHS
    pub shadow_price: f64,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ReducedCost {
    /// Variable name
    pub variable: String,
    /// Current value in solution
    pub value: f64,
    /// Reduced cost
    pub reduced_cost: f64,
    /// Is this variable in the basis?
    pub is_basic: bool,
}

/// Information about a violated constraint
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ConstraintViolation {
    /// Constraint name
    pub constraint: String,
    /// Required value (from constraint RHS)
    pub required: f64,
    /// Actual value achieved
    pub actual: f64,
    /// How much the constraint is violated by
    pub violation_amount: f64,
}

impl Solution {
    pub(crate) fn without_point(status: SolutionStatus, problem: &LpProblem, iterations: usize) -> Self {
        let objective_value = match status {
            SolutionStatus::Unbounded if problem.is_maximize() => f64::INFINITY,
            SolutionStatus::Unbounded => f64::NEG_INFINITY,
            _ => f64::NAN,
        };
        Self {
            status,
            variables: problem.variables.iter().map(|v| v.name.clone()).collect(),
            values: Vec::new(),
            objective_value,
            iterations,
            analysis: Analysis::default(),
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }

    /// Value of the named variable, if the solver produced a point
    pub fn value_of(&self, name: &str) -> Option<f64> {
        let idx = self.variables.iter().position(|v| v == name)?;
        self.values.get(idx).copied()
    }

    /// Constraints (and non-negativity bounds) the solution violates by more than `tolerance`
    pub fn check(&self, problem: &LpProblem, tolerance: f64) -> Vec<ConstraintViolation> {
        let mut violations = Vec::new();
        if self.values.len() != problem.num_variables() {
            return violations;
        }

        for (var, &value) in problem.variables.iter().zip(&self.values) {
            if value < var.lower_bound - tolerance {
                violations.push(ConstraintViolation {
                    constraint: format!("{} >= {}", var.name, var.lower_bound),
                    required: var.lower_bound,
                    actual: value,
                    violation_amount: var.lower_bound - value,
                });
            }
        }

        for c in &problem.constraints {
            if !c.is_satisfied(&self.values, tolerance) {
                let actual = c.activity(&self.values);
                violations.push(ConstraintViolation {
                    constraint: c.name.clone(),
                    required: c.rhs,
                    actual,
                    violation_amount: (actual - c.rhs).abs(),
                });
            }
        }

        // Sort by violation amount (worst first)
        violations.sort_by(|a, b| b.violation_amount.total_cmp(&a.violation_amount));
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::beverage_model;

    #[test]
    fn test_status_display() {
        assert_eq!(SolutionStatus::Optimal.to_string(), "Optimal");
        assert_eq!(SolutionStatus::Undefined.to_string(), "Undefined");
    }

    #[test]
    fn test_check_reports_worst_first() {
        let problem = beverage_model();
        let mut solution = Solution::without_point(SolutionStatus::Optimal, &problem, 0);
        solution.values = vec![60.0, 26.0];

        let violations = solution.check(&problem, 1e-9);
        let names: Vec<&str> = violations.iter().map(|v| v.constraint.as_str()).collect();
        // water 146 > 100, lemon juice 60 > 30, puree 52 > 40, sugar 60 > 50
        assert_eq!(
            names,
            vec!["Water_Constraint", "LemonJuice_Constraint", "FruitPuree_Constraint", "Sugar_Constraint"]
        );
        assert_eq!(violations[0].violation_amount, 46.0);
    }

    #[test]
    fn test_check_flags_negative_values() {
        let problem = beverage_model();
        let mut solution = Solution::without_point(SolutionStatus::Optimal, &problem, 0);
        solution.values = vec![-1.0, 0.0];

        let violations = solution.check(&problem, 1e-9);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].constraint, "Lemonade_Qty >= 0");
    }

    #[test]
    fn test_value_of() {
        let problem = beverage_model();
        let mut solution = Solution::without_point(SolutionStatus::Optimal, &problem, 0);
        assert_eq!(solution.value_of("Lemonade_Qty"), None);
        solution.values = vec![30.0, 20.0];
        assert_eq!(solution.value_of("FruitJuice_Qty"), Some(20.0));
        assert_eq!(solution.value_of("Water"), None);
    }
}
