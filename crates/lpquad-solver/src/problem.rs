use std::collections::HashSet;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Model {0} has no decision variables")]
    NoVariables(String),
    #[error("Duplicate variable name: {0}")]
    DuplicateVariable(String),
    #[error("Duplicate constraint name: {0}")]
    DuplicateConstraint(String),
    #[error("{name} has {found} coefficients but the model has {expected} variables")]
    DimensionMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("Non-finite value in {0}")]
    NonFinite(String),
}

/// Direction of optimization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Sense {
    Minimize,
    Maximize,
}

/// A non-negative continuous decision variable
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    /// Always 0.0; the tableau encodes `x >= 0` implicitly
    pub lower_bound: f64,
}

/// Represents a linear programming problem.
///
/// [`ModelBuilder::build`] only hands out problems that pass
/// [`LpProblem::validate`]. The fields stay public, so a problem assembled or
/// edited by hand is validated again by [`Solver::solve`](crate::Solver::solve).
#[derive(Debug, Clone)]
pub struct LpProblem {
    pub name: String,
    pub variables: Vec<Variable>,
    pub objective: Objective,
    pub constraints: Vec<Constraint>,
}

#[derive(Debug, Clone)]
pub struct Objective {
    /// Label used in reports
    pub name: String,
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    pub sense: Sense,
}

#[derive(Debug, Clone)]
pub struct Constraint {
    /// Name/label for the constraint (for diagnostics)
    pub name: String,
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Comparison operator
    pub op: ConstraintOp,
    /// Right-hand side value
    pub rhs: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ConstraintOp {
    /// Less than or equal (<=)
    Le,
    /// Greater than or equal (>=)
    Ge,
    /// Equal (=)
    Eq,
}

impl ConstraintOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ConstraintOp::Le => "<=",
            ConstraintOp::Ge => ">=",
            ConstraintOp::Eq => "=",
        }
    }
}

impl Constraint {
    /// Left-hand side evaluated at `values`
    pub fn activity(&self, values: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(values)
            .map(|(coef, value)| coef * value)
            .sum()
    }

    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        let lhs = self.activity(values);
        match self.op {
            ConstraintOp::Le => lhs <= self.rhs + tolerance,
            ConstraintOp::Ge => lhs >= self.rhs - tolerance,
            ConstraintOp::Eq => (lhs - self.rhs).abs() <= tolerance,
        }
    }
}

impl LpProblem {
    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn variable_index(&self, name: &str) -> Option<usize> {
        self.variables.iter().position(|v| v.name == name)
    }

    pub fn is_maximize(&self) -> bool {
        self.objective.sense == Sense::Maximize
    }

    /// Check the shape and values a solve relies on
    pub fn validate(&self) -> Result<(), ModelError> {
        let n = self.variables.len();
        if n == 0 {
            return Err(ModelError::NoVariables(self.name.clone()));
        }

        let mut seen = HashSet::new();
        for v in &self.variables {
            if !seen.insert(v.name.as_str()) {
                return Err(ModelError::DuplicateVariable(v.name.clone()));
            }
        }

        check_row(&self.objective.name, &self.objective.coefficients, n)?;

        let mut seen = HashSet::new();
        for c in &self.constraints {
            if !seen.insert(c.name.as_str()) {
                return Err(ModelError::DuplicateConstraint(c.name.clone()));
            }
            check_row(&c.name, &c.coefficients, n)?;
            if !c.rhs.is_finite() {
                return Err(ModelError::NonFinite(c.name.clone()));
            }
        }
        Ok(())
    }
}

/// Collects variables, an objective and constraint records, then hands out an
/// immutable [`LpProblem`].
#[derive(Debug, Clone)]
pub struct ModelBuilder {
    name: String,
    sense: Sense,
    variables: Vec<String>,
    objective: Option<(String, Vec<f64>)>,
    constraints: Vec<Constraint>,
}

impl ModelBuilder {
    pub fn new(name: impl Into<String>, sense: Sense) -> Self {
        Self {
            name: name.into(),
            sense,
            variables: Vec::new(),
            objective: None,
            constraints: Vec::new(),
        }
    }

    pub fn variable(mut self, name: impl Into<String>) -> Self {
        self.variables.push(name.into());
        self
    }

    pub fn objective(mut self, name: impl Into<String>, coefficients: Vec<f64>) -> Self {
        self.objective = Some((name.into(), coefficients));
        self
    }

    pub fn constraint(
        mut self,
        name: impl Into<String>,
        coefficients: Vec<f64>,
        op: ConstraintOp,
        rhs: f64,
    ) -> Self {
        self.constraints.push(Constraint {
            name: name.into(),
            coefficients,
            op,
            rhs,
        });
        self
    }

    pub fn build(self) -> Result<LpProblem, ModelError> {
        let n = self.variables.len();

        // A missing objective is a feasibility problem: all-zero coefficients
        let (objective_name, coefficients) = self
            .objective
            .unwrap_or_else(|| ("objective".to_string(), vec![0.0; n]));

        let problem = LpProblem {
            name: self.name,
            variables: self
                .variables
                .into_iter()
                .map(|name| Variable { name, lower_bound: 0.0 })
                .collect(),
            objective: Objective {
                name: objective_name,
                coefficients,
                sense: self.sense,
            },
            constraints: self.constraints,
        };
        problem.validate()?;
        Ok(problem)
    }
}

fn check_row(name: &str, coefficients: &[f64], expected: usize) -> Result<(), ModelError> {
    if coefficients.len() != expected {
        return Err(ModelError::DimensionMismatch {
            name: name.to_string(),
            expected,
            found: coefficients.len(),
        });
    }
    if coefficients.iter().any(|c| !c.is_finite()) {
        return Err(ModelError::NonFinite(name.to_string()));
    }
    Ok(())
}

/// Serializable description of a model, as read from a JSON model file
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModelSpec {
    pub name: String,
    pub sense: Sense,
    pub variables: Vec<String>,
    pub objective: ObjectiveSpec,
    #[cfg_attr(feature = "serde", serde(default))]
    pub constraints: Vec<ConstraintSpec>,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectiveSpec {
    pub name: String,
    pub coefficients: Vec<f64>,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConstraintSpec {
    pub name: String,
    pub coefficients: Vec<f64>,
    pub op: ConstraintOp,
    pub rhs: f64,
}

impl ModelSpec {
    pub fn into_problem(self) -> Result<LpProblem, ModelError> {
        let mut builder = ModelBuilder::new(self.name, self.sense)
            .objective(self.objective.name, self.objective.coefficients);
        for v in self.variables {
            builder = builder.variable(v);
        }
        for c in self.constraints {
            builder = builder.constraint(c.name, c.coefficients, c.op, c.rhs);
        }
        builder.build()
    }
}

/// The beverage production model: maximize total drinks made from limited
/// water, sugar, lemon juice and fruit puree.
pub fn beverage_model() -> LpProblem {
    // Every row has two finite coefficients, so build cannot fail
    match ModelBuilder::new("Beverage_Production_Optimization", Sense::Maximize)
        .variable("Lemonade_Qty")
        .variable("FruitJuice_Qty")
        .objective("Total_Products_to_Maximize", vec![1.0, 1.0])
        .constraint("Water_Constraint", vec![2.0, 1.0], ConstraintOp::Le, 100.0)
        .constraint("Sugar_Constraint", vec![1.0, 0.0], ConstraintOp::Le, 50.0)
        .constraint("LemonJuice_Constraint", vec![1.0, 0.0], ConstraintOp::Le, 30.0)
        .constraint("FruitPuree_Constraint", vec![0.0, 2.0], ConstraintOp::Le, 40.0)
        .build()
    {
        Ok(problem) => problem,
        Err(e) => unreachable!("beverage model is well-formed: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_beverage_model_shape() {
        let problem = beverage_model();
        assert_eq!(problem.num_variables(), 2);
        assert_eq!(problem.num_constraints(), 4);
        assert!(problem.is_maximize());
        assert_eq!(problem.variable_index("FruitJuice_Qty"), Some(1));
        assert!(problem.variables.iter().all(|v| v.lower_bound == 0.0));

        let rhs: Vec<f64> = problem.constraints.iter().map(|c| c.rhs).collect();
        assert_eq!(rhs, vec![100.0, 50.0, 30.0, 40.0]);
    }

    #[test]
    fn test_builder_rejects_dimension_mismatch() {
        let err = ModelBuilder::new("bad", Sense::Minimize)
            .variable("x")
            .variable("y")
            .objective("cost", vec![1.0, 1.0])
            .constraint("short", vec![1.0], ConstraintOp::Le, 3.0)
            .build()
            .unwrap_err();

        assert_eq!(
            err,
            ModelError::DimensionMismatch {
                name: "short".to_string(),
                expected: 2,
                found: 1,
            }
        );
    }

    #[test]
    fn test_builder_rejects_duplicates_and_empty() {
        let err = ModelBuilder::new("dup", Sense::Maximize)
            .variable("x")
            .variable("x")
            .build()
            .unwrap_err();
        assert_eq!(err, ModelError::DuplicateVariable("x".to_string()));

        let err = ModelBuilder::new("dup", Sense::Maximize)
            .variable("x")
            .constraint("cap", vec![1.0], ConstraintOp::Le, 1.0)
            .constraint("cap", vec![1.0], ConstraintOp::Le, 2.0)
            .build()
            .unwrap_err();
        assert_eq!(err, ModelError::DuplicateConstraint("cap".to_string()));

        let err = ModelBuilder::new("empty", Sense::Maximize).build().unwrap_err();
        assert_eq!(err, ModelError::NoVariables("empty".to_string()));
    }

    #[test]
    fn test_builder_rejects_non_finite() {
        let err = ModelBuilder::new("nan", Sense::Maximize)
            .variable("x")
            .constraint("cap", vec![1.0], ConstraintOp::Le, f64::INFINITY)
            .build()
            .unwrap_err();
        assert_eq!(err, ModelError::NonFinite("cap".to_string()));
    }

    #[test]
    fn test_validate_catches_hand_edits() {
        let mut problem = beverage_model();
        assert_eq!(problem.validate(), Ok(()));

        problem.objective.coefficients = vec![1.0, 1.0, 1.0];
        assert!(matches!(
            problem.validate(),
            Err(ModelError::DimensionMismatch { expected: 2, found: 3, .. })
        ));

        let mut problem = beverage_model();
        problem.constraints[1].name = problem.constraints[0].name.clone();
        assert!(matches!(problem.validate(), Err(ModelError::DuplicateConstraint(_))));
    }

    #[test]
    fn test_constraint_activity() {
        let problem = beverage_model();
        let water = &problem.constraints[0];
        assert_eq!(water.activity(&[30.0, 20.0]), 80.0);
        assert!(water.is_satisfied(&[30.0, 20.0], 1e-9));
        assert!(!water.is_satisfied(&[50.0, 20.0], 1e-9));
    }
}
