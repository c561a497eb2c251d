mod problem;
mod simplex;
mod solution;

pub use problem::{
    Constraint, ConstraintOp, ConstraintSpec, LpProblem, ModelBuilder, ModelError, ModelSpec, Objective,
    ObjectiveSpec, Sense, Variable, beverage_model,
};
pub use simplex::Solver;
pub use solution::{Analysis, ConstraintReport, ConstraintViolation, ReducedCost, Solution, SolutionStatus};
