//! Solver-neutral integer linear programs.
//!
//! An [`IntegerProgram`] holds bounded integer variables, linear constraints
//! and a linear objective to minimise. Backends translate it into their own
//! model; the program itself can evaluate and verify any assignment, which is
//! how backend results are checked before they are trusted.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Absolute tolerance used when checking bounds, integrality and constraints.
pub const FEASIBILITY_TOLERANCE: f64 = 1e-6;

/// Index of a variable within its program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VarId(pub usize);

impl VarId {
    /// Position of the variable in the program.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A bounded integer variable.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IntVar {
    pub name: String,
    pub lower: f64,
    pub upper: f64,
}

/// A linear expression `sum(coef * var) + constant`.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinearExpr {
    pub terms: Vec<(VarId, f64)>,
    pub constant: f64,
}

impl LinearExpr {
    /// Creates an empty expression.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `coef * var`; zero coefficients are skipped.
    pub fn add_term(&mut self, var: VarId, coef: f64) {
        if coef != 0.0 {
            self.terms.push((var, coef));
        }
    }

    /// Builder form of [`add_term`](Self::add_term).
    pub fn with_term(mut self, var: VarId, coef: f64) -> Self {
        self.add_term(var, coef);
        self
    }

    /// Evaluates the expression at `values`.
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(var, coef)| coef * values.get(var.index()).copied().unwrap_or(0.0))
            .sum::<f64>()
            + self.constant
    }

    /// Returns true if no variable appears in the expression.
    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Relation between a constraint's expression and its right-hand side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Sense {
    /// `expr <= rhs`
    Le,
    /// `expr >= rhs`
    Ge,
    /// `expr == rhs`
    Eq,
}

impl std::fmt::Display for Sense {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Le => write!(f, "<="),
            Self::Ge => write!(f, ">="),
            Self::Eq => write!(f, "=="),
        }
    }
}

/// A named linear constraint.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinearConstraint {
    pub name: String,
    pub expr: LinearExpr,
    pub sense: Sense,
    pub rhs: f64,
}

impl LinearConstraint {
    /// Returns true if `values` satisfy the constraint within `tolerance`.
    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        let lhs = self.expr.evaluate(values);
        match self.sense {
            Sense::Le => lhs <= self.rhs + tolerance,
            Sense::Ge => lhs >= self.rhs - tolerance,
            Sense::Eq => (lhs - self.rhs).abs() <= tolerance,
        }
    }
}

/// An integer program: minimise `objective` subject to `constraints`.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IntegerProgram {
    pub vars: Vec<IntVar>,
    pub constraints: Vec<LinearConstraint>,
    pub objective: LinearExpr,
}

impl IntegerProgram {
    /// Creates an empty program.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an integer variable bounded to `[lower, upper]`.
    pub fn add_var(&mut self, name: impl Into<String>, lower: f64, upper: f64) -> VarId {
        let id = VarId(self.vars.len());
        self.vars.push(IntVar {
            name: name.into(),
            lower,
            upper: upper.max(lower),
        });
        id
    }

    /// Adds a constraint.
    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        expr: LinearExpr,
        sense: Sense,
        rhs: f64,
    ) {
        self.constraints.push(LinearConstraint {
            name: name.into(),
            expr,
            sense,
            rhs,
        });
    }

    /// Sets the objective to minimise.
    pub fn set_objective(&mut self, objective: LinearExpr) {
        self.objective = objective;
    }

    /// Number of variables.
    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    /// Number of constraints.
    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Objective value at `values`.
    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective.evaluate(values)
    }

    /// Rounds every value to the nearest integer.
    pub fn round(values: &[f64]) -> Vec<f64> {
        values.iter().map(|v| v.round()).collect()
    }

    /// Describes everything `values` violate; empty means feasible.
    pub fn violations(&self, values: &[f64]) -> Vec<String> {
        let mut found = Vec::new();
        if values.len() != self.vars.len() {
            found.push(format!(
                "expected {} values, got {}",
                self.vars.len(),
                values.len()
            ));
            return found;
        }

        for (var, &value) in self.vars.iter().zip(values) {
            if !value.is_finite() || (value - value.round()).abs() > FEASIBILITY_TOLERANCE {
                found.push(format!("{} = {} is not integral", var.name, value));
            } else if value < var.lower - FEASIBILITY_TOLERANCE
                || value > var.upper + FEASIBILITY_TOLERANCE
            {
                found.push(format!(
                    "{} = {} outside [{}, {}]",
                    var.name, value, var.lower, var.upper
                ));
            }
        }

        for constraint in &self.constraints {
            if !constraint.is_satisfied(values, FEASIBILITY_TOLERANCE) {
                found.push(format!(
                    "{}: {} {} {} violated",
                    constraint.name,
                    constraint.expr.evaluate(values),
                    constraint.sense,
                    constraint.rhs
                ));
            }
        }
        found
    }

    /// Returns true if `values` is a feasible assignment.
    pub fn is_feasible(&self, values: &[f64]) -> bool {
        self.violations(values).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn knapsack() -> (IntegerProgram, VarId, VarId) {
        let mut program = IntegerProgram::new();
        let x = program.add_var("x", 0.0, 5.0);
        let y = program.add_var("y", 0.0, 5.0);
        program.add_constraint(
            "capacity",
            LinearExpr::new().with_term(x, 2.0).with_term(y, 3.0),
            Sense::Le,
            12.0,
        );
        program.add_constraint(
            "cover",
            LinearExpr::new().with_term(x, 1.0).with_term(y, 1.0),
            Sense::Ge,
            4.0,
        );
        program.set_objective(LinearExpr::new().with_term(x, 1.0).with_term(y, 2.0));
        (program, x, y)
    }

    #[test]
    fn test_counts() {
        let (program, _, _) = knapsack();
        assert_eq!(program.num_vars(), 2);
        assert_eq!(program.num_constraints(), 2);
    }

    #[test]
    fn test_feasible_assignment() {
        let (program, _, _) = knapsack();
        assert!(program.is_feasible(&[4.0, 0.0]));
        assert!(program.is_feasible(&[3.0, 2.0]));
        assert_eq!(program.objective_value(&[3.0, 2.0]), 7.0);
    }

    #[test]
    fn test_violations_reported() {
        let (program, _, _) = knapsack();
        // capacity: 2*5 + 3*1 = 13 > 12
        let violations = program.violations(&[5.0, 1.0]);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].starts_with("capacity"));

        assert!(!program.is_feasible(&[1.5, 3.0]));
        assert!(!program.is_feasible(&[6.0, 0.0]));
        assert!(!program.is_feasible(&[1.0]));
        assert!(!program.is_feasible(&[f64::NAN, 4.0]));
    }

    #[test]
    fn test_equality_tolerance() {
        let mut program = IntegerProgram::new();
        let x = program.add_var("x", 0.0, 10.0);
        program.add_constraint("eq", LinearExpr::new().with_term(x, 1.0), Sense::Eq, 3.0);
        assert!(program.is_feasible(&[3.0]));
        assert!(!program.is_feasible(&[4.0]));
    }

    #[test]
    fn test_rounding_and_zero_terms() {
        assert_eq!(
            IntegerProgram::round(&[0.9999999, 2.0000001, -0.0]),
            vec![1.0, 2.0, 0.0]
        );

        let expr = LinearExpr::new().with_term(VarId(0), 0.0);
        assert!(expr.is_constant());
    }

    #[test]
    fn test_upper_clamped_to_lower() {
        let mut program = IntegerProgram::new();
        program.add_var("x", 2.0, 1.0);
        assert_eq!(program.vars[0].upper, 2.0);
    }
}
