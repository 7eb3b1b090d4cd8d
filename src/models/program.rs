//! A solver-independent linear program: named variables, named linear constraints
//! and a linear objective to be minimised.

use std::fmt::Display;

use derive_more::{Deref, From, Into};
use log::trace;
use serde::Serialize;
use typed_index_collections::TiVec;

#[derive(Deref, Debug, PartialEq, Eq, PartialOrd, Ord, From, Into, Clone, Copy, Hash)]
pub struct VarIndex(usize);

/// Which leg of the network a flow variable belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Stage {
    RefineryToTank,
    TankToCustomer,
}

impl Stage {
    fn prefix(&self) -> &'static str {
        match self {
            Stage::RefineryToTank => "x_refinery_to_tank",
            Stage::TankToCustomer => "x_tank_to_customer",
        }
    }
}

/// Identifies a decision variable by its endpoints and stage
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct VarKey {
    pub stage: Stage,
    pub from: String,
    pub to: String,
}

impl VarKey {
    pub fn new(stage: Stage, from: impl Into<String>, to: impl Into<String>) -> Self {
        VarKey {
            stage,
            from: from.into(),
            to: to.into(),
        }
    }
}

impl Display for VarKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}_{}", self.stage.prefix(), self.from, self.to)
    }
}

#[derive(Debug, Clone)]
pub struct Variable {
    pub key: VarKey,
    pub lower: f64,
    pub upper: f64,
    pub integer: bool,
}

/// A sum of coefficient * variable terms
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinExpr {
    terms: Vec<(VarIndex, f64)>,
}

impl LinExpr {
    pub fn new() -> Self {
        LinExpr::default()
    }

    /// The sum of the given variables, each with coefficient one
    pub fn sum<'a>(vars: impl IntoIterator<Item = &'a VarIndex>) -> Self {
        vars.into_iter().map(|v| (*v, 1.0)).collect()
    }

    pub fn add(&mut self, var: VarIndex, coefficient: f64) {
        self.terms.push((var, coefficient));
    }

    /// `self - other`
    pub fn minus(mut self, other: &LinExpr) -> Self {
        self.terms
            .extend(other.terms.iter().map(|(v, c)| (*v, -*c)));
        self
    }

    pub fn terms(&self) -> &[(VarIndex, f64)] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Coefficient of `var`, summed over repeated terms
    pub fn coefficient(&self, var: VarIndex) -> f64 {
        self.terms
            .iter()
            .filter(|(v, _)| *v == var)
            .map(|(_, c)| c)
            .sum()
    }

    pub fn eval(&self, values: &TiVec<VarIndex, f64>) -> f64 {
        self.terms.iter().map(|(v, c)| c * values[*v]).sum()
    }
}

impl FromIterator<(VarIndex, f64)> for LinExpr {
    fn from_iter<T: IntoIterator<Item = (VarIndex, f64)>>(iter: T) -> Self {
        LinExpr {
            terms: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Le,
    Ge,
    Eq,
}

impl Display for Sense {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sense::Le => write!(f, "<="),
            Sense::Ge => write!(f, ">="),
            Sense::Eq => write!(f, "=="),
        }
    }
}

/// `lhs <sense> rhs`
#[derive(Debug, Clone)]
pub struct Constraint {
    pub name: String,
    pub lhs: LinExpr,
    pub sense: Sense,
    pub rhs: f64,
}

impl Constraint {
    pub fn is_satisfied(&self, values: &TiVec<VarIndex, f64>, tolerance: f64) -> bool {
        let lhs = self.lhs.eval(values);
        match self.sense {
            Sense::Le => lhs <= self.rhs + tolerance,
            Sense::Ge => lhs >= self.rhs - tolerance,
            Sense::Eq => (lhs - self.rhs).abs() <= tolerance,
        }
    }
}

/// A minimisation problem
#[derive(Debug, Clone)]
pub struct Program {
    name: String,
    variables: TiVec<VarIndex, Variable>,
    constraints: Vec<Constraint>,
    objective: LinExpr,
}

impl Program {
    pub fn new(name: impl Into<String>) -> Self {
        Program {
            name: name.into(),
            variables: TiVec::new(),
            constraints: Vec::new(),
            objective: LinExpr::new(),
        }
    }

    /// Adds a non-negative integer variable
    pub fn add_int_var(&mut self, key: VarKey) -> VarIndex {
        self.variables.push_and_get_key(Variable {
            key,
            lower: 0.0,
            upper: f64::INFINITY,
            integer: true,
        })
    }

    pub fn add_constr(&mut self, name: impl Into<String>, lhs: LinExpr, sense: Sense, rhs: f64) {
        let constraint = Constraint {
            name: name.into(),
            lhs,
            sense,
            rhs,
        };
        trace!(
            "{}: {} terms {} {}",
            constraint.name,
            constraint.lhs.terms().len(),
            constraint.sense,
            constraint.rhs
        );
        self.constraints.push(constraint);
    }

    pub fn set_objective(&mut self, objective: LinExpr) {
        self.objective = objective;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn variables(&self) -> &TiVec<VarIndex, Variable> {
        &self.variables
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn constraint(&self, name: &str) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.name == name)
    }

    pub fn objective(&self) -> &LinExpr {
        &self.objective
    }

    /// Names of the constraints and variable bounds broken by `values`
    pub fn violations(&self, values: &TiVec<VarIndex, f64>, tolerance: f64) -> Vec<String> {
        let bounds = self
            .variables
            .iter_enumerated()
            .filter(|(i, v)| {
                let x = values[*i];
                x < v.lower - tolerance || x > v.upper + tolerance
            })
            .map(|(_, v)| format!("bounds_{}", v.key));

        let constraints = self
            .constraints
            .iter()
            .filter(|c| !c.is_satisfied(values, tolerance))
            .map(|c| c.name.clone());

        bounds.chain(constraints).collect()
    }
}
