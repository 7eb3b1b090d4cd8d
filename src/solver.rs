//! The boundary to the numeric solver. A `Solver` takes a finished `Program` and reports
//! a status together with the value of every variable.

use derive_more::Display;
use good_lp::{
    constraint, default_solver, variable, Expression, ProblemVariables, ResolutionError,
    Solution, SolverModel,
};
use log::{debug, info, warn};
use serde::Serialize;
use typed_index_collections::TiVec;

use crate::models::program::{LinExpr, Program, Sense, VarIndex};

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    Optimal,
    Infeasible,
    Unbounded,
    #[display(fmt = "Not Solved")]
    NotSolved,
}

#[derive(Debug, Clone)]
pub struct Outcome {
    pub status: Status,
    /// The value of every program variable. Empty unless optimal.
    pub values: TiVec<VarIndex, f64>,
    /// The objective evaluated at `values`. Only present when optimal.
    pub objective_value: Option<f64>,
}

impl Outcome {
    /// An outcome without an assignment
    pub fn terminal(status: Status) -> Outcome {
        Outcome {
            status,
            values: TiVec::new(),
            objective_value: None,
        }
    }

    pub fn optimal(program: &Program, values: TiVec<VarIndex, f64>) -> Outcome {
        let objective_value = Some(program.objective().eval(&values));
        Outcome {
            status: Status::Optimal,
            values,
            objective_value,
        }
    }
}

pub trait Solver {
    /// Solves `program`. Failures are reported through the status, never retried.
    fn solve(&self, program: &Program) -> Outcome;
}

/// Pure Rust simplex with branch and bound for the integer variables
#[derive(Debug, Clone, Copy, Default)]
pub struct MicroLp;

impl Solver for MicroLp {
    fn solve(&self, program: &Program) -> Outcome {
        info!(
            "Solving {} with {} variables and {} constraints",
            program.name(),
            program.variables().len(),
            program.constraints().len()
        );

        let mut vars = ProblemVariables::new();
        let handles: TiVec<VarIndex, good_lp::Variable> = program
            .variables()
            .iter()
            .map(|v| {
                let mut def = variable().min(v.lower);
                if v.upper.is_finite() {
                    def = def.max(v.upper);
                }
                if v.integer {
                    def = def.integer();
                }
                vars.add(def)
            })
            .collect();

        let expression = |expr: &LinExpr| -> Expression {
            expr.terms()
                .iter()
                .map(|(v, c)| *c * handles[*v])
                .sum::<Expression>()
        };

        let mut model = vars
            .minimise(expression(program.objective()))
            .using(default_solver);

        for c in program.constraints() {
            let lhs = expression(&c.lhs);
            let rhs = c.rhs;
            let constr = match c.sense {
                Sense::Le => constraint!(lhs <= rhs),
                Sense::Ge => constraint!(lhs >= rhs),
                Sense::Eq => constraint!(lhs == rhs),
            };
            model.add_constraint(constr);
        }

        match model.solve() {
            Ok(solution) => {
                let values = handles.iter().map(|v| solution.value(*v)).collect();
                Outcome::optimal(program, values)
            }
            Err(ResolutionError::Infeasible) => {
                debug!("{} is infeasible", program.name());
                Outcome::terminal(Status::Infeasible)
            }
            Err(ResolutionError::Unbounded) => {
                debug!("{} is unbounded", program.name());
                Outcome::terminal(Status::Unbounded)
            }
            Err(err) => {
                warn!("Solver failed on {}: {}", program.name(), err);
                Outcome::terminal(Status::NotSolved)
            }
        }
    }
}
