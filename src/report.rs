use std::fmt::Display;

use serde::Serialize;

use crate::models::distribution::model::{DistributionResult, Flow};
use crate::solver::Status;

/// What is shown to the user after a run: the status, the positive flows and the total cost.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub status: Status,
    pub flows: Vec<Flow>,
    pub total_cost: Option<f64>,
}

impl Report {
    pub fn new(result: &DistributionResult, epsilon: f64) -> Report {
        Report {
            status: result.status,
            flows: result.positive_flows(epsilon).cloned().collect(),
            total_cost: result.objective_value,
        }
    }

    pub fn json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Status: {}", self.status)?;
        for flow in &self.flows {
            writeln!(f, "{} = {}", flow.key, flow.value)?;
        }
        match self.total_cost {
            Some(cost) => write!(f, "Total Cost = {}", cost),
            None => write!(f, "Total Cost = -"),
        }
    }
}
