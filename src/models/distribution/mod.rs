pub mod model;
pub mod sets_and_parameters;

use log::info;

use crate::config::Config;
use crate::cost::EdgeData;
use crate::network::Network;
use crate::solver::Solver;
use model::{DistributionModel, DistributionResult};
use sets_and_parameters::{Parameters, Sets};

/// Builds the distribution program for `network` and solves it with `solver`.
pub fn plan<S: Solver + ?Sized>(network: &Network, config: &Config, solver: &S) -> DistributionResult {
    let edges = EdgeData::from_connections(network.connections(), &config.rates);
    let (sets, destinations) = Sets::new(network);
    let parameters = Parameters::new(network, &edges, &sets, destinations);

    let result = DistributionModel::solve(&sets, &parameters, solver, config.epsilon);
    info!(
        "Planned distribution: status {}, total cost {:?}",
        result.status, result.objective_value
    );
    result
}
