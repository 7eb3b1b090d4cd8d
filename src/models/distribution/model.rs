use std::collections::HashMap;

use derive_more::Constructor;
use itertools::iproduct;
use log::{debug, info, warn};
use serde::Serialize;

use super::sets_and_parameters::{DestinationIndex, Parameters, Sets};
use crate::models::program::{LinExpr, Program, Sense, Stage, VarIndex, VarKey};
use crate::models::utils::{AddVars, ConvertVars};
use crate::network::{RefineryIndex, TankIndex};
use crate::solver::{Outcome, Solver, Status};

#[derive(Constructor)]
pub struct Variables {
    /// flow from refinery r to tank t
    pub x: HashMap<(RefineryIndex, TankIndex), VarIndex>,
    /// flow from tank t to destination k
    pub y: HashMap<(TankIndex, DestinationIndex), VarIndex>,
}

pub struct DistributionModel {}

#[allow(non_snake_case)]
impl DistributionModel {
    /// builds the two-stage distribution program
    pub fn build(sets: &Sets, parameters: &Parameters) -> (Program, Variables) {
        info!(
            "Building distribution model with {} refineries, {} tanks, {} destinations and {} demands",
            sets.R.len(),
            sets.T.len(),
            sets.K.len(),
            sets.D.len()
        );

        let mut program = Program::new("fuel_delivery_optimization");

        let R = &sets.R;
        let T = &sets.T;
        let K = &sets.K;

        //*************CREATE VARIABLES*************//

        // quantity shipped from refinery r to tank t, for every pair whether connected or not
        let x = iproduct!(R.iter().copied(), T.iter().copied()).int_vars(&mut program, |(r, t)| {
            VarKey::new(
                Stage::RefineryToTank,
                &parameters.refinery_id[*r],
                &parameters.tank_id[*t],
            )
        });

        // quantity shipped from tank t to destination k
        let y = iproduct!(T.iter().copied(), K.iter().copied()).int_vars(&mut program, |(t, k)| {
            VarKey::new(
                Stage::TankToCustomer,
                &parameters.tank_id[*t],
                &parameters.destination_id[*k],
            )
        });

        let inflow = |t: TankIndex| LinExpr::sum(R.iter().map(|r| &x[&(*r, t)]));
        let outflow = |t: TankIndex| LinExpr::sum(K.iter().map(|k| &y[&(t, *k)]));
        let shipped = |r: RefineryIndex| LinExpr::sum(T.iter().map(|t| &x[&(r, *t)]));

        // ******************** ADD CONSTRAINTS ********************

        // every demand is met by the total delivery to its customer, one constraint per demand
        for d in &sets.D {
            let k = sets.K_d[*d];
            let lhs = LinExpr::sum(T.iter().map(|t| &y[&(*t, k)]));
            program.add_constr(
                format!(
                    "demand_fulfillment_{}_{}",
                    parameters.destination_id[k], parameters.demand_id[*d]
                ),
                lhs,
                Sense::Ge,
                parameters.Q[*d],
            );
        }

        for t in T {
            // what enters a tank leaves it
            program.add_constr(
                format!("flow_balance_{}", parameters.tank_id[*t]),
                inflow(*t).minus(&outflow(*t)),
                Sense::Eq,
                0.0,
            );

            // tank throughput
            program.add_constr(
                format!("tank_capacity_{}", parameters.tank_id[*t]),
                outflow(*t),
                Sense::Le,
                parameters.S_tank[*t],
            );
        }

        // both refinery bounds are kept, even when one implies the other
        for r in R {
            program.add_constr(
                format!("max_output_{}", parameters.refinery_id[*r]),
                shipped(*r),
                Sense::Le,
                parameters.O[*r],
            );

            program.add_constr(
                format!("refinery_capacity_{}", parameters.refinery_id[*r]),
                shipped(*r),
                Sense::Le,
                parameters.S_refinery[*r],
            );
        }

        // per-edge capacity, only where a connection exists
        for (r, t) in iproduct!(R, T) {
            if let Some(cap) = parameters.U_rt.get(&(*r, *t)) {
                program.add_constr(
                    format!(
                        "edge_capacity_refinery_tank_{}_{}",
                        parameters.refinery_id[*r], parameters.tank_id[*t]
                    ),
                    LinExpr::sum([&x[&(*r, *t)]]),
                    Sense::Le,
                    *cap,
                );
            }
        }

        for (t, k) in iproduct!(T, K) {
            if let Some(cap) = parameters.U_tk.get(&(*t, *k)) {
                program.add_constr(
                    format!(
                        "edge_capacity_tank_customer_{}_{}",
                        parameters.tank_id[*t], parameters.destination_id[*k]
                    ),
                    LinExpr::sum([&y[&(*t, *k)]]),
                    Sense::Le,
                    *cap,
                );
            }
        }

        // SET OBJECTIVE

        // transport cost over both stages. Pairs without a cost entry ship for free.
        let stage_one = iproduct!(R, T)
            .filter_map(|(r, t)| Some((x[&(*r, *t)], *parameters.C_rt.get(&(*r, *t))?)));
        let stage_two = iproduct!(T, K)
            .filter_map(|(t, k)| Some((y[&(*t, *k)], *parameters.C_tk.get(&(*t, *k))?)));
        program.set_objective(stage_one.chain(stage_two).collect());

        info!(
            "Successfully built distribution model: {} variables, {} constraints, {} objective terms",
            program.variables().len(),
            program.constraints().len(),
            program.objective().terms().len()
        );

        (program, Variables::new(x, y))
    }

    pub fn solve<S: Solver + ?Sized>(
        sets: &Sets,
        parameters: &Parameters,
        solver: &S,
        tolerance: f64,
    ) -> DistributionResult {
        let (program, vars) = DistributionModel::build(sets, parameters);

        let outcome = solver.solve(&program);
        info!("Solver finished with status {}", outcome.status);

        if outcome.status == Status::Optimal {
            let violated = program.violations(&outcome.values, tolerance);
            if !violated.is_empty() {
                warn!("Solution violates {} constraints: {:?}", violated.len(), violated);
            }
        }

        DistributionResult::new(&program, &vars, outcome)
    }
}

/// A single solved flow
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Flow {
    pub key: VarKey,
    pub value: f64,
}

#[derive(Debug, Clone)]
pub struct DistributionResult {
    pub status: Status,
    /// Total transport cost, only for optimal outcomes
    pub objective_value: Option<f64>,
    /// flow from refinery r to tank t. Empty unless optimal.
    pub x: HashMap<(RefineryIndex, TankIndex), f64>,
    /// flow from tank t to destination k. Empty unless optimal.
    pub y: HashMap<(TankIndex, DestinationIndex), f64>,
    /// every decision variable with its value, in creation order. Empty unless optimal.
    pub flows: Vec<Flow>,
}

impl DistributionResult {
    pub fn new(program: &Program, variables: &Variables, outcome: Outcome) -> DistributionResult {
        if outcome.status != Status::Optimal {
            debug!("No assignment for status {}", outcome.status);
            return DistributionResult {
                status: outcome.status,
                objective_value: None,
                x: HashMap::new(),
                y: HashMap::new(),
                flows: Vec::new(),
            };
        }

        let x = variables.x.convert(&outcome.values);
        let y = variables.y.convert(&outcome.values);
        let flows = program
            .variables()
            .iter_enumerated()
            .map(|(i, v)| Flow {
                key: v.key.clone(),
                value: outcome.values[i],
            })
            .collect();

        DistributionResult {
            status: outcome.status,
            objective_value: outcome.objective_value,
            x,
            y,
            flows,
        }
    }

    /// Flows strictly above `epsilon`
    pub fn positive_flows(&self, epsilon: f64) -> impl Iterator<Item = &Flow> {
        self.flows.iter().filter(move |f| f.value > epsilon)
    }

    /// Total flow into tank `t` from all refineries
    pub fn inflow(&self, t: TankIndex) -> f64 {
        self.x
            .iter()
            .filter(|((_, tank), _)| *tank == t)
            .map(|(_, v)| v)
            .sum()
    }

    /// Total flow out of tank `t` to all destinations
    pub fn outflow(&self, t: TankIndex) -> f64 {
        self.y
            .iter()
            .filter(|((tank, _), _)| *tank == t)
            .map(|(_, v)| v)
            .sum()
    }

    /// Total flow out of refinery `r`
    pub fn shipped(&self, r: RefineryIndex) -> f64 {
        self.x
            .iter()
            .filter(|((refinery, _), _)| *refinery == r)
            .map(|(_, v)| v)
            .sum()
    }

    /// Total flow delivered to destination `k`
    pub fn delivered(&self, k: DestinationIndex) -> f64 {
        self.y
            .iter()
            .filter(|((_, dest), _)| *dest == k)
            .map(|(_, v)| v)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::{CostRates, EdgeData};
    use crate::network::{
        Connection, ConnectionType, Customer, Demand, DemandIndex, Network, Refinery, Tank,
        Validation,
    };
    use crate::solver::MicroLp;

    const EPS: f64 = 1e-6;

    fn single_route(tank_capacity: f64) -> Network {
        Network::new(
            vec![Refinery::new("R1", 100.0, 100.0, 3.0, 1.5)],
            vec![Tank::new("T1", tank_capacity)],
            vec![Customer::new("C1")],
            vec![Demand::new("D1", "C1", 30.0)],
            vec![
                Connection::new("R1", "T1", 10.0, ConnectionType::Pipeline, 100.0),
                Connection::new("T1", "C1", 5.0, ConnectionType::Truck, 100.0),
            ],
        )
        .unwrap()
    }

    fn model(network: &Network) -> (Sets, Parameters) {
        let edges = EdgeData::from_connections(network.connections(), &CostRates::default());
        let (sets, ids) = Sets::new(network);
        let parameters = Parameters::new(network, &edges, &sets, ids);
        (sets, parameters)
    }

    fn solve(network: &Network) -> (Sets, DistributionResult) {
        let (sets, parameters) = model(network);
        let result = DistributionModel::solve(&sets, &parameters, &MicroLp, EPS);
        (sets, result)
    }

    fn names(program: &Program) -> Vec<&str> {
        program.constraints().iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn single_route_is_optimal() {
        let (_, result) = solve(&single_route(50.0));
        assert_eq!(result.status, Status::Optimal);

        let t = TankIndex::from(0);
        assert!((result.inflow(t) - 30.0).abs() < EPS);
        assert!((result.outflow(t) - 30.0).abs() < EPS);
        assert!((result.objective_value.unwrap() - 78.0).abs() < EPS);

        let positive: Vec<String> = result
            .positive_flows(EPS)
            .map(|f| f.key.to_string())
            .collect();
        assert_eq!(
            positive,
            vec![
                "x_refinery_to_tank_R1_T1".to_string(),
                "x_tank_to_customer_T1_C1".to_string()
            ]
        );
    }

    #[test]
    fn tank_too_small_is_infeasible() {
        let (_, result) = solve(&single_route(10.0));
        assert_eq!(result.status, Status::Infeasible);
        assert_eq!(result.objective_value, None);
        assert!(result.flows.is_empty());
    }

    #[test]
    fn customer_without_capacity_is_infeasible() {
        let network = Network::new(
            vec![Refinery::new("R1", 100.0, 100.0, 0.0, 0.0)],
            vec![Tank::new("T1", 50.0), Tank::new("T2", 50.0)],
            vec![Customer::new("C1")],
            vec![Demand::new("D1", "C1", 30.0)],
            vec![
                Connection::new("R1", "T1", 10.0, ConnectionType::Pipeline, 100.0),
                Connection::new("R1", "T2", 10.0, ConnectionType::Pipeline, 100.0),
                Connection::new("T1", "C1", 5.0, ConnectionType::Truck, 0.0),
                Connection::new("T2", "C1", 5.0, ConnectionType::Truck, 0.0),
            ],
        )
        .unwrap();
        let (_, result) = solve(&network);
        assert_eq!(result.status, Status::Infeasible);
    }

    #[test]
    fn full_cross_product_of_variables() {
        let network = Network::new(
            vec![
                Refinery::new("R1", 100.0, 100.0, 0.0, 0.0),
                Refinery::new("R2", 100.0, 100.0, 0.0, 0.0),
            ],
            vec![Tank::new("T1", 50.0), Tank::new("T2", 50.0), Tank::new("T3", 50.0)],
            vec![Customer::new("C1"), Customer::new("C2"), Customer::new("C3")],
            vec![
                Demand::new("D1", "C1", 10.0),
                Demand::new("D2", "C2", 10.0),
                Demand::new("D3", "C1", 5.0),
            ],
            vec![Connection::new("R1", "T1", 1.0, ConnectionType::Pipeline, 5.0)],
        )
        .unwrap();
        let (sets, parameters) = model(&network);
        let (program, vars) = DistributionModel::build(&sets, &parameters);

        // 2 x 3 stage-1 plus 3 tanks x 2 demand customers; C3 has no demand
        assert_eq!(vars.x.len(), 6);
        assert_eq!(vars.y.len(), 6);
        assert_eq!(program.variables().len(), 12);
        assert!(program.variables().iter().all(|v| v.integer && v.lower == 0.0));

        // 3 demands + 2 per tank + 2 per refinery + 1 edge
        assert_eq!(program.constraints().len(), 3 + 6 + 4 + 1);
        let names = names(&program);
        assert!(names.contains(&"demand_fulfillment_C1_D1"));
        assert!(names.contains(&"demand_fulfillment_C1_D3"));
        assert!(names.contains(&"flow_balance_T2"));
        assert!(names.contains(&"tank_capacity_T3"));
        assert!(names.contains(&"max_output_R2"));
        assert!(names.contains(&"refinery_capacity_R2"));
        assert!(names.contains(&"edge_capacity_refinery_tank_R1_T1"));
    }

    #[test]
    fn constraint_shapes() {
        let (sets, parameters) = model(&single_route(50.0));
        let (program, vars) = DistributionModel::build(&sets, &parameters);
        let (r, t, k) = (
            RefineryIndex::from(0),
            TankIndex::from(0),
            DestinationIndex::from(0),
        );
        let (x, y) = (vars.x[&(r, t)], vars.y[&(t, k)]);

        let balance = program.constraint("flow_balance_T1").unwrap();
        assert_eq!(balance.sense, Sense::Eq);
        assert_eq!(balance.lhs.coefficient(x), 1.0);
        assert_eq!(balance.lhs.coefficient(y), -1.0);
        assert_eq!(balance.rhs, 0.0);

        let demand = program.constraint("demand_fulfillment_C1_D1").unwrap();
        assert_eq!(demand.sense, Sense::Ge);
        assert_eq!(demand.rhs, 30.0);

        let edge = program.constraint("edge_capacity_tank_customer_T1_C1").unwrap();
        assert_eq!(edge.sense, Sense::Le);
        assert_eq!(edge.rhs, 100.0);

        assert!((program.objective().coefficient(x) - 0.5).abs() < EPS);
        assert!((program.objective().coefficient(y) - 2.1).abs() < EPS);
    }

    #[test]
    fn each_demand_record_is_met_on_its_own() {
        // two demands of the same customer are not summed
        let network = Network::new(
            vec![Refinery::new("R1", 100.0, 100.0, 0.0, 0.0)],
            vec![Tank::new("T1", 100.0)],
            vec![Customer::new("C1")],
            vec![Demand::new("D1", "C1", 30.0), Demand::new("D2", "C1", 20.0)],
            vec![
                Connection::new("R1", "T1", 10.0, ConnectionType::Pipeline, 100.0),
                Connection::new("T1", "C1", 5.0, ConnectionType::Truck, 100.0),
            ],
        )
        .unwrap();
        let (sets, result) = solve(&network);
        assert_eq!(result.status, Status::Optimal);

        let delivered = result.delivered(sets.K_d[DemandIndex::from(0)]);
        assert!((delivered - 30.0).abs() < EPS);
    }

    #[test]
    fn unrecognized_type_ships_for_free() {
        let network = Network::new(
            vec![Refinery::new("R1", 100.0, 100.0, 0.0, 0.0)],
            vec![Tank::new("T1", 50.0)],
            vec![Customer::new("C1")],
            vec![Demand::new("D1", "C1", 30.0)],
            vec![
                Connection::new("R1", "T1", 10.0, ConnectionType::Other("RAIL".into()), 100.0),
                Connection::new("T1", "C1", 5.0, ConnectionType::Truck, 100.0),
            ],
        )
        .unwrap();
        let (sets, parameters) = model(&network);
        let (program, vars) = DistributionModel::build(&sets, &parameters);
        let x = vars.x[&(RefineryIndex::from(0), TankIndex::from(0))];
        assert_eq!(program.objective().coefficient(x), 0.0);
        assert!(program.constraint("edge_capacity_refinery_tank_R1_T1").is_some());

        let result = DistributionModel::solve(&sets, &parameters, &MicroLp, EPS);
        assert_eq!(result.status, Status::Optimal);
        assert!((result.objective_value.unwrap() - 63.0).abs() < EPS);
    }

    #[test]
    fn cheaper_tank_is_preferred_within_bounds() {
        let network = Network::new(
            vec![
                Refinery::new("R1", 100.0, 25.0, 0.0, 0.0),
                Refinery::new("R2", 25.0, 100.0, 0.0, 0.0),
            ],
            vec![Tank::new("T1", 40.0), Tank::new("T2", 100.0)],
            vec![Customer::new("C1"), Customer::new("C2")],
            vec![Demand::new("D1", "C1", 30.0), Demand::new("D2", "C2", 10.0)],
            vec![
                Connection::new("R1", "T1", 10.0, ConnectionType::Pipeline, 20.0),
                Connection::new("R1", "T2", 10.0, ConnectionType::Pipeline, 100.0),
                Connection::new("R2", "T1", 20.0, ConnectionType::Pipeline, 100.0),
                Connection::new("R2", "T2", 20.0, ConnectionType::Pipeline, 100.0),
                Connection::new("T1", "C1", 1.0, ConnectionType::Truck, 100.0),
                Connection::new("T1", "C2", 1.0, ConnectionType::Truck, 100.0),
                Connection::new("T2", "C1", 10.0, ConnectionType::Truck, 100.0),
                Connection::new("T2", "C2", 10.0, ConnectionType::Truck, 100.0),
            ],
        )
        .unwrap();
        let (sets, parameters) = model(&network);
        let result = DistributionModel::solve(&sets, &parameters, &MicroLp, EPS);
        assert_eq!(result.status, Status::Optimal);

        for t in &sets.T {
            assert!((result.inflow(*t) - result.outflow(*t)).abs() < EPS);
            assert!(result.outflow(*t) <= parameters.S_tank[*t] + EPS);
        }
        for r in &sets.R {
            assert!(result.shipped(*r) <= parameters.O[*r] + EPS);
            assert!(result.shipped(*r) <= parameters.S_refinery[*r] + EPS);
        }
        for (pair, cap) in &parameters.U_rt {
            assert!(result.x[pair] <= cap + EPS);
        }
        for (pair, cap) in &parameters.U_tk {
            assert!(result.y[pair] <= cap + EPS);
        }
        for d in &sets.D {
            assert!(result.delivered(sets.K_d[*d]) >= parameters.Q[*d] - EPS);
        }
        assert!(result.flows.iter().all(|f| f.value >= -EPS));

        // all 40 units go through the cheap tank T1, at most 20 of them from R1
        let t1 = TankIndex::from(0);
        assert!((result.outflow(t1) - 40.0).abs() < EPS);
        assert!((result.x[&(RefineryIndex::from(0), t1)] - 20.0).abs() < EPS);
    }

    #[test]
    fn unknown_customer_is_unbounded_when_lenient() {
        // C9 is not a listed customer, so its connection does not bound the flow
        let network = Network::with_validation(
            vec![Refinery::new("R1", 100.0, 100.0, 0.0, 0.0)],
            vec![Tank::new("T1", 50.0)],
            vec![],
            vec![Demand::new("D1", "C9", 30.0)],
            vec![Connection::new("T1", "C9", 5.0, ConnectionType::Truck, 10.0)],
            Validation::Lenient,
        )
        .unwrap();
        let (sets, parameters) = model(&network);
        let (program, vars) = DistributionModel::build(&sets, &parameters);
        assert!(program.constraint("demand_fulfillment_C9_D1").is_some());
        assert!(program.constraint("edge_capacity_tank_customer_T1_C9").is_none());

        // the truck cost still applies
        let y = vars.y[&(TankIndex::from(0), DestinationIndex::from(0))];
        assert!((program.objective().coefficient(y) - 2.1).abs() < EPS);

        let result = DistributionModel::solve(&sets, &parameters, &MicroLp, EPS);
        assert_eq!(result.status, Status::Optimal);
        assert!((result.delivered(DestinationIndex::from(0)) - 30.0).abs() < EPS);
        assert!((result.objective_value.unwrap() - 63.0).abs() < EPS);
    }
}
