use std::collections::HashMap;

use log::{debug, warn};

use crate::network::{Connection, ConnectionType, Cost, Distance, Quantity};

/// Cost per unit of fuel per unit of distance for each connection type
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostRates {
    pub pipeline: Cost,
    pub truck: Cost,
}

impl Default for CostRates {
    fn default() -> Self {
        CostRates {
            pipeline: 0.05,
            truck: 0.42,
        }
    }
}

impl CostRates {
    /// The rate of a connection type. Unrecognized types have no rate.
    pub fn rate(&self, kind: &ConnectionType) -> Option<Cost> {
        match kind {
            ConnectionType::Pipeline => Some(self.pipeline),
            ConnectionType::Truck => Some(self.truck),
            ConnectionType::Other(_) => None,
        }
    }
}

/// Cost of moving one unit of fuel `distance` over a connection of type `kind`.
pub fn transport_cost(distance: Distance, kind: &ConnectionType, rates: &CostRates) -> Option<Cost> {
    rates.rate(kind).map(|rate| distance * rate)
}

/// Per-edge transport cost and max capacity, keyed on (from, to).
///
/// A pair missing from the cost map contributes nothing to the objective, while a
/// pair present in the capacity map is still bounded.
#[derive(Debug, Clone, Default)]
pub struct EdgeData {
    cost: HashMap<String, HashMap<String, Cost>>,
    max_capacity: HashMap<String, HashMap<String, Quantity>>,
}

impl EdgeData {
    pub fn from_connections(connections: &[Connection], rates: &CostRates) -> EdgeData {
        let mut edges = EdgeData::default();

        for connection in connections {
            let (from, to) = (connection.from_id(), connection.to_id());

            let previous = edges
                .max_capacity
                .entry(from.to_string())
                .or_default()
                .insert(to.to_string(), connection.max_capacity());
            if previous.is_some() {
                warn!("Duplicate connection {from} -> {to}, keeping the last record");
            }

            match transport_cost(connection.distance(), connection.connection_type(), rates) {
                Some(cost) => {
                    edges
                        .cost
                        .entry(from.to_string())
                        .or_default()
                        .insert(to.to_string(), cost);
                }
                None => {
                    debug!(
                        "Connection {from} -> {to} has unrecognized type {:?}, it carries no cost",
                        connection.connection_type()
                    );
                    // last write wins for the cost too
                    if let Some(costs) = edges.cost.get_mut(from) {
                        costs.remove(to);
                    }
                }
            }
        }

        edges
    }

    /// Transport cost per unit from `from` to `to`, if the pair has one
    pub fn cost(&self, from: &str, to: &str) -> Option<Cost> {
        self.cost.get(from)?.get(to).copied()
    }

    /// Upper bound on the flow from `from` to `to`, if a connection exists
    pub fn max_capacity(&self, from: &str, to: &str) -> Option<Quantity> {
        self.max_capacity.get(from)?.get(to).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn rates_per_type() {
        let rates = CostRates::default();
        assert!(close(
            transport_cost(10.0, &ConnectionType::Pipeline, &rates).unwrap(),
            0.5
        ));
        assert!(close(
            transport_cost(5.0, &ConnectionType::Truck, &rates).unwrap(),
            2.1
        ));
        assert_eq!(
            transport_cost(5.0, &ConnectionType::Other("pipeline".into()), &rates),
            None
        );
    }

    #[test]
    fn unrecognized_type_keeps_capacity() {
        let connections = vec![Connection::new(
            "T1",
            "C1",
            7.0,
            ConnectionType::Other("SHIP".into()),
            12.0,
        )];
        let edges = EdgeData::from_connections(&connections, &CostRates::default());
        assert_eq!(edges.cost("T1", "C1"), None);
        assert_eq!(edges.max_capacity("T1", "C1"), Some(12.0));
    }

    #[test]
    fn duplicate_pair_last_write_wins() {
        let connections = vec![
            Connection::new("R1", "T1", 10.0, ConnectionType::Pipeline, 100.0),
            Connection::new("R1", "T1", 10.0, ConnectionType::Truck, 40.0),
        ];
        let edges = EdgeData::from_connections(&connections, &CostRates::default());
        assert!(close(edges.cost("R1", "T1").unwrap(), 4.2));
        assert_eq!(edges.max_capacity("R1", "T1"), Some(40.0));

        let connections = vec![
            Connection::new("R1", "T1", 10.0, ConnectionType::Pipeline, 100.0),
            Connection::new("R1", "T1", 10.0, ConnectionType::Other("X".into()), 40.0),
        ];
        let edges = EdgeData::from_connections(&connections, &CostRates::default());
        assert_eq!(edges.cost("R1", "T1"), None);
    }

    #[test]
    fn edges_are_directed() {
        let connections = vec![Connection::new(
            "R1",
            "T1",
            10.0,
            ConnectionType::Pipeline,
            100.0,
        )];
        let edges = EdgeData::from_connections(&connections, &CostRates::default());
        assert_eq!(edges.cost("T1", "R1"), None);
        assert_eq!(edges.max_capacity("T1", "R1"), None);
    }
}
