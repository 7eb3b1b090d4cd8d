use std::collections::HashSet;

use derive_more::{Deref, Display, From, Into};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use typed_index_collections::TiVec;

/// The type used for flow quantities
pub type Quantity = f64;
/// The type used for distance
pub type Distance = f64;
/// The type used for cost.
pub type Cost = f64;

#[derive(Deref, Debug, PartialEq, Eq, PartialOrd, Ord, From, Into, Clone, Copy, Hash)]
pub struct RefineryIndex(usize);

#[derive(Deref, Debug, PartialEq, Eq, PartialOrd, Ord, From, Into, Clone, Copy, Hash)]
pub struct TankIndex(usize);

#[derive(Deref, Debug, PartialEq, Eq, PartialOrd, Ord, From, Into, Clone, Copy, Hash)]
pub struct CustomerIndex(usize);

#[derive(Deref, Debug, PartialEq, Eq, PartialOrd, Ord, From, Into, Clone, Copy, Hash)]
pub struct DemandIndex(usize);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Refinery {
    /// Identifier of the refinery
    id: String,
    /// The maximum quantity the refinery can hold
    capacity: Quantity,
    /// The maximum quantity the refinery can ship out in one period
    max_output: Quantity,
    /// Cost of producing one unit
    production_cost: Cost,
    /// CO2 emitted when producing one unit
    production_co2: f64,
}

impl Refinery {
    pub fn new(
        id: impl Into<String>,
        capacity: Quantity,
        max_output: Quantity,
        production_cost: Cost,
        production_co2: f64,
    ) -> Self {
        Refinery {
            id: id.into(),
            capacity,
            max_output,
            production_cost,
            production_co2,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The maximum quantity the refinery can hold
    pub fn capacity(&self) -> Quantity {
        self.capacity
    }

    /// The maximum quantity the refinery can ship out in one period
    pub fn max_output(&self) -> Quantity {
        self.max_output
    }

    /// Cost of producing one unit. Not part of the current objective.
    pub fn production_cost(&self) -> Cost {
        self.production_cost
    }

    /// CO2 emitted when producing one unit. Not part of the current objective.
    pub fn production_co2(&self) -> f64 {
        self.production_co2
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tank {
    id: String,
    /// Maximum throughput in one period
    capacity: Quantity,
}

impl Tank {
    pub fn new(id: impl Into<String>, capacity: Quantity) -> Self {
        Tank {
            id: id.into(),
            capacity,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn capacity(&self) -> Quantity {
        self.capacity
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    id: String,
}

impl Customer {
    pub fn new(id: impl Into<String>) -> Self {
        Customer { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Demand {
    id: String,
    /// The customer placing the demand
    customer_id: String,
    /// Quantity required within the period
    quantity: Quantity,
}

impl Demand {
    pub fn new(id: impl Into<String>, customer_id: impl Into<String>, quantity: Quantity) -> Self {
        Demand {
            id: id.into(),
            customer_id: customer_id.into(),
            quantity,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }
}

/// How fuel travels over a connection. Tags other than `PIPELINE` and `TRUCK` are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConnectionType {
    Pipeline,
    Truck,
    Other(String),
}

impl From<String> for ConnectionType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "PIPELINE" => ConnectionType::Pipeline,
            "TRUCK" => ConnectionType::Truck,
            _ => ConnectionType::Other(tag),
        }
    }
}

impl From<ConnectionType> for String {
    fn from(kind: ConnectionType) -> Self {
        match kind {
            ConnectionType::Pipeline => "PIPELINE".to_string(),
            ConnectionType::Truck => "TRUCK".to_string(),
            ConnectionType::Other(tag) => tag,
        }
    }
}

/// A directed edge between two nodes of the network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    from_id: String,
    to_id: String,
    distance: Distance,
    connection_type: ConnectionType,
    /// Upper bound on the flow over this edge
    max_capacity: Quantity,
}

impl Connection {
    pub fn new(
        from_id: impl Into<String>,
        to_id: impl Into<String>,
        distance: Distance,
        connection_type: ConnectionType,
        max_capacity: Quantity,
    ) -> Self {
        Connection {
            from_id: from_id.into(),
            to_id: to_id.into(),
            distance,
            connection_type,
            max_capacity,
        }
    }

    pub fn from_id(&self) -> &str {
        &self.from_id
    }

    pub fn to_id(&self) -> &str {
        &self.to_id
    }

    pub fn distance(&self) -> Distance {
        self.distance
    }

    pub fn connection_type(&self) -> &ConnectionType {
        &self.connection_type
    }

    pub fn max_capacity(&self) -> Quantity {
        self.max_capacity
    }
}

#[derive(Debug, Clone, PartialEq, Display)]
pub enum NetworkError {
    /// Two nodes of the same role share an identifier
    #[display(fmt = "duplicate {} id `{}`", role, id)]
    DuplicateId { role: &'static str, id: String },
    /// A demand refers to a customer that does not exist
    #[display(fmt = "demand `{}` refers to unknown customer `{}`", demand, customer)]
    UnknownCustomer { demand: String, customer: String },
    /// A capacity, quantity, distance or cost is negative
    #[display(fmt = "{} `{}` has negative {}: {}", role, id, field, value)]
    Negative {
        role: &'static str,
        id: String,
        field: &'static str,
        value: f64,
    },
}

impl std::error::Error for NetworkError {}

/// Whether a network is checked when it is constructed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Validation {
    /// Reject duplicate ids, negative values and demands for unknown customers
    #[default]
    Strict,
    /// Accept the records as they are
    Lenient,
}

/// The supply network: refineries feed tanks, tanks feed customers.
#[derive(Debug, Clone)]
pub struct Network {
    refineries: TiVec<RefineryIndex, Refinery>,
    tanks: TiVec<TankIndex, Tank>,
    customers: TiVec<CustomerIndex, Customer>,
    demands: TiVec<DemandIndex, Demand>,
    connections: Vec<Connection>,
}

impl Network {
    /// Creates a validated network
    pub fn new(
        refineries: Vec<Refinery>,
        tanks: Vec<Tank>,
        customers: Vec<Customer>,
        demands: Vec<Demand>,
        connections: Vec<Connection>,
    ) -> Result<Network, NetworkError> {
        Network::with_validation(
            refineries,
            tanks,
            customers,
            demands,
            connections,
            Validation::Strict,
        )
    }

    pub fn with_validation(
        refineries: Vec<Refinery>,
        tanks: Vec<Tank>,
        customers: Vec<Customer>,
        demands: Vec<Demand>,
        connections: Vec<Connection>,
        validation: Validation,
    ) -> Result<Network, NetworkError> {
        let network = Network {
            refineries: refineries.into(),
            tanks: tanks.into(),
            customers: customers.into(),
            demands: demands.into(),
            connections,
        };

        debug!(
            "Network with {} refineries, {} tanks, {} customers, {} demands and {} connections",
            network.refineries.len(),
            network.tanks.len(),
            network.customers.len(),
            network.demands.len(),
            network.connections.len()
        );

        match validation {
            Validation::Strict => network.validate()?,
            Validation::Lenient => trace!("Skipping network validation"),
        }

        Ok(network)
    }

    /// Checks id uniqueness, non-negativity and that every demand belongs to a known customer.
    pub fn validate(&self) -> Result<(), NetworkError> {
        unique("refinery", self.refineries.iter().map(|r| r.id()))?;
        unique("tank", self.tanks.iter().map(|t| t.id()))?;
        unique("customer", self.customers.iter().map(|c| c.id()))?;
        unique("demand", self.demands.iter().map(|d| d.id()))?;

        for r in &self.refineries {
            non_negative("refinery", r.id(), "capacity", r.capacity())?;
            non_negative("refinery", r.id(), "max_output", r.max_output())?;
            non_negative("refinery", r.id(), "production_cost", r.production_cost())?;
        }
        for t in &self.tanks {
            non_negative("tank", t.id(), "capacity", t.capacity())?;
        }
        for d in &self.demands {
            non_negative("demand", d.id(), "quantity", d.quantity())?;
        }
        for c in &self.connections {
            let id = format!("{}->{}", c.from_id(), c.to_id());
            non_negative("connection", &id, "distance", c.distance())?;
            non_negative("connection", &id, "max_capacity", c.max_capacity())?;
        }

        let known: HashSet<&str> = self.customers.iter().map(|c| c.id()).collect();
        if let Some(d) = self
            .demands
            .iter()
            .find(|d| !known.contains(d.customer_id()))
        {
            return Err(NetworkError::UnknownCustomer {
                demand: d.id.clone(),
                customer: d.customer_id.clone(),
            });
        }

        Ok(())
    }

    pub fn refineries(&self) -> &TiVec<RefineryIndex, Refinery> {
        &self.refineries
    }

    pub fn tanks(&self) -> &TiVec<TankIndex, Tank> {
        &self.tanks
    }

    pub fn customers(&self) -> &TiVec<CustomerIndex, Customer> {
        &self.customers
    }

    pub fn demands(&self) -> &TiVec<DemandIndex, Demand> {
        &self.demands
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }
}

fn unique<'a>(role: &'static str, ids: impl Iterator<Item = &'a str>) -> Result<(), NetworkError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(NetworkError::DuplicateId {
                role,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}

fn non_negative(
    role: &'static str,
    id: &str,
    field: &'static str,
    value: f64,
) -> Result<(), NetworkError> {
    // NaN fails this too
    if value >= 0.0 {
        Ok(())
    } else {
        Err(NetworkError::Negative {
            role,
            id: id.to_string(),
            field,
            value,
        })
    }
}
