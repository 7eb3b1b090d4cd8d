use std::collections::{HashMap, HashSet};

use derive_more::{Deref, From, Into};
use itertools::iproduct;
use log::trace;
use typed_index_collections::TiVec;

use crate::cost::EdgeData;
use crate::network::{DemandIndex, Network, RefineryIndex, TankIndex};

/// A customer that owns at least one demand, and therefore receives stage-2 flow
#[derive(Deref, Debug, PartialEq, Eq, PartialOrd, Ord, From, Into, Clone, Copy, Hash)]
pub struct DestinationIndex(usize);

/// sets for the distribution model
#[derive(Debug)]
#[allow(non_snake_case)]
pub struct Sets {
    /// Set of refineries
    pub R: Vec<RefineryIndex>,
    /// Set of tanks
    pub T: Vec<TankIndex>,
    /// Set of destinations, one per distinct customer id found among the demands, in order of first appearance
    pub K: Vec<DestinationIndex>,
    /// Set of demands
    pub D: Vec<DemandIndex>,
    /// The destination of each demand
    pub K_d: TiVec<DemandIndex, DestinationIndex>,
}

#[allow(non_snake_case)]
impl Sets {
    /// The sets, together with the customer id of every destination
    pub fn new(network: &Network) -> (Sets, TiVec<DestinationIndex, String>) {
        let mut ids: TiVec<DestinationIndex, String> = TiVec::new();
        let mut lookup: HashMap<&str, DestinationIndex> = HashMap::new();

        let K_d = network
            .demands()
            .iter()
            .map(|d| {
                *lookup
                    .entry(d.customer_id())
                    .or_insert_with(|| ids.push_and_get_key(d.customer_id().to_string()))
            })
            .collect();

        trace!("destinations: {:?}", ids);

        let sets = Sets {
            R: network.refineries().iter_enumerated().map(|(r, _)| r).collect(),
            T: network.tanks().iter_enumerated().map(|(t, _)| t).collect(),
            K: ids.iter_enumerated().map(|(k, _)| k).collect(),
            D: network.demands().iter_enumerated().map(|(d, _)| d).collect(),
            K_d,
        };

        (sets, ids)
    }
}

/// parameters for the distribution model
#[allow(non_snake_case)]
pub struct Parameters {
    /// Identifier of every refinery
    pub refinery_id: TiVec<RefineryIndex, String>,
    /// Identifier of every tank
    pub tank_id: TiVec<TankIndex, String>,
    /// Customer identifier of every destination
    pub destination_id: TiVec<DestinationIndex, String>,
    /// Identifier of every demand
    pub demand_id: TiVec<DemandIndex, String>,
    /// Quantity required by each demand
    pub Q: TiVec<DemandIndex, f64>,
    /// Throughput capacity of each tank
    pub S_tank: TiVec<TankIndex, f64>,
    /// Maximum output of each refinery
    pub O: TiVec<RefineryIndex, f64>,
    /// Capacity of each refinery
    pub S_refinery: TiVec<RefineryIndex, f64>,
    /// Transport cost per unit from refinery r to tank t, where the pair has one
    pub C_rt: HashMap<(RefineryIndex, TankIndex), f64>,
    /// Transport cost per unit from tank t to destination k, where the pair has one
    pub C_tk: HashMap<(TankIndex, DestinationIndex), f64>,
    /// Max capacity of the connection from refinery r to tank t, where one exists
    pub U_rt: HashMap<(RefineryIndex, TankIndex), f64>,
    /// Max capacity of the connection from tank t to destination k, where one exists and k is a listed customer
    pub U_tk: HashMap<(TankIndex, DestinationIndex), f64>,
}

#[allow(non_snake_case)]
impl Parameters {
    pub fn new(
        network: &Network,
        edges: &EdgeData,
        sets: &Sets,
        destination_id: TiVec<DestinationIndex, String>,
    ) -> Parameters {
        let refinery_id: TiVec<RefineryIndex, String> =
            network.refineries().iter().map(|r| r.id().to_string()).collect();
        let tank_id: TiVec<TankIndex, String> =
            network.tanks().iter().map(|t| t.id().to_string()).collect();

        let stage_one = || iproduct!(sets.R.iter().copied(), sets.T.iter().copied());
        let stage_two = || iproduct!(sets.T.iter().copied(), sets.K.iter().copied());

        let C_rt = stage_one()
            .filter_map(|(r, t)| Some(((r, t), edges.cost(&refinery_id[r], &tank_id[t])?)))
            .collect();
        let C_tk = stage_two()
            .filter_map(|(t, k)| Some(((t, k), edges.cost(&tank_id[t], &destination_id[k])?)))
            .collect();
        let U_rt = stage_one()
            .filter_map(|(r, t)| {
                Some(((r, t), edges.max_capacity(&refinery_id[r], &tank_id[t])?))
            })
            .collect();
        // demands may name customers missing from the customer records when validation is off
        let customers: HashSet<&str> = network.customers().iter().map(|c| c.id()).collect();
        let U_tk = stage_two()
            .filter(|(_, k)| customers.contains(destination_id[*k].as_str()))
            .filter_map(|(t, k)| {
                Some(((t, k), edges.max_capacity(&tank_id[t], &destination_id[k])?))
            })
            .collect();

        Parameters {
            demand_id: network.demands().iter().map(|d| d.id().to_string()).collect(),
            Q: network.demands().iter().map(|d| d.quantity()).collect(),
            S_tank: network.tanks().iter().map(|t| t.capacity()).collect(),
            O: network.refineries().iter().map(|r| r.max_output()).collect(),
            S_refinery: network.refineries().iter().map(|r| r.capacity()).collect(),
            refinery_id,
            tank_id,
            destination_id,
            C_rt,
            C_tk,
            U_rt,
            U_tk,
        }
    }
}
