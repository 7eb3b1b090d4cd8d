//! Loading the five input record sets.
//!
//! Either a single JSON document with the fields `connections`, `customers`, `tanks`,
//! `refineries` and `demands`, or a directory holding one table per record set.
//! In a directory, `<table>.csv` (with a header row) is read when present, otherwise
//! `<table>.json` holding an array.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use derive_more::{Display, From};
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::network::{
    Connection, Customer, Demand, Network, NetworkError, Refinery, Tank, Validation,
};

#[derive(Debug, Display, From)]
pub enum InputError {
    #[display(fmt = "failed to read input: {}", _0)]
    Io(std::io::Error),
    #[display(fmt = "malformed input: {}", _0)]
    Json(serde_json::Error),
    #[display(fmt = "malformed table: {}", _0)]
    Csv(csv::Error),
    #[display(fmt = "invalid network: {}", _0)]
    Network(NetworkError),
}

impl std::error::Error for InputError {}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Records {
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub customers: Vec<Customer>,
    #[serde(default)]
    pub tanks: Vec<Tank>,
    #[serde(default)]
    pub refineries: Vec<Refinery>,
    #[serde(default)]
    pub demands: Vec<Demand>,
}

impl Records {
    pub fn from_reader<R: Read>(reader: R) -> Result<Records, InputError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Reads a single document, or one file per record set if `path` is a directory
    pub fn load(path: &Path) -> Result<Records, InputError> {
        info!("Reading records from {}", path.display());

        if path.is_dir() {
            Ok(Records {
                connections: read_table(path, "connections")?,
                customers: read_table(path, "customers")?,
                tanks: read_table(path, "tanks")?,
                refineries: read_table(path, "refineries")?,
                demands: read_table(path, "demands")?,
            })
        } else {
            Records::from_reader(BufReader::new(File::open(path)?))
        }
    }

    pub fn into_network(self, validation: Validation) -> Result<Network, InputError> {
        Ok(Network::with_validation(
            self.refineries,
            self.tanks,
            self.customers,
            self.demands,
            self.connections,
            validation,
        )?)
    }
}

/// Reads `dir/<table>.csv`, falling back to `dir/<table>.json`
fn read_table<T: DeserializeOwned>(dir: &Path, table: &str) -> Result<Vec<T>, InputError> {
    let path = dir.join(format!("{table}.csv"));
    if path.is_file() {
        debug!("Reading {}", path.display());
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(&path)?;
        return Ok(reader.deserialize().collect::<Result<Vec<T>, csv::Error>>()?);
    }

    let path = dir.join(format!("{table}.json"));
    debug!("Reading {}", path.display());
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}
