pub mod config;
pub mod cost;
pub mod input;
pub mod models;
pub mod network;
pub mod report;
pub mod solver;

pub use config::Config;
pub use models::distribution::plan;
pub use network::Network;
pub use report::Report;
pub use solver::{MicroLp, Solver, Status};
