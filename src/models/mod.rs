pub mod distribution;
pub mod program;
pub mod utils;

pub use distribution::model::{DistributionModel, DistributionResult};
pub use program::Program;
