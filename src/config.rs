use crate::cost::CostRates;
use crate::network::Validation;

/// Settings for one planning run
#[derive(Debug, Clone)]
pub struct Config {
    /// Transport cost rates per connection type
    pub rates: CostRates,
    /// Whether the input network is validated before building the model
    pub validation: Validation,
    /// Tolerance used when reporting positive flows and checking the solution
    pub epsilon: f64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            rates: CostRates::default(),
            validation: Validation::Strict,
            epsilon: 1e-6,
        }
    }
}
