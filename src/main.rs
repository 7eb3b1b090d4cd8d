use std::path::PathBuf;

use clap::Parser;
use log::{debug, LevelFilter};

use fuel_flow::cost::CostRates;
use fuel_flow::input::Records;
use fuel_flow::network::Validation;
use fuel_flow::{plan, Config, MicroLp, Report};

/// Minimum-cost fuel distribution from refineries through tanks to customers
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// A JSON document with all record sets, or a directory with one JSON file per record set
    input: PathBuf,

    /// Cost per unit of fuel per unit of distance over pipelines
    #[clap(long, default_value_t = CostRates::default().pipeline)]
    pipeline_rate: f64,

    /// Cost per unit of fuel per unit of distance by truck
    #[clap(long, default_value_t = CostRates::default().truck)]
    truck_rate: f64,

    /// Accept demands for unknown customers, duplicate ids and negative values
    #[clap(long)]
    lenient: bool,

    /// Print the report as JSON
    #[clap(long)]
    json: bool,

    /// More logging, may be repeated
    #[clap(short, long, parse(from_occurrences))]
    verbose: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
    debug!("{:?}", args);

    let config = Config {
        rates: CostRates {
            pipeline: args.pipeline_rate,
            truck: args.truck_rate,
        },
        validation: if args.lenient {
            Validation::Lenient
        } else {
            Validation::Strict
        },
        ..Config::default()
    };

    let network = Records::load(&args.input)?.into_network(config.validation)?;
    let result = plan(&network, &config, &MicroLp);
    let report = Report::new(&result, config.epsilon);

    if args.json {
        println!("{}", report.json()?);
    } else {
        println!("{}", report);
    }

    Ok(())
}
