use drone_strips::config::{Cli, Config};
use drone_strips::scenario::Scenario;
use drone_strips::solver::{Planner, RegressionPlanner};

use anyhow::Context;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::File;
use tracing::{error, info, Level};
use tracing_subscriber;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .init();
    let cli = Cli::parse();
    let config = Config::new(&cli);
    config.validate()?;

    let scenario = if let Some(path) = config.scenario_path.as_ref() {
        Scenario::load_from_yaml(path)
            .with_context(|| format!("error loading scenario file: {path}"))?
    } else {
        info!("No scenario file specified, generating a random one");
        let mut rng = StdRng::seed_from_u64(config.seed as u64);
        Scenario::generate_random(
            config.num_warehouses,
            config.num_clients,
            config.num_orders,
            config.grid_size,
            &mut rng,
        )
        .map_err(|err| anyhow::anyhow!(err))?
    };
    assert!(scenario.verify());

    if let Some(path) = config.dump_scenario.as_ref() {
        Scenario::write_to_yaml(path, &scenario)?;
    }

    let mut planner = RegressionPlanner::new(scenario);
    match planner.plan(&config) {
        Some(plan) => {
            for line in plan.render() {
                println!("{line}");
            }
            info!("plan cost: {:.3}", plan.cost());
            if let Some(path) = config.output_path.as_ref() {
                let file = File::create(path)
                    .with_context(|| format!("error creating output file: {path}"))?;
                serde_json::to_writer_pretty(file, &plan)?;
            }
        }
        None => error!("no plan found within the search budget"),
    }

    Ok(())
}
