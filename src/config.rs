use anyhow::anyhow;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "Drone STRIPS",
    about = "Regression planner for single-drone delivery on a 2D grid.",
    version = "1.0"
)]
pub struct Cli {
    #[arg(
        long,
        help = "Path to the YAML scenario file; omit to generate a random scenario"
    )]
    pub scenario_path: Option<String>,

    #[arg(long, help = "Path to write the resulting plan as JSON")]
    pub output_path: Option<String>,

    #[arg(
        long,
        help = "Wall-clock search budget in seconds",
        default_value_t = 30
    )]
    pub timeout: u64,

    #[arg(
        long,
        help = "Seed for the random number generator",
        default_value_t = 0
    )]
    pub seed: usize,

    #[arg(
        long,
        help = "Number of warehouses in a generated scenario",
        default_value_t = 2
    )]
    pub num_warehouses: usize,

    #[arg(
        long,
        help = "Number of clients in a generated scenario",
        default_value_t = 3
    )]
    pub num_clients: usize,

    #[arg(
        long,
        help = "Number of orders in a generated scenario",
        default_value_t = 4
    )]
    pub num_orders: usize,

    #[arg(
        long,
        help = "Side length of the generated grid",
        default_value_t = 16
    )]
    pub grid_size: i64,

    #[arg(long, help = "Write the generated scenario to this YAML file")]
    pub dump_scenario: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub scenario_path: Option<String>,
    pub output_path: Option<String>,
    pub timeout: u64,
    pub seed: usize,
    pub num_warehouses: usize,
    pub num_clients: usize,
    pub num_orders: usize,
    pub grid_size: i64,
    pub dump_scenario: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            scenario_path: None,
            output_path: None,
            timeout: 30,
            seed: 0,
            num_warehouses: 2,
            num_clients: 3,
            num_orders: 4,
            grid_size: 16,
            dump_scenario: None,
        }
    }
}

impl Config {
    pub fn new(cli: &Cli) -> Self {
        Self {
            scenario_path: cli.scenario_path.clone(),
            output_path: cli.output_path.clone(),
            timeout: cli.timeout,
            seed: cli.seed,
            num_warehouses: cli.num_warehouses,
            num_clients: cli.num_clients,
            num_orders: cli.num_orders,
            grid_size: cli.grid_size,
            dump_scenario: cli.dump_scenario.clone(),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.timeout == 0 {
            return Err(anyhow!("Search budget must be at least one second"));
        }

        if self.scenario_path.is_none() {
            if self.num_warehouses == 0 || self.num_clients == 0 {
                return Err(anyhow!(
                    "A generated scenario needs at least one warehouse and one client, got {} and {}",
                    self.num_warehouses,
                    self.num_clients
                ));
            }
            if self.grid_size <= 0 {
                return Err(anyhow!(
                    "Grid side length must be positive, got {}",
                    self.grid_size
                ));
            }
            let needed = (self.num_warehouses + self.num_clients + 1) as i64;
            if self.grid_size * self.grid_size < needed {
                return Err(anyhow!(
                    "A {0}x{0} grid cannot hold {1} distinct cells",
                    self.grid_size,
                    needed
                ));
            }
        }
        Ok(())
    }
}
