use anyhow::Result;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use tracing::info;

use crate::common::{Position, Product};

const PRODUCTS: &[&str] = &["bolts", "filament", "battery", "sensor", "propeller", "camera"];

/// One warehouse stocking one product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Stock {
    pub warehouse: Position,
    pub product: Product,
}

/// One pending client order. Scenario order is the fulfillment order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Order {
    pub client: Position,
    pub product: Product,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Scenario {
    pub initial_position: Position,
    pub warehouses: Vec<Position>,
    pub clients: Vec<Position>,
    pub available_products: Vec<Stock>,
    pub orders: Vec<Order>,
}

impl Scenario {
    pub fn load_from_yaml(path: &str) -> Result<Scenario> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let scenario = serde_yaml::from_reader(reader)?;
        Ok(scenario)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Scenario, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    pub fn write_to_yaml(path: &str, scenario: &Scenario) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        let yaml_data = serde_yaml::to_string(scenario)?;
        writer.write_all(yaml_data.as_bytes())?;

        Ok(())
    }

    /// Checks that stock sits at known warehouses and every order names a
    /// known client and a product stocked somewhere.
    pub fn verify(&self) -> bool {
        self.available_products
            .iter()
            .all(|stock| self.warehouses.contains(&stock.warehouse))
            && self.orders.iter().all(|order| {
                self.clients.contains(&order.client)
                    && self
                        .available_products
                        .iter()
                        .any(|stock| stock.product == order.product)
            })
    }

    pub fn generate_random<R: Rng + ?Sized>(
        num_warehouses: usize,
        num_clients: usize,
        num_orders: usize,
        grid_size: i64,
        rng: &mut R,
    ) -> Result<Scenario, String> {
        let mut cells: Vec<Position> = (0..grid_size)
            .flat_map(|x| (0..grid_size).map(move |y| (x, y)))
            .collect();
        if cells.len() < num_warehouses + num_clients + 1 {
            return Err(format!(
                "Grid of {} cells cannot hold {} warehouses, {} clients and a home position",
                cells.len(),
                num_warehouses,
                num_clients
            ));
        }

        // Shuffle once, then pop to get distinct cells.
        cells.shuffle(rng);
        let initial_position = cells.pop().ok_or("Ran out of grid cells")?;
        let warehouses: Vec<Position> = (0..num_warehouses).filter_map(|_| cells.pop()).collect();
        let clients: Vec<Position> = (0..num_clients).filter_map(|_| cells.pop()).collect();

        let mut available_products = Vec::new();
        for &warehouse in &warehouses {
            let count = rng.gen_range(1..=3);
            for product in PRODUCTS.choose_multiple(rng, count) {
                available_products.push(Stock {
                    warehouse,
                    product: (*product).to_string(),
                });
            }
        }

        let mut orders = Vec::new();
        for _ in 0..num_orders {
            let client = *clients.choose(rng).ok_or("No clients to order from")?;
            let stock = available_products
                .choose(rng)
                .ok_or("No stocked products to order")?;
            orders.push(Order {
                client,
                product: stock.product.clone(),
            });
        }

        info!("Generated scenario with orders: {orders:?}");
        Ok(Scenario {
            initial_position,
            warehouses,
            clients,
            available_products,
            orders,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn parse_scenario_from_yaml() {
        let yaml = r#"
initial_position: [0, 0]
warehouses:
  - [0, 0]
clients:
  - [10, 0]
available_products:
  - warehouse: [0, 0]
    product: bolts
orders:
  - client: [10, 0]
    product: bolts
"#;
        let scenario = Scenario::from_yaml_str(yaml).unwrap();
        assert_eq!(scenario.initial_position, (0, 0));
        assert_eq!(scenario.warehouses, vec![(0, 0)]);
        assert_eq!(
            scenario.orders,
            vec![Order {
                client: (10, 0),
                product: "bolts".to_string(),
            }]
        );
        assert!(scenario.verify());
    }

    #[test]
    fn load_bundled_scenario() {
        let scenario = Scenario::load_from_yaml("scenarios/simple.yaml").unwrap();
        assert!(scenario.verify());
        assert_eq!(scenario.warehouses.len(), 2);
        assert_eq!(scenario.orders.len(), 2);
    }

    #[test]
    fn unknown_client_fails_verification() {
        let mut scenario = Scenario::load_from_yaml("scenarios/simple.yaml").unwrap();
        scenario.orders.push(Order {
            client: (99, 99),
            product: "bolts".to_string(),
        });
        assert!(!scenario.verify());
    }

    #[test]
    fn generated_scenarios_are_consistent() {
        let mut rng = StdRng::seed_from_u64(7);
        let scenario = Scenario::generate_random(2, 3, 5, 8, &mut rng).unwrap();
        assert!(scenario.verify());
        assert_eq!(scenario.warehouses.len(), 2);
        assert_eq!(scenario.clients.len(), 3);
        assert_eq!(scenario.orders.len(), 5);
    }

    #[test]
    fn tiny_grid_is_rejected() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(Scenario::generate_random(4, 4, 1, 2, &mut rng).is_err());
    }
}
