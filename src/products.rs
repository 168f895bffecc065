use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;

use log::{info, warn};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;

/// One row of the input table.
#[derive(Deserialize, Debug, PartialEq, Clone)]
pub struct Product {
    #[serde(rename = "codigo")]
    pub code: String,
    #[serde(rename = "Descripcion")]
    pub description: String,
    #[serde(rename = "Cantidad")]
    pub quantity: u32,
    #[serde(rename = "PrecioUnitario", with = "rust_decimal::serde::str")]
    pub unit_price: Decimal,
    #[serde(rename = "PrecioTotal", with = "rust_decimal::serde::str")]
    pub total: Decimal,
}

impl Product {
    pub fn expected_total(&self) -> Decimal {
        (self.unit_price * Decimal::from(self.quantity))
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "[{}] {}, {} @ {:.2}: {:.2}",
            self.code,
            self.description,
            self.quantity,
            self.unit_price,
            self.total
        )
    }
}

pub fn load_products(path: &Path) -> Result<Vec<Product>, csv::Error> {
    let products = products_from_reader(File::open(path)?)?;
    info!("Loaded {} product(s) from {}", products.len(), path.display());
    Ok(products)
}

pub fn products_from_reader<R: io::Read>(
    reader: R,
) -> Result<Vec<Product>, csv::Error> {
    read_products(csv_reader().from_reader(reader))
}

fn csv_reader() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.trim(csv::Trim::All);
    builder
}

fn read_products<R: io::Read>(
    mut reader: csv::Reader<R>,
) -> Result<Vec<Product>, csv::Error> {
    let products = reader
        .deserialize()
        .collect::<Result<Vec<Product>, _>>()?;

    for (row, product) in products.iter().enumerate() {
        if product.total != product.expected_total() {
            warn!(
                "Row {}: total {} for '{}' differs from {} x {}",
                row + 2,
                product.total,
                product.code,
                product.quantity,
                product.unit_price
            );
        }
    }
    Ok(products)
}
