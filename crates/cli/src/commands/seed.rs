//! Seed the store with the sample catalog.
//!
//! Provisions the collection databases, then writes the sample products.
//! Seeding is idempotent: products whose names already exist in the catalog
//! are skipped, so re-running after a partial failure only fills the gaps.

use std::sync::Arc;

use tracing::info;

use truesoul_core::{Category, Price};
use truesoul_services::clock::SystemClock;
use truesoul_services::products::{NewProduct, ProductStore};

use super::backend_from_env;

/// The sample catalog.
fn sample_products() -> Vec<NewProduct> {
    let product = |name: &str, description: &str, price, category, stock, unit: &str| NewProduct {
        name: name.to_owned(),
        description: description.to_owned(),
        price: Price::from_rupees(price),
        category,
        image_url: None,
        stock_quantity: stock,
        unit: unit.to_owned(),
    };

    vec![
        product(
            "Premium Basmati Rice",
            "Long-grain aromatic rice with a distinctive fragrance and fluffy texture. Perfect for biryanis and pilafs.",
            120,
            Category::Rice,
            100,
            "kg",
        ),
        product(
            "Organic Brown Rice",
            "Nutritious whole grain rice rich in fiber and essential nutrients. Great for healthy meals.",
            90,
            Category::Rice,
            75,
            "kg",
        ),
        product(
            "Jasmine Rice",
            "Fragrant Thai jasmine rice with a subtle floral aroma and soft, sticky texture.",
            110,
            Category::Rice,
            60,
            "kg",
        ),
        product(
            "Raw Groundnuts",
            "Fresh, raw groundnuts packed with protein and healthy fats. Perfect for snacking or cooking.",
            80,
            Category::Groundnuts,
            50,
            "kg",
        ),
        product(
            "Roasted Groundnuts",
            "Premium roasted groundnuts with a rich, nutty flavor. Great for snacking and garnishing.",
            100,
            Category::Groundnuts,
            40,
            "kg",
        ),
        product(
            "Salted Groundnuts",
            "Delicious salted groundnuts with the perfect balance of salt and crunch.",
            110,
            Category::Groundnuts,
            35,
            "kg",
        ),
        product(
            "Cold-Pressed Sunflower Oil",
            "Pure cold-pressed sunflower oil, light and heart-healthy. Ideal for everyday cooking.",
            180,
            Category::SunflowerOil,
            30,
            "liter",
        ),
        product(
            "Refined Sunflower Oil",
            "Refined sunflower oil with a neutral taste and high smoke point.",
            150,
            Category::SunflowerOil,
            45,
            "liter",
        ),
        product(
            "Cold-Pressed Groundnut Oil",
            "Traditional cold-pressed groundnut oil with a rich, nutty aroma.",
            220,
            Category::GroundnutOil,
            25,
            "liter",
        ),
        product(
            "Filtered Groundnut Oil",
            "Filtered groundnut oil, perfect for deep frying and everyday use.",
            200,
            Category::GroundnutOil,
            40,
            "liter",
        ),
    ]
}

/// Run the seed command.
///
/// # Errors
///
/// Returns an error if the store is unreachable or a write fails.
pub async fn run(dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    let samples = sample_products();

    if dry_run {
        info!("dry run: {} products would be written", samples.len());
        for sample in &samples {
            info!(
                "  {} ({}) - {} per {}, stock {}",
                sample.name, sample.category, sample.price, sample.unit, sample.stock_quantity
            );
        }
        return Ok(());
    }

    let backend = backend_from_env()?;
    backend.provision().await?;
    info!("collections provisioned");

    let products = ProductStore::new(Arc::new(backend), Arc::new(SystemClock));

    let existing = products.list().await?;
    let mut inserted = 0usize;
    let mut skipped = 0usize;

    for sample in samples {
        if existing.iter().any(|p| p.name == sample.name) {
            skipped += 1;
            continue;
        }
        let created = products.create(sample).await?;
        info!(id = %created.id, name = %created.name, "product seeded");
        inserted += 1;
    }

    info!("Seeding complete!");
    info!("  Products inserted: {inserted}");
    info!("  Products skipped (already exist): {skipped}");
    Ok(())
}
