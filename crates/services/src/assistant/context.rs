//! Catalog context and prompt assembly.
//!
//! Pure text shaping: the catalog is grouped by category and rendered into
//! the inventory block the model answers from, and the shopper's question is
//! wrapped in the single storefront prompt.

use std::fmt::Write as _;

use truesoul_core::Category;

use crate::products::Product;

/// Render the catalog as a textual inventory, grouped by category.
///
/// An empty catalog renders as an explicit out-of-stock notice rather than
/// an empty block, so the model does not invent products.
#[must_use]
pub fn catalog_context(products: &[Product]) -> String {
    if products.is_empty() {
        return "No products are currently available in the store.".to_owned();
    }

    let mut context = String::from("PRODUCT INVENTORY BY CATEGORY:\n\n");
    for category in Category::ALL {
        let in_category: Vec<&Product> = products
            .iter()
            .filter(|p| p.category == category)
            .collect();
        if in_category.is_empty() {
            continue;
        }

        let _ = writeln!(context, "{}:", category.label().to_uppercase());
        for product in in_category {
            let _ = writeln!(
                context,
                "- {}: \u{20b9}{} per {} (Stock: {} {}) - {}",
                product.name,
                product.price.amount(),
                product.unit,
                product.stock_quantity,
                product.unit,
                product.description,
            );
        }
        context.push('\n');
    }

    context
}

/// Wrap a shopper question and the inventory context into the prompt.
#[must_use]
pub fn build_prompt(question: &str, context: &str) -> String {
    format!(
        "You are an AI shopping assistant for TrueSoul, an agricultural products \
         e-commerce store in India. All prices are in Indian Rupees (\u{20b9}).\n\n\
         PRODUCT INVENTORY:\n{context}\n\n\
         CUSTOMER QUERY: \"{question}\"\n\n\
         Please respond naturally to the customer's query using only the product \
         information provided above. Always mention prices in Indian Rupees (\u{20b9}). \
         If asked about products not in our inventory, let them know what we do \
         have available."
    )
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use truesoul_core::{Price, ProductId};

    use super::*;

    fn product(name: &str, category: Category, price: u64, stock: u32) -> Product {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).single().expect("valid");
        Product {
            id: ProductId::new(name.to_lowercase()),
            name: name.to_owned(),
            description: format!("{name} description"),
            price: Price::from_rupees(price),
            category,
            image_url: None,
            stock_quantity: stock,
            unit: "kg".to_owned(),
            created_at: now,
            updated_at: now,
            average_rating: None,
        }
    }

    #[test]
    fn test_empty_catalog_notice() {
        assert_eq!(
            catalog_context(&[]),
            "No products are currently available in the store."
        );
    }

    #[test]
    fn test_groups_by_category_and_skips_empty_groups() {
        let products = vec![
            product("Basmati", Category::Rice, 120, 10),
            product("Raw Groundnuts", Category::Groundnuts, 80, 50),
            product("Jasmine", Category::Rice, 110, 5),
        ];

        let context = catalog_context(&products);
        assert!(context.starts_with("PRODUCT INVENTORY BY CATEGORY:"));
        assert!(context.contains("RICE:"));
        assert!(context.contains("GROUNDNUTS:"));
        assert!(!context.contains("SUNFLOWER OIL:"));

        let rice_pos = context.find("RICE:").expect("rice group");
        let nuts_pos = context.find("GROUNDNUTS:").expect("groundnuts group");
        assert!(rice_pos < nuts_pos, "catalog order follows category order");
    }

    #[test]
    fn test_line_format_carries_price_stock_and_description() {
        let context = catalog_context(&[product("Basmati", Category::Rice, 120, 10)]);
        assert!(context.contains("- Basmati: \u{20b9}120 per kg (Stock: 10 kg) - Basmati description"));
    }

    #[test]
    fn test_prompt_embeds_question_and_context() {
        let prompt = build_prompt("do you have rice?", "INVENTORY");
        assert!(prompt.contains("CUSTOMER QUERY: \"do you have rice?\""));
        assert!(prompt.contains("PRODUCT INVENTORY:\nINVENTORY"));
        assert!(prompt.contains("Indian Rupees"));
    }
}
