//! Checkout messaging handoff.
//!
//! Checkout does not collect payment in-band: after the order is recorded,
//! the shopper is handed a pre-filled message deep link and the conversation
//! moves to the messaging app. There is no programmatic confirmation of
//! delivery - the order sits in `pending` until staff confirm it.

use std::fmt::Write as _;

use truesoul_services::orders::Order;

/// Compose the pre-filled order message.
///
/// Itemized lines with quantities and rupee line totals, the grand total,
/// and the customer's name and email. The address line stays a placeholder
/// when no shipping address was captured.
#[must_use]
pub fn compose_order_message(
    order: &Order,
    customer_name: Option<&str>,
    customer_email: &str,
) -> String {
    let mut message = String::from("Hello, I want to book the following items from TrueSoul:\n");

    for (index, item) in order.items.iter().enumerate() {
        let _ = write!(
            message,
            "\n{}. {} (x{}) - {}",
            index + 1,
            item.product.name,
            item.quantity,
            item.line_total(),
        );
    }

    let _ = write!(message, "\n\nTotal: {}", order.total_amount);
    let _ = write!(message, "\n\nOrder ID: {}", order.id);

    match customer_name {
        Some(name) => {
            let _ = write!(message, "\n\nName: {name}");
        }
        None => message.push_str("\n\nName: [Enter your name]"),
    }
    let _ = write!(message, "\nEmail: {customer_email}");

    match &order.shipping_address {
        Some(address) => {
            let _ = write!(
                message,
                "\nAddress: {}, {}, {} {}, {}",
                address.street, address.city, address.state, address.zip_code, address.country
            );
        }
        None => message.push_str("\nAddress: [Enter your address]"),
    }

    message
}

/// Build the `wa.me` deep link carrying the message.
#[must_use]
pub fn whatsapp_link(phone: &str, message: &str) -> String {
    format!("https://wa.me/{phone}?text={}", urlencoding::encode(message))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use truesoul_core::{Category, OrderId, OrderStatus, Price, ProductId, ProductSnapshot, UserId};
    use truesoul_services::orders::{Order, OrderItem, ShippingAddress};

    use super::*;

    fn order(shipping_address: Option<ShippingAddress>) -> Order {
        let item = |name: &str, price: u64, quantity: u32| OrderItem {
            product_id: ProductId::new(name.to_lowercase()),
            product: ProductSnapshot {
                id: ProductId::new(name.to_lowercase()),
                name: name.to_owned(),
                price: Price::from_rupees(price),
                category: Category::Rice,
                unit: "kg".to_owned(),
                stock_quantity: 10,
                image_url: None,
            },
            quantity,
        };

        let items = vec![item("Basmati", 120, 2), item("Jasmine", 110, 1)];
        let total_amount = items.iter().map(OrderItem::line_total).sum();
        Order {
            id: OrderId::new("ord-1"),
            user_id: UserId::new("u1"),
            items,
            total_amount,
            status: OrderStatus::Pending,
            order_date: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).single().expect("valid"),
            shipping_address,
        }
    }

    #[test]
    fn test_message_itemizes_lines_and_total() {
        let message = compose_order_message(&order(None), Some("Asha"), "asha@example.com");

        assert!(message.contains("1. Basmati (x2) - \u{20b9}240.00"));
        assert!(message.contains("2. Jasmine (x1) - \u{20b9}110.00"));
        assert!(message.contains("Total: \u{20b9}350.00"));
        assert!(message.contains("Order ID: ord-1"));
        assert!(message.contains("Name: Asha"));
        assert!(message.contains("Email: asha@example.com"));
        assert!(message.contains("Address: [Enter your address]"));
    }

    #[test]
    fn test_message_with_address_and_anonymous_name() {
        let address = ShippingAddress {
            street: "12 MG Road".to_owned(),
            city: "Bengaluru".to_owned(),
            state: "Karnataka".to_owned(),
            zip_code: "560001".to_owned(),
            country: "India".to_owned(),
        };
        let message = compose_order_message(&order(Some(address)), None, "asha@example.com");

        assert!(message.contains("Name: [Enter your name]"));
        assert!(message.contains("Address: 12 MG Road, Bengaluru, Karnataka 560001, India"));
    }

    #[test]
    fn test_deep_link_encodes_message() {
        let link = whatsapp_link("919876543210", "Hello, order #1");
        assert!(link.starts_with("https://wa.me/919876543210?text="));
        assert!(link.contains("Hello%2C%20order%20%231"));
        assert!(!link.contains(' '));
    }
}
