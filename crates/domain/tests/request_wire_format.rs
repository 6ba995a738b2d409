//! JSON shape of order requests and placed orders.

use chrono::Utc;
use domain::{Channel, CustomerId, LineItem, Money, Order, OrderRequest};

#[test]
fn request_without_channel_defaults_to_storefront() {
    let json = r#"{
        "request_id": "6f1c1c3e-8d5f-4d0e-9b7e-2a4c2b1f0a11",
        "customer_id": null,
        "guest_email": "guest@example.com",
        "lines": [
            { "resource_id": "sku-1", "description": "Widget", "quantity": 2, "unit_price": 1250 }
        ],
        "shipping_address": null
    }"#;

    let request: OrderRequest = serde_json::from_str(json).unwrap();

    assert_eq!(request.channel, Channel::Storefront);
    assert!(request.is_guest());
    assert_eq!(request.total(), Money::from_cents(2500));
}

#[test]
fn money_and_ids_serialize_flat() {
    let request = OrderRequest::for_customer(CustomerId::new())
        .with_line(LineItem::new("sku-1", "Widget", 1, Money::from_cents(999)))
        .via_channel(Channel::Internal);

    let value = serde_json::to_value(&request).unwrap();

    assert_eq!(value["channel"], "internal");
    assert_eq!(value["lines"][0]["resource_id"], "sku-1");
    assert_eq!(value["lines"][0]["unit_price"], 999);
    assert!(value["customer_id"].is_string());
}

#[test]
fn placed_order_round_trips() {
    let request = OrderRequest::for_customer(CustomerId::new())
        .with_line(LineItem::new("sku-1", "Widget", 3, Money::from_dollars(4)))
        .ship_to("1 Main St");
    let order = Order::place(&request, Utc::now()).unwrap();

    let json = serde_json::to_string(&order).unwrap();
    let back: Order = serde_json::from_str(&json).unwrap();

    assert_eq!(back, order);
    assert_eq!(back.total(), Money::from_dollars(12));
}
