//! Order domain types.
//!
//! An order's line items and price snapshots never change after creation;
//! only `status` and `payment_status` transition afterward.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vastra_core::{
    Money, OrderId, OrderItemId, OrderStatus, PaymentStatus, ProductId, UserId, VariantId,
};

use super::address::Address;

/// How an order is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash on delivery - the only method the express path uses.
    #[default]
    #[serde(rename = "cod")]
    CashOnDelivery,
    Card,
    Upi,
}

/// Delivery address denormalized into the order row at creation time,
/// independent of later address-book edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressSnapshot {
    pub name: String,
    pub phone: String,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

impl From<&Address> for AddressSnapshot {
    fn from(address: &Address) -> Self {
        Self {
            name: address.name.clone(),
            phone: address.phone.clone(),
            address_line1: address.address_line1.clone(),
            address_line2: address.address_line2.clone(),
            city: address.city.clone(),
            state: address.state.clone(),
            postal_code: address.postal_code.clone(),
            country: address.country.clone(),
        }
    }
}

/// An order header row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    /// Human-readable, unique across orders.
    pub order_number: String,
    pub status: OrderStatus,
    pub total_amount: Money,
    pub discount_amount: Money,
    pub shipping_amount: Money,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub shipping_address: AddressSnapshot,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// An order line with its frozen price snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub quantity: u32,
    /// Unit price at order-creation time; never recomputed.
    pub unit_price: Money,
    /// `unit_price × quantity` at order-creation time.
    pub total_price: Money,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Request record for inserting an order header.
#[derive(Debug, Clone, Serialize)]
pub struct NewOrder {
    pub user_id: UserId,
    pub order_number: String,
    pub status: OrderStatus,
    pub total_amount: Money,
    pub discount_amount: Money,
    pub shipping_amount: Money,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub shipping_address: AddressSnapshot,
}

/// Request record for inserting one order line.
#[derive(Debug, Clone, Serialize)]
pub struct NewOrderItem {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub quantity: u32,
    pub unit_price: Money,
    pub total_price: Money,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use vastra_core::AddressKind;

    #[test]
    fn test_payment_method_wire_names() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::CashOnDelivery).unwrap(),
            "\"cod\""
        );
        assert_eq!(serde_json::to_string(&PaymentMethod::Upi).unwrap(), "\"upi\"");
    }

    #[test]
    fn test_snapshot_captures_address_fields() {
        let address = Address {
            id: vastra_core::AddressId::new("a1"),
            user_id: UserId::new("u1"),
            kind: AddressKind::Home,
            name: "Asha Rao".to_owned(),
            phone: "+919800000000".to_owned(),
            address_line1: "12 MG Road".to_owned(),
            address_line2: None,
            city: "Bengaluru".to_owned(),
            state: "Karnataka".to_owned(),
            postal_code: "560001".to_owned(),
            country: "India".to_owned(),
            is_default: true,
            created_at: None,
        };
        let snapshot = AddressSnapshot::from(&address);
        assert_eq!(snapshot.name, "Asha Rao");
        assert_eq!(snapshot.city, "Bengaluru");
        assert_eq!(snapshot.address_line2, None);
    }
}
