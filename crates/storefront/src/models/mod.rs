//! Domain models for the storefront.
//!
//! These types mirror the backend's table rows plus the request records sent
//! on writes. Prices deserialize into exact decimals; embedded relations
//! (cart line → product/variant) follow the shape of the backend's joined
//! reads.

pub mod address;
pub mod cart;
pub mod order;
pub mod product;
pub mod profile;

pub use address::{Address, AddressDraft, NewAddress};
pub use cart::{CartItem, CartTotals, NewCartLine};
pub use order::{
    AddressSnapshot, NewOrder, NewOrderItem, Order, OrderItem, PaymentMethod,
};
pub use product::{Category, Product, ProductQuery, ProductSort, ProductVariant};
pub use profile::{NewProfile, UserProfile};
