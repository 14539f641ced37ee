// apps/orders_service/src/models/mod.rs

//! Orders, carts and the money type they share.

pub mod cart;
pub mod money;
pub mod order;

pub use cart::{Cart, CartItem};
pub use money::Money;
pub use order::{
  CreateOrderRequest, Order, OrderItem, OrderStatus, PaymentInfo, PaymentInfoRequest, PaymentStatus, ShippingAddress,
  StatusUpdateRequest,
};
pub use order::parse_order_id;
