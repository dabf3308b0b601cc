pub mod customer;
pub mod menu;
pub mod order;
pub mod reservation;
pub mod restaurant;
pub mod user;

pub use customer::{Customer, DeliveryAddress};
pub use menu::{DietaryInfo, ItemModifier, MenuCategory, MenuItem};
pub use order::{ModifierSnapshot, Order, OrderDetail, OrderItem};
pub use reservation::Reservation;
pub use restaurant::{Branding, DayHours, DeliveryConfig, OpeningHours, RestaurantConfig, RestaurantTable, Services};
pub use user::User;
