//! Shared enums used across the codebase
//!
//! Each enum maps to a Postgres enum type of the same snake_case name and
//! travels over the wire in SCREAMING_SNAKE_CASE.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! wire_enum {
    ($name:ident, $pg:tt, { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        #[sqlx(type_name = $pg, rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!("unknown {}: {}", stringify!($name), other)),
                }
            }
        }
    };
}

wire_enum!(Role, "user_role", {
    Customer => "CUSTOMER",
    Admin => "ADMIN",
    Kitchen => "KITCHEN",
    Waiter => "WAITER",
    Cashier => "CASHIER",
});

wire_enum!(OrderType, "order_type", {
    DineIn => "DINE_IN",
    Takeout => "TAKEOUT",
    Delivery => "DELIVERY",
});

wire_enum!(OrderStatus, "order_status", {
    Pending => "PENDING",
    Confirmed => "CONFIRMED",
    Preparing => "PREPARING",
    Ready => "READY",
    OutForDelivery => "OUT_FOR_DELIVERY",
    Delivered => "DELIVERED",
    Completed => "COMPLETED",
    Cancelled => "CANCELLED",
});

wire_enum!(PaymentStatus, "payment_status", {
    Pending => "PENDING",
    Paid => "PAID",
    Refunded => "REFUNDED",
    Failed => "FAILED",
});

wire_enum!(PaymentMethod, "payment_method", {
    Cash => "CASH",
    Card => "CARD",
    Transfer => "TRANSFER",
    Online => "ONLINE",
});

wire_enum!(ReservationStatus, "reservation_status", {
    Pending => "PENDING",
    Confirmed => "CONFIRMED",
    Seated => "SEATED",
    Completed => "COMPLETED",
    Cancelled => "CANCELLED",
    NoShow => "NO_SHOW",
});

impl Role {
    pub fn is_staff(&self) -> bool {
        !matches!(self, Role::Customer)
    }
}
