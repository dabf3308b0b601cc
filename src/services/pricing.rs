//! Order arithmetic. Everything here is pure so the workflow can be tested
//! without storage.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::models::{DeliveryConfig, ItemModifier, MenuItem, ModifierSnapshot};
use crate::services::error::{ServiceError, ServiceResult};

/// Modifier requested on a cart line.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifierChoice {
    pub id: Uuid,
    #[serde(default)]
    pub option: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub modifiers: Vec<ModifierSnapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Totals {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub delivery_fee: Decimal,
    pub tip_amount: Decimal,
    pub discount_amount: Decimal,
    pub total: Decimal,
}

pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Unit price is the base price plus every requested modifier that belongs to
/// the item. Unknown modifier ids are dropped.
pub fn price_line(item: &MenuItem, modifiers: &[ItemModifier], requested: &[ModifierChoice], quantity: i32) -> PricedLine {
    let snapshots: Vec<ModifierSnapshot> = requested
        .iter()
        .filter_map(|choice| {
            modifiers
                .iter()
                .find(|m| m.id == choice.id && m.menu_item_id == item.id)
                .map(|m| ModifierSnapshot {
                    id: m.id,
                    name: m.name.clone(),
                    price_adjustment: m.price_adjustment,
                    option: choice.option.clone(),
                })
        })
        .collect();

    let unit_price = item.price + snapshots.iter().map(|s| s.price_adjustment).sum::<Decimal>();
    PricedLine {
        unit_price,
        total_price: unit_price * Decimal::from(quantity),
        modifiers: snapshots,
    }
}

/// Fee for a delivery order with the given subtotal.
pub fn delivery_fee(subtotal: Decimal, config: &DeliveryConfig) -> ServiceResult<Decimal> {
    if subtotal < config.minimum_order {
        return Err(ServiceError::precondition(format!(
            "Minimum order for delivery is {}",
            config.minimum_order
        )));
    }
    match config.is_free_over_amount {
        Some(threshold) if subtotal >= threshold => Ok(Decimal::ZERO),
        _ => Ok(config.fee),
    }
}

/// Totals for a new order: tip and discount start at zero.
pub fn totals(subtotal: Decimal, tax_rate: Decimal, delivery_fee: Decimal) -> Totals {
    let tax_amount = round_money(subtotal * tax_rate);
    Totals {
        subtotal,
        tax_amount,
        delivery_fee,
        tip_amount: Decimal::ZERO,
        discount_amount: Decimal::ZERO,
        total: subtotal + tax_amount + delivery_fee,
    }
}
