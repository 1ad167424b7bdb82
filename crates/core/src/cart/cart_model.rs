use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};
use crate::products::Product;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: i32,
    pub user_id: String,
    pub product_id: String,
    pub quantity: i32,
    pub added_at: String,
}

/// A cart line joined with the product it references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub line: CartLine,
    pub product: Product,
}

impl CartItem {
    /// `None` when the product overflows `Decimal`.
    pub fn line_total(&self) -> Option<Decimal> {
        self.product.price.checked_mul(Decimal::from(self.line.quantity))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub items: Vec<CartItem>,
    pub item_count: i64,
    pub subtotal: Decimal,
}

impl CartSummary {
    pub fn from_items(items: Vec<CartItem>) -> Result<Self> {
        let item_count = items.iter().map(|i| i64::from(i.line.quantity)).sum();
        let subtotal = items
            .iter()
            .try_fold(Decimal::ZERO, |acc, item| {
                item.line_total().and_then(|total| acc.checked_add(total))
            })
            .ok_or_else(|| Error::invalid_input("Cart subtotal is out of range"))?;
        Ok(Self {
            items,
            item_count,
            subtotal,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
