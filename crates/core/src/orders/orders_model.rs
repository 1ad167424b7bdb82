use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub total_amount: Decimal,
    pub created_at: String,
}

/// A purchased product. `unit_price` and `product_name` are copied at
/// checkout and never follow later catalog changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub id: i32,
    pub order_id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl OrderLine {
    pub fn line_total(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(Decimal::from(self.quantity))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderWithLines {
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderLine {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub user_id: String,
    pub lines: Vec<NewOrderLine>,
}

impl NewOrder {
    /// Sum of quantity times unit price. Fails instead of overflowing.
    pub fn total_amount(&self) -> Result<Decimal> {
        self.lines
            .iter()
            .try_fold(Decimal::ZERO, |acc, line| {
                line.unit_price
                    .checked_mul(Decimal::from(line.quantity))
                    .and_then(|total| acc.checked_add(total))
            })
            .ok_or_else(|| Error::invalid_input("Order total is out of range"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn total_is_sum_of_quantity_times_unit_price() {
        let order = NewOrder {
            user_id: "u1".to_string(),
            lines: vec![
                NewOrderLine {
                    product_id: "p1".to_string(),
                    product_name: "Phone".to_string(),
                    quantity: 2,
                    unit_price: dec!(100),
                },
                NewOrderLine {
                    product_id: "p2".to_string(),
                    product_name: "Case".to_string(),
                    quantity: 3,
                    unit_price: dec!(12.50),
                },
            ],
        };
        assert_eq!(order.total_amount().unwrap(), dec!(237.50));
    }

    #[test]
    fn total_that_overflows_is_rejected() {
        let huge = NewOrderLine {
            product_id: "p9".to_string(),
            product_name: "Yacht".to_string(),
            quantity: 2,
            unit_price: Decimal::MAX / dec!(2) + dec!(1),
        };
        let order = NewOrder {
            user_id: "u1".to_string(),
            lines: vec![huge.clone()],
        };
        assert!(matches!(
            order.total_amount(),
            Err(Error::Validation(_))
        ));

        let split = NewOrder {
            user_id: "u1".to_string(),
            lines: vec![
                NewOrderLine {
                    quantity: 1,
                    ..huge.clone()
                },
                NewOrderLine { quantity: 1, ..huge },
            ],
        };
        assert!(split.total_amount().is_err());
    }
}
