use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A catalog entry mirrored from the remote product collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub brand: String,
    pub category: String,
    pub origin: String,
    pub price: Decimal,
    pub stock: i64,
    pub image_url: String,
    pub description: String,
}

impl Product {
    pub fn is_in_stock(&self) -> bool {
        self.stock > 0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    NameAsc,
    PriceAsc,
    PriceDesc,
}

/// Browse/search criteria. Blank strings are treated as "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
    pub query: Option<String>,
    pub category: Option<String>,
    pub in_stock_only: bool,
    pub sort: ProductSort,
}

impl ProductFilter {
    pub fn normalized(&self) -> Self {
        let clean = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        Self {
            query: clean(&self.query),
            category: clean(&self.category),
            in_stock_only: self.in_stock_only,
            sort: self.sort,
        }
    }
}
