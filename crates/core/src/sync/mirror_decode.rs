//! Decoding of remote product documents.

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::collections::hash_map::{Entry, HashMap};
use std::str::FromStr;

use super::RemoteDocument;
use crate::products::Product;

/// Remote field layout. Text fields and `stock` fall back to their defaults
/// when absent; `price` is required.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteProductFields {
    #[serde(default)]
    name: String,
    #[serde(default)]
    brand: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    origin: String,
    price: Value,
    #[serde(default)]
    stock: i64,
    #[serde(default)]
    image_url: String,
    #[serde(default)]
    description: String,
}

fn decode_price(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(number) => Decimal::from_str(&number.to_string())
            .or_else(|_| Decimal::from_scientific(&number.to_string()))
            .ok(),
        Value::String(text) => Decimal::from_str(text.trim()).ok(),
        _ => None,
    }
}

/// Decodes one document, or `None` if it does not fit the product shape.
pub fn decode_product(document: &RemoteDocument) -> Option<Product> {
    let id = document.id.trim();
    if id.is_empty() {
        return None;
    }
    let fields: RemoteProductFields =
        serde_json::from_value(Value::Object(document.fields.clone())).ok()?;
    let price = decode_price(&fields.price)?;
    if price.is_sign_negative() || fields.stock < 0 {
        return None;
    }

    Some(Product {
        id: id.to_string(),
        name: fields.name,
        brand: fields.brand,
        category: fields.category,
        origin: fields.origin,
        price: price.normalize(),
        stock: fields.stock,
        image_url: fields.image_url,
        description: fields.description,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedSnapshot {
    pub products: Vec<Product>,
    pub dropped: usize,
}

/// Decodes every document; undecodable ones are counted, not reported.
/// A later document with a repeated id replaces the earlier one.
pub fn decode_snapshot(documents: &[RemoteDocument]) -> DecodedSnapshot {
    let mut decoded = DecodedSnapshot::default();
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(documents.len());
    for document in documents {
        let Some(product) = decode_product(document) else {
            decoded.dropped += 1;
            continue;
        };
        match positions.entry(product.id.clone()) {
            Entry::Occupied(slot) => decoded.products[*slot.get()] = product,
            Entry::Vacant(slot) => {
                slot.insert(decoded.products.len());
                decoded.products.push(product);
            }
        }
    }
    decoded
}
