//! Line collection normalization.
//!
//! A collection received from the UI or the remote store may contain several
//! entries for the same product. [`normalize`] merges them down to one entry
//! per identifier so the rest of the system can assume uniqueness.

use std::collections::HashMap;

use crate::types::{LineItem, ProductId};

/// Deduplicate a sequence of line items by product identifier.
///
/// Quantities for the same identifier are summed (saturating); the
/// non-quantity fields come from the last occurrence of that identifier.
/// Output order is the first-occurrence order of each identifier, so the
/// function is idempotent: normalizing an already-normalized collection
/// returns it unchanged.
#[must_use]
pub fn normalize(items: impl IntoIterator<Item = LineItem>) -> Vec<LineItem> {
    let mut order: Vec<ProductId> = Vec::new();
    let mut merged: HashMap<ProductId, LineItem> = HashMap::new();

    for item in items {
        match merged.get_mut(&item.id) {
            Some(existing) => {
                let quantity = existing.quantity.saturating_add(item.quantity);
                *existing = LineItem { quantity, ..item };
            }
            None => {
                order.push(item.id);
                merged.insert(item.id, item);
            }
        }
    }

    order
        .into_iter()
        .filter_map(|id| merged.remove(&id))
        .collect()
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn pid(id: u32) -> ProductId {
        ProductId::new(id).unwrap()
    }

    fn item(id: u32, quantity: u32) -> LineItem {
        LineItem::new(pid(id), format!("product-{id}"), quantity)
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(normalize([]), Vec::<LineItem>::new());
    }

    #[test]
    fn duplicate_identifiers_sum_quantities() {
        let out = normalize([item(1, 1), item(1, 2)]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].quantity, 3);
    }

    #[test]
    fn output_preserves_first_occurrence_order() {
        let out = normalize([item(3, 1), item(1, 1), item(3, 2), item(2, 1)]);
        let ids: Vec<u32> = out.iter().map(|i| i.id.get()).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn last_seen_fields_win() {
        let first = item(1, 1).with_price(Decimal::from(10)).with_image("a.jpg");
        let second = LineItem::new(pid(1), "Renamed", 1).with_price(Decimal::from(12));
        let out = normalize([first, second]);
        assert_eq!(out[0].name, "Renamed");
        assert_eq!(out[0].price, Some(Decimal::from(12)));
        assert_eq!(out[0].image, None);
        assert_eq!(out[0].quantity, 2);
    }

    #[test]
    fn normalize_is_idempotent() {
        let input = vec![item(2, 1), item(1, 4), item(2, 2), item(5, 1)];
        let once = normalize(input);
        let twice = normalize(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn per_identifier_quantity_is_preserved() {
        let input = vec![item(1, 2), item(2, 5), item(1, 3), item(1, 1)];
        let out = normalize(input);
        let q = |id: u32| {
            out.iter()
                .find(|i| i.id.get() == id)
                .map(|i| i.quantity)
                .unwrap()
        };
        assert_eq!(q(1), 6);
        assert_eq!(q(2), 5);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn quantity_sum_saturates() {
        let out = normalize([item(1, u32::MAX), item(1, 10)]);
        assert_eq!(out[0].quantity, u32::MAX);
    }
}
