use serde::{Deserialize, Serialize};
use serde_aux::prelude::deserialize_string_from_number;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub token_id: String,
    /// Base units (wei).
    pub price: u128,
    /// Unix seconds at which the order expires.
    pub end_time: u64,
}

/// Outcome of offering a listing to a `PriceMap`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    Inserted,
    Replaced,
    Skipped,
}

/// token_id -> price in base units, in first-seen order of the token ids.
#[derive(Debug, Clone, Default)]
pub struct PriceMap {
    entries: Vec<(String, u128)>,
    index: HashMap<String, usize>,
    end_times: HashMap<String, u64>,
}

impl PriceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps the listing with the latest expiry per token. Equal expiries keep the
    /// listing seen first.
    pub fn offer(&mut self, l: Listing) -> Offer {
        match self.index.get(&l.token_id) {
            Some(&i) => {
                let seen = self.end_times.get(&l.token_id).copied().unwrap_or_default();
                if l.end_time <= seen {
                    return Offer::Skipped;
                }
                self.entries[i].1 = l.price;
                self.end_times.insert(l.token_id, l.end_time);
                Offer::Replaced
            }
            None => {
                self.index.insert(l.token_id.clone(), self.entries.len());
                self.end_times.insert(l.token_id.clone(), l.end_time);
                self.entries.push((l.token_id, l.price));
                Offer::Inserted
            }
        }
    }

    #[cfg(test)]
    pub fn get(&self, token_id: &str) -> Option<u128> {
        self.index.get(token_id).map(|&i| self.entries[i].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u128)> {
        self.entries.iter().map(|(t, p)| (t.as_str(), *p))
    }

    /// Entries ordered by ascending price. The sort is stable, so equal prices keep
    /// first-seen order.
    pub fn sorted_by_price(&self) -> Vec<(&str, u128)> {
        let mut out: Vec<(&str, u128)> = self.iter().collect();
        out.sort_by_key(|(_, p)| *p);
        out
    }
}

impl FromIterator<Listing> for PriceMap {
    fn from_iter<I: IntoIterator<Item = Listing>>(iter: I) -> Self {
        let mut m = PriceMap::new();
        for l in iter {
            m.offer(l);
        }
        m
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trait {
    pub trait_type: String,
    #[serde(deserialize_with = "deserialize_string_from_number")]
    pub value: String,
}

/// token_id -> sum of the token's level trait values.
pub type TotalLevelMap = HashMap<String, i64>;

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(token_id: &str, price: u128, end_time: u64) -> Listing {
        Listing { token_id: token_id.to_string(), price, end_time }
    }

    #[test]
    fn later_expiry_wins_in_either_order() {
        let m: PriceMap = vec![listing("42", 10, 100), listing("42", 20, 200)].into_iter().collect();
        assert_eq!(m.get("42"), Some(20));
        assert_eq!(m.len(), 1);

        let m: PriceMap = vec![listing("42", 20, 200), listing("42", 10, 100)].into_iter().collect();
        assert_eq!(m.get("42"), Some(20));
    }

    #[test]
    fn equal_expiry_keeps_first_seen() {
        let mut m = PriceMap::new();
        assert_eq!(m.offer(listing("7", 500, 300)), Offer::Inserted);
        assert_eq!(m.offer(listing("7", 100, 300)), Offer::Skipped);
        assert_eq!(m.get("7"), Some(500));
    }

    #[test]
    fn replacement_keeps_original_position() {
        let mut m = PriceMap::new();
        m.offer(listing("a", 1, 10));
        m.offer(listing("b", 2, 10));
        assert_eq!(m.offer(listing("a", 3, 20)), Offer::Replaced);

        let ids: Vec<&str> = m.iter().map(|(t, _)| t).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(m.get("a"), Some(3));
    }

    #[test]
    fn sorts_ascending_by_price_and_stable_on_ties() {
        let m: PriceMap = vec![
            listing("A", 5000, 1),
            listing("B", 1000, 1),
            listing("C", 3000, 1),
            listing("D", 1000, 1),
        ]
        .into_iter()
        .collect();

        let ids: Vec<&str> = m.sorted_by_price().into_iter().map(|(t, _)| t).collect();
        assert_eq!(ids, vec!["B", "D", "C", "A"]);
    }

    #[test]
    fn trait_value_accepts_numbers_and_strings() {
        let ts: Vec<Trait> = serde_json::from_str(
            r#"[{"trait_type":"KATON","value":3},{"trait_type":"DOTON","value":"4"}]"#,
        )
        .unwrap();
        assert_eq!(ts[0].value, "3");
        assert_eq!(ts[1].value, "4");
    }
}
