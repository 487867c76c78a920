//! Watermark diffing between a stored cut-point and a freshly fetched list.

use crate::feed::FeedEntry;

/// Outcome of comparing fetched items against a subscription watermark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation<T> {
    /// Items to deliver, oldest first.
    pub new_items: Vec<T>,
    /// Watermark to store after delivery.
    pub watermark: Option<String>,
}

impl<T> Reconciliation<T> {
    pub fn is_empty(&self) -> bool {
        self.new_items.is_empty()
    }
}

/// Splits `fetched` (newest first) at `watermark`.
///
/// A subscription that was never polled only receives the newest item. When
/// the watermark is not present in `fetched` every item counts as new.
pub fn reconcile<T: FeedEntry>(watermark: Option<&str>, fetched: Vec<T>) -> Reconciliation<T> {
    let Some(watermark) = watermark else {
        let newest = fetched.into_iter().next();
        let watermark = newest.as_ref().map(|item| item.entry_id().to_string());
        return Reconciliation {
            new_items: newest.into_iter().collect(),
            watermark,
        };
    };

    let mut new_items: Vec<T> = fetched
        .into_iter()
        .take_while(|item| item.entry_id() != watermark)
        .collect();

    let watermark = match new_items.first() {
        Some(newest) => newest.entry_id().to_string(),
        None => watermark.to_string(),
    };
    new_items.reverse();

    Reconciliation {
        new_items,
        watermark: Some(watermark),
    }
}
