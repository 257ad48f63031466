//! Drag reorder of displayed categories.

use serde::Deserialize;

use crate::category_order::CategoryOrderStore;
use crate::error::{CoreError, CoreResult};

/// A drag gesture over the displayed category sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ReorderGesture {
    pub source: usize,
    /// `None` when the item was dropped outside the list.
    pub destination: Option<usize>,
}

/// Remove the label at `from` and reinsert it at `to` (a move, not a swap).
pub fn move_label(order: &[String], from: usize, to: usize) -> CoreResult<Vec<String>> {
    let len = order.len();
    if from >= len || to >= len {
        return Err(CoreError::Validation(format!(
            "reorder positions {from} -> {to} out of range for {len} categories"
        )));
    }
    let mut moved = order.to_vec();
    let label = moved.remove(from);
    moved.insert(to, label);
    Ok(moved)
}

/// Apply a gesture to `displayed` and persist the result.
///
/// The new order is adopted in memory before the store call; if persisting
/// fails the error is returned and the optimistic order stays in place.
/// Returns `Ok(None)` for a gesture without a destination.
pub async fn apply_gesture(
    orders: &mut CategoryOrderStore,
    displayed: &[String],
    gesture: ReorderGesture,
) -> CoreResult<Option<Vec<String>>> {
    let Some(destination) = gesture.destination else {
        return Ok(None);
    };
    let new_order = move_label(displayed, gesture.source, destination)?;

    orders.adopt(new_order.clone())?;
    if let Err(e) = orders.save(new_order.clone()).await {
        tracing::error!(error = %e, "Failed to persist category order");
        return Err(e);
    }

    tracing::info!(
        from = gesture.source,
        to = destination,
        "Category order updated"
    );
    Ok(Some(new_order))
}
