//! The order book for a single trading pair.
//!
//! A `Vec<OrderGroup>` sorted by price, highest first. Insertion finds its
//! slot by binary search and shifts the tail; equal prices compare equal
//! numerically, so `1.0` and `1` land in the same group.

use std::fmt;

use rust_decimal::Decimal;

use crate::order_group::{BookOrder, OrderGroup};

/// Price-descending book of order groups.
#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    groups: Vec<OrderGroup>,
}

impl OrderBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =================================================================
    // Insertion
    // =================================================================

    /// Insert an order, keeping groups sorted by descending price.
    pub fn add(&mut self, order: BookOrder) {
        match self
            .groups
            .binary_search_by(|group| order.price.cmp(&group.price))
        {
            Ok(i) => self.groups[i].push(order),
            Err(i) => self.groups.insert(i, OrderGroup::new(order)),
        }
    }

    /// Insert orders one by one, in iteration order.
    pub fn add_orders(&mut self, orders: impl IntoIterator<Item = BookOrder>) {
        for order in orders {
            self.add(order);
        }
    }

    // =================================================================
    // Extremum search
    // =================================================================

    /// First index at or after `start` whose group holds an `XToY` order.
    ///
    /// Groups are sorted highest price first, so this is the highest-priced
    /// buy level not above `start`.
    #[must_use]
    pub fn highest_price_x_to_y_order_group_index(&self, start: usize) -> Option<usize> {
        self.groups
            .iter()
            .enumerate()
            .skip(start)
            .find(|(_, group)| group.has_x_to_y())
            .map(|(i, _)| i)
    }

    /// Last index at or before `start` whose group holds a `YToX` order,
    /// i.e. the lowest-priced sell level. `start` past the end is clamped.
    #[must_use]
    pub fn lowest_price_y_to_x_order_group_index(&self, start: usize) -> Option<usize> {
        let end = start.saturating_add(1).min(self.groups.len());
        self.groups[..end]
            .iter()
            .rposition(OrderGroup::has_y_to_x)
    }

    // =================================================================
    // Queries
    // =================================================================

    #[must_use]
    pub fn groups(&self) -> &[OrderGroup] {
        &self.groups
    }

    pub fn groups_mut(&mut self) -> &mut [OrderGroup] {
        &mut self.groups
    }

    #[must_use]
    pub fn group(&self, index: usize) -> Option<&OrderGroup> {
        self.groups.get(index)
    }

    /// Group prices, highest first.
    #[must_use]
    pub fn prices(&self) -> Vec<Decimal> {
        self.groups.iter().map(|g| g.price).collect()
    }

    /// Number of price levels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of orders across all levels.
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.groups.iter().map(OrderGroup::len).sum()
    }

    /// Iterate every order, level by level, `XToY` before `YToX`.
    pub fn orders(&self) -> impl Iterator<Item = &BookOrder> {
        self.groups
            .iter()
            .flat_map(|g| g.x_to_y_orders.iter().chain(g.y_to_x_orders.iter()))
    }
}

impl fmt::Display for OrderBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "+-----buy------+----------price-----------+-----sell-----+")?;
        for group in &self.groups {
            writeln!(
                f,
                "| {:>12} | {:>24} | {:<12} |",
                group.x_to_y_amount(),
                group.price.to_string(),
                group.y_to_x_amount(),
            )?;
        }
        write!(f, "+--------------+--------------------------+--------------+")
    }
}
