//! Book orders and the groups that hold them.
//!
//! Orders at the same price share one [`OrderGroup`], split by direction.
//! Each direction keeps insertion order (FIFO), which is the fill priority
//! inside a price level.

use batchdex_types::{Address, Amount, Order, OrderSource, PoolId, SwapDirection};
use rust_decimal::Decimal;

/// An order as seen by the matcher: a persisted limit order or a
/// synthetic pool order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookOrder {
    pub source: OrderSource,
    /// Account that pays and receives coins for this order.
    pub orderer: Address,
    pub direction: SwapDirection,
    pub price: Decimal,
    /// Amount of Y available when the book was built.
    pub amount: Amount,
    /// Amount of Y still unmatched in this batch.
    pub open_amount: Amount,
}

impl BookOrder {
    #[must_use]
    pub fn new(
        source: OrderSource,
        orderer: Address,
        direction: SwapDirection,
        price: Decimal,
        amount: Amount,
    ) -> Self {
        Self {
            source,
            orderer,
            direction,
            price,
            amount,
            open_amount: amount,
        }
    }

    /// Book entry for the open part of a persisted order.
    #[must_use]
    pub fn from_order(order: &Order) -> Self {
        Self::new(
            OrderSource::User(order.id),
            order.orderer.clone(),
            order.direction,
            order.price,
            order.open_amount,
        )
    }

    /// Synthetic order of a pool.
    #[must_use]
    pub fn from_pool(
        pool_id: PoolId,
        reserve_address: Address,
        direction: SwapDirection,
        price: Decimal,
        amount: Amount,
    ) -> Self {
        Self::new(OrderSource::Pool(pool_id), reserve_address, direction, price, amount)
    }

    /// Amount matched so far in this batch.
    #[must_use]
    pub fn matched_amount(&self) -> Amount {
        self.amount - self.open_amount
    }
}

/// All book orders of one pair sharing one exact price.
#[derive(Debug, Clone)]
pub struct OrderGroup {
    pub price: Decimal,
    pub x_to_y_orders: Vec<BookOrder>,
    pub y_to_x_orders: Vec<BookOrder>,
}

impl OrderGroup {
    /// A group holding a single order.
    #[must_use]
    pub fn new(order: BookOrder) -> Self {
        let mut group = Self {
            price: order.price,
            x_to_y_orders: Vec::new(),
            y_to_x_orders: Vec::new(),
        };
        group.push(order);
        group
    }

    /// Append an order to its direction's list.
    pub fn push(&mut self, order: BookOrder) {
        match order.direction {
            SwapDirection::XToY => self.x_to_y_orders.push(order),
            SwapDirection::YToX => self.y_to_x_orders.push(order),
        }
    }

    #[must_use]
    pub fn orders(&self, direction: SwapDirection) -> &[BookOrder] {
        match direction {
            SwapDirection::XToY => &self.x_to_y_orders,
            SwapDirection::YToX => &self.y_to_x_orders,
        }
    }

    pub fn orders_mut(&mut self, direction: SwapDirection) -> &mut [BookOrder] {
        match direction {
            SwapDirection::XToY => &mut self.x_to_y_orders,
            SwapDirection::YToX => &mut self.y_to_x_orders,
        }
    }

    /// Total amount of the group's `XToY` orders.
    #[must_use]
    pub fn x_to_y_amount(&self) -> Amount {
        self.x_to_y_orders.iter().map(|o| o.amount).sum()
    }

    /// Total amount of the group's `YToX` orders.
    #[must_use]
    pub fn y_to_x_amount(&self) -> Amount {
        self.y_to_x_orders.iter().map(|o| o.amount).sum()
    }

    #[must_use]
    pub fn has_x_to_y(&self) -> bool {
        !self.x_to_y_orders.is_empty()
    }

    #[must_use]
    pub fn has_y_to_x(&self) -> bool {
        !self.y_to_x_orders.is_empty()
    }

    /// Number of orders in the group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.x_to_y_orders.len() + self.y_to_x_orders.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use batchdex_types::OrderId;

    use super::*;

    fn make_order(id: u64, direction: SwapDirection, amount: Amount) -> BookOrder {
        BookOrder::new(
            OrderSource::User(OrderId(id)),
            Address::new(format!("dex1user{id}")),
            direction,
            Decimal::new(100, 0),
            amount,
        )
    }

    #[test]
    fn push_keeps_fifo_per_direction() {
        let mut group = OrderGroup::new(make_order(1, SwapDirection::XToY, 5));
        group.push(make_order(2, SwapDirection::YToX, 3));
        group.push(make_order(3, SwapDirection::XToY, 7));

        let ids: Vec<OrderSource> = group.x_to_y_orders.iter().map(|o| o.source).collect();
        assert_eq!(
            ids,
            vec![OrderSource::User(OrderId(1)), OrderSource::User(OrderId(3))]
        );
        assert_eq!(group.y_to_x_orders.len(), 1);
        assert_eq!(group.len(), 3);
    }

    #[test]
    fn amounts_aggregate_by_direction() {
        let mut group = OrderGroup::new(make_order(1, SwapDirection::XToY, 5));
        group.push(make_order(2, SwapDirection::XToY, 7));
        group.push(make_order(3, SwapDirection::YToX, 3));
        assert_eq!(group.x_to_y_amount(), 12);
        assert_eq!(group.y_to_x_amount(), 3);
    }

    #[test]
    fn single_direction_group() {
        let group = OrderGroup::new(make_order(1, SwapDirection::YToX, 4));
        assert!(!group.has_x_to_y());
        assert!(group.has_y_to_x());
        assert_eq!(group.x_to_y_amount(), 0);
        assert!(group.orders(SwapDirection::XToY).is_empty());
    }

    #[test]
    fn from_order_uses_open_amount() {
        let mut order = Order::dummy(9, SwapDirection::YToX, Decimal::new(2, 0), 10);
        order.open_amount = 6;
        let book_order = BookOrder::from_order(&order);
        assert_eq!(book_order.amount, 6);
        assert_eq!(book_order.open_amount, 6);
        assert_eq!(book_order.matched_amount(), 0);
        assert_eq!(book_order.source, OrderSource::User(OrderId(9)));
    }
}
