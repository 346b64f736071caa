//! Cross-node determinism.
//!
//! Two independent engines fed the same messages in the same blocks must
//! end every block with byte-identical stores, identical balances and
//! identical trade roots.

use std::time::Duration;

use batchdex_keeper::abci::{begin_block, end_block};
use batchdex_keeper::{BankLedger, BatchReport, Keeper, Ledger};
use batchdex_store::MemStore;
use batchdex_types::*;
use chrono::TimeZone;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

const USERS: usize = 6;

fn user(i: usize) -> Address {
    Address::new(format!("dex1user{i}"))
}

#[derive(Debug, Clone)]
enum Msg {
    Order {
        who: usize,
        direction: SwapDirection,
        price: Decimal,
        amount: Amount,
        lifespan: Duration,
    },
    Cancel {
        who: usize,
        order_id: u64,
    },
    Deposit {
        who: usize,
        x: Amount,
        y: Amount,
    },
    Withdraw {
        who: usize,
        pool_coin: Amount,
    },
}

fn random_block(rng: &mut StdRng, orders_so_far: u64) -> Vec<Msg> {
    let mut msgs = Vec::new();
    for _ in 0..rng.gen_range(0..12) {
        let who = rng.gen_range(0..USERS);
        let msg = match rng.gen_range(0..10) {
            0..=6 => Msg::Order {
                who,
                direction: if rng.gen_bool(0.5) {
                    SwapDirection::XToY
                } else {
                    SwapDirection::YToX
                },
                price: Decimal::new(rng.gen_range(90..=110), 2),
                amount: rng.gen_range(1..50_000),
                lifespan: Duration::from_secs(rng.gen_range(0..60)),
            },
            7 => Msg::Cancel {
                who,
                order_id: rng.gen_range(1..=orders_so_far.max(1)),
            },
            8 => Msg::Deposit {
                who,
                x: rng.gen_range(1..200_000),
                y: rng.gen_range(1..200_000),
            },
            _ => Msg::Withdraw {
                who,
                pool_coin: rng.gen_range(1..1_000_000_000),
            },
        };
        msgs.push(msg);
    }
    msgs
}

struct Node {
    keeper: Keeper<MemStore, BankLedger>,
    ctx: BlockContext,
}

impl Node {
    fn genesis() -> Self {
        let mut ledger = BankLedger::new();
        for i in 0..USERS {
            ledger
                .mint_coins(
                    &user(i),
                    &[
                        Coin::new("denom1", 100_000_000),
                        Coin::new("denom2", 100_000_000),
                    ],
                )
                .unwrap();
        }
        let mut keeper = Keeper::new(MemStore::new(), ledger, Params::default());
        let pair = keeper.create_pair(&user(0), "denom1", "denom2").unwrap();
        keeper
            .create_pool(
                &user(0),
                pair.id,
                &[Coin::new("denom1", 10_000_000), Coin::new("denom2", 10_000_000)],
            )
            .unwrap();
        let t0 = chrono::Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap();
        Self {
            keeper,
            ctx: BlockContext::new(1, t0),
        }
    }

    /// Deliver a message; rejected messages are part of the script too.
    fn deliver(&mut self, msg: &Msg) {
        let ctx = self.ctx;
        let pair_id = PairId(1);
        let pool_id = PoolId(1);
        let _ = match *msg {
            Msg::Order {
                who,
                direction,
                price,
                amount,
                lifespan,
            } => self
                .keeper
                .limit_order(&ctx, &user(who), pair_id, direction, price, amount, lifespan)
                .map(|_| ()),
            Msg::Cancel { who, order_id } => {
                self.keeper
                    .cancel_order(&user(who), pair_id, OrderId(order_id))
            }
            Msg::Deposit { who, x, y } => self
                .keeper
                .deposit(
                    &ctx,
                    &user(who),
                    pool_id,
                    &[Coin::new("denom1", x), Coin::new("denom2", y)],
                )
                .map(|_| ()),
            Msg::Withdraw { who, pool_coin } => self
                .keeper
                .withdraw(&ctx, &user(who), pool_id, Coin::new("pool1", pool_coin))
                .map(|_| ()),
        };
    }

    fn run_block(&mut self, msgs: &[Msg]) -> BatchReport {
        begin_block(&mut self.keeper, &self.ctx);
        for msg in msgs {
            self.deliver(msg);
        }
        let report = end_block(&mut self.keeper, &self.ctx);
        self.ctx = self.ctx.next(5);
        report
    }
}

#[test]
fn independent_nodes_agree_block_by_block() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();

    let mut rng = StdRng::seed_from_u64(42);
    let mut a = Node::genesis();
    let mut b = Node::genesis();
    assert_eq!(a.keeper.store().root_hash(), b.keeper.store().root_hash());

    let mut total_trades = 0;
    for _ in 0..40 {
        let last_order_id = a.keeper.pair(PairId(1)).unwrap().last_order_id.0;
        let msgs = random_block(&mut rng, last_order_id);

        let report_a = a.run_block(&msgs);
        let report_b = b.run_block(&msgs);
        total_trades += report_a.trades;

        assert_eq!(report_a, report_b);
        assert_eq!(
            a.keeper.store().root_hash_hex(),
            b.keeper.store().root_hash_hex()
        );
        assert_eq!(a.keeper.ledger(), b.keeper.ledger());
        a.keeper.ledger().verify_supply().unwrap();
    }
    assert!(total_trades > 0, "script should produce trades");
}

#[test]
fn different_scripts_diverge() {
    let mut a = Node::genesis();
    let mut b = Node::genesis();
    let buy = Msg::Order {
        who: 1,
        direction: SwapDirection::XToY,
        price: Decimal::new(101, 2),
        amount: 1_000,
        lifespan: Duration::from_secs(30),
    };
    let sell = Msg::Order {
        who: 2,
        direction: SwapDirection::YToX,
        price: Decimal::new(99, 2),
        amount: 1_000,
        lifespan: Duration::from_secs(30),
    };
    a.run_block(&[buy.clone(), sell.clone()]);
    b.run_block(&[sell, buy]);
    assert_ne!(a.keeper.store().root_hash(), b.keeper.store().root_hash());
}

#[test]
fn message_order_decides_fifo_priority() {
    let sell = |who| Msg::Order {
        who,
        direction: SwapDirection::YToX,
        price: Decimal::ONE,
        amount: 500,
        lifespan: Duration::from_secs(30),
    };
    let buy = Msg::Order {
        who: 3,
        direction: SwapDirection::XToY,
        price: Decimal::ONE,
        amount: 500,
        lifespan: Duration::from_secs(30),
    };
    let mut node = Node::genesis();
    // the pool quotes no order at its own price, so only users trade
    node.run_block(&[sell(1), sell(2), buy]);

    let filled = node.keeper.order(PairId(1), OrderId(1)).unwrap();
    let rested = node.keeper.order(PairId(1), OrderId(2)).unwrap();
    assert_eq!(filled.status, OrderStatus::Completed);
    assert_eq!(rested.status, OrderStatus::NotMatched);
    assert_eq!(
        node.keeper.ledger().balance(&user(1), "denom1"),
        100_000_000 + 500
    );
}
