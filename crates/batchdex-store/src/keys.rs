//! Deterministic binary key layout.
//!
//! Every key is a one-byte namespace prefix followed by big-endian `u64`
//! ids and length-prefixed string segments. Lexicographic key order is then
//! the same as ascending id order, so prefix iteration visits pairs, pools,
//! requests and orders in a reproducible order on every node.
//!
//! | prefix | key                                                        | value           |
//! |--------|------------------------------------------------------------|-----------------|
//! | `0xa0` | last pair id                                               | u64             |
//! | `0xa1` | last pool id                                               | u64             |
//! | `0xa5` | `pair`                                                     | Pair            |
//! | `0xa6` | `len x, x, len y, y`                                       | pair id         |
//! | `0xa7` | `len a, a, len b, b, pair` (both orientations)             | empty           |
//! | `0xab` | `pool`                                                     | Pool            |
//! | `0xac` | `len addr, addr`                                           | pool id         |
//! | `0xad` | `pair, pool`                                               | empty           |
//! | `0xb0` | `pool, req`                                                | DepositRequest  |
//! | `0xb1` | `pool, req`                                                | WithdrawRequest |
//! | `0xb2` | `pair, order`                                              | Order           |
//! | `0xb3` | `len orderer, orderer, len t, t(expire_at), pair, order`   | empty           |

use batchdex_types::{Address, DexError, OrderId, PairId, PoolId, RequestId, Result};
use chrono::{DateTime, NaiveDateTime, Utc};

pub const LAST_PAIR_ID_KEY: &[u8] = &[0xa0];
pub const LAST_POOL_ID_KEY: &[u8] = &[0xa1];

pub const PAIR_KEY_PREFIX: u8 = 0xa5;
pub const PAIR_INDEX_KEY_PREFIX: u8 = 0xa6;
pub const PAIR_LOOKUP_INDEX_KEY_PREFIX: u8 = 0xa7;
pub const POOL_KEY_PREFIX: u8 = 0xab;
pub const POOL_BY_RESERVE_ADDRESS_INDEX_KEY_PREFIX: u8 = 0xac;
pub const POOLS_BY_PAIR_INDEX_KEY_PREFIX: u8 = 0xad;
pub const DEPOSIT_REQUEST_KEY_PREFIX: u8 = 0xb0;
pub const WITHDRAW_REQUEST_KEY_PREFIX: u8 = 0xb1;
pub const ORDER_KEY_PREFIX: u8 = 0xb2;
pub const ORDER_INDEX_KEY_PREFIX: u8 = 0xb3;

/// Fixed-width timestamp layout used inside keys.
pub const KEY_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.9f";

fn malformed(reason: impl Into<String>) -> DexError {
    DexError::MalformedKey {
        reason: reason.into(),
    }
}

/// Append `segment` preceded by its one-byte length.
pub fn push_length_prefixed(key: &mut Vec<u8>, segment: &[u8]) -> Result<()> {
    let len = u8::try_from(segment.len())
        .map_err(|_| malformed(format!("segment of {} bytes is too long", segment.len())))?;
    key.push(len);
    key.extend_from_slice(segment);
    Ok(())
}

fn with_prefix(prefix: u8, capacity: usize) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + capacity);
    key.push(prefix);
    key
}

/// Render a timestamp in the fixed-width key layout.
#[must_use]
pub fn format_key_time(time: DateTime<Utc>) -> String {
    time.format(KEY_TIME_FORMAT).to_string()
}

pub fn parse_key_time(raw: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, KEY_TIME_FORMAT)
        .map(|t| t.and_utc())
        .map_err(|e| malformed(format!("bad timestamp {raw:?}: {e}")))
}

/// Cursor over the segments of a key.
#[derive(Debug)]
pub struct KeyReader<'a> {
    rest: &'a [u8],
}

impl<'a> KeyReader<'a> {
    /// Start reading `key`, which must begin with `prefix`.
    pub fn new(key: &'a [u8], prefix: u8) -> Result<Self> {
        match key.split_first() {
            Some((first, rest)) if *first == prefix => Ok(Self { rest }),
            _ => Err(malformed(format!("expected prefix {prefix:#04x}"))),
        }
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        if self.rest.len() < 8 {
            return Err(malformed("truncated u64 segment"));
        }
        let (head, rest) = self.rest.split_at(8);
        self.rest = rest;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(head);
        Ok(u64::from_be_bytes(raw))
    }

    pub fn read_bytes(&mut self) -> Result<&'a [u8]> {
        let (len, rest) = self
            .rest
            .split_first()
            .ok_or_else(|| malformed("missing length byte"))?;
        let len = usize::from(*len);
        if rest.len() < len {
            return Err(malformed("truncated string segment"));
        }
        let (segment, rest) = rest.split_at(len);
        self.rest = rest;
        Ok(segment)
    }

    pub fn read_string(&mut self) -> Result<String> {
        let bytes = self.read_bytes()?;
        String::from_utf8(bytes.to_vec()).map_err(|e| malformed(format!("invalid utf-8: {e}")))
    }

    /// Bytes not read yet.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.rest.len()
    }

    /// Fail unless the whole key has been read.
    pub fn finish(self) -> Result<()> {
        if self.rest.is_empty() {
            Ok(())
        } else {
            Err(malformed(format!("{} trailing bytes", self.rest.len())))
        }
    }
}

// ---------------------------------------------------------------------------
// Pairs
// ---------------------------------------------------------------------------

#[must_use]
pub fn pair_key(pair_id: PairId) -> Vec<u8> {
    let mut key = with_prefix(PAIR_KEY_PREFIX, 8);
    key.extend_from_slice(&pair_id.0.to_be_bytes());
    key
}

/// Key of the `(x, y)` denomination index of a pair.
pub fn pair_index_key(x_coin_denom: &str, y_coin_denom: &str) -> Result<Vec<u8>> {
    let mut key = with_prefix(PAIR_INDEX_KEY_PREFIX, 2 + x_coin_denom.len() + y_coin_denom.len());
    push_length_prefixed(&mut key, x_coin_denom.as_bytes())?;
    push_length_prefixed(&mut key, y_coin_denom.as_bytes())?;
    Ok(key)
}

/// Lookup index entry; each pair is stored under both orientations.
pub fn pair_lookup_index_key(denom_a: &str, denom_b: &str, pair_id: PairId) -> Result<Vec<u8>> {
    let mut key = pair_lookup_index_key_prefix(denom_a, denom_b)?;
    key.extend_from_slice(&pair_id.0.to_be_bytes());
    Ok(key)
}

/// Prefix of every lookup entry starting with `denom_a`.
pub fn pair_lookup_index_key_prefix_by_denom(denom_a: &str) -> Result<Vec<u8>> {
    let mut key = with_prefix(PAIR_LOOKUP_INDEX_KEY_PREFIX, 1 + denom_a.len());
    push_length_prefixed(&mut key, denom_a.as_bytes())?;
    Ok(key)
}

/// Prefix of every lookup entry for the denomination pair `(a, b)`.
pub fn pair_lookup_index_key_prefix(denom_a: &str, denom_b: &str) -> Result<Vec<u8>> {
    let mut key = pair_lookup_index_key_prefix_by_denom(denom_a)?;
    push_length_prefixed(&mut key, denom_b.as_bytes())?;
    Ok(key)
}

pub fn parse_pair_lookup_index_key(key: &[u8]) -> Result<(String, String, PairId)> {
    let mut reader = KeyReader::new(key, PAIR_LOOKUP_INDEX_KEY_PREFIX)?;
    let denom_a = reader.read_string()?;
    let denom_b = reader.read_string()?;
    let pair_id = PairId(reader.read_u64()?);
    reader.finish()?;
    Ok((denom_a, denom_b, pair_id))
}

// ---------------------------------------------------------------------------
// Pools
// ---------------------------------------------------------------------------

#[must_use]
pub fn pool_key(pool_id: PoolId) -> Vec<u8> {
    let mut key = with_prefix(POOL_KEY_PREFIX, 8);
    key.extend_from_slice(&pool_id.0.to_be_bytes());
    key
}

pub fn pool_by_reserve_address_index_key(reserve_address: &Address) -> Result<Vec<u8>> {
    let mut key = with_prefix(
        POOL_BY_RESERVE_ADDRESS_INDEX_KEY_PREFIX,
        1 + reserve_address.as_bytes().len(),
    );
    push_length_prefixed(&mut key, reserve_address.as_bytes())?;
    Ok(key)
}

#[must_use]
pub fn pools_by_pair_index_key(pair_id: PairId, pool_id: PoolId) -> Vec<u8> {
    let mut key = pools_by_pair_index_key_prefix(pair_id);
    key.extend_from_slice(&pool_id.0.to_be_bytes());
    key
}

#[must_use]
pub fn pools_by_pair_index_key_prefix(pair_id: PairId) -> Vec<u8> {
    let mut key = with_prefix(POOLS_BY_PAIR_INDEX_KEY_PREFIX, 16);
    key.extend_from_slice(&pair_id.0.to_be_bytes());
    key
}

pub fn parse_pools_by_pair_index_key(key: &[u8]) -> Result<PoolId> {
    let mut reader = KeyReader::new(key, POOLS_BY_PAIR_INDEX_KEY_PREFIX)?;
    let _pair_id = reader.read_u64()?;
    let pool_id = PoolId(reader.read_u64()?);
    reader.finish()?;
    Ok(pool_id)
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[must_use]
pub fn deposit_request_key(pool_id: PoolId, request_id: RequestId) -> Vec<u8> {
    let mut key = with_prefix(DEPOSIT_REQUEST_KEY_PREFIX, 16);
    key.extend_from_slice(&pool_id.0.to_be_bytes());
    key.extend_from_slice(&request_id.0.to_be_bytes());
    key
}

#[must_use]
pub fn withdraw_request_key(pool_id: PoolId, request_id: RequestId) -> Vec<u8> {
    let mut key = with_prefix(WITHDRAW_REQUEST_KEY_PREFIX, 16);
    key.extend_from_slice(&pool_id.0.to_be_bytes());
    key.extend_from_slice(&request_id.0.to_be_bytes());
    key
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[must_use]
pub fn order_key(pair_id: PairId, order_id: OrderId) -> Vec<u8> {
    let mut key = order_key_prefix(pair_id);
    key.extend_from_slice(&order_id.0.to_be_bytes());
    key
}

#[must_use]
pub fn order_key_prefix(pair_id: PairId) -> Vec<u8> {
    let mut key = with_prefix(ORDER_KEY_PREFIX, 16);
    key.extend_from_slice(&pair_id.0.to_be_bytes());
    key
}

/// Orderer index entry, ordered by expiration time within an orderer.
pub fn order_index_key(
    orderer: &Address,
    expire_at: DateTime<Utc>,
    pair_id: PairId,
    order_id: OrderId,
) -> Result<Vec<u8>> {
    let mut key = order_index_key_prefix(orderer)?;
    push_length_prefixed(&mut key, format_key_time(expire_at).as_bytes())?;
    key.extend_from_slice(&pair_id.0.to_be_bytes());
    key.extend_from_slice(&order_id.0.to_be_bytes());
    Ok(key)
}

pub fn order_index_key_prefix(orderer: &Address) -> Result<Vec<u8>> {
    let mut key = with_prefix(ORDER_INDEX_KEY_PREFIX, 1 + orderer.as_bytes().len());
    push_length_prefixed(&mut key, orderer.as_bytes())?;
    Ok(key)
}

/// A decoded orderer index entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderIndexEntry {
    pub orderer: Address,
    pub expire_at: DateTime<Utc>,
    pub pair_id: PairId,
    pub order_id: OrderId,
}

pub fn parse_order_index_key(key: &[u8]) -> Result<OrderIndexEntry> {
    let mut reader = KeyReader::new(key, ORDER_INDEX_KEY_PREFIX)?;
    let orderer = Address::new(reader.read_string()?);
    let expire_at = parse_key_time(&reader.read_string()?)?;
    let pair_id = PairId(reader.read_u64()?);
    let order_id = OrderId(reader.read_u64()?);
    reader.finish()?;
    Ok(OrderIndexEntry {
        orderer,
        expire_at,
        pair_id,
        order_id,
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn pair_key_layout() {
        assert_eq!(pair_key(PairId(0)), vec![0xa5, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(pair_key(PairId(9)), vec![0xa5, 0, 0, 0, 0, 0, 0, 0, 0x9]);
        assert_eq!(pair_key(PairId(10)), vec![0xa5, 0, 0, 0, 0, 0, 0, 0, 0xa]);
    }

    #[test]
    fn pool_key_layout() {
        assert_eq!(pool_key(PoolId(1)), vec![0xab, 0, 0, 0, 0, 0, 0, 0, 0x1]);
        assert_eq!(pool_key(PoolId(5)), vec![0xab, 0, 0, 0, 0, 0, 0, 0, 0x5]);
        assert_eq!(pool_key(PoolId(10)), vec![0xab, 0, 0, 0, 0, 0, 0, 0, 0xa]);
    }

    #[test]
    fn pair_lookup_index_key_layout() {
        let cases: [(&str, &str, u64, Vec<u8>); 3] = [
            (
                "denomA",
                "denomB",
                1,
                vec![
                    0xa7, 0x6, 0x64, 0x65, 0x6e, 0x6f, 0x6d, 0x41, 0x6, 0x64, 0x65, 0x6e, 0x6f,
                    0x6d, 0x42, 0x0, 0x0, 0x0, 0x0, 0x0, 0x0, 0x0, 0x1,
                ],
            ),
            (
                "denomC",
                "denomD",
                20,
                vec![
                    0xa7, 0x6, 0x64, 0x65, 0x6e, 0x6f, 0x6d, 0x43, 0x6, 0x64, 0x65, 0x6e, 0x6f,
                    0x6d, 0x44, 0x0, 0x0, 0x0, 0x0, 0x0, 0x0, 0x0, 0x14,
                ],
            ),
            (
                "denomE",
                "denomF",
                13,
                vec![
                    0xa7, 0x6, 0x64, 0x65, 0x6e, 0x6f, 0x6d, 0x45, 0x6, 0x64, 0x65, 0x6e, 0x6f,
                    0x6d, 0x46, 0x0, 0x0, 0x0, 0x0, 0x0, 0x0, 0x0, 0xd,
                ],
            ),
        ];
        for (denom_a, denom_b, pair_id, expected) in cases {
            let key = pair_lookup_index_key(denom_a, denom_b, PairId(pair_id)).unwrap();
            assert_eq!(key, expected);
            let (a, b, id) = parse_pair_lookup_index_key(&key).unwrap();
            assert_eq!(a, denom_a);
            assert_eq!(b, denom_b);
            assert_eq!(id, PairId(pair_id));
        }
    }

    #[test]
    fn pool_by_reserve_address_layout() {
        let key = pool_by_reserve_address_index_key(&Address::new("abc")).unwrap();
        assert_eq!(key, vec![0xac, 0x3, b'a', b'b', b'c']);
    }

    #[test]
    fn pools_by_pair_index_key_layout() {
        let cases = [
            (
                5,
                10,
                vec![0xad, 0, 0, 0, 0, 0, 0, 0, 0x5, 0, 0, 0, 0, 0, 0, 0, 0xa],
            ),
            (
                2,
                7,
                vec![0xad, 0, 0, 0, 0, 0, 0, 0, 0x2, 0, 0, 0, 0, 0, 0, 0, 0x7],
            ),
            (
                3,
                5,
                vec![0xad, 0, 0, 0, 0, 0, 0, 0, 0x3, 0, 0, 0, 0, 0, 0, 0, 0x5],
            ),
        ];
        for (pair_id, pool_id, expected) in cases {
            let key = pools_by_pair_index_key(PairId(pair_id), PoolId(pool_id));
            assert_eq!(key, expected);
            assert_eq!(parse_pools_by_pair_index_key(&key).unwrap(), PoolId(pool_id));
        }
    }

    #[test]
    fn request_keys_sort_by_pool_then_id() {
        let a = deposit_request_key(PoolId(1), RequestId(300));
        let b = deposit_request_key(PoolId(2), RequestId(1));
        assert!(a < b);
        assert_eq!(a[0], DEPOSIT_REQUEST_KEY_PREFIX);
        assert_eq!(withdraw_request_key(PoolId(1), RequestId(1))[0], 0xb1);
        assert_eq!(withdraw_request_key(PoolId(1), RequestId(1)).len(), 17);
    }

    #[test]
    fn order_keys_sort_numerically() {
        assert!(order_key(PairId(1), OrderId(9)) < order_key(PairId(1), OrderId(10)));
        assert!(order_key(PairId(1), OrderId(u64::MAX)) < order_key(PairId(2), OrderId(0)));
        assert!(order_key(PairId(3), OrderId(1)).starts_with(&order_key_prefix(PairId(3))));
    }

    #[test]
    fn order_index_key_roundtrip() {
        let orderer = Address::new("dex1orderer");
        let expire_at = Utc.with_ymd_and_hms(2022, 1, 1, 9, 0, 0).unwrap();
        let key = order_index_key(&orderer, expire_at, PairId(2), OrderId(7)).unwrap();
        assert!(key.starts_with(&order_index_key_prefix(&orderer).unwrap()));

        let entry = parse_order_index_key(&key).unwrap();
        assert_eq!(entry.orderer, orderer);
        assert_eq!(entry.expire_at, expire_at);
        assert_eq!(entry.pair_id, PairId(2));
        assert_eq!(entry.order_id, OrderId(7));
    }

    #[test]
    fn key_time_is_fixed_width_and_ordered() {
        let early = Utc.with_ymd_and_hms(2022, 1, 1, 9, 0, 0).unwrap();
        let late = early + chrono::Duration::nanoseconds(1_500);
        assert_eq!(format_key_time(early), "2022-01-01T09:00:00.000000000");
        assert_eq!(format_key_time(late), "2022-01-01T09:00:00.000001500");
        assert!(format_key_time(early) < format_key_time(late));
        assert_eq!(parse_key_time(&format_key_time(late)).unwrap(), late);
    }

    #[test]
    fn malformed_keys_are_rejected() {
        assert!(parse_pools_by_pair_index_key(&[0xad, 0, 0]).is_err());
        assert!(parse_pools_by_pair_index_key(&pair_key(PairId(1))).is_err());
        let mut key = pair_lookup_index_key("a", "b", PairId(1)).unwrap();
        key.push(0);
        assert!(matches!(
            parse_pair_lookup_index_key(&key),
            Err(DexError::MalformedKey { .. })
        ));
    }

    #[test]
    fn oversized_segments_are_rejected() {
        let long = "d".repeat(256);
        assert!(pair_index_key(&long, "denom").is_err());
        assert!(pair_index_key(&"d".repeat(255), "denom").is_ok());
    }
}
