//! Fractional order keys.
//!
//! A key is a non-empty string over a 62-digit alphabet read as a base-62
//! fraction in (0, 1). The alphabet is listed in ASCII order, so plain string
//! comparison of canonical keys matches numeric comparison of the fractions.
//! Canonical keys never end in the zero digit.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::OrderKeyError;

/// Digit alphabet in ascending ASCII order.
pub const DIGITS: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

pub const BASE: u32 = 62;

/// Longest key length the spacing arithmetic can handle (62^20 fits in u128).
pub const KEY_LEN_LIMIT: usize = 20;

/// Key handed out for the first entry of an empty container.
pub const BASELINE: &str = "V";

fn digit_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'A'..=b'Z' => Some(byte - b'A' + 10),
        b'a'..=b'z' => Some(byte - b'a' + 36),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderKey(String);

impl OrderKey {
    pub fn parse(s: &str) -> Result<Self, OrderKeyError> {
        if s.is_empty() {
            return Err(OrderKeyError::Empty);
        }
        for (index, ch) in s.chars().enumerate() {
            if !ch.is_ascii() || digit_value(ch as u8).is_none() {
                return Err(OrderKeyError::InvalidDigit { ch, index });
            }
        }
        if s.ends_with('0') {
            return Err(OrderKeyError::TrailingZero(s.to_string()));
        }
        Ok(OrderKey(s.to_string()))
    }

    pub fn baseline() -> Self {
        OrderKey(BASELINE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Digit values, most significant first.
    fn digits(&self) -> Vec<u8> {
        self.0.bytes().filter_map(digit_value).collect()
    }

    /// Build a key from digit values, dropping trailing zeros.
    ///
    /// Returns `None` for an all-zero digit string, which is not a valid key.
    fn from_digits(mut digits: Vec<u8>) -> Option<Self> {
        while digits.last() == Some(&0) {
            digits.pop();
        }
        if digits.is_empty() {
            return None;
        }
        let s = digits.iter().map(|&d| DIGITS[d as usize] as char).collect();
        Some(OrderKey(s))
    }

    /// The key truncated to `len` digits, as an integer count of 62^-len units.
    fn units(&self, len: usize) -> u128 {
        let digits = self.digits();
        (0..len).fold(0u128, |acc, i| {
            acc * BASE as u128 + digits.get(i).copied().unwrap_or(0) as u128
        })
    }

    fn from_units(units: u128, len: usize) -> Option<Self> {
        let mut digits = vec![0u8; len];
        let mut rest = units;
        for slot in digits.iter_mut().rev() {
            *slot = (rest % BASE as u128) as u8;
            rest /= BASE as u128;
        }
        if rest != 0 {
            return None;
        }
        Self::from_digits(digits)
    }
}

impl PartialOrd for OrderKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.as_bytes().cmp(other.0.as_bytes())
    }
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for OrderKey {
    type Err = OrderKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderKey::parse(s)
    }
}

impl TryFrom<String> for OrderKey {
    type Error = OrderKeyError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        OrderKey::parse(&s)
    }
}

impl From<OrderKey> for String {
    fn from(key: OrderKey) -> Self {
        key.0
    }
}

/// Shortest key strictly between `lo` and `hi`.
///
/// Open bounds stand for 0 (`lo`) and 1 (`hi`). Returns `None` when no key of
/// at most `max_len` digits fits, including when the bounds are equal or out
/// of order.
pub fn midpoint(lo: Option<&OrderKey>, hi: Option<&OrderKey>, max_len: usize) -> Option<OrderKey> {
    if let (Some(lo), Some(hi)) = (lo, hi) {
        if lo >= hi {
            return None;
        }
    }
    let lo_digits = lo.map(OrderKey::digits).unwrap_or_default();
    let hi_digits = hi.map(OrderKey::digits);
    let digits = midpoint_digits(&lo_digits, hi_digits.as_deref())?;
    if digits.len() > max_len {
        return None;
    }
    OrderKey::from_digits(digits)
}

fn midpoint_digits(lo: &[u8], hi: Option<&[u8]>) -> Option<Vec<u8>> {
    if let Some(hi) = hi {
        // Skip the shared prefix, reading `lo` as zero-padded.
        let shared = hi
            .iter()
            .enumerate()
            .take_while(|&(i, &d)| lo.get(i).copied().unwrap_or(0) == d)
            .count();
        if shared == hi.len() {
            return None;
        }
        if shared > 0 {
            let mut out = hi[..shared].to_vec();
            out.extend(midpoint_digits(lo.get(shared..).unwrap_or(&[]), Some(&hi[shared..]))?);
            return Some(out);
        }
    }

    let lo_first = lo.first().copied().unwrap_or(0) as u32;
    let hi_first = hi.map(|h| h[0] as u32).unwrap_or(BASE);
    if hi_first <= lo_first {
        return None;
    }
    if hi_first - lo_first > 1 {
        return Some(vec![((lo_first + hi_first) / 2) as u8]);
    }
    match hi {
        Some(hi) if hi.len() > 1 => Some(vec![hi[0]]),
        _ => {
            let mut out = vec![lo_first as u8];
            out.extend(midpoint_digits(lo.get(1..).unwrap_or(&[]), None)?);
            Some(out)
        }
    }
}

/// Number of `len`-digit steps available strictly inside (`lo`, `hi`).
fn units_between(lo: Option<&OrderKey>, hi: Option<&OrderKey>, len: usize) -> u128 {
    let lo_units = lo.map(|k| k.units(len)).unwrap_or(0);
    let hi_units = hi
        .map(|k| k.units(len))
        .unwrap_or_else(|| (BASE as u128).pow(len as u32));
    hi_units.saturating_sub(lo_units)
}

/// Shortest key length at which `count` evenly spaced keys fit strictly
/// between `lo` and `hi`, searching lengths up to `max_len`.
pub fn spread_len(
    lo: Option<&OrderKey>,
    hi: Option<&OrderKey>,
    count: usize,
    max_len: usize,
) -> Option<usize> {
    let max_len = max_len.min(KEY_LEN_LIMIT);
    (1..=max_len).find(|&len| units_between(lo, hi, len) > count as u128)
}

/// `count` evenly spaced keys of at most `len` digits strictly between `lo`
/// and `hi`.
///
/// Neighbouring keys are at least one `len`-digit step apart, and the first
/// and last key are at least one step away from the bounds. Callers must pick
/// `len` with [`spread_len`]; an unusable `len` yields an empty vector.
pub fn spread(lo: Option<&OrderKey>, hi: Option<&OrderKey>, count: usize, len: usize) -> Vec<OrderKey> {
    let len = len.min(KEY_LEN_LIMIT);
    let lo_units = lo.map(|k| k.units(len)).unwrap_or(0);
    let step = units_between(lo, hi, len) / (count as u128 + 1);
    if step == 0 {
        return Vec::new();
    }
    (1..=count as u128)
        .filter_map(|i| OrderKey::from_units(lo_units + step * i, len))
        .collect()
}
