//! Currency amounts
//!
//! Amounts are counted in hastings; 10^24 hastings make one siacoin (SC).

use super::encoding::{Decoder, EncodingError, Encoder, SiaDecode, SiaEncode};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Hastings per siacoin
pub const HASTINGS_PER_SC: u128 = 1_000_000_000_000_000_000_000_000;

/// Decimal places in one siacoin
const SC_DECIMALS: usize = 24;

/// Currency parse errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CurrencyError {
    #[error("invalid amount: {0:?}")]
    InvalidAmount(String),
    #[error("amount overflows")]
    Overflow,
}

/// An amount of hastings
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Currency(pub u128);

impl Currency {
    pub const ZERO: Currency = Currency(0);

    pub const fn new(hastings: u128) -> Self {
        Self(hastings)
    }

    /// Whole siacoins
    ///
    /// Any `u32` count fits in hastings; larger amounts go through
    /// [`Currency::parse_sc`].
    pub const fn siacoins(sc: u32) -> Self {
        Self(sc as u128 * HASTINGS_PER_SC)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Currency) -> Option<Currency> {
        self.0.checked_add(other.0).map(Currency)
    }

    pub fn checked_sub(self, other: Currency) -> Option<Currency> {
        self.0.checked_sub(other.0).map(Currency)
    }

    pub fn saturating_add(self, other: Currency) -> Currency {
        Currency(self.0.saturating_add(other.0))
    }

    /// Parse a siacoin amount
    ///
    /// Accepts decimals (`"12.5"`), scientific notation (`"1.5e3"`) and
    /// fractions (`"1/3"`). Anything finer than one hasting is truncated.
    pub fn parse_sc(s: &str) -> Result<Self, CurrencyError> {
        let s = s.trim();
        let invalid = || CurrencyError::InvalidAmount(s.to_string());
        let unsigned = s.strip_prefix('+').unwrap_or(s);

        let hastings = match unsigned.split_once('/') {
            Some((num, den)) => {
                let num = parse_digits(num).ok_or_else(invalid)??;
                let den = parse_digits(den).ok_or_else(invalid)??;
                if den == 0 {
                    return Err(invalid());
                }
                fraction_hastings(num, den)
            }
            None => {
                let is_exponent = |c: char| c == 'e' || c == 'E';
                let (mantissa, exponent) = match unsigned.split_once(is_exponent) {
                    Some((m, e)) => (m, e.parse::<i32>().map_err(|_| invalid())?),
                    None => (unsigned, 0),
                };
                let (whole, frac) = mantissa.split_once('.').unwrap_or((mantissa, ""));
                let all_digits = |p: &str| p.chars().all(|c| c.is_ascii_digit());
                if (whole.is_empty() && frac.is_empty()) || !all_digits(whole) || !all_digits(frac)
                {
                    return Err(invalid());
                }
                let scale = i64::from(exponent) + SC_DECIMALS as i64 - frac.len() as i64;
                scaled_hastings(&format!("{}{}", whole, frac), scale)
            }
        };
        hastings.map(Currency).ok_or(CurrencyError::Overflow)
    }

    /// Render as siacoins, trimming trailing zeros, e.g. `"95 SC"`
    pub fn human_string(&self) -> String {
        let whole = self.0 / HASTINGS_PER_SC;
        let frac = self.0 % HASTINGS_PER_SC;
        if frac == 0 {
            return format!("{} SC", whole);
        }
        let frac = format!("{:024}", frac);
        format!("{}.{} SC", whole, frac.trim_end_matches('0'))
    }
}

/// Parse a non-empty run of ASCII digits; the inner error is overflow
fn parse_digits(s: &str) -> Option<Result<u128, CurrencyError>> {
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(s.parse::<u128>().map_err(|_| CurrencyError::Overflow))
}

/// `num / den` siacoins in hastings, rounded down
fn fraction_hastings(num: u128, den: u128) -> Option<u128> {
    let mut hastings = (num / den).checked_mul(HASTINGS_PER_SC)?;
    let mut rem = num % den;
    let mut unit = HASTINGS_PER_SC;
    while unit > 1 {
        unit /= 10;
        rem = rem.checked_mul(10)?;
        hastings = hastings.checked_add(rem / den * unit)?;
        rem %= den;
    }
    Some(hastings)
}

/// `digits * 10^scale`, dropping digits shifted below one
fn scaled_hastings(digits: &str, scale: i64) -> Option<u128> {
    let digits = digits.trim_start_matches('0');
    let digits = if scale < 0 {
        let drop = usize::try_from(scale.unsigned_abs()).unwrap_or(usize::MAX);
        &digits[..digits.len().saturating_sub(drop)]
    } else {
        digits
    };
    if digits.is_empty() {
        return Some(0);
    }
    let value: u128 = digits.parse().ok()?;
    let shift = u32::try_from(scale.max(0)).ok()?;
    value.checked_mul(10u128.checked_pow(shift)?)
}

impl std::iter::Sum for Currency {
    fn sum<I: Iterator<Item = Currency>>(iter: I) -> Self {
        iter.fold(Currency::ZERO, Currency::saturating_add)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Currency({})", self.0)
    }
}

impl FromStr for Currency {
    type Err = CurrencyError;

    /// Parse a decimal number of hastings
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(CurrencyError::InvalidAmount(s.to_string()));
        }
        s.parse::<u128>()
            .map(Currency)
            .map_err(|_| CurrencyError::Overflow)
    }
}

impl Serialize for Currency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Currency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

impl SiaEncode for Currency {
    /// Big-endian bytes with no leading zeros, length-prefixed
    fn encode(&self, e: &mut Encoder) {
        let bytes = self.0.to_be_bytes();
        let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
        e.write_prefixed(&bytes[start..]);
    }
}

impl SiaDecode for Currency {
    fn decode(d: &mut Decoder<'_>) -> Result<Self, EncodingError> {
        let bytes = d.read_prefixed()?;
        let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
        let significant = &bytes[start..];
        if significant.len() > 16 {
            return Err(EncodingError::LengthTooLarge(bytes.len() as u64));
        }
        let mut buf = [0u8; 16];
        buf[16 - significant.len()..].copy_from_slice(significant);
        Ok(Currency(u128::from_be_bytes(buf)))
    }
}
