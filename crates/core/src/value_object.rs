//! Value objects: equality by value, not identity.
//!
//! Stock amounts and money are fixed-point: an `i64` count of the smallest
//! step (thousandths of a unit, paise). The store adds and subtracts them as
//! plain integers, so ledger arithmetic is exact. On the wire both are
//! decimal numbers (`2.5`, `450.5`); input is parsed through `rust_decimal`
//! so a value like `0.1` is read as written, not as its nearest binary float.

use core::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::error::{DomainError, DomainResult};

/// `value` as a whole number of `10^-places` steps, or `None` when it has
/// more decimal places than that or does not fit in an `i64`.
fn to_scaled(value: Decimal, places: u32) -> Option<i64> {
    let value = value.normalize();
    if value.scale() > places {
        return None;
    }
    value
        .checked_mul(Decimal::from(10i64.pow(places)))
        .and_then(|scaled| scaled.to_i64())
}

fn fmt_scaled(raw: i64, places: u32, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    write!(f, "{}", Decimal::new(raw, places).normalize())
}

/// Whole amounts go out as JSON integers, fractional ones as JSON numbers.
fn serialize_scaled<S: Serializer>(raw: i64, scale: i64, serializer: S) -> Result<S::Ok, S::Error> {
    if raw % scale == 0 {
        serializer.serialize_i64(raw / scale)
    } else {
        serializer.serialize_f64(raw as f64 / scale as f64)
    }
}

struct DecimalVisitor;

impl de::Visitor<'_> for DecimalVisitor {
    type Value = Decimal;

    fn expecting(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("a decimal number")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Decimal, E> {
        Ok(Decimal::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Decimal, E> {
        Ok(Decimal::from(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Decimal, E> {
        if !v.is_finite() {
            return Err(E::custom("number must be finite"));
        }
        // Shortest round-trip text: `2.5_f64` reads back as exactly 2.5.
        Decimal::from_str(&v.to_string()).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Decimal, E> {
        Decimal::from_str(v.trim()).map_err(E::custom)
    }
}

fn deserialize_decimal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
    deserializer.deserialize_any(DecimalVisitor)
}

/// A signed stock amount with up to three decimal places.
///
/// Item quantities may go below zero (see the negative stock policy), so
/// this type is signed; movement magnitudes use [`Quantity`].
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Units(i64);

impl Units {
    pub const ZERO: Units = Units(0);
    pub const PLACES: u32 = 3;
    pub const SCALE: i64 = 1_000;
    /// Bound on an item's stock level, either side of zero (10^12 units).
    pub const LIMIT: Units = Units(1_000_000_000_000 * Self::SCALE);

    pub const fn from_milli(milli: i64) -> Self {
        Self(milli)
    }

    /// Raw value in thousandths of a unit. This is what the store holds.
    pub const fn milli(self) -> i64 {
        self.0
    }

    pub fn from_decimal(value: Decimal) -> DomainResult<Self> {
        to_scaled(value, Self::PLACES).map(Units).ok_or_else(|| {
            DomainError::validation(format!(
                "quantity {value} is out of range or has more than {} decimal places",
                Self::PLACES
            ))
        })
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn within_limit(self) -> bool {
        self.0.unsigned_abs() <= Self::LIMIT.0.unsigned_abs()
    }

    pub fn checked_add(self, other: Units) -> Option<Units> {
        self.0.checked_add(other.0).map(Units)
    }
}

impl core::ops::Neg for Units {
    type Output = Units;

    fn neg(self) -> Units {
        Units(-self.0)
    }
}

/// Plain addition; callers work with stock levels already bounded by
/// [`Units::LIMIT`] and magnitudes bounded by [`Quantity::MAX`]. Use
/// [`Units::checked_add`] for anything else.
impl core::ops::Add for Units {
    type Output = Units;

    fn add(self, other: Units) -> Units {
        Units(self.0 + other.0)
    }
}

impl core::ops::Sub for Units {
    type Output = Units;

    fn sub(self, other: Units) -> Units {
        Units(self.0 - other.0)
    }
}

impl core::fmt::Display for Units {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        fmt_scaled(self.0, Self::PLACES, f)
    }
}

impl FromStr for Units {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim())
            .map_err(|_| DomainError::validation(format!("'{s}' is not a number")))?;
        Units::from_decimal(value)
    }
}

impl Serialize for Units {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_scaled(self.0, Self::SCALE, serializer)
    }
}

impl<'de> Deserialize<'de> for Units {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = deserialize_decimal(deserializer)?;
        Units::from_decimal(value).map_err(de::Error::custom)
    }
}

/// A strictly positive movement magnitude, at most [`Quantity::MAX`].
///
/// Movements always carry a magnitude; the sign comes from the movement type.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Quantity(Units);

impl Quantity {
    /// Largest single movement (10^9 units).
    pub const MAX: Units = Units(1_000_000_000 * Units::SCALE);

    pub fn new(amount: Units) -> DomainResult<Self> {
        if !amount.is_positive() {
            return Err(DomainError::validation("quantity must be greater than 0"));
        }
        if amount > Self::MAX {
            return Err(DomainError::validation(format!(
                "quantity must be at most {}",
                Self::MAX
            )));
        }
        Ok(Self(amount))
    }

    pub const fn get(self) -> Units {
        self.0
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = Units::deserialize(deserializer)?;
        Quantity::new(amount).map_err(de::Error::custom)
    }
}

/// An amount of money in minor currency units (paise). Decimal rupees on the wire.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);
    const PLACES: u32 = 2;
    const SCALE: i64 = 100;

    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    pub const fn minor(self) -> i64 {
        self.0
    }

    pub fn from_decimal(value: Decimal) -> DomainResult<Self> {
        to_scaled(value, Self::PLACES).map(Money).ok_or_else(|| {
            DomainError::validation(format!(
                "amount {value} is out of range or has more than {} decimal places",
                Self::PLACES
            ))
        })
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// `self * factor`, failing instead of wrapping.
    pub fn checked_mul(self, factor: i64) -> DomainResult<Money> {
        self.0
            .checked_mul(factor)
            .map(Money)
            .ok_or_else(|| DomainError::validation("money amount overflow"))
    }

    pub fn checked_add(self, other: Money) -> DomainResult<Money> {
        self.0
            .checked_add(other.0)
            .map(Money)
            .ok_or_else(|| DomainError::validation("money amount overflow"))
    }

    /// Price of `amount` stock at this unit price, rounded half away from zero
    /// to the nearest paisa.
    pub fn times(self, amount: Units) -> DomainResult<Money> {
        let product = i128::from(self.0) * i128::from(amount.milli());
        let scale = i128::from(Units::SCALE);
        let rounded = (product + product.signum() * (scale / 2)) / scale;
        i64::try_from(rounded)
            .map(Money)
            .map_err(|_| DomainError::validation("money amount overflow"))
    }

    /// Arithmetic mean, rounded half away from zero; zero for no amounts.
    pub fn mean(amounts: impl IntoIterator<Item = Money>) -> Money {
        let (sum, count) = amounts
            .into_iter()
            .fold((0i128, 0i128), |(sum, count), m| (sum + i128::from(m.0), count + 1));
        if count == 0 {
            return Money::ZERO;
        }
        let rounded = (sum + sum.signum() * (count / 2)) / count;
        // A mean lies between the smallest and largest input, so it fits.
        Money(rounded as i64)
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl FromStr for Money {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim())
            .map_err(|_| DomainError::validation(format!("'{s}' is not an amount")))?;
        Money::from_decimal(value)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_scaled(self.0, Self::SCALE, serializer)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = deserialize_decimal(deserializer)?;
        Money::from_decimal(value).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units(s: &str) -> Units {
        s.parse().unwrap()
    }

    #[test]
    fn quantity_must_be_positive() {
        assert!(Quantity::new(units("1")).is_ok());
        assert!(Quantity::new(units("0.001")).is_ok());
        assert!(matches!(Quantity::new(Units::ZERO), Err(DomainError::Validation(_))));
        assert!(matches!(Quantity::new(units("-5")), Err(DomainError::Validation(_))));
    }

    #[test]
    fn quantity_is_bounded() {
        assert!(Quantity::new(Quantity::MAX).is_ok());
        let err = Quantity::new(units("1000000000.001")).unwrap_err();
        assert_eq!(err, DomainError::validation("quantity must be at most 1000000000"));
        assert!(serde_json::from_str::<Quantity>("9223372036854775807").is_err());
    }

    #[test]
    fn fractional_quantities_are_read_exactly() {
        let q: Quantity = serde_json::from_str("2.5").unwrap();
        assert_eq!(q.get(), Units::from_milli(2_500));
        let tenth: Units = serde_json::from_str("0.1").unwrap();
        assert_eq!(tenth.milli(), 100);
        let text: Units = serde_json::from_str("\"12.125\"").unwrap();
        assert_eq!(text.milli(), 12_125);
        assert!(serde_json::from_str::<Quantity>("0").is_err());
    }

    #[test]
    fn extra_precision_is_rejected_not_rounded() {
        assert!(serde_json::from_str::<Units>("1.0005").is_err());
        assert!("0.0001".parse::<Units>().is_err());
        // Trailing zeros do not count as precision.
        assert_eq!(units("1.500").milli(), 1_500);
    }

    #[test]
    fn units_serialize_as_decimal_numbers() {
        assert_eq!(serde_json::to_string(&Units::from_milli(150_000)).unwrap(), "150");
        assert_eq!(serde_json::to_string(&Units::from_milli(2_500)).unwrap(), "2.5");
        assert_eq!(serde_json::to_string(&Units::from_milli(-15_250)).unwrap(), "-15.25");
        assert_eq!(Units::from_milli(-2_500).to_string(), "-2.5");
    }

    #[test]
    fn money_displays_minor_units() {
        assert_eq!(Money::from_minor(45_050).to_string(), "450.50");
        assert_eq!(Money::from_minor(-7).to_string(), "-0.07");
    }

    #[test]
    fn money_travels_as_decimal_rupees() {
        let m: Money = serde_json::from_str("450.5").unwrap();
        assert_eq!(m, Money::from_minor(45_050));
        assert_eq!(serde_json::to_string(&m).unwrap(), "450.5");
        assert_eq!(serde_json::to_string(&Money::from_minor(75_000)).unwrap(), "750");
        assert!(serde_json::from_str::<Money>("1.001").is_err());
    }

    #[test]
    fn money_arithmetic_is_checked() {
        assert!(Money::from_minor(i64::MAX).checked_mul(2).is_err());
        assert_eq!(
            Money::from_minor(250).checked_add(Money::from_minor(50)).unwrap(),
            Money::from_minor(300)
        );
        assert!(Money::from_minor(i64::MAX).times(Quantity::MAX).is_err());
    }

    #[test]
    fn pricing_fractional_stock_rounds_to_the_paisa() {
        // 2.5 m at 120.00 per m.
        assert_eq!(Money::from_minor(12_000).times(units("2.5")).unwrap(), Money::from_minor(30_000));
        // 0.333 m at 0.05: 1.665 paise rounds up.
        assert_eq!(Money::from_minor(5).times(units("0.333")).unwrap(), Money::from_minor(2));
        assert_eq!(Money::from_minor(5).times(units("-0.333")).unwrap(), Money::from_minor(-2));
    }

    #[test]
    fn mean_of_amounts() {
        assert_eq!(Money::mean(core::iter::empty()), Money::ZERO);
        let amounts = [250, 100, 50].map(Money::from_minor);
        assert_eq!(Money::mean(amounts), Money::from_minor(133));
        assert_eq!(Money::mean([Money::from_minor(1), Money::from_minor(2)]), Money::from_minor(2));
    }
}
