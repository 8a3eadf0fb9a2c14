//! [`Money`]-related definitions.

use std::{fmt, str::FromStr};

use derive_more::{Display, Error};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::{define_kind, Multiplier};

/// Amount of money in some [`Currency`].
///
/// The amount is signed: a negative [`Money`] represents a debt.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Money {
    /// Amount of this [`Money`].
    pub amount: Decimal,

    /// [`Currency`] of this amount.
    pub currency: Currency,
}

impl Money {
    /// Creates a zero [`Money`] in the provided [`Currency`].
    #[must_use]
    pub const fn zero(currency: Currency) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    /// Indicates whether this [`Money`] is less than zero.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }

    /// Rounds this [`Money`] to the minor unit of its [`Currency`].
    ///
    /// Midpoint is rounded away from zero (half-up).
    #[must_use]
    pub fn round(self) -> Self {
        Self {
            amount: self.amount.round_dp_with_strategy(
                self.currency.minor_units(),
                RoundingStrategy::MidpointAwayFromZero,
            ),
            currency: self.currency,
        }
    }

    /// Multiplies this [`Money`] by the provided [`Multiplier`], rounding the
    /// result to the minor unit of its [`Currency`].
    ///
    /// # Errors
    ///
    /// With an [`ArithmeticError::Overflow`] if the result doesn't fit.
    pub fn scale(self, by: Multiplier) -> Result<Self, ArithmeticError> {
        self.amount
            .checked_mul(by.value())
            .map(|amount| {
                Self {
                    amount,
                    currency: self.currency,
                }
                .round()
            })
            .ok_or(ArithmeticError::Overflow)
    }

    /// Adds the `other` [`Money`] to this one.
    ///
    /// # Errors
    ///
    /// If the [`Currency`]s differ, or the sum doesn't fit.
    pub fn checked_add(self, other: Self) -> Result<Self, ArithmeticError> {
        self.ensure_same_currency(other)?;
        self.amount
            .checked_add(other.amount)
            .map(|amount| Self {
                amount,
                currency: self.currency,
            })
            .ok_or(ArithmeticError::Overflow)
    }

    /// Subtracts the `other` [`Money`] from this one.
    ///
    /// # Errors
    ///
    /// If the [`Currency`]s differ, or the difference doesn't fit.
    pub fn checked_sub(self, other: Self) -> Result<Self, ArithmeticError> {
        self.ensure_same_currency(other)?;
        self.amount
            .checked_sub(other.amount)
            .map(|amount| Self {
                amount,
                currency: self.currency,
            })
            .ok_or(ArithmeticError::Overflow)
    }

    /// Checks that the `other` [`Money`] is in the same [`Currency`].
    fn ensure_same_currency(self, other: Self) -> Result<(), ArithmeticError> {
        if self.currency == other.currency {
            Ok(())
        } else {
            Err(ArithmeticError::CurrencyMismatch {
                expected: self.currency,
                found: other.currency,
            })
        }
    }

    /// Clamps this [`Money`] to be not less than zero.
    #[must_use]
    pub fn floor_zero(self) -> Self {
        if self.is_negative() {
            Self::zero(self.currency)
        } else {
            self
        }
    }

    /// Returns a human-readable rendering of this [`Money`], intended for
    /// display purposes only.
    #[must_use]
    pub fn formatted(&self) -> Formatted {
        Formatted(self.round())
    }
}

/// Error of an arithmetic operation over [`Money`].
#[derive(Clone, Copy, Debug, Display, Eq, Error, PartialEq)]
pub enum ArithmeticError {
    /// Amounts are in different [`Currency`]s.
    #[display("expected amount in `{expected}`, found `{found}`")]
    CurrencyMismatch {
        /// [`Currency`] the amount was expected in.
        #[error(not(source))]
        expected: Currency,

        /// [`Currency`] the amount is in.
        #[error(not(source))]
        found: Currency,
    },

    /// Result is out of the representable range.
    #[display("amount is out of range")]
    Overflow,
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { amount, currency } = self;
        write!(f, "{}{currency}", amount.normalize())
    }
}

impl FromStr for Money {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() < 4 || !s.is_char_boundary(s.len() - 3) {
            return Err("too short");
        }

        let (amount, currency) = s.split_at(s.len() - 3);
        let amount = Decimal::from_str(amount).map_err(|_| "invalid amount")?;
        let currency =
            Currency::from_str(currency).map_err(|_| "invalid currency")?;

        Ok(Self { amount, currency })
    }
}

define_kind! {
    #[doc = "Currency of a [`Money`] amount."]
    enum Currency {
        #[doc = "US Dollar."]
        Usd = 1,

        #[doc = "Euro."]
        Eur = 2,

        #[doc = "Tanzanian Shilling."]
        Tzs = 3,

        #[doc = "Kenyan Shilling."]
        Kes = 4,

        #[doc = "Japanese Yen."]
        Jpy = 5,
    }
}

impl Currency {
    /// Returns the number of decimal digits in the minor unit of this
    /// [`Currency`], as defined by ISO 4217.
    #[must_use]
    pub const fn minor_units(self) -> u32 {
        match self {
            Self::Usd | Self::Eur | Self::Tzs | Self::Kes => 2,
            Self::Jpy => 0,
        }
    }
}

/// Display-only rendering of a [`Money`] amount, like `TZS 1,200,000.00`.
#[derive(Clone, Copy, Debug)]
pub struct Formatted(Money);

impl fmt::Display for Formatted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Money { amount, currency } = self.0;
        let dp = currency.minor_units();

        let digits = format!("{:.*}", dp as usize, amount.abs());
        let (int, frac) =
            digits.split_once('.').unwrap_or((digits.as_str(), ""));

        let sign = if self.0.is_negative() { "-" } else { "" };
        write!(f, "{currency} {sign}")?;
        for (i, c) in int.chars().enumerate() {
            if i > 0 && (int.len() - i) % 3 == 0 {
                f.write_str(",")?;
            }
            write!(f, "{c}")?;
        }
        if !frac.is_empty() {
            write!(f, ".{frac}")?;
        }
        Ok(())
    }
}

#[cfg(feature = "juniper")]
mod juniper {
    //! Module providing integration with [`juniper`] crate.

    use std::str::FromStr as _;

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// Money in `{amount}{currency}` format, where:
    /// - `amount` is a decimal number, optionally signed;
    /// - `currency` is a three-letter currency code.
    #[graphql_scalar(with = Self, parse_token(String))]
    type Money = super::Money;

    impl Money {
        fn to_output<S: ScalarValue>(m: &Money) -> Value<S> {
            Value::scalar(m.to_string())
        }

        fn from_input<S: ScalarValue>(
            input: &InputValue<S>,
        ) -> Result<Self, String> {
            input
                .as_string_value()
                .ok_or_else(|| {
                    format!(
                        "Cannot parse `Money` input scalar from \
                         non-string value: {input}",
                    )
                })
                .and_then(|s| {
                    Self::from_str(s).map_err(|e| {
                        format!("Cannot parse `Money` input scalar: {e}")
                    })
                })
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use crate::Multiplier;

    use super::{ArithmeticError, Currency, Money};

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn tzs(s: &str) -> Money {
        Money {
            amount: decimal(s),
            currency: Currency::Tzs,
        }
    }

    #[test]
    fn from_str() {
        assert_eq!(Money::from_str("123.45TZS").unwrap(), tzs("123.45"));
        assert_eq!(
            Money::from_str("-40000USD").unwrap(),
            Money {
                amount: decimal("-40000"),
                currency: Currency::Usd,
            },
        );
        assert_eq!(Money::from_str("10tzs").unwrap(), tzs("10"));

        assert!(Money::from_str("123.45").is_err());
        assert!(Money::from_str("123.45Tz").is_err());
        assert!(Money::from_str("123.45Shilling").is_err());
        assert!(Money::from_str("TZS").is_err());
    }

    #[test]
    fn to_string() {
        assert_eq!(tzs("123.45").to_string(), "123.45TZS");
        assert_eq!(tzs("123.00").to_string(), "123TZS");
        assert_eq!(tzs("355000").to_string(), "355000TZS");
        assert_eq!(tzs("-40000.50").to_string(), "-40000.5TZS");
    }

    #[test]
    fn rounds_half_up_to_minor_units() {
        assert_eq!(tzs("10.005").round(), tzs("10.01"));
        assert_eq!(tzs("10.004").round(), tzs("10"));
        assert_eq!(tzs("-10.005").round(), tzs("-10.01"));

        let yen = Money {
            amount: decimal("99.5"),
            currency: Currency::Jpy,
        };
        assert_eq!(yen.round().amount, decimal("100"));
    }

    #[test]
    fn scales_by_multiplier() {
        let m = Multiplier::new(decimal("0.75")).unwrap();
        assert_eq!(tzs("500000").scale(m), Ok(tzs("375000")));

        let m = Multiplier::new(decimal("0.333")).unwrap();
        assert_eq!(tzs("100.05").scale(m), Ok(tzs("33.32")));

        // 10.005 * 0.5 = 5.0025
        let m = Multiplier::new(decimal("0.5")).unwrap();
        assert_eq!(tzs("10.005").scale(m), Ok(tzs("5")));
    }

    #[test]
    fn arithmetic_requires_same_currency() {
        assert_eq!(
            tzs("1200000").checked_sub(tzs("355000")),
            Ok(tzs("845000")),
        );
        assert_eq!(tzs("1").checked_add(tzs("2")), Ok(tzs("3")));

        let usd = Money::zero(Currency::Usd);
        let mismatch = Err(ArithmeticError::CurrencyMismatch {
            expected: Currency::Tzs,
            found: Currency::Usd,
        });
        assert_eq!(tzs("1").checked_sub(usd), mismatch);
        assert_eq!(tzs("1").checked_add(usd), mismatch);
    }

    #[test]
    fn arithmetic_detects_overflow() {
        let max = Money {
            amount: Decimal::MAX,
            currency: Currency::Tzs,
        };
        let min = Money {
            amount: Decimal::MIN,
            currency: Currency::Tzs,
        };

        assert_eq!(max.checked_add(max), Err(ArithmeticError::Overflow));
        assert_eq!(min.checked_sub(max), Err(ArithmeticError::Overflow));
        assert_eq!(max.checked_sub(max), Ok(Money::zero(Currency::Tzs)));
        assert_eq!(max.scale(Multiplier::ONE), Ok(max));
    }

    #[test]
    fn floors_at_zero() {
        assert_eq!(tzs("-40000").floor_zero(), Money::zero(Currency::Tzs));
        assert_eq!(tzs("5").floor_zero(), tzs("5"));
        assert!(!Money::zero(Currency::Tzs).is_negative());
        assert!(!tzs("-0").is_negative());
    }

    #[test]
    fn formats_for_display() {
        assert_eq!(
            tzs("1200000").formatted().to_string(),
            "TZS 1,200,000.00",
        );
        assert_eq!(tzs("845000.5").formatted().to_string(), "TZS 845,000.50");
        assert_eq!(tzs("-40000").formatted().to_string(), "TZS -40,000.00");
        assert_eq!(tzs("999").formatted().to_string(), "TZS 999.00");
        assert_eq!(
            Money {
                amount: decimal("1234567"),
                currency: Currency::Jpy,
            }
            .formatted()
            .to_string(),
            "JPY 1,234,567",
        );
    }
}
