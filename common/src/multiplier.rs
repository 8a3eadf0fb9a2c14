//! [`Multiplier`]-related definitions.

use std::str::FromStr;

use derive_more::Display;
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;

/// Fraction in `(0, 1]` range to scale an amount down by.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Multiplier(Decimal);

impl Multiplier {
    /// [`Multiplier`] leaving an amount unchanged.
    pub const ONE: Self = Self(Decimal::ONE);

    /// Creates a new [`Multiplier`] by checking the provided value is
    /// greater than `0` and not greater than `1`.
    #[must_use]
    pub fn new(val: Decimal) -> Option<Self> {
        (val > Decimal::ZERO && val <= Decimal::ONE).then_some(Self(val))
    }

    /// Creates a new [`Multiplier`] without performing any validation.
    ///
    /// # Safety
    ///
    /// The provided value must be greater than `0` and not greater than `1`.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub const unsafe fn new_unchecked(val: Decimal) -> Self {
        Self(val)
    }

    /// Returns the underlying value of this [`Multiplier`].
    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }
}

impl FromStr for Multiplier {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s)
            .ok()
            .and_then(Self::new)
            .ok_or("multiplier must be a decimal in (0, 1] range")
    }
}

#[cfg(feature = "juniper")]
mod juniper {
    //! Module providing integration with [`juniper`] crate.

    use std::str::FromStr as _;

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// Decimal fraction in `(0, 1]` range, like `0.85`.
    #[graphql_scalar(with = Self, parse_token(String))]
    type Multiplier = super::Multiplier;

    impl Multiplier {
        fn to_output<S: ScalarValue>(m: &Multiplier) -> Value<S> {
            Value::scalar(m.to_string())
        }

        fn from_input<S: ScalarValue>(
            input: &InputValue<S>,
        ) -> Result<Self, String> {
            input
                .as_string_value()
                .ok_or_else(|| {
                    format!(
                        "Cannot parse `Multiplier` input scalar from \
                         non-string value: {input}",
                    )
                })
                .and_then(|s| {
                    Self::from_str(s).map_err(|e| {
                        format!("Cannot parse `Multiplier` input scalar: {e}")
                    })
                })
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use super::Multiplier;

    #[test]
    fn accepts_fractions_up_to_one() {
        assert!(Multiplier::from_str("1").is_ok());
        assert!(Multiplier::from_str("1.00").is_ok());
        assert!(Multiplier::from_str("0.85").is_ok());
        assert!(Multiplier::from_str("0.0001").is_ok());
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(Multiplier::from_str("0").is_err());
        assert!(Multiplier::from_str("-0.5").is_err());
        assert!(Multiplier::from_str("1.01").is_err());
        assert!(Multiplier::from_str("85%").is_err());
    }
}
