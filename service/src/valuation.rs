//! Trade-in valuation engine.
//!
//! Pure computations of a [`Quote`] and of a customer payment, free of any
//! I/O, so they are shared by the [`Command`]s and [`Query`]s and may be run
//! on the caller's side as well.
//!
//! [`Command`]: crate::Command
//! [`Query`]: crate::Query

use std::str::FromStr as _;

use common::{
    money::{ArithmeticError, Currency},
    Money,
};
use derive_more::{Display, Error};

use crate::domain::{condition, damage, device, price, Device, Price, Quote};

/// Input of the [`compute_quote()`] function describing the inspected
/// [`Device`].
#[derive(Clone, Debug)]
pub struct Inspection<'a> {
    /// [`Device`] being valued.
    pub device: Device,

    /// [IMEI] of the [`Device`], if provided.
    ///
    /// [IMEI]: device::Imei
    pub imei: Option<device::Imei>,

    /// Raw condition rating, one of `excellent`, `good`, `fair` or `poor`
    /// (case-insensitive).
    pub condition: &'a str,

    /// [`condition::Description`] of the [`Device`], if provided.
    pub condition_description: Option<condition::Description>,

    /// Damage [`damage::Deduction`]s found on the [`Device`].
    pub deductions: Vec<damage::Deduction>,

    /// Manually entered base price replacing the one of the [`Price`]
    /// schedule.
    pub base_price_override: Option<Money>,
}

/// Computes a [`Quote`] for the provided [`Inspection`].
///
/// The base price is taken from the `base_price_override`, if any, or from
/// the `schedule` otherwise, which must be active. The [`condition::Rating`]
/// multiplier is taken from the `schedule`, if any, or from the `fallback`
/// multipliers otherwise.
///
/// The result is `max(0, round(base * multiplier) - sum(deductions))`, rounded
/// to the minor unit of the base price [`Currency`]. The base price is
/// multiplied as provided, so it's rounded only once.
///
/// # Errors
///
/// With a [`ValidationError`] if the [`Inspection`] cannot be valued.
pub fn compute_quote(
    schedule: Option<&Price>,
    inspection: Inspection<'_>,
    fallback: &price::ConditionMultipliers,
) -> Result<Quote, ValidationError> {
    use ValidationError as E;

    let Inspection {
        device,
        imei,
        condition,
        condition_description,
        deductions,
        base_price_override,
    } = inspection;

    let condition = condition::Rating::from_str(condition.trim())
        .map_err(|_| E::InvalidCondition(condition.to_owned()))?;

    let base_price = match (base_price_override, schedule) {
        (Some(price), _) => price,
        (None, Some(s)) if s.is_active => s.base_price,
        (None, _) => return Err(E::MissingPrice),
    };
    if base_price.is_negative() {
        return Err(E::NegativeBasePrice(base_price));
    }
    let currency = base_price.currency;

    let mut total_deductions = Money::zero(currency);
    for (index, d) in deductions.iter().enumerate() {
        if d.amount.is_negative() {
            return Err(E::InvalidDeduction { index });
        }
        total_deductions = total_deductions.checked_add(d.amount)?;
    }
    let total_deductions = total_deductions.round();

    let multiplier = schedule
        .map_or(fallback, |s| &s.multipliers)
        .get(condition);
    let adjusted_price = base_price.scale(multiplier)?;

    let final_value = adjusted_price
        .checked_sub(total_deductions)?
        .floor_zero()
        .round();

    Ok(Quote {
        device,
        imei,
        condition,
        condition_description,
        base_price,
        multiplier,
        adjusted_price,
        deductions,
        total_deductions,
        final_value,
    })
}

/// Computes the amount a customer pays for a new device on top of the
/// trade-in value.
///
/// The result is signed: a negative amount means the customer is owed the
/// difference.
///
/// # Errors
///
/// - With a [`ValidationError::NegativeNewDevicePrice`] if the new device
///   price is negative.
/// - With a [`ValidationError::CurrencyMismatch`] if the amounts are in
///   different [`Currency`]s.
/// - With a [`ValidationError::Overflow`] if the difference is out of range.
pub fn compute_customer_payment(
    new_device_price: Money,
    final_trade_in_value: Money,
) -> Result<Money, ValidationError> {
    if new_device_price.is_negative() {
        return Err(ValidationError::NegativeNewDevicePrice(new_device_price));
    }
    Ok(new_device_price.checked_sub(final_trade_in_value)?.round())
}

/// Checks the provided resale price of a traded-in device valued in the
/// provided [`Currency`], rounding it to the minor unit.
///
/// # Errors
///
/// - With a [`ValidationError::NegativeResalePrice`] if the price is
///   negative.
/// - With a [`ValidationError::CurrencyMismatch`] if the price is in another
///   [`Currency`].
pub fn check_resale_price(
    resale_price: Money,
    currency: Currency,
) -> Result<Money, ValidationError> {
    if resale_price.is_negative() {
        return Err(ValidationError::NegativeResalePrice(resale_price));
    }
    if resale_price.currency != currency {
        return Err(ValidationError::CurrencyMismatch {
            expected: currency,
            found: resale_price.currency,
        });
    }
    Ok(resale_price.round())
}

/// Error of a trade-in valuation input.
#[derive(Clone, Debug, Display, Error, Eq, PartialEq)]
pub enum ValidationError {
    /// Amounts in different [`Currency`]s are mixed.
    #[display("expected amount in `{expected}`, found `{found}`")]
    CurrencyMismatch {
        /// [`Currency`] the amount was expected in.
        #[error(not(source))]
        expected: Currency,

        /// [`Currency`] the amount is in.
        #[error(not(source))]
        found: Currency,
    },

    /// Condition rating is none of the known ones.
    #[display("`{_0}` is not a valid condition rating")]
    InvalidCondition(#[error(not(source))] String),

    /// Damage deduction amount is negative.
    #[display("deduction #{index} has a negative amount")]
    InvalidDeduction {
        /// Index of the offending [`damage::Deduction`].
        #[error(not(source))]
        index: usize,
    },

    /// Neither a base price override nor an active [`Price`] schedule is
    /// provided.
    #[display("no base price: neither an override nor an active schedule")]
    MissingPrice,

    /// Base price is negative.
    #[display("base price `{_0}` is negative")]
    NegativeBasePrice(#[error(not(source))] Money),

    /// New device price is negative.
    #[display("new device price `{_0}` is negative")]
    NegativeNewDevicePrice(#[error(not(source))] Money),

    /// Resale price is negative.
    #[display("resale price `{_0}` is negative")]
    NegativeResalePrice(#[error(not(source))] Money),

    /// Amount is out of the representable range.
    #[display("amount is out of range")]
    Overflow,
}

impl From<ArithmeticError> for ValidationError {
    fn from(e: ArithmeticError) -> Self {
        match e {
            ArithmeticError::CurrencyMismatch { expected, found } => {
                Self::CurrencyMismatch { expected, found }
            }
            ArithmeticError::Overflow => Self::Overflow,
        }
    }
}

#[cfg(test)]
mod spec {
    use common::{money::Currency, DateTime, Money, Multiplier};
    use rust_decimal::Decimal;

    use crate::domain::{damage, device, price, Device, Price};

    use super::{
        check_resale_price, compute_customer_payment, compute_quote,
        Inspection, ValidationError,
    };

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn tzs(s: &str) -> Money {
        Money {
            amount: decimal(s),
            currency: Currency::Tzs,
        }
    }

    fn multipliers(
        e: &str,
        g: &str,
        f: &str,
        p: &str,
    ) -> price::ConditionMultipliers {
        let m = |s: &str| Multiplier::new(decimal(s)).unwrap();
        price::ConditionMultipliers {
            excellent: m(e),
            good: m(g),
            fair: m(f),
            poor: m(p),
        }
    }

    fn defaults() -> price::ConditionMultipliers {
        multipliers("1", "0.85", "0.7", "0.5")
    }

    fn device() -> Device {
        Device {
            name: device::Name::new("iPhone 12").unwrap(),
            model: device::Model::new("A2403").unwrap(),
        }
    }

    fn schedule(base: &str) -> Price {
        Price {
            id: price::Id::new(),
            device: device(),
            base_price: tzs(base),
            multipliers: multipliers("1", "0.75", "0.5", "0.3"),
            is_active: true,
            notes: None,
            created_at: DateTime::now().coerce(),
            updated_at: DateTime::now().coerce(),
        }
    }

    fn deduction(amount: Money) -> damage::Deduction {
        damage::Deduction {
            description: damage::Description::new("Cracked screen").unwrap(),
            amount,
            spare_part_id: None,
        }
    }

    fn inspection<'a>(
        condition: &'a str,
        deductions: &[Money],
        base_price_override: Option<Money>,
    ) -> Inspection<'a> {
        Inspection {
            device: device(),
            imei: None,
            condition,
            condition_description: None,
            deductions: deductions.iter().copied().map(deduction).collect(),
            base_price_override,
        }
    }

    #[test]
    fn values_good_device_with_damage() {
        let s = schedule("500000");

        let quote = compute_quote(
            Some(&s),
            inspection("good", &[tzs("20000")], None),
            &defaults(),
        )
        .unwrap();

        assert_eq!(quote.base_price, tzs("500000"));
        assert_eq!(quote.multiplier, s.multipliers.good);
        assert_eq!(quote.adjusted_price, tzs("375000"));
        assert_eq!(quote.total_deductions, tzs("20000"));
        assert_eq!(quote.final_value, tzs("355000"));
    }

    #[test]
    fn never_values_below_zero() {
        let s = schedule("200000");

        let quote = compute_quote(
            Some(&s),
            inspection("poor", &[tzs("100000")], None),
            &defaults(),
        )
        .unwrap();

        assert_eq!(quote.adjusted_price, tzs("60000"));
        assert_eq!(quote.final_value, tzs("0"));
        assert!(!quote.final_value.is_negative());
    }

    #[test]
    fn no_deductions_give_adjusted_price() {
        let s = schedule("123457");
        for (condition, expected) in [
            ("excellent", "123457"),
            ("good", "92592.75"),
            ("fair", "61728.5"),
            ("poor", "37037.1"),
        ] {
            let quote = compute_quote(
                Some(&s),
                inspection(condition, &[], None),
                &defaults(),
            )
            .unwrap();

            assert_eq!(quote.final_value, tzs(expected), "{condition}");
            assert_eq!(quote.final_value, quote.adjusted_price, "{condition}");
        }
    }

    #[test]
    fn rounds_half_up() {
        let s = schedule("0.10");

        // 0.10 * 0.75 = 0.075
        let quote =
            compute_quote(Some(&s), inspection("good", &[], None), &defaults())
                .unwrap();

        assert_eq!(quote.final_value, tzs("0.08"));
    }

    #[test]
    fn rounds_base_price_only_once() {
        let s = Price {
            multipliers: multipliers("1", "0.5", "0.5", "0.3"),
            ..schedule("10.005")
        };

        // 10.005 * 0.5 = 5.0025, while round(10.005) * 0.5 = 5.005
        let quote =
            compute_quote(Some(&s), inspection("good", &[], None), &defaults())
                .unwrap();

        assert_eq!(quote.base_price, tzs("10.005"));
        assert_eq!(quote.adjusted_price, tzs("5.00"));
        assert_eq!(quote.final_value, tzs("5.00"));

        let quote = compute_quote(
            None,
            inspection("poor", &[], Some(tzs("10.005"))),
            &defaults(),
        )
        .unwrap();

        assert_eq!(quote.final_value, tzs("5.00"));
    }

    #[test]
    fn is_monotonic_in_deductions() {
        let s = schedule("500000");

        let mut previous = None;
        for amount in (0..=60).map(|i| tzs(&(i * 10_000).to_string())) {
            let quote = compute_quote(
                Some(&s),
                inspection("fair", &[tzs("1000"), amount], None),
                &defaults(),
            )
            .unwrap();

            if let Some(prev) = previous {
                assert!(quote.final_value.amount <= prev, "at {amount}");
            }
            previous = Some(quote.final_value.amount);
        }
        assert_eq!(previous, Some(Decimal::ZERO));
    }

    #[test]
    fn override_replaces_base_price_only() {
        let s = schedule("500000");

        let quote = compute_quote(
            Some(&s),
            inspection("good", &[], Some(tzs("400000"))),
            &defaults(),
        )
        .unwrap();

        assert_eq!(quote.base_price, tzs("400000"));
        assert_eq!(quote.final_value, tzs("300000"));
    }

    #[test]
    fn override_without_schedule_uses_fallback_multipliers() {
        let quote = compute_quote(
            None,
            inspection("Good", &[tzs("5000")], Some(tzs("100000"))),
            &defaults(),
        )
        .unwrap();

        assert_eq!(quote.multiplier, defaults().good);
        assert_eq!(quote.final_value, tzs("80000"));
    }

    #[test]
    fn override_works_for_inactive_schedule() {
        let mut s = schedule("500000");
        s.is_active = false;

        let quote = compute_quote(
            Some(&s),
            inspection("excellent", &[], Some(tzs("1000"))),
            &defaults(),
        )
        .unwrap();

        assert_eq!(quote.final_value, tzs("1000"));
    }

    #[test]
    fn requires_price() {
        assert_eq!(
            compute_quote(None, inspection("good", &[], None), &defaults())
                .unwrap_err(),
            ValidationError::MissingPrice,
        );

        let mut s = schedule("500000");
        s.is_active = false;
        assert_eq!(
            compute_quote(Some(&s), inspection("good", &[], None), &defaults())
                .unwrap_err(),
            ValidationError::MissingPrice,
        );
    }

    #[test]
    fn parses_condition_case_insensitively() {
        let s = schedule("1000");

        for raw in ["EXCELLENT", "Excellent", "excellent", " excellent "] {
            assert!(
                compute_quote(Some(&s), inspection(raw, &[], None), &defaults())
                    .is_ok(),
                "{raw}",
            );
        }

        assert_eq!(
            compute_quote(Some(&s), inspection("mint", &[], None), &defaults())
                .unwrap_err(),
            ValidationError::InvalidCondition("mint".into()),
        );
        assert!(matches!(
            compute_quote(Some(&s), inspection("", &[], None), &defaults()),
            Err(ValidationError::InvalidCondition(_)),
        ));
    }

    #[test]
    fn rejects_negative_deduction() {
        let s = schedule("1000");

        assert_eq!(
            compute_quote(
                Some(&s),
                inspection("good", &[tzs("10"), tzs("0"), tzs("-1")], None),
                &defaults(),
            )
            .unwrap_err(),
            ValidationError::InvalidDeduction { index: 2 },
        );
    }

    #[test]
    fn rejects_negative_base_price() {
        assert!(matches!(
            compute_quote(
                None,
                inspection("good", &[], Some(tzs("-1"))),
                &defaults(),
            ),
            Err(ValidationError::NegativeBasePrice(_)),
        ));
    }

    #[test]
    fn rejects_deduction_in_other_currency() {
        let s = schedule("1000");
        let usd = Money {
            amount: decimal("10"),
            currency: Currency::Usd,
        };

        assert_eq!(
            compute_quote(
                Some(&s),
                inspection("good", &[usd], None),
                &defaults(),
            )
            .unwrap_err(),
            ValidationError::CurrencyMismatch {
                expected: Currency::Tzs,
                found: Currency::Usd,
            },
        );
    }

    #[test]
    fn rejects_overflowing_deductions() {
        let s = schedule("1000");
        let max = Money {
            amount: Decimal::MAX,
            currency: Currency::Tzs,
        };

        assert_eq!(
            compute_quote(
                Some(&s),
                inspection("good", &[max, max], None),
                &defaults(),
            )
            .unwrap_err(),
            ValidationError::Overflow,
        );

        let quote =
            compute_quote(Some(&s), inspection("good", &[max], None), &defaults())
                .unwrap();
        assert_eq!(quote.final_value, tzs("0"));
    }

    #[test]
    fn computes_customer_payment() {
        assert_eq!(
            compute_customer_payment(tzs("1200000"), tzs("355000")),
            Ok(tzs("845000")),
        );
        assert_eq!(
            compute_customer_payment(tzs("300000"), tzs("340000")),
            Ok(tzs("-40000")),
        );
        assert_eq!(
            compute_customer_payment(tzs("355000"), tzs("355000")),
            Ok(tzs("0")),
        );

        let usd = Money {
            amount: decimal("10"),
            currency: Currency::Usd,
        };
        assert!(matches!(
            compute_customer_payment(usd, tzs("1")),
            Err(ValidationError::CurrencyMismatch { .. }),
        ));

        let max = Money {
            amount: Decimal::MAX,
            currency: Currency::Tzs,
        };
        assert_eq!(
            compute_customer_payment(max, tzs("-1")),
            Err(ValidationError::Overflow),
        );
    }

    #[test]
    fn rejects_negative_new_device_price() {
        assert_eq!(
            compute_customer_payment(tzs("-0.01"), tzs("355000")),
            Err(ValidationError::NegativeNewDevicePrice(tzs("-0.01"))),
        );
        assert_eq!(
            compute_customer_payment(tzs("0"), tzs("355000")),
            Ok(tzs("-355000")),
        );
    }

    #[test]
    fn checks_resale_price() {
        assert_eq!(
            check_resale_price(tzs("420000.005"), Currency::Tzs),
            Ok(tzs("420000.01")),
        );
        assert_eq!(
            check_resale_price(tzs("-1"), Currency::Tzs),
            Err(ValidationError::NegativeResalePrice(tzs("-1"))),
        );
        assert_eq!(
            check_resale_price(tzs("1"), Currency::Usd),
            Err(ValidationError::CurrencyMismatch {
                expected: Currency::Usd,
                found: Currency::Tzs,
            }),
        );
    }
}
