//! [`Quote`] definitions.

use common::{Money, Multiplier};

use crate::domain::{condition, damage, device, Device};
#[cfg(doc)]
use crate::domain::{Price, Transaction};

/// Valuation of a traded-in [`Device`].
///
/// Once a [`Transaction`] is created, its [`Quote`] is frozen and is not
/// affected by any later [`Price`] changes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Quote {
    /// [`Device`] being valued.
    pub device: Device,

    /// [IMEI] of the [`Device`], if provided.
    ///
    /// [IMEI]: device::Imei
    pub imei: Option<device::Imei>,

    /// [`condition::Rating`] of the [`Device`].
    pub condition: condition::Rating,

    /// [`condition::Description`] of the [`Device`], if provided.
    pub condition_description: Option<condition::Description>,

    /// Base price the valuation started from.
    pub base_price: Money,

    /// [`Multiplier`] applied to the `base_price`.
    pub multiplier: Multiplier,

    /// `base_price` scaled by the `multiplier`.
    pub adjusted_price: Money,

    /// Damage [`damage::Deduction`]s, in the order they were reported.
    pub deductions: Vec<damage::Deduction>,

    /// Sum of all the `deductions`.
    pub total_deductions: Money,

    /// Final trade-in value of the [`Device`].
    ///
    /// Never negative.
    pub final_value: Money,
}
