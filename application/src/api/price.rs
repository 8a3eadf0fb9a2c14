//! [`Price`]-related definitions.

use common::{DateTime, Money, Multiplier};
use derive_more::{AsRef, Display, From, Into};
use juniper::{graphql_object, GraphQLInputObject, GraphQLObject, GraphQLScalar};
use service::domain;
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    Context,
};

/// Trade-in price schedule of a device.
#[derive(Clone, Debug, From)]
pub struct Price(domain::Price);

/// Trade-in price schedule of a device.
#[graphql_object(name = "TradeInPrice", context = Context)]
impl Price {
    /// Unique identifier of this `TradeInPrice`.
    #[must_use]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// Name of the device this `TradeInPrice` is for.
    #[must_use]
    pub fn device_name(&self) -> api::device::Name {
        self.0.device.name.clone().into()
    }

    /// Model of the device this `TradeInPrice` is for.
    #[must_use]
    pub fn device_model(&self) -> api::device::Model {
        self.0.device.model.clone().into()
    }

    /// Price of the device in an excellent condition.
    #[must_use]
    pub fn base_price(&self) -> Money {
        self.0.base_price
    }

    /// Multipliers applied to the `basePrice` for each condition.
    #[must_use]
    pub fn multipliers(&self) -> ConditionMultipliers {
        self.0.multipliers.into()
    }

    /// Indicator whether this `TradeInPrice` is used for valuation.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.0.is_active
    }

    /// Internal notes of this `TradeInPrice`.
    #[must_use]
    pub fn notes(&self) -> Option<Notes> {
        self.0.notes.clone().map(Into::into)
    }

    /// `DateTime` when this `TradeInPrice` was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }

    /// `DateTime` when this `TradeInPrice` was last modified.
    #[must_use]
    pub fn updated_at(&self) -> DateTime {
        self.0.updated_at.coerce()
    }
}

/// Unique identifier of a `TradeInPrice`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::price::Id)]
#[into(domain::price::Id)]
#[graphql(name = "TradeInPriceId", transparent)]
pub struct Id(Uuid);

/// Internal notes of a `TradeInPrice`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "TradeInPriceNotes",
    with = scalar::Via::<domain::price::Notes>,
)]
pub struct Notes(domain::price::Notes);

/// Multipliers of a base price for each device condition.
#[derive(Clone, Copy, Debug, GraphQLObject)]
#[graphql(name = "ConditionMultipliers")]
pub struct ConditionMultipliers {
    /// Multiplier for an `EXCELLENT` condition.
    pub excellent: Multiplier,

    /// Multiplier for a `GOOD` condition.
    pub good: Multiplier,

    /// Multiplier for a `FAIR` condition.
    pub fair: Multiplier,

    /// Multiplier for a `POOR` condition.
    pub poor: Multiplier,

    /// Indicator whether the multipliers don't grow as the condition worsens.
    ///
    /// Non-monotonic multipliers are accepted, but value a worse device
    /// higher.
    pub is_monotonic: bool,
}

impl From<domain::price::ConditionMultipliers> for ConditionMultipliers {
    fn from(m: domain::price::ConditionMultipliers) -> Self {
        let is_monotonic = m.is_monotonic();
        let domain::price::ConditionMultipliers {
            excellent,
            good,
            fair,
            poor,
        } = m;
        Self {
            excellent,
            good,
            fair,
            poor,
            is_monotonic,
        }
    }
}

/// Multipliers of a base price for each device condition.
#[derive(Clone, Copy, Debug, GraphQLInputObject)]
#[graphql(name = "ConditionMultipliersInput")]
pub struct ConditionMultipliersInput {
    /// Multiplier for an `EXCELLENT` condition.
    pub excellent: Multiplier,

    /// Multiplier for a `GOOD` condition.
    pub good: Multiplier,

    /// Multiplier for a `FAIR` condition.
    pub fair: Multiplier,

    /// Multiplier for a `POOR` condition.
    pub poor: Multiplier,
}

impl From<ConditionMultipliersInput> for domain::price::ConditionMultipliers {
    fn from(m: ConditionMultipliersInput) -> Self {
        let ConditionMultipliersInput {
            excellent,
            good,
            fair,
            poor,
        } = m;
        Self {
            excellent,
            good,
            fair,
            poor,
        }
    }
}
