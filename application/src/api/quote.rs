//! [`Quote`]-related definitions.

use common::{Money, Multiplier};
use derive_more::{AsRef, Display, From, Into};
use juniper::{graphql_object, GraphQLInputObject, GraphQLScalar};
use service::{domain, query};
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    Context,
};

/// Valuation of an inspected device.
#[derive(Clone, Debug, From, Into)]
pub struct Quote(domain::Quote);

/// Valuation of an inspected device.
#[graphql_object(name = "TradeInQuote", context = Context)]
impl Quote {
    /// Name of the valued device.
    #[must_use]
    pub fn device_name(&self) -> api::device::Name {
        self.0.device.name.clone().into()
    }

    /// Model of the valued device.
    #[must_use]
    pub fn device_model(&self) -> api::device::Model {
        self.0.device.model.clone().into()
    }

    /// IMEI of the valued device.
    #[must_use]
    pub fn imei(&self) -> Option<api::device::Imei> {
        self.0.imei.clone().map(Into::into)
    }

    /// Condition the device is valued in.
    #[must_use]
    pub fn condition(&self) -> api::device::Condition {
        self.0.condition.into()
    }

    /// Description of the device condition.
    #[must_use]
    pub fn condition_description(
        &self,
    ) -> Option<api::device::ConditionDescription> {
        self.0.condition_description.clone().map(Into::into)
    }

    /// Price of the device in an excellent condition.
    #[must_use]
    pub fn base_price(&self) -> Money {
        self.0.base_price
    }

    /// Multiplier of the `condition`.
    #[must_use]
    pub fn multiplier(&self) -> Multiplier {
        self.0.multiplier
    }

    /// `basePrice` scaled by the `multiplier`.
    #[must_use]
    pub fn adjusted_price(&self) -> Money {
        self.0.adjusted_price
    }

    /// Damages found on the device.
    #[must_use]
    pub fn deductions(&self) -> Vec<Deduction> {
        self.0.deductions.iter().cloned().map(Into::into).collect()
    }

    /// Sum of all the `deductions`.
    #[must_use]
    pub fn total_deductions(&self) -> Money {
        self.0.total_deductions
    }

    /// Value offered to the customer for the device.
    ///
    /// Never negative.
    #[must_use]
    pub fn final_value(&self) -> Money {
        self.0.final_value
    }
}

/// Damage found on a device, deducted from its value.
#[derive(Clone, Debug, From)]
pub struct Deduction(domain::damage::Deduction);

/// Damage found on a device, deducted from its value.
#[graphql_object(name = "DamageDeduction", context = Context)]
impl Deduction {
    /// Description of the damage.
    #[must_use]
    pub fn description(&self) -> DamageDescription {
        self.0.description.clone().into()
    }

    /// Amount deducted for the damage.
    #[must_use]
    pub fn amount(&self) -> Money {
        self.0.amount
    }

    /// Spare part needed to repair the damage.
    #[must_use]
    pub fn spare_part_id(&self) -> Option<SparePartId> {
        self.0.spare_part_id.map(Into::into)
    }
}

/// Damage found on a device, deducted from its value.
#[derive(Clone, Debug, GraphQLInputObject)]
#[graphql(name = "DamageDeductionInput")]
pub struct DeductionInput {
    /// Description of the damage.
    pub description: DamageDescription,

    /// Amount to deduct for the damage.
    pub amount: Money,

    /// Spare part needed to repair the damage.
    pub spare_part_id: Option<SparePartId>,
}

impl From<DeductionInput> for domain::damage::Deduction {
    fn from(input: DeductionInput) -> Self {
        let DeductionInput {
            description,
            amount,
            spare_part_id,
        } = input;
        Self {
            description: description.into(),
            amount,
            spare_part_id: spare_part_id.map(Into::into),
        }
    }
}

/// Results of a device inspection to be valued.
#[derive(Clone, Debug, GraphQLInputObject)]
#[graphql(name = "TradeInInspectionInput")]
pub struct InspectionInput {
    /// Name of the inspected device.
    pub device_name: api::device::Name,

    /// Model of the inspected device.
    pub device_model: api::device::Model,

    /// IMEI of the inspected device.
    pub imei: Option<api::device::Imei>,

    /// Condition rating: `excellent`, `good`, `fair` or `poor`, in any
    /// letter case.
    pub condition: String,

    /// Description of the device condition.
    pub condition_description: Option<api::device::ConditionDescription>,

    /// Damages found on the device.
    pub deductions: Vec<DeductionInput>,

    /// Price replacing the base price of the device `TradeInPrice`.
    pub base_price_override: Option<Money>,
}

impl From<InspectionInput> for query::QuoteTradeIn {
    fn from(input: InspectionInput) -> Self {
        let InspectionInput {
            device_name,
            device_model,
            imei,
            condition,
            condition_description,
            deductions,
            base_price_override,
        } = input;
        Self {
            device: api::device::of(device_name, device_model),
            imei: imei.map(Into::into),
            condition,
            condition_description: condition_description.map(Into::into),
            deductions: deductions.into_iter().map(Into::into).collect(),
            base_price_override,
        }
    }
}

/// Description of a damage, like `Cracked screen`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "DamageDescription",
    with = scalar::Via::<domain::damage::Description>,
)]
pub struct DamageDescription(domain::damage::Description);

/// Unique identifier of a spare part in the inventory.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::damage::SparePartId)]
#[into(domain::damage::SparePartId)]
#[graphql(name = "SparePartId", transparent)]
pub struct SparePartId(Uuid);
