//! Traded-in device definitions.

use derive_more::{AsRef, Display, From, Into};
use juniper::{GraphQLEnum, GraphQLScalar};
use service::domain;

use crate::api::scalar;

/// Name of a device, like `iPhone 12`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(name = "DeviceName", with = scalar::Via::<domain::device::Name>)]
pub struct Name(domain::device::Name);

/// Model of a device, like `A2403`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(name = "DeviceModel", with = scalar::Via::<domain::device::Model>)]
pub struct Model(domain::device::Model);

/// IMEI of a device: 15 or 16 digits.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(name = "DeviceImei", with = scalar::Via::<domain::device::Imei>)]
pub struct Imei(domain::device::Imei);

/// Serial number of a device.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "DeviceSerialNumber",
    with = scalar::Via::<domain::device::SerialNumber>,
)]
pub struct SerialNumber(domain::device::SerialNumber);

/// Free-form description of a device condition.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "DeviceConditionDescription",
    with = scalar::Via::<domain::condition::Description>,
)]
pub struct ConditionDescription(domain::condition::Description);

/// Condition rating of a device.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "DeviceCondition")]
pub enum Condition {
    /// Like new, no visible wear.
    Excellent,

    /// Minor signs of use.
    Good,

    /// Noticeable wear, fully functional.
    Fair,

    /// Heavy wear or functional issues.
    Poor,
}

impl From<domain::condition::Rating> for Condition {
    fn from(rating: domain::condition::Rating) -> Self {
        use domain::condition::Rating as R;
        match rating {
            R::Excellent => Self::Excellent,
            R::Good => Self::Good,
            R::Fair => Self::Fair,
            R::Poor => Self::Poor,
        }
    }
}

impl From<Condition> for domain::condition::Rating {
    fn from(condition: Condition) -> Self {
        match condition {
            Condition::Excellent => Self::Excellent,
            Condition::Good => Self::Good,
            Condition::Fair => Self::Fair,
            Condition::Poor => Self::Poor,
        }
    }
}

/// Builds a [`domain::Device`] out of its GraphQL parts.
#[must_use]
pub fn of(name: Name, model: Model) -> domain::Device {
    domain::Device {
        name: name.into(),
        model: model.into(),
    }
}
