//! Customer definitions.
//!
//! Customers are owned by an external system, so only references to them are
//! kept here.

use common::define_kind;
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use uuid::Uuid;

/// ID of a customer.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, FromStr, Hash, Into, PartialEq,
)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Id(Uuid);

/// Identity document presented by a customer when signing a contract.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IdDocument {
    /// [`IdKind`] of this [`IdDocument`].
    pub kind: IdKind,

    /// [`IdNumber`] of this [`IdDocument`].
    pub number: IdNumber,
}

define_kind! {
    #[doc = "Kind of an [`IdDocument`]."]
    enum IdKind {
        #[doc = "National identity card."]
        NationalId = 1,

        #[doc = "Passport."]
        Passport = 2,

        #[doc = "Driver's license."]
        DriversLicense = 3,

        #[doc = "Voter's card."]
        VoterId = 4,
    }
}

/// Number of an [`IdDocument`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct IdNumber(String);

impl IdNumber {
    /// Creates a new [`IdNumber`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `number` is not empty.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(number: impl Into<String>) -> Self {
        Self(number.into())
    }

    /// Creates a new [`IdNumber`] if the given `number` is valid.
    #[must_use]
    pub fn new(number: impl Into<String>) -> Option<Self> {
        let number = number.into();
        Self::check(&number).then_some(Self(number))
    }

    /// Checks whether the given `number` is a valid [`IdNumber`].
    fn check(number: impl AsRef<str>) -> bool {
        let number = number.as_ref();
        number.trim() == number && !number.is_empty() && number.len() <= 64
    }
}

impl FromStr for IdNumber {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `customer::IdNumber`")
    }
}
