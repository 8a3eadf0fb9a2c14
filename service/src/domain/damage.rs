//! Damage [`Deduction`] definitions.

use common::Money;
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use uuid::Uuid;

/// Damage found on a traded-in device, subtracted from its value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Deduction {
    /// [`Description`] of the damage.
    pub description: Description,

    /// Amount subtracted for this damage.
    ///
    /// Never negative.
    pub amount: Money,

    /// ID of the spare part needed to repair the damage, if known.
    pub spare_part_id: Option<SparePartId>,
}

/// Description of a damage, like `Cracked screen`.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Description(String);

impl Description {
    /// Creates a new [`Description`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `description` is not empty.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(description: impl Into<String>) -> Self {
        Self(description.into())
    }

    /// Creates a new [`Description`] if the given `description` is valid.
    #[must_use]
    pub fn new(description: impl Into<String>) -> Option<Self> {
        let description = description.into();
        Self::check(&description).then_some(Self(description))
    }

    /// Checks whether the given `description` is a valid [`Description`].
    fn check(description: impl AsRef<str>) -> bool {
        let description = description.as_ref();
        description.trim() == description
            && !description.is_empty()
            && description.len() <= 512
    }
}

impl FromStr for Description {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `damage::Description`")
    }
}

/// ID of a spare part in the inventory.
///
/// Opaque reference, the inventory itself is managed elsewhere.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, FromStr, Hash, Into, PartialEq,
)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct SparePartId(Uuid);
