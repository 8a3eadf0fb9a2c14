//! Device condition definitions.

use common::define_kind;
use derive_more::{AsRef, Display, FromStr};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};

define_kind! {
    #[doc = "Condition rating of a traded-in device, determining the \
             multiplier applied to its base price."]
    enum Rating {
        #[doc = "Like new, no visible wear."]
        Excellent = 1,

        #[doc = "Minor signs of use."]
        Good = 2,

        #[doc = "Noticeable wear, fully functional."]
        Fair = 3,

        #[doc = "Heavy wear or functional issues."]
        Poor = 4,
    }
}

/// Free-form description of a device condition, written by staff during an
/// inspection.
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
            && description.len() <= 2048
    }
}

impl FromStr for Description {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `condition::Description`")
    }
}
