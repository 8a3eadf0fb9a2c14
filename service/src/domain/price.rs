//! [`Price`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf, Money, Multiplier};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use uuid::Uuid;

use crate::domain::{condition, Device};

/// Trade-in price schedule of a [`Device`].
#[derive(Clone, Debug)]
pub struct Price {
    /// ID of this [`Price`].
    pub id: Id,

    /// [`Device`] this [`Price`] is for.
    ///
    /// Unique among all the [`Price`]s.
    pub device: Device,

    /// Price of the [`Device`] in an excellent condition.
    pub base_price: Money,

    /// [`ConditionMultipliers`] of this [`Price`].
    pub multipliers: ConditionMultipliers,

    /// Indicator whether this [`Price`] is used for valuations.
    pub is_active: bool,

    /// [`Notes`] of this [`Price`].
    pub notes: Option<Notes>,

    /// [`DateTime`] when this [`Price`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Price`] was updated the last time.
    pub updated_at: ModificationDateTime,
}

/// ID of a [`Price`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// [`Multiplier`]s applied to a base price per [`condition::Rating`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ConditionMultipliers {
    /// [`Multiplier`] for [`condition::Rating::Excellent`].
    pub excellent: Multiplier,

    /// [`Multiplier`] for [`condition::Rating::Good`].
    pub good: Multiplier,

    /// [`Multiplier`] for [`condition::Rating::Fair`].
    pub fair: Multiplier,

    /// [`Multiplier`] for [`condition::Rating::Poor`].
    pub poor: Multiplier,
}

impl ConditionMultipliers {
    /// Returns the [`Multiplier`] for the provided [`condition::Rating`].
    #[must_use]
    pub const fn get(&self, rating: condition::Rating) -> Multiplier {
        use condition::Rating as R;

        match rating {
            R::Excellent => self.excellent,
            R::Good => self.good,
            R::Fair => self.fair,
            R::Poor => self.poor,
        }
    }

    /// Indicates whether these [`ConditionMultipliers`] don't grow as the
    /// [`condition::Rating`] worsens.
    #[must_use]
    pub fn is_monotonic(&self) -> bool {
        self.excellent >= self.good
            && self.good >= self.fair
            && self.fair >= self.poor
    }
}

/// Free-form notes of a [`Price`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Notes(String);

impl Notes {
    /// Creates a new [`Notes`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `notes` are not empty.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(notes: impl Into<String>) -> Self {
        Self(notes.into())
    }

    /// Creates new [`Notes`] if the given `notes` are valid.
    #[must_use]
    pub fn new(notes: impl Into<String>) -> Option<Self> {
        let notes = notes.into();
        Self::check(&notes).then_some(Self(notes))
    }

    /// Checks whether the given `notes` are valid [`Notes`].
    fn check(notes: impl AsRef<str>) -> bool {
        let notes = notes.as_ref();
        notes.trim() == notes && !notes.is_empty() && notes.len() <= 2048
    }
}

impl FromStr for Notes {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `price::Notes`")
    }
}

/// [`DateTime`] when a [`Price`] was created.
pub type CreationDateTime = DateTimeOf<(Price, unit::Creation)>;

/// [`DateTime`] when a [`Price`] was modified.
pub type ModificationDateTime = DateTimeOf<(Price, unit::Modification)>;

#[cfg(test)]
mod spec {
    use common::Multiplier;

    use crate::domain::condition;

    use super::ConditionMultipliers;

    fn multipliers(e: &str, g: &str, f: &str, p: &str) -> ConditionMultipliers {
        let m = |s: &str| Multiplier::new(s.parse().unwrap()).unwrap();
        ConditionMultipliers {
            excellent: m(e),
            good: m(g),
            fair: m(f),
            poor: m(p),
        }
    }

    #[test]
    fn picks_multiplier_by_rating() {
        let m = multipliers("1", "0.85", "0.7", "0.5");

        assert_eq!(m.get(condition::Rating::Excellent), m.excellent);
        assert_eq!(m.get(condition::Rating::Good), m.good);
        assert_eq!(m.get(condition::Rating::Fair), m.fair);
        assert_eq!(m.get(condition::Rating::Poor), m.poor);
    }

    #[test]
    fn checks_monotonicity() {
        assert!(multipliers("1", "0.85", "0.7", "0.5").is_monotonic());
        assert!(multipliers("0.9", "0.9", "0.9", "0.9").is_monotonic());

        assert!(!multipliers("0.8", "0.85", "0.7", "0.5").is_monotonic());
        assert!(!multipliers("1", "0.85", "0.5", "0.7").is_monotonic());
    }
}
