//! [`Contract`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf, Money};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use uuid::Uuid;

use crate::domain::{customer, transaction};
#[cfg(doc)]
use crate::domain::Transaction;

/// Trade-in contract derived from exactly one [`Transaction`].
#[derive(Clone, Debug)]
pub struct Contract {
    /// ID of this [`Contract`].
    pub id: Id,

    /// ID of the [`Transaction`] this [`Contract`] is derived from.
    ///
    /// Unique among all the [`Contract`]s.
    pub transaction_id: transaction::Id,

    /// Trade-in value the customer agreed on.
    pub agreed_value: Money,

    /// [`Terms`] in force at the moment this [`Contract`] was generated.
    pub terms: Terms,

    /// [`OwnershipDeclaration`] in force at the moment this [`Contract`] was
    /// generated.
    pub ownership_declaration: OwnershipDeclaration,

    /// [`Signature`] of the customer, if this [`Contract`] is signed.
    pub signature: Option<Signature>,

    /// [`DateTime`] when this [`Contract`] was generated.
    pub created_at: CreationDateTime,
}

impl Contract {
    /// Indicates whether this [`Contract`] is signed.
    #[must_use]
    pub const fn is_signed(&self) -> bool {
        self.signature.is_some()
    }
}

/// ID of a [`Contract`].
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

/// Customer's signature of a [`Contract`].
#[derive(Clone, Debug)]
pub struct Signature {
    /// Name of the customer signing the [`Contract`].
    pub signer: SignerName,

    /// Identity document presented by the customer, if any.
    pub document: Option<customer::IdDocument>,

    /// Name of the staff member witnessing the signing, if any.
    pub witness: Option<SignerName>,

    /// [`DateTime`] when the [`Contract`] was signed.
    pub signed_at: SigningDateTime,
}

/// Terms and conditions of a [`Contract`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Terms(String);

impl Terms {
    /// Creates new [`Terms`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `terms` are not empty.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(terms: impl Into<String>) -> Self {
        Self(terms.into())
    }

    /// Creates new [`Terms`] if the given `terms` are not blank.
    #[must_use]
    pub fn new(terms: impl Into<String>) -> Option<Self> {
        let terms = terms.into();
        (!terms.trim().is_empty()).then_some(Self(terms))
    }
}

impl FromStr for Terms {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("blank `contract::Terms`")
    }
}

/// Declaration of the customer being the lawful owner of a traded-in device.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct OwnershipDeclaration(String);

impl OwnershipDeclaration {
    /// Creates a new [`OwnershipDeclaration`] if the given `text` is not
    /// blank.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        (!text.trim().is_empty()).then_some(Self(text))
    }
}

impl FromStr for OwnershipDeclaration {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("blank `contract::OwnershipDeclaration`")
    }
}

/// Name of a person signing a [`Contract`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct SignerName(String);

impl SignerName {
    /// Creates a new [`SignerName`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `name` is not empty.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Creates a new [`SignerName`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`SignerName`].
    fn check(name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        name.trim() == name && !name.is_empty() && name.len() <= 256
    }
}

impl FromStr for SignerName {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `SignerName`")
    }
}

/// [`DateTime`] when a [`Contract`] was generated.
pub type CreationDateTime = DateTimeOf<(Contract, unit::Creation)>;

/// [`DateTime`] when a [`Contract`] was signed.
pub type SigningDateTime = DateTimeOf<(Contract, unit::Signing)>;
