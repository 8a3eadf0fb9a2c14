//! [`Transaction`] definitions.

use std::{fmt::Write as _, sync::LazyLock};

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf, Money};
use derive_more::{AsRef, Display, Error, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use uuid::Uuid;

use crate::domain::{contract, customer, device, Quote};
#[cfg(doc)]
use crate::domain::Contract;

/// Trade-in transaction, persisted once a customer accepts a [`Quote`].
#[derive(Clone, Debug)]
pub struct Transaction {
    /// ID of this [`Transaction`].
    pub id: Id,

    /// Human-readable [`Number`] of this [`Transaction`].
    pub number: Number,

    /// ID of the customer trading in the device.
    pub customer_id: customer::Id,

    /// [`Quote`] accepted by the customer.
    ///
    /// Frozen at the moment of this [`Transaction`] creation.
    pub quote: Quote,

    /// Serial number of the traded-in device, if provided.
    pub serial_number: Option<device::SerialNumber>,

    /// Price of the new device the customer buys.
    pub new_device_price: Money,

    /// Amount the customer pays on top of the trade-in value.
    ///
    /// Negative when the trade-in value exceeds the new device price, meaning
    /// the customer is owed the difference. See [`Transaction::settlement()`].
    pub customer_payment: Money,

    /// Indicator whether the traded-in device needs repair before resale.
    pub needs_repair: bool,

    /// Price the traded-in device is expected to be resold for, if set.
    pub resale_price: Option<Money>,

    /// Indicator whether the traded-in device is ready to be resold.
    ///
    /// A device ready for resale no longer needs repair.
    pub ready_for_resale: bool,

    /// [`StaffNotes`] of this [`Transaction`].
    pub staff_notes: Option<StaffNotes>,

    /// [`Status`] of this [`Transaction`].
    pub status: Status,

    /// ID of the [`Contract`] generated for this [`Transaction`], if any.
    pub contract_id: Option<contract::Id>,

    /// [`DateTime`] when this [`Transaction`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when the [`Contract`] of this [`Transaction`] was signed.
    pub contract_signed_at: Option<SigningDateTime>,

    /// [`DateTime`] when this [`Transaction`] was completed.
    pub completed_at: Option<CompletionDateTime>,

    /// [`DateTime`] when this [`Transaction`] was cancelled.
    pub cancelled_at: Option<CancellationDateTime>,
}

impl Transaction {
    /// Returns the [`Settlement`] between the customer and the shop.
    #[must_use]
    pub fn settlement(&self) -> Settlement {
        Settlement::from(self.customer_payment)
    }

    /// Indicates whether the traded-in device is received by the shop, so
    /// may be prepared for resale.
    #[must_use]
    pub const fn is_device_received(&self) -> bool {
        matches!(self.status, Status::ContractSigned | Status::Completed)
    }

    /// Moves this [`Transaction`] to the provided [`Status`], stamping the
    /// related [`DateTime`].
    ///
    /// # Errors
    ///
    /// With an [`InvalidTransition`] if the current [`Status`] doesn't lead
    /// to the provided one directly.
    pub fn transition(&mut self, to: Status) -> Result<(), InvalidTransition> {
        if !self.status.leads_to(to) {
            return Err(InvalidTransition {
                from: self.status,
                to,
            });
        }

        let now = DateTimeOf::<()>::now();
        match to {
            Status::ContractSigned => {
                self.contract_signed_at = Some(now.coerce());
            }
            Status::Completed => self.completed_at = Some(now.coerce()),
            Status::Cancelled => self.cancelled_at = Some(now.coerce()),
            Status::Created | Status::ContractGenerated => {}
        }
        self.status = to;

        Ok(())
    }
}

/// ID of a [`Transaction`].
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

/// Human-readable number of a [`Transaction`], like `TI-04F3A9C21B`.
#[derive(
    AsRef, Clone, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd,
)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Number(String);

impl Number {
    /// Prefix of every [`Number`].
    pub const PREFIX: &'static str = "TI-";

    /// Generates a new random [`Number`].
    ///
    /// Uniqueness is not guaranteed and must be checked upon persisting.
    #[must_use]
    pub fn generate() -> Self {
        let random = Uuid::new_v4().as_u128();

        let mut number = String::with_capacity(Self::PREFIX.len() + 10);
        number.push_str(Self::PREFIX);
        // Lowest 40 bits are random in UUID v4, so take 10 hex digits of them.
        _ = write!(number, "{:010X}", random & 0xFF_FFFF_FFFF);
        Self(number)
    }

    /// Creates a new [`Number`] if the given `number` is valid.
    #[must_use]
    pub fn new(number: impl Into<String>) -> Option<Self> {
        let number = number.into();
        Self::check(&number).then_some(Self(number))
    }

    /// Checks whether the given `number` is a valid [`Number`].
    fn check(number: impl AsRef<str>) -> bool {
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^TI-[0-9A-F]{10}$").expect("valid regex")
        });

        REGEX.is_match(number.as_ref())
    }
}

impl FromStr for Number {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `transaction::Number`")
    }
}

define_kind! {
    #[doc = "Status of a [`Transaction`]."]
    enum Status {
        #[doc = "[`Transaction`] is created, no [`Contract`] exists yet."]
        Created = 1,

        #[doc = "[`Contract`] is generated, but not signed yet."]
        ContractGenerated = 2,

        #[doc = "[`Contract`] is signed by the customer."]
        ContractSigned = 3,

        #[doc = "Trade-in is finalized."]
        Completed = 4,

        #[doc = "[`Transaction`] is cancelled before being signed."]
        Cancelled = 5,
    }
}

impl Status {
    /// Indicates whether this [`Status`] leads to the provided one directly.
    #[must_use]
    pub const fn leads_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Created, Self::ContractGenerated | Self::Cancelled)
                | (
                    Self::ContractGenerated,
                    Self::ContractSigned | Self::Cancelled,
                )
                | (Self::ContractSigned, Self::Completed),
        )
    }

    /// Indicates whether no further [`Status`] is reachable from this one.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Error of moving a [`Transaction`] to a [`Status`] not reachable directly.
#[derive(Clone, Copy, Debug, Display, Error)]
#[display("cannot move `Transaction` from `{from}` to `{to}`")]
pub struct InvalidTransition {
    /// [`Status`] the [`Transaction`] is in.
    #[error(not(source))]
    pub from: Status,

    /// [`Status`] the [`Transaction`] was requested to move to.
    #[error(not(source))]
    pub to: Status,
}

/// Settlement between a customer and the shop.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Settlement {
    /// Customer pays the provided amount.
    CustomerPays(Money),

    /// Customer is owed the provided amount.
    CustomerOwed(Money),

    /// Nobody pays anything.
    Even,
}

impl From<Money> for Settlement {
    fn from(payment: Money) -> Self {
        if payment.is_negative() {
            Self::CustomerOwed(Money {
                amount: -payment.amount,
                currency: payment.currency,
            })
        } else if payment.amount.is_zero() {
            Self::Even
        } else {
            Self::CustomerPays(payment)
        }
    }
}

/// Notes of a staff member about a [`Transaction`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct StaffNotes(String);

impl StaffNotes {
    /// Creates new [`StaffNotes`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `notes` are not empty.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(notes: impl Into<String>) -> Self {
        Self(notes.into())
    }

    /// Creates new [`StaffNotes`] if the given `notes` are valid.
    #[must_use]
    pub fn new(notes: impl Into<String>) -> Option<Self> {
        let notes = notes.into();
        Self::check(&notes).then_some(Self(notes))
    }

    /// Checks whether the given `notes` are valid [`StaffNotes`].
    fn check(notes: impl AsRef<str>) -> bool {
        let notes = notes.as_ref();
        notes.trim() == notes && !notes.is_empty() && notes.len() <= 2048
    }
}

impl FromStr for StaffNotes {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `StaffNotes`")
    }
}

/// [`DateTime`] when a [`Transaction`] was created.
pub type CreationDateTime = DateTimeOf<(Transaction, unit::Creation)>;

/// [`DateTime`] when a [`Contract`] of a [`Transaction`] was signed.
pub type SigningDateTime = DateTimeOf<(Transaction, unit::Signing)>;

/// [`DateTime`] when a [`Transaction`] was completed.
pub type CompletionDateTime = DateTimeOf<(Transaction, unit::Completion)>;

/// [`DateTime`] when a [`Transaction`] was cancelled.
pub type CancellationDateTime = DateTimeOf<(Transaction, unit::Cancellation)>;

#[cfg(test)]
mod spec {
    use common::{money::Currency, Money};

    use super::{Number, Settlement, Status};

    fn tzs(s: &str) -> Money {
        Money {
            amount: s.parse().unwrap(),
            currency: Currency::Tzs,
        }
    }

    #[test]
    fn generates_well_formed_numbers() {
        for _ in 0..100 {
            let number = Number::generate();

            assert!(
                Number::new(number.to_string()).is_some(),
                "malformed: {number}",
            );
        }
    }

    #[test]
    fn rejects_malformed_numbers() {
        assert!(Number::new("TI-04F3A9C21B").is_some());

        assert!(Number::new("TI-04f3a9c21b").is_none());
        assert!(Number::new("TI-04F3A9C21").is_none());
        assert!(Number::new("TX-04F3A9C21B").is_none());
    }

    #[test]
    fn allows_only_forward_transitions() {
        use Status as S;

        let allowed = [
            (S::Created, S::ContractGenerated),
            (S::Created, S::Cancelled),
            (S::ContractGenerated, S::ContractSigned),
            (S::ContractGenerated, S::Cancelled),
            (S::ContractSigned, S::Completed),
        ];
        for &from in S::ALL {
            for &to in S::ALL {
                assert_eq!(
                    from.leads_to(to),
                    allowed.contains(&(from, to)),
                    "{from} -> {to}",
                );
            }
        }
    }

    #[test]
    fn terminal_statuses_lead_nowhere() {
        for &from in Status::ALL.iter().filter(|s| s.is_terminal()) {
            assert!(Status::ALL.iter().all(|&to| !from.leads_to(to)));
        }
    }

    #[test]
    fn settles_by_payment_sign() {
        assert_eq!(
            Settlement::from(tzs("845000")),
            Settlement::CustomerPays(tzs("845000")),
        );
        assert_eq!(
            Settlement::from(tzs("-40000")),
            Settlement::CustomerOwed(tzs("40000")),
        );
        assert_eq!(Settlement::from(tzs("0")), Settlement::Even);
    }
}
