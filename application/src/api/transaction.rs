//! [`Transaction`]-related definitions.

use common::{money::Currency, DateTime, DateTimeOf, Money};
use derive_more::{AsRef, Display, From, Into};
use futures::TryFutureExt as _;
use juniper::{graphql_object, GraphQLEnum, GraphQLObject, GraphQLScalar};
use service::{domain, query, read, Query as _};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    AsError, Context, Error,
};

/// Trade-in of a customer's device towards the purchase of a new one.
#[derive(Debug)]
pub struct Transaction {
    /// Underlying [`domain::Transaction`].
    transaction: domain::Transaction,

    /// Lazily loaded [`domain::Contract`] of this [`Transaction`].
    contract: OnceCell<Option<domain::Contract>>,
}

impl From<domain::Transaction> for Transaction {
    fn from(transaction: domain::Transaction) -> Self {
        Self {
            transaction,
            contract: OnceCell::new(),
        }
    }
}

impl Transaction {
    /// Creates a new [`Transaction`] along with its already loaded
    /// [`domain::Contract`].
    #[must_use]
    pub fn with_contract(
        transaction: domain::Transaction,
        contract: domain::Contract,
    ) -> Self {
        Self {
            transaction,
            contract: OnceCell::new_with(Some(Some(contract))),
        }
    }
}

/// Trade-in of a customer's device towards the purchase of a new one.
#[graphql_object(name = "TradeInTransaction", context = Context)]
impl Transaction {
    /// Unique identifier of this `TradeInTransaction`.
    #[must_use]
    pub fn id(&self) -> Id {
        self.transaction.id.into()
    }

    /// Human-readable number of this `TradeInTransaction`.
    #[must_use]
    pub fn number(&self) -> Number {
        self.transaction.number.clone().into()
    }

    /// Customer trading the device in.
    #[must_use]
    pub fn customer_id(&self) -> CustomerId {
        self.transaction.customer_id.into()
    }

    /// Accepted valuation of the traded-in device.
    #[must_use]
    pub fn quote(&self) -> api::Quote {
        self.transaction.quote.clone().into()
    }

    /// Serial number of the traded-in device.
    #[must_use]
    pub fn serial_number(&self) -> Option<api::device::SerialNumber> {
        self.transaction.serial_number.clone().map(Into::into)
    }

    /// Price of the new device being purchased.
    #[must_use]
    pub fn new_device_price(&self) -> Money {
        self.transaction.new_device_price
    }

    /// Amount the customer pays on top of the trade-in value.
    ///
    /// Negative, if the trade-in value exceeds the `newDevicePrice`.
    #[must_use]
    pub fn customer_payment(&self) -> Money {
        self.transaction.customer_payment
    }

    /// How the `customerPayment` is settled.
    #[must_use]
    pub fn settlement(&self) -> Settlement {
        Settlement::new(
            self.transaction.settlement(),
            self.transaction.customer_payment.currency,
        )
    }

    /// Indicator whether the traded-in device needs a repair before resale.
    #[must_use]
    pub fn needs_repair(&self) -> bool {
        self.transaction.needs_repair
    }

    /// Price the traded-in device is expected to be resold for.
    #[must_use]
    pub fn resale_price(&self) -> Option<Money> {
        self.transaction.resale_price
    }

    /// Indicator whether the traded-in device is ready to be resold.
    #[must_use]
    pub fn ready_for_resale(&self) -> bool {
        self.transaction.ready_for_resale
    }

    /// Internal notes of the staff.
    #[must_use]
    pub fn staff_notes(&self) -> Option<StaffNotes> {
        self.transaction.staff_notes.clone().map(Into::into)
    }

    /// Status of this `TradeInTransaction`.
    #[must_use]
    pub fn status(&self) -> Status {
        self.transaction.status.into()
    }

    /// `TradeInContract` of this `TradeInTransaction`, if generated.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "TradeInTransaction.contract",
            otel.name = api::Query::SPAN_NAME,
            transaction.id = %self.transaction.id,
        ),
    )]
    pub async fn contract(
        &self,
        ctx: &Context,
    ) -> Result<Option<api::Contract>, Error> {
        let id = self.transaction.id;
        self.contract
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::transaction::Contract::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
            })
            .await
            .map(|c| c.clone().map(Into::into))
    }

    /// `DateTime` when this `TradeInTransaction` was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime {
        self.transaction.created_at.coerce()
    }

    /// `DateTime` when the `TradeInContract` was signed.
    #[must_use]
    pub fn contract_signed_at(&self) -> Option<DateTime> {
        self.transaction.contract_signed_at.map(DateTimeOf::coerce)
    }

    /// `DateTime` when this `TradeInTransaction` was completed.
    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime> {
        self.transaction.completed_at.map(DateTimeOf::coerce)
    }

    /// `DateTime` when this `TradeInTransaction` was cancelled.
    #[must_use]
    pub fn cancelled_at(&self) -> Option<DateTime> {
        self.transaction.cancelled_at.map(DateTimeOf::coerce)
    }
}

/// Unique identifier of a `TradeInTransaction`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::transaction::Id)]
#[into(domain::transaction::Id)]
#[graphql(name = "TradeInTransactionId", transparent)]
pub struct Id(Uuid);

/// Human-readable number of a `TradeInTransaction`, like `TI-0A1B2C3D4E`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "TradeInTransactionNumber",
    with = scalar::Via::<domain::transaction::Number>,
)]
pub struct Number(domain::transaction::Number);

/// Unique identifier of a customer.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::customer::Id)]
#[into(domain::customer::Id)]
#[graphql(name = "CustomerId", transparent)]
pub struct CustomerId(Uuid);

/// Internal notes of the staff on a `TradeInTransaction`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "TradeInStaffNotes",
    with = scalar::Via::<domain::transaction::StaffNotes>,
)]
pub struct StaffNotes(domain::transaction::StaffNotes);

/// Status of a `TradeInTransaction`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "TradeInTransactionStatus")]
pub enum Status {
    /// No `TradeInContract` is generated yet.
    Created,

    /// `TradeInContract` is generated, but not signed yet.
    ContractGenerated,

    /// `TradeInContract` is signed by the customer.
    ContractSigned,

    /// Trade-in is finalized.
    Completed,

    /// `TradeInTransaction` is cancelled.
    Cancelled,
}

impl From<domain::transaction::Status> for Status {
    fn from(status: domain::transaction::Status) -> Self {
        use domain::transaction::Status as S;
        match status {
            S::Created => Self::Created,
            S::ContractGenerated => Self::ContractGenerated,
            S::ContractSigned => Self::ContractSigned,
            S::Completed => Self::Completed,
            S::Cancelled => Self::Cancelled,
        }
    }
}

impl From<Status> for domain::transaction::Status {
    fn from(status: Status) -> Self {
        match status {
            Status::Created => Self::Created,
            Status::ContractGenerated => Self::ContractGenerated,
            Status::ContractSigned => Self::ContractSigned,
            Status::Completed => Self::Completed,
            Status::Cancelled => Self::Cancelled,
        }
    }
}

/// Settlement of a `TradeInTransaction` between the customer and the store.
#[derive(Clone, Debug, GraphQLObject)]
#[graphql(name = "TradeInSettlement")]
pub struct Settlement {
    /// Direction of the settlement.
    pub kind: SettlementKind,

    /// Amount to be settled, never negative.
    pub amount: Money,

    /// `amount` rendered for display, like `TZS 845,000.00`.
    pub formatted_amount: String,
}

impl Settlement {
    /// Creates a new [`Settlement`] out of the provided
    /// [`domain::transaction::Settlement`] in the provided [`Currency`].
    #[must_use]
    pub fn new(
        settlement: domain::transaction::Settlement,
        currency: Currency,
    ) -> Self {
        use domain::transaction::Settlement as S;

        let (kind, amount) = match settlement {
            S::CustomerPays(m) => (SettlementKind::CustomerPays, m),
            S::CustomerOwed(m) => (SettlementKind::CustomerOwed, m),
            S::Even => (SettlementKind::Even, Money::zero(currency)),
        };
        Self {
            kind,
            amount,
            formatted_amount: amount.formatted().to_string(),
        }
    }
}

/// Direction of a `TradeInSettlement`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "TradeInSettlementKind")]
pub enum SettlementKind {
    /// Customer pays the store.
    CustomerPays,

    /// Store pays the customer.
    CustomerOwed,

    /// Nobody pays.
    Even,
}

/// Aggregated statistics of the `TradeInTransaction`s history.
#[derive(Clone, Copy, Debug, From)]
pub struct Summary(read::transaction::Summary);

/// Aggregated statistics of the `TradeInTransaction`s history.
#[graphql_object(name = "TradeInSummary", context = Context)]
impl Summary {
    /// Number of all the `TradeInTransaction`s.
    pub fn total_count(&self) -> Result<i32, Error> {
        self.0.total_count.try_into().map_err(AsError::into_error)
    }

    /// Number of `TradeInTransaction`s neither completed nor cancelled.
    pub fn pending_count(&self) -> Result<i32, Error> {
        self.0.pending_count.try_into().map_err(AsError::into_error)
    }

    /// Number of completed `TradeInTransaction`s.
    pub fn completed_count(&self) -> Result<i32, Error> {
        self.0.completed_count.try_into().map_err(AsError::into_error)
    }

    /// Number of `TradeInTransaction`s with a device needing repair and not
    /// ready for resale yet.
    pub fn needs_repair_count(&self) -> Result<i32, Error> {
        self.0.needs_repair_count.try_into().map_err(AsError::into_error)
    }

    /// Number of `TradeInTransaction`s with a device ready for resale.
    pub fn ready_for_resale_count(&self) -> Result<i32, Error> {
        self.0
            .ready_for_resale_count
            .try_into()
            .map_err(AsError::into_error)
    }

    /// Sum of trade-in values of all the non-cancelled
    /// `TradeInTransaction`s.
    #[must_use]
    pub fn total_value(&self) -> Money {
        self.0.total_value
    }

    /// Average trade-in value of the non-cancelled `TradeInTransaction`s.
    #[must_use]
    pub fn average_value(&self) -> Money {
        self.0.average_value
    }
}
