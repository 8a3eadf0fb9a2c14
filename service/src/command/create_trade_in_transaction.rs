//! [`Command`] for creating a new [`Transaction`] from an accepted [`Quote`].

use common::{
    operations::{Commit, Insert, Transact, Transacted},
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{customer, device, transaction, Quote, Transaction},
    infra::{
        database::{self, constraint},
        Database,
    },
    valuation::{self, ValidationError},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Transaction`] from a [`Quote`] accepted by
/// a customer.
///
/// Not retried on failure: the caller keeps its [`Quote`] and may execute
/// this [`Command`] again.
#[derive(Clone, Debug)]
pub struct CreateTradeInTransaction {
    /// ID of the customer trading in the device.
    pub customer_id: customer::Id,

    /// [`Quote`] accepted by the customer.
    pub quote: Quote,

    /// Price of the new device the customer buys.
    pub new_device_price: Money,

    /// Serial number of the traded-in device, if known.
    pub serial_number: Option<device::SerialNumber>,

    /// Indicator whether the traded-in device needs repair before resale.
    pub needs_repair: bool,

    /// Price the traded-in device is expected to be resold for, if known.
    pub resale_price: Option<Money>,

    /// [`transaction::StaffNotes`] of a new [`Transaction`].
    pub staff_notes: Option<transaction::StaffNotes>,
}

impl<Db> Command<CreateTradeInTransaction> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<Transaction>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Transaction;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateTradeInTransaction,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateTradeInTransaction {
            customer_id,
            quote,
            new_device_price,
            serial_number,
            needs_repair,
            resale_price,
            staff_notes,
        } = cmd;

        let customer_payment = valuation::compute_customer_payment(
            new_device_price,
            quote.final_value,
        )
        .map_err(tracerr::from_and_wrap!(=> E))?;
        let currency = quote.final_value.currency;
        let resale_price = resale_price
            .map(|p| valuation::check_resale_price(p, currency))
            .transpose()
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let transaction = Transaction {
            id: transaction::Id::new(),
            number: transaction::Number::generate(),
            customer_id,
            quote,
            serial_number,
            new_device_price: new_device_price.round(),
            customer_payment,
            needs_repair,
            resale_price,
            ready_for_resale: false,
            staff_notes,
            status: transaction::Status::Created,
            contract_id: None,
            created_at: DateTime::now().coerce(),
            contract_signed_at: None,
            completed_at: None,
            cancelled_at: None,
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(transaction.clone())).await.map_err(|e| {
            if e.as_ref().is_unique_violation(constraint::TRANSACTION_NUMBER) {
                tracerr::new!(E::NumberOccupied(transaction.number.clone()))
            } else {
                let wrap = tracerr::map_from_and_wrap!(=> E);
                wrap(e)
            }
        })?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            transaction.id = %transaction.id,
            transaction.number = %transaction.number,
            "created trade-in `Transaction`",
        );

        Ok(transaction)
    }
}

/// Error of [`CreateTradeInTransaction`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Generated [`transaction::Number`] is already taken.
    #[display("`Transaction(number: {_0})` already exists")]
    NumberOccupied(#[error(not(source))] transaction::Number),

    /// Provided amounts are not valid.
    #[display("Invalid trade-in: {_0}")]
    #[from]
    Validation(ValidationError),
}

#[cfg(test)]
mod spec {
    use common::{
        money::Currency,
        operations::{By, Select},
        Handler as _, Money,
    };

    use crate::{
        domain::{transaction, Transaction},
        infra::database::{constraint, memory},
        read,
        test_util::{customer, quote, service, tzs},
        valuation::ValidationError,
    };

    use super::{CreateTradeInTransaction, ExecutionError};

    #[tokio::test]
    async fn creates_transaction_with_customer_payment() {
        let (svc, db) = service();

        let created = svc
            .execute(CreateTradeInTransaction {
                customer_id: customer(),
                quote: quote("500000", &["20000"]),
                new_device_price: tzs("1200000"),
                serial_number: None,
                needs_repair: false,
                resale_price: None,
                staff_notes: None,
            })
            .await
            .unwrap();

        assert_eq!(created.status, transaction::Status::Created);
        assert_eq!(created.quote.final_value, tzs("355000"));
        assert_eq!(created.customer_payment, tzs("845000"));
        assert!(created.number.to_string().starts_with("TI-"));
        assert!(created.contract_id.is_none());

        let stored = db
            .execute(Select(By::<Option<Transaction>, _>::new(
                created.number.clone(),
            )))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.id, created.id);
    }

    #[tokio::test]
    async fn stores_negative_payment_when_customer_is_owed() {
        let (svc, _) = service();

        let created = svc
            .execute(CreateTradeInTransaction {
                customer_id: customer(),
                quote: quote("500000", &["20000"]),
                new_device_price: tzs("315000"),
                serial_number: None,
                needs_repair: true,
                resale_price: None,
                staff_notes: None,
            })
            .await
            .unwrap();

        assert_eq!(created.customer_payment, tzs("-40000"));
        assert_eq!(
            created.settlement(),
            transaction::Settlement::CustomerOwed(tzs("40000")),
        );
    }

    #[tokio::test]
    async fn failure_keeps_quote_and_stores_nothing() {
        let (svc, db) = service();
        let quote = quote("500000", &["20000"]);
        db.fail_next_write(memory::Error::Unavailable);

        let err = svc
            .execute(CreateTradeInTransaction {
                customer_id: customer(),
                quote: quote.clone(),
                new_device_price: tzs("1200000"),
                serial_number: None,
                needs_repair: false,
                resale_price: None,
                staff_notes: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::Db(_)), "{err}");
        assert_eq!(quote.final_value, tzs("355000"));
        let stored = db
            .execute(Select(By::<Vec<Transaction>, _>::new(
                read::transaction::list::Filter::default(),
            )))
            .await
            .unwrap();
        assert!(stored.is_empty());

        // Retrying with the same quote succeeds.
        let created = svc
            .execute(CreateTradeInTransaction {
                customer_id: customer(),
                quote,
                new_device_price: tzs("1200000"),
                serial_number: None,
                needs_repair: false,
                resale_price: None,
                staff_notes: None,
            })
            .await
            .unwrap();
        assert_eq!(created.customer_payment, tzs("845000"));
    }

    #[tokio::test]
    async fn maps_unique_violation_to_occupied_number() {
        let (svc, db) = service();
        db.fail_next_write(memory::Error::UniqueViolation(
            constraint::TRANSACTION_NUMBER,
        ));

        let err = svc
            .execute(CreateTradeInTransaction {
                customer_id: customer(),
                quote: quote("500000", &[]),
                new_device_price: tzs("1200000"),
                serial_number: None,
                needs_repair: false,
                resale_price: None,
                staff_notes: None,
            })
            .await
            .unwrap_err();

        assert!(
            matches!(err.as_ref(), ExecutionError::NumberOccupied(_)),
            "{err}",
        );
    }

    #[tokio::test]
    async fn rejects_new_device_price_in_another_currency() {
        let (svc, _) = service();

        let err = svc
            .execute(CreateTradeInTransaction {
                customer_id: customer(),
                quote: quote("500000", &[]),
                new_device_price: Money {
                    amount: 1000.into(),
                    currency: Currency::Usd,
                },
                serial_number: None,
                needs_repair: false,
                resale_price: None,
                staff_notes: None,
            })
            .await
            .unwrap_err();

        assert!(
            matches!(
                err.as_ref(),
                ExecutionError::Validation(
                    ValidationError::CurrencyMismatch { .. }
                ),
            ),
            "{err}",
        );
    }
    #[tokio::test]
    async fn rejects_negative_new_device_price() {
        let (svc, db) = service();

        let err = svc
            .execute(CreateTradeInTransaction {
                customer_id: customer(),
                quote: quote("500000", &[]),
                new_device_price: tzs("-1200000"),
                serial_number: None,
                needs_repair: false,
                resale_price: None,
                staff_notes: None,
            })
            .await
            .unwrap_err();

        assert!(
            matches!(
                err.as_ref(),
                ExecutionError::Validation(
                    ValidationError::NegativeNewDevicePrice(_)
                ),
            ),
            "{err}",
        );
        let stored = db
            .execute(Select(By::<Vec<Transaction>, _>::new(
                read::transaction::list::Filter::default(),
            )))
            .await
            .unwrap();
        assert!(stored.is_empty());
    }

    #[tokio::test]
    async fn records_resale_price() {
        let (svc, _) = service();

        let created = svc
            .execute(CreateTradeInTransaction {
                customer_id: customer(),
                quote: quote("500000", &["20000"]),
                new_device_price: tzs("1200000"),
                serial_number: None,
                needs_repair: true,
                resale_price: Some(tzs("420000")),
                staff_notes: None,
            })
            .await
            .unwrap();

        assert_eq!(created.resale_price, Some(tzs("420000")));
        assert!(!created.ready_for_resale);

        let err = svc
            .execute(CreateTradeInTransaction {
                customer_id: customer(),
                quote: quote("500000", &["20000"]),
                new_device_price: tzs("1200000"),
                serial_number: None,
                needs_repair: true,
                resale_price: Some(tzs("-1")),
                staff_notes: None,
            })
            .await
            .unwrap_err();

        assert!(
            matches!(
                err.as_ref(),
                ExecutionError::Validation(
                    ValidationError::NegativeResalePrice(_)
                ),
            ),
            "{err}",
        );
    }
}
