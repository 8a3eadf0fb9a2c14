//! [`Command`] for marking a traded-in device of a [`Transaction`] as ready
//! for resale.

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{transaction, Transaction},
    infra::{database, Database},
    valuation::{self, ValidationError},
    Service,
};

use super::Command;

/// [`Command`] for marking a traded-in device of a [`Transaction`] as ready
/// for resale.
///
/// The device must be received by the shop, so the [`Transaction`] is either
/// [`ContractSigned`] or [`Completed`]. Clears the `needs_repair` flag.
///
/// [`Completed`]: transaction::Status::Completed
/// [`ContractSigned`]: transaction::Status::ContractSigned
#[derive(Clone, Copy, Debug)]
pub struct MarkTradeInReadyForResale {
    /// ID of the [`Transaction`] whose device is ready for resale.
    pub transaction_id: transaction::Id,

    /// New resale price of the device, if any.
    ///
    /// Keeps the current one, if [`None`].
    pub resale_price: Option<Money>,
}

impl<Db> Command<MarkTradeInReadyForResale> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Transaction, transaction::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Transaction>, transaction::Id>>,
            Ok = Option<Transaction>,
            Err = Traced<database::Error>,
        > + Database<Insert<Transaction>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Transaction;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: MarkTradeInReadyForResale,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let MarkTradeInReadyForResale {
            transaction_id: id,
            resale_price,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut transaction = tx
            .execute(Select(By::<Option<Transaction>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::TransactionNotExists(id))
            .map_err(tracerr::wrap!())?;

        if !transaction.is_device_received() {
            return Err(tracerr::new!(E::DeviceNotReceived(
                transaction.status
            )));
        }
        if let Some(price) = resale_price {
            transaction.resale_price = Some(
                valuation::check_resale_price(
                    price,
                    transaction.quote.final_value.currency,
                )
                .map_err(tracerr::from_and_wrap!(=> E))?,
            );
        }
        transaction.ready_for_resale = true;
        transaction.needs_repair = false;

        tx.execute(Insert(transaction.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            transaction.id = %id,
            "marked trade-in `Transaction` device ready for resale",
        );

        Ok(transaction)
    }
}

/// Error of [`MarkTradeInReadyForResale`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Device is not received by the shop yet.
    #[display("Device of `Transaction` in `{_0}` status is not received yet")]
    DeviceNotReceived(#[error(not(source))] transaction::Status),

    /// [`Transaction`] with the provided ID does not exist.
    #[display("`Transaction(id: {_0})` does not exist")]
    TransactionNotExists(#[error(not(source))] transaction::Id),

    /// Provided resale price is not valid.
    #[display("Invalid resale price: {_0}")]
    #[from]
    Validation(ValidationError),
}

#[cfg(test)]
mod spec {
    use common::{
        operations::{By, Select},
        Handler as _,
    };

    use crate::{
        command::{GenerateTradeInContract, SignTradeInContract},
        domain::{contract, transaction, Transaction},
        test_util::{created_transaction, service, tzs},
        valuation::ValidationError,
    };

    use super::{ExecutionError, MarkTradeInReadyForResale};

    #[tokio::test]
    async fn marks_signed_transaction() {
        let (svc, db) = service();
        let t = created_transaction(&svc).await;
        _ = svc
            .execute(GenerateTradeInContract { transaction_id: t.id })
            .await
            .unwrap();
        _ = svc
            .execute(SignTradeInContract {
                transaction_id: t.id,
                signer: contract::SignerName::new("Amina Juma").unwrap(),
                customer_agreed_terms: true,
                document: None,
                witness: None,
            })
            .await
            .unwrap();

        let marked = svc
            .execute(MarkTradeInReadyForResale {
                transaction_id: t.id,
                resale_price: Some(tzs("450000")),
            })
            .await
            .unwrap();

        assert!(marked.ready_for_resale);
        assert!(!marked.needs_repair);
        assert_eq!(marked.resale_price, Some(tzs("450000")));
        assert_eq!(marked.status, transaction::Status::ContractSigned);

        let stored = db
            .execute(Select(By::<Option<Transaction>, _>::new(t.id)))
            .await
            .unwrap()
            .unwrap();
        assert!(stored.ready_for_resale);
        assert_eq!(stored.resale_price, Some(tzs("450000")));
    }

    #[tokio::test]
    async fn rejects_device_not_received() {
        let (svc, _) = service();
        let t = created_transaction(&svc).await;

        let err = svc
            .execute(MarkTradeInReadyForResale {
                transaction_id: t.id,
                resale_price: None,
            })
            .await
            .unwrap_err();

        assert!(
            matches!(
                err.as_ref(),
                ExecutionError::DeviceNotReceived(
                    transaction::Status::Created
                ),
            ),
            "{err}",
        );
    }

    #[tokio::test]
    async fn rejects_negative_resale_price() {
        let (svc, _) = service();
        let t = created_transaction(&svc).await;
        _ = svc
            .execute(GenerateTradeInContract { transaction_id: t.id })
            .await
            .unwrap();
        _ = svc
            .execute(SignTradeInContract {
                transaction_id: t.id,
                signer: contract::SignerName::new("Amina Juma").unwrap(),
                customer_agreed_terms: true,
                document: None,
                witness: None,
            })
            .await
            .unwrap();

        let err = svc
            .execute(MarkTradeInReadyForResale {
                transaction_id: t.id,
                resale_price: Some(tzs("-5")),
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

    #[tokio::test]
    async fn rejects_unknown_transaction() {
        let (svc, _) = service();

        let err = svc
            .execute(MarkTradeInReadyForResale {
                transaction_id: transaction::Id::new(),
                resale_price: None,
            })
            .await
            .unwrap_err();

        assert!(
            matches!(err.as_ref(), ExecutionError::TransactionNotExists(_)),
            "{err}",
        );
    }
}
