//! [`Command`] for cancelling a [`Transaction`] before its
//! [`Contract`] is signed.

use common::operations::{
    By, Commit, Insert, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{transaction, Transaction},
    infra::{database, Database},
    Service,
};
#[cfg(doc)]
use crate::domain::Contract;

use super::Command;

/// [`Command`] for cancelling a [`Transaction`] before its
/// [`Contract`] is signed.
#[derive(Clone, Copy, Debug)]
pub struct CancelTradeInTransaction {
    /// ID of the [`Transaction`] to be cancelled.
    pub transaction_id: transaction::Id,
}

impl<Db> Command<CancelTradeInTransaction> for Service<Db>
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
        cmd: CancelTradeInTransaction,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CancelTradeInTransaction { transaction_id: id } = cmd;

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

        transaction
            .transition(transaction::Status::Cancelled)
            .map_err(tracerr::from_and_wrap!(=> E))?;

        tx.execute(Insert(transaction.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(transaction.id = %id, "cancelled trade-in `Transaction`");

        Ok(transaction)
    }
}

/// Error of [`CancelTradeInTransaction`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Transaction`] cannot be cancelled in its current
    /// [`transaction::Status`].
    #[display("{_0}")]
    #[from]
    InvalidTransition(transaction::InvalidTransition),

    /// [`Transaction`] with the provided ID does not exist.
    #[display("`Transaction(id: {_0})` does not exist")]
    TransactionNotExists(#[error(not(source))] transaction::Id),
}

#[cfg(test)]
mod spec {
    use common::Handler as _;

    use crate::{
        command::{GenerateTradeInContract, SignTradeInContract},
        domain::{contract, transaction::Status},
        test_util::{created_transaction, service},
    };

    use super::{CancelTradeInTransaction, ExecutionError};

    #[tokio::test]
    async fn cancels_created_and_generated_transactions() {
        let (svc, _) = service();
        let created = created_transaction(&svc).await;
        let generated = created_transaction(&svc).await;
        _ = svc
            .execute(GenerateTradeInContract {
                transaction_id: generated.id,
            })
            .await
            .unwrap();

        for t in [created, generated] {
            let cancelled = svc
                .execute(CancelTradeInTransaction { transaction_id: t.id })
                .await
                .unwrap();

            assert_eq!(cancelled.status, Status::Cancelled);
            assert!(cancelled.cancelled_at.is_some());
        }
    }

    #[tokio::test]
    async fn rejects_cancelling_signed_transaction() {
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
            .execute(CancelTradeInTransaction { transaction_id: t.id })
            .await
            .unwrap_err();

        assert!(
            matches!(err.as_ref(), ExecutionError::InvalidTransition(_)),
            "{err}",
        );
    }

    #[tokio::test]
    async fn cancelled_is_terminal() {
        let (svc, _) = service();
        let t = created_transaction(&svc).await;
        _ = svc
            .execute(CancelTradeInTransaction { transaction_id: t.id })
            .await
            .unwrap();

        let err = svc
            .execute(CancelTradeInTransaction { transaction_id: t.id })
            .await
            .unwrap_err();

        assert!(
            matches!(err.as_ref(), ExecutionError::InvalidTransition(_)),
            "{err}",
        );
    }
}
