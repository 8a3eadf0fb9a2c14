//! [`Command`] for completing a [`Transaction`] after its
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

/// [`Command`] for completing a [`Transaction`] after its
/// [`Contract`] is signed.
#[derive(Clone, Copy, Debug)]
pub struct CompleteTradeInTransaction {
    /// ID of the [`Transaction`] to be completed.
    pub transaction_id: transaction::Id,
}

impl<Db> Command<CompleteTradeInTransaction> for Service<Db>
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
        cmd: CompleteTradeInTransaction,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CompleteTradeInTransaction { transaction_id: id } = cmd;

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
            .transition(transaction::Status::Completed)
            .map_err(tracerr::from_and_wrap!(=> E))?;

        tx.execute(Insert(transaction.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(transaction.id = %id, "completed trade-in `Transaction`");

        Ok(transaction)
    }
}

/// Error of [`CompleteTradeInTransaction`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Transaction`] cannot be completed in its current
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

    use super::{CompleteTradeInTransaction, ExecutionError};

    #[tokio::test]
    async fn completes_signed_transaction() {
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

        let completed = svc
            .execute(CompleteTradeInTransaction { transaction_id: t.id })
            .await
            .unwrap();

        assert_eq!(completed.status, Status::Completed);
        assert!(completed.completed_at.is_some());
    }

    #[tokio::test]
    async fn rejects_skipping_signature() {
        let (svc, _) = service();
        let t = created_transaction(&svc).await;
        _ = svc
            .execute(GenerateTradeInContract { transaction_id: t.id })
            .await
            .unwrap();

        let err = svc
            .execute(CompleteTradeInTransaction { transaction_id: t.id })
            .await
            .unwrap_err();

        assert!(
            matches!(
                err.as_ref(),
                ExecutionError::InvalidTransition(i)
                    if i.from == Status::ContractGenerated
                        && i.to == Status::Completed,
            ),
            "{err}",
        );
    }
}
