//! [`Command`] for generating a [`Contract`] of a [`Transaction`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{contract, transaction, Contract, Transaction},
    infra::{
        database::{self, constraint},
        Database,
    },
    Service,
};

use super::Command;

/// [`Command`] for generating a [`Contract`] of a [`Transaction`].
///
/// Idempotent: if the [`Transaction`] already has a [`Contract`], the
/// existing one is returned.
#[derive(Clone, Copy, Debug)]
pub struct GenerateTradeInContract {
    /// ID of the [`Transaction`] to generate a [`Contract`] for.
    pub transaction_id: transaction::Id,
}

impl<Db> Command<GenerateTradeInContract> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Transaction, transaction::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Transaction>, transaction::Id>>,
            Ok = Option<Transaction>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Contract>, transaction::Id>>,
            Ok = Option<Contract>,
            Err = Traced<database::Error>,
        > + Database<Insert<Contract>, Err = Traced<database::Error>>
        + Database<Insert<Transaction>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Contract;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: GenerateTradeInContract,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let GenerateTradeInContract { transaction_id: id } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Concurrent generations must not produce two `Contract`s.
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

        if let Some(existing) = tx
            .execute(Select(By::<Option<Contract>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
        {
            return Ok(existing);
        }

        transaction
            .transition(transaction::Status::ContractGenerated)
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let config = self.config();
        let contract = Contract {
            id: contract::Id::new(),
            transaction_id: id,
            agreed_value: transaction.quote.final_value,
            terms: config.contract_terms.clone(),
            ownership_declaration: config.ownership_declaration.clone(),
            signature: None,
            created_at: DateTime::now().coerce(),
        };
        transaction.contract_id = Some(contract.id);

        tx.execute(Insert(contract.clone())).await.map_err(|e| {
            if e.as_ref().is_unique_violation(constraint::CONTRACT_TRANSACTION)
            {
                tracerr::new!(E::ContractExists(id))
            } else {
                let wrap = tracerr::map_from_and_wrap!(=> E);
                wrap(e)
            }
        })?;
        tx.execute(Insert(transaction))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            transaction.id = %id,
            contract.id = %contract.id,
            "generated trade-in `Contract`",
        );

        Ok(contract)
    }
}

/// Error of [`GenerateTradeInContract`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Contract`] was generated concurrently for the same [`Transaction`].
    #[display("`Contract` of `Transaction(id: {_0})` already exists")]
    ContractExists(#[error(not(source))] transaction::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Transaction`] is not in a [`transaction::Status`] allowing to
    /// generate a [`Contract`].
    #[display("{_0}")]
    #[from]
    InvalidTransition(transaction::InvalidTransition),

    /// [`Transaction`] with the provided ID does not exist.
    #[display("`Transaction(id: {_0})` does not exist")]
    TransactionNotExists(#[error(not(source))] transaction::Id),
}

#[cfg(test)]
mod spec {
    use common::{
        operations::{By, Select},
        Handler as _,
    };

    use crate::{
        command::CancelTradeInTransaction,
        domain::{transaction, Transaction},
        test_util::{created_transaction, service, tzs},
    };

    use super::{ExecutionError, GenerateTradeInContract};

    #[tokio::test]
    async fn generates_contract_with_agreed_value() {
        let (svc, db) = service();
        let t = created_transaction(&svc).await;

        let contract = svc
            .execute(GenerateTradeInContract { transaction_id: t.id })
            .await
            .unwrap();

        assert_eq!(contract.transaction_id, t.id);
        assert_eq!(contract.agreed_value, tzs("355000"));
        assert_eq!(contract.terms, svc.config().contract_terms);
        assert!(!contract.is_signed());

        let stored = db
            .execute(Select(By::<Option<Transaction>, _>::new(t.id)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, transaction::Status::ContractGenerated);
        assert_eq!(stored.contract_id, Some(contract.id));
    }

    #[tokio::test]
    async fn is_idempotent() {
        let (svc, _) = service();
        let t = created_transaction(&svc).await;

        let first = svc
            .execute(GenerateTradeInContract { transaction_id: t.id })
            .await
            .unwrap();
        let second = svc
            .execute(GenerateTradeInContract { transaction_id: t.id })
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.created_at, second.created_at);
    }

    #[tokio::test]
    async fn rejects_cancelled_transaction() {
        let (svc, _) = service();
        let t = created_transaction(&svc).await;
        _ = svc
            .execute(CancelTradeInTransaction { transaction_id: t.id })
            .await
            .unwrap();

        let err = svc
            .execute(GenerateTradeInContract { transaction_id: t.id })
            .await
            .unwrap_err();

        assert!(
            matches!(
                err.as_ref(),
                ExecutionError::InvalidTransition(
                    transaction::InvalidTransition {
                        from: transaction::Status::Cancelled,
                        to: transaction::Status::ContractGenerated,
                    }
                ),
            ),
            "{err}",
        );
    }

    #[tokio::test]
    async fn fails_on_unknown_transaction() {
        let (svc, _) = service();

        let err = svc
            .execute(GenerateTradeInContract {
                transaction_id: transaction::Id::new(),
            })
            .await
            .unwrap_err();

        assert!(
            matches!(err.as_ref(), ExecutionError::TransactionNotExists(_)),
            "{err}",
        );
    }
}
