//! [`Command`] for signing a [`Contract`] of a [`Transaction`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTimeOf,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{contract, customer, transaction, Contract, Transaction},
    infra::{database, Database},
    read, Service,
};

use super::Command;

/// [`Command`] for signing a generated [`Contract`] of a [`Transaction`].
///
/// Signing is one-way: a signed [`Contract`] cannot be signed again.
#[derive(Clone, Debug)]
pub struct SignTradeInContract {
    /// ID of the [`Transaction`] whose [`Contract`] is signed.
    pub transaction_id: transaction::Id,

    /// Name of the customer signing the [`Contract`].
    pub signer: contract::SignerName,

    /// Explicit confirmation that the customer agreed to the
    /// [`contract::Terms`].
    pub customer_agreed_terms: bool,

    /// Identity document presented by the customer, if any.
    pub document: Option<customer::IdDocument>,

    /// Name of the staff member witnessing the signing, if any.
    pub witness: Option<contract::SignerName>,
}

impl<Db> Command<SignTradeInContract> for Service<Db>
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
    type Ok = read::transaction::Signed;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: SignTradeInContract,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let SignTradeInContract {
            transaction_id: id,
            signer,
            customer_agreed_terms,
            document,
            witness,
        } = cmd;

        if !customer_agreed_terms {
            return Err(tracerr::new!(E::NotConfirmed));
        }

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

        let unsignable = transaction::InvalidTransition {
            from: transaction.status,
            to: transaction::Status::ContractSigned,
        };
        let mut contract = tx
            .execute(Select(By::<Option<Contract>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|c| !c.is_signed())
            .ok_or(E::InvalidTransition(unsignable))
            .map_err(tracerr::wrap!())?;

        transaction
            .transition(transaction::Status::ContractSigned)
            .map_err(tracerr::from_and_wrap!(=> E))?;
        contract.signature = Some(contract::Signature {
            signer,
            document,
            witness,
            signed_at: transaction
                .contract_signed_at
                .map_or_else(DateTimeOf::now, DateTimeOf::coerce),
        });

        tx.execute(Insert(contract.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(transaction.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            transaction.id = %id,
            contract.id = %contract.id,
            "signed trade-in `Contract`",
        );

        Ok(read::transaction::Signed {
            transaction,
            contract,
        })
    }
}

/// Error of [`SignTradeInContract`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Transaction`] has no [`Contract`] awaiting a signature.
    #[display("{_0}")]
    #[from]
    InvalidTransition(transaction::InvalidTransition),

    /// Customer didn't confirm agreeing to the [`contract::Terms`].
    #[display("Customer didn't agree to the `Contract` terms")]
    NotConfirmed,

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
        command::GenerateTradeInContract,
        domain::{
            contract,
            transaction::{self, Status},
            Contract,
        },
        test_util::{created_transaction, service},
    };

    use super::{ExecutionError, SignTradeInContract};

    fn sign(transaction_id: transaction::Id) -> SignTradeInContract {
        SignTradeInContract {
            transaction_id,
            signer: contract::SignerName::new("Amina Juma").unwrap(),
            customer_agreed_terms: true,
            document: None,
            witness: None,
        }
    }

    #[tokio::test]
    async fn signs_generated_contract() {
        let (svc, db) = service();
        let t = created_transaction(&svc).await;
        _ = svc
            .execute(GenerateTradeInContract { transaction_id: t.id })
            .await
            .unwrap();

        let signed = svc.execute(sign(t.id)).await.unwrap();

        assert_eq!(signed.transaction.status, Status::ContractSigned);
        assert!(signed.transaction.contract_signed_at.is_some());
        assert!(signed.contract.is_signed());

        let stored = db
            .execute(Select(By::<Option<Contract>, _>::new(t.id)))
            .await
            .unwrap()
            .unwrap();
        assert!(stored.is_signed());
    }

    #[tokio::test]
    async fn rejects_signing_without_contract() {
        let (svc, _) = service();
        let t = created_transaction(&svc).await;

        let err = svc.execute(sign(t.id)).await.unwrap_err();

        assert!(
            matches!(
                err.as_ref(),
                ExecutionError::InvalidTransition(i)
                    if i.from == Status::Created
                        && i.to == Status::ContractSigned,
            ),
            "{err}",
        );
    }

    #[tokio::test]
    async fn rejects_signing_twice() {
        let (svc, _) = service();
        let t = created_transaction(&svc).await;
        _ = svc
            .execute(GenerateTradeInContract { transaction_id: t.id })
            .await
            .unwrap();
        _ = svc.execute(sign(t.id)).await.unwrap();

        let err = svc.execute(sign(t.id)).await.unwrap_err();

        assert!(
            matches!(err.as_ref(), ExecutionError::InvalidTransition(_)),
            "{err}",
        );
    }

    #[tokio::test]
    async fn requires_explicit_confirmation() {
        let (svc, _) = service();
        let t = created_transaction(&svc).await;
        _ = svc
            .execute(GenerateTradeInContract { transaction_id: t.id })
            .await
            .unwrap();

        let err = svc
            .execute(SignTradeInContract {
                customer_agreed_terms: false,
                ..sign(t.id)
            })
            .await
            .unwrap_err();

        assert!(
            matches!(err.as_ref(), ExecutionError::NotConfirmed),
            "{err}",
        );
    }
}
