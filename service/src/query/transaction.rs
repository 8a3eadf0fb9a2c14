//! [`Query`] collection related to a single [`Transaction`].

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    domain::{transaction, Contract as ContractEntity, Transaction},
    infra::{database, Database},
    read, Query, Service,
};

use super::DatabaseQuery;

/// Queries a [`Transaction`] by its [`transaction::Id`].
pub type ById = DatabaseQuery<By<Option<Transaction>, transaction::Id>>;

/// Queries a [`Transaction`] by its [`transaction::Number`].
pub type ByNumber = DatabaseQuery<By<Option<Transaction>, transaction::Number>>;

/// Queries a [`ContractEntity`] of a [`Transaction`] by the
/// [`transaction::Id`].
pub type Contract =
    DatabaseQuery<By<Option<ContractEntity>, transaction::Id>>;

/// [`Query`] of a [`Transaction`] together with its signed
/// [`ContractEntity`], for handing the traded-in device over to the sale and
/// inventory flows.
///
/// Returns [`None`] unless the [`ContractEntity`] is signed.
#[derive(Clone, Copy, Debug)]
pub struct Signed {
    /// ID of the [`Transaction`] to be queried.
    pub transaction_id: transaction::Id,
}

impl<Db> Query<Signed> for Service<Db>
where
    Db: Database<
            Select<By<Option<Transaction>, transaction::Id>>,
            Ok = Option<Transaction>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<ContractEntity>, transaction::Id>>,
            Ok = Option<ContractEntity>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Option<read::transaction::Signed>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Signed { transaction_id: id }: Signed,
    ) -> Result<Self::Ok, Self::Err> {
        let Some(contract) = self
            .database()
            .execute(Select(By::<Option<ContractEntity>, _>::new(id)))
            .await
            .map_err(tracerr::wrap!())?
            .filter(ContractEntity::is_signed)
        else {
            return Ok(None);
        };

        let transaction = self
            .database()
            .execute(Select(By::<Option<Transaction>, _>::new(id)))
            .await
            .map_err(tracerr::wrap!())?;

        Ok(transaction.map(|transaction| read::transaction::Signed {
            transaction,
            contract,
        }))
    }
}
