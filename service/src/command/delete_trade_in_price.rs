//! [`Command`] for deleting a [`Price`] schedule.

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{price, Price},
    infra::{database, Database},
    Service,
};
#[cfg(doc)]
use crate::domain::Transaction;

use super::Command;

/// [`Command`] for deleting a [`Price`] schedule.
///
/// The [`Price`] is only deactivated, so the [`Transaction`]s valued by it
/// keep their history.
#[derive(Clone, Copy, Debug)]
pub struct DeleteTradeInPrice {
    /// ID of the [`Price`] to be deleted.
    pub id: price::Id,
}

impl<Db> Command<DeleteTradeInPrice> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Price, price::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Price>, price::Id>>,
            Ok = Option<Price>,
            Err = Traced<database::Error>,
        > + Database<Insert<Price>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Price;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: DeleteTradeInPrice,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteTradeInPrice { id } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut price = tx
            .execute(Select(By::<Option<Price>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PriceNotExists(id))
            .map_err(tracerr::wrap!())?;

        if price.is_active {
            price.is_active = false;
            price.updated_at = DateTime::now().coerce();

            tx.execute(Insert(price.clone()))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            tx.execute(Commit)
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;

            log::info!(price.id = %price.id, "deactivated trade-in `Price`");
        }

        Ok(price)
    }
}

/// Error of [`DeleteTradeInPrice`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Price`] with the provided ID does not exist.
    #[display("`Price(id: {_0})` does not exist")]
    PriceNotExists(#[error(not(source))] price::Id),
}

#[cfg(test)]
mod spec {
    use common::{
        operations::{By, Select},
        Handler as _,
    };

    use crate::{
        command::CreateTradeInPrice,
        domain::{price, Price},
        test_util::{device, service, tzs},
    };

    use super::{DeleteTradeInPrice, ExecutionError};

    #[tokio::test]
    async fn deactivates_price() {
        let (svc, db) = service();
        let created = svc
            .execute(CreateTradeInPrice {
                device: device("Galaxy S21", "SM-G991B"),
                base_price: tzs("400000"),
                multipliers: None,
                notes: None,
            })
            .await
            .unwrap();

        let deleted = svc
            .execute(DeleteTradeInPrice { id: created.id })
            .await
            .unwrap();

        assert!(!deleted.is_active);
        let stored = db
            .execute(Select(By::<Option<Price>, _>::new(created.id)))
            .await
            .unwrap()
            .expect("`Price` is kept");
        assert!(!stored.is_active);
        assert_eq!(stored.base_price, created.base_price);
    }

    #[tokio::test]
    async fn deleting_twice_is_noop() {
        let (svc, _) = service();
        let created = svc
            .execute(CreateTradeInPrice {
                device: device("Galaxy S21", "SM-G991B"),
                base_price: tzs("400000"),
                multipliers: None,
                notes: None,
            })
            .await
            .unwrap();

        let first = svc
            .execute(DeleteTradeInPrice { id: created.id })
            .await
            .unwrap();
        let second = svc
            .execute(DeleteTradeInPrice { id: created.id })
            .await
            .unwrap();

        assert!(!second.is_active);
        assert_eq!(first.updated_at, second.updated_at);
    }

    #[tokio::test]
    async fn fails_on_unknown_price() {
        let (svc, _) = service();

        let err = svc
            .execute(DeleteTradeInPrice {
                id: price::Id::new(),
            })
            .await
            .unwrap_err();

        assert!(
            matches!(err.as_ref(), ExecutionError::PriceNotExists(_)),
            "{err}",
        );
    }
}
