//! [`Command`] for creating a new [`Price`] schedule.

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{price, Device, Price},
    infra::{
        database::{self, constraint},
        Database,
    },
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Price`] schedule.
#[derive(Clone, Debug)]
pub struct CreateTradeInPrice {
    /// [`Device`] a new [`Price`] is for.
    pub device: Device,

    /// Base price of the [`Device`] in an excellent condition.
    pub base_price: Money,

    /// [`price::ConditionMultipliers`] of a new [`Price`].
    ///
    /// The configured defaults are used, if [`None`].
    pub multipliers: Option<price::ConditionMultipliers>,

    /// [`price::Notes`] of a new [`Price`].
    pub notes: Option<price::Notes>,
}

impl<Db> Command<CreateTradeInPrice> for Service<Db>
where
    Db: Database<
            Select<By<Option<Price>, Device>>,
            Ok = Option<Price>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<Price>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Price;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateTradeInPrice,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateTradeInPrice {
            device,
            base_price,
            multipliers,
            notes,
        } = cmd;

        if base_price.is_negative() {
            return Err(tracerr::new!(E::NegativeBasePrice(base_price)));
        }

        let existing = self
            .database()
            .execute(Select(By::<Option<Price>, _>::new(device.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if existing.is_some() {
            return Err(tracerr::new!(E::DeviceOccupied(device)));
        }

        let now = DateTime::now();
        let price = Price {
            id: price::Id::new(),
            device,
            base_price: base_price.round(),
            multipliers: multipliers
                .unwrap_or(self.config().default_multipliers),
            is_active: true,
            notes,
            created_at: now.coerce(),
            updated_at: now.coerce(),
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(price.clone())).await.map_err(|e| {
            if e.as_ref().is_unique_violation(constraint::PRICE_DEVICE) {
                tracerr::new!(E::DeviceOccupied(price.device.clone()))
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
            price.id = %price.id,
            "created trade-in `Price` for `{} {}`",
            price.device.name,
            price.device.model,
        );

        Ok(price)
    }
}

/// Error of [`CreateTradeInPrice`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Device`] already has a [`Price`].
    #[display("`{} {}` device already has a `Price`", _0.name, _0.model)]
    DeviceOccupied(#[error(not(source))] Device),

    /// Base price is negative.
    #[display("Base price `{_0}` is negative")]
    NegativeBasePrice(#[error(not(source))] Money),
}

#[cfg(test)]
mod spec {
    use common::{
        operations::{By, Select},
        Handler as _,
    };

    use crate::{
        domain::Price,
        infra::database::{constraint, memory},
        test_util::{device, multipliers, service, tzs},
    };

    use super::{CreateTradeInPrice, ExecutionError};

    #[tokio::test]
    async fn creates_price_with_default_multipliers() {
        let (svc, db) = service();

        let price = svc
            .execute(CreateTradeInPrice {
                device: device("iPhone 12", "A2403"),
                base_price: tzs("500000"),
                multipliers: None,
                notes: None,
            })
            .await
            .unwrap();

        assert!(price.is_active);
        assert_eq!(price.multipliers, svc.config().default_multipliers);

        let stored = db
            .execute(Select(By::<Option<Price>, _>::new(price.device.clone())))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.id, price.id);
    }

    #[tokio::test]
    async fn rejects_occupied_device() {
        let (svc, _) = service();
        let cmd = CreateTradeInPrice {
            device: device("iPhone 12", "A2403"),
            base_price: tzs("500000"),
            multipliers: Some(multipliers("1", "0.75", "0.5", "0.3")),
            notes: None,
        };
        _ = svc.execute(cmd.clone()).await.unwrap();

        let err = svc.execute(cmd).await.unwrap_err();

        assert!(
            matches!(err.as_ref(), ExecutionError::DeviceOccupied(_)),
            "{err}",
        );
    }

    #[tokio::test]
    async fn maps_unique_violation_to_occupied_device() {
        let (svc, db) = service();
        db.fail_next_write(memory::Error::UniqueViolation(
            constraint::PRICE_DEVICE,
        ));

        let err = svc
            .execute(CreateTradeInPrice {
                device: device("iPhone 12", "A2403"),
                base_price: tzs("500000"),
                multipliers: None,
                notes: None,
            })
            .await
            .unwrap_err();

        assert!(
            matches!(err.as_ref(), ExecutionError::DeviceOccupied(_)),
            "{err}",
        );
    }

    #[tokio::test]
    async fn rejects_negative_base_price() {
        let (svc, _) = service();

        let err = svc
            .execute(CreateTradeInPrice {
                device: device("iPhone 12", "A2403"),
                base_price: tzs("-1"),
                multipliers: None,
                notes: None,
            })
            .await
            .unwrap_err();

        assert!(
            matches!(err.as_ref(), ExecutionError::NegativeBasePrice(_)),
            "{err}",
        );
    }
}
