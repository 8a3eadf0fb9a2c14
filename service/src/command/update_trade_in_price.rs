//! [`Command`] for updating an existing [`Price`] schedule.

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
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

/// [`Command`] for updating an existing [`Price`] schedule.
///
/// Only the provided fields are changed.
#[derive(Clone, Debug, Default)]
pub struct UpdateTradeInPrice {
    /// ID of the [`Price`] to be updated.
    pub id: price::Id,

    /// New [`Device`] of the [`Price`].
    pub device: Option<Device>,

    /// New base price of the [`Price`].
    pub base_price: Option<Money>,

    /// New [`price::ConditionMultipliers`] of the [`Price`].
    pub multipliers: Option<price::ConditionMultipliers>,

    /// New active flag of the [`Price`].
    pub is_active: Option<bool>,

    /// New [`price::Notes`] of the [`Price`].
    ///
    /// `Some(None)` removes the existing notes.
    pub notes: Option<Option<price::Notes>>,
}

impl<Db> Command<UpdateTradeInPrice> for Service<Db>
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
        cmd: UpdateTradeInPrice,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateTradeInPrice {
            id,
            device,
            base_price,
            multipliers,
            is_active,
            notes,
        } = cmd;

        if let Some(p) = base_price.filter(Money::is_negative) {
            return Err(tracerr::new!(E::NegativeBasePrice(p)));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid lost updates.
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

        if let Some(device) = device {
            price.device = device;
        }
        if let Some(base_price) = base_price {
            price.base_price = base_price.round();
        }
        if let Some(multipliers) = multipliers {
            price.multipliers = multipliers;
        }
        if let Some(is_active) = is_active {
            price.is_active = is_active;
        }
        if let Some(notes) = notes {
            price.notes = notes;
        }
        price.updated_at = DateTime::now().coerce();

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

        log::info!(price.id = %price.id, "updated trade-in `Price`");

        Ok(price)
    }
}

/// Error of [`UpdateTradeInPrice`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Device`] already has another [`Price`].
    #[display("`{} {}` device already has a `Price`", _0.name, _0.model)]
    DeviceOccupied(#[error(not(source))] Device),

    /// Base price is negative.
    #[display("Base price `{_0}` is negative")]
    NegativeBasePrice(#[error(not(source))] Money),

    /// [`Price`] with the provided ID does not exist.
    #[display("`Price(id: {_0})` does not exist")]
    PriceNotExists(#[error(not(source))] price::Id),
}

#[cfg(test)]
mod spec {
    use common::Handler as _;

    use crate::{
        command::CreateTradeInPrice,
        domain::price,
        test_util::{device, multipliers, service, tzs},
    };

    use super::{ExecutionError, UpdateTradeInPrice};

    #[tokio::test]
    async fn updates_only_provided_fields() {
        let (svc, _) = service();
        let created = svc
            .execute(CreateTradeInPrice {
                device: device("iPhone 12", "A2403"),
                base_price: tzs("500000"),
                multipliers: Some(multipliers("1", "0.75", "0.5", "0.3")),
                notes: None,
            })
            .await
            .unwrap();

        let updated = svc
            .execute(UpdateTradeInPrice {
                id: created.id,
                base_price: Some(tzs("450000")),
                ..UpdateTradeInPrice::default()
            })
            .await
            .unwrap();

        assert_eq!(updated.base_price, tzs("450000"));
        assert_eq!(updated.device, created.device);
        assert_eq!(updated.multipliers, created.multipliers);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn rejects_renaming_to_occupied_device() {
        let (svc, _) = service();
        let mut ids = vec![];
        for model in ["A2403", "A2172"] {
            let price = svc
                .execute(CreateTradeInPrice {
                    device: device("iPhone 12", model),
                    base_price: tzs("500000"),
                    multipliers: None,
                    notes: None,
                })
                .await
                .unwrap();
            ids.push(price.id);
        }

        let err = svc
            .execute(UpdateTradeInPrice {
                id: ids[1],
                device: Some(device("iPhone 12", "A2403")),
                ..UpdateTradeInPrice::default()
            })
            .await
            .unwrap_err();

        assert!(
            matches!(err.as_ref(), ExecutionError::DeviceOccupied(_)),
            "{err}",
        );
    }

    #[tokio::test]
    async fn fails_on_unknown_price() {
        let (svc, _) = service();

        let err = svc
            .execute(UpdateTradeInPrice {
                id: price::Id::new(),
                is_active: Some(false),
                ..UpdateTradeInPrice::default()
            })
            .await
            .unwrap_err();

        assert!(
            matches!(err.as_ref(), ExecutionError::PriceNotExists(_)),
            "{err}",
        );
    }
}
