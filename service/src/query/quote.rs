//! [`QuoteTradeIn`] [`Query`] definition.

use common::{
    operations::{By, Select},
    Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{condition, damage, device, Device, Price, Quote},
    infra::{database, Database},
    valuation::{self, Inspection, ValidationError},
    Query, Service,
};

/// [`Query`] valuing an inspected [`Device`] against its [`Price`] schedule.
///
/// Nothing is persisted: the resulting [`Quote`] stays with the caller until
/// the customer accepts it.
#[derive(Clone, Debug)]
pub struct QuoteTradeIn {
    /// [`Device`] being valued.
    pub device: Device,

    /// [IMEI] of the [`Device`], if provided.
    ///
    /// [IMEI]: device::Imei
    pub imei: Option<device::Imei>,

    /// Raw condition rating, one of `excellent`, `good`, `fair` or `poor`.
    pub condition: String,

    /// [`condition::Description`] of the [`Device`], if provided.
    pub condition_description: Option<condition::Description>,

    /// Damage [`damage::Deduction`]s found on the [`Device`].
    pub deductions: Vec<damage::Deduction>,

    /// Manually entered base price replacing the one of the [`Price`]
    /// schedule.
    pub base_price_override: Option<Money>,
}

impl<Db> Query<QuoteTradeIn> for Service<Db>
where
    Db: Database<
        Select<By<Option<Price>, Device>>,
        Ok = Option<Price>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Quote;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        query: QuoteTradeIn,
    ) -> Result<Self::Ok, Self::Err> {
        let QuoteTradeIn {
            device,
            imei,
            condition,
            condition_description,
            deductions,
            base_price_override,
        } = query;

        let schedule = self
            .database()
            .execute(Select(By::<Option<Price>, _>::new(device.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!())?;

        valuation::compute_quote(
            schedule.as_ref(),
            Inspection {
                device,
                imei,
                condition: &condition,
                condition_description,
                deductions,
                base_price_override,
            },
            &self.config().default_multipliers,
        )
        .map_err(tracerr::from_and_wrap!())
    }
}

/// Error of [`QuoteTradeIn`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Inspected [`Device`] cannot be valued.
    #[display("Invalid trade-in: {_0}")]
    Validation(ValidationError),
}

#[cfg(test)]
mod spec {
    use common::Handler as _;

    use crate::{
        command::{CreateTradeInPrice, DeleteTradeInPrice},
        domain::{damage, device, Device},
        test_util::{device, multipliers, service, tzs},
        valuation::ValidationError,
    };

    use super::{ExecutionError, QuoteTradeIn};

    fn inspect(device: Device, condition: &str) -> QuoteTradeIn {
        QuoteTradeIn {
            device,
            imei: device::Imei::new("356938035643809"),
            condition: condition.into(),
            condition_description: None,
            deductions: vec![damage::Deduction {
                description: damage::Description::new("Cracked back glass")
                    .unwrap(),
                amount: tzs("20000"),
                spare_part_id: None,
            }],
            base_price_override: None,
        }
    }

    #[tokio::test]
    async fn values_device_by_its_schedule() {
        let (svc, _) = service();
        _ = svc
            .execute(CreateTradeInPrice {
                device: device("iPhone 12", "A2403"),
                base_price: tzs("500000"),
                multipliers: Some(multipliers("1", "0.75", "0.5", "0.3")),
                notes: None,
            })
            .await
            .unwrap();

        let quote = svc
            .execute(inspect(device("iPhone 12", "A2403"), "Good"))
            .await
            .unwrap();

        assert_eq!(quote.adjusted_price, tzs("375000"));
        assert_eq!(quote.final_value, tzs("355000"));
    }

    #[tokio::test]
    async fn fails_without_schedule_or_override() {
        let (svc, _) = service();

        let err = svc
            .execute(inspect(device("Pixel 7", "GVU6C"), "good"))
            .await
            .unwrap_err();

        assert!(
            matches!(
                err.as_ref(),
                ExecutionError::Validation(ValidationError::MissingPrice),
            ),
            "{err}",
        );
    }

    #[tokio::test]
    async fn ignores_deactivated_schedule() {
        let (svc, _) = service();
        let price = svc
            .execute(CreateTradeInPrice {
                device: device("iPhone 12", "A2403"),
                base_price: tzs("500000"),
                multipliers: None,
                notes: None,
            })
            .await
            .unwrap();
        _ = svc
            .execute(DeleteTradeInPrice { id: price.id })
            .await
            .unwrap();

        let err = svc
            .execute(inspect(device("iPhone 12", "A2403"), "good"))
            .await
            .unwrap_err();

        assert!(
            matches!(
                err.as_ref(),
                ExecutionError::Validation(ValidationError::MissingPrice),
            ),
            "{err}",
        );
    }

    #[tokio::test]
    async fn values_unknown_device_by_override_and_defaults() {
        let (svc, _) = service();

        let quote = svc
            .execute(QuoteTradeIn {
                base_price_override: Some(tzs("100000")),
                ..inspect(device("Pixel 7", "GVU6C"), "fair")
            })
            .await
            .unwrap();

        // Configured default for `fair` is `0.7`.
        assert_eq!(quote.adjusted_price, tzs("70000"));
        assert_eq!(quote.final_value, tzs("50000"));
    }
}
