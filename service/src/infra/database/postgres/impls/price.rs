//! [`Price`]-related [`Database`] implementations.

use common::{
    operations::{By, Insert, Lock, Select},
    Money,
};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{price, Device, Price},
    infra::{
        database::{
            self,
            postgres::{Connection, FuzzPattern},
            Postgres,
        },
        Database,
    },
    read,
};

/// Columns of the `trade_in_prices` table to build a [`Price`] from.
const COLUMNS: &str = "\
    id, device_name, device_model, \
    base_price, base_price_currency, \
    excellent, good, fair, poor, \
    is_active, notes, created_at, updated_at";

/// Builds a [`Price`] from the provided [`Row`] selected with [`COLUMNS`].
fn from_row(row: &Row) -> Price {
    Price {
        id: row.get("id"),
        device: Device {
            name: row.get("device_name"),
            model: row.get("device_model"),
        },
        base_price: Money {
            amount: row.get("base_price"),
            currency: row.get("base_price_currency"),
        },
        multipliers: price::ConditionMultipliers {
            excellent: row.get("excellent"),
            good: row.get("good"),
            fair: row.get("fair"),
            poor: row.get("poor"),
        },
        is_active: row.get("is_active"),
        notes: row.get("notes"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

impl<C> Database<Lock<By<Price, price::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Price, price::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            SELECT id \
            FROM trade_in_prices \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query_opt(SQL, &[&by.into_inner()])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Select<By<Option<Price>, price::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Price>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Price>, price::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let sql = format!(
            "SELECT {COLUMNS} \
             FROM trade_in_prices \
             WHERE id = $1::UUID"
        );
        Ok(self
            .query_opt(&sql, &[&by.into_inner()])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Option<Price>, Device>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Price>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Price>, Device>>,
    ) -> Result<Self::Ok, Self::Err> {
        let Device { name, model } = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM trade_in_prices \
             WHERE device_name = $1::VARCHAR \
               AND device_model = $2::VARCHAR"
        );
        Ok(self
            .query_opt(&sql, &[&name, &model])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Vec<Price>, read::price::list::Filter>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Price>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Price>, read::price::list::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::price::list::Filter { is_active, search } = by.into_inner();
        let pattern = search.as_ref().map(FuzzPattern::new);

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM trade_in_prices \
             WHERE ($1::BOOLEAN IS NULL OR is_active = $1::BOOLEAN) \
               AND ($2::TEXT[] IS NULL \
                    OR device_name ILIKE ANY($2::TEXT[]) \
                    OR device_model ILIKE ANY($2::TEXT[])) \
             ORDER BY device_name, device_model"
        );
        Ok(self
            .query(&sql, &[&is_active, &pattern])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Insert<Price>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(price): Insert<Price>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            INSERT INTO trade_in_prices (\
                id, device_name, device_model, \
                base_price, base_price_currency, \
                excellent, good, fair, poor, \
                is_active, notes, created_at, updated_at\
            ) \
            VALUES (\
                $1::UUID, $2::VARCHAR, $3::VARCHAR, \
                $4::NUMERIC, $5::INT2, \
                $6::NUMERIC, $7::NUMERIC, $8::NUMERIC, $9::NUMERIC, \
                $10::BOOLEAN, $11::TEXT, $12::TIMESTAMPTZ, $13::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET device_name = EXCLUDED.device_name, \
                device_model = EXCLUDED.device_model, \
                base_price = EXCLUDED.base_price, \
                base_price_currency = EXCLUDED.base_price_currency, \
                excellent = EXCLUDED.excellent, \
                good = EXCLUDED.good, \
                fair = EXCLUDED.fair, \
                poor = EXCLUDED.poor, \
                is_active = EXCLUDED.is_active, \
                notes = EXCLUDED.notes, \
                updated_at = EXCLUDED.updated_at";
        let Price {
            id,
            device: Device { name, model },
            base_price,
            multipliers,
            is_active,
            notes,
            created_at,
            updated_at,
        } = price;
        self.exec(
            SQL,
            &[
                &id,
                &name,
                &model,
                &base_price.amount,
                &base_price.currency,
                &multipliers.excellent,
                &multipliers.good,
                &multipliers.fair,
                &multipliers.poor,
                &is_active,
                &notes,
                &created_at,
                &updated_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}
