//! [`Transaction`]-related [`Database`] implementations.

use common::{
    operations::{By, Insert, Lock, Select},
    Money,
};
use itertools::Itertools as _;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{damage, transaction, Device, Quote, Transaction},
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

/// Columns of the `trade_in_transactions` table to build a [`Transaction`]
/// from.
const COLUMNS: &str = "\
    id, number, customer_id, \
    device_name, device_model, imei, serial_number, \
    condition, condition_description, \
    currency, base_price, multiplier, adjusted_price, \
    total_deductions, final_value, \
    new_device_price, customer_payment, \
    needs_repair, resale_price, ready_for_resale, \
    staff_notes, status, contract_id, \
    created_at, contract_signed_at, completed_at, cancelled_at";

/// Builds a [`Transaction`] from the provided [`Row`] selected with
/// [`COLUMNS`] and its damage [`damage::Deduction`]s.
fn from_row(row: &Row, deductions: Vec<damage::Deduction>) -> Transaction {
    let currency = row.get("currency");
    let money = |column: &str| Money {
        amount: row.get(column),
        currency,
    };

    Transaction {
        id: row.get("id"),
        number: row.get("number"),
        customer_id: row.get("customer_id"),
        quote: Quote {
            device: Device {
                name: row.get("device_name"),
                model: row.get("device_model"),
            },
            imei: row.get("imei"),
            condition: row.get("condition"),
            condition_description: row.get("condition_description"),
            base_price: money("base_price"),
            multiplier: row.get("multiplier"),
            adjusted_price: money("adjusted_price"),
            deductions,
            total_deductions: money("total_deductions"),
            final_value: money("final_value"),
        },
        serial_number: row.get("serial_number"),
        new_device_price: money("new_device_price"),
        customer_payment: money("customer_payment"),
        needs_repair: row.get("needs_repair"),
        resale_price: row
            .get::<_, Option<_>>("resale_price")
            .map(|amount| Money { amount, currency }),
        ready_for_resale: row.get("ready_for_resale"),
        staff_notes: row.get("staff_notes"),
        status: row.get("status"),
        contract_id: row.get("contract_id"),
        created_at: row.get("created_at"),
        contract_signed_at: row.get("contract_signed_at"),
        completed_at: row.get("completed_at"),
        cancelled_at: row.get("cancelled_at"),
    }
}

impl<C: Connection> Postgres<C> {
    /// Builds [`Transaction`]s from the provided [`Row`]s, selecting their
    /// damage [`damage::Deduction`]s.
    async fn transactions(
        &self,
        rows: Vec<Row>,
    ) -> Result<Vec<Transaction>, Traced<database::Error>> {
        if rows.is_empty() {
            return Ok(vec![]);
        }
        let ids = rows
            .iter()
            .map(|r| r.get("id"))
            .collect::<Vec<transaction::Id>>();

        const SQL: &str = "\
            SELECT transaction_id, description, amount, spare_part_id \
            FROM trade_in_deductions \
            WHERE transaction_id = ANY($1::UUID[]) \
            ORDER BY transaction_id, position";
        let mut deductions = self
            .query(SQL, &[&ids])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .into_group_map_by(|r| {
                r.get::<_, transaction::Id>("transaction_id")
            });

        Ok(rows
            .iter()
            .map(|row| {
                let id = row.get("id");
                let currency = row.get("currency");
                let deductions = deductions
                    .remove(&id)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|r| damage::Deduction {
                        description: r.get("description"),
                        amount: Money {
                            amount: r.get("amount"),
                            currency,
                        },
                        spare_part_id: r.get("spare_part_id"),
                    })
                    .collect();
                from_row(row, deductions)
            })
            .collect())
    }
}

impl<C> Database<Lock<By<Transaction, transaction::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Transaction, transaction::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            SELECT id \
            FROM trade_in_transactions \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query_opt(SQL, &[&by.into_inner()])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Select<By<Option<Transaction>, transaction::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Transaction>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Transaction>, transaction::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let sql = format!(
            "SELECT {COLUMNS} \
             FROM trade_in_transactions \
             WHERE id = $1::UUID"
        );
        let rows = self
            .query(&sql, &[&by.into_inner()])
            .await
            .map_err(tracerr::wrap!())?;
        Ok(self
            .transactions(rows)
            .await
            .map_err(tracerr::wrap!())?
            .pop())
    }
}

impl<C> Database<Select<By<Option<Transaction>, transaction::Number>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Transaction>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Transaction>, transaction::Number>>,
    ) -> Result<Self::Ok, Self::Err> {
        let sql = format!(
            "SELECT {COLUMNS} \
             FROM trade_in_transactions \
             WHERE number = $1::VARCHAR"
        );
        let rows = self
            .query(&sql, &[&by.into_inner()])
            .await
            .map_err(tracerr::wrap!())?;
        Ok(self
            .transactions(rows)
            .await
            .map_err(tracerr::wrap!())?
            .pop())
    }
}

impl<C> Database<Select<By<Vec<Transaction>, read::transaction::list::Filter>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Transaction>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Vec<Transaction>, read::transaction::list::Filter>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::transaction::list::Filter {
            status,
            condition,
            customer_id,
            needs_repair,
            ready_for_resale,
            search,
        } = by.into_inner();
        let pattern = search.as_ref().map(FuzzPattern::new);

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM trade_in_transactions \
             WHERE ($1::INT2 IS NULL OR status = $1::INT2) \
               AND ($2::INT2 IS NULL OR condition = $2::INT2) \
               AND ($3::UUID IS NULL OR customer_id = $3::UUID) \
               AND ($4::BOOLEAN IS NULL OR needs_repair = $4::BOOLEAN) \
               AND ($5::BOOLEAN IS NULL \
                    OR ready_for_resale = $5::BOOLEAN) \
               AND ($6::TEXT[] IS NULL \
                    OR device_name ILIKE ANY($6::TEXT[]) \
                    OR device_model ILIKE ANY($6::TEXT[]) \
                    OR imei ILIKE ANY($6::TEXT[]) \
                    OR number ILIKE ANY($6::TEXT[])) \
             ORDER BY created_at DESC, number DESC"
        );
        let rows = self
            .query(
                &sql,
                &[
                    &status,
                    &condition,
                    &customer_id,
                    &needs_repair,
                    &ready_for_resale,
                    &pattern,
                ],
            )
            .await
            .map_err(tracerr::wrap!())?;
        self.transactions(rows).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Insert<Transaction>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(transaction): Insert<Transaction>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            INSERT INTO trade_in_transactions (\
                id, number, customer_id, \
                device_name, device_model, imei, serial_number, \
                condition, condition_description, \
                currency, base_price, multiplier, adjusted_price, \
                total_deductions, final_value, \
                new_device_price, customer_payment, \
                needs_repair, resale_price, ready_for_resale, \
                staff_notes, status, contract_id, \
                created_at, contract_signed_at, completed_at, cancelled_at\
            ) \
            VALUES (\
                $1::UUID, $2::VARCHAR, $3::UUID, \
                $4::VARCHAR, $5::VARCHAR, $6::VARCHAR, $7::VARCHAR, \
                $8::INT2, $9::TEXT, \
                $10::INT2, $11::NUMERIC, $12::NUMERIC, $13::NUMERIC, \
                $14::NUMERIC, $15::NUMERIC, \
                $16::NUMERIC, $17::NUMERIC, \
                $18::BOOLEAN, $19::NUMERIC, $20::BOOLEAN, \
                $21::TEXT, $22::INT2, $23::UUID, \
                $24::TIMESTAMPTZ, $25::TIMESTAMPTZ, $26::TIMESTAMPTZ, \
                $27::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET serial_number = EXCLUDED.serial_number, \
                needs_repair = EXCLUDED.needs_repair, \
                resale_price = EXCLUDED.resale_price, \
                ready_for_resale = EXCLUDED.ready_for_resale, \
                staff_notes = EXCLUDED.staff_notes, \
                status = EXCLUDED.status, \
                contract_id = EXCLUDED.contract_id, \
                contract_signed_at = EXCLUDED.contract_signed_at, \
                completed_at = EXCLUDED.completed_at, \
                cancelled_at = EXCLUDED.cancelled_at";
        let Transaction {
            id,
            number,
            customer_id,
            quote,
            serial_number,
            new_device_price,
            customer_payment,
            needs_repair,
            resale_price,
            ready_for_resale,
            staff_notes,
            status,
            contract_id,
            created_at,
            contract_signed_at,
            completed_at,
            cancelled_at,
        } = transaction;
        let Quote {
            device: Device { name, model },
            imei,
            condition,
            condition_description,
            base_price,
            multiplier,
            adjusted_price,
            deductions,
            total_deductions,
            final_value,
        } = quote;
        self.exec(
            SQL,
            &[
                &id,
                &number,
                &customer_id,
                &name,
                &model,
                &imei,
                &serial_number,
                &condition,
                &condition_description,
                &base_price.currency,
                &base_price.amount,
                &multiplier,
                &adjusted_price.amount,
                &total_deductions.amount,
                &final_value.amount,
                &new_device_price.amount,
                &customer_payment.amount,
                &needs_repair,
                &resale_price.map(|p| p.amount),
                &ready_for_resale,
                &staff_notes,
                &status,
                &contract_id,
                &created_at,
                &contract_signed_at,
                &completed_at,
                &cancelled_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())?;

        if deductions.is_empty() {
            return Ok(());
        }
        // Deductions are frozen along with the `Quote`, so never updated.
        const DEDUCTIONS_SQL: &str = "\
            INSERT INTO trade_in_deductions (\
                transaction_id, position, description, amount, spare_part_id\
            ) \
            SELECT $1::UUID, d.* \
            FROM unnest(\
                $2::INT2[], $3::TEXT[], $4::NUMERIC[], $5::UUID[]\
            ) AS d \
            ON CONFLICT (transaction_id, position) DO NOTHING";
        let (mut positions, mut descriptions, mut amounts, mut spare_parts) =
            (vec![], vec![], vec![], vec![]);
        for (i, d) in (0_i16..).zip(deductions) {
            positions.push(i);
            descriptions.push(d.description);
            amounts.push(d.amount.amount);
            spare_parts.push(d.spare_part_id);
        }
        self.exec(
            DEDUCTIONS_SQL,
            &[
                &id,
                &positions,
                &descriptions,
                &amounts,
                &spare_parts,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}
