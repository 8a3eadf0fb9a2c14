//! [`Query`] collection related to the multiple [`Transaction`]s.

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    domain::Transaction,
    infra::{database, Database},
    read, Query, Service,
};

use super::DatabaseQuery;

/// Queries a list of [`Transaction`]s, the most recent first.
pub type List =
    DatabaseQuery<By<Vec<Transaction>, read::transaction::list::Filter>>;

/// [`Query`] summarizing the [`Transaction`]s history.
#[derive(Clone, Debug, Default)]
pub struct Summary {
    /// [`read::transaction::list::Filter`] of the summarized
    /// [`Transaction`]s.
    pub filter: read::transaction::list::Filter,
}

impl<Db> Query<Summary> for Service<Db>
where
    Db: Database<
        Select<By<Vec<Transaction>, read::transaction::list::Filter>>,
        Ok = Vec<Transaction>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = read::transaction::Summary;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Summary { filter }: Summary,
    ) -> Result<Self::Ok, Self::Err> {
        let transactions = self
            .database()
            .execute(Select(By::<Vec<Transaction>, _>::new(filter)))
            .await
            .map_err(tracerr::wrap!())?;

        Ok(read::transaction::Summary::collect(
            self.config().currency,
            &transactions,
        ))
    }
}

#[cfg(test)]
mod spec {
    use common::Handler as _;

    use common::Money;
    use rust_decimal::Decimal;

    use crate::{
        command::{
            CancelTradeInTransaction, CreateTradeInTransaction,
            GenerateTradeInContract, MarkTradeInReadyForResale,
            SignTradeInContract,
        },
        domain::{contract, Transaction},
        infra::Memory,
        read::transaction::list::Filter,
        test_util::{created_transaction, customer, quote, service, tzs},
        Service,
    };

    use super::{List, Summary};

    async fn repaired_transaction(svc: &Service<Memory>) -> Transaction {
        let t = svc
            .execute(CreateTradeInTransaction {
                customer_id: customer(),
                quote: quote("300000", &[]),
                new_device_price: tzs("900000"),
                serial_number: None,
                needs_repair: true,
                resale_price: None,
                staff_notes: None,
            })
            .await
            .unwrap();
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
        svc.execute(MarkTradeInReadyForResale {
            transaction_id: t.id,
            resale_price: Some(tzs("280000")),
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn summarizes_history() {
        let (svc, _) = service();
        _ = created_transaction(&svc).await;
        let cancelled = created_transaction(&svc).await;
        _ = svc
            .execute(CancelTradeInTransaction {
                transaction_id: cancelled.id,
            })
            .await
            .unwrap();
        _ = svc
            .execute(CreateTradeInTransaction {
                customer_id: customer(),
                quote: quote("200000", &["5000"]),
                new_device_price: tzs("900000"),
                serial_number: None,
                needs_repair: true,
                resale_price: None,
                staff_notes: None,
            })
            .await
            .unwrap();

        let summary = svc.execute(Summary::default()).await.unwrap();

        assert_eq!(summary.total_count, 3);
        assert_eq!(summary.pending_count, 2);
        assert_eq!(summary.completed_count, 0);
        assert_eq!(summary.needs_repair_count, 1);
        // 355000 + (200000 * 0.75 - 5000)
        assert_eq!(summary.total_value, tzs("500000"));
        assert_eq!(summary.average_value, tzs("250000"));
    }

    #[tokio::test]
    async fn lists_by_customer_most_recent_first() {
        let (svc, _) = service();
        _ = created_transaction(&svc).await;
        let customer_id = customer();
        let mut numbers = vec![];
        for base in ["100000", "200000"] {
            let t = svc
                .execute(CreateTradeInTransaction {
                    customer_id,
                    quote: quote(base, &[]),
                    new_device_price: tzs("900000"),
                    serial_number: None,
                    needs_repair: false,
                    resale_price: None,
                    staff_notes: None,
                })
                .await
                .unwrap();
            numbers.push(t.number);
        }

        let listed = svc
            .execute(List::by(Filter {
                customer_id: Some(customer_id),
                ..Filter::default()
            }))
            .await
            .unwrap();

        assert_eq!(listed.len(), 2);
        assert!(listed[0].created_at >= listed[1].created_at);
        assert!(listed.iter().all(|t| numbers.contains(&t.number)));
    }

    #[tokio::test]
    async fn counts_devices_ready_for_resale() {
        let (svc, _) = service();
        _ = created_transaction(&svc).await;
        let repaired = repaired_transaction(&svc).await;
        _ = svc
            .execute(CreateTradeInTransaction {
                customer_id: customer(),
                quote: quote("200000", &["5000"]),
                new_device_price: tzs("900000"),
                serial_number: None,
                needs_repair: true,
                resale_price: None,
                staff_notes: None,
            })
            .await
            .unwrap();

        let summary = svc.execute(Summary::default()).await.unwrap();

        assert_eq!(summary.total_count, 3);
        assert_eq!(summary.ready_for_resale_count, 1);
        assert_eq!(summary.needs_repair_count, 1);

        let ready = svc
            .execute(List::by(Filter {
                ready_for_resale: Some(true),
                ..Filter::default()
            }))
            .await
            .unwrap();
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].id, repaired.id);
        assert_eq!(ready[0].resale_price, Some(tzs("280000")));

        let not_ready = svc
            .execute(List::by(Filter {
                ready_for_resale: Some(false),
                ..Filter::default()
            }))
            .await
            .unwrap();
        assert_eq!(not_ready.len(), 2);
        assert!(not_ready.iter().all(|t| t.id != repaired.id));
    }

    #[tokio::test]
    async fn leaves_overflowing_values_out_of_total() {
        let (svc, _) = service();
        let max = Decimal::MAX.to_string();
        for _ in 0..2 {
            _ = svc
                .execute(CreateTradeInTransaction {
                    customer_id: customer(),
                    quote: quote(&max, &[]),
                    new_device_price: Money {
                        amount: Decimal::MAX,
                        ..tzs("0")
                    },
                    serial_number: None,
                    needs_repair: false,
                    resale_price: None,
                    staff_notes: None,
                })
                .await
                .unwrap();
        }

        let summary = svc.execute(Summary::default()).await.unwrap();

        assert_eq!(summary.total_count, 2);
        assert_eq!(summary.pending_count, 2);
        assert!(summary.total_value.amount > Decimal::ZERO);
        assert_eq!(summary.average_value, summary.total_value);
    }
}
