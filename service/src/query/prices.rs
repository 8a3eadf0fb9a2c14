//! [`Query`] collection related to the multiple [`Price`]s.

use common::operations::By;

use crate::{domain::Price, read};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a list of [`Price`]s ordered by [`Device`] name and model.
///
/// [`Device`]: crate::domain::Device
pub type List = DatabaseQuery<By<Vec<Price>, read::price::list::Filter>>;

#[cfg(test)]
mod spec {
    use common::Handler as _;

    use crate::{
        command::{CreateTradeInPrice, DeleteTradeInPrice},
        read::{price::list::Filter, Search},
        test_util::{device, service, tzs},
    };

    use super::List;

    #[tokio::test]
    async fn filters_by_activity_and_search() {
        let (svc, _) = service();
        for (name, model) in [
            ("iPhone 12", "A2403"),
            ("Galaxy S21", "SM-G991B"),
            ("iPhone 11", "A2221"),
        ] {
            _ = svc
                .execute(CreateTradeInPrice {
                    device: device(name, model),
                    base_price: tzs("300000"),
                    multipliers: None,
                    notes: None,
                })
                .await
                .unwrap();
        }
        let all = svc.execute(List::by(Filter::default())).await.unwrap();
        let galaxy = all
            .iter()
            .find(|p| p.device == device("Galaxy S21", "SM-G991B"))
            .unwrap();
        _ = svc
            .execute(DeleteTradeInPrice { id: galaxy.id })
            .await
            .unwrap();

        let active = svc
            .execute(List::by(Filter {
                is_active: Some(true),
                search: None,
            }))
            .await
            .unwrap();
        let iphones = svc
            .execute(List::by(Filter {
                is_active: None,
                search: Search::new("IPHONE"),
            }))
            .await
            .unwrap();

        assert_eq!(all.len(), 3);
        assert_eq!(active.len(), 2);
        assert_eq!(
            iphones.iter().map(|p| p.device.clone()).collect::<Vec<_>>(),
            [device("iPhone 11", "A2221"), device("iPhone 12", "A2403")],
        );
    }
}
