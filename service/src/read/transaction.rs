//! [`Transaction`] read definitions.

use common::{money::Currency, Money};
use rust_decimal::Decimal;

use crate::domain::{transaction, Contract, Transaction};

/// [`Transaction`] with its signed [`Contract`], handed over to the sale and
/// inventory flows.
#[derive(Clone, Debug)]
pub struct Signed {
    /// [`Transaction`] whose [`Contract`] is signed.
    pub transaction: Transaction,

    /// Signed [`Contract`].
    pub contract: Contract,
}

/// Aggregated statistics of a [`Transaction`]s history.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Summary {
    /// Number of all the [`Transaction`]s.
    pub total_count: usize,

    /// Number of [`Transaction`]s neither completed nor cancelled.
    pub pending_count: usize,

    /// Number of completed [`Transaction`]s.
    pub completed_count: usize,

    /// Number of [`Transaction`]s with a device needing repair and not ready
    /// for resale yet.
    pub needs_repair_count: usize,

    /// Number of [`Transaction`]s with a device ready for resale.
    pub ready_for_resale_count: usize,

    /// Sum of final trade-in values of all non-cancelled [`Transaction`]s.
    pub total_value: Money,

    /// Average final trade-in value of non-cancelled [`Transaction`]s.
    pub average_value: Money,
}

impl Summary {
    /// Summarizes the provided [`Transaction`]s.
    ///
    /// Only trade-in values in the provided [`Currency`] are summed up. A value
    /// overflowing the total is left out of both the total and the average.
    #[must_use]
    pub fn collect<'a>(
        currency: Currency,
        transactions: impl IntoIterator<Item = &'a Transaction>,
    ) -> Self {
        use transaction::Status as S;

        let mut summary = Self {
            total_count: 0,
            pending_count: 0,
            completed_count: 0,
            needs_repair_count: 0,
            ready_for_resale_count: 0,
            total_value: Money::zero(currency),
            average_value: Money::zero(currency),
        };
        let mut valued = 0u32;

        for t in transactions {
            summary.total_count += 1;
            match t.status {
                S::Completed => summary.completed_count += 1,
                S::Cancelled => {}
                S::Created | S::ContractGenerated | S::ContractSigned => {
                    summary.pending_count += 1;
                }
            }
            if t.ready_for_resale {
                summary.ready_for_resale_count += 1;
            } else if t.needs_repair {
                summary.needs_repair_count += 1;
            }

            if t.status != S::Cancelled {
                if let Ok(total) =
                    summary.total_value.checked_add(t.quote.final_value)
                {
                    summary.total_value = total;
                    valued += 1;
                }
            }
        }

        if valued > 0 {
            summary.average_value = Money {
                amount: summary.total_value.amount / Decimal::from(valued),
                currency,
            }
            .round();
        }

        summary
    }
}

pub mod list {
    //! [`Transaction`]s list definitions.

    use crate::{
        domain::{condition, customer, transaction, Transaction},
        read::Search,
    };
    #[cfg(doc)]
    use crate::domain::Device;

    /// Filter of a [`Transaction`]s list.
    #[derive(Clone, Debug, Default)]
    pub struct Filter {
        /// Only [`Transaction`]s in the provided [`transaction::Status`] are
        /// listed.
        pub status: Option<transaction::Status>,

        /// Only [`Transaction`]s of a [`Device`] in the provided
        /// [`condition::Rating`] are listed.
        pub condition: Option<condition::Rating>,

        /// Only [`Transaction`]s of the provided customer are listed.
        pub customer_id: Option<customer::Id>,

        /// Only [`Transaction`]s with the provided `needs_repair` flag are
        /// listed.
        pub needs_repair: Option<bool>,

        /// Only [`Transaction`]s with the provided `ready_for_resale` flag are
        /// listed.
        pub ready_for_resale: Option<bool>,

        /// [`Search`] among [`Device`] names, models, IMEIs and
        /// [`transaction::Number`]s.
        pub search: Option<Search>,
    }

    impl Filter {
        /// Checks whether the provided [`Transaction`] passes this [`Filter`].
        #[must_use]
        pub fn matches(&self, t: &Transaction) -> bool {
            let Self {
                status,
                condition,
                customer_id,
                needs_repair,
                ready_for_resale,
                search,
            } = self;

            status.map_or(true, |s| t.status == s)
                && condition.map_or(true, |c| t.quote.condition == c)
                && customer_id.map_or(true, |id| t.customer_id == id)
                && needs_repair.map_or(true, |r| t.needs_repair == r)
                && ready_for_resale.map_or(true, |r| t.ready_for_resale == r)
                && search.as_ref().map_or(true, |q| {
                    q.matches(t.quote.device.name.as_ref())
                        || q.matches(t.quote.device.model.as_ref())
                        || t.quote
                            .imei
                            .as_ref()
                            .is_some_and(|i| q.matches(i.as_ref()))
                        || q.matches(t.number.as_ref())
                })
        }
    }
}
