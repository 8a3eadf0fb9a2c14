//! Service contains the business logic of the trade-in workflow.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod command;
pub mod domain;
pub mod infra;
pub mod query;
pub mod read;
pub mod valuation;

use common::money::Currency;

use crate::domain::{contract, price};
#[cfg(doc)]
use crate::{
    domain::{Contract, Price},
    infra::Database,
};

pub use self::{command::Command, query::Query};

/// [`Service`] configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// [`Currency`] the trade-in history is summarized in.
    pub currency: Currency,

    /// [`price::ConditionMultipliers`] applied when a device is valued by a
    /// manually entered base price without any [`Price`] schedule.
    pub default_multipliers: price::ConditionMultipliers,

    /// [`contract::Terms`] every new [`Contract`] is generated with.
    pub contract_terms: contract::Terms,

    /// [`contract::OwnershipDeclaration`] every new [`Contract`] is generated
    /// with.
    pub ownership_declaration: contract::OwnershipDeclaration,
}

/// Domain service.
#[derive(Clone, Debug)]
pub struct Service<Db> {
    /// Configuration of this [`Service`].
    config: Config,

    /// [`Database`] of this [`Service`].
    database: Db,
}

impl<Db> Service<Db> {
    /// Creates a new [`Service`] with the provided parameters.
    #[must_use]
    pub const fn new(config: Config, database: Db) -> Self {
        Self { config, database }
    }

    /// Returns [`Config`] of this [`Service`].
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Database`] of this [`Service`].
    #[must_use]
    pub const fn database(&self) -> &Db {
        &self.database
    }
}

#[cfg(test)]
mod test_util {
    //! Fixtures shared by the [`Command`] and [`Query`] specs.

    use common::{money::Currency, Handler as _, Money, Multiplier};

    use crate::{
        command::CreateTradeInTransaction,
        domain::{
            contract, customer, damage, device, price, Device, Quote,
            Transaction,
        },
        infra::database::Memory,
        valuation::{self, Inspection},
        Config, Service,
    };

    pub(crate) fn tzs(s: &str) -> Money {
        Money {
            amount: s.parse().unwrap(),
            currency: Currency::Tzs,
        }
    }

    pub(crate) fn multipliers(
        e: &str,
        g: &str,
        f: &str,
        p: &str,
    ) -> price::ConditionMultipliers {
        let m = |s: &str| Multiplier::new(s.parse().unwrap()).unwrap();
        price::ConditionMultipliers {
            excellent: m(e),
            good: m(g),
            fair: m(f),
            poor: m(p),
        }
    }

    pub(crate) fn device(name: &str, model: &str) -> Device {
        Device {
            name: device::Name::new(name).unwrap(),
            model: device::Model::new(model).unwrap(),
        }
    }

    pub(crate) fn customer() -> customer::Id {
        uuid::Uuid::new_v4().into()
    }

    pub(crate) fn service() -> (Service<Memory>, Memory) {
        let db = Memory::new();
        let config = Config {
            currency: Currency::Tzs,
            default_multipliers: multipliers("1", "0.85", "0.7", "0.5"),
            contract_terms: contract::Terms::new("Device is sold as-is.")
                .unwrap(),
            ownership_declaration: contract::OwnershipDeclaration::new(
                "I am the lawful owner of this device.",
            )
            .unwrap(),
        };
        (Service::new(config, db.clone()), db)
    }

    /// Quotes an `iPhone 12` in a good condition valued by the provided
    /// `base` price, with the provided damage deductions.
    pub(crate) fn quote(base: &str, deductions: &[&str]) -> Quote {
        valuation::compute_quote(
            None,
            Inspection {
                device: device("iPhone 12", "A2403"),
                imei: device::Imei::new("356938035643809"),
                condition: "good",
                condition_description: None,
                deductions: deductions
                    .iter()
                    .map(|a| damage::Deduction {
                        description: damage::Description::new("Scratches")
                            .unwrap(),
                        amount: tzs(a),
                        spare_part_id: None,
                    })
                    .collect(),
                base_price_override: Some(tzs(base)),
            },
            &multipliers("1", "0.75", "0.5", "0.3"),
        )
        .unwrap()
    }

    /// Creates a [`Transaction`] of [`quote()`] with `500000` base price and
    /// `20000` deduction for a new device costing `1200000`.
    pub(crate) async fn created_transaction(
        svc: &Service<Memory>,
    ) -> Transaction {
        svc.execute(CreateTradeInTransaction {
            customer_id: customer(),
            quote: quote("500000", &["20000"]),
            new_device_price: tzs("1200000"),
            serial_number: None,
            needs_repair: false,
            resale_price: None,
            staff_notes: None,
        })
        .await
        .unwrap()
    }
}
