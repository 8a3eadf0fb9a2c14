//! [`Database`]-related implementations.

#[cfg(any(test, feature = "memory"))]
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

use derive_more::{Display, Error as StdError, From};

#[cfg(any(test, feature = "memory"))]
pub use self::memory::Memory;
#[cfg(feature = "postgres")]
pub use self::postgres::Postgres;

/// Database operation.
pub use common::Handler as Database;

/// Names of the uniqueness constraints guarded by a [`Database`].
pub mod constraint {
    /// Device name and model pair of a [`Price`] is unique.
    ///
    /// [`Price`]: crate::domain::Price
    pub const PRICE_DEVICE: &str = "trade_in_prices_device_key";

    /// [`transaction::Number`] is unique.
    ///
    /// [`transaction::Number`]: crate::domain::transaction::Number
    pub const TRANSACTION_NUMBER: &str = "trade_in_transactions_number_key";

    /// At most one [`Contract`] exists per [`Transaction`].
    ///
    /// [`Contract`]: crate::domain::Contract
    /// [`Transaction`]: crate::domain::Transaction
    pub const CONTRACT_TRANSACTION: &str =
        "trade_in_contracts_transaction_id_key";
}

/// [`Database`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// [`Memory`] error.
    #[cfg(any(test, feature = "memory"))]
    Memory(memory::Error),

    #[cfg(feature = "postgres")]
    /// [`Postgres`] error.
    Postgres(postgres::Error),
}

impl Error {
    /// Checks if this [`Error`] is a violation of the provided uniqueness
    /// `constraint`.
    #[must_use]
    pub fn is_unique_violation(&self, constraint: &str) -> bool {
        match self {
            #[cfg(any(test, feature = "memory"))]
            Self::Memory(e) => e.is_unique_violation(constraint),
            #[cfg(feature = "postgres")]
            Self::Postgres(e) => e.is_unique_violation(Some(constraint)),
        }
    }
}
