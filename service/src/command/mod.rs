//! [`Command`] definition.

pub mod cancel_trade_in_transaction;
pub mod complete_trade_in_transaction;
pub mod create_trade_in_price;
pub mod create_trade_in_transaction;
pub mod delete_trade_in_price;
pub mod generate_trade_in_contract;
pub mod mark_trade_in_ready_for_resale;
pub mod sign_trade_in_contract;
pub mod update_trade_in_price;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    cancel_trade_in_transaction::CancelTradeInTransaction,
    complete_trade_in_transaction::CompleteTradeInTransaction,
    create_trade_in_price::CreateTradeInPrice,
    create_trade_in_transaction::CreateTradeInTransaction,
    delete_trade_in_price::DeleteTradeInPrice,
    generate_trade_in_contract::GenerateTradeInContract,
    mark_trade_in_ready_for_resale::MarkTradeInReadyForResale,
    sign_trade_in_contract::SignTradeInContract,
    update_trade_in_price::UpdateTradeInPrice,
};
