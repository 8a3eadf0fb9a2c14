//! Domain definitions.

pub mod condition;
pub mod contract;
pub mod customer;
pub mod damage;
pub mod device;
pub mod price;
pub mod quote;
pub mod transaction;

pub use self::{
    contract::Contract, device::Device, price::Price, quote::Quote,
    transaction::Transaction,
};
