//! GraphQL API definitions.

pub mod contract;
pub mod device;
mod mutation;
pub mod price;
mod query;
pub mod quote;
pub mod scalar;
pub mod transaction;

use juniper::EmptySubscription;

use crate::Context;

pub use self::{
    contract::Contract, mutation::Mutation, price::Price, query::Query,
    quote::Quote, transaction::Transaction,
};

/// GraphQL schema.
pub type Schema =
    juniper::RootNode<'static, Query, Mutation, EmptySubscription<Context>>;
