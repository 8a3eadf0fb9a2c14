//! [`Query`] collection related to a single [`Price`].

use common::operations::By;

use crate::domain::{price, Device, Price};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`Price`] by its [`price::Id`].
pub type ById = DatabaseQuery<By<Option<Price>, price::Id>>;

/// Queries a [`Price`] by its [`Device`] name and model.
pub type ByDevice = DatabaseQuery<By<Option<Price>, Device>>;
