//! [`Connection`] definitions.

use std::{fmt, future::Future};

use futures::{FutureExt as _, TryFutureExt as _};
use ouroboros::self_referencing;
use tokio_postgres::{types::ToSql, GenericClient, Row};
use tracerr::Traced;

use crate::infra::database::{self, postgres};

pub use deadpool_postgres::{
    Client as Pooled, CreatePoolError as PoolCreationError, Pool, PoolError,
};
pub use tokio_postgres::Error;

/// [`Pooled`] connection with an open database transaction.
///
/// The transaction is rolled back on drop, unless [`Tx::commit()`]ed.
#[self_referencing]
pub struct Tx {
    /// [`Pooled`] connection the transaction is open in.
    pooled: Pooled,

    /// Open transaction, taken out on commit.
    #[borrows(mut pooled)]
    #[not_covariant]
    tx: Option<deadpool_postgres::Transaction<'this>>,
}

impl fmt::Debug for Tx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tx")
            .field("tx", self.transaction())
            .finish_non_exhaustive()
    }
}

impl Tx {
    /// Opens a new [`Tx`] in the provided [`Pooled`] connection.
    ///
    /// # Errors
    ///
    /// If the database refuses to open a transaction.
    pub async fn begin(
        pooled: Pooled,
    ) -> Result<Self, Traced<database::Error>> {
        Self::try_new_async_send(pooled, |c| {
            c.transaction().map_ok(Some).boxed()
        })
        .await
        .map_err(tracerr::from_and_wrap!(=> postgres::Error))
        .map_err(tracerr::map_from)
    }

    /// Returns the open transaction of this [`Tx`].
    fn transaction(&self) -> &deadpool_postgres::Transaction<'_> {
        self.with_tx(|tx| tx.as_ref().expect("`Tx` is consumed on commit"))
    }

    /// Commits this [`Tx`].
    ///
    /// # Errors
    ///
    /// If the database fails to commit the transaction.
    #[expect(clippy::missing_panics_doc, reason = "infallible")]
    pub async fn commit(mut self) -> Result<(), Traced<database::Error>> {
        #[expect(
            clippy::redundant_closure_for_method_calls,
            reason = "different variance, see \
                      https://doc.rust-lang.org/nomicon/subtyping.html#variance"
        )]
        self.with_tx_mut(|tx| tx.take())
            .expect("`Tx` is consumed on commit")
            .commit()
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }
}

/// Database connection able to run SQL statements.
pub trait Connection {
    /// Runs the provided `sql` query with the given `params` and returns the
    /// resulting rows.
    ///
    /// # Errors
    ///
    /// If the database fails to run the query.
    fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = Result<Vec<Row>, Traced<database::Error>>>;

    /// Runs the provided `sql` query with the given `params` and returns at
    /// most one resulting row.
    ///
    /// # Errors
    ///
    /// If the database fails to run the query, or it returns more than one
    /// row.
    fn query_opt(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = Result<Option<Row>, Traced<database::Error>>>;

    /// Runs the provided `sql` statement with the given `params` and returns
    /// the number of affected rows.
    ///
    /// # Errors
    ///
    /// If the database fails to run the statement.
    fn exec(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = Result<u64, Traced<database::Error>>>;
}

impl<C: GenericClient + Sync> Connection for C {
    async fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, Traced<database::Error>> {
        GenericClient::query(self, sql, params)
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }

    async fn query_opt(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>, Traced<database::Error>> {
        GenericClient::query_opt(self, sql, params)
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }

    async fn exec(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, Traced<database::Error>> {
        GenericClient::execute(self, sql, params)
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }
}

impl Connection for Tx {
    async fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, Traced<database::Error>> {
        Connection::query(&**self.transaction(), sql, params)
            .await
            .map_err(tracerr::wrap!())
    }

    async fn query_opt(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>, Traced<database::Error>> {
        Connection::query_opt(&**self.transaction(), sql, params)
            .await
            .map_err(tracerr::wrap!())
    }

    async fn exec(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, Traced<database::Error>> {
        Connection::exec(&**self.transaction(), sql, params)
            .await
            .map_err(tracerr::wrap!())
    }
}
