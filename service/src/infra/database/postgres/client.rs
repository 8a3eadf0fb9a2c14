//! Postgres database clients.

use std::sync::Arc;

use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};
use tokio_postgres::{types::ToSql, Row};
use tracerr::Traced;

use crate::infra::database::{
    self,
    postgres::{self, connection, Connection},
};

/// Non-transactional Postgres database client.
///
/// Every statement runs upon a [`connection::Pooled`] connection taken from
/// the [`connection::Pool`] for this statement only.
#[derive(Clone, Debug)]
pub struct NonTx {
    /// [`connection::Pool`] to take connections from.
    pool: connection::Pool,
}

impl NonTx {
    /// Creates a new [`NonTx`] client upon the provided
    /// [`connection::Pool`].
    #[must_use]
    pub(crate) const fn new(pool: connection::Pool) -> Self {
        Self { pool }
    }

    /// Takes a [`connection::Pooled`] connection from the
    /// [`connection::Pool`].
    pub(crate) async fn pooled(
        &self,
    ) -> Result<connection::Pooled, Traced<database::Error>> {
        self.pool
            .get()
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }
}

impl Connection for NonTx {
    async fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, Traced<database::Error>> {
        let pooled = self.pooled().await.map_err(tracerr::wrap!())?;
        Connection::query(&**pooled, sql, params)
            .await
            .map_err(tracerr::wrap!())
    }

    async fn query_opt(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>, Traced<database::Error>> {
        let pooled = self.pooled().await.map_err(tracerr::wrap!())?;
        Connection::query_opt(&**pooled, sql, params)
            .await
            .map_err(tracerr::wrap!())
    }

    async fn exec(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, Traced<database::Error>> {
        let pooled = self.pooled().await.map_err(tracerr::wrap!())?;
        Connection::exec(&**pooled, sql, params)
            .await
            .map_err(tracerr::wrap!())
    }
}

/// Transactional Postgres database client.
///
/// The database transaction is opened lazily on the first statement, and all
/// the clones of this [`Tx`] client share it.
#[derive(Clone, Debug)]
pub struct Tx {
    /// [`NonTx`] client this [`Tx`] client is started from.
    origin: NonTx,

    /// [`State`] of the database transaction.
    state: Arc<Mutex<State>>,
}

/// State of a database transaction of a [`Tx`] client.
#[derive(Debug)]
enum State {
    /// No statement has run yet.
    Idle,

    /// Transaction is open.
    Open(connection::Tx),

    /// Transaction is committed.
    Committed,
}

impl Tx {
    /// Starts a new [`Tx`] client from the provided [`NonTx`] one.
    #[must_use]
    pub fn new(origin: NonTx) -> Self {
        Self {
            origin,
            state: Arc::new(Mutex::new(State::Idle)),
        }
    }

    /// Returns the open [`connection::Tx`], opening it if necessary.
    async fn connection(
        &self,
    ) -> Result<MappedMutexGuard<'_, connection::Tx>, Traced<database::Error>>
    {
        let mut state = self.state.lock().await;
        if matches!(*state, State::Idle) {
            let pooled =
                self.origin.pooled().await.map_err(tracerr::wrap!())?;
            *state = State::Open(
                connection::Tx::begin(pooled)
                    .await
                    .map_err(tracerr::wrap!())?,
            );
        }

        MutexGuard::try_map(state, |s| match s {
            State::Open(tx) => Some(tx),
            State::Idle | State::Committed => None,
        })
        .map_err(|_| {
            tracerr::new!(database::Error::from(postgres::Error::Committed))
        })
    }

    /// Commits the database transaction of this [`Tx`] client, if any was
    /// opened.
    ///
    /// # Errors
    ///
    /// If the database fails to commit the transaction.
    pub async fn commit(&self) -> Result<(), Traced<database::Error>> {
        let state = std::mem::replace(
            &mut *self.state.lock().await,
            State::Committed,
        );
        match state {
            State::Open(tx) => tx.commit().await.map_err(tracerr::wrap!()),
            State::Idle | State::Committed => Ok(()),
        }
    }
}

impl Connection for Tx {
    async fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, Traced<database::Error>> {
        self.connection()
            .await
            .map_err(tracerr::wrap!())?
            .query(sql, params)
            .await
            .map_err(tracerr::wrap!())
    }

    async fn query_opt(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>, Traced<database::Error>> {
        self.connection()
            .await
            .map_err(tracerr::wrap!())?
            .query_opt(sql, params)
            .await
            .map_err(tracerr::wrap!())
    }

    async fn exec(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, Traced<database::Error>> {
        self.connection()
            .await
            .map_err(tracerr::wrap!())?
            .exec(sql, params)
            .await
            .map_err(tracerr::wrap!())
    }
}
