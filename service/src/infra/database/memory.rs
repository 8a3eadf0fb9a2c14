//! In-memory [`Database`] implementation.
//!
//! Mirrors the semantics of the [`Postgres`] implementation closely enough to
//! exercise [`Command`]s and [`Query`]s without any external services:
//! uniqueness constraints are enforced, and [`Transact`]ed writes become
//! visible to others only on [`Commit`].
//!
//! Concurrent [`Transact`]ions are not isolated from each other beyond their
//! writes being applied atomically, so [`Lock`]s are no-ops.
//!
//! [`Command`]: crate::Command
//! [`Postgres`]: super::Postgres
//! [`Query`]: crate::Query

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use common::operations::{By, Commit, Insert, Lock, Select, Transact};
use derive_more::{Display, Error as StdError};
use tracerr::Traced;

use crate::{
    domain::{
        contract, price, transaction, Contract, Device, Price, Transaction,
    },
    infra::database::{self, constraint, Database},
    read,
};

/// In-memory [`Database`].
#[derive(Clone, Debug, Default)]
pub struct Memory<T = NonTx>(T);

impl Memory {
    /// Creates a new empty [`Memory`] database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next write operation fail with the provided [`Error`].
    pub fn fail_next_write(&self, err: Error) {
        *lock(&self.0.fault) = Some(err);
    }
}

/// Non-transactional [`Memory`] access, writing directly into the shared
/// [`Storage`].
#[derive(Clone, Debug, Default)]
pub struct NonTx {
    /// Shared committed [`Storage`].
    storage: Arc<Mutex<Storage>>,

    /// [`Error`] to fail the next write operation with, if any.
    fault: Arc<Mutex<Option<Error>>>,
}

/// Transactional [`Memory`] access, staging writes until [`Commit`].
#[derive(Clone, Debug)]
pub struct Tx {
    /// [`NonTx`] access this [`Tx`] was started from.
    origin: NonTx,

    /// Snapshot of the committed [`Storage`] with the staged writes applied.
    staged: Arc<Mutex<Storage>>,

    /// Writes to be replayed upon the committed [`Storage`] on [`Commit`].
    writes: Arc<Mutex<Vec<Write>>>,
}

/// Write operation staged in a [`Tx`].
#[derive(Clone, Debug)]
enum Write {
    /// [`Price`] upsert.
    Price(Price),

    /// [`Transaction`] upsert.
    Transaction(Transaction),

    /// [`Contract`] upsert.
    Contract(Contract),
}

/// Data stored in a [`Memory`] database.
#[derive(Clone, Debug, Default)]
pub struct Storage {
    /// Stored [`Price`]s.
    prices: HashMap<price::Id, Price>,

    /// Stored [`Transaction`]s.
    transactions: HashMap<transaction::Id, Transaction>,

    /// Stored [`Contract`]s.
    contracts: HashMap<contract::Id, Contract>,
}

impl Storage {
    /// Applies the provided [`Write`], checking uniqueness constraints.
    fn apply(&mut self, write: Write) -> Result<(), Error> {
        match write {
            Write::Price(p) => {
                if self
                    .prices
                    .values()
                    .any(|o| o.id != p.id && o.device == p.device)
                {
                    return Err(Error::UniqueViolation(
                        constraint::PRICE_DEVICE,
                    ));
                }
                _ = self.prices.insert(p.id, p);
            }
            Write::Transaction(t) => {
                if self
                    .transactions
                    .values()
                    .any(|o| o.id != t.id && o.number == t.number)
                {
                    return Err(Error::UniqueViolation(
                        constraint::TRANSACTION_NUMBER,
                    ));
                }
                _ = self.transactions.insert(t.id, t);
            }
            Write::Contract(c) => {
                if self.contracts.values().any(|o| {
                    o.id != c.id && o.transaction_id == c.transaction_id
                }) {
                    return Err(Error::UniqueViolation(
                        constraint::CONTRACT_TRANSACTION,
                    ));
                }
                _ = self.contracts.insert(c.id, c);
            }
        }
        Ok(())
    }
}

/// Access to a [`Storage`] of a [`Memory`] database.
pub trait Access {
    /// Runs the provided function upon the [`Storage`] visible to this
    /// [`Access`].
    fn read<R>(&self, f: impl FnOnce(&Storage) -> R) -> R;

    /// Writes the provided value into the [`Storage`] visible to this
    /// [`Access`].
    ///
    /// # Errors
    ///
    /// If a uniqueness constraint is violated, or a failure was requested via
    /// [`Memory::fail_next_write()`].
    fn write(
        &self,
        write: impl Into<WriteOp>,
    ) -> Result<(), Traced<database::Error>>;
}

/// Opaque write operation accepted by [`Access::write()`].
#[derive(Debug)]
pub struct WriteOp(Write);

impl From<Price> for WriteOp {
    fn from(p: Price) -> Self {
        Self(Write::Price(p))
    }
}

impl From<Transaction> for WriteOp {
    fn from(t: Transaction) -> Self {
        Self(Write::Transaction(t))
    }
}

impl From<Contract> for WriteOp {
    fn from(c: Contract) -> Self {
        Self(Write::Contract(c))
    }
}

impl NonTx {
    /// Takes the requested write failure, if any.
    fn take_fault(&self) -> Result<(), Traced<database::Error>> {
        lock(&self.fault)
            .take()
            .map_or(Ok(()), |e| Err(tracerr::new!(database::Error::from(e))))
    }
}

impl Access for NonTx {
    fn read<R>(&self, f: impl FnOnce(&Storage) -> R) -> R {
        f(&lock(&self.storage))
    }

    fn write(
        &self,
        write: impl Into<WriteOp>,
    ) -> Result<(), Traced<database::Error>> {
        self.take_fault()?;
        lock(&self.storage)
            .apply(write.into().0)
            .map_err(tracerr::from_and_wrap!(=> database::Error))
    }
}

impl Access for Tx {
    fn read<R>(&self, f: impl FnOnce(&Storage) -> R) -> R {
        f(&lock(&self.staged))
    }

    fn write(
        &self,
        write: impl Into<WriteOp>,
    ) -> Result<(), Traced<database::Error>> {
        self.origin.take_fault()?;
        let WriteOp(write) = write.into();
        lock(&self.staged)
            .apply(write.clone())
            .map_err(tracerr::from_and_wrap!(=> database::Error))?;
        lock(&self.writes).push(write);
        Ok(())
    }
}

/// Locks the provided [`Mutex`], ignoring its poisoning.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// [`Memory`] database error.
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum Error {
    /// Uniqueness constraint is violated.
    #[display("unique constraint `{_0}` is violated")]
    UniqueViolation(#[error(not(source))] &'static str),

    /// [`Memory`] database is unavailable.
    #[display("database is unavailable")]
    Unavailable,
}

impl Error {
    /// Checks if this [`Error`] is a violation of the provided uniqueness
    /// `constraint`.
    #[must_use]
    pub fn is_unique_violation(&self, constraint: &str) -> bool {
        matches!(self, Self::UniqueViolation(c) if *c == constraint)
    }
}

impl Database<Transact> for Memory<NonTx> {
    type Ok = Memory<Tx>;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        let snapshot = lock(&self.0.storage).clone();
        Ok(Memory(Tx {
            origin: self.0.clone(),
            staged: Arc::new(Mutex::new(snapshot)),
            writes: Arc::default(),
        }))
    }
}

impl Database<Transact> for Memory<Tx> {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Database<Commit> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        let writes = std::mem::take(&mut *lock(&self.0.writes));

        let mut committed = lock(&self.0.origin.storage);
        let mut updated = committed.clone();
        for w in writes {
            updated
                .apply(w)
                .map_err(tracerr::from_and_wrap!(=> database::Error))?;
        }
        *committed = updated;

        Ok(())
    }
}

impl<T: Access> Database<Lock<By<Price, price::Id>>> for Memory<T> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Price, price::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl<T: Access> Database<Lock<By<Transaction, transaction::Id>>>
    for Memory<T>
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Transaction, transaction::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl<T: Access> Database<Select<By<Option<Price>, price::Id>>> for Memory<T> {
    type Ok = Option<Price>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Price>, price::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.0.read(|s| s.prices.get(&id).cloned()))
    }
}

impl<T: Access> Database<Select<By<Option<Price>, Device>>> for Memory<T> {
    type Ok = Option<Price>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Price>, Device>>,
    ) -> Result<Self::Ok, Self::Err> {
        let device = by.into_inner();
        Ok(self.0.read(|s| {
            s.prices.values().find(|p| p.device == device).cloned()
        }))
    }
}

impl<T: Access> Database<Select<By<Vec<Price>, read::price::list::Filter>>>
    for Memory<T>
{
    type Ok = Vec<Price>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Price>, read::price::list::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::price::list::Filter { is_active, search } = by.into_inner();

        let mut prices = self.0.read(|s| {
            s.prices
                .values()
                .filter(|p| is_active.map_or(true, |a| p.is_active == a))
                .filter(|p| {
                    search.as_ref().map_or(true, |q| {
                        q.matches(p.device.name.as_ref())
                            || q.matches(p.device.model.as_ref())
                    })
                })
                .cloned()
                .collect::<Vec<_>>()
        });
        prices.sort_by(|a, b| {
            let key = |p: &Price| {
                (p.device.name.to_string(), p.device.model.to_string())
            };
            key(a).cmp(&key(b))
        });

        Ok(prices)
    }
}

impl<T: Access> Database<Insert<Price>> for Memory<T> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(price): Insert<Price>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0.write(price).map_err(tracerr::wrap!())
    }
}

impl<T: Access> Database<Select<By<Option<Transaction>, transaction::Id>>>
    for Memory<T>
{
    type Ok = Option<Transaction>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Transaction>, transaction::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.0.read(|s| s.transactions.get(&id).cloned()))
    }
}

impl<T: Access>
    Database<Select<By<Option<Transaction>, transaction::Number>>>
    for Memory<T>
{
    type Ok = Option<Transaction>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Transaction>, transaction::Number>>,
    ) -> Result<Self::Ok, Self::Err> {
        let number = by.into_inner();
        Ok(self.0.read(|s| {
            s.transactions
                .values()
                .find(|t| t.number == number)
                .cloned()
        }))
    }
}

impl<T: Access>
    Database<Select<By<Vec<Transaction>, read::transaction::list::Filter>>>
    for Memory<T>
{
    type Ok = Vec<Transaction>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Vec<Transaction>, read::transaction::list::Filter>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let filter = by.into_inner();

        let mut transactions = self.0.read(|s| {
            s.transactions
                .values()
                .filter(|t| filter.matches(t))
                .cloned()
                .collect::<Vec<_>>()
        });
        transactions.sort_by(|a, b| {
            b.created_at.cmp(&a.created_at).then(b.number.cmp(&a.number))
        });

        Ok(transactions)
    }
}

impl<T: Access> Database<Insert<Transaction>> for Memory<T> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(transaction): Insert<Transaction>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0.write(transaction).map_err(tracerr::wrap!())
    }
}

impl<T: Access> Database<Select<By<Option<Contract>, transaction::Id>>>
    for Memory<T>
{
    type Ok = Option<Contract>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Contract>, transaction::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let transaction_id = by.into_inner();
        Ok(self.0.read(|s| {
            s.contracts
                .values()
                .find(|c| c.transaction_id == transaction_id)
                .cloned()
        }))
    }
}

impl<T: Access> Database<Insert<Contract>> for Memory<T> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(contract): Insert<Contract>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0.write(contract).map_err(tracerr::wrap!())
    }
}
