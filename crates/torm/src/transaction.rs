//! Transaction helpers.
//!
//! A unit of work receives the transaction handle, which implements
//! [`GenericClient`], so every builder can run inside it. The outcome decides
//! what happens next:
//!
//! - `Ok(_)` commits; a commit failure is reported as-is.
//! - `Err(_)` rolls back and reports the original error.
//! - `Err(_)` followed by a failed rollback reports
//!   [`OrmError::RollbackFailed`], which carries both errors.
//!
//! # Example
//!
//! ```ignore
//! use torm::{Orm, OrmResult, transaction};
//!
//! # async fn demo(client: &mut tokio_postgres::Client) -> OrmResult<()> {
//! transaction(client, async |tx| {
//!     let orm = Orm::new(tx);
//!     orm.insert(&[]).exec(&mut order).await?;
//!     orm.update(&["stock"]).filter("id = :id").exec(&mut item).await?;
//!     Ok(())
//! })
//! .await?;
//! # Ok(()) }
//! ```
//!
//! Transactions do not nest: the unit of work must not begin another
//! transaction on the connection it was handed.

use crate::client::GenericClient;
use crate::error::{OrmError, OrmResult};
use tokio_postgres::IsolationLevel;

/// Runs the given block inside a database transaction.
///
/// - Begins a transaction via [`Transactional::begin`].
/// - Commits on `Ok(_)`.
/// - Rolls back on `Err(_)`, merging a rollback failure into the error.
///
/// The block must evaluate to `torm::OrmResult<T>`.
///
/// ```ignore
/// torm::transaction!(&mut client, tx, {
///     Orm::new(&tx).delete().filter("id = :id").exec(&record).await?;
///     Ok(())
/// })?;
/// ```
#[macro_export]
macro_rules! transaction {
    ($client:expr, $tx:ident, $body:block) => {
        $crate::transaction!($client, $crate::TxOptions::default(), $tx, $body)
    };
    ($client:expr, $options:expr, $tx:ident, $body:block) => {{
        let $tx = $crate::Transactional::begin($client, &$options).await?;
        let __torm_tx_body_result = async { $body }.await;
        $crate::transaction::finish($tx, __torm_tx_body_result).await
    }};
}

/// Transaction isolation level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Isolation {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl From<Isolation> for IsolationLevel {
    fn from(isolation: Isolation) -> Self {
        match isolation {
            Isolation::ReadUncommitted => IsolationLevel::ReadUncommitted,
            Isolation::ReadCommitted => IsolationLevel::ReadCommitted,
            Isolation::RepeatableRead => IsolationLevel::RepeatableRead,
            Isolation::Serializable => IsolationLevel::Serializable,
        }
    }
}

/// Options passed when a transaction begins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TxOptions {
    /// `None` keeps the server default.
    pub isolation: Option<Isolation>,
    pub read_only: bool,
    pub deferrable: bool,
}

impl TxOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn isolation(mut self, isolation: Isolation) -> Self {
        self.isolation = Some(isolation);
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Only meaningful for serializable, read-only transactions.
    pub fn deferrable(mut self) -> Self {
        self.deferrable = true;
        self
    }
}

/// An active transaction.
pub trait TransactionHandle: GenericClient + Sized {
    fn commit(self) -> impl std::future::Future<Output = OrmResult<()>> + Send;

    fn rollback(self) -> impl std::future::Future<Output = OrmResult<()>> + Send;
}

/// A connection that can begin a transaction.
pub trait Transactional: Send {
    type Tx<'a>: TransactionHandle
    where
        Self: 'a;

    fn begin<'a>(
        &'a mut self,
        options: &TxOptions,
    ) -> impl std::future::Future<Output = OrmResult<Self::Tx<'a>>> + Send;
}

impl Transactional for tokio_postgres::Client {
    type Tx<'a> = tokio_postgres::Transaction<'a>;

    async fn begin<'a>(&'a mut self, options: &TxOptions) -> OrmResult<Self::Tx<'a>> {
        let mut builder = self
            .build_transaction()
            .read_only(options.read_only)
            .deferrable(options.deferrable);
        if let Some(isolation) = options.isolation {
            builder = builder.isolation_level(isolation.into());
        }
        builder.start().await.map_err(OrmError::from_db_error)
    }
}

impl TransactionHandle for tokio_postgres::Transaction<'_> {
    async fn commit(self) -> OrmResult<()> {
        tokio_postgres::Transaction::commit(self)
            .await
            .map_err(OrmError::from_db_error)
    }

    async fn rollback(self) -> OrmResult<()> {
        tokio_postgres::Transaction::rollback(self)
            .await
            .map_err(OrmError::from_db_error)
    }
}

/// Run `work` inside a transaction with default options.
pub async fn transaction<'c, C, T, F>(conn: &'c mut C, work: F) -> OrmResult<T>
where
    C: Transactional + 'c,
    F: for<'t> AsyncFnOnce(&'t C::Tx<'c>) -> OrmResult<T>,
{
    transaction_with(conn, TxOptions::default(), work).await
}

/// Run `work` inside a transaction begun with `options`.
pub async fn transaction_with<'c, C, T, F>(
    conn: &'c mut C,
    options: TxOptions,
    work: F,
) -> OrmResult<T>
where
    C: Transactional + 'c,
    F: for<'t> AsyncFnOnce(&'t C::Tx<'c>) -> OrmResult<T>,
{
    let tx = conn.begin(&options).await?;
    tracing::debug!(target: "torm.tx", ?options, "transaction started");
    let outcome = work(&tx).await;
    finish(tx, outcome).await
}

/// Commit or roll back `tx` according to `outcome`.
pub async fn finish<X, T>(tx: X, outcome: OrmResult<T>) -> OrmResult<T>
where
    X: TransactionHandle,
{
    match outcome {
        Ok(value) => {
            tx.commit().await?;
            tracing::debug!(target: "torm.tx", "transaction committed");
            Ok(value)
        }
        Err(cause) => match tx.rollback().await {
            Ok(()) => {
                tracing::debug!(target: "torm.tx", error = %cause, "transaction rolled back");
                Err(cause)
            }
            Err(rollback) => {
                tracing::warn!(
                    target: "torm.tx",
                    error = %cause,
                    rollback_error = %rollback,
                    "transaction rollback failed"
                );
                Err(OrmError::rollback_failed(cause, rollback))
            }
        },
    }
}
