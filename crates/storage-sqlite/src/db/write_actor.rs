//! Serialises every write through one connection owned by a dedicated
//! thread. Each job runs inside an immediate transaction.

use diesel::connection::{AnsiTransactionManager, TransactionManager};
use diesel::sqlite::SqliteConnection;
use log::{debug, error};
use std::panic::{self, AssertUnwindSafe};
use tokio::sync::{mpsc, oneshot};

use super::{DbConnection, DbPool};
use crate::errors::StorageError;
use storefront_core::errors::{DatabaseError, Error, Result};

type Job = Box<dyn FnOnce(&mut SqliteConnection) + Send + 'static>;

/// Keeps application errors apart from diesel's inside the transaction
/// closure so rollback still happens for both.
enum TxError {
    Diesel(diesel::result::Error),
    App(Error),
}

impl From<diesel::result::Error> for TxError {
    fn from(err: diesel::result::Error) -> Self {
        TxError::Diesel(err)
    }
}

#[derive(Clone)]
pub struct WriteHandle {
    sender: mpsc::UnboundedSender<Job>,
}

impl WriteHandle {
    /// Runs `job` on the writer connection and waits for its result. An
    /// error from the job rolls the transaction back.
    pub async fn exec<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let boxed: Job = Box::new(move |conn: &mut SqliteConnection| {
            let outcome = conn
                .immediate_transaction::<T, TxError, _>(|conn| job(conn).map_err(TxError::App));
            let outcome = outcome.map_err(|err| match err {
                TxError::Diesel(e) => Error::from(StorageError::from(e)),
                TxError::App(e) => e,
            });
            // The caller may have gone away; nothing to report then.
            let _ = reply_tx.send(outcome);
        });

        self.sender.send(boxed).map_err(|_| {
            Error::Database(DatabaseError::ConnectionFailed(
                "Writer is not running".to_string(),
            ))
        })?;
        reply_rx.await.map_err(|_| {
            Error::Database(DatabaseError::Internal(
                "Writer dropped the job".to_string(),
            ))
        })?
    }
}

/// Starts the writer thread. It exits once every handle is dropped.
pub fn spawn_writer(pool: DbPool) -> WriteHandle {
    let (sender, mut receiver) = mpsc::unbounded_channel::<Job>();

    let spawned = std::thread::Builder::new()
        .name("storefront-sqlite-writer".to_string())
        .spawn(move || {
            let Some(mut conn) = acquire(&pool) else {
                return;
            };
            while let Some(job) = receiver.blocking_recv() {
                if panic::catch_unwind(AssertUnwindSafe(|| job(&mut *conn))).is_err() {
                    error!("[Storage] Write job panicked; replacing the writer connection");
                    // Releases the write lock if the job died inside its transaction.
                    let _ = AnsiTransactionManager::rollback_transaction(&mut *conn);
                    drop(conn);
                    conn = match acquire(&pool) {
                        Some(fresh) => fresh,
                        None => return,
                    };
                }
            }
            debug!("[Storage] Writer stopped");
        });
    if let Err(e) = spawned {
        error!("[Storage] Failed to spawn writer thread: {}", e);
    }

    WriteHandle { sender }
}

fn acquire(pool: &DbPool) -> Option<DbConnection> {
    match pool.get() {
        Ok(conn) => Some(conn),
        Err(e) => {
            error!("[Storage] Writer could not acquire a connection: {}", e);
            None
        }
    }
}
