use log::error;
use std::any::Any;

use diesel::SqliteConnection;
use tokio::sync::{mpsc, oneshot};

use super::DbPool;
use crate::errors::StorageError;
use recsync_core::errors::{DatabaseError, Error, Result};

/// A write job run on the writer's connection.
type Job<T> = Box<dyn FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static>;

type Erased = Box<dyn Any + Send + 'static>;

/// Handle for sending jobs to the writer actor.
///
/// Every write of the record store goes through one connection, one job at a
/// time, each inside an immediate transaction. A job therefore never
/// interleaves with another write.
#[derive(Clone)]
pub struct WriteHandle {
    tx: mpsc::Sender<(Job<Erased>, oneshot::Sender<Result<Erased>>)>,
}

impl WriteHandle {
    /// Runs `job` on the writer connection and waits for its result.
    pub async fn exec<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static + Any,
    {
        let (ret_tx, ret_rx) = oneshot::channel();

        self.tx
            .send((
                Box::new(move |c| job(c).map(|v| Box::new(v) as Erased)),
                ret_tx,
            ))
            .await
            .map_err(|_| writer_gone("writer actor has stopped"))?;

        let boxed = ret_rx
            .await
            .map_err(|_| writer_gone("writer actor dropped the reply"))??;

        boxed
            .downcast::<T>()
            .map(|v| *v)
            .map_err(|_| writer_gone("writer actor returned an unexpected type"))
    }
}

fn writer_gone(message: &str) -> Error {
    Error::Database(DatabaseError::Internal(message.to_string()))
}

/// Spawns the single writer task. It holds one pooled connection for its
/// whole life and stops when every `WriteHandle` is dropped.
pub fn spawn_writer(pool: DbPool) -> WriteHandle {
    let (tx, mut rx) = mpsc::channel::<(Job<Erased>, oneshot::Sender<Result<Erased>>)>(1024);

    tokio::spawn(async move {
        let mut conn = match pool.get() {
            Ok(conn) => conn,
            Err(e) => {
                error!("Writer actor could not get a database connection: {}", e);
                return;
            }
        };

        while let Some((job, reply_tx)) = rx.recv().await {
            let result: Result<Erased> = conn
                .immediate_transaction::<_, StorageError, _>(|c| job(c).map_err(StorageError::from))
                .map_err(Error::from);

            // The requester may have gone away; nothing to do then.
            let _ = reply_tx.send(result);
        }
    });

    WriteHandle { tx }
}
