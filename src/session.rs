//! Serialized background session
//!
//! Moves an [`Inventory`] onto one worker thread. Jobs submitted through
//! [`Session::submit`] run one at a time in submission order; each returns
//! a [`Pending`] the caller can block on or poll.

use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, bounded, unbounded};
use log::{debug, error, info};
use crate::business::Inventory;
use crate::error::{InventoryError, Result};

type Job = Box<dyn FnOnce(&mut Inventory) + Send + 'static>;

const WORKER_NAME: &str = "invcore-session";

/// Handle to the worker that owns the inventory
pub struct Session {
    sender: Option<Sender<Job>>,
    worker: Option<JoinHandle<Inventory>>,
}

/// Result of a submitted job, delivered once the worker has run it
pub struct Pending<T> {
    receiver: Receiver<T>,
}

impl Session {
    /// Start the worker thread and hand it the inventory
    pub fn start(inventory: Inventory) -> Result<Self> {
        let (sender, receiver) = unbounded::<Job>();
        let worker = thread::Builder::new()
            .name(WORKER_NAME.to_string())
            .spawn(move || worker_loop(inventory, receiver))?;

        info!("event=session_start module=session status=ok");
        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
        })
    }

    /// Queue a job
    ///
    /// Fails with `SessionClosed` once the session has been shut down.
    pub fn submit<T, F>(&self, job: F) -> Result<Pending<T>>
    where
        T: Send + 'static,
        F: FnOnce(&mut Inventory) -> T + Send + 'static,
    {
        let sender = self.sender.as_ref().ok_or(InventoryError::SessionClosed)?;
        let (reply, receiver) = bounded(1);
        let job: Job = Box::new(move |inventory| {
            // the caller may have dropped its Pending
            let _ = reply.send(job(inventory));
        });
        sender.send(job).map_err(|_| InventoryError::SessionClosed)?;
        Ok(Pending { receiver })
    }

    /// Run a job and block until it has finished
    pub fn run<T, F>(&self, job: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Inventory) -> T + Send + 'static,
    {
        self.submit(job)?.wait()
    }

    /// Finish every queued job, stop the worker and return the inventory
    pub fn shutdown(mut self) -> Result<Inventory> {
        self.stop().ok_or(InventoryError::SessionClosed)
    }

    fn stop(&mut self) -> Option<Inventory> {
        drop(self.sender.take());
        let worker = self.worker.take()?;
        match worker.join() {
            Ok(inventory) => {
                info!("event=session_stop module=session status=ok");
                Some(inventory)
            }
            Err(_) => {
                error!("event=session_stop module=session status=error error=worker panicked");
                None
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<T> Pending<T> {
    /// Block until the job has run
    pub fn wait(self) -> Result<T> {
        self.receiver.recv().map_err(|_| InventoryError::SessionClosed)
    }

    /// Block for at most `timeout`; `Ok(None)` if the job is still queued or running
    pub fn wait_timeout(&self, timeout: Duration) -> Result<Option<T>> {
        match self.receiver.recv_timeout(timeout) {
            Ok(value) => Ok(Some(value)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(InventoryError::SessionClosed),
        }
    }

    /// Take the result if the job has already run
    pub fn try_take(&self) -> Result<Option<T>> {
        match self.receiver.try_recv() {
            Ok(value) => Ok(Some(value)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(InventoryError::SessionClosed),
        }
    }
}

fn worker_loop(mut inventory: Inventory, receiver: Receiver<Job>) -> Inventory {
    let mut completed = 0usize;
    while let Ok(job) = receiver.recv() {
        // a panicking job drops its reply sender, which the caller sees as SessionClosed
        if panic::catch_unwind(AssertUnwindSafe(|| job(&mut inventory))).is_err() {
            error!("event=session_job module=session status=error error=job panicked");
        }
        completed += 1;
    }
    debug!("event=session_drain module=session status=ok jobs={}", completed);
    inventory
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use crate::business::inventory::tests::create_test_inventory;
    use crate::database::NewItem;

    #[test]
    fn test_jobs_run_in_submission_order() {
        let (inventory, _temp) = create_test_inventory();
        let session = Session::start(inventory).unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let pending: Vec<_> = (0..20)
            .map(|i| {
                let seen = Arc::clone(&seen);
                session
                    .submit(move |_inventory: &mut Inventory| {
                        seen.lock().unwrap().push(i);
                        i
                    })
                    .unwrap()
            })
            .collect();

        let results: Vec<i32> = pending.into_iter().map(|p| p.wait().unwrap()).collect();
        assert_eq!(results, (0..20).collect::<Vec<_>>());
        assert_eq!(*seen.lock().unwrap(), (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_operations_through_session() {
        let (inventory, _temp) = create_test_inventory();
        let session = Session::start(inventory).unwrap();

        let item_id = session.run(|inv| inv.add_item(&NewItem::named("Drill"))).unwrap().unwrap();
        let deleted = session.run(move |inv| inv.soft_delete(item_id, None)).unwrap().unwrap();
        assert!(deleted);

        let pending = session.submit(move |inv| inv.restore_one(item_id)).unwrap();
        assert_eq!(pending.wait().unwrap().unwrap(), 1);

        let inventory = session.shutdown().unwrap();
        assert!(!inventory.get_item(item_id).unwrap().unwrap().deleted);
    }

    #[test]
    fn test_shutdown_drains_queue() {
        let (inventory, _temp) = create_test_inventory();
        let session = Session::start(inventory).unwrap();
        for i in 0..5 {
            session
                .submit(move |inv| inv.add_item(&NewItem::named(&format!("Item {}", i))))
                .unwrap();
        }
        let inventory = session.shutdown().unwrap();
        assert_eq!(inventory.get_items().unwrap().len(), 5);
    }

    #[test]
    fn test_panicking_job_reports_closed() {
        let (inventory, _temp) = create_test_inventory();
        let session = Session::start(inventory).unwrap();

        let pending = session.submit(|_inv| -> i32 { panic!("boom") }).unwrap();
        assert!(matches!(pending.wait(), Err(InventoryError::SessionClosed)));

        // the worker keeps serving later jobs
        assert_eq!(session.run(|_inv| 7).unwrap(), 7);
        assert!(session.shutdown().is_ok());
    }

    #[test]
    fn test_poll_pending() {
        let (inventory, _temp) = create_test_inventory();
        let session = Session::start(inventory).unwrap();
        let (gate_tx, gate_rx) = bounded::<()>(0);

        let pending = session
            .submit(move |_inv| {
                let _ = gate_rx.recv();
                42
            })
            .unwrap();
        assert!(pending.try_take().unwrap().is_none());
        assert!(pending.wait_timeout(Duration::from_millis(10)).unwrap().is_none());

        gate_tx.send(()).unwrap();
        assert_eq!(pending.wait_timeout(Duration::from_secs(5)).unwrap(), Some(42));
    }
}
