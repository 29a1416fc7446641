use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use crate::errors::{Error, Result};

/// Fixed set of worker threads running jobs in the order they are queued
///
/// Dropping the pool lets the workers finish the queued jobs, then joins them.
pub struct ThreadPool {
    workers: Vec<Worker>,
    sender: Option<mpsc::Sender<Job>>,
}

impl ThreadPool {
    /// Create a new ThreadPool with `size` threads, named `worker-<n>`.
    ///
    /// 'size' must be greater than 0.
    pub fn new(size: usize) -> Result<ThreadPool> {
        assert!(size > 0, "ThreadPool size must be greater than 0");

        let (sender, receiver) = mpsc::channel();
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..size)
            .map(|id| Worker::new(id, Arc::clone(&receiver)))
            .collect::<Result<Vec<_>>>()?;

        Ok(ThreadPool {
            workers,
            sender: Some(sender),
        })
    }

    /// Queue `f`, the first idle worker runs it. Fails once the pool is shutting down.
    pub fn execute<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let sender = self.sender.as_ref().ok_or(Error::ShuttingDown)?;
        sender
            .send(Box::new(f))
            .map_err(|_| Error::ShuttingDown.into())
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        drop(self.sender.take());
        for worker in &mut self.workers {
            if let Some(thread) = worker.handle.take() {
                if thread.join().is_err() {
                    log::error!("Worker {} panicked", worker.id);
                }
            }
        }
    }
}

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A thread of the pool, `handle` is taken when it is joined
struct Worker {
    id: usize,
    handle: Option<thread::JoinHandle<()>>,
}

impl Worker {
    /// Create a new worker that will execute jobs from the given receiver until this one is
    /// closed.
    fn new(id: usize, receiver: Arc<Mutex<mpsc::Receiver<Job>>>) -> Result<Worker> {
        let handle = thread::Builder::new()
            .name(format!("worker-{}", id))
            .spawn(move || loop {
                let message = match receiver.lock() {
                    Ok(receiver) => receiver.recv(),
                    // Another worker panicked while waiting, the queue is still usable
                    Err(poisoned) => poisoned.into_inner().recv(),
                };
                match message {
                    Ok(job) => job(),
                    Err(_) => {
                        log::debug!("Worker {} shutting down", id);
                        break;
                    }
                }
            })?;
        Ok(Worker {
            id,
            handle: Some(handle),
        })
    }
}
