use std::{
    sync::{Arc, Mutex, mpsc},
    thread,
};

use log::{debug, warn};

pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Fixed set of workers pulling connection jobs off a shared queue.
#[derive(Debug)]
pub struct ThreadPool {
    workers: Vec<Worker>,
    sender: Option<mpsc::Sender<Job>>,
}

impl ThreadPool {
    pub fn new(size: usize) -> Self {
        assert!(size > 0);

        let mut workers = Vec::with_capacity(size);
        let (sender, receiver) = mpsc::channel();

        let receiver = Arc::new(Mutex::new(receiver));
        let sender = Some(sender);

        for i in 0..size {
            workers.push(Worker::new(i, Arc::clone(&receiver)));
        }

        Self { workers, sender }
    }

    pub fn execute<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let job = Box::new(f);
        match self.sender.as_ref() {
            Some(sender) => {
                if sender.send(job).is_err() {
                    warn!("thread pool has no live workers; dropping job");
                }
            }
            None => warn!("thread pool is shutting down; dropping job"),
        }
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        drop(self.sender.take());

        for worker in self.workers.drain(..) {
            debug!("shutting down worker {}", worker.id);

            if worker.thread.join().is_err() {
                warn!("worker {} panicked", worker.id);
            }
        }
    }
}

#[derive(Debug)]
struct Worker {
    id: usize,
    thread: thread::JoinHandle<()>,
}

impl Worker {
    pub fn new(id: usize, receiver: Arc<Mutex<mpsc::Receiver<Job>>>) -> Self {
        let thread = thread::spawn(move || {
            loop {
                let msg = match receiver.lock() {
                    Ok(rx) => rx.recv(),
                    Err(_) => break,
                };
                match msg {
                    Ok(job) => {
                        debug!("worker {id} handling a connection!");
                        job();
                    }
                    Err(_) => {
                        debug!("worker {id} disconnected!");
                        break;
                    }
                }
            }
        });

        Self { id, thread }
    }
}
