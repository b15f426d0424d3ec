// src/worker.rs
//
// Background thread that owns the predictor. The GUI sends one job at a time
// and polls for the finished event; `notify` is called after every event so
// the GUI can wake up and repaint.
//

use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TryRecvError, TrySendError};
use log::{debug, info};

use crate::error::{PredictError, PredictResult};
use crate::predict::{Prediction, Predictor};
use crate::tools::ToolRunner;

#[derive(Debug, Clone)]
pub struct Job {
    pub id: u64,
    pub sequence: String,
}

#[derive(Debug)]
pub enum WorkerEvent {
    Finished {
        id: u64,
        result: PredictResult<Prediction>,
    },
}

pub struct PredictionWorker {
    job_tx: Option<Sender<Job>>,
    event_rx: Receiver<WorkerEvent>,
    handle: Option<JoinHandle<()>>,
    next_id: u64,
}

impl PredictionWorker {
    pub fn spawn<R, F>(predictor: Predictor<R>, notify: F) -> PredictResult<Self>
    where
        R: ToolRunner + 'static,
        F: Fn() + Send + 'static,
    {
        let (job_tx, job_rx) = bounded::<Job>(1);
        let (event_tx, event_rx) = unbounded::<WorkerEvent>();

        let handle = thread::Builder::new()
            .name("predictor".into())
            .spawn(move || worker_loop(predictor, job_rx, event_tx, notify))
            .map_err(PredictError::WorkerSpawn)?;

        Ok(Self {
            job_tx: Some(job_tx),
            event_rx,
            handle: Some(handle),
            next_id: 0,
        })
    }

    /// Queue a sequence; returns the job id.
    pub fn submit(&mut self, sequence: String) -> PredictResult<u64> {
        let tx = self.job_tx.as_ref().ok_or(PredictError::WorkerGone)?;
        let id = self.next_id;
        match tx.try_send(Job { id, sequence }) {
            Ok(()) => {
                self.next_id += 1;
                debug!("Submitted job {}", id);
                Ok(id)
            }
            Err(TrySendError::Full(_)) => Err(PredictError::WorkerBusy),
            Err(TrySendError::Disconnected(_)) => Err(PredictError::WorkerGone),
        }
    }

    /// Next finished event, if any, without blocking.
    pub fn poll(&self) -> PredictResult<Option<WorkerEvent>> {
        match self.event_rx.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(PredictError::WorkerGone),
        }
    }
}

impl Drop for PredictionWorker {
    fn drop(&mut self) {
        // Closing the job channel ends the loop once the current job is done.
        self.job_tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn worker_loop<R, F>(
    predictor: Predictor<R>,
    jobs: Receiver<Job>,
    events: Sender<WorkerEvent>,
    notify: F,
) where
    R: ToolRunner,
    F: Fn(),
{
    for job in jobs.iter() {
        debug!("Job {} started", job.id);
        let result = predictor.predict(&job.sequence);
        if events
            .send(WorkerEvent::Finished { id: job.id, result })
            .is_err()
        {
            break;
        }
        notify();
    }
    info!("Prediction worker stopped");
}
