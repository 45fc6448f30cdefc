//! Background terrain generation.
//!
//! A generation job samples the height function over the whole grid and
//! builds the index buffer on its own thread. It shares nothing mutable with
//! the caller: the request is moved in, the worker builds its own
//! `NoiseField` from the seed, and the response is moved back out over a
//! one-shot channel.
//!
//! At most one job is in flight per `JobSlot`. Dispatching a new job cancels
//! the previous one and joins its thread first, and a cancelled job never
//! delivers a result. The cancel flag is polled before every noise sample and
//! every emitted cell, so a join waits for at most one unit of work.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, TryRecvError};

use crate::error::{Result, TerrainError};
use crate::noise::NoiseField;
use crate::params::{GridParams, NoiseParams};
use crate::terrain::height::compute_height;
use crate::terrain::mesh::{build_positions, capture_prior_heights_until, triangulate_grid_until};

/// Input for one generation job
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub grid: GridParams,
    pub noise: NoiseParams,
    pub random_seed: u32,
    /// Previous interleaved position buffer (may be empty)
    pub prior_positions: Vec<f32>,
}

/// Buffers produced by a completed job
#[derive(Debug, Clone)]
pub struct GenerationResponse {
    pub job_id: u64,
    pub grid: GridParams,
    pub prior_heights: Vec<f32>,
    pub positions: Vec<f32>,
    pub indices: Vec<u32>,
}

/// Run a generation to completion on the current thread.
///
/// Returns `None` if `cancelled` is raised before the grid is finished.
pub fn generate(request: &GenerationRequest, cancelled: &AtomicBool) -> Option<GenerationResponse> {
    let grid = request.grid;
    let keep_going = || !cancelled.load(Ordering::Relaxed);

    let prior_heights =
        capture_prior_heights_until(&request.prior_positions, grid.vertex_count(), keep_going)?;

    let field = NoiseField::new(request.random_seed);
    let positions = build_positions(
        &grid,
        |x, z| compute_height(x, z, &request.noise, &field),
        keep_going,
    )?;

    let indices = triangulate_grid_until(grid.width, grid.height, keep_going)?;

    Some(GenerationResponse {
        job_id: 0,
        grid,
        prior_heights,
        positions,
        indices,
    })
}

/// Outcome of checking on a job
#[derive(Debug)]
pub enum JobPoll {
    /// Still running
    Pending,
    /// Finished, buffers attached
    Ready(GenerationResponse),
    /// Worker exited without a result (cancelled or crashed)
    Lost,
}

/// Handle to one in-flight generation thread
pub struct GenerationJob {
    id: u64,
    cancel: Arc<AtomicBool>,
    receiver: Receiver<GenerationResponse>,
    thread: Option<thread::JoinHandle<()>>,
}

impl GenerationJob {
    /// Spawn a worker thread for `request`
    pub fn spawn(id: u64, request: GenerationRequest) -> Result<Self> {
        Self::spawn_with(id, None, move |cancelled| generate(&request, cancelled))
    }

    pub(crate) fn spawn_with<F>(id: u64, stack_size: Option<usize>, work: F) -> Result<Self>
    where
        F: FnOnce(&AtomicBool) -> Option<GenerationResponse> + Send + 'static,
    {
        let cancel = Arc::new(AtomicBool::new(false));
        let cancel_worker = Arc::clone(&cancel);
        let (sender, receiver) = bounded(1);

        let mut builder = thread::Builder::new().name(format!("terrain-gen-{id}"));
        if let Some(bytes) = stack_size {
            builder = builder.stack_size(bytes);
        }

        let handle = builder
            .spawn(move || {
                let Some(mut response) = work(&cancel_worker) else {
                    log::debug!("Generation job {id} stopped before completion");
                    return;
                };
                response.job_id = id;

                // Receiver is gone once the job was replaced; nothing to do then
                if sender.send(response).is_err() {
                    log::debug!("Generation job {id} finished after being discarded");
                }
            })
            .map_err(TerrainError::WorkerSpawn)?;

        Ok(Self {
            id,
            cancel,
            receiver,
            thread: Some(handle),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Ask the worker to stop. It exits at its next column boundary.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Non-blocking check for a result
    pub fn try_result(&self) -> JobPoll {
        match self.receiver.try_recv() {
            Ok(response) => JobPoll::Ready(response),
            Err(TryRecvError::Empty) => JobPoll::Pending,
            Err(TryRecvError::Disconnected) => JobPoll::Lost,
        }
    }

    /// Block for at most `timeout` waiting for a result
    pub fn wait(&self, timeout: Duration) -> JobPoll {
        match self.receiver.recv_timeout(timeout) {
            Ok(response) => JobPoll::Ready(response),
            Err(RecvTimeoutError::Timeout) => JobPoll::Pending,
            Err(RecvTimeoutError::Disconnected) => JobPoll::Lost,
        }
    }
}

impl Drop for GenerationJob {
    fn drop(&mut self) {
        self.cancel();
        if let Some(handle) = self.thread.take() {
            // Err means the worker panicked, which callers see as a lost job
            let _ = handle.join();
        }
    }
}

/// Holds at most one in-flight job; the most recent dispatch wins.
///
/// Dropping the slot cancels and joins its job, so no worker outlives it.
#[derive(Default)]
pub struct JobSlot {
    current: Option<GenerationJob>,
    next_id: u64,
    /// Worker stack size in bytes (platform default when unset)
    stack_size: Option<usize>,
}

impl JobSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stack size for workers spawned from now on (`None` for the default)
    pub fn set_stack_size(&mut self, bytes: Option<usize>) {
        self.stack_size = bytes;
    }

    /// Cancel any running job, then start `request`. Returns the new job id.
    pub fn dispatch(&mut self, request: GenerationRequest) -> Result<u64> {
        log::debug!(
            "Dispatching generation job {} ({}x{} @ {})",
            self.next_id + 1,
            request.grid.width,
            request.grid.height,
            request.grid.spacing
        );
        self.dispatch_with(move |cancelled| generate(&request, cancelled))
    }

    pub(crate) fn dispatch_with<F>(&mut self, work: F) -> Result<u64>
    where
        F: FnOnce(&AtomicBool) -> Option<GenerationResponse> + Send + 'static,
    {
        self.cancel();

        self.next_id += 1;
        let id = self.next_id;
        self.current = Some(GenerationJob::spawn_with(id, self.stack_size, work)?);
        Ok(id)
    }

    /// Cancel the running job, if any, and wait for its thread to exit
    pub fn cancel(&mut self) {
        if let Some(job) = self.current.take() {
            log::debug!("Cancelling generation job {}", job.id());
            // Drop joins the worker
            drop(job);
        }
    }

    pub fn is_busy(&self) -> bool {
        self.current.is_some()
    }

    /// Id of the in-flight job
    pub fn pending_id(&self) -> Option<u64> {
        self.current.as_ref().map(GenerationJob::id)
    }

    /// Id of the most recently dispatched job
    pub fn latest_id(&self) -> u64 {
        self.next_id
    }

    /// Non-blocking poll of the in-flight job
    pub fn poll(&mut self) -> JobPoll {
        let outcome = match &self.current {
            Some(job) => job.try_result(),
            None => return JobPoll::Pending,
        };
        self.settle(outcome)
    }

    /// Wait at most `timeout` for the in-flight job
    pub fn wait(&mut self, timeout: Duration) -> JobPoll {
        let outcome = match &self.current {
            Some(job) => job.wait(timeout),
            None => return JobPoll::Pending,
        };
        self.settle(outcome)
    }

    fn settle(&mut self, outcome: JobPoll) -> JobPoll {
        match outcome {
            JobPoll::Pending => JobPoll::Pending,
            JobPoll::Ready(response) => {
                self.current = None;
                if response.job_id != self.next_id {
                    log::warn!(
                        "Discarding stale generation result {} (latest is {})",
                        response.job_id,
                        self.next_id
                    );
                    return JobPoll::Lost;
                }
                JobPoll::Ready(response)
            }
            JobPoll::Lost => {
                let id = self.current.take().map(|job| job.id());
                log::warn!("Generation job {id:?} exited without a result");
                JobPoll::Lost
            }
        }
    }
}
