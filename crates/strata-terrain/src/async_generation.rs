//! Background chunk generation on a fixed thread pool.
//!
//! Workers share one [`TerrainGenerator`]; since every chunk is a pure
//! function of the seed and its address, results may arrive in any order.
//! Submissions are bounded, cancellable and delivered through a bounded
//! result channel.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, bounded};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use strata_config::WorkerConfig;
use strata_voxel::{Chunk, ChunkAddress};
use tracing::{debug, trace};

use crate::generator::TerrainGenerator;

/// A fully generated chunk ready for the caller.
#[derive(Debug)]
pub struct GeneratedChunk {
    pub address: ChunkAddress,
    pub chunk: Chunk,
    /// Generation time in microseconds (for profiling).
    pub generation_time_us: u64,
}

struct QueuedTask {
    address: ChunkAddress,
    cancelled: Arc<AtomicBool>,
}

/// Generates chunks across a pool of worker threads.
pub struct AsyncChunkGenerator {
    task_sender: Sender<QueuedTask>,
    result_receiver: Receiver<GeneratedChunk>,
    /// Cancellation flag per pending address.
    active_tasks: Arc<DashMap<ChunkAddress, Arc<AtomicBool>>>,
    /// Tasks queued or executing.
    in_flight: Arc<AtomicU64>,
}

impl AsyncChunkGenerator {
    /// Spawns `thread_count` workers.
    ///
    /// - `max_concurrent`: queue bound; excess submissions are rejected.
    /// - `result_capacity`: completed chunks buffered before workers block.
    pub fn new(
        generator: Arc<TerrainGenerator>,
        thread_count: usize,
        max_concurrent: usize,
        result_capacity: usize,
    ) -> io::Result<Self> {
        let (task_sender, task_receiver) = bounded::<QueuedTask>(max_concurrent.max(1) * 2);
        let (result_sender, result_receiver) = bounded::<GeneratedChunk>(result_capacity.max(1));
        let in_flight = Arc::new(AtomicU64::new(0));

        for i in 0..thread_count.max(1) {
            let receiver = task_receiver.clone();
            let sender = result_sender.clone();
            let in_flight = Arc::clone(&in_flight);
            let generator = Arc::clone(&generator);

            std::thread::Builder::new()
                .name(format!("chunk-gen-worker-{i}"))
                .spawn(move || {
                    while let Ok(task) = receiver.recv() {
                        if task.cancelled.load(Ordering::Relaxed) {
                            trace!(address = %task.address, "Skipping cancelled chunk");
                            in_flight.fetch_sub(1, Ordering::Relaxed);
                            continue;
                        }

                        let start = Instant::now();
                        let chunk = generator.generate(task.address);
                        let elapsed = start.elapsed().as_micros() as u64;

                        if !task.cancelled.load(Ordering::Relaxed) {
                            let _ = sender.send(GeneratedChunk {
                                address: task.address,
                                chunk,
                                generation_time_us: elapsed,
                            });
                        }

                        in_flight.fetch_sub(1, Ordering::Relaxed);
                    }
                })?;
        }

        debug!(threads = thread_count.max(1), max_concurrent, "Chunk worker pool started");

        Ok(Self {
            task_sender,
            result_receiver,
            active_tasks: Arc::new(DashMap::new()),
            in_flight,
        })
    }

    /// Pool sized from the CPU count, leaving two cores for the caller.
    pub fn with_defaults(generator: Arc<TerrainGenerator>) -> io::Result<Self> {
        Self::from_config(generator, &WorkerConfig::default())
    }

    /// Pool sized from `[workers]`; `threads = 0` picks from the CPU count.
    pub fn from_config(generator: Arc<TerrainGenerator>, config: &WorkerConfig) -> io::Result<Self> {
        let threads = match config.threads {
            0 => num_cpus::get().saturating_sub(2).max(1),
            n => n,
        };
        Self::new(generator, threads, config.max_in_flight, config.result_capacity)
    }

    /// Queues a chunk for generation.
    ///
    /// An address that is already pending is not queued again. Returns the
    /// address back if the queue is full.
    pub fn submit(&self, address: ChunkAddress) -> Result<(), ChunkAddress> {
        let cancelled = match self.active_tasks.entry(address) {
            Entry::Occupied(_) => {
                trace!(%address, "Chunk already pending");
                return Ok(());
            }
            Entry::Vacant(slot) => {
                let cancelled = Arc::new(AtomicBool::new(false));
                slot.insert(Arc::clone(&cancelled));
                cancelled
            }
        };
        self.in_flight.fetch_add(1, Ordering::Relaxed);

        self.task_sender
            .try_send(QueuedTask { address, cancelled })
            .map_err(|e| {
                self.in_flight.fetch_sub(1, Ordering::Relaxed);
                let task = e.into_inner();
                self.active_tasks
                    .remove_if(&task.address, |_, flag| Arc::ptr_eq(flag, &task.cancelled));
                task.address
            })
    }

    /// Cancels a pending or running task. No-op once it has completed.
    pub fn cancel(&self, address: &ChunkAddress) {
        if let Some((_, cancelled)) = self.active_tasks.remove(address) {
            cancelled.store(true, Ordering::Relaxed);
        }
    }

    /// Drains every completed chunk without blocking.
    pub fn drain_results(&self) -> Vec<GeneratedChunk> {
        let mut results = Vec::new();
        while let Ok(generated) = self.result_receiver.try_recv() {
            self.active_tasks.remove(&generated.address);
            results.push(generated);
        }
        results
    }

    /// Number of tasks currently in flight (queued or executing).
    pub fn in_flight_count(&self) -> u64 {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Returns `true` if a task for the given address is currently pending.
    pub fn is_pending(&self, address: &ChunkAddress) -> bool {
        self.active_tasks.contains_key(address)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use strata_config::Config;

    use super::*;

    fn shared_generator() -> Arc<TerrainGenerator> {
        Arc::new(TerrainGenerator::new(&Config::default()).unwrap())
    }

    fn collect(pool: &AsyncChunkGenerator, expected: usize) -> Vec<GeneratedChunk> {
        let mut results = Vec::new();
        let deadline = Instant::now() + Duration::from_secs(60);
        while results.len() < expected && Instant::now() < deadline {
            results.extend(pool.drain_results());
            if results.len() < expected {
                std::thread::sleep(Duration::from_millis(10));
            }
        }
        results
    }

    #[test]
    fn test_concurrent_generation_is_safe() {
        let pool = AsyncChunkGenerator::new(shared_generator(), 4, 32, 64).unwrap();

        let mut submitted = 0;
        for x in 0..6 {
            for z in 0..6 {
                if pool.submit(ChunkAddress::new(x, 1, z)).is_ok() {
                    submitted += 1;
                }
            }
        }

        let received = collect(&pool, submitted).len();
        assert_eq!(received, submitted, "Should receive all submitted chunks: got {received}/{submitted}");
    }

    #[test]
    fn test_pool_matches_synchronous_generation() {
        let generator = shared_generator();
        let pool = AsyncChunkGenerator::new(Arc::clone(&generator), 3, 16, 16).unwrap();
        let addresses = [ChunkAddress::new(4, 1, -2), ChunkAddress::new(-3, 0, 5), ChunkAddress::new(0, 2, 0)];
        for address in addresses {
            pool.submit(address).unwrap();
        }

        let results = collect(&pool, addresses.len());
        assert_eq!(results.len(), addresses.len());
        for generated in results {
            let expected = generator.generate(generated.address);
            assert_eq!(
                generated.chunk.blocks(),
                expected.blocks(),
                "pool output differs for {}",
                generated.address
            );
            assert!(generated.chunk.is_generated());
        }
    }

    #[test]
    fn test_submit_rejects_when_full() {
        let pool = AsyncChunkGenerator::new(shared_generator(), 1, 1, 1).unwrap();
        let mut rejected = None;
        for x in 0..64 {
            if let Err(address) = pool.submit(ChunkAddress::new(x, 0, 0)) {
                rejected = Some(address);
                break;
            }
        }
        let rejected = rejected.expect("a single-slot queue should fill up");
        assert!(!pool.is_pending(&rejected), "rejected tasks must not stay pending");
    }

    #[test]
    fn test_cancellation_clears_pending() {
        let pool = AsyncChunkGenerator::new(shared_generator(), 2, 64, 64).unwrap();
        let address = ChunkAddress::new(50, 0, 50);
        pool.submit(address).unwrap();
        assert!(pool.is_pending(&address));

        pool.cancel(&address);
        assert!(!pool.is_pending(&address));

        // The task may already have finished; either way nothing is pending.
        std::thread::sleep(Duration::from_millis(200));
        let _ = pool.drain_results();
        assert!(!pool.is_pending(&address));
    }

    #[test]
    fn test_duplicate_submit_keeps_one_task() {
        let pool = AsyncChunkGenerator::new(shared_generator(), 1, 64, 64).unwrap();
        let address = ChunkAddress::new(-40, 1, 12);
        pool.submit(address).unwrap();
        pool.submit(address).unwrap();
        assert!(pool.in_flight_count() <= 1, "a pending address is queued once");

        let results = collect(&pool, 1);
        std::thread::sleep(Duration::from_millis(100));
        let extra = pool.drain_results().len();
        assert_eq!(results.len() + extra, 1);
        assert!(!pool.is_pending(&address));
    }

    #[test]
    fn test_cancel_reaches_original_task_after_duplicate() {
        let pool = AsyncChunkGenerator::new(shared_generator(), 1, 64, 64).unwrap();
        // Keep the single worker busy so the target stays queued.
        let blockers: Vec<_> = (0..4).map(|x| ChunkAddress::new(x, 2, 30)).collect();
        for &blocker in &blockers {
            pool.submit(blocker).unwrap();
        }
        let address = ChunkAddress::new(60, 0, 60);
        pool.submit(address).unwrap();
        pool.submit(address).unwrap();
        pool.cancel(&address);

        let deadline = Instant::now() + Duration::from_secs(60);
        let mut results = Vec::new();
        while pool.in_flight_count() > 0 && Instant::now() < deadline {
            results.extend(pool.drain_results());
            std::thread::sleep(Duration::from_millis(10));
        }
        results.extend(pool.drain_results());
        assert!(results.iter().all(|r| r.address != address), "cancelled chunk was delivered");
        assert_eq!(results.len(), blockers.len());
    }

    #[test]
    fn test_rejected_duplicate_keeps_pending_entry() {
        let pool = AsyncChunkGenerator::new(shared_generator(), 1, 1, 1).unwrap();
        let first = ChunkAddress::new(0, 0, 0);
        pool.submit(first).unwrap();
        // Fill the queue, then resubmit the first address.
        let mut x = 1;
        while pool.submit(ChunkAddress::new(x, 0, 0)).is_ok() && x < 64 {
            x += 1;
        }
        let _ = pool.submit(first);
        let completed_first = pool.drain_results().iter().any(|r| r.address == first);
        assert!(completed_first || pool.is_pending(&first), "the earlier task lost its pending entry");
    }

    #[test]
    fn test_in_flight_count_drains() {
        let pool = AsyncChunkGenerator::new(shared_generator(), 1, 64, 64).unwrap();
        assert_eq!(pool.in_flight_count(), 0);

        for i in 0..5 {
            let _ = pool.submit(ChunkAddress::new(i, 0, 0));
        }

        let deadline = Instant::now() + Duration::from_secs(60);
        while pool.in_flight_count() > 0 && Instant::now() < deadline {
            let _ = pool.drain_results();
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(pool.in_flight_count(), 0, "all tasks should complete");
    }
}
