//! Aggregator: one worker per producer, one ordered snapshot for all of them
//!
//! Every configured producer gets its own OS thread. A worker loops over
//! `produce` and `suspend_until_next`; whenever `produce` returns a message
//! the worker stores it in its own slot of the shared snapshot and sends a
//! copy of the whole snapshot to the output channel.
//!
//! Workers are plain threads rather than runtime tasks because producers
//! block (file reads, sleeps, waiting on child processes) and because the
//! process must be able to exit without joining them.

use log::{debug, trace, warn};
use rg_status_core::{
    BoxedProducer, InitError, ProducerDescriptor, Registry, Segment, SlotEntry, SlotRegistry,
    Snapshot, StartupError, Teardown, MIN_CHANNEL_CAPACITY, WORKER_THREAD_PREFIX,
};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::sync::mpsc;

/// Pause after a producer panics inside `suspend_until_next`, so a broken
/// producer cannot spin
const PANIC_PAUSE: Duration = Duration::from_secs(1);

/// Receiving end of the aggregator's output channel
pub type SnapshotReceiver = mpsc::Receiver<Snapshot>;

/// Handle for one running worker
struct Worker {
    name: String,
    handle: JoinHandle<()>,
}

/// Runs all producers and multiplexes their updates
pub struct Aggregator {
    slots: SlotRegistry,
    snapshot: Arc<Mutex<Snapshot>>,
    workers: Vec<Worker>,
    teardowns: Vec<Teardown>,
}

impl Aggregator {
    /// Resolve, create, initialize and start every configured producer
    ///
    /// Nothing is spawned unless every step succeeds for every producer.
    pub fn start(
        registry: &Registry,
        descriptors: &[ProducerDescriptor],
    ) -> Result<(Self, SnapshotReceiver), StartupError> {
        let slots = SlotRegistry::resolve(descriptors, registry)?;

        let mut producers = Vec::with_capacity(slots.len());
        for entry in slots.iter() {
            producers.push(registry.create(&entry.producer, &entry.options)?);
        }

        Self::spawn(slots, producers)
    }

    /// Start workers for already-constructed producers
    ///
    /// `producers[i]` is bound to slot `i`; extra producers on either side
    /// are a configuration bug and rejected.
    pub fn spawn(
        slots: SlotRegistry,
        mut producers: Vec<BoxedProducer>,
    ) -> Result<(Self, SnapshotReceiver), StartupError> {
        if producers.len() != slots.len() {
            return Err(StartupError::Init(InitError::new(
                "aggregator",
                format!(
                    "{} producers for {} slots",
                    producers.len(),
                    slots.len()
                ),
            )));
        }

        for (entry, producer) in slots.iter().zip(producers.iter_mut()) {
            debug!("Initializing {} #{}", entry.producer, entry.instance);
            producer.initialize()?;
        }
        let teardowns: Vec<Teardown> = producers
            .iter_mut()
            .filter_map(|producer| producer.teardown())
            .collect();

        let snapshot = Arc::new(Mutex::new(Snapshot::new(slots.len())));
        let capacity = slots.len().max(MIN_CHANNEL_CAPACITY);
        let (tx, rx) = mpsc::channel(capacity);

        let mut workers = Vec::with_capacity(slots.len());
        for (entry, producer) in slots.iter().cloned().zip(producers) {
            let name = format!(
                "{}{}-{}",
                WORKER_THREAD_PREFIX, entry.producer, entry.instance
            );
            let shared = Arc::clone(&snapshot);
            let tx = tx.clone();

            let spawned = thread::Builder::new()
                .name(name.clone())
                .spawn(move || run_worker(entry, producer, shared, tx));
            let handle = match spawned {
                Ok(handle) => handle,
                Err(e) => {
                    teardowns.into_iter().for_each(|teardown| teardown());
                    return Err(InitError::new(name, format!("spawning worker: {}", e)).into());
                }
            };

            debug!("Started worker {}", name);
            workers.push(Worker { name, handle });
        }

        Ok((
            Self {
                slots,
                snapshot,
                workers,
                teardowns,
            },
            rx,
        ))
    }

    /// Number of slots in every published snapshot
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Copy of the latest state of every slot
    pub fn current(&self) -> Snapshot {
        lock(&self.snapshot).clone()
    }

    /// Thread names of all workers, in slot order
    pub fn worker_names(&self) -> impl Iterator<Item = &str> {
        self.workers.iter().map(|w| w.name.as_str())
    }

    /// Workers whose thread has not finished
    pub fn running_workers(&self) -> usize {
        self.workers
            .iter()
            .filter(|w| !w.handle.is_finished())
            .count()
    }

    /// Release what producers hold outside the process, such as child
    /// processes. Workers keep running until the output closes.
    pub fn stop(&mut self) {
        for teardown in self.teardowns.drain(..) {
            teardown();
        }
    }
}

impl Drop for Aggregator {
    fn drop(&mut self) {
        self.stop();
    }
}

fn lock(snapshot: &Mutex<Snapshot>) -> std::sync::MutexGuard<'_, Snapshot> {
    // Slot writes are single assignments, so a poisoned guard still holds a
    // consistent snapshot
    snapshot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Store `segment` in its slot and send the full snapshot
///
/// The lock is held until the send completes, so snapshots reach the
/// channel in the order they were built. Returns `false` once the receiver
/// is gone.
fn publish(
    shared: &Mutex<Snapshot>,
    tx: &mpsc::Sender<Snapshot>,
    index: usize,
    segment: Segment,
) -> bool {
    let mut snapshot = lock(shared);
    snapshot.set(index, segment);
    tx.blocking_send(snapshot.clone()).is_ok()
}

fn run_worker(
    entry: SlotEntry,
    mut producer: BoxedProducer,
    shared: Arc<Mutex<Snapshot>>,
    tx: mpsc::Sender<Snapshot>,
) {
    let instance = entry.instance_label();

    loop {
        match panic::catch_unwind(AssertUnwindSafe(|| producer.produce())) {
            Ok(Some(message)) => {
                let segment = Segment::new(entry.producer.as_str(), instance.as_str(), message);
                if !publish(&shared, &tx, entry.index, segment) {
                    debug!(
                        "{} #{}: output closed, worker exiting",
                        entry.producer, entry.instance
                    );
                    return;
                }
                trace!("{} #{} published", entry.producer, entry.instance);
            }
            Ok(None) => trace!("{} #{}: no update", entry.producer, entry.instance),
            Err(_) => warn!("{} #{}: producer panicked", entry.producer, entry.instance),
        }

        if panic::catch_unwind(AssertUnwindSafe(|| producer.suspend_until_next())).is_err() {
            warn!(
                "{} #{}: producer panicked while waiting",
                entry.producer, entry.instance
            );
            thread::sleep(PANIC_PAUSE);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rg_status_core::{
        Message, OptionError, Producer, ProducerMetadata, ProducerOptions,
    };
    use rg_status_sources::MemorySource;
    use rg_status_types::source_configs::MemorySourceConfig;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Instant;

    /// Plays back a fixed list of results, then reports nothing
    struct Scripted {
        metadata: ProducerMetadata,
        script: VecDeque<Option<&'static str>>,
        pause: Duration,
    }

    impl Scripted {
        fn new(script: &[Option<&'static str>], pause: Duration) -> BoxedProducer {
            Box::new(Self {
                metadata: ProducerMetadata::new("scripted", "Scripted", ""),
                script: script.iter().copied().collect(),
                pause,
            })
        }
    }

    impl Producer for Scripted {
        fn metadata(&self) -> &ProducerMetadata {
            &self.metadata
        }

        fn produce(&mut self) -> Option<Message> {
            self.script.pop_front().flatten().map(Message::new)
        }

        fn suspend_until_next(&mut self) {
            thread::sleep(self.pause);
        }
    }

    /// Always returns the same message
    struct Constant(ProducerMetadata, &'static str);

    impl Producer for Constant {
        fn metadata(&self) -> &ProducerMetadata {
            &self.0
        }

        fn produce(&mut self) -> Option<Message> {
            Some(Message::new(self.1))
        }

        fn suspend_until_next(&mut self) {
            thread::sleep(Duration::from_millis(5));
        }
    }

    /// Never has anything to report
    struct Degraded {
        metadata: ProducerMetadata,
        polls: Arc<AtomicUsize>,
    }

    impl Producer for Degraded {
        fn metadata(&self) -> &ProducerMetadata {
            &self.metadata
        }

        fn produce(&mut self) -> Option<Message> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            None
        }

        fn suspend_until_next(&mut self) {
            thread::sleep(Duration::from_millis(1));
        }
    }

    struct Panicking(ProducerMetadata);

    impl Producer for Panicking {
        fn metadata(&self) -> &ProducerMetadata {
            &self.0
        }

        fn produce(&mut self) -> Option<Message> {
            panic!("sensor exploded");
        }

        fn suspend_until_next(&mut self) {
            thread::sleep(Duration::from_millis(5));
        }
    }

    struct FailingInit(ProducerMetadata);

    impl Producer for FailingInit {
        fn metadata(&self) -> &ProducerMetadata {
            &self.0
        }

        fn initialize(&mut self) -> Result<(), InitError> {
            Err(InitError::new("broken", "required file missing"))
        }

        fn produce(&mut self) -> Option<Message> {
            Some(Message::new("never"))
        }

        fn suspend_until_next(&mut self) {}
    }

    /// Hands out a cleanup hook that records whether it ran
    struct WithTeardown {
        metadata: ProducerMetadata,
        released: Arc<AtomicBool>,
    }

    impl Producer for WithTeardown {
        fn metadata(&self) -> &ProducerMetadata {
            &self.metadata
        }

        fn produce(&mut self) -> Option<Message> {
            None
        }

        fn suspend_until_next(&mut self) {
            thread::sleep(Duration::from_millis(5));
        }

        fn teardown(&mut self) -> Option<Teardown> {
            let released = Arc::clone(&self.released);
            Some(Box::new(move || released.store(true, Ordering::SeqCst)))
        }
    }

    fn meta(id: &str) -> ProducerMetadata {
        ProducerMetadata::new(id, id, "")
    }

    fn unused(_: &ProducerOptions) -> Result<BoxedProducer, OptionError> {
        Err(OptionError::new("test", "-", "-", "built by hand"))
    }

    fn slots(names: &[&str]) -> SlotRegistry {
        let mut registry = Registry::new();
        for name in names {
            registry.register(name, name, "", Vec::new(), unused);
        }
        let descriptors: Vec<_> = names.iter().map(|n| ProducerDescriptor::new(*n)).collect();
        SlotRegistry::resolve(&descriptors, &registry).unwrap()
    }

    fn recv(rx: &mut SnapshotReceiver) -> Snapshot {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            match rx.try_recv() {
                Ok(snapshot) => return snapshot,
                Err(mpsc::error::TryRecvError::Empty) if Instant::now() < deadline => {
                    thread::sleep(Duration::from_millis(1))
                }
                Err(e) => panic!("no snapshot received: {:?}", e),
            }
        }
    }

    #[test]
    fn test_snapshot_length_and_index_stability() {
        let never = Duration::from_secs(3600);
        let (aggregator, mut rx) = Aggregator::spawn(
            slots(&["a", "b", "c"]),
            vec![
                Scripted::new(&[None], never),
                Scripted::new(&[None], never),
                Scripted::new(&[Some("third")], never),
            ],
        )
        .unwrap();

        let snapshot = recv(&mut rx);
        assert_eq!(snapshot.len(), 3);
        assert!(snapshot.get(0).is_none());
        assert!(snapshot.get(1).is_none());
        let seg = snapshot.get(2).unwrap();
        assert_eq!((seg.name.as_str(), seg.instance.as_str()), ("c", "1"));

        // Index 2 is serialized alone, never moved to position 0's place
        assert_eq!(
            snapshot.to_line().unwrap(),
            r#"[{"name":"c","instance":"1","full_text":"third"}],"#
        );
        assert_eq!(aggregator.len(), 3);
    }

    #[test]
    fn test_every_publish_carries_all_known_slots() {
        let (aggregator, mut rx) = Aggregator::spawn(
            slots(&["a", "b"]),
            vec![
                Scripted::new(&[Some("a1")], Duration::from_secs(3600)),
                Scripted::new(&[None, Some("b1")], Duration::from_millis(50)),
            ],
        )
        .unwrap();

        let first = recv(&mut rx);
        assert_eq!(first.get(0).unwrap().message.text, "a1");
        assert!(first.get(1).is_none());

        let second = recv(&mut rx);
        assert_eq!(second.get(0).unwrap().message.text, "a1");
        assert_eq!(second.get(1).unwrap().message.text, "b1");
        assert_eq!(aggregator.current(), second);
    }

    #[test]
    fn test_instances_of_same_type() {
        let never = Duration::from_secs(3600);
        let (aggregator, mut rx) = Aggregator::spawn(
            slots(&["memory", "memory"]),
            vec![
                Scripted::new(&[Some("40%")], never),
                Scripted::new(&[Some("40%")], never),
            ],
        )
        .unwrap();

        recv(&mut rx);
        let snapshot = recv(&mut rx);
        let instances: Vec<_> = snapshot
            .populated()
            .map(|s| (s.instance.as_str(), s.message.text.as_str()))
            .collect();
        assert_eq!(instances, [("1", "40%"), ("2", "40%")]);

        let names: Vec<_> = aggregator.worker_names().collect();
        assert_eq!(names, ["rg-status-memory-1", "rg-status-memory-2"]);
    }

    #[test]
    fn test_repeated_message_serializes_identically() {
        let (_aggregator, mut rx) =
            Aggregator::spawn(slots(&["clock"]), vec![Box::new(Constant(meta("clock"), "12:00"))])
                .unwrap();

        let first = recv(&mut rx).to_line().unwrap();
        for _ in 0..5 {
            assert_eq!(recv(&mut rx).to_line().unwrap(), first);
        }
    }

    #[test]
    fn test_degraded_producer_does_not_block_siblings() {
        let polls = Arc::new(AtomicUsize::new(0));
        let degraded = Box::new(Degraded {
            metadata: meta("volume"),
            polls: Arc::clone(&polls),
        });
        let (aggregator, mut rx) = Aggregator::spawn(
            slots(&["volume", "clock"]),
            vec![degraded, Box::new(Constant(meta("clock"), "tick"))],
        )
        .unwrap();

        for _ in 0..10 {
            let snapshot = recv(&mut rx);
            assert!(snapshot.get(0).is_none());
            assert_eq!(snapshot.get(1).unwrap().message.text, "tick");
        }
        assert!(polls.load(Ordering::SeqCst) > 0);
        assert_eq!(aggregator.running_workers(), 2);
    }

    #[test]
    fn test_panicking_producer_is_contained() {
        let (aggregator, mut rx) = Aggregator::spawn(
            slots(&["bad", "good"]),
            vec![
                Box::new(Panicking(meta("bad"))),
                Box::new(Constant(meta("good"), "ok")),
            ],
        )
        .unwrap();

        for _ in 0..3 {
            let snapshot = recv(&mut rx);
            assert!(snapshot.get(0).is_none());
            assert_eq!(snapshot.get(1).unwrap().message.text, "ok");
        }
        assert_eq!(aggregator.running_workers(), 2);
    }

    #[test]
    fn test_init_failure_spawns_nothing() {
        let result = Aggregator::spawn(
            slots(&["clock", "broken"]),
            vec![
                Box::new(Constant(meta("clock"), "12:00")),
                Box::new(FailingInit(meta("broken"))),
            ],
        );
        match result {
            Err(StartupError::Init(err)) => assert_eq!(err.producer, "broken"),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("startup should have failed"),
        }
    }

    #[test]
    fn test_mismatched_producer_count_rejected() {
        let result = Aggregator::spawn(slots(&["a", "b"]), vec![Box::new(Constant(meta("a"), "x"))]);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_producer_rejected_by_start() {
        let registry = Registry::new();
        let result = Aggregator::start(&registry, &[ProducerDescriptor::new("battery")]);
        assert!(matches!(result, Err(StartupError::UnknownProducer(_))));
    }

    #[test]
    fn test_workers_exit_when_output_closes() {
        let (aggregator, rx) =
            Aggregator::spawn(slots(&["clock"]), vec![Box::new(Constant(meta("clock"), "x"))])
                .unwrap();
        drop(rx);

        let deadline = Instant::now() + Duration::from_secs(5);
        while aggregator.running_workers() > 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(aggregator.running_workers(), 0);
    }

    #[test]
    fn test_stop_runs_teardowns_while_workers_run() {
        let released = Arc::new(AtomicBool::new(false));
        let producer = Box::new(WithTeardown {
            metadata: meta("volume"),
            released: Arc::clone(&released),
        });
        let (mut aggregator, _rx) = Aggregator::spawn(slots(&["volume"]), vec![producer]).unwrap();
        assert!(!released.load(Ordering::SeqCst));

        aggregator.stop();
        assert!(released.load(Ordering::SeqCst));
        assert_eq!(aggregator.running_workers(), 1);
    }

    #[test]
    fn test_drop_runs_teardowns() {
        let released = Arc::new(AtomicBool::new(false));
        let producer = Box::new(WithTeardown {
            metadata: meta("volume"),
            released: Arc::clone(&released),
        });
        let (aggregator, _rx) = Aggregator::spawn(slots(&["volume"]), vec![producer]).unwrap();
        drop(aggregator);
        assert!(released.load(Ordering::SeqCst));
    }

    #[test]
    fn test_two_memory_instances_share_one_meminfo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meminfo");
        std::fs::write(
            &path,
            "MemTotal: 1000 kB\nMemFree: 400 kB\nBuffers: 100 kB\nCached: 100 kB\n",
        )
        .unwrap();

        let producers: Vec<BoxedProducer> = (0..2)
            .map(|_| {
                Box::new(MemorySource::with_path(MemorySourceConfig::default(), &path))
                    as BoxedProducer
            })
            .collect();
        let (_aggregator, mut rx) =
            Aggregator::spawn(slots(&["memory", "memory"]), producers).unwrap();

        recv(&mut rx);
        let snapshot = recv(&mut rx);
        assert_eq!(
            snapshot.to_line().unwrap(),
            r#"[{"name":"memory","instance":"1","full_text":"40%"},{"name":"memory","instance":"2","full_text":"40%"}],"#
        );
    }
}
