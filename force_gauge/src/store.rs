/*!
Shared holder of the most recent reading.

The reader thread is the only writer. Any number of threads may take
snapshots; a snapshot always sees one whole [`Reading`], never fields from
two different frames.
*/

use crate::reading::{Reading, Snapshot};
use parking_lot::Mutex;
use std::time::Instant;

#[derive(Debug, Default)]
struct Slot {
    latest: Option<Reading>,
    published: u64,
}

/// Lock-protected latest reading
#[derive(Debug, Default)]
pub struct SharedReadingStore {
    slot: Mutex<Slot>,
}

impl SharedReadingStore {
    /// Create an empty store holding the absent reading
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored reading
    pub fn publish(&self, reading: Reading) {
        let mut slot = self.slot.lock();
        slot.latest = Some(reading);
        slot.published += 1;
    }

    /// Copy out the latest reading and its age
    pub fn snapshot(&self) -> Snapshot {
        let latest = self.slot.lock().latest;
        match latest {
            Some(reading) => Snapshot::of(&reading, Instant::now()),
            None => Snapshot::ABSENT,
        }
    }

    /// Latest reading, if any frame has completed
    pub fn latest(&self) -> Option<Reading> {
        self.slot.lock().latest
    }

    /// Number of readings published so far
    pub fn published_count(&self) -> u64 {
        self.slot.lock().published
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::ForceUnit;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_empty_store_is_absent() {
        let store = SharedReadingStore::new();
        assert_eq!(store.snapshot(), Snapshot::ABSENT);
        assert_eq!(store.latest(), None);
        assert_eq!(store.published_count(), 0);
    }

    #[test]
    fn test_publish_overwrites() {
        let store = SharedReadingStore::new();
        store.publish(Reading::new(1.0, ForceUnit::Gram));
        store.publish(Reading::new(-2.5, ForceUnit::Newton));

        let snapshot = store.snapshot();
        assert_eq!(snapshot.value, -2.5);
        assert_eq!(snapshot.unit, Some(ForceUnit::Newton));
        assert_eq!(store.published_count(), 2);
    }

    #[test]
    fn test_concurrent_snapshots_never_torn() {
        // Each published value encodes the unit it was published with
        fn unit_for(value: f64) -> ForceUnit {
            ForceUnit::ALL[(value as usize) % ForceUnit::ALL.len()]
        }

        let store = Arc::new(SharedReadingStore::new());
        let done = Arc::new(AtomicBool::new(false));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                let done = Arc::clone(&done);
                thread::spawn(move || {
                    let mut checked = 0u64;
                    while !done.load(Ordering::SeqCst) {
                        let snapshot = store.snapshot();
                        if let Some(unit) = snapshot.unit {
                            assert_eq!(unit, unit_for(snapshot.value));
                            checked += 1;
                        }
                    }
                    checked
                })
            })
            .collect();

        for i in 0..20_000u32 {
            let value = f64::from(i);
            store.publish(Reading::new(value, unit_for(value)));
        }
        done.store(true, Ordering::SeqCst);

        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(store.published_count(), 20_000);
        assert_eq!(store.snapshot().value, 19_999.0);
    }
}
