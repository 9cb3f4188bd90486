//! Per-device admission state.
//!
//! Each (device, message type) pair remembers when it was last admitted and
//! with which sequence number. Entries are created on first admission and by
//! default are kept for the lifetime of the store, so memory grows with the
//! number of distinct devices ever seen. A capacity limit can be set to evict
//! the least recently admitted entry instead.

use crate::filter::AdmitDecision;
use crate::reading::MessageType;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

type DeviceKey = (String, MessageType);

/// What is remembered about the last admitted event of a device and message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceState {
    pub last_emitted_at: Instant,
    pub last_sequence_number: u8,
}

/// Thread-safe store of [`DeviceState`] entries.
///
/// Share between pipelines with `Arc<DeviceStateStore>`; every admission is a
/// single locked read-modify-write.
#[derive(Debug, Default)]
pub struct DeviceStateStore {
    entries: Mutex<HashMap<DeviceKey, DeviceState>>,
    capacity: Option<NonZeroUsize>,
}

impl DeviceStateStore {
    /// Create an unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that tracks at most `capacity` keys.
    ///
    /// When a new key would exceed the limit, the key admitted longest ago is
    /// forgotten, so its next event is treated as a first event.
    pub fn with_capacity_limit(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::default(),
            capacity: Some(capacity),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<DeviceKey, DeviceState>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up the state recorded for a device and message type.
    pub fn get(&self, device_id: &str, message_type: MessageType) -> Option<DeviceState> {
        self.lock()
            .get(&(device_id.to_string(), message_type))
            .copied()
    }

    /// Number of tracked (device, message type) keys.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Run an admission check against the current state and record the event if accepted.
    ///
    /// `check` sees the previous state (if any). The entry is written only when
    /// it returns [`AdmitDecision::Accept`]; rejections and errors leave the
    /// store untouched. The whole operation holds the lock.
    pub fn admit_with<E>(
        &self,
        device_id: &str,
        message_type: MessageType,
        sequence_number: u8,
        now: Instant,
        check: impl FnOnce(Option<&DeviceState>) -> Result<AdmitDecision, E>,
    ) -> Result<AdmitDecision, E> {
        let mut entries = self.lock();
        let key = (device_id.to_string(), message_type);

        let decision = check(entries.get(&key))?;

        if decision == AdmitDecision::Accept {
            if !entries.contains_key(&key) {
                self.evict_if_full(&mut entries);
            }
            entries.insert(
                key,
                DeviceState {
                    last_emitted_at: now,
                    last_sequence_number: sequence_number,
                },
            );
        }

        Ok(decision)
    }

    fn evict_if_full(&self, entries: &mut HashMap<DeviceKey, DeviceState>) {
        let Some(capacity) = self.capacity else {
            return;
        };
        if entries.len() < capacity.get() {
            return;
        }

        let oldest = entries
            .iter()
            .min_by_key(|(_, state)| state.last_emitted_at)
            .map(|(key, _)| key.clone());

        if let Some(key) = oldest {
            log::debug!("evicting state for {} ({})", key.0, key.1);
            entries.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::RejectReason;
    use std::convert::Infallible;
    use std::sync::Arc;
    use std::time::Duration;

    fn accept(_: Option<&DeviceState>) -> Result<AdmitDecision, Infallible> {
        Ok(AdmitDecision::Accept)
    }

    fn reject(_: Option<&DeviceState>) -> Result<AdmitDecision, Infallible> {
        Ok(AdmitDecision::Reject(RejectReason::Duplicate))
    }

    #[test]
    fn test_new_store_is_empty() {
        let store = DeviceStateStore::new();
        assert!(store.is_empty());
        assert_eq!(store.get("AA:BB", MessageType::Sensor), None);
    }

    #[test]
    fn test_accept_records_state() {
        let store = DeviceStateStore::new();
        let now = Instant::now();

        store
            .admit_with("AA:BB", MessageType::Sensor, 7, now, accept)
            .unwrap();

        let state = store.get("AA:BB", MessageType::Sensor).unwrap();
        assert_eq!(state.last_emitted_at, now);
        assert_eq!(state.last_sequence_number, 7);
        assert_eq!(store.get("AA:BB", MessageType::Calculation), None);
    }

    #[test]
    fn test_reject_leaves_state_untouched() {
        let store = DeviceStateStore::new();
        let t0 = Instant::now();
        store
            .admit_with("AA:BB", MessageType::Sensor, 1, t0, accept)
            .unwrap();

        store
            .admit_with("AA:BB", MessageType::Sensor, 2, t0 + Duration::from_secs(5), reject)
            .unwrap();

        let state = store.get("AA:BB", MessageType::Sensor).unwrap();
        assert_eq!(state.last_emitted_at, t0);
        assert_eq!(state.last_sequence_number, 1);
    }

    #[test]
    fn test_error_leaves_state_untouched() {
        let store = DeviceStateStore::new();
        let result: Result<AdmitDecision, &str> =
            store.admit_with("AA:BB", MessageType::Sensor, 1, Instant::now(), |_| Err("boom"));
        assert_eq!(result, Err("boom"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_check_sees_previous_state() {
        let store = DeviceStateStore::new();
        let now = Instant::now();
        store
            .admit_with("AA:BB", MessageType::Sensor, 3, now, accept)
            .unwrap();

        let mut seen = None;
        store
            .admit_with("AA:BB", MessageType::Sensor, 4, now, |prev| {
                seen = prev.copied();
                Ok::<_, Infallible>(AdmitDecision::Accept)
            })
            .unwrap();

        assert_eq!(seen.map(|s| s.last_sequence_number), Some(3));
    }

    #[test]
    fn test_unbounded_by_default() {
        let store = DeviceStateStore::new();
        let now = Instant::now();
        for i in 0..1000 {
            store
                .admit_with(&format!("dev-{i}"), MessageType::Sensor, 0, now, accept)
                .unwrap();
        }
        assert_eq!(store.len(), 1000);
    }

    #[test]
    fn test_capacity_limit_evicts_oldest() {
        let store = DeviceStateStore::with_capacity_limit(NonZeroUsize::new(2).unwrap());
        let t0 = Instant::now();

        store
            .admit_with("A", MessageType::Sensor, 1, t0, accept)
            .unwrap();
        store
            .admit_with("B", MessageType::Sensor, 1, t0 + Duration::from_secs(1), accept)
            .unwrap();
        // Refresh A so B becomes the oldest
        store
            .admit_with("A", MessageType::Sensor, 2, t0 + Duration::from_secs(2), accept)
            .unwrap();
        store
            .admit_with("C", MessageType::Sensor, 1, t0 + Duration::from_secs(3), accept)
            .unwrap();

        assert_eq!(store.len(), 2);
        assert!(store.get("A", MessageType::Sensor).is_some());
        assert!(store.get("B", MessageType::Sensor).is_none());
        assert!(store.get("C", MessageType::Sensor).is_some());
    }

    #[test]
    fn test_concurrent_admissions_are_serialized() {
        let store = Arc::new(DeviceStateStore::new());
        let now = Instant::now();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store
                        .admit_with("AA:BB", MessageType::Sensor, 9, now, |prev| {
                            Ok::<_, Infallible>(match prev {
                                Some(_) => AdmitDecision::Reject(RejectReason::Duplicate),
                                None => AdmitDecision::Accept,
                            })
                        })
                        .unwrap()
                })
            })
            .collect();

        let accepted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|d| *d == AdmitDecision::Accept)
            .count();

        assert_eq!(accepted, 1);
    }
}
