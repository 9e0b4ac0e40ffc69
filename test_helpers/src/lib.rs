//! Test helpers shared across crates.
//!
//! This crate currently provides a scriptable clock and a mutable map
//! source.
//!
//! Usage scope:
//! - Intended for test code only; do not use in production binaries or libraries.

pub mod clock {
    //! A manually driven clock for deterministic cache tests.

    use std::collections::VecDeque;
    use std::sync::{Mutex, PoisonError};

    use strata_config::Clock;

    /// A [`Clock`] that returns scripted or manually set milliseconds.
    ///
    /// A scripted clock pops one timestamp per call and keeps returning the
    /// final one once the script is exhausted, matching the behaviour of a
    /// stubbed clock that repeats its last answer.
    #[derive(Debug)]
    pub struct ManualClock {
        state: Mutex<State>,
    }

    #[derive(Debug)]
    struct State {
        script: VecDeque<u64>,
        current: u64,
    }

    impl ManualClock {
        /// A clock pinned at `now_ms` until moved.
        #[must_use]
        pub fn new(now_ms: u64) -> Self {
            Self {
                state: Mutex::new(State {
                    script: VecDeque::new(),
                    current: now_ms,
                }),
            }
        }

        /// A clock that answers each call with the next scripted timestamp.
        #[must_use]
        pub fn scripted(timestamps: impl IntoIterator<Item = u64>) -> Self {
            let script: VecDeque<u64> = timestamps.into_iter().collect();
            let current = script.back().copied().unwrap_or_default();
            Self {
                state: Mutex::new(State { script, current }),
            }
        }

        /// Pins the clock at `now_ms`, discarding any remaining script.
        pub fn set(&self, now_ms: u64) {
            let mut state = self.lock();
            state.script.clear();
            state.current = now_ms;
        }

        /// Moves the clock forward by `delta_ms`.
        pub fn advance(&self, delta_ms: u64) {
            let mut state = self.lock();
            state.script.clear();
            state.current += delta_ms;
        }

        fn lock(&self) -> std::sync::MutexGuard<'_, State> {
            self.state.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    impl Clock for ManualClock {
        fn now_ms(&self) -> u64 {
            let mut state = self.lock();
            if let Some(next) = state.script.pop_front() {
                state.current = next;
                return next;
            }
            state.current
        }
    }

    #[cfg(test)]
    mod tests {
        use strata_config::Clock;

        use super::ManualClock;

        #[test]
        fn pinned_clock_repeats_until_moved() {
            let clock = ManualClock::new(100);
            assert_eq!(clock.now_ms(), 100);
            assert_eq!(clock.now_ms(), 100);
            clock.advance(50);
            assert_eq!(clock.now_ms(), 150);
            clock.set(10);
            assert_eq!(clock.now_ms(), 10);
        }

        #[test]
        fn scripted_clock_repeats_its_last_answer() {
            let clock = ManualClock::scripted([1, 2, 3]);
            assert_eq!(clock.now_ms(), 1);
            assert_eq!(clock.now_ms(), 2);
            assert_eq!(clock.now_ms(), 3);
            assert_eq!(clock.now_ms(), 3);
        }
    }
}

pub mod source {
    //! A map-backed source whose entries tests can mutate between lookups.

    use std::collections::HashMap;
    use std::sync::{Arc, Mutex, PoisonError};

    use strata_config::Source;

    /// A [`Source`] over a shared map.
    ///
    /// Cloning yields a handle onto the same entries, so a test can keep one
    /// handle, register the other with a loader, and change values between
    /// lookups, standing in for a live backing store.
    #[derive(Clone)]
    pub struct SharedMapSource {
        label: String,
        entries: Arc<Mutex<HashMap<String, String>>>,
    }

    impl SharedMapSource {
        /// An empty shared source named `label`.
        #[must_use]
        pub fn new(label: impl Into<String>) -> Self {
            Self {
                label: label.into(),
                entries: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        /// Inserts or replaces an entry.
        pub fn put(&self, key: impl Into<String>, value: impl Into<String>) {
            self.lock().insert(key.into(), value.into());
        }

        /// Removes an entry.
        pub fn remove(&self, key: &str) {
            self.lock().remove(key);
        }

        fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
            self.entries.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    impl Source for SharedMapSource {
        fn label(&self) -> &str {
            &self.label
        }

        fn find(&self, key: &str) -> Option<String> {
            self.lock().get(key).cloned()
        }
    }
}
