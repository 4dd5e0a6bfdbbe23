//! Per-run outcome counters, shared by download workers and the analysis loop.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};

use strum::IntoEnumIterator;

use super::types::{ErrorType, InfoType, WarningType};

/// One atomic counter per variant of `K`, all present from creation.
struct Counters<K>(HashMap<K, AtomicUsize>);

impl<K> Counters<K>
where
    K: IntoEnumIterator + Copy + Eq + Hash + Debug,
{
    fn new() -> Self {
        Self(K::iter().map(|k| (k, AtomicUsize::new(0))).collect())
    }

    fn increment(&self, key: K) {
        match self.0.get(&key) {
            Some(counter) => {
                counter.fetch_add(1, Ordering::Relaxed);
            }
            None => log::error!("No counter registered for {key:?}"),
        }
    }

    fn get(&self, key: K) -> usize {
        self.0
            .get(&key)
            .map_or(0, |counter| counter.load(Ordering::SeqCst))
    }

    fn total(&self) -> usize {
        self.0
            .values()
            .map(|counter| counter.load(Ordering::SeqCst))
            .sum()
    }
}

/// Error, warning and info tallies for one recovery run.
///
/// Errors lose an asset or a loader; warnings are lower-confidence outcomes;
/// info counts notable events such as blacklisted or inferred URLs.
pub struct ProcessingStats {
    errors: Counters<ErrorType>,
    warnings: Counters<WarningType>,
    info: Counters<InfoType>,
}

impl Default for ProcessingStats {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStats {
    pub fn new() -> Self {
        ProcessingStats {
            errors: Counters::new(),
            warnings: Counters::new(),
            info: Counters::new(),
        }
    }

    pub fn increment_error(&self, error: ErrorType) {
        self.errors.increment(error);
    }

    pub fn increment_warning(&self, warning: WarningType) {
        self.warnings.increment(warning);
    }

    pub fn increment_info(&self, info_type: InfoType) {
        self.info.increment(info_type);
    }

    pub fn get_error_count(&self, error: ErrorType) -> usize {
        self.errors.get(error)
    }

    pub fn get_warning_count(&self, warning: WarningType) -> usize {
        self.warnings.get(warning)
    }

    pub fn get_info_count(&self, info_type: InfoType) -> usize {
        self.info.get(info_type)
    }

    pub fn total_errors(&self) -> usize {
        self.errors.total()
    }

    pub fn total_warnings(&self) -> usize {
        self.warnings.total()
    }

    pub fn total_info(&self) -> usize {
        self.info.total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero_for_every_variant() {
        let counters: Counters<InfoType> = Counters::new();
        assert_eq!(counters.0.len(), InfoType::iter().count());
        assert_eq!(counters.total(), 0);
    }

    #[test]
    fn test_counters_are_independent() {
        let stats = ProcessingStats::new();
        stats.increment_info(InfoType::Blacklisted);
        stats.increment_info(InfoType::Blacklisted);
        stats.increment_info(InfoType::DuplicateUrl);
        assert_eq!(stats.get_info_count(InfoType::Blacklisted), 2);
        assert_eq!(stats.total_info(), 3);
        assert_eq!(stats.total_errors(), 0);
        assert_eq!(stats.total_warnings(), 0);
    }
}
