//! Result slots for probes running against a view that may change underneath them

use std::collections::HashMap;

use tracing::debug;

use crate::probe::prober::ProbeResult;

/// Identifies one source of one extension
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProbeKey {
    pub pkg: String,
    pub source_index: usize,
}

impl ProbeKey {
    pub fn new(pkg: &str, source_index: usize) -> Self {
        Self {
            pkg: pkg.to_string(),
            source_index,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Pending,
    Done(ProbeResult),
}

/// Probe slots keyed by [`ProbeKey`].
///
/// A result is written only while its slot is pending and only if it was
/// started under the current generation. The generation follows the view it
/// belongs to through [`ProbeBoard::sync`], so results from probes launched
/// before a view change are dropped.
#[derive(Debug, Default)]
pub struct ProbeBoard {
    slots: HashMap<ProbeKey, SlotState>,
    generation: u64,
}

impl ProbeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Mark `keys` pending and return the generation their results must carry
    pub fn begin(&mut self, keys: impl IntoIterator<Item = ProbeKey>) -> u64 {
        for key in keys {
            self.slots.insert(key, SlotState::Pending);
        }
        self.generation
    }

    /// Store a result; returns false when the write was stale and dropped
    pub fn complete(&mut self, generation: u64, key: &ProbeKey, result: ProbeResult) -> bool {
        if generation != self.generation {
            debug!(
                "Dropping probe result for {}#{} from generation {} (current {})",
                key.pkg, key.source_index, generation, self.generation
            );
            return false;
        }

        match self.slots.get_mut(key) {
            Some(slot) if *slot == SlotState::Pending => {
                *slot = SlotState::Done(result);
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, key: &ProbeKey) -> Option<SlotState> {
        self.slots.get(key).copied()
    }

    /// Slots still waiting for a result
    pub fn pending_count(&self) -> usize {
        self.slots
            .values()
            .filter(|slot| matches!(slot, SlotState::Pending))
            .count()
    }

    /// Follow the view to `generation`
    ///
    /// Moving to a different generation forgets every slot and invalidates
    /// probes still in flight.
    pub fn sync(&mut self, generation: u64) {
        if generation == self.generation {
            return;
        }
        debug!(
            "View moved to generation {}, dropping {} probe slots",
            generation,
            self.slots.len()
        );
        self.slots.clear();
        self.generation = generation;
    }
}
