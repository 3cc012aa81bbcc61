use std::collections::BTreeSet;

/// Particles flagged for detachment during the current tick.
///
/// Owned by the simulation and passed into constraint relaxation by
/// reference. Repeated requests for the same particle collapse into one
/// entry, and draining yields indices in ascending order so cut processing is
/// deterministic.
#[derive(Clone, Debug, Default)]
pub struct CutQueue {
    pending: BTreeSet<u32>,
}

impl CutQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag a particle. Returns `false` if it was already queued.
    pub fn push(&mut self, particle: u32) -> bool {
        self.pending.insert(particle)
    }

    pub fn contains(&self, particle: u32) -> bool {
        self.pending.contains(&particle)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Take every pending index, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<u32> {
        std::mem::take(&mut self.pending).into_iter().collect()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
