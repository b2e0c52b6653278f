//! Spike and spike-pair value types
//!
//! A spike is one firing event `(neuron id, timestamp)`. A spike pair is an
//! ordered pair of two distinct spikes from the same neuron, read as the
//! point `(sp1.ts, sp2.ts)` in the 2-D timestamp plane. Pair generation
//! walks a neuron's train in file order, so `sp1.ts < sp2.ts` is not an
//! invariant of the type itself.

use std::fmt;

/// A single firing event
///
/// Two spikes are identical iff both `n_id` and `ts` match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Spike {
    /// Neuron id
    pub n_id: u32,
    /// Timestamp in integer ticks
    pub ts: i64,
}

impl Spike {
    #[inline]
    pub const fn new(n_id: u32, ts: i64) -> Self {
        Self { n_id, ts }
    }
}

impl fmt::Display for Spike {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Spike[{}, {}]", self.n_id, self.ts)
    }
}

/// Ordered pair of two distinct spikes from the same neuron
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpikePair {
    /// First spike in train order
    pub sp1: Spike,
    /// Second spike in train order
    pub sp2: Spike,
}

impl SpikePair {
    #[inline]
    pub const fn new(sp1: Spike, sp2: Spike) -> Self {
        Self { sp1, sp2 }
    }

    /// Coordinates of the pair in the (t1, t2) plane
    #[inline]
    pub fn point(&self) -> (f64, f64) {
        (self.sp1.ts as f64, self.sp2.ts as f64)
    }
}

impl fmt::Display for SpikePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <---> {}", self.sp1, self.sp2)
    }
}
