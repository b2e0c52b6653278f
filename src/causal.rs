//! Causal kernel
//!
//! `gamma` is the causal distance between a presynaptic and a postsynaptic
//! spike across one synapse: the negative log of the synapse's activation
//! contribution `omega`. The synapse stores `-ln(rel_w)` precomputed, so the
//! in-range branch is two adds and one division; the sub-delay branch
//! returns the [`LARGE_GAMMA`] sentinel instead of the +inf that `-log(0)`
//! would give. No logs or exps on the hot path.

use crate::network::Synapse;
use crate::spike::{Spike, SpikePair};

/// Causal distance of the sub-delay regime
///
/// Finite stand-in for `-log(0)`; keeps `gamma` monotone and cheap.
pub const LARGE_GAMMA: f32 = 999_999.0;

/// Activation contribution of a presynaptic spike to a postsynaptic one
///
/// `H(dt >= delay) * rel_w * exp(-(dt - delay) / tau)` with `H` the
/// Heaviside step. Not used by the edge pipeline, which works in log space.
pub fn omega(pre: &Spike, post: &Spike, syn: &Synapse, tau: f32) -> f32 {
    let delta_t = (post.ts - pre.ts) as f32;
    if delta_t < syn.delay {
        return 0.0;
    }
    syn.rel_w * (-(delta_t - syn.delay) / tau).exp()
}

/// Causal distance between a presynaptic and a postsynaptic spike
///
/// `LARGE_GAMMA` when the gap is below the synaptic delay, otherwise
/// `-ln(rel_w) + (dt - delay) / tau`.
pub fn gamma(pre: &Spike, post: &Spike, syn: &Synapse, tau: f32) -> f32 {
    let delta_t = (post.ts - pre.ts) as f32;
    if delta_t < syn.delay {
        return LARGE_GAMMA;
    }
    syn.neg_log_rel_w + (delta_t - syn.delay) / tau
}

/// Edge predicate for a pre/post pair of spike pairs
///
/// Pairing is positional: `sp1` against `sp1`, `sp2` against `sp2`. Both
/// causal distances must fall within `thresh`.
pub fn test_for_edge(
    pre: &SpikePair,
    post: &SpikePair,
    syn: &Synapse,
    tau: f32,
    thresh: f32,
) -> bool {
    gamma(&pre.sp1, &post.sp1, syn, tau) <= thresh
        && gamma(&pre.sp2, &post.sp2, syn, tau) <= thresh
}

#[cfg(test)]
mod tests {
    use super::*;

    fn syn(rel_w: f32, delay: f32) -> Synapse {
        Synapse::new(0, 1, rel_w, delay).unwrap()
    }

    fn sp(ts: i64) -> Spike {
        Spike::new(0, ts)
    }

    #[test]
    fn test_gamma_sentinel_below_delay() {
        let s = syn(1.0, 5.0);
        // dt = 4 < delay
        assert_eq!(gamma(&sp(0), &sp(4), &s, 1.0), LARGE_GAMMA);
        // dt = 5 == delay is in range and exactly -ln(1) = 0
        assert_eq!(gamma(&sp(0), &sp(5), &s, 1.0), 0.0);
        // negative gaps are sub-delay too
        assert_eq!(gamma(&sp(10), &sp(4), &s, 1.0), LARGE_GAMMA);
    }

    #[test]
    fn test_gamma_strictly_increasing_in_dt() {
        let s = syn(0.5, 2.0);
        let tau = 3.0;
        let mut prev = gamma(&sp(0), &sp(2), &s, tau);
        for dt in 3..40 {
            let g = gamma(&sp(0), &sp(dt), &s, tau);
            assert!(g > prev, "gamma must increase with dt (dt = {dt})");
            prev = g;
        }
    }

    #[test]
    fn test_gamma_weight_term() {
        // rel_w = e^-2 gives neg_log_rel_w = 2
        let s = syn((-2.0f32).exp(), 1.0);
        let g = gamma(&sp(0), &sp(1), &s, 1.0);
        assert!((g - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_omega_matches_gamma_in_log_space() {
        let s = syn(0.8, 2.0);
        let tau = 1.5;
        let w = omega(&sp(0), &sp(7), &s, tau);
        let g = gamma(&sp(0), &sp(7), &s, tau);
        assert!((g - (-w.ln())).abs() < 1e-4);

        // Sub-delay: omega is zeroed by the Heaviside step
        assert_eq!(omega(&sp(0), &sp(1), &s, tau), 0.0);
    }

    #[test]
    fn test_edge_requires_both_gammas() {
        let s = syn(1.0, 1.0);
        let pre = SpikePair::new(sp(10), sp(20));
        let close = SpikePair::new(sp(11), sp(21));
        let half = SpikePair::new(sp(11), sp(40));
        assert!(test_for_edge(&pre, &close, &s, 1.0, 1.0));
        assert!(!test_for_edge(&pre, &half, &s, 1.0, 1.0));
    }
}
