//! Physical synaptic connectivity
//!
//! The network maps each postsynaptic neuron to the list of synapses that
//! terminate on it. Synapses carry the precomputed negative log of their
//! relative weight so the causal kernel never evaluates a log itself.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use crate::error::{GnatError, Result};

/// One directed synapse `src -> tgt`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Synapse {
    /// Presynaptic neuron id
    pub src_id: u64,
    /// Postsynaptic neuron id
    pub tgt_id: u64,
    /// Relative weight, strictly positive
    pub rel_w: f32,
    /// Conduction delay in ticks
    pub delay: f32,
    /// Precomputed `-ln(rel_w)`
    pub neg_log_rel_w: f32,
}

impl Synapse {
    /// Build a synapse, rejecting weights with no finite negative log
    pub fn new(src_id: u64, tgt_id: u64, rel_w: f32, delay: f32) -> Result<Synapse> {
        if !(rel_w > 0.0) || !rel_w.is_finite() {
            return Err(GnatError::BadWeight {
                src: src_id,
                tgt: tgt_id,
                rel_w,
            });
        }
        Ok(Self {
            src_id,
            tgt_id,
            rel_w,
            delay,
            neg_log_rel_w: -rel_w.ln(),
        })
    }
}

/// Per-target synapse lists for a fixed population
#[derive(Debug)]
pub struct PhysNetwork {
    presyns: Vec<Vec<Synapse>>,
    n_synapses: usize,
}

impl PhysNetwork {
    pub fn new(n_cells: usize) -> Self {
        Self {
            presyns: vec![Vec::new(); n_cells],
            n_synapses: 0,
        }
    }

    pub fn n_cells(&self) -> usize {
        self.presyns.len()
    }

    pub fn n_synapses(&self) -> usize {
        self.n_synapses
    }

    /// Add a synapse to the presynaptic list of its target
    ///
    /// Both endpoints must name cells of the population: the enumeration
    /// phase indexes quadtrees by `src_id`, so an out-of-range source is as
    /// fatal as an out-of-range target.
    pub fn add(&mut self, syn: Synapse) -> Result<()> {
        let n_cells = self.presyns.len();
        if syn.src_id >= n_cells as u64 {
            return Err(GnatError::NeuronOutOfRange {
                n_id: syn.src_id,
                n_cells,
            });
        }
        let list = self
            .presyns
            .get_mut(syn.tgt_id as usize)
            .ok_or(GnatError::NeuronOutOfRange {
                n_id: syn.tgt_id,
                n_cells,
            })?;
        list.push(syn);
        self.n_synapses += 1;
        Ok(())
    }

    /// Incoming synapses of a postsynaptic neuron
    pub fn presyns(&self, tgt_id: u32) -> &[Synapse] {
        &self.presyns[tgt_id as usize]
    }

    /// Read a network file: one synapse per non-empty line,
    /// `<src_id:dec> <tgt_id:dec> <rel_w:float> <delay:float>`.
    pub fn from_path<P: AsRef<Path>>(path: P, n_cells: usize) -> Result<PhysNetwork> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| GnatError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let mut network = PhysNetwork::new(n_cells);
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let syn = parse_synapse(line, path, idx + 1)?;
            network.add(syn)?;
        }

        debug!(
            n_synapses = network.n_synapses,
            n_cells, "network connectivity loaded"
        );
        Ok(network)
    }
}

fn parse_synapse(line: &str, path: &Path, lineno: usize) -> Result<Synapse> {
    let parse_err = |message: String| GnatError::Parse {
        path: path.to_path_buf(),
        line: lineno,
        message,
    };

    let mut fields = line.split_whitespace();
    let src_id: u64 = fields
        .next()
        .ok_or_else(|| parse_err("missing source neuron".into()))?
        .parse()
        .map_err(|_| parse_err("unable to parse source neuron".into()))?;
    let tgt_id: u64 = fields
        .next()
        .ok_or_else(|| parse_err("missing target neuron".into()))?
        .parse()
        .map_err(|_| parse_err("unable to parse target neuron".into()))?;
    let rel_w: f32 = fields
        .next()
        .ok_or_else(|| parse_err("missing relative weight".into()))?
        .parse()
        .map_err(|_| parse_err("unable to parse relative weight".into()))?;
    let delay: f32 = fields
        .next()
        .ok_or_else(|| parse_err("missing delay".into()))?
        .parse()
        .map_err(|_| parse_err("unable to parse delay".into()))?;

    Synapse::new(src_id, tgt_id, rel_w, delay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_neg_log_precomputed() {
        let syn = Synapse::new(0, 1, 0.5, 2.0).unwrap();
        assert!((syn.neg_log_rel_w - std::f32::consts::LN_2).abs() < 1e-6);
        assert_eq!(Synapse::new(2, 3, 1.0, 0.0).unwrap().neg_log_rel_w, 0.0);
    }

    #[test]
    fn test_non_positive_weight_rejected() {
        assert!(matches!(
            Synapse::new(0, 1, 0.0, 1.0),
            Err(GnatError::BadWeight { .. })
        ));
        assert!(matches!(
            Synapse::new(0, 1, -0.5, 1.0),
            Err(GnatError::BadWeight { .. })
        ));
        assert!(matches!(
            Synapse::new(0, 1, f32::NAN, 1.0),
            Err(GnatError::BadWeight { .. })
        ));
    }

    #[test]
    fn test_out_of_range_endpoints_rejected() {
        let mut net = PhysNetwork::new(2);
        let bad_tgt = Synapse::new(0, 2, 1.0, 1.0).unwrap();
        assert!(matches!(
            net.add(bad_tgt),
            Err(GnatError::NeuronOutOfRange { n_id: 2, .. })
        ));
        let bad_src = Synapse::new(5, 1, 1.0, 1.0).unwrap();
        assert!(matches!(
            net.add(bad_src),
            Err(GnatError::NeuronOutOfRange { n_id: 5, .. })
        ));
        assert_eq!(net.n_synapses(), 0);
    }

    #[test]
    fn test_from_path_groups_by_target() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "0 1 1.0 1.5").unwrap();
        writeln!(tmp).unwrap();
        writeln!(tmp, "2 1 0.25 3.0").unwrap();
        writeln!(tmp, "1 0 0.5 2.0").unwrap();
        tmp.flush().unwrap();

        let net = PhysNetwork::from_path(tmp.path(), 3).unwrap();
        assert_eq!(net.n_synapses(), 3);
        assert_eq!(net.presyns(1).len(), 2);
        assert_eq!(net.presyns(0).len(), 1);
        assert!(net.presyns(2).is_empty());
        assert_eq!(net.presyns(1)[0].src_id, 0);
        assert_eq!(net.presyns(1)[1].src_id, 2);
    }

    #[test]
    fn test_parse_error_carries_line_number() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "0 1 1.0 1.0").unwrap();
        writeln!(tmp, "0 1 potato 1.0").unwrap();
        tmp.flush().unwrap();

        match PhysNetwork::from_path(tmp.path(), 2) {
            Err(GnatError::Parse { line, message, .. }) => {
                assert_eq!(line, 2);
                assert!(message.contains("relative weight"));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }
}
