//! Per-neuron spike trains and the spike-file reader
//!
//! The raster owns one time-ordered train per neuron plus the aggregate
//! extent of the recording. Trains are plain vectors in file order; since
//! spike files are pre-sorted by timestamp, the per-neuron sequence comes
//! out in non-decreasing `ts` without any post-pass.
//!
//! `pairs_of` is the pair generator both pipeline phases share: the ordered
//! pairs `(train[i], train[j])` with `i < j`, skipping the degenerate pairs
//! whose two spikes are identical.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use crate::error::{GnatError, Result};
use crate::spike::{Spike, SpikePair};

/// Spike trains for a fixed population
#[derive(Debug)]
pub struct SpikeRaster {
    trains: Vec<Vec<Spike>>,
    t_min: i64,
    t_max: i64,
    n_spikes: u64,
}

impl SpikeRaster {
    pub fn new(n_cells: usize) -> Self {
        Self {
            trains: vec![Vec::new(); n_cells],
            t_min: 0,
            t_max: 0,
            n_spikes: 0,
        }
    }

    pub fn n_cells(&self) -> usize {
        self.trains.len()
    }

    pub fn n_spikes(&self) -> u64 {
        self.n_spikes
    }

    /// Earliest timestamp seen, 0 for an empty raster
    pub fn t_min(&self) -> i64 {
        self.t_min
    }

    /// Latest timestamp seen, 0 for an empty raster
    pub fn t_max(&self) -> i64 {
        self.t_max
    }

    /// Append one spike to its neuron's train, keeping file order
    pub fn push(&mut self, spike: Spike) -> Result<()> {
        let n_cells = self.trains.len();
        let train = self
            .trains
            .get_mut(spike.n_id as usize)
            .ok_or(GnatError::NeuronOutOfRange {
                n_id: u64::from(spike.n_id),
                n_cells,
            })?;
        train.push(spike);

        if self.n_spikes == 0 {
            self.t_min = spike.ts;
            self.t_max = spike.ts;
        } else {
            self.t_min = self.t_min.min(spike.ts);
            self.t_max = self.t_max.max(spike.ts);
        }
        self.n_spikes += 1;
        Ok(())
    }

    /// Spike train of one neuron in file order
    pub fn train(&self, n_id: u32) -> &[Spike] {
        &self.trains[n_id as usize]
    }

    /// Ordered spike pairs of one neuron's train
    ///
    /// File order is preserved and identical spikes never pair with
    /// themselves; duplicated timestamps in the input otherwise pair as
    /// usual.
    pub fn pairs_of(&self, n_id: u32) -> impl Iterator<Item = SpikePair> + '_ {
        let train = self.train(n_id);
        train.iter().enumerate().flat_map(move |(i, &sp_a)| {
            train[i + 1..]
                .iter()
                .filter(move |&&sp_b| sp_b != sp_a)
                .map(move |&sp_b| SpikePair::new(sp_a, sp_b))
        })
    }

    /// Read a spike file: one spike per non-empty line,
    /// `<type:dec> <timestamp:hex> <neuron_id:dec>`.
    ///
    /// The type field is parsed and discarded. Timestamps are base-16
    /// without an `0x` prefix. The file must already be sorted by
    /// timestamp.
    pub fn from_path<P: AsRef<Path>>(path: P, n_cells: usize) -> Result<SpikeRaster> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| GnatError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let mut raster = SpikeRaster::new(n_cells);
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            raster.push(parse_spike(line, path, idx + 1)?)?;
        }

        debug!(n_spikes = raster.n_spikes, n_cells, "spike raster loaded");
        Ok(raster)
    }
}

fn parse_spike(line: &str, path: &Path, lineno: usize) -> Result<Spike> {
    let parse_err = |message: String| GnatError::Parse {
        path: path.to_path_buf(),
        line: lineno,
        message,
    };

    let mut fields = line.split_whitespace();
    let _sp_type: i64 = fields
        .next()
        .ok_or_else(|| parse_err("missing spike type".into()))?
        .parse()
        .map_err(|_| parse_err("unable to parse spike type".into()))?;
    let ts_field = fields
        .next()
        .ok_or_else(|| parse_err("missing timestamp".into()))?;
    let ts = i64::from_str_radix(ts_field, 16)
        .map_err(|_| parse_err("unable to parse timestamp".into()))?;
    let n_id: u32 = fields
        .next()
        .ok_or_else(|| parse_err("missing neuron id".into()))?
        .parse()
        .map_err(|_| parse_err("unable to parse neuron id".into()))?;

    Ok(Spike::new(n_id, ts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_push_tracks_extent() {
        let mut raster = SpikeRaster::new(2);
        raster.push(Spike::new(0, 50)).unwrap();
        assert_eq!((raster.t_min(), raster.t_max()), (50, 50));
        raster.push(Spike::new(1, 20)).unwrap();
        raster.push(Spike::new(0, 90)).unwrap();
        assert_eq!((raster.t_min(), raster.t_max()), (20, 90));
        assert_eq!(raster.n_spikes(), 3);
        assert_eq!(raster.train(0), &[Spike::new(0, 50), Spike::new(0, 90)]);
    }

    #[test]
    fn test_push_out_of_range_neuron() {
        let mut raster = SpikeRaster::new(2);
        assert!(matches!(
            raster.push(Spike::new(2, 0)),
            Err(GnatError::NeuronOutOfRange { n_id: 2, .. })
        ));
    }

    #[test]
    fn test_pairs_preserve_file_order() {
        let mut raster = SpikeRaster::new(1);
        for ts in [10, 20, 30] {
            raster.push(Spike::new(0, ts)).unwrap();
        }
        let pairs: Vec<SpikePair> = raster.pairs_of(0).collect();
        assert_eq!(
            pairs,
            vec![
                SpikePair::new(Spike::new(0, 10), Spike::new(0, 20)),
                SpikePair::new(Spike::new(0, 10), Spike::new(0, 30)),
                SpikePair::new(Spike::new(0, 20), Spike::new(0, 30)),
            ]
        );
    }

    #[test]
    fn test_pairs_skip_identical_spikes() {
        let mut raster = SpikeRaster::new(1);
        raster.push(Spike::new(0, 10)).unwrap();
        raster.push(Spike::new(0, 10)).unwrap();
        raster.push(Spike::new(0, 15)).unwrap();
        let pairs: Vec<SpikePair> = raster.pairs_of(0).collect();
        // The duplicate never pairs with itself but still pairs with others
        assert_eq!(pairs.len(), 2);
        assert!(pairs
            .iter()
            .all(|p| p.sp1.ts != p.sp2.ts || p.sp1.n_id != p.sp2.n_id));
    }

    #[test]
    fn test_single_spike_neuron_has_no_pairs() {
        let mut raster = SpikeRaster::new(1);
        raster.push(Spike::new(0, 42)).unwrap();
        assert_eq!(raster.pairs_of(0).count(), 0);
    }

    #[test]
    fn test_from_path_hex_timestamps() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "0 0A 0").unwrap();
        writeln!(tmp, "0 0B 1").unwrap();
        writeln!(tmp).unwrap();
        writeln!(tmp, "0 14 0").unwrap();
        writeln!(tmp, "0 15 1").unwrap();
        tmp.flush().unwrap();

        let raster = SpikeRaster::from_path(tmp.path(), 2).unwrap();
        assert_eq!(raster.n_spikes(), 4);
        assert_eq!(raster.train(0), &[Spike::new(0, 10), Spike::new(0, 20)]);
        assert_eq!(raster.train(1), &[Spike::new(1, 11), Spike::new(1, 21)]);
        assert_eq!((raster.t_min(), raster.t_max()), (10, 21));
    }

    #[test]
    fn test_from_path_parse_error_line() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "0 0A 0").unwrap();
        writeln!(tmp, "0 XYZ 0").unwrap();
        tmp.flush().unwrap();

        match SpikeRaster::from_path(tmp.path(), 1) {
            Err(GnatError::Parse { line, message, .. }) => {
                assert_eq!(line, 2);
                assert!(message.contains("timestamp"));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }
}
