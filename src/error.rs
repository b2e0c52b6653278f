//! Error types for gnatfinder

use std::path::PathBuf;
use thiserror::Error;

/// Gnatfinder error type
#[derive(Debug, Error)]
pub enum GnatError {
    /// Cannot open an input or output file
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Malformed field in a spike or network file
    #[error("{}:{line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// Neuron id outside the configured population
    #[error("neuron {n_id} outside population of {n_cells} cells")]
    NeuronOutOfRange { n_id: u64, n_cells: usize },

    /// Raster and network built for different population sizes
    #[error("raster population ({raster} cells) does not match network population ({network} cells)")]
    PopulationMismatch { raster: usize, network: usize },

    /// Synapse weight with no finite negative log
    #[error("synapse {src} -> {tgt} has non-positive weight {rel_w}")]
    BadWeight { src: u64, tgt: u64, rel_w: f32 },

    /// Spike pair rejected by the root quadtree boundary
    #[error("spike pair of neuron {n_id} falls outside the quadtree root boundary")]
    PairOutsideBounds { n_id: u32 },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GnatError>;
