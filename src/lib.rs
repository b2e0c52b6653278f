//! # Gnatfinder - Second-Order Causal Activity Graphs
//!
//! Computes the GNAT graph of a spiking neural network: every pair of
//! ordered spike-pairs `((a1,a2),(b1,b2))` whose two positional spike
//! pairings both pass a causal-distance test across a physical synapse
//! becomes one edge of the activity graph.
//!
//! ## Core Components
//!
//! - **Spike / SpikePair**: timestamped events and ordered same-neuron
//!   pairs, read as points in the (t1, t2) plane
//! - **QuadTree**: per-neuron spatial index over spike-pair points with
//!   bounded leaves and pruned range traversal
//! - **Causal kernel**: the `gamma`/`omega` distance functions; log-space,
//!   no exp on the hot path
//! - **Pipeline**: builds the per-neuron trees, then drives the
//!   range-query cross join and streams edges to a bounded sink
//!
//! ## Design Principles
//!
//! - **Strict vs inclusive box semantics**: point containment is strict,
//!   box intersection inclusive; the quadtree depends on the asymmetry
//! - **Build once, read everywhere**: after the build phase the raster,
//!   network and trees are immutable, so enumeration can fan out freely
//! - **Typed errors end to end**: every fatal condition surfaces as a
//!   [`GnatError`]; nothing is silently dropped
//!
//! ## Example
//!
//! ```ignore
//! use gnatfinder::{EdgeWriter, Params, PhysNetwork, Pipeline, SpikeRaster};
//!
//! let raster = SpikeRaster::from_path("spikes.txt", 128)?;
//! let network = PhysNetwork::from_path("net.txt", 128)?;
//! let pipeline = Pipeline::build(raster, network)?;
//!
//! let mut writer = EdgeWriter::create("gnat2_out.txt")?;
//! let params = Params { tau: 1.0, thresh: 2.5, c_radius: 50.0 };
//! pipeline.run(&params, &mut writer)?;
//! writer.finish()?;
//! ```

// Spike and spike-pair value types
mod spike;
pub use spike::{Spike, SpikePair};

// Square regions of the (t1, t2) plane
mod geometry;
pub use geometry::{BoundingBox, Quadrant};

// Per-neuron spatial index
pub mod quadtree;
pub use quadtree::{QuadTree, QT_MAX_CAP};

// Spike trains and spike-file ingestion
mod raster;
pub use raster::SpikeRaster;

// Synaptic connectivity and network-file ingestion
mod network;
pub use network::{PhysNetwork, Synapse};

// Causal distance functions
pub mod causal;
pub use causal::{gamma, omega, test_for_edge, LARGE_GAMMA};

// Buffered edge output
mod emitter;
pub use emitter::{EdgeWriter, GnatEdge, EDGE_BUF_CAP};

// Two-phase orchestration
mod pipeline;
pub use pipeline::{Params, Pipeline};

// Error types
mod error;
pub use error::{GnatError, Result};
