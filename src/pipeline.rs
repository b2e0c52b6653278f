//! Two-phase GNAT pipeline
//!
//! Phase 1 builds one quadtree per neuron over that neuron's spike-pair
//! points, all sharing a top-level box spanning the recording. Phase 2
//! walks every postsynaptic spike pair, range-queries the quadtree of each
//! presynaptic partner with a box of half-side `c_radius` centred on the
//! pair's point, and streams the candidates that survive the containment
//! gate and the causal test to the edge sink.
//!
//! After phase 1 everything the enumeration touches is read-only, so phase
//! 2 can also fan out across postsynaptic neurons on rayon's pool; workers
//! then collect their neuron's edges locally and take a lock only to hand
//! them to the writer. Edge multiset is identical either way, line order is
//! not a contract.

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::causal::test_for_edge;
use crate::emitter::{EdgeWriter, GnatEdge};
use crate::error::{GnatError, Result};
use crate::geometry::BoundingBox;
use crate::network::PhysNetwork;
use crate::quadtree::QuadTree;
use crate::raster::SpikeRaster;

/// Search parameters for one run
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Params {
    /// Causal decay time constant
    pub tau: f32,
    /// Maximum admissible causal distance
    pub thresh: f32,
    /// Half-side of the query box in the (t1, t2) plane
    pub c_radius: f64,
}

/// Read-only state driving the enumeration phase
pub struct Pipeline {
    raster: SpikeRaster,
    network: PhysNetwork,
    qtrees: Vec<QuadTree>,
}

impl Pipeline {
    /// Phase 1: build one quadtree per neuron from its spike-pair set
    ///
    /// All trees share a top-level box centred on the middle of the
    /// recording. Its half-width is padded by one tick past the recorded
    /// span so pairs touching `t_min` or `t_max` stay strictly interior;
    /// a pair the root still rejects is an error, never a silent drop.
    ///
    /// The raster and network must describe the same population: the
    /// enumeration phase indexes presynaptic lists and quadtrees by the
    /// other side's neuron ids.
    pub fn build(raster: SpikeRaster, network: PhysNetwork) -> Result<Pipeline> {
        if raster.n_cells() != network.n_cells() {
            return Err(GnatError::PopulationMismatch {
                raster: raster.n_cells(),
                network: network.n_cells(),
            });
        }

        let c = (raster.t_max() + raster.t_min()) as f64 / 2.0;
        let w2 = (raster.t_max() - raster.t_min()) as f64 / 2.0 + 1.0;
        let top = BoundingBox::new(c, c, w2);

        let mut qtrees = Vec::with_capacity(raster.n_cells());
        for n_id in 0..raster.n_cells() as u32 {
            let mut qt = QuadTree::new(top);
            for pair in raster.pairs_of(n_id) {
                if !qt.insert(pair) {
                    return Err(GnatError::PairOutsideBounds { n_id });
                }
            }
            debug!(n_id, pairs = qt.len(), "quadtree built");
            qtrees.push(qt);
        }

        Ok(Self {
            raster,
            network,
            qtrees,
        })
    }

    pub fn raster(&self) -> &SpikeRaster {
        &self.raster
    }

    pub fn network(&self) -> &PhysNetwork {
        &self.network
    }

    /// Quadtree of one neuron's spike pairs
    pub fn quadtree(&self, n_id: u32) -> &QuadTree {
        &self.qtrees[n_id as usize]
    }

    /// Phase 2, serial: enumerate edges in postsynaptic neuron order
    ///
    /// Returns the number of edges handed to the writer.
    pub fn run(&self, params: &Params, writer: &mut EdgeWriter) -> Result<u64> {
        let n_cells = self.raster.n_cells();
        let mut emitted = 0u64;
        for v in 0..n_cells as u32 {
            if v % 10 == 0 {
                info!(cell = v, of = n_cells, "enumerating");
            }
            self.enumerate_post(v, params, &mut |edge| {
                emitted += 1;
                writer.push(edge)
            })?;
        }
        Ok(emitted)
    }

    /// Phase 2 over rayon's pool, partitioned by postsynaptic neuron
    ///
    /// Emits the same edge multiset as [`run`](Self::run); only the line
    /// order differs.
    pub fn run_parallel(&self, params: &Params, writer: &mut EdgeWriter) -> Result<u64> {
        let emitted = AtomicU64::new(0);
        let sink = Mutex::new(writer);

        (0..self.raster.n_cells() as u32)
            .into_par_iter()
            .try_for_each(|v| -> Result<()> {
                let mut local: Vec<GnatEdge> = Vec::new();
                self.enumerate_post(v, params, &mut |edge| {
                    local.push(edge);
                    Ok(())
                })?;
                if local.is_empty() {
                    return Ok(());
                }
                emitted.fetch_add(local.len() as u64, Ordering::Relaxed);
                let mut guard = sink.lock().unwrap_or_else(PoisonError::into_inner);
                for edge in local {
                    guard.push(edge)?;
                }
                Ok(())
            })?;

        Ok(emitted.into_inner())
    }

    /// Enumerate the accepted edges of one postsynaptic neuron
    ///
    /// For every spike pair of `v` and every incoming synapse, the source
    /// neuron's quadtree is range-queried with a box of half-side
    /// `c_radius` centred on the pair's point. Candidates must lie strictly
    /// inside the query box and pass the causal test before they reach the
    /// sink; the traversal itself over-approximates.
    fn enumerate_post<F>(&self, v: u32, params: &Params, emit: &mut F) -> Result<()>
    where
        F: FnMut(GnatEdge) -> Result<()>,
    {
        for post in self.raster.pairs_of(v) {
            let (c_x, c_y) = post.point();
            let region = BoundingBox::new(c_x, c_y, params.c_radius);

            for syn in self.network.presyns(v) {
                let qt = &self.qtrees[syn.src_id as usize];
                let mut failed = None;
                qt.query_map(&region, &mut |pre| {
                    let (x, y) = pre.point();
                    if region.contains_point(x, y)
                        && test_for_edge(pre, &post, syn, params.tau, params.thresh)
                    {
                        let edge = GnatEdge {
                            pre: *pre,
                            post,
                            cd_ratio: 1.0,
                        };
                        if let Err(e) = emit(edge) {
                            failed = Some(e);
                            return ControlFlow::Break(());
                        }
                    }
                    ControlFlow::Continue(())
                });
                if let Some(e) = failed {
                    return Err(e);
                }
            }
        }
        Ok(())
    }
}
