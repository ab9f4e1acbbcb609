//! Layered placement backed by `rust-sugiyama`.
//!
//! `rust-sugiyama` assigns every vertex a layer and an order inside it. Its
//! coordinates assume unit-sized vertices, so only the layering and the
//! ordering are kept; the ranks are then re-flowed here with real node sizes.

use std::{any::Any, collections::BTreeMap, panic};

use log::{debug, warn};
use rust_sugiyama::configure::Config;

use trellis_core::geometry::{Bounds, Size};

use super::{SolverOptions, cross_extent, flow_to_xy, main_extent};
use crate::{error::TrellisError, options::Direction};

/// Ranks of one connected component, first rank first.
type Ranks = Vec<Vec<usize>>;

/// Places nodes in ranks along the flow direction.
///
/// Connected components sit side by side across the flow; nodes without
/// edges form one extra rank after them.
pub(super) fn place(
    sizes: &[Size],
    edges: &[(usize, usize)],
    options: &SolverOptions,
) -> Result<Vec<Bounds>, TrellisError> {
    let components = if edges.is_empty() {
        vec![vec![(0..sizes.len()).collect()]]
    } else {
        rank_components(sizes.len(), edges)?
    };

    Ok(flow_components(sizes, &components, options.direction(), options.spacing()))
}

/// Runs `rust-sugiyama` and turns its coordinates into ranks.
fn rank_components(count: usize, edges: &[(usize, usize)]) -> Result<Vec<Ranks>, TrellisError> {
    let sugiyama_edges = edges
        .iter()
        .map(|&(source, target)| Ok((to_vertex(source)?, to_vertex(target)?)))
        .collect::<Result<Vec<(u32, u32)>, TrellisError>>()?;

    debug!(
        nodes_count = count,
        edges_count = sugiyama_edges.len();
        "Applying Sugiyama algorithm"
    );

    // The crate panics on some degenerate inputs
    let results = panic::catch_unwind(move || {
        let config = Config {
            minimum_length: 1,
            vertex_spacing: 3.0,
            ..Default::default()
        };
        rust_sugiyama::from_edges(&sugiyama_edges, &config)
    })
    .map_err(|payload| {
        TrellisError::Layout(format!(
            "rust-sugiyama layout engine panicked: {}",
            panic_message(payload.as_ref())
        ))
    })?;

    if results.is_empty() {
        return Err(TrellisError::Layout(
            "rust-sugiyama returned empty layout results".to_string(),
        ));
    }

    let mut placed = vec![false; count];
    let mut components = Vec::with_capacity(results.len() + 1);

    for (coords, _, _) in &results {
        // Group vertices by layer coordinate, then order each layer by x
        let mut layers: BTreeMap<i64, Vec<(f64, usize)>> = BTreeMap::new();
        for &(id, (x, y)) in coords {
            if id >= count || placed[id] {
                warn!(vertex = id; "Ignoring unexpected vertex from rust-sugiyama");
                continue;
            }
            placed[id] = true;
            layers
                .entry((y * 1000.0).round() as i64)
                .or_default()
                .push((x, id));
        }

        let mut ranks: Ranks = layers
            .into_values()
            .map(|mut layer| {
                layer.sort_by(|a, b| a.0.total_cmp(&b.0));
                layer.into_iter().map(|(_, id)| id).collect()
            })
            .collect();

        // The layer axis sign is not part of the crate's contract; orient
        // ranks so that most edges point forward.
        let mut rank_of = vec![usize::MAX; count];
        for (rank, layer) in ranks.iter().enumerate() {
            for &id in layer {
                rank_of[id] = rank;
            }
        }
        let (forward, backward) = edges.iter().fold((0usize, 0usize), |(f, b), &(s, t)| {
            let (rs, rt) = (rank_of[s], rank_of[t]);
            if rs == usize::MAX || rt == usize::MAX {
                (f, b)
            } else if rs < rt {
                (f + 1, b)
            } else if rs > rt {
                (f, b + 1)
            } else {
                (f, b)
            }
        });
        if backward > forward {
            ranks.reverse();
        }

        if !ranks.is_empty() {
            components.push(ranks);
        }
    }

    let isolated: Vec<usize> = (0..count).filter(|&id| !placed[id]).collect();
    if !isolated.is_empty() {
        components.push(vec![isolated]);
    }

    Ok(components)
}

fn to_vertex(index: usize) -> Result<u32, TrellisError> {
    u32::try_from(index)
        .map_err(|_| TrellisError::Layout(format!("node index {index} exceeds the solver range")))
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else {
        "unknown error"
    }
}

/// Converts ranks to boxes. Every rank is centered across the flow within
/// its component, and every node is centered along the flow within its rank.
fn flow_components(
    sizes: &[Size],
    components: &[Ranks],
    direction: Direction,
    spacing: f32,
) -> Vec<Bounds> {
    let mut boxes = vec![Bounds::default(); sizes.len()];
    let mut cross_cursor = 0.0f32;

    for ranks in components {
        let rank_cross: Vec<f32> = ranks
            .iter()
            .map(|rank| {
                let total: f32 = rank
                    .iter()
                    .map(|&id| cross_extent(sizes[id], direction))
                    .sum();
                total + spacing * rank.len().saturating_sub(1) as f32
            })
            .collect();
        let component_cross = rank_cross.iter().copied().fold(0.0f32, f32::max);

        let mut main_cursor = 0.0f32;
        for (rank, &rank_width) in ranks.iter().zip(&rank_cross) {
            let rank_depth = rank
                .iter()
                .map(|&id| main_extent(sizes[id], direction))
                .fold(0.0f32, f32::max);

            let mut cross = cross_cursor + (component_cross - rank_width) / 2.0;
            for &id in rank {
                let size = sizes[id];
                let main = main_cursor + (rank_depth - main_extent(size, direction)) / 2.0;
                let origin = flow_to_xy(main, cross, size, direction);
                boxes[id] = Bounds::new_from_top_left(origin, size);
                cross += cross_extent(size, direction) + spacing;
            }
            main_cursor += rank_depth + spacing;
        }

        cross_cursor += component_cross + spacing;
    }

    boxes
}
