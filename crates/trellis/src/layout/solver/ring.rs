//! Ring placements for `radial` and `circular` scopes.

use std::collections::VecDeque;

use trellis_core::geometry::{Bounds, Point, Size};

use super::SolverOptions;

/// Places every node on one circle, in node order, starting at the top.
pub(super) fn place_circular(sizes: &[Size], options: &SolverOptions) -> Vec<Bounds> {
    match sizes.len() {
        0 => Vec::new(),
        1 => vec![Bounds::new_from_center(Point::default(), sizes[0])],
        count => {
            let spacing = options.spacing();
            let circumference: f32 = sizes.iter().map(|size| size.diagonal() + spacing).sum();
            let radius = circumference / std::f32::consts::TAU;
            sizes
                .iter()
                .enumerate()
                .map(|(i, &size)| Bounds::new_from_center(on_circle(radius, i, count), size))
                .collect()
        }
    }
}

/// Places nodes on concentric rings by breadth-first distance from a root.
///
/// The root is the first node without incoming edges, or the first node
/// when every node has one. Nodes the search never reaches go on one extra
/// outer ring.
pub(super) fn place_radial(
    sizes: &[Size],
    edges: &[(usize, usize)],
    options: &SolverOptions,
) -> Vec<Bounds> {
    let count = sizes.len();
    if count == 0 {
        return Vec::new();
    }

    let mut outgoing = vec![Vec::new(); count];
    let mut has_incoming = vec![false; count];
    for &(source, target) in edges {
        outgoing[source].push(target);
        has_incoming[target] = true;
    }
    let root = (0..count).find(|&i| !has_incoming[i]).unwrap_or(0);

    let mut depth = vec![usize::MAX; count];
    depth[root] = 0;
    let mut queue = VecDeque::from([root]);
    while let Some(current) = queue.pop_front() {
        for &next in &outgoing[current] {
            if depth[next] == usize::MAX {
                depth[next] = depth[current] + 1;
                queue.push_back(next);
            }
        }
    }

    let deepest = depth.iter().copied().filter(|&d| d != usize::MAX).max().unwrap_or(0);
    let mut rings: Vec<Vec<usize>> = vec![Vec::new(); deepest + 1];
    let mut unreached = Vec::new();
    for (i, &d) in depth.iter().enumerate() {
        if d == usize::MAX {
            unreached.push(i);
        } else {
            rings[d].push(i);
        }
    }
    if !unreached.is_empty() {
        rings.push(unreached);
    }

    let step = sizes.iter().map(|size| size.diagonal()).fold(0.0f32, f32::max) + options.spacing();
    let mut boxes = vec![Bounds::default(); count];
    for (ring, members) in rings.iter().enumerate() {
        let radius = ring as f32 * step;
        for (slot, &i) in members.iter().enumerate() {
            let center = if ring == 0 && members.len() == 1 {
                Point::default()
            } else {
                // Rings with many members need a larger radius than the step
                let needed: f32 = members
                    .iter()
                    .map(|&m| sizes[m].diagonal() + options.spacing())
                    .sum::<f32>()
                    / std::f32::consts::TAU;
                on_circle(radius.max(needed), slot, members.len())
            };
            boxes[i] = Bounds::new_from_center(center, sizes[i]);
        }
    }
    boxes
}

fn on_circle(radius: f32, slot: usize, count: usize) -> Point {
    let angle = std::f32::consts::TAU * slot as f32 / count as f32 - std::f32::consts::FRAC_PI_2;
    Point::new(radius * angle.cos(), radius * angle.sin())
}
