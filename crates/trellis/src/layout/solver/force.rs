//! Force-directed placement for `force` and `stress` scopes.
//!
//! Nodes start evenly spaced on a circle, so results are deterministic for a
//! given input. Every pair of nodes repels, connected nodes attract, and
//! velocities are damped each step. A final sweep separates boxes that still
//! overlap.

use log::trace;

use trellis_core::geometry::{Bounds, Point, Size};

use super::SolverOptions;

/// Simulation parameters.
#[derive(Debug, Clone)]
pub(super) struct ForceParams {
    pub(super) iterations: usize,
    spring_constant: f32,
    repulsion_constant: f32,
    damping_factor: f32,
}

impl Default for ForceParams {
    fn default() -> Self {
        Self {
            iterations: 100,
            spring_constant: 0.1,
            repulsion_constant: 1000.0,
            damping_factor: 0.85,
        }
    }
}

/// Places nodes with a spring simulation.
///
/// With `stress` set, springs pull toward an ideal edge length derived from
/// the node sizes and spacing instead of toward zero length.
pub(super) fn place(
    sizes: &[Size],
    edges: &[(usize, usize)],
    options: &SolverOptions,
    params: &ForceParams,
    stress: bool,
) -> Vec<Bounds> {
    let count = sizes.len();
    if count == 0 {
        return Vec::new();
    }

    let spacing = options.spacing();
    let mut centers = seed_circle(sizes, spacing);
    let mut velocities = vec![Point::default(); count];

    for _ in 0..params.iterations {
        let mut forces = vec![Point::default(); count];

        // Repulsion between all pairs
        for i in 0..count {
            for j in 0..count {
                if i == j {
                    continue;
                }
                let trans = centers[i].sub_point(centers[j]);
                let min_dist = (sizes[i].diagonal() + sizes[j].diagonal()) / 2.0 + spacing;
                let distance = trans.hypot().max(1.0);

                let force_factor = if distance < min_dist {
                    params.repulsion_constant * (min_dist / distance).powf(2.0)
                } else {
                    params.repulsion_constant / distance
                };
                forces[i] = forces[i].add_point(trans.scale(force_factor / distance));
            }
        }

        // Springs along edges
        for &(source, target) in edges {
            let delta = centers[source].sub_point(centers[target]);
            let distance = delta.hypot().max(1.0);
            let stretch = if stress {
                let ideal = (sizes[source].diagonal() + sizes[target].diagonal()) / 2.0 + spacing;
                distance - ideal
            } else {
                distance
            };
            let pull = delta.scale(params.spring_constant * stretch / distance);
            forces[source] = forces[source].sub_point(pull);
            forces[target] = forces[target].add_point(pull);
        }

        for i in 0..count {
            velocities[i] = velocities[i]
                .add_point(forces[i])
                .scale(params.damping_factor);
            centers[i] = centers[i].add_point(velocities[i]);
        }
    }

    let mut boxes: Vec<Bounds> = centers
        .iter()
        .zip(sizes)
        .map(|(&center, &size)| Bounds::new_from_center(center, size))
        .collect();
    separate_overlaps(&mut boxes, spacing);

    trace!(nodes_count = count, stress = stress; "Force simulation finished");
    boxes
}

/// Evenly spaced centers on a circle large enough to hold every node.
pub(super) fn seed_circle(sizes: &[Size], spacing: f32) -> Vec<Point> {
    let count = sizes.len();
    if count == 1 {
        return vec![Point::default()];
    }
    let circumference: f32 = sizes.iter().map(|size| size.diagonal() + spacing).sum();
    let radius = circumference / std::f32::consts::TAU;

    (0..count)
        .map(|i| {
            let angle = std::f32::consts::TAU * i as f32 / count as f32;
            Point::new(radius * angle.cos(), radius * angle.sin())
        })
        .collect()
}

/// Pushes overlapping boxes apart along the axis of least penetration.
fn separate_overlaps(boxes: &mut [Bounds], spacing: f32) {
    let count = boxes.len();
    for _ in 0..count.max(1) * 4 {
        let mut moved = false;
        for i in 0..count {
            for j in (i + 1)..count {
                let (a, b) = (boxes[i], boxes[j]);
                if !a.overlaps(&b) {
                    continue;
                }
                moved = true;
                let push_x = (a.max_x().min(b.max_x()) - a.x().max(b.x())) + spacing;
                let push_y = (a.max_y().min(b.max_y()) - a.y().max(b.y())) + spacing;
                let delta = b.center().sub_point(a.center());
                let shift = if push_x <= push_y {
                    Point::new(if delta.x() >= 0.0 { push_x } else { -push_x }, 0.0)
                } else {
                    Point::new(0.0, if delta.y() >= 0.0 { push_y } else { -push_y })
                };
                boxes[i] = a.translate(shift.scale(-0.5));
                boxes[j] = b.translate(shift.scale(0.5));
            }
        }
        if !moved {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use trellis_core::geometry::Insets;

    use super::*;
    use crate::options::{Algorithm, Direction};

    fn options() -> SolverOptions {
        SolverOptions::new(Algorithm::Force, Direction::Down, 20.0, Insets::default())
    }

    #[test]
    fn test_single_node() {
        let boxes = place(&[Size::new(10.0, 10.0)], &[], &options(), &ForceParams::default(), false);

        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].center(), Point::default());
    }

    #[test]
    fn test_no_overlaps_after_simulation() {
        let sizes = vec![Size::new(60.0, 30.0); 6];
        let edges = [(0, 1), (1, 2), (2, 0), (3, 4), (4, 5)];

        for stress in [false, true] {
            let boxes = place(&sizes, &edges, &options(), &ForceParams::default(), stress);
            for i in 0..boxes.len() {
                for j in (i + 1)..boxes.len() {
                    assert!(!boxes[i].overlaps(&boxes[j]), "{i} overlaps {j}");
                }
            }
        }
    }

    #[test]
    fn test_deterministic() {
        let sizes = vec![Size::new(30.0, 30.0); 4];
        let edges = [(0, 1), (1, 2), (2, 3)];

        let first = place(&sizes, &edges, &options(), &ForceParams::default(), false);
        let second = place(&sizes, &edges, &options(), &ForceParams::default(), false);
        assert_eq!(first, second);
    }

    #[test]
    fn test_separate_overlaps() {
        let mut boxes = [Bounds::new(0.0, 0.0, 10.0, 10.0), Bounds::new(5.0, 1.0, 10.0, 10.0)];
        separate_overlaps(&mut boxes, 2.0);

        assert!(!boxes[0].overlaps(&boxes[1]));
    }
}
