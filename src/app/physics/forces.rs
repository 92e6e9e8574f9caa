use eframe::egui::{Vec2, vec2};

use crate::layout::Viewport;

use super::quadtree::QuadNode;

const MIN_DISTANCE: f32 = 1.0;

#[derive(Clone, Copy)]
pub(super) struct RepulsionParams {
    pub(super) strength: f32,
    pub(super) theta: f32,
}

fn separation_direction(from: usize, to: usize) -> Vec2 {
    let angle = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin())
}

fn repulsion_between(point: Vec2, other: Vec2, strength: f32, mass: f32) -> Vec2 {
    let delta = point - other;
    let distance = delta.length();
    if distance <= 0.0001 {
        return Vec2::ZERO;
    }
    (delta / distance) * (strength * mass / distance.max(MIN_DISTANCE))
}

pub(super) fn accumulate_repulsion_for_node(
    node: &QuadNode,
    index: usize,
    positions: &[Vec2],
    params: RepulsionParams,
    delta_velocity: &mut Vec2,
) {
    if node.mass <= 0.0 {
        return;
    }

    let point = positions[index];

    if node.is_leaf() {
        for &other_index in &node.indices {
            if other_index == index {
                continue;
            }
            let push = repulsion_between(point, positions[other_index], params.strength, 1.0);
            *delta_velocity += if push == Vec2::ZERO {
                separation_direction(index, other_index) * params.strength
            } else {
                push
            };
        }
        return;
    }

    let distance = (point - node.center_of_mass).length().max(0.0001);
    let can_approximate = !node.bounds.contains(point)
        && (node.bounds.side_length() / distance) < params.theta
        && node.mass > 1.0;

    if can_approximate {
        *delta_velocity +=
            repulsion_between(point, node.center_of_mass, params.strength, node.mass);
        return;
    }

    for child in node.children() {
        accumulate_repulsion_for_node(child, index, positions, params, delta_velocity);
    }
}

pub(super) fn collect_collision_pairs(
    node_a: &QuadNode,
    node_b: &QuadNode,
    same_node: bool,
    padding: f32,
    pairs: &mut Vec<(usize, usize)>,
) {
    let reach = node_a.max_radius + node_b.max_radius + padding;
    if node_a.bounds.distance_sq_to(node_b.bounds) > reach * reach {
        return;
    }

    if node_a.is_leaf() && node_b.is_leaf() {
        if same_node {
            for (offset, &from) in node_a.indices.iter().enumerate() {
                for &to in &node_a.indices[offset + 1..] {
                    pairs.push((from, to));
                }
            }
        } else {
            for &from in &node_a.indices {
                for &to in &node_b.indices {
                    pairs.push((from, to));
                }
            }
        }
        return;
    }

    if same_node {
        let children = node_a.children().collect::<Vec<_>>();
        for (first, child_a) in children.iter().enumerate() {
            collect_collision_pairs(child_a, child_a, true, padding, pairs);
            for child_b in &children[first + 1..] {
                collect_collision_pairs(child_a, child_b, false, padding, pairs);
            }
        }
        return;
    }

    let split_a = if node_a.is_leaf() {
        false
    } else if node_b.is_leaf() {
        true
    } else {
        node_a.bounds.half_extent >= node_b.bounds.half_extent
    };

    if split_a {
        for child in node_a.children() {
            collect_collision_pairs(child, node_b, false, padding, pairs);
        }
    } else {
        for child in node_b.children() {
            collect_collision_pairs(node_a, child, false, padding, pairs);
        }
    }
}

/// Pushes overlapping pairs apart until centers are at least `r_a + r_b + padding` apart.
/// Pinned nodes never move; their partner takes the whole correction.
///
/// Returns whether any pair still overlapped on the final pass.
pub(super) fn resolve_collisions(
    positions: &mut [Vec2],
    radii: &[f32],
    pinned: &[bool],
    pairs: &[(usize, usize)],
    padding: f32,
    iterations: usize,
) -> bool {
    let mut overlapping = false;
    for _ in 0..iterations {
        overlapping = false;
        for &(from, to) in pairs {
            let min_distance = radii[from] + radii[to] + padding;
            let delta = positions[from] - positions[to];
            let distance = delta.length();
            if distance >= min_distance {
                continue;
            }

            let (weight_from, weight_to) = match (pinned[from], pinned[to]) {
                (true, true) => continue,
                (true, false) => (0.0, 1.0),
                (false, true) => (1.0, 0.0),
                (false, false) => (0.5, 0.5),
            };
            overlapping = true;

            let direction = if distance > 0.0001 {
                delta / distance
            } else {
                separation_direction(from, to)
            };
            let overlap = min_distance - distance;
            positions[from] += direction * overlap * weight_from;
            positions[to] -= direction * overlap * weight_to;
        }
        if !overlapping {
            break;
        }
    }
    overlapping
}

pub(super) fn contain(
    position: &mut Vec2,
    velocity: &mut Vec2,
    radius: f32,
    viewport: Viewport,
    restitution: f32,
) -> bool {
    if viewport.is_empty() {
        return false;
    }

    let x_bounced = contain_axis(
        &mut position.x,
        &mut velocity.x,
        radius,
        viewport.width,
        restitution,
    );
    let y_bounced = contain_axis(
        &mut position.y,
        &mut velocity.y,
        radius,
        viewport.height,
        restitution,
    );
    x_bounced || y_bounced
}

fn contain_axis(
    position: &mut f32,
    velocity: &mut f32,
    radius: f32,
    extent: f32,
    restitution: f32,
) -> bool {
    if extent < radius * 2.0 {
        let center = extent * 0.5;
        let moved = *position != center;
        *position = center;
        *velocity = 0.0;
        return moved;
    }

    if *position < radius {
        *position = radius;
        *velocity = -*velocity * restitution;
        true
    } else if *position > extent - radius {
        *position = extent - radius;
        *velocity = -*velocity * restitution;
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn containment_bounces_off_the_left_edge_then_settles() {
        let viewport = Viewport::new(800.0, 600.0);
        let radius = 60.0;
        let mut position = vec2(-radius, 300.0);
        let mut velocity = vec2(-10.0, 2.0);

        assert!(contain(&mut position, &mut velocity, radius, viewport, 0.8));
        assert_eq!(position, vec2(radius, 300.0));
        assert_eq!(velocity, vec2(8.0, 2.0));

        assert!(!contain(&mut position, &mut velocity, radius, viewport, 0.8));
        assert_eq!(position, vec2(radius, 300.0));
        assert_eq!(velocity, vec2(8.0, 2.0));
    }

    #[test]
    fn containment_handles_the_far_edges() {
        let viewport = Viewport::new(800.0, 600.0);
        let mut position = vec2(790.0, 650.0);
        let mut velocity = vec2(5.0, 10.0);

        contain(&mut position, &mut velocity, 50.0, viewport, 0.8);

        assert_eq!(position, vec2(750.0, 550.0));
        assert_eq!(velocity, vec2(-4.0, -8.0));
    }

    #[test]
    fn containment_ignores_an_unsized_viewport_and_centers_in_a_tiny_one() {
        let mut position = vec2(-5.0, -5.0);
        let mut velocity = vec2(1.0, 1.0);
        assert!(!contain(&mut position, &mut velocity, 10.0, Viewport::new(0.0, 0.0), 0.8));
        assert_eq!(position, vec2(-5.0, -5.0));

        contain(&mut position, &mut velocity, 50.0, Viewport::new(60.0, 400.0), 0.8);
        assert_eq!(position.x, 30.0);
        assert_eq!(position.y, 50.0);
    }

    #[test]
    fn collisions_are_separated_to_radius_sum_plus_padding() {
        let mut positions = vec![vec2(100.0, 100.0), vec2(110.0, 100.0), vec2(100.0, 100.0)];
        let radii = [20.0, 30.0, 10.0];
        let pinned = [false, false, false];
        let tree = QuadNode::build(&positions, &radii).unwrap();
        let mut pairs = Vec::new();
        collect_collision_pairs(&tree, &tree, true, 20.0, &mut pairs);
        assert_eq!(pairs.len(), 3);

        resolve_collisions(&mut positions, &radii, &pinned, &pairs, 20.0, 32);

        for &(from, to) in &pairs {
            let distance = (positions[from] - positions[to]).length();
            assert!(distance >= radii[from] + radii[to] + 20.0 - 0.01, "{from}-{to}: {distance}");
        }
    }

    #[test]
    fn pinned_nodes_do_not_move_during_collision() {
        let mut positions = vec![vec2(0.0, 0.0), vec2(10.0, 0.0)];
        let radii = [10.0, 10.0];
        resolve_collisions(&mut positions, &radii, &[true, false], &[(0, 1)], 20.0, 1);

        assert_eq!(positions[0], vec2(0.0, 0.0));
        assert!((positions[1] - vec2(40.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn far_apart_cells_produce_no_pairs() {
        let positions = (0..10)
            .map(|index| vec2(index as f32 * 1000.0, 0.0))
            .collect::<Vec<_>>();
        let radii = vec![10.0; positions.len()];
        let tree = QuadNode::build(&positions, &radii).unwrap();
        let mut pairs = Vec::new();
        collect_collision_pairs(&tree, &tree, true, 20.0, &mut pairs);

        let close = pairs
            .iter()
            .filter(|(from, to)| (positions[*from] - positions[*to]).length() < 40.0)
            .count();
        assert_eq!(close, 0);
        assert!(pairs.len() < 45);
    }

    #[test]
    fn repulsion_pushes_nodes_apart() {
        let positions = [vec2(0.0, 0.0), vec2(10.0, 0.0)];
        let tree = QuadNode::build(&positions, &[1.0, 1.0]).unwrap();
        let params = RepulsionParams {
            strength: 30.0,
            theta: 0.9,
        };

        let mut left = Vec2::ZERO;
        accumulate_repulsion_for_node(&tree, 0, &positions, params, &mut left);
        let mut right = Vec2::ZERO;
        accumulate_repulsion_for_node(&tree, 1, &positions, params, &mut right);

        assert!(left.x < 0.0 && right.x > 0.0);
        assert!((left.x + 3.0).abs() < 1e-4);
    }
}
