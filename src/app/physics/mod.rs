mod forces;
mod quadtree;

use std::collections::HashMap;

use eframe::egui::Vec2;

use crate::cafe::CafeNode;
use crate::config::VisualConfig;
use crate::layout::{LayoutMode, Viewport};

use super::orbit::CafePositions;
use forces::{
    RepulsionParams, accumulate_repulsion_for_node, collect_collision_pairs, contain,
    resolve_collisions,
};
use quadtree::QuadNode;

const BARNES_HUT_THETA: f32 = 0.9;
const ALPHA_MIN: f32 = 0.001;
/// Reaches `ALPHA_MIN` from 1 in about 300 ticks.
const ALPHA_DECAY: f32 = 0.0228;
const DRAG_ALPHA_TARGET: f32 = 0.3;
const REHEAT_ALPHA: f32 = 0.3;
const COLLISION_ITERATIONS: usize = 4;
const MAX_TICKS_PER_FRAME: usize = 4;
const MAX_FRAME_SECONDS: f32 = 0.25;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct SimulationParams {
    pub(in crate::app) repulsion: f32,
    pub(in crate::app) anchor_strength: f32,
    pub(in crate::app) velocity_decay: f32,
    pub(in crate::app) collision_padding: f32,
    pub(in crate::app) selected_radius_scale: f32,
    pub(in crate::app) bounce_restitution: f32,
    pub(in crate::app) tick_rate_hz: f32,
}

impl SimulationParams {
    pub(in crate::app) fn new(config: &VisualConfig, mode: LayoutMode) -> Self {
        let physics = config.physics_for(mode);
        Self {
            repulsion: physics.repulsion,
            anchor_strength: physics.anchor_strength,
            velocity_decay: config.velocity_decay,
            collision_padding: config.collision_padding,
            selected_radius_scale: config.selected_radius_scale,
            bounce_restitution: config.bounce_restitution,
            tick_rate_hz: config.tick_rate_hz,
        }
    }
}

type TickObserver = Box<dyn FnMut(&[CafeNode])>;

#[derive(Default)]
struct Scratch {
    positions: Vec<Vec2>,
    radii: Vec<f32>,
    pinned: Vec<bool>,
    deltas: Vec<Vec2>,
    pairs: Vec<(usize, usize)>,
}

/// One running layout over a fixed node set. A new node set or layout mode
/// gets a new instance; the previous one is stopped first.
pub(in crate::app) struct ForceSimulation {
    nodes: Vec<CafeNode>,
    anchors: Vec<Vec2>,
    index_by_id: HashMap<String, usize>,
    params: SimulationParams,
    viewport: Viewport,
    alpha: f32,
    alpha_target: f32,
    selected: Option<usize>,
    accumulator: f32,
    ticks: u64,
    settled: bool,
    observers: Vec<TickObserver>,
    scratch: Scratch,
}

impl ForceSimulation {
    pub(in crate::app) fn start(
        mut nodes: Vec<CafeNode>,
        anchors: Vec<Vec2>,
        params: SimulationParams,
        viewport: Viewport,
    ) -> Self {
        for node in &mut nodes {
            node.velocity = Vec2::ZERO;
        }
        let index_by_id = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.clone(), index))
            .collect();

        tracing::debug!(
            nodes = nodes.len(),
            width = viewport.width,
            height = viewport.height,
            "force simulation started"
        );

        let settled = nodes.is_empty();
        Self {
            nodes,
            anchors,
            index_by_id,
            params,
            viewport,
            alpha: if settled { 0.0 } else { 1.0 },
            alpha_target: 0.0,
            selected: None,
            accumulator: 0.0,
            ticks: 0,
            settled,
            observers: Vec::new(),
            scratch: Scratch::default(),
        }
    }

    pub(in crate::app) fn stop(self) -> Vec<CafeNode> {
        tracing::debug!(ticks = self.ticks, "force simulation stopped");
        let mut nodes = self.nodes;
        for node in &mut nodes {
            node.pin = None;
        }
        nodes
    }

    pub(in crate::app) fn on_tick(&mut self, observer: impl FnMut(&[CafeNode]) + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub(in crate::app) fn nodes(&self) -> &[CafeNode] {
        &self.nodes
    }

    pub(in crate::app) fn node(&self, id: &str) -> Option<&CafeNode> {
        self.index_by_id
            .get(id)
            .and_then(|&index| self.nodes.get(index))
    }

    pub(in crate::app) fn is_idle(&self) -> bool {
        self.nodes.is_empty() || (self.alpha < ALPHA_MIN && self.alpha_target < ALPHA_MIN)
    }

    pub(in crate::app) fn effective_radius(&self, index: usize) -> f32 {
        let Some(node) = self.nodes.get(index) else {
            return 0.0;
        };
        if Some(index) == self.selected {
            node.radius * self.params.selected_radius_scale
        } else {
            node.radius
        }
    }

    pub(in crate::app) fn hit_test(&self, point: Vec2) -> Option<&CafeNode> {
        self.nodes
            .iter()
            .enumerate()
            .rev()
            .find(|(index, node)| {
                let radius = self.effective_radius(*index);
                (node.position - point).length_sq() <= radius * radius
            })
            .map(|(_, node)| node)
    }

    pub(in crate::app) fn set_selected(&mut self, id: Option<&str>) {
        let selected = id.and_then(|id| self.index_by_id.get(id).copied());
        if selected != self.selected {
            self.selected = selected;
            self.reheat();
        }
    }

    pub(in crate::app) fn pin(&mut self, id: &str, position: Vec2) {
        let Some(&index) = self.index_by_id.get(id) else {
            return;
        };
        let node = &mut self.nodes[index];
        if node.pin.is_none() {
            self.alpha_target = DRAG_ALPHA_TARGET;
            self.settled = false;
        }
        node.pin = Some(position);
        node.position = position;
        node.velocity = Vec2::ZERO;
    }

    pub(in crate::app) fn release(&mut self, id: &str) {
        let Some(&index) = self.index_by_id.get(id) else {
            return;
        };
        if self.nodes[index].pin.take().is_some() {
            self.alpha_target = 0.0;
            self.reheat();
        }
    }

    fn reheat(&mut self) {
        if self.nodes.is_empty() {
            return;
        }
        self.alpha = self.alpha.max(REHEAT_ALPHA);
        self.settled = false;
    }

    pub(in crate::app) fn advance(&mut self, dt: f32) -> usize {
        if self.is_idle() {
            self.accumulator = 0.0;
            return 0;
        }

        let interval = 1.0 / self.params.tick_rate_hz.max(1.0);
        self.accumulator += dt.clamp(0.0, MAX_FRAME_SECONDS);
        let mut ticks = 0;
        while self.accumulator >= interval && ticks < MAX_TICKS_PER_FRAME {
            self.accumulator -= interval;
            self.tick();
            ticks += 1;
        }
        if ticks == MAX_TICKS_PER_FRAME {
            self.accumulator = 0.0;
        }
        ticks
    }

    pub(in crate::app) fn tick(&mut self) -> bool {
        if self.nodes.is_empty() {
            return false;
        }

        self.alpha += (self.alpha_target - self.alpha) * ALPHA_DECAY;
        self.ticks += 1;

        let radii = (0..self.nodes.len())
            .map(|index| self.effective_radius(index))
            .collect::<Vec<_>>();
        let Self {
            nodes,
            anchors,
            params,
            viewport,
            alpha,
            scratch,
            ..
        } = self;
        let alpha = *alpha;

        scratch.radii.clear();
        scratch.radii.extend(radii);
        load_positions(nodes, scratch);
        scratch.deltas.clear();
        scratch.deltas.resize(nodes.len(), Vec2::ZERO);

        if nodes.len() > 1
            && let Some(tree) = QuadNode::build(&scratch.positions, &scratch.radii)
        {
            let repulsion = RepulsionParams {
                strength: params.repulsion * alpha,
                theta: BARNES_HUT_THETA,
            };
            for (index, delta) in scratch.deltas.iter_mut().enumerate() {
                accumulate_repulsion_for_node(&tree, index, &scratch.positions, repulsion, delta);
            }
        }

        let retain = 1.0 - params.velocity_decay;
        for (index, node) in nodes.iter_mut().enumerate() {
            if let Some(pin) = node.pin {
                node.position = pin;
                node.velocity = Vec2::ZERO;
                continue;
            }
            let anchor = anchors.get(index).copied().unwrap_or(node.position);
            let pull = (anchor - node.position) * params.anchor_strength * alpha;
            node.velocity = (node.velocity + scratch.deltas[index] + pull) * retain;
            node.position += node.velocity;
        }

        load_positions(nodes, scratch);
        scratch.pairs.clear();
        if let Some(tree) = QuadNode::build(&scratch.positions, &scratch.radii) {
            collect_collision_pairs(
                &tree,
                &tree,
                true,
                params.collision_padding,
                &mut scratch.pairs,
            );
        }
        resolve_collisions(
            &mut scratch.positions,
            &scratch.radii,
            &scratch.pinned,
            &scratch.pairs,
            params.collision_padding,
            COLLISION_ITERATIONS,
        );

        for (index, node) in nodes.iter_mut().enumerate() {
            if node.pin.is_some() {
                continue;
            }
            node.position = scratch.positions[index];
            contain(
                &mut node.position,
                &mut node.velocity,
                scratch.radii[index],
                *viewport,
                params.bounce_restitution,
            );
        }

        for observer in &mut self.observers {
            observer(&self.nodes);
        }

        let warm = self.alpha >= ALPHA_MIN || self.alpha_target >= ALPHA_MIN;
        if !warm && !self.settled {
            self.settled = true;
            tracing::debug!(ticks = self.ticks, "force simulation settled");
        }
        warm
    }
}

fn load_positions(nodes: &[CafeNode], scratch: &mut Scratch) {
    scratch.positions.clear();
    scratch.pinned.clear();
    for node in nodes {
        scratch.positions.push(node.position);
        scratch.pinned.push(node.pin.is_some());
    }
}

impl CafePositions for ForceSimulation {
    fn cafe_position(&self, id: &str) -> Option<(Vec2, f32)> {
        let &index = self.index_by_id.get(id)?;
        Some((self.nodes[index].position, self.effective_radius(index)))
    }
}
