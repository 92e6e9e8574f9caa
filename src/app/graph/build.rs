use std::collections::HashMap;

use eframe::egui::Context;

use crate::cafe::{CafeDataset, build_events, build_nodes};
use crate::layout::{LayoutMode, Viewport, ellipse_point, resolve_anchors};

use super::super::filter::FilterVocabulary;
use super::super::orbit::OrbitAnimator;
use super::super::physics::{ForceSimulation, SimulationParams};
use super::super::selection::SelectionAction;
use super::super::{ViewMode, ViewModel};

impl ViewModel {
    /// Stops the running simulation, if any, and writes its positions back.
    pub(in crate::app) fn stop_simulation(&mut self) {
        let Some(simulation) = self.simulation.take() else {
            return;
        };
        self.dragging = None;

        let mut prior_nodes = simulation
            .stop()
            .into_iter()
            .map(|node| (node.id.clone(), node))
            .collect::<HashMap<_, _>>();
        for node in &mut self.all_nodes {
            if let Some(prior) = prior_nodes.remove(&node.id) {
                node.position = prior.position;
            }
        }
    }

    fn needs_rebuild(&self, viewport: Viewport) -> bool {
        self.layout_dirty
            || self.simulation.is_none()
            || viewport != self.viewport
            || self.applied_filters.as_ref() != Some(&self.filters)
    }

    /// Replaces the simulation when the active set, layout mode or viewport changed.
    pub(in crate::app) fn ensure_simulation(&mut self, ctx: &Context, viewport: Viewport) {
        if !self.needs_rebuild(viewport) {
            return;
        }
        self.stop_simulation();
        self.viewport = viewport;

        if viewport.is_empty() {
            return;
        }

        if !self.seeded {
            let count = self.all_nodes.len();
            for (index, node) in self.all_nodes.iter_mut().enumerate() {
                node.position = ellipse_point(viewport, index, count);
            }
            self.seeded = true;
        }

        let active = self.filters.apply(&self.all_nodes);
        let anchors = resolve_anchors(
            &active,
            self.layout_mode,
            viewport,
            &self.config.geo_bounds,
            &self.previous_anchors,
        );
        for (node, anchor) in active.iter().zip(&anchors) {
            self.previous_anchors.insert(node.id.clone(), *anchor);
        }

        tracing::debug!(
            active = active.len(),
            total = self.all_nodes.len(),
            mode = self.layout_mode.label(),
            "rebuilding café layout"
        );

        let params = SimulationParams::new(&self.config, self.layout_mode);
        let mut simulation = ForceSimulation::start(active, anchors, params, viewport);
        simulation.set_selected(self.selection.selected.as_deref());
        let repaint = ctx.clone();
        simulation.on_tick(move |_| repaint.request_repaint());

        self.simulation = Some(simulation);
        self.applied_filters = Some(self.filters.clone());
        self.layout_dirty = false;
    }

    pub(in crate::app) fn set_view_mode(&mut self, mode: ViewMode) {
        if mode == self.view_mode {
            return;
        }
        tracing::debug!(?mode, "switching view mode");
        self.view_mode = mode;

        match mode {
            ViewMode::Departments => {
                self.stop_simulation();
                self.orbit.stop();
                self.selection.dispatch(SelectionAction::Hover(None));
            }
            ViewMode::Cafes => {
                self.layout_dirty = true;
                self.orbit.start();
            }
        }
    }

    pub(in crate::app) fn set_layout_mode(&mut self, mode: LayoutMode) {
        if mode == self.layout_mode {
            return;
        }
        tracing::debug!(mode = mode.label(), "switching layout mode");
        self.layout_mode = mode;
        self.layout_dirty = true;
    }

    pub(in crate::app) fn dispatch_selection(&mut self, action: SelectionAction) {
        if !self.selection.dispatch(action) {
            return;
        }
        tracing::debug!(
            selected = self.selection.selected.as_deref(),
            hovered = self.selection.hovered.as_deref(),
            "selection changed"
        );
        if let Some(simulation) = &mut self.simulation {
            simulation.set_selected(self.selection.selected.as_deref());
        }
    }

    /// Swaps in a freshly loaded dataset while keeping filters, modes and
    /// any selection that still exists.
    pub(in crate::app) fn replace_dataset(&mut self, dataset: CafeDataset) {
        self.stop_simulation();

        let mut prior_nodes = std::mem::take(&mut self.all_nodes)
            .into_iter()
            .map(|node| (node.id.clone(), node))
            .collect::<HashMap<_, _>>();
        let mut all_nodes = build_nodes(
            &dataset.cafes,
            self.viewport,
            self.config.anchor_jitter,
            &mut rand::thread_rng(),
        );
        for node in &mut all_nodes {
            if let Some(prior) = prior_nodes.remove(&node.id) {
                node.position = prior.position;
                node.activity_level = prior.activity_level;
            }
        }

        self.vocabulary = FilterVocabulary::from_nodes(&all_nodes);
        self.vocabulary.retain_known(&mut self.filters);
        self.previous_anchors
            .retain(|id, _| all_nodes.iter().any(|node| &node.id == id));
        self.seeded = self.seeded && !self.viewport.is_empty();
        self.all_nodes = all_nodes;

        let was_running = self.orbit.is_running();
        self.orbit.stop();
        self.orbit = OrbitAnimator::new(build_events(&dataset.events), self.config.orbit_step);
        if was_running {
            self.orbit.start();
        }

        self.dataset = dataset;
        self.reload_error = None;
        self.dispatch_selection(SelectionAction::DatasetReloaded(self.dataset.cafe_ids()));
        self.layout_dirty = true;

        tracing::info!(
            cafes = self.all_nodes.len(),
            events = self.dataset.events.len(),
            "dataset replaced"
        );
    }
}
