use std::collections::HashMap;
use std::path::PathBuf;

use eframe::egui::{self, Align, Context, Layout};

use crate::cafe::{CafeDataset, build_events, build_nodes};
use crate::config::VisualConfig;
use crate::layout::{LayoutMode, Viewport};

use super::super::filter::{FilterState, FilterVocabulary};
use super::super::orbit::OrbitAnimator;
use super::super::selection::SelectionState;
use super::super::{ViewMode, ViewModel};

impl ViewModel {
    pub(in crate::app) fn new(
        dataset: CafeDataset,
        config: VisualConfig,
        layout_mode: LayoutMode,
        logo_base: Option<PathBuf>,
    ) -> Self {
        let all_nodes = build_nodes(
            &dataset.cafes,
            Viewport::default(),
            config.anchor_jitter,
            &mut rand::thread_rng(),
        );
        let vocabulary = FilterVocabulary::from_nodes(&all_nodes);
        let mut orbit = OrbitAnimator::new(build_events(&dataset.events), config.orbit_step);
        orbit.start();

        Self {
            dataset,
            config,
            logo_base,
            all_nodes,
            seeded: false,
            vocabulary,
            filters: FilterState::default(),
            applied_filters: None,
            selection: SelectionState::default(),
            view_mode: ViewMode::Cafes,
            layout_mode,
            viewport: Viewport::default(),
            simulation: None,
            orbit,
            previous_anchors: HashMap::new(),
            layout_dirty: true,
            dragging: None,
            reload_error: None,
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        reload_requested: &mut bool,
        is_reloading: bool,
    ) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("Café orbit");
                    ui.separator();
                    ui.label(format!("cafés: {}", self.all_nodes.len()));
                    ui.label(format!("events: {}", self.dataset.events.len()));
                    if !self.dataset.skipped.is_empty() {
                        ui.label(format!("skipped: {}", self.dataset.skipped.len()))
                            .on_hover_ui(|ui| {
                                for error in &self.dataset.skipped {
                                    ui.label(error.to_string());
                                }
                            });
                    }
                    ui.separator();

                    let mut view_mode = self.view_mode;
                    ui.selectable_value(&mut view_mode, ViewMode::Cafes, "Cafés");
                    ui.selectable_value(&mut view_mode, ViewMode::Departments, "Departments");
                    if view_mode != self.view_mode {
                        self.set_view_mode(view_mode);
                    }
                    ui.separator();

                    let mut layout_mode = self.layout_mode;
                    for mode in [LayoutMode::Cluster, LayoutMode::Geographic] {
                        ui.selectable_value(&mut layout_mode, mode, mode.label());
                    }
                    if layout_mode != self.layout_mode {
                        self.set_layout_mode(layout_mode);
                    }
                    ui.separator();

                    let reload_button =
                        ui.add_enabled(!is_reloading, egui::Button::new("Reload data"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                        self.reload_error = None;
                    }
                    if is_reloading {
                        ui.spinner();
                    }

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if let Some(error) = &self.reload_error {
                            ui.colored_label(ui.visuals().error_fg_color, "reload failed")
                                .on_hover_text(error.as_str());
                        }
                        if let Some(simulation) = &self.simulation {
                            ui.label(format!("showing {}", simulation.nodes().len()));
                        }
                    });
                });
            });

        egui::SidePanel::left("filters")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_filters(ui));

        if self.selection.selected.is_some() {
            egui::SidePanel::right("details")
                .resizable(true)
                .default_width(340.0)
                .show(ctx, |ui| self.draw_details(ui));
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| match self.view_mode {
                ViewMode::Cafes => self.draw_graph(ui),
                ViewMode::Departments => self.draw_departments(ui),
            });
    }
}
