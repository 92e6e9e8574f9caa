use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context, Vec2};

use crate::cafe::{CafeDataset, CafeNode, DatasetSource, load_dataset};
use crate::config::VisualConfig;
use crate::layout::{LayoutMode, Viewport};

mod filter;
mod graph;
mod orbit;
mod physics;
mod render_utils;
mod selection;
mod ui;

use filter::{FilterState, FilterVocabulary};
use orbit::OrbitAnimator;
use physics::ForceSimulation;
use selection::SelectionState;

type LoadResult = Result<CafeDataset, String>;

pub struct CafeMapApp {
    source: DatasetSource,
    config: VisualConfig,
    initial_layout: LayoutMode,
    state: AppState,
    reload_rx: Option<Receiver<LoadResult>>,
}

enum AppState {
    Loading { rx: Receiver<LoadResult> },
    Ready(Box<ViewModel>),
    Error(String),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum ViewMode {
    #[default]
    Cafes,
    Departments,
}

struct ViewModel {
    dataset: CafeDataset,
    config: VisualConfig,
    logo_base: Option<PathBuf>,
    all_nodes: Vec<CafeNode>,
    seeded: bool,
    vocabulary: FilterVocabulary,
    filters: FilterState,
    applied_filters: Option<FilterState>,
    selection: SelectionState,
    view_mode: ViewMode,
    layout_mode: LayoutMode,
    viewport: Viewport,
    simulation: Option<ForceSimulation>,
    orbit: OrbitAnimator,
    previous_anchors: HashMap<String, Vec2>,
    layout_dirty: bool,
    dragging: Option<String>,
    reload_error: Option<String>,
}

impl CafeMapApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        source: DatasetSource,
        config: VisualConfig,
        initial_layout: LayoutMode,
    ) -> Self {
        let state = Self::start_load(source.clone());
        Self {
            source,
            config,
            initial_layout,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(source: DatasetSource) -> Receiver<LoadResult> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_dataset(&source).map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(source: DatasetSource) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(source),
        }
    }

    fn ready(&self, dataset: CafeDataset) -> AppState {
        let logo_base = self
            .source
            .cafes_path
            .parent()
            .map(|parent| parent.to_path_buf());
        AppState::Ready(Box::new(ViewModel::new(
            dataset,
            self.config.clone(),
            self.initial_layout,
            logo_base,
        )))
    }
}

impl eframe::App for CafeMapApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;
        let mut retry = false;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(Ok(dataset)) => transition = Some(Ok(dataset)),
                    Ok(Err(error)) => transition = Some(Err(error)),
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                    Err(TryRecvError::Disconnected) => {
                        transition = Some(Err("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading cafés...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the café dataset");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    retry = ui.button("Retry").clicked();
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    tracing::info!("reloading café dataset");
                    self.reload_rx = Some(Self::spawn_load(self.source.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(Ok(dataset)) => {
                            model.replace_dataset(dataset);
                        }
                        Ok(Err(error)) => {
                            tracing::warn!("reload failed: {error}");
                            model.reload_error = Some(error);
                        }
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => {
                            model.reload_error =
                                Some("Background load worker disconnected".to_owned());
                        }
                    }
                }
            }
        }

        if retry {
            self.state = Self::start_load(self.source.clone());
        }

        if let Some(result) = transition {
            self.reload_rx = None;
            self.state = match result {
                Ok(dataset) => self.ready(dataset),
                Err(error) => {
                    tracing::error!("failed to load café dataset: {error}");
                    AppState::Error(error)
                }
            };
        }
    }
}
