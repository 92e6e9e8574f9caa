use std::collections::BTreeSet;

use eframe::egui::{self, RichText, Ui};

use crate::cafe::faculty_color;

use super::super::filter::{FilterState, OpenStatus, rank_by_relevance};
use super::super::render_utils::status_color;
use super::super::selection::SelectionAction;
use super::super::ViewModel;

const RESULT_ROW_HEIGHT: f32 = 22.0;

fn checkbox_group(
    ui: &mut Ui,
    id_salt: &str,
    values: &BTreeSet<String>,
    selected: &mut BTreeSet<String>,
) {
    egui::ScrollArea::vertical()
        .id_salt(id_salt)
        .max_height(140.0)
        .auto_shrink([false, true])
        .show(ui, |ui| {
            for value in values {
                let mut checked = selected.contains(value);
                if ui.checkbox(&mut checked, value.as_str()).changed() {
                    FilterState::toggle(selected, value.clone(), checked);
                }
            }
        });
}

impl ViewModel {
    pub(in crate::app) fn draw_filters(&mut self, ui: &mut Ui) {
        ui.heading("Filters");
        ui.add_space(4.0);

        ui.horizontal(|ui| {
            ui.label("Search");
            ui.add(
                egui::TextEdit::singleline(&mut self.filters.search)
                    .hint_text("name, faculty or building"),
            );
        });

        ui.add_space(4.0);
        ui.horizontal(|ui| {
            for status in OpenStatus::ALL {
                let mut checked = self.filters.statuses.contains(&status);
                let label = RichText::new(status.label())
                    .color(status_color(status == OpenStatus::Open));
                if ui.checkbox(&mut checked, label).changed() {
                    FilterState::toggle(&mut self.filters.statuses, status, checked);
                }
            }
        });

        ui.add(egui::Slider::new(&mut self.filters.min_health, 0..=100).text("min health"));
        ui.add(egui::Slider::new(&mut self.filters.activity_min, 0..=100).text("activity from"));
        ui.add(egui::Slider::new(&mut self.filters.activity_max, 0..=100).text("activity to"));
        if self.filters.activity_min > self.filters.activity_max {
            self.filters.activity_max = self.filters.activity_min;
        }

        ui.separator();
        egui::CollapsingHeader::new("Faculties")
            .default_open(true)
            .show(ui, |ui| {
                egui::ScrollArea::vertical()
                    .id_salt("faculty_filters")
                    .max_height(160.0)
                    .auto_shrink([false, true])
                    .show(ui, |ui| {
                        for faculty in &self.vocabulary.faculties {
                            let mut checked = self.filters.faculties.contains(faculty);
                            let label =
                                RichText::new(faculty.as_str()).color(faculty_color(faculty));
                            if ui.checkbox(&mut checked, label).changed() {
                                FilterState::toggle(
                                    &mut self.filters.faculties,
                                    faculty.clone(),
                                    checked,
                                );
                            }
                        }
                    });
            });

        egui::CollapsingHeader::new("Features").show(ui, |ui| {
            checkbox_group(
                ui,
                "feature_filters",
                &self.vocabulary.features,
                &mut self.filters.features,
            );
        });

        egui::CollapsingHeader::new("Payment methods").show(ui, |ui| {
            checkbox_group(
                ui,
                "payment_filters",
                &self.vocabulary.payment_methods,
                &mut self.filters.payment_methods,
            );
        });

        let clear = ui.add_enabled(
            !self.filters.is_unrestricted(),
            egui::Button::new("Clear filters"),
        );
        if clear.clicked() {
            self.filters = FilterState::default();
        }

        ui.separator();
        self.draw_results(ui);
    }

    fn draw_results(&mut self, ui: &mut Ui) {
        let matching = self
            .all_nodes
            .iter()
            .filter(|node| self.filters.matches(node))
            .cloned()
            .collect::<Vec<_>>();
        let ranked = rank_by_relevance(&matching, &self.filters.search);

        ui.label(RichText::new(format!("Matching cafés ({})", ranked.len())).strong());
        if ranked.is_empty() {
            ui.label("Nothing matches. Loosen the filters or clear the search.");
            return;
        }

        let mut clicked = None;
        egui::ScrollArea::vertical()
            .id_salt("matching_cafes")
            .auto_shrink([false, false])
            .show_rows(ui, RESULT_ROW_HEIGHT, ranked.len(), |ui, row_range| {
                for node in &ranked[row_range] {
                    let is_selected = self.selection.selected.as_deref() == Some(node.id.as_str());
                    let text = RichText::new(node.name.as_str()).color(if node.is_open {
                        ui.visuals().text_color()
                    } else {
                        ui.visuals().weak_text_color()
                    });
                    let row = ui
                        .selectable_label(is_selected, text)
                        .on_hover_text(node.faculty.as_str());
                    if row.clicked() && !is_selected {
                        clicked = Some(node.id.clone());
                    }
                }
            });

        if let Some(id) = clicked {
            self.dispatch_selection(SelectionAction::Select(id));
        }
    }
}
