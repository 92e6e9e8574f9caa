use chrono::Utc;
use eframe::egui::{self, RichText, Ui};

use super::super::orbit::format_time_until;
use super::super::render_utils::status_color;
use super::super::selection::SelectionAction;
use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        let Some(selected_id) = self.selection.selected.clone() else {
            return;
        };

        ui.horizontal(|ui| {
            ui.heading("Café details");
            if ui.small_button("Close").clicked() {
                self.dispatch_selection(SelectionAction::Deselect);
            }
        });
        ui.add_space(6.0);

        let (Some(node), Some(record)) = (
            self.all_nodes.iter().find(|node| node.id == selected_id),
            self.dataset.cafe(&selected_id),
        ) else {
            ui.label("The selected café is no longer in the dataset.");
            return;
        };

        egui::ScrollArea::vertical()
            .id_salt("details_scroll")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.label(RichText::new(node.name.as_str()).strong().size(18.0));
                ui.label(RichText::new(node.faculty.as_str()).color(node.color));

                let status = if node.is_open { "Open" } else { "Closed" };
                ui.horizontal(|ui| {
                    ui.label(RichText::new(status).color(status_color(node.is_open)));
                    if let Some(message) = &node.status_message {
                        ui.label(format!("· {message}"));
                    }
                });
                ui.label(format!("Health score: {}", node.health_score));
                ui.label(format!("Activity: {}%", node.activity_level));

                if let Some(description) = record.description.as_deref() {
                    ui.add_space(4.0);
                    ui.label(description);
                }

                if !node.features.is_empty() {
                    ui.separator();
                    ui.label(RichText::new("Features").strong());
                    ui.horizontal_wrapped(|ui| {
                        for feature in &node.features {
                            ui.label(RichText::new(feature.as_str()).background_color(
                                ui.visuals().faint_bg_color,
                            ));
                        }
                    });
                }

                if !node.payment_methods.is_empty() {
                    ui.separator();
                    ui.label(RichText::new("Payment").strong());
                    for payment in &node.payment_methods {
                        match payment.minimum {
                            Some(minimum) => {
                                ui.label(format!("{} (minimum {minimum:.2} $)", payment.method))
                            }
                            None => ui.label(payment.method.as_str()),
                        };
                    }
                }

                if let Some(location) = &record.location {
                    ui.separator();
                    ui.label(RichText::new("Location").strong());
                    let parts = [
                        location.pavillon.as_deref(),
                        location.local.as_deref().map(|local| local.trim()),
                        location.floor.as_deref(),
                    ];
                    let line = parts
                        .into_iter()
                        .flatten()
                        .filter(|part| !part.is_empty())
                        .collect::<Vec<_>>()
                        .join(", ");
                    if !line.is_empty() {
                        ui.label(line);
                    }
                    if let Some(geo) = node.geo {
                        ui.small(format!("{:.5}, {:.5}", geo.lat, geo.lng));
                    }
                }

                if let Some(hours) = record.opening_hours.as_ref().filter(|hours| !hours.is_empty())
                {
                    ui.separator();
                    ui.label(RichText::new("Opening hours").strong());
                    egui::Grid::new("opening_hours").num_columns(2).show(ui, |ui| {
                        for day in hours {
                            ui.label(day.day.as_str());
                            let blocks = day
                                .blocks
                                .iter()
                                .map(|block| format!("{}–{}", block.start, block.end))
                                .collect::<Vec<_>>();
                            if blocks.is_empty() {
                                ui.label(RichText::new("closed").weak());
                            } else {
                                ui.label(blocks.join(", "));
                            }
                            ui.end_row();
                        }
                    });
                }

                if let Some(contact) = &record.contact {
                    ui.separator();
                    ui.label(RichText::new("Contact").strong());
                    if let Some(email) = &contact.email {
                        ui.label(email.as_str());
                    }
                    if let Some(phone) = &contact.phone_number {
                        ui.label(phone.as_str());
                    }
                    if let Some(website) = &contact.website {
                        ui.hyperlink(website.as_str());
                    }
                }

                if let Some(links) = record
                    .social_media
                    .as_ref()
                    .filter(|links| !links.is_empty())
                {
                    ui.horizontal_wrapped(|ui| {
                        for link in links {
                            ui.hyperlink_to(link.platform_name.as_str(), link.link.as_str());
                        }
                    });
                }

                ui.separator();
                ui.label(RichText::new("Upcoming events").strong());
                let now = Utc::now();
                let mut events = self
                    .orbit
                    .events()
                    .iter()
                    .filter(|event| event.cafe_id == selected_id)
                    .collect::<Vec<_>>();
                events.sort_by_key(|event| event.start);
                if events.is_empty() {
                    ui.label(RichText::new("No events scheduled.").weak());
                }
                for event in events {
                    ui.horizontal(|ui| {
                        ui.label(RichText::new("●").color(event.color));
                        ui.label(event.title.as_str());
                        ui.label(RichText::new(format_time_until(event.start, now)).weak());
                        ui.label(RichText::new(format!("{} going", event.attendance)).weak());
                    });
                }
            });
    }
}
