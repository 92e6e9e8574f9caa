use std::collections::BTreeMap;

use chrono::Utc;
use eframe::egui::load::TexturePoll;
use eframe::egui::{
    self, Align2, Color32, FontId, Painter, Pos2, Rect, Sense, Stroke, StrokeKind, Ui, Vec2, vec2,
};

use crate::cafe::{CafeNode, faculty_color};
use crate::layout::{Viewport, faculty_anchors};
use crate::util::initials;

use super::super::render_utils::{
    blend_color, department_radius, draw_background, event_radius, pulse_ring, screen_to_world,
    status_color, with_opacity, world_to_screen,
};
use super::super::{ViewMode, ViewModel};

const CLOSED_OPACITY: f32 = 0.45;
const SELECTED_COLOR: Color32 = Color32::from_rgb(245, 206, 93);
const OUTLINE: Color32 = Color32::from_rgba_premultiplied(15, 15, 15, 190);

impl ViewModel {
    fn logo_uri(&self, logo: &str) -> String {
        if logo.contains("://") {
            return logo.to_string();
        }
        match &self.logo_base {
            Some(base) => format!("file://{}", base.join(logo).display()),
            None => format!("file://{logo}"),
        }
    }

    /// Logo clipped to a circle, or the café's initials until (or unless) it loads.
    fn draw_logo(
        &self,
        ui: &Ui,
        painter: &Painter,
        node: &CafeNode,
        center: Pos2,
        radius: f32,
        opacity: f32,
    ) {
        let inset = radius * 0.7;
        let target = Rect::from_center_size(center, Vec2::splat(inset * 2.0));

        if let Some(logo) = &node.logo {
            let image = egui::Image::new(self.logo_uri(logo))
                .corner_radius(inset)
                .tint(with_opacity(Color32::WHITE, opacity));
            if let Ok(TexturePoll::Ready { .. }) = image.load_for_size(ui.ctx(), target.size()) {
                image.paint_at(ui, target);
                return;
            }
        }

        painter.text(
            center,
            Align2::CENTER_CENTER,
            initials(&node.name),
            FontId::proportional((inset * 0.75).max(10.0)),
            with_opacity(Color32::WHITE, opacity),
        );
    }

    /// Returns whether the café is still animating.
    fn draw_cafe(
        &self,
        ui: &Ui,
        painter: &Painter,
        rect: Rect,
        node: &CafeNode,
        time: f64,
    ) -> bool {
        let is_selected = self.selection.selected.as_deref() == Some(node.id.as_str());
        let is_hovered = self.selection.preview() == Some(node.id.as_str());
        let selection_mix = ui.ctx().animate_bool(
            ui.make_persistent_id(("cafe-selection", node.id.as_str())),
            is_selected,
        );
        let radius =
            node.radius * (1.0 + (self.config.selected_radius_scale - 1.0) * selection_mix);
        let center = world_to_screen(rect, node.position);
        let opacity = if node.is_open { 1.0 } else { CLOSED_OPACITY };
        let mut animating = selection_mix > 0.0 && selection_mix < 1.0;

        if let Some(ring) = pulse_ring(radius, node.activity_level, node.is_open, time) {
            painter.circle_stroke(
                center,
                ring.radius,
                Stroke::new(3.0, with_opacity(ring.color, ring.opacity * 0.85)),
            );
            animating = true;
        }

        let fill = if is_hovered {
            blend_color(node.color, Color32::WHITE, 0.18)
        } else {
            node.color
        };
        painter.circle_filled(center, radius, with_opacity(fill, opacity));
        self.draw_logo(ui, painter, node, center, radius, opacity);

        painter.circle_stroke(
            center,
            radius,
            Stroke::new(
                1.0 + selection_mix * 2.0,
                blend_color(OUTLINE, SELECTED_COLOR, selection_mix),
            ),
        );

        let dot_radius = (radius * 0.12).clamp(6.0, 12.0);
        let dot_center = center + vec2(radius, -radius) * std::f32::consts::FRAC_1_SQRT_2;
        painter.circle_filled(dot_center, dot_radius, status_color(node.is_open));
        painter.circle_stroke(dot_center, dot_radius, Stroke::new(1.5, Color32::WHITE));

        let (label_size, label_color) = if is_selected {
            (15.0, Color32::WHITE)
        } else {
            (12.0, Color32::from_gray(215))
        };
        painter.text(
            center + vec2(0.0, radius + 6.0),
            Align2::CENTER_TOP,
            &node.name,
            FontId::proportional(label_size),
            with_opacity(label_color, opacity.max(0.7)),
        );

        animating
    }

    fn draw_events(&self, painter: &Painter, rect: Rect) {
        for (event, position) in self.orbit.visible() {
            let center = world_to_screen(rect, position);
            let radius = event_radius(event.attendance);
            painter.circle_filled(center, radius, event.color);
            painter.circle_stroke(center, radius, Stroke::new(1.0, OUTLINE));
            painter.text(
                center + vec2(radius + 4.0, 0.0),
                Align2::LEFT_CENTER,
                &event.label,
                FontId::proportional(11.0),
                Color32::from_gray(225),
            );
        }
    }

    fn draw_preview(&self, painter: &Painter, rect: Rect) {
        let Some(node) = self
            .selection
            .preview()
            .and_then(|id| self.simulation.as_ref()?.node(id))
        else {
            return;
        };

        let status = if node.is_open { "Open" } else { "Closed" };
        let mut text = format!(
            "{}\n{} · {status}\nactivity {}% · health {}",
            node.name, node.faculty, node.activity_level, node.health_score
        );
        if let Some(message) = &node.status_message {
            text.push('\n');
            text.push_str(message);
        }
        let galley = painter.layout(
            text,
            FontId::proportional(13.0),
            Color32::from_gray(235),
            260.0,
        );

        let anchor = world_to_screen(rect, node.position) + vec2(node.radius + 12.0, -node.radius);
        let mut frame = Rect::from_min_size(anchor, galley.size() + vec2(16.0, 12.0));
        if frame.right() > rect.right() {
            frame = frame.translate(vec2(rect.right() - frame.right(), 0.0));
        }
        if frame.bottom() > rect.bottom() {
            frame = frame.translate(vec2(0.0, rect.bottom() - frame.bottom()));
        }
        if frame.top() < rect.top() {
            frame = frame.translate(vec2(0.0, rect.top() - frame.top()));
        }

        painter.rect_filled(frame, 6.0, Color32::from_rgba_unmultiplied(24, 28, 36, 235));
        painter.rect_stroke(frame, 6.0, Stroke::new(1.0, node.color), StrokeKind::Inside);
        painter.galley(frame.min + vec2(8.0, 6.0), galley, Color32::WHITE);
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        draw_background(&painter, rect);

        self.ensure_simulation(ui.ctx(), Viewport::new(rect.width(), rect.height()));
        self.handle_graph_pointer(ui, rect, &response);

        let (dt, time) = ui.input(|input| (input.stable_dt, input.time));
        if let Some(simulation) = &mut self.simulation {
            simulation.advance(dt);
        }
        if let Some(simulation) = &self.simulation {
            self.orbit.frame(simulation, Utc::now());
        }

        let Some(simulation) = &self.simulation else {
            return;
        };
        if simulation.nodes().is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "No cafés match the current filters.",
                FontId::proportional(16.0),
                Color32::from_gray(180),
            );
            return;
        }

        let mut animating = self.orbit.visible().next().is_some();
        for node in simulation.nodes() {
            animating |= self.draw_cafe(ui, &painter, rect, node, time);
        }
        self.draw_events(&painter, rect);
        self.draw_preview(&painter, rect);

        if animating {
            ui.ctx().request_repaint();
        }
    }

    /// Zoomed-out overview: one bubble per faculty at its cluster anchor.
    pub(in crate::app) fn draw_departments(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click());
        let painter = ui.painter_at(rect);
        draw_background(&painter, rect);

        let mut counts = BTreeMap::<&str, usize>::new();
        for node in self.all_nodes.iter().filter(|node| self.filters.matches(node)) {
            *counts.entry(node.faculty.as_str()).or_default() += 1;
        }
        if counts.is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "No cafés match the current filters.",
                FontId::proportional(16.0),
                Color32::from_gray(180),
            );
            return;
        }

        let viewport = Viewport::new(rect.width(), rect.height());
        let anchors = faculty_anchors(counts.keys().copied(), viewport);
        let pointer = response.hover_pos().map(|pointer| screen_to_world(rect, pointer));
        let mut hovered_faculty = None;

        for (faculty, anchor) in &anchors {
            let count = counts.get(faculty.as_str()).copied().unwrap_or(0);
            let radius = department_radius(count);
            let center = world_to_screen(rect, *anchor);
            let hovered = pointer.is_some_and(|pointer| (pointer - *anchor).length() <= radius);
            if hovered {
                hovered_faculty = Some(faculty.as_str());
            }

            let color = faculty_color(faculty);
            let fill = if hovered { 0.95 } else { 0.78 };
            painter.circle_filled(center, radius, with_opacity(color, fill));
            painter.circle_stroke(
                center,
                radius,
                Stroke::new(
                    if hovered { 3.0 } else { 1.5 },
                    if hovered { Color32::WHITE } else { OUTLINE },
                ),
            );
            painter.text(
                center - vec2(0.0, 8.0),
                Align2::CENTER_CENTER,
                faculty,
                FontId::proportional(14.0),
                Color32::WHITE,
            );
            let noun = if count == 1 { "café" } else { "cafés" };
            painter.text(
                center + vec2(0.0, 12.0),
                Align2::CENTER_CENTER,
                format!("{count} {noun}"),
                FontId::proportional(12.0),
                Color32::from_gray(230),
            );
        }

        if hovered_faculty.is_some() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
            if response.clicked_by(egui::PointerButton::Primary) {
                self.set_view_mode(ViewMode::Cafes);
            }
        }
    }
}
