use eframe::egui::{self, Rect, Ui, Vec2, vec2};

use super::super::orbit::CafePositions;
use super::super::render_utils::screen_to_world;
use super::super::selection::SelectionAction;
use super::super::ViewModel;

impl ViewModel {
    fn cafe_under(&self, world: Vec2) -> Option<String> {
        self.simulation
            .as_ref()
            .and_then(|simulation| simulation.hit_test(world))
            .map(|node| node.id.clone())
    }

    /// Keeps a dragged café fully inside the graph area.
    fn clamp_drag(&self, id: &str, world: Vec2) -> Vec2 {
        let radius = self
            .simulation
            .as_ref()
            .and_then(|simulation| simulation.cafe_position(id))
            .map_or(0.0, |(_, radius)| radius);
        let max = vec2(self.viewport.width, self.viewport.height) - vec2(radius, radius);
        let min = vec2(radius, radius);
        if max.x < min.x || max.y < min.y {
            return self.viewport.center();
        }
        world.clamp(min, max)
    }

    pub(in crate::app) fn handle_graph_pointer(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if response.drag_started_by(egui::PointerButton::Primary)
            && let Some(origin) = ui.input(|input| input.pointer.press_origin())
            && let Some(id) = self.cafe_under(screen_to_world(rect, origin))
        {
            self.dragging = Some(id);
        }

        if let Some(id) = self.dragging.clone() {
            if response.drag_stopped() || !response.dragged() && !response.drag_started() {
                if let Some(simulation) = &mut self.simulation {
                    simulation.release(&id);
                }
                self.dragging = None;
            } else if let Some(pointer) = response.interact_pointer_pos() {
                let world = self.clamp_drag(&id, screen_to_world(rect, pointer));
                if let Some(simulation) = &mut self.simulation {
                    simulation.pin(&id, world);
                }
            }
            ui.ctx().set_cursor_icon(egui::CursorIcon::Grabbing);
            return;
        }

        let hovered = response
            .hover_pos()
            .and_then(|pointer| self.cafe_under(screen_to_world(rect, pointer)));
        if hovered.is_some() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
        }

        if response.clicked_by(egui::PointerButton::Primary) {
            let action = match response
                .interact_pointer_pos()
                .and_then(|pointer| self.cafe_under(screen_to_world(rect, pointer)))
            {
                Some(id) => SelectionAction::Select(id),
                None => SelectionAction::Deselect,
            };
            self.dispatch_selection(action);
        } else {
            self.dispatch_selection(SelectionAction::Hover(hovered));
        }
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::Context;

    use crate::cafe::CafeDataset;
    use crate::config::VisualConfig;
    use crate::layout::{LayoutMode, Viewport};

    use super::*;

    const CAFES: &str = r#"[
        {"id": "a", "name": "Café A", "affiliation": {"faculty": "Droit"}},
        {"id": "b", "name": "Café B", "affiliation": {"faculty": "Génie"}}
    ]"#;

    #[test]
    fn selected_cafe_drag_stays_clear_of_the_edges() {
        let dataset = CafeDataset::from_json(CAFES, None).unwrap();
        let mut model = ViewModel::new(dataset, VisualConfig::default(), LayoutMode::Cluster, None);
        let ctx = Context::default();
        model.ensure_simulation(&ctx, Viewport::new(1200.0, 800.0));
        model.dispatch_selection(SelectionAction::Select("a".to_string()));

        let simulation = model.simulation.as_ref().unwrap();
        let base = simulation.node("a").unwrap().radius;
        let (_, effective) = simulation.cafe_position("a").unwrap();
        assert!(effective > base);

        let corner = model.clamp_drag("a", Vec2::ZERO);
        assert_eq!(corner, vec2(effective, effective));
        let far = model.clamp_drag("a", vec2(5000.0, 5000.0));
        assert_eq!(far, vec2(1200.0 - effective, 800.0 - effective));
    }
}
