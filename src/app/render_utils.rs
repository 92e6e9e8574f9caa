use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};

pub(super) const OPEN_COLOR: Color32 = Color32::from_rgb(76, 175, 80);
pub(super) const CLOSED_COLOR: Color32 = Color32::from_rgb(229, 57, 53);
const TIER_LOW: Color32 = Color32::from_rgb(102, 187, 106);
const TIER_MEDIUM: Color32 = Color32::from_rgb(255, 167, 38);
const TIER_HIGH: Color32 = Color32::from_rgb(239, 83, 80);

const PULSE_MIN_ACTIVITY: u8 = 30;
const PULSE_START_GAP: f32 = 5.0;
const PULSE_END_GAP: f32 = 20.0;
const PULSE_SLOWEST_MS: f32 = 2500.0;
const PULSE_SPEEDUP_MS: f32 = 1500.0;

const EVENT_MIN_RADIUS: f32 = 8.0;
const EVENT_MAX_RADIUS: f32 = 20.0;

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn with_opacity(color: Color32, opacity: f32) -> Color32 {
    Color32::from_rgba_unmultiplied(
        color.r(),
        color.g(),
        color.b(),
        (color.a() as f32 * opacity.clamp(0.0, 1.0)) as u8,
    )
}

pub(super) fn draw_background(painter: &Painter, rect: Rect) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let step = 56.0;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70));

    let mut x = rect.left() + step;
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + step;
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

pub(super) fn world_to_screen(rect: Rect, world: Vec2) -> Pos2 {
    rect.min + world
}

pub(super) fn screen_to_world(rect: Rect, screen: Pos2) -> Vec2 {
    screen - rect.min
}

pub(super) fn event_radius(attendance: u32) -> f32 {
    (EVENT_MIN_RADIUS + attendance as f32 / 100.0 * 12.0).clamp(EVENT_MIN_RADIUS, EVENT_MAX_RADIUS)
}

pub(super) fn status_color(is_open: bool) -> Color32 {
    if is_open { OPEN_COLOR } else { CLOSED_COLOR }
}

pub(super) fn activity_tier_color(activity: u8) -> Color32 {
    match activity {
        0..50 => TIER_LOW,
        50..=70 => TIER_MEDIUM,
        _ => TIER_HIGH,
    }
}

pub(super) fn pulse_period_ms(activity: u8) -> f32 {
    PULSE_SLOWEST_MS - f32::from(activity.min(100)) / 100.0 * PULSE_SPEEDUP_MS
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct PulseRing {
    pub(super) radius: f32,
    pub(super) opacity: f32,
    pub(super) color: Color32,
}

pub(super) fn pulse_ring(
    radius: f32,
    activity: u8,
    is_open: bool,
    time_seconds: f64,
) -> Option<PulseRing> {
    if !is_open || activity <= PULSE_MIN_ACTIVITY {
        return None;
    }

    let period = f64::from(pulse_period_ms(activity));
    let phase = ((time_seconds * 1000.0).rem_euclid(period) / period) as f32;
    Some(PulseRing {
        radius: radius + PULSE_START_GAP + phase * (PULSE_END_GAP - PULSE_START_GAP),
        opacity: 1.0 - phase,
        color: activity_tier_color(activity),
    })
}

pub(super) fn department_radius(cafe_count: usize) -> f32 {
    (40.0 + (cafe_count as f32).sqrt() * 18.0).min(120.0)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn event_radius_is_clamped() {
        assert_eq!(event_radius(0), 8.0);
        assert_eq!(event_radius(50), 14.0);
        assert_eq!(event_radius(100), 20.0);
        assert_eq!(event_radius(5000), 20.0);
    }

    #[test]
    fn pulse_needs_activity_and_open_status() {
        assert!(pulse_ring(50.0, 30, true, 0.0).is_none());
        assert!(pulse_ring(50.0, 90, false, 0.0).is_none());

        let ring = pulse_ring(50.0, 31, true, 0.0).unwrap();
        assert_eq!(ring.radius, 55.0);
        assert_eq!(ring.opacity, 1.0);
    }

    #[test]
    fn pulse_expands_fades_and_loops() {
        let period = pulse_period_ms(100);
        assert_eq!(period, 1000.0);
        assert_eq!(pulse_period_ms(0), 2500.0);

        let halfway = pulse_ring(50.0, 100, true, 0.5).unwrap();
        assert!((halfway.radius - 62.5).abs() < 1e-4);
        assert!((halfway.opacity - 0.5).abs() < 1e-4);

        let looped = pulse_ring(50.0, 100, true, 1.5).unwrap();
        assert!((looped.radius - halfway.radius).abs() < 1e-3);
    }

    #[test]
    fn tiers_follow_activity() {
        assert_eq!(activity_tier_color(40), TIER_LOW);
        assert_eq!(activity_tier_color(50), TIER_MEDIUM);
        assert_eq!(activity_tier_color(70), TIER_MEDIUM);
        assert_eq!(activity_tier_color(71), TIER_HIGH);
        assert_eq!(status_color(true), OPEN_COLOR);
        assert_eq!(status_color(false), CLOSED_COLOR);
    }

    #[test]
    fn screen_mapping_is_offset_by_the_graph_rect() {
        let rect = Rect::from_min_size(Pos2::new(200.0, 40.0), Vec2::new(800.0, 600.0));
        let screen = world_to_screen(rect, Vec2::new(10.0, 20.0));
        assert_eq!(screen, Pos2::new(210.0, 60.0));
        assert_eq!(screen_to_world(rect, screen), Vec2::new(10.0, 20.0));
    }
}
