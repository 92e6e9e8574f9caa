use std::f32::consts::TAU;

use chrono::{DateTime, Duration, Utc};
use eframe::egui::{Vec2, vec2};

use crate::cafe::EventNode;

const ORBIT_MIN_GAP: f32 = 25.0;
const ORBIT_MAX_GAP: f32 = 60.0;
const ORBIT_WINDOW_HOURS: f32 = 168.0;
const LABEL_REFRESH_SECONDS: i64 = 30;

/// Read-only view of where cafés currently are.
///
/// The force simulation is the only writer of café positions; the orbit
/// animator sees them through this trait and never gets a mutable café.
pub(crate) trait CafePositions {
    /// Current center and effective radius, or `None` when the café is not
    /// in the active set.
    fn cafe_position(&self, id: &str) -> Option<(Vec2, f32)>;
}

/// Distance from the parent's center: close orbit for imminent events,
/// widest orbit a week or more out.
pub(crate) fn orbit_radius(parent_radius: f32, start: DateTime<Utc>, now: DateTime<Utc>) -> f32 {
    let hours = (start - now).num_seconds() as f32 / 3600.0;
    let fraction = (hours / ORBIT_WINDOW_HOURS).clamp(0.0, 1.0);
    parent_radius + ORBIT_MIN_GAP + fraction * (ORBIT_MAX_GAP - ORBIT_MIN_GAP)
}

pub(crate) fn format_time_until(start: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let until = start - now;
    if until <= Duration::zero() {
        return "Started".to_string();
    }

    let minutes = until.num_minutes();
    if minutes < 60 {
        format!("in {minutes}m")
    } else if until.num_hours() < 24 {
        format!("in {}h", until.num_hours())
    } else if until.num_days() < 7 {
        format!("in {}d", until.num_days())
    } else {
        format!("in {}w", until.num_weeks())
    }
}

/// Places event markers around their cafés once per rendered frame.
pub(crate) struct OrbitAnimator {
    events: Vec<EventNode>,
    step: f32,
    running: bool,
    labels_at: Option<DateTime<Utc>>,
}

impl OrbitAnimator {
    pub(crate) fn new(events: Vec<EventNode>, step: f32) -> Self {
        Self {
            events,
            step,
            running: false,
            labels_at: None,
        }
    }

    pub(crate) fn start(&mut self) {
        if !self.running {
            tracing::debug!(events = self.events.len(), "orbit animator started");
        }
        self.running = true;
    }

    pub(crate) fn stop(&mut self) {
        if self.running {
            tracing::debug!("orbit animator stopped");
        }
        self.running = false;
        for event in &mut self.events {
            event.position = None;
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running
    }

    pub(crate) fn events(&self) -> &[EventNode] {
        &self.events
    }

    /// Markers drawn this frame.
    pub(crate) fn visible(&self) -> impl Iterator<Item = (&EventNode, Vec2)> {
        self.events
            .iter()
            .filter_map(|event| event.position.map(|position| (event, position)))
    }

    /// Advances every orbit by one step and recomputes positions from the
    /// cafés' live positions. Events whose café is hidden keep turning but
    /// have no position.
    pub(crate) fn frame(&mut self, cafes: &impl CafePositions, now: DateTime<Utc>) -> bool {
        if !self.running {
            return false;
        }

        let refresh_labels = self
            .labels_at
            .is_none_or(|at| (now - at).num_seconds() >= LABEL_REFRESH_SECONDS);
        if refresh_labels {
            self.labels_at = Some(now);
        }

        for event in &mut self.events {
            event.angle = (event.angle + self.step) % TAU;
            if refresh_labels {
                event.label = format_time_until(event.start, now);
            }

            event.position = cafes.cafe_position(&event.cafe_id).map(|(center, radius)| {
                let distance = orbit_radius(radius, event.start, now);
                center + vec2(event.angle.cos(), event.angle.sin()) * distance
            });
        }
        true
    }
}
