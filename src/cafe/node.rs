use std::collections::HashMap;
use std::f32::consts::TAU;

use chrono::{DateTime, Utc};
use eframe::egui::{Color32, Vec2, vec2};
use rand::Rng;

use crate::layout::{Viewport, ellipse_point};
use crate::util::stable_pair;

use super::error::RecordError;
use super::palette::{UNAFFILIATED, faculty_color};
use super::parse::{EventRecord, RawCafe};

const BASE_RADIUS: f32 = 50.0;
const RADIUS_PER_FEATURE: f32 = 3.0;
const MAX_FEATURE_RADIUS: f32 = 18.0;
const HEALTH_RADIUS: f32 = 15.0;

pub const DEFAULT_EVENT_COLOR: Color32 = Color32::from_rgb(255, 183, 77);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PaymentMethod {
    pub method: String,
    pub minimum: Option<f64>,
}

#[derive(Clone, Debug)]
pub struct CafeNode {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub faculty: String,
    pub features: Vec<String>,
    pub payment_methods: Vec<PaymentMethod>,
    pub is_open: bool,
    pub status_message: Option<String>,
    pub health_score: u8,
    pub building: Option<String>,
    pub geo: Option<GeoPoint>,
    pub logo: Option<String>,
    pub position: Vec2,
    pub velocity: Vec2,
    /// Drag position; while set the simulation holds the node here.
    pub pin: Option<Vec2>,
    pub radius: f32,
    pub color: Color32,
    pub activity_level: u8,
    pub anchor_jitter: Vec2,
}

pub fn cafe_radius(feature_count: usize, health_score: u8) -> f32 {
    let features = (feature_count as f32 * RADIUS_PER_FEATURE).min(MAX_FEATURE_RADIUS);
    let health = f32::from(health_score.min(100)) / 100.0 * HEALTH_RADIUS;
    (BASE_RADIUS + features + health).round()
}

pub fn activity_level(baseline: f32, feature_count: usize, health_score: u8) -> u8 {
    let health = f32::from(health_score.min(100)) / 100.0 * 20.0;
    let features = feature_count as f32 * 2.0;
    (baseline + health + features).clamp(0.0, 100.0).round() as u8
}

impl CafeNode {
    pub fn from_record(
        record: &RawCafe,
        position: Vec2,
        jitter: f32,
        rng: &mut impl Rng,
    ) -> Result<Self, RecordError> {
        let id = record
            .id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .ok_or(RecordError::MissingId {
                kind: "café",
                index: 0,
            })?;
        let name = record
            .name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| RecordError::MissingName { id: id.clone() })?;

        let mut features = Vec::new();
        for feature in record.features.iter().flatten() {
            let feature = feature.trim();
            if !feature.is_empty() && !features.iter().any(|known| known == feature) {
                features.push(feature.to_string());
            }
        }

        let faculty = record
            .affiliation
            .as_ref()
            .and_then(|affiliation| affiliation.faculty.as_deref())
            .map(str::trim)
            .filter(|faculty| !faculty.is_empty())
            .unwrap_or(UNAFFILIATED)
            .to_string();

        let payment_methods = record
            .payment_details
            .iter()
            .flatten()
            .filter(|detail| !detail.method.trim().is_empty())
            .map(|detail| PaymentMethod {
                method: detail.method.trim().to_string(),
                minimum: detail.minimum.filter(|minimum| *minimum > 0.0),
            })
            .collect::<Vec<_>>();

        let health_score = record.health_score.unwrap_or(0).clamp(0, 100) as u8;
        let geo = record
            .location
            .as_ref()
            .and_then(|location| location.geometry.as_ref())
            .and_then(|geometry| geometry.lat_lng())
            .map(|(lat, lng)| GeoPoint { lat, lng });
        let building = record
            .location
            .as_ref()
            .and_then(|location| location.pavillon.clone())
            .filter(|building| !building.trim().is_empty());

        let (jx, jy) = stable_pair(&id);
        let baseline = rng.gen_range(20.0..70.0);

        Ok(Self {
            slug: record
                .slug
                .clone()
                .filter(|slug| !slug.trim().is_empty())
                .unwrap_or_else(|| id.clone()),
            radius: cafe_radius(features.len(), health_score),
            color: faculty_color(&faculty),
            activity_level: activity_level(baseline, features.len(), health_score),
            anchor_jitter: vec2(jx, jy) * jitter,
            id,
            name,
            faculty,
            features,
            payment_methods,
            is_open: record.is_open,
            status_message: record
                .status_message
                .clone()
                .filter(|message| !message.trim().is_empty()),
            health_score,
            building,
            geo,
            logo: record.logo.clone().filter(|logo| !logo.trim().is_empty()),
            position,
            velocity: Vec2::ZERO,
            pin: None,
        })
    }

    pub fn has_payment_method(&self, method: &str) -> bool {
        self.payment_methods
            .iter()
            .any(|payment| payment.method == method)
    }
}

/// Builds one node per record, scattered around the viewport ellipse.
pub fn build_nodes(
    records: &[RawCafe],
    viewport: Viewport,
    jitter: f32,
    rng: &mut impl Rng,
) -> Vec<CafeNode> {
    let count = records.len();
    records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| {
            let position = ellipse_point(viewport, index, count);
            match CafeNode::from_record(record, position, jitter, rng) {
                Ok(node) => Some(node),
                Err(error) => {
                    tracing::warn!("skipping café record: {error}");
                    None
                }
            }
        })
        .collect()
}

#[derive(Clone, Debug)]
pub struct EventNode {
    pub cafe_id: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub attendance: u32,
    pub color: Color32,
    pub angle: f32,
    /// Orbit position for this frame; `None` while the parent café is hidden.
    pub position: Option<Vec2>,
    pub label: String,
}

impl EventNode {
    pub fn from_record(record: &EventRecord, angle: f32) -> Self {
        let color = record
            .color
            .as_deref()
            .and_then(|hex| Color32::from_hex(hex).ok())
            .unwrap_or(DEFAULT_EVENT_COLOR);

        Self {
            cafe_id: record.cafe_id.clone(),
            title: record.title.clone(),
            start: record.start,
            attendance: record.attendance,
            color,
            angle,
            position: None,
            label: String::new(),
        }
    }
}

/// Events sharing a café start evenly spaced around its orbit.
pub fn build_events(records: &[EventRecord]) -> Vec<EventNode> {
    let mut per_cafe: HashMap<&str, usize> = HashMap::new();
    for record in records {
        *per_cafe.entry(record.cafe_id.as_str()).or_default() += 1;
    }

    let mut seen: HashMap<&str, usize> = HashMap::new();
    records
        .iter()
        .map(|record| {
            let total = per_cafe
                .get(record.cafe_id.as_str())
                .copied()
                .unwrap_or(1)
                .max(1);
            let slot = seen.entry(record.cafe_id.as_str()).or_default();
            let angle = (*slot as f32 / total as f32) * TAU;
            *slot += 1;
            EventNode::from_record(record, angle)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::super::palette::DEFAULT_COLOR;
    use super::super::parse::{RawAffiliation, RawGeometry, RawLocation, RawPaymentDetail};
    use super::*;

    fn record(id: &str, faculty: Option<&str>, features: &[&str], health: i64) -> RawCafe {
        RawCafe {
            id: Some(id.to_string()),
            name: Some(format!("Café {id}")),
            features: Some(features.iter().map(|feature| feature.to_string()).collect()),
            affiliation: faculty.map(|faculty| RawAffiliation {
                faculty: Some(faculty.to_string()),
            }),
            health_score: Some(health),
            ..RawCafe::default()
        }
    }

    #[test]
    fn radius_grows_with_features_until_capped() {
        let radii = (0..=8).map(|count| cafe_radius(count, 60)).collect::<Vec<_>>();
        for window in radii[..=6].windows(2) {
            assert!(window[1] > window[0], "{radii:?}");
        }
        assert_eq!(radii[6], radii[8]);
        assert_eq!(cafe_radius(0, 0), 50.0);
        assert_eq!(cafe_radius(6, 100), 83.0);
    }

    #[test]
    fn radius_rounds_health_contribution() {
        assert_eq!(cafe_radius(2, 50), 64.0);
        assert_eq!(cafe_radius(1, 33), 58.0);
    }

    #[test]
    fn activity_is_capped_at_one_hundred() {
        assert_eq!(activity_level(69.9, 30, 100), 100);
        assert_eq!(activity_level(20.0, 0, 0), 20);
        assert_eq!(activity_level(40.0, 2, 50), 54);
    }

    #[test]
    fn node_enrichment_fills_derived_fields() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut raw = record("c1", Some("Droit"), &["wifi", "outlets", "wifi", " "], 80);
        raw.payment_details = Some(vec![
            RawPaymentDetail {
                method: "Carte".into(),
                minimum: Some(5.0),
            },
            RawPaymentDetail {
                method: "Comptant".into(),
                minimum: Some(0.0),
            },
        ]);
        raw.location = Some(RawLocation {
            pavillon: Some("Jean-Brillant".into()),
            geometry: Some(RawGeometry {
                kind: "Point".into(),
                coordinates: vec![-73.6, 45.5],
            }),
            ..RawLocation::default()
        });

        let node = CafeNode::from_record(&raw, vec2(10.0, 20.0), 12.0, &mut rng).unwrap();

        assert_eq!(node.features, vec!["wifi".to_string(), "outlets".to_string()]);
        assert_eq!(node.radius, cafe_radius(2, 80));
        assert_eq!(node.color, faculty_color("Droit"));
        assert_eq!(node.slug, "c1");
        let geo = GeoPoint {
            lat: 45.5,
            lng: -73.6,
        };
        assert_eq!(node.geo, Some(geo));
        assert_eq!(node.payment_methods[1].minimum, None);
        assert!(node.has_payment_method("Carte"));
        assert!((20..=100).contains(&node.activity_level));
        assert!(node.anchor_jitter.x.abs() <= 12.0 && node.anchor_jitter.y.abs() <= 12.0);
    }

    #[test]
    fn missing_faculty_and_features_degrade_to_defaults() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut raw = record("c2", None, &[], 200);
        raw.features = None;

        let node = CafeNode::from_record(&raw, Vec2::ZERO, 0.0, &mut rng).unwrap();

        assert_eq!(node.faculty, UNAFFILIATED);
        assert_eq!(node.color, DEFAULT_COLOR);
        assert!(node.features.is_empty());
        assert_eq!(node.health_score, 100);
        assert_eq!(node.geo, None);
    }

    #[test]
    fn build_nodes_skips_invalid_records_and_scatters_the_rest() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut invalid = record("c3", Some("Droit"), &[], 10);
        invalid.name = None;
        let records = vec![
            record("a", Some("Droit"), &[], 10),
            invalid,
            record("b", Some("Droit"), &[], 10),
            record("c", Some("Musique"), &[], 10),
        ];

        let viewport = Viewport::new(1000.0, 600.0);
        let nodes = build_nodes(&records, viewport, 10.0, &mut rng);

        assert_eq!(nodes.len(), 3);
        for (index, node) in nodes.iter().enumerate() {
            for other in &nodes[index + 1..] {
                assert!((node.position - other.position).length() > 1.0);
            }
            let offset = node.position - viewport.center();
            let normalized = (offset.x / 400.0).powi(2) + (offset.y / 150.0).powi(2);
            assert!((normalized - 1.0).abs() < 1e-3);
        }
    }

    #[test]
    fn events_for_the_same_cafe_are_spread_around_the_orbit() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let make = |id: &str, cafe: &str, color: Option<&str>| EventRecord {
            id: id.into(),
            cafe_id: cafe.into(),
            title: id.into(),
            start,
            attendance: 10,
            color: color.map(str::to_string),
        };
        let events = build_events(&[
            make("e1", "a", Some("#ff0000")),
            make("e2", "b", Some("nonsense")),
            make("e3", "a", None),
        ]);

        assert_eq!(events[0].angle, 0.0);
        assert!((events[2].angle - std::f32::consts::PI).abs() < 1e-5);
        assert_eq!(events[1].angle, 0.0);
        assert_eq!(events[0].color, Color32::from_rgb(255, 0, 0));
        assert_eq!(events[1].color, DEFAULT_EVENT_COLOR);
        assert!(events.iter().all(|event| event.position.is_none()));
    }
}
