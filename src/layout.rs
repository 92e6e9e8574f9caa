use std::collections::{BTreeMap, HashMap};
use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};

use crate::cafe::{CafeNode, GeoPoint};
use crate::config::GeoBounds;

const ELLIPSE_X_RATIO: f32 = 0.40;
const ELLIPSE_Y_RATIO: f32 = 0.25;
const GEO_INSET_RATIO: f32 = 0.10;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum LayoutMode {
    #[default]
    Cluster,
    Geographic,
}

impl LayoutMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Cluster => "By faculty",
            Self::Geographic => "On the map",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    pub fn center(self) -> Vec2 {
        vec2(self.width * 0.5, self.height * 0.5)
    }

    pub fn is_empty(self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

pub fn ellipse_point(viewport: Viewport, index: usize, count: usize) -> Vec2 {
    let angle = (index as f32 / count.max(1) as f32) * TAU;
    viewport.center()
        + vec2(
            angle.cos() * viewport.width * ELLIPSE_X_RATIO,
            angle.sin() * viewport.height * ELLIPSE_Y_RATIO,
        )
}

pub fn faculty_anchors<'a>(
    faculties: impl IntoIterator<Item = &'a str>,
    viewport: Viewport,
) -> BTreeMap<String, Vec2> {
    let mut anchors = faculties
        .into_iter()
        .map(|faculty| (faculty.to_string(), Vec2::ZERO))
        .collect::<BTreeMap<_, _>>();

    let count = anchors.len();
    for (index, anchor) in anchors.values_mut().enumerate() {
        *anchor = if count == 1 {
            viewport.center()
        } else {
            ellipse_point(viewport, index, count)
        };
    }
    anchors
}

/// Linear (non-Mercator) mapping of the bounding box onto the central 80%x80% of the viewport.
pub fn project(point: GeoPoint, bounds: &GeoBounds, viewport: Viewport) -> Vec2 {
    let lng_span = bounds.lng_max - bounds.lng_min;
    let lat_span = bounds.lat_max - bounds.lat_min;
    let tx = if lng_span.abs() > f64::EPSILON {
        ((point.lng - bounds.lng_min) / lng_span) as f32
    } else {
        0.5
    };
    let ty = if lat_span.abs() > f64::EPSILON {
        ((bounds.lat_max - point.lat) / lat_span) as f32
    } else {
        0.5
    };

    let inset = vec2(viewport.width, viewport.height) * GEO_INSET_RATIO;
    let usable = vec2(viewport.width, viewport.height) * (1.0 - 2.0 * GEO_INSET_RATIO);
    inset + vec2(tx * usable.x, ty * usable.y)
}

pub fn resolve_anchors(
    nodes: &[CafeNode],
    mode: LayoutMode,
    viewport: Viewport,
    bounds: &GeoBounds,
    previous: &HashMap<String, Vec2>,
) -> Vec<Vec2> {
    match mode {
        LayoutMode::Cluster => {
            let anchors =
                faculty_anchors(nodes.iter().map(|node| node.faculty.as_str()), viewport);
            nodes
                .iter()
                .map(|node| {
                    anchors
                        .get(&node.faculty)
                        .copied()
                        .unwrap_or_else(|| viewport.center())
                        + node.anchor_jitter
                })
                .collect()
        }
        LayoutMode::Geographic => nodes
            .iter()
            .map(|node| match node.geo {
                Some(point) => project(point, bounds, viewport),
                None => previous
                    .get(&node.id)
                    .copied()
                    .unwrap_or_else(|| viewport.center()),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use crate::cafe::RawCafe;

    use super::*;

    fn node(id: &str, faculty: &str, geo: Option<GeoPoint>) -> CafeNode {
        let raw = RawCafe {
            id: Some(id.to_string()),
            name: Some(id.to_string()),
            ..RawCafe::default()
        };
        let mut rng = StdRng::seed_from_u64(11);
        let mut node = CafeNode::from_record(&raw, Vec2::ZERO, 0.0, &mut rng).unwrap();
        node.faculty = faculty.to_string();
        node.geo = geo;
        node
    }

    fn geo(lat: f64, lng: f64) -> GeoPoint {
        GeoPoint { lat, lng }
    }

    #[test]
    fn ellipse_is_wider_than_tall() {
        let viewport = Viewport::new(1000.0, 800.0);
        assert_eq!(ellipse_point(viewport, 0, 4), vec2(900.0, 400.0));
        let quarter = ellipse_point(viewport, 1, 4);
        assert!((quarter.x - 500.0).abs() < 1e-3);
        assert!((quarter.y - 600.0).abs() < 1e-3);
    }

    #[test]
    fn zero_viewport_collapses_without_nan() {
        let viewport = Viewport::new(0.0, -20.0);
        assert!(viewport.is_empty());
        let point = ellipse_point(viewport, 3, 0);
        assert_eq!(point, Vec2::ZERO);
        let projected = project(
            GeoPoint {
                lat: 45.5,
                lng: -73.6,
            },
            &GeoBounds::default(),
            viewport,
        );
        assert!(projected.x.is_finite() && projected.y.is_finite());
    }

    #[test]
    fn one_anchor_per_faculty() {
        let viewport = Viewport::new(1200.0, 800.0);
        let nodes = [
            node("a", "Faculty A", None),
            node("b", "Faculty A", None),
            node("c", "Faculty B", None),
        ];

        let anchors = faculty_anchors(nodes.iter().map(|node| node.faculty.as_str()), viewport);
        assert_eq!(anchors.len(), 2);

        let resolved = resolve_anchors(
            &nodes,
            LayoutMode::Cluster,
            viewport,
            &GeoBounds::default(),
            &HashMap::new(),
        );
        assert_eq!(resolved[0], resolved[1]);
        assert_ne!(resolved[0], resolved[2]);
        assert_eq!(resolved[0], anchors["Faculty A"]);
    }

    #[test]
    fn single_faculty_anchors_at_center() {
        let viewport = Viewport::new(600.0, 400.0);
        let anchors = faculty_anchors(["Droit", "Droit"], viewport);
        assert_eq!(anchors["Droit"], viewport.center());
    }

    #[test]
    fn projection_maps_bounding_box_to_inset_rectangle() {
        let viewport = Viewport::new(1000.0, 500.0);
        let bounds = GeoBounds::default();

        let north_west = project(geo(45.7, -73.8), &bounds, viewport);
        let south_east = project(geo(45.3, -73.4), &bounds, viewport);
        let middle = project(geo(45.5, -73.6), &bounds, viewport);

        assert!((north_west - vec2(100.0, 50.0)).length() < 1e-2);
        assert!((south_east - vec2(900.0, 450.0)).length() < 1e-2);
        assert!((middle - vec2(500.0, 250.0)).length() < 1e-2);
    }

    #[test]
    fn geographic_mode_falls_back_for_missing_coordinates() {
        let viewport = Viewport::new(800.0, 600.0);
        let nodes = [
            node("with", "A", Some(geo(45.5, -73.6))),
            node("without", "A", None),
            node("remembered", "A", None),
        ];
        let previous = HashMap::from([("remembered".to_string(), vec2(12.0, 34.0))]);

        let anchors = resolve_anchors(
            &nodes,
            LayoutMode::Geographic,
            viewport,
            &GeoBounds::default(),
            &previous,
        );

        assert!((anchors[0] - viewport.center()).length() < 1e-2);
        assert_eq!(anchors[1], viewport.center());
        assert_eq!(anchors[2], vec2(12.0, 34.0));
    }
}
