use std::collections::BTreeSet;

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::cafe::CafeNode;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum OpenStatus {
    Open,
    Closed,
}

impl OpenStatus {
    pub(crate) const ALL: [Self; 2] = [Self::Open, Self::Closed];

    pub(crate) fn of(node: &CafeNode) -> Self {
        if node.is_open { Self::Open } else { Self::Closed }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Closed => "Closed",
        }
    }
}

/// What the user currently wants to see. Empty sets do not restrict.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct FilterState {
    pub(crate) search: String,
    pub(crate) faculties: BTreeSet<String>,
    pub(crate) statuses: BTreeSet<OpenStatus>,
    pub(crate) features: BTreeSet<String>,
    pub(crate) payment_methods: BTreeSet<String>,
    pub(crate) min_health: u8,
    pub(crate) activity_min: u8,
    pub(crate) activity_max: u8,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            search: String::new(),
            faculties: BTreeSet::new(),
            statuses: BTreeSet::new(),
            features: BTreeSet::new(),
            payment_methods: BTreeSet::new(),
            min_health: 0,
            activity_min: 0,
            activity_max: 100,
        }
    }
}

impl FilterState {
    pub(crate) fn is_unrestricted(&self) -> bool {
        *self == Self::default()
    }

    pub(crate) fn matches_search(&self, node: &CafeNode) -> bool {
        let term = self.search.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }

        [
            Some(node.name.as_str()),
            Some(node.faculty.as_str()),
            node.building.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&term))
    }

    pub(crate) fn matches(&self, node: &CafeNode) -> bool {
        self.matches_search(node)
            && (self.faculties.is_empty() || self.faculties.contains(&node.faculty))
            && (self.statuses.is_empty() || self.statuses.contains(&OpenStatus::of(node)))
            && (self.features.is_empty()
                || node
                    .features
                    .iter()
                    .any(|feature| self.features.contains(feature)))
            && (self.payment_methods.is_empty()
                || self
                    .payment_methods
                    .iter()
                    .any(|method| node.has_payment_method(method)))
            && node.health_score >= self.min_health
            && (self.activity_min..=self.activity_max).contains(&node.activity_level)
    }

    /// Nodes passing every filter, in dataset order.
    pub(crate) fn apply(&self, nodes: &[CafeNode]) -> Vec<CafeNode> {
        nodes
            .iter()
            .filter(|node| self.matches(node))
            .cloned()
            .collect()
    }

    pub(crate) fn toggle<T: Ord>(set: &mut BTreeSet<T>, value: T, enabled: bool) {
        if enabled {
            set.insert(value);
        } else {
            set.remove(&value);
        }
    }
}

/// Distinct values present in the dataset, for populating filter checkboxes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct FilterVocabulary {
    pub(crate) faculties: BTreeSet<String>,
    pub(crate) features: BTreeSet<String>,
    pub(crate) payment_methods: BTreeSet<String>,
}

impl FilterVocabulary {
    pub(crate) fn from_nodes(nodes: &[CafeNode]) -> Self {
        let mut vocabulary = Self::default();
        for node in nodes {
            vocabulary.faculties.insert(node.faculty.clone());
            vocabulary.features.extend(node.features.iter().cloned());
            vocabulary.payment_methods.extend(
                node.payment_methods
                    .iter()
                    .map(|payment| payment.method.clone()),
            );
        }
        vocabulary
    }

    /// Drops selections that no longer exist after a reload.
    pub(crate) fn retain_known(&self, filters: &mut FilterState) {
        filters
            .faculties
            .retain(|faculty| self.faculties.contains(faculty));
        filters
            .features
            .retain(|feature| self.features.contains(feature));
        filters
            .payment_methods
            .retain(|method| self.payment_methods.contains(method));
    }
}

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_lowercase(), &query.to_lowercase()))
}

/// Orders nodes for the results list: best fuzzy name match first, then
/// nodes that only matched on faculty or building, each group by name.
pub(crate) fn rank_by_relevance<'a>(nodes: &'a [CafeNode], query: &str) -> Vec<&'a CafeNode> {
    let query = query.trim();
    let matcher = SkimMatcherV2::default();
    let mut ranked = nodes
        .iter()
        .map(|node| {
            let score = if query.is_empty() {
                None
            } else {
                fuzzy_match_score(&matcher, &node.name, query)
            };
            (node, score)
        })
        .collect::<Vec<_>>();

    ranked.sort_by(|(left, left_score), (right, right_score)| {
        right_score
            .cmp(left_score)
            .then_with(|| left.name.to_lowercase().cmp(&right.name.to_lowercase()))
    });
    ranked.into_iter().map(|(node, _)| node).collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use crate::cafe::{PaymentMethod, RawCafe};
    use eframe::egui::Vec2;

    use super::*;

    fn node(id: &str, name: &str, faculty: &str, features: &[&str]) -> CafeNode {
        let raw = RawCafe {
            id: Some(id.to_string()),
            name: Some(name.to_string()),
            ..RawCafe::default()
        };
        let mut rng = StdRng::seed_from_u64(7);
        let mut node = CafeNode::from_record(&raw, Vec2::ZERO, 0.0, &mut rng).unwrap();
        node.faculty = faculty.to_string();
        node.features = features.iter().map(|feature| feature.to_string()).collect();
        node
    }

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn feature_filter_is_any_of() {
        let cafe = node("a", "Café A", "Droit", &["wifi", "outlets"]);

        let mut filters = FilterState {
            features: set(&["wifi", "print"]),
            ..FilterState::default()
        };
        assert!(filters.matches(&cafe));

        filters.features = set(&["print"]);
        assert!(!filters.matches(&cafe));
    }

    #[test]
    fn empty_filters_keep_every_node() {
        let nodes = vec![
            node("a", "Café A", "Droit", &[]),
            node("b", "Café B", "Génie", &["wifi"]),
            node("c", "Café C", "Other", &[]),
        ];
        let filters = FilterState::default();
        assert!(filters.is_unrestricted());

        let active = filters.apply(&nodes);
        assert_eq!(
            active.iter().map(|node| node.id.as_str()).collect::<Vec<_>>(),
            ["a", "b", "c"]
        );
    }

    #[test]
    fn search_is_case_insensitive_over_name_faculty_and_building() {
        let mut cafe = node("a", "Le Pavillon", "Médecine", &[]);
        cafe.building = Some("Roger-Gaudry".to_string());

        for term in ["pavillon", "MÉDECINE", "gaudry", "  le pav  "] {
            let filters = FilterState {
                search: term.to_string(),
                ..FilterState::default()
            };
            assert!(filters.matches(&cafe), "{term}");
        }

        let filters = FilterState {
            search: "droit".to_string(),
            ..FilterState::default()
        };
        assert!(!filters.matches(&cafe));
    }

    #[test]
    fn scalar_bounds_are_inclusive() {
        let mut cafe = node("a", "Café A", "Droit", &[]);
        cafe.health_score = 60;
        cafe.activity_level = 40;

        let mut filters = FilterState {
            min_health: 60,
            activity_min: 40,
            activity_max: 40,
            ..FilterState::default()
        };
        assert!(filters.matches(&cafe));

        filters.min_health = 61;
        assert!(!filters.matches(&cafe));

        filters.min_health = 0;
        filters.activity_max = 39;
        filters.activity_min = 0;
        assert!(!filters.matches(&cafe));
    }

    #[test]
    fn status_faculty_and_payment_dimensions_compose() {
        let mut open = node("a", "Café A", "Droit", &[]);
        open.is_open = true;
        open.payment_methods = vec![PaymentMethod {
            method: "Debit".to_string(),
            minimum: None,
        }];
        let closed = node("b", "Café B", "Droit", &[]);

        let mut filters = FilterState::default();
        FilterState::toggle(&mut filters.statuses, OpenStatus::Open, true);
        assert!(filters.matches(&open));
        assert!(!filters.matches(&closed));

        FilterState::toggle(&mut filters.statuses, OpenStatus::Closed, true);
        filters.payment_methods = set(&["Debit", "Cash"]);
        filters.faculties = set(&["Droit"]);
        assert!(filters.matches(&open));
        assert!(!filters.matches(&closed));

        FilterState::toggle(&mut filters.statuses, OpenStatus::Open, false);
        assert!(!filters.matches(&open));
    }

    #[test]
    fn vocabulary_is_sorted_and_prunes_stale_selections() {
        let mut cafe = node("a", "Café A", "Génie", &["wifi", "micro-ondes"]);
        cafe.payment_methods = vec![PaymentMethod {
            method: "Cash".to_string(),
            minimum: Some(5.0),
        }];
        let nodes = vec![cafe, node("b", "Café B", "Droit", &["wifi"])];

        let vocabulary = FilterVocabulary::from_nodes(&nodes);
        assert_eq!(
            vocabulary.faculties.iter().collect::<Vec<_>>(),
            ["Droit", "Génie"]
        );
        assert_eq!(
            vocabulary.features.iter().collect::<Vec<_>>(),
            ["micro-ondes", "wifi"]
        );

        let mut filters = FilterState {
            faculties: set(&["Droit", "Musique"]),
            payment_methods: set(&["Cash", "Crypto"]),
            ..FilterState::default()
        };
        vocabulary.retain_known(&mut filters);
        assert_eq!(filters.faculties, set(&["Droit"]));
        assert_eq!(filters.payment_methods, set(&["Cash"]));
    }

    #[test]
    fn relevance_puts_fuzzy_name_matches_first() {
        let nodes = vec![
            node("a", "Zebra Lounge", "Arts", &[]),
            node("b", "Café Acquis", "Droit", &[]),
            node("c", "Aquarium", "Arts", &[]),
        ];

        let by_name = rank_by_relevance(&nodes, "");
        assert_eq!(
            by_name.iter().map(|node| node.id.as_str()).collect::<Vec<_>>(),
            ["c", "b", "a"]
        );

        let ranked = rank_by_relevance(&nodes, "acq");
        assert_eq!(ranked[0].id, "b");
        assert_eq!(ranked.len(), 3);
    }
}
