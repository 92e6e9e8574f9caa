use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::error::RecordError;
use super::parse::{EventRecord, RawCafe, parse_cafe, parse_event, split_records};

#[derive(Clone, Debug, Default)]
pub struct CafeDataset {
    pub cafes: Vec<RawCafe>,
    pub events: Vec<EventRecord>,
    pub skipped: Vec<RecordError>,
    index_by_id: HashMap<String, usize>,
}

#[derive(Clone, Debug)]
pub struct DatasetSource {
    pub cafes_path: PathBuf,
    pub events_path: Option<PathBuf>,
}

impl CafeDataset {
    pub fn from_json(cafes_raw: &str, events_raw: Option<&str>) -> Result<Self> {
        let mut skipped = Vec::new();
        let mut cafes = Vec::new();
        let mut index_by_id = HashMap::new();

        for (index, value) in split_records(cafes_raw, "cafes")?.into_iter().enumerate() {
            match parse_cafe(index, value) {
                Ok(cafe) => {
                    let id = cafe.id.clone().unwrap_or_default();
                    if index_by_id.contains_key(&id) {
                        tracing::warn!("duplicate café id `{id}`; keeping the first record");
                        continue;
                    }
                    index_by_id.insert(id, cafes.len());
                    cafes.push(cafe);
                }
                Err(error) => {
                    tracing::warn!("skipping café record: {error}");
                    skipped.push(error);
                }
            }
        }

        let mut events = Vec::new();
        if let Some(events_raw) = events_raw {
            for (index, value) in split_records(events_raw, "events")?.into_iter().enumerate() {
                match parse_event(index, value) {
                    Ok(event) => {
                        if !index_by_id.contains_key(&event.cafe_id) {
                            tracing::debug!(
                                "event `{}` references unknown café `{}`",
                                event.id,
                                event.cafe_id
                            );
                        }
                        events.push(event);
                    }
                    Err(error) => {
                        tracing::warn!("skipping event record: {error}");
                        skipped.push(error);
                    }
                }
            }
        }

        Ok(Self {
            cafes,
            events,
            skipped,
            index_by_id,
        })
    }

    pub fn cafe(&self, id: &str) -> Option<&RawCafe> {
        self.index_by_id
            .get(id)
            .and_then(|&index| self.cafes.get(index))
    }

    pub fn cafe_ids(&self) -> HashSet<String> {
        self.index_by_id.keys().cloned().collect()
    }
}

pub fn load_dataset(source: &DatasetSource) -> Result<CafeDataset> {
    let cafes_raw = read_file(&source.cafes_path)?;
    let events_raw = source
        .events_path
        .as_deref()
        .map(read_file)
        .transpose()?;

    let dataset = CafeDataset::from_json(&cafes_raw, events_raw.as_deref())
        .with_context(|| format!("failed to parse {}", source.cafes_path.display()))?;

    if dataset.cafes.is_empty() {
        tracing::warn!("no usable café records in {}", source.cafes_path.display());
    }

    tracing::info!(
        cafes = dataset.cafes.len(),
        events = dataset.events.len(),
        skipped = dataset.skipped.len(),
        "loaded café dataset"
    );
    Ok(dataset)
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}
