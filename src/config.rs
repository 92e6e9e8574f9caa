use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Deserializer};

use crate::layout::LayoutMode;

/// Latitude/longitude box mapped linearly onto the drawable area.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeoBounds {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lng_min: f64,
    pub lng_max: f64,
}

impl Default for GeoBounds {
    fn default() -> Self {
        Self {
            lat_min: 45.3,
            lat_max: 45.7,
            lng_min: -73.8,
            lng_max: -73.4,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModePhysics {
    pub repulsion: f32,
    pub anchor_strength: f32,
}

impl ModePhysics {
    pub const CLUSTER: Self = Self {
        repulsion: 30.0,
        anchor_strength: 0.05,
    };
    pub const GEOGRAPHIC: Self = Self {
        repulsion: 10.0,
        anchor_strength: 0.8,
    };
}

/// Fields left out of a mode's JSON object keep that mode's own default.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PhysicsOverrides {
    repulsion: Option<f32>,
    anchor_strength: Option<f32>,
}

impl PhysicsOverrides {
    fn over(self, base: ModePhysics) -> ModePhysics {
        ModePhysics {
            repulsion: self.repulsion.unwrap_or(base.repulsion),
            anchor_strength: self.anchor_strength.unwrap_or(base.anchor_strength),
        }
    }
}

fn cluster_physics<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<ModePhysics, D::Error> {
    Ok(PhysicsOverrides::deserialize(deserializer)?.over(ModePhysics::CLUSTER))
}

fn geographic_physics<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<ModePhysics, D::Error> {
    Ok(PhysicsOverrides::deserialize(deserializer)?.over(ModePhysics::GEOGRAPHIC))
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct VisualConfig {
    pub geo_bounds: GeoBounds,
    #[serde(deserialize_with = "cluster_physics")]
    pub cluster: ModePhysics,
    #[serde(deserialize_with = "geographic_physics")]
    pub geographic: ModePhysics,
    pub velocity_decay: f32,
    pub collision_padding: f32,
    pub selected_radius_scale: f32,
    pub bounce_restitution: f32,
    pub tick_rate_hz: f32,
    pub anchor_jitter: f32,
    pub orbit_step: f32,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            geo_bounds: GeoBounds::default(),
            cluster: ModePhysics::CLUSTER,
            geographic: ModePhysics::GEOGRAPHIC,
            velocity_decay: 0.3,
            collision_padding: 20.0,
            selected_radius_scale: 2.0,
            bounce_restitution: 0.8,
            tick_rate_hz: 60.0,
            anchor_jitter: 12.0,
            orbit_step: 0.01,
        }
    }
}

impl VisualConfig {
    pub fn physics_for(&self, mode: LayoutMode) -> ModePhysics {
        match mode {
            LayoutMode::Cluster => self.cluster,
            LayoutMode::Geographic => self.geographic,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let bounds = self.geo_bounds;
        if bounds.lat_max <= bounds.lat_min || bounds.lng_max <= bounds.lng_min {
            bail!("geo_bounds must have lat_min < lat_max and lng_min < lng_max");
        }
        if !(self.tick_rate_hz > 0.0) {
            bail!("tick_rate_hz must be positive");
        }
        if !(0.0..1.0).contains(&self.velocity_decay) {
            bail!("velocity_decay must be in [0, 1)");
        }
        if !(0.0..=1.0).contains(&self.bounce_restitution) {
            bail!("bounce_restitution must be in [0, 1]");
        }
        if self.selected_radius_scale < 1.0 {
            bail!("selected_radius_scale must be at least 1");
        }
        if self.collision_padding < 0.0 || self.anchor_jitter < 0.0 {
            bail!("collision_padding and anchor_jitter must not be negative");
        }
        Ok(())
    }
}

pub fn load_config(path: Option<&Path>) -> Result<VisualConfig> {
    let Some(path) = path else {
        return Ok(VisualConfig::default());
    };

    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config = parse_config(&raw)
        .with_context(|| format!("invalid config {}", path.display()))?;
    tracing::info!("loaded visual config from {}", path.display());
    Ok(config)
}

fn parse_config(raw: &str) -> Result<VisualConfig> {
    let config: VisualConfig = serde_json::from_str(raw).context("invalid JSON")?;
    config.validate()?;
    Ok(config)
}
