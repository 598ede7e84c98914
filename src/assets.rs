//! Asset catalog
//!
//! The simulation only needs to know which texture keys exist so it can pick
//! a directional variant or fall back to a generated placeholder. Loading the
//! images is the renderer's business.

use std::collections::HashSet;

use crate::sim::state::{EntityKind, Facing};

/// Texture existence queries
pub trait AssetCatalog {
    fn has_texture(&self, key: &str) -> bool;
}

/// Fixed set of known texture keys
#[derive(Debug, Clone, Default)]
pub struct AssetManifest {
    keys: HashSet<String>,
}

impl AssetManifest {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Textures shipped with the game
    pub fn standard() -> Self {
        Self::new([
            "balloon",
            "bird",
            "bird_right",
            "airplane",
            "airplane_right",
            "ufo",
            "fuel",
            "shield",
            "thermal",
            "wind",
            "turbo",
        ])
    }

    pub fn insert(&mut self, key: impl Into<String>) {
        self.keys.insert(key.into());
    }
}

impl AssetCatalog for AssetManifest {
    fn has_texture(&self, key: &str) -> bool {
        self.keys.contains(key)
    }
}

/// Catalog with nothing loaded; everything resolves to a fallback key
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAssets;

impl AssetCatalog for NoAssets {
    fn has_texture(&self, _key: &str) -> bool {
        false
    }
}

/// Resolve a texture key: `<kind>_right` (obstacles facing right), then
/// `<kind>`, then `<kind>_fallback`.
pub fn texture_for(catalog: &dyn AssetCatalog, kind: EntityKind, facing: Facing) -> String {
    let base = kind.as_str();
    if facing == Facing::Right && matches!(kind, EntityKind::Obstacle(_)) {
        let right = format!("{base}_right");
        if catalog.has_texture(&right) {
            return right;
        }
    }
    if catalog.has_texture(base) {
        return base.to_string();
    }
    format!("{base}_fallback")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{ObstacleKind, PowerUpKind};

    #[test]
    fn test_texture_fallback_chain() {
        let catalog = AssetManifest::standard();
        let ufo = EntityKind::Obstacle(ObstacleKind::Ufo);
        let bird = EntityKind::Obstacle(ObstacleKind::Bird);
        assert_eq!(texture_for(&catalog, bird, Facing::Right), "bird_right");
        assert_eq!(texture_for(&catalog, bird, Facing::Left), "bird");
        assert_eq!(texture_for(&catalog, ufo, Facing::Right), "ufo");
        assert_eq!(
            texture_for(&NoAssets, EntityKind::PowerUp(PowerUpKind::Turbo), Facing::Left),
            "turbo_fallback"
        );
    }

    #[test]
    fn test_power_ups_ignore_facing() {
        let mut catalog = AssetManifest::default();
        catalog.insert("fuel");
        catalog.insert("fuel_right");
        let fuel = EntityKind::PowerUp(PowerUpKind::Fuel);
        assert_eq!(texture_for(&catalog, fuel, Facing::Right), "fuel");
    }
}
