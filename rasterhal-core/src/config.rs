// Rasterizer configuration
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunables of the object registry, the dynamic vertex-buffer pool and the
/// sprite tiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterizerConfig {
    /// Slots in a fresh object table.
    pub initial_slots: usize,
    /// Leading vertex-buffer slots reserved for the dynamic pool.
    pub reserved_vertex_buffer_slots: usize,
    /// Smallest vertex capacity of a pooled dynamic buffer.
    pub dynamic_vb_min_capacity: u32,
    /// Extra vertices added when a pooled buffer is (re)created.
    pub dynamic_vb_slack: u32,
    pub max_sprite_tiles_per_axis: usize,
}

impl Default for RasterizerConfig {
    fn default() -> Self {
        Self {
            initial_slots: 1024,
            reserved_vertex_buffer_slots: 256,
            dynamic_vb_min_capacity: 4096,
            dynamic_vb_slack: 100,
            max_sprite_tiles_per_axis: 16,
        }
    }
}

impl RasterizerConfig {
    /// Load from a JSON file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).context("Failed to read config file")?;
        let config: RasterizerConfig =
            serde_json::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).context("Failed to create config directory")?;
            }
        }
        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_files_keep_defaults() {
        let config: RasterizerConfig = serde_json::from_str(r#"{"initial_slots": 64}"#).unwrap();
        assert_eq!(config.initial_slots, 64);
        assert_eq!(config.reserved_vertex_buffer_slots, 256);
        assert_eq!(config.dynamic_vb_slack, 100);
    }

    #[test]
    fn save_then_load() {
        let path =
            std::env::temp_dir().join(format!("rasterhal-config-{}.json", std::process::id()));
        let config = RasterizerConfig {
            dynamic_vb_min_capacity: 128,
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(RasterizerConfig::load(&path).unwrap(), config);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_file_gives_defaults() {
        let path = Path::new("/nonexistent/rasterhal/config.json");
        assert_eq!(RasterizerConfig::load(path).unwrap(), RasterizerConfig::default());
    }
}
