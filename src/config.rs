//! Runtime configuration
//!
//! These types define how evaluation is set up for a console: address translation,
//! frame rate used by frame-based time formats, and runtime event options.
//! They are loaded from TOML files.

use serde::{Deserialize, Serialize};

/// A console address range mapped onto the reader's address space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRegion {
    /// First console address in the region
    pub start: u32,
    /// Last console address in the region (inclusive)
    pub end: u32,
    /// Reader address that `start` maps to
    pub real_address: usize,
}

impl MemoryRegion {
    /// Create a new region
    pub fn new(start: u32, end: u32, real_address: usize) -> Self {
        Self {
            start,
            end,
            real_address,
        }
    }

    /// Check whether a console address falls inside this region
    pub fn contains(&self, address: u32) -> bool {
        address >= self.start && address <= self.end
    }

    /// Translate a console address, if it belongs to this region
    pub fn translate(&self, address: u32) -> Option<usize> {
        if self.contains(address) {
            Some(self.real_address + (address - self.start) as usize)
        } else {
            None
        }
    }
}

/// Memory layout configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Address translation regions. Empty means console addresses are reader addresses.
    #[serde(default)]
    pub regions: Vec<MemoryRegion>,
}

fn default_frames_per_second() -> u32 {
    60
}

/// Top-level runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Frame rate used for `FRAMES` formatted values
    #[serde(default = "default_frames_per_second")]
    pub frames_per_second: u32,

    #[serde(default)]
    pub memory: MemoryConfig,

    /// Emit a reset event when an achievement with progress loses it
    #[serde(default)]
    pub pause_on_reset: bool,

    /// Forwarded on unlock events
    #[serde(default)]
    pub hardcore: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            frames_per_second: default_frames_per_second(),
            memory: MemoryConfig::default(),
            pause_on_reset: false,
            hardcore: false,
        }
    }
}

impl RuntimeConfig {
    /// Parse configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Load configuration from a file
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_toml(&content)?)
    }
}
