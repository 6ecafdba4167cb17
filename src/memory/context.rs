//! Evaluation context passed into every test and value computation

use super::{MemSize, MemoryReader};
use crate::config::{MemoryRegion, RuntimeConfig};
use std::sync::Arc;

/// Memory access for one evaluation.
///
/// Console addresses go through the configured regions before reaching the
/// reader. Bytes that cannot be read are treated as zero.
pub struct EvaluationContext {
    reader: Arc<dyn MemoryReader>,
    regions: Vec<MemoryRegion>,
    frames_per_second: u32,
}

impl EvaluationContext {
    /// Create a context with identity address translation
    pub fn new(reader: Arc<dyn MemoryReader>) -> Self {
        Self {
            reader,
            regions: Vec::new(),
            frames_per_second: 60,
        }
    }

    /// Create a context from runtime configuration
    pub fn from_config(reader: Arc<dyn MemoryReader>, config: &RuntimeConfig) -> Self {
        Self::new(reader)
            .with_regions(config.memory.regions.clone())
            .with_frames_per_second(config.frames_per_second)
    }

    /// Set the address translation regions
    pub fn with_regions(mut self, regions: Vec<MemoryRegion>) -> Self {
        self.regions = regions;
        self
    }

    /// Set the frame rate used for frame-based time formats
    pub fn with_frames_per_second(mut self, frames_per_second: u32) -> Self {
        self.frames_per_second = frames_per_second.max(1);
        self
    }

    /// Get the memory reader
    pub fn reader(&self) -> &dyn MemoryReader {
        self.reader.as_ref()
    }

    pub fn frames_per_second(&self) -> u32 {
        self.frames_per_second
    }

    /// Map a console address onto the reader's address space
    pub fn translate(&self, address: u32) -> Option<usize> {
        if self.regions.is_empty() {
            return Some(address as usize);
        }
        self.regions.iter().find_map(|r| r.translate(address))
    }

    /// Read one byte, zero when unmapped or unreadable
    pub fn read_byte(&self, address: u32) -> u8 {
        self.translate(address)
            .and_then(|real| self.reader.read_u8(real))
            .unwrap_or(0)
    }

    /// Read `count` consecutive bytes, each independently zero-filled
    pub fn read_bytes(&self, address: u32, count: usize) -> Vec<u8> {
        (0..count)
            .map(|i| self.read_byte(address.wrapping_add(i as u32)))
            .collect()
    }

    /// Read a raw value of the given size
    pub fn read(&self, address: u32, size: MemSize) -> u32 {
        size.read(self, address)
    }
}
