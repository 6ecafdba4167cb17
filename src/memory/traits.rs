//! Traits for memory reading
//!
//! These traits allow for dependency injection, enabling mock implementations
//! for testing without requiring a running emulator core.

use parking_lot::RwLock;

/// Trait for reading emulated memory
pub trait MemoryReader: Send + Sync {
    /// Read raw bytes from memory.
    ///
    /// The typed readers below treat a short result as unreadable.
    fn read_bytes(&self, address: usize, size: usize) -> Option<Vec<u8>>;

    /// Read a u8 from memory
    fn read_u8(&self, address: usize) -> Option<u8> {
        self.read_bytes(address, 1)?.first().copied()
    }

    /// Read a u16 from memory
    fn read_u16(&self, address: usize) -> Option<u16> {
        let bytes = self.read_bytes(address, 2)?;
        Some(u16::from_le_bytes(bytes.get(..2)?.try_into().ok()?))
    }

    /// Read a u32 from memory
    fn read_u32(&self, address: usize) -> Option<u32> {
        let bytes = self.read_bytes(address, 4)?;
        Some(u32::from_le_bytes(bytes.get(..4)?.try_into().ok()?))
    }

    /// Read an f32 from memory
    fn read_f32(&self, address: usize) -> Option<f32> {
        let bytes = self.read_bytes(address, 4)?;
        Some(f32::from_le_bytes(bytes.get(..4)?.try_into().ok()?))
    }

    /// Check if the reader is still valid (core still running)
    fn is_valid(&self) -> bool;

    /// Get the base address of the exposed memory
    fn base_address(&self) -> usize;

    /// Get the size of the exposed memory
    fn module_size(&self) -> usize;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Mock memory reader backed by contiguous blocks.
///
/// Writes go through `&self` so a reader shared behind an `Arc` can be
/// poked between frames.
pub struct MockMemoryReader {
    /// Memory blocks: (start address, bytes)
    blocks: RwLock<Vec<(usize, Vec<u8>)>>,
    base: usize,
    size: usize,
    valid: bool,
}

impl MockMemoryReader {
    /// Create a new, empty mock memory reader
    pub fn new() -> Self {
        Self {
            blocks: RwLock::new(Vec::new()),
            base: 0,
            size: 0,
            valid: true,
        }
    }

    /// Create a reader whose memory starts at address 0 with the given bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        let reader = Self::new().with_size(data.len());
        reader.write_memory_block(0, data);
        reader
    }

    /// Set the base address
    pub fn with_base(mut self, base: usize) -> Self {
        self.base = base;
        self
    }

    /// Set the memory size
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    /// Set whether the core is valid
    pub fn with_valid(mut self, valid: bool) -> Self {
        self.valid = valid;
        self
    }

    /// Write a contiguous block of memory, replacing a block at the same start
    pub fn write_memory_block(&self, start_address: usize, data: &[u8]) {
        let mut blocks = self.blocks.write();
        if let Some(block) = blocks.iter_mut().find(|(start, _)| *start == start_address) {
            block.1 = data.to_vec();
        } else {
            blocks.push((start_address, data.to_vec()));
        }
    }

    /// Write a u8, patching or extending an existing block when possible
    pub fn write_u8(&self, address: usize, value: u8) {
        let mut blocks = self.blocks.write();
        for (start, data) in blocks.iter_mut() {
            if address >= *start && address < *start + data.len() {
                data[address - *start] = value;
                return;
            }
        }
        for (start, data) in blocks.iter_mut() {
            if address == *start + data.len() {
                data.push(value);
                return;
            }
        }
        blocks.push((address, vec![value]));
    }

    /// Write a little-endian u16
    pub fn write_u16(&self, address: usize, value: u16) {
        for (i, byte) in value.to_le_bytes().iter().enumerate() {
            self.write_u8(address + i, *byte);
        }
    }

    /// Write a little-endian u32
    pub fn write_u32(&self, address: usize, value: u32) {
        for (i, byte) in value.to_le_bytes().iter().enumerate() {
            self.write_u8(address + i, *byte);
        }
    }

    /// Write raw bytes, patching existing blocks byte by byte
    pub fn write_bytes(&self, address: usize, data: &[u8]) {
        for (i, byte) in data.iter().enumerate() {
            self.write_u8(address + i, *byte);
        }
    }
}

impl MemoryReader for MockMemoryReader {
    fn read_bytes(&self, address: usize, size: usize) -> Option<Vec<u8>> {
        if !self.valid {
            return None;
        }

        let blocks = self.blocks.read();
        for (block_start, block_data) in blocks.iter() {
            if address >= *block_start && address < block_start + block_data.len() {
                let offset = address - block_start;
                if offset + size <= block_data.len() {
                    return Some(block_data[offset..offset + size].to_vec());
                }
            }
        }

        None
    }

    fn is_valid(&self) -> bool {
        self.valid
    }

    fn base_address(&self) -> usize {
        self.base
    }

    fn module_size(&self) -> usize {
        self.size
    }
}

impl Default for MockMemoryReader {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MockMemoryReader {
    fn clone(&self) -> Self {
        Self {
            blocks: RwLock::new(self.blocks.read().clone()),
            base: self.base,
            size: self.size,
            valid: self.valid,
        }
    }
}
