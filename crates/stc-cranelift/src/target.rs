//! Target platform information for code generation
//!
//! The ISA, the module's recorded triple and its data layout are all derived
//! from one `TargetInfo`, so they never disagree.

use target_lexicon::{Architecture, Triple};

/// Target platform information for code generation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetInfo {
    /// Target triple (e.g., "x86_64-unknown-linux-gnu")
    pub triple: Triple,
    /// Pointer size in bytes (4 for 32-bit, 8 for 64-bit)
    pub pointer_size: u8,
    /// Byte order of the target platform
    pub endianness: Endianness,
}

/// Byte order of the target platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endianness {
    Little,
    Big,
}

impl TargetInfo {
    /// Create target info from a triple
    pub fn from_triple(triple: Triple) -> Self {
        let pointer_size = match triple.pointer_width() {
            Ok(target_lexicon::PointerWidth::U16) => 2,
            Ok(target_lexicon::PointerWidth::U32) => 4,
            Ok(target_lexicon::PointerWidth::U64) => 8,
            _ => 8,
        };

        let endianness = match triple.endianness() {
            Ok(target_lexicon::Endianness::Big) => Endianness::Big,
            _ => Endianness::Little,
        };

        Self {
            triple,
            pointer_size,
            endianness,
        }
    }

    /// Get the default target for the current host
    pub fn host() -> Self {
        Self::from_triple(Triple::host())
    }

    pub fn pointer_bits(&self) -> u32 {
        u32::from(self.pointer_size) * 8
    }

    pub fn is_64bit(&self) -> bool {
        self.pointer_size == 8
    }

    pub fn is_little_endian(&self) -> bool {
        self.endianness == Endianness::Little
    }

    pub fn architecture(&self) -> Architecture {
        self.triple.architecture
    }

    /// LLVM-style data layout string describing this target.
    ///
    /// Only byte order, pointer width and native integer widths are encoded;
    /// that is all the generated code depends on.
    pub fn data_layout(&self) -> String {
        let order = if self.is_little_endian() { 'e' } else { 'E' };
        let bits = self.pointer_bits();
        let native = if self.is_64bit() { "n32:64" } else { "n32" };
        format!("{order}-p:{bits}:{bits}-i64:64-f128:128-{native}-S128")
    }
}

impl std::fmt::Display for TargetInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.triple)
    }
}
