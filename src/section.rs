//! Script section identifiers
//!
//! Every script in a bundle carries a numeric "section" that the engine uses
//! as its identity. New scripts get random free sections; the loader script
//! owns a fixed one. [`SECTION_MAX`] equals [`LOADER_SECTION`], so a generated
//! section can never collide with the loader.

use std::collections::HashSet;

use rand::Rng;

use crate::error::{Error, Result};

/// Section reserved for the generated loader script
pub const LOADER_SECTION: i64 = 133_769_420;

/// Exclusive upper bound of generated sections
pub const SECTION_MAX: i64 = LOADER_SECTION;

/// Random draws before falling back to a linear scan
pub const MAX_RANDOM_ATTEMPTS: usize = 64;

/// Check whether a section belongs to the loader script
pub fn is_loader_section(section: i64) -> bool {
    section == LOADER_SECTION
}

/// Generate a section in `[0, SECTION_MAX)` that is not in `existing`
///
/// Draws uniformly at random. After [`MAX_RANDOM_ATTEMPTS`] collisions the
/// range is scanned linearly from a random start, so a nearly full set still
/// terminates; a completely full one returns [`Error::SectionsExhausted`].
pub fn generate_section_id<R: Rng>(existing: &HashSet<i64>, rng: &mut R) -> Result<i64> {
    for _ in 0..MAX_RANDOM_ATTEMPTS {
        let candidate = rng.gen_range(0..SECTION_MAX);
        if !existing.contains(&candidate) {
            return Ok(candidate);
        }
    }

    let start = rng.gen_range(0..SECTION_MAX);
    (start..SECTION_MAX)
        .chain(0..start)
        .find(|candidate| !existing.contains(candidate))
        .ok_or(Error::SectionsExhausted)
}

/// Hands out unique sections for one build
///
/// The loader section is reserved from the start.
pub struct SectionAllocator<R> {
    used: HashSet<i64>,
    rng: R,
}

impl SectionAllocator<rand::rngs::ThreadRng> {
    pub fn new() -> Self {
        Self::with_rng(rand::thread_rng())
    }
}

impl Default for SectionAllocator<rand::rngs::ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> SectionAllocator<R> {
    /// Create an allocator with a specific random source
    pub fn with_rng(rng: R) -> Self {
        let mut used = HashSet::new();
        used.insert(LOADER_SECTION);
        Self { used, rng }
    }

    /// Mark a section as taken
    pub fn reserve(&mut self, section: i64) -> bool {
        self.used.insert(section)
    }

    /// Generate and reserve a fresh section
    pub fn allocate(&mut self) -> Result<i64> {
        let section = generate_section_id(&self.used, &mut self.rng)?;
        self.used.insert(section);
        Ok(section)
    }

    /// Number of reserved sections, the loader's included
    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }
}
