//! Job identity.
//!
//! A [`Job`] names one tile from one source. It is created whenever a
//! visible tile is missing from the cache and lives until the worker that
//! picked it up reaches a terminal outcome. Jobs are never retried: a
//! failed tile comes back only through a later, independently created job.

use std::fmt;

use crate::coord::TileCoord;
use crate::source::SourceId;

/// Unit of work identifying one tile to fetch from one source.
///
/// Equality and hashing are structural over both fields, so the same tile
/// requested from two sources yields two distinct jobs (and two distinct
/// cache keys).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Job {
    tile: TileCoord,
    source: SourceId,
}

impl Job {
    pub fn new(tile: TileCoord, source: SourceId) -> Self {
        Self { tile, source }
    }

    pub fn tile(&self) -> TileCoord {
        self.tile
    }

    pub fn source(&self) -> &SourceId {
        &self.source
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.source, self.tile)
    }
}
