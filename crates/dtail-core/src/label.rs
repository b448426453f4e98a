//! Source labelling.
//!
//! Resolves each requested container to a [`Source`]: the engine-reported
//! display name and a palette slot chosen by position. Resolution happens once,
//! before any reader starts, and fails fast on the first lookup error.

use std::fmt::Display;
use std::future::Future;

use crate::error::DtailError;
use crate::palette::PALETTE_SIZE;
use crate::types::{Metadata, Source};

/// Strip the engine's leading `/` from a container name.
pub fn display_name(raw: &str) -> &str {
    raw.strip_prefix('/').unwrap_or(raw)
}

/// Palette slot for the source at `position` in the request list.
pub fn color_index(position: usize) -> usize {
    position % PALETTE_SIZE
}

/// Resolve every id in order, calling `inspect` once per id for its metadata.
///
/// The returned vector preserves the input order. The first failed lookup
/// aborts with [`DtailError::Resolution`] and no further ids are queried.
pub async fn assign_labels<F, Fut, E>(ids: &[String], mut inspect: F) -> Result<Vec<Source>, DtailError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<Metadata, E>>,
    E: Display,
{
    let mut sources = Vec::with_capacity(ids.len());
    for (position, id) in ids.iter().enumerate() {
        let meta = inspect(id.clone()).await.map_err(|e| DtailError::Resolution {
            source_id: id.clone(),
            message: e.to_string(),
        })?;
        tracing::debug!(source_id = %id, name = %meta.name, tty = meta.tty, "resolved container");
        sources.push(Source {
            id: id.clone(),
            display_name: display_name(&meta.name).to_string(),
            color_index: color_index(position),
            tty: meta.tty,
        });
    }
    Ok(sources)
}
