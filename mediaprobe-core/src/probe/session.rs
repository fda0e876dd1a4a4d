//! Probe session management
//!
//! Responsibilities:
//! - Cache probe results so repeated lookups of one source run the engine once
//! - Hand out independent copies of the cached aggregates
//! - Keep the cache usable from several threads
//!
//! Keys are the source exactly as the caller spelled it. A cached aggregate
//! reports that spelling as its source, so `./a.mkv` and its absolute form
//! are separate entries.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::engine::DemuxEngine;
use crate::error::ProbeResult;
use crate::info::MediaInfo;
use crate::probe::ContainerProbe;

/// Caching front end for a [`ContainerProbe`].
#[derive(Debug)]
pub struct ProbeSession<E: DemuxEngine> {
    probe: ContainerProbe<E>,
    cache: Mutex<HashMap<OsString, MediaInfo>>,
}

impl<E: DemuxEngine> ProbeSession<E> {
    pub fn new(probe: ContainerProbe<E>) -> Self {
        Self {
            probe,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn probe(&self) -> &ContainerProbe<E> {
        &self.probe
    }

    /// Get media info for a source, probing it only on the first request.
    ///
    /// Failures are not cached; the next request probes again.
    pub fn get_media_info(&self, source: impl AsRef<Path>) -> ProbeResult<MediaInfo> {
        let source = source.as_ref();
        let key = source.as_os_str().to_os_string();

        if let Some(info) = self.lock().get(&key) {
            log::trace!("Cache hit for {}", source.display());
            return Ok(info.clone());
        }

        // Probe without holding the lock
        let info = self.probe.probe(source)?;
        self.lock().insert(key, info.clone());
        Ok(info)
    }

    pub fn clear_cache(&self) {
        self.lock().clear();
    }

    pub fn cache_size(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<OsString, MediaInfo>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
