//! Memoized model loading
//!
//! The model artifact is read from disk at most once per cache. The first
//! successful load is stored in a `OnceLock` and every caller observes that
//! same instance, even when several threads race to load it. A failed load is
//! not remembered, so a later call succeeds once the artifact exists.

use crate::error::RiskError;
use crate::model::ModelArtifact;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

/// Lazily loaded, immutable model artifact
#[derive(Debug)]
pub struct ModelCache {
    path: PathBuf,
    cell: OnceLock<Arc<ModelArtifact>>,
}

static SHARED: OnceLock<ModelCache> = OnceLock::new();

impl ModelCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cell: OnceLock::new(),
        }
    }

    /// Process-wide cache, bound to the path of its first caller.
    ///
    /// Asking for a different path afterwards fails with
    /// [`RiskError::ModelUnavailable`] rather than handing out a model loaded
    /// from another file.
    pub fn shared(path: &Path) -> Result<&'static ModelCache, RiskError> {
        let cache = SHARED.get_or_init(|| ModelCache::new(path));
        if cache.path != path {
            warn!(
                requested = %path.display(),
                active = %cache.path.display(),
                "shared model cache already bound to another path"
            );
            return Err(RiskError::model_unavailable(
                path,
                format!("shared model cache is bound to {}", cache.path.display()),
            ));
        }
        Ok(cache)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the cached model, loading it on first use
    pub fn get(&self) -> Result<Arc<ModelArtifact>, RiskError> {
        if let Some(model) = self.cell.get() {
            return Ok(Arc::clone(model));
        }

        debug!(path = %self.path.display(), "loading model artifact");
        let loaded = Arc::new(ModelArtifact::load(&self.path)?);
        Ok(Arc::clone(self.cell.get_or_init(|| loaded)))
    }

    /// Whether a model has been loaded
    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }
}
