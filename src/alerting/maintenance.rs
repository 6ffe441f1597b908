//! Maintenance suppression gate.
//!
//! While the marker path exists, every candidate is dropped before it
//! reaches the cooldown table. Checked on every call; operators toggle
//! the marker with `touch`/`rm` while the watcher runs.

use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct MaintenanceGate {
    marker: Option<PathBuf>,
}

impl MaintenanceGate {
    /// An empty path disables the gate.
    pub fn new(marker: &str) -> Self {
        let marker = marker.trim();
        Self {
            marker: (!marker.is_empty()).then(|| PathBuf::from(marker)),
        }
    }

    pub fn marker(&self) -> Option<&Path> {
        self.marker.as_deref()
    }

    /// Whether suppression is asserted right now.
    pub fn is_active(&self) -> bool {
        match &self.marker {
            Some(path) => match path.try_exists() {
                Ok(exists) => exists,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Cannot check maintenance marker; assuming inactive");
                    false
                }
            },
            None => false,
        }
    }
}
