//! The published configuration snapshot.

use super::settings::Settings;

use std::sync::{Arc, RwLock};

/// Holds the configuration currently in effect.
///
/// Readers get an `Arc` to a complete, validated value and keep using it for
/// as long as they like; writers publish a whole replacement. A reader can
/// therefore never observe fields from two different versions.
#[derive(Debug)]
pub struct LiveSettings {
    current: RwLock<Arc<Settings>>,
}

impl LiveSettings {
    pub fn new(settings: Settings) -> Self {
        Self {
            current: RwLock::new(Arc::new(settings)),
        }
    }

    /// The configuration in effect right now.
    pub fn load(&self) -> Arc<Settings> {
        Arc::clone(&self.current.read().unwrap_or_else(|e| e.into_inner()))
    }

    /// Replaces the configuration and returns the one it superseded.
    pub fn publish(&self, settings: Settings) -> Arc<Settings> {
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        std::mem::replace(&mut *current, Arc::new(settings))
    }
}
