//! Runtime configuration.
//!
//! - [`settings`] - the [`Settings`] document, [`SettingsPatch`] and validation
//! - [`live`] - the atomically swapped [`LiveSettings`] snapshot
//! - [`store`] - durable [`SettingsStore`] implementations
//!
//! # Examples
//!
//! ```rust
//! use fetchq::settings::{Settings, SettingsPatch};
//! use serde_json::json;
//!
//! let patch = SettingsPatch::from_json(&json!({ "max_concurrent": 4 }))?;
//! let next = Settings::default().apply(&patch)?;
//! assert_eq!(next.max_concurrent, 4);
//!
//! let rejected = SettingsPatch::from_json(&json!({ "max_concurrent": 11 }))?;
//! assert!(Settings::default().apply(&rejected).is_err());
//! # Ok::<(), fetchq::Error>(())
//! ```

pub mod live;
pub mod settings;
pub mod store;

pub use live::LiveSettings;
pub use settings::{Settings, SettingsPatch};
pub use store::{JsonFileStore, MemorySettingsStore, SettingsStore};
