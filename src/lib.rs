//! Xmlconf - writable XML-backed configuration for concurrent applications.
//!
//! An XML document such as
//!
//! ```xml
//! <configuration>
//!   <logging>
//!     <level>info</level>
//!   </logging>
//! </configuration>
//! ```
//!
//! loads into a flat mapping addressed by `:`-delimited key paths
//! (`logging:level`). The store supports concurrent reads and exclusive
//! writes, persists changes back to the document while keeping CDATA
//! sections intact, and can reload itself when the file is edited
//! externally, coalescing bursts of change notifications into a single
//! reload.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use xmlconf::XmlConfigSource;
//!
//! # fn main() -> xmlconf::Result<()> {
//! let store = XmlConfigSource::new("config/settings.xml")
//!     .optional(true)
//!     .build()?;
//!
//! if let Some(level) = store.try_get("logging:level") {
//!     println!("log level: {level}");
//! }
//!
//! store.set("logging:level", "debug")?;
//! store.save()?;
//! # Ok(())
//! # }
//! ```

/// Writable XML configuration store with debounced reload on change.
pub mod store;

/// Re-exported store types for convenience.
pub use store::{
    ConfigError, ConfigurationProvider, ReloadEvent, Result, XmlConfigSource, XmlConfigStore,
};
