//! # Wakil: build delegation for a named service container
//!
//! Lets configuration entries stand in for services: an entry is either
//! the name of another service, or a `{service, options}` pair that is
//! built with those options. Entries are addressed by dotted keys and
//! resolved lazily, on first request.
//!
//! ```rust
//! use std::sync::Arc;
//! use wakil::prelude::*;
//!
//! let config: ConfigValue = serde_json::from_str(r#"{
//!     "wakil": {"build_delegator": {"keys": ["cache"]}},
//!     "cache": {"session": {"service": "redis", "options": {"db": 2}}}
//! }"#).unwrap();
//!
//! let module = BuildDelegatorModule::new(Arc::new(config)).unwrap();
//! let manager = ServiceManager::builder()
//!     .factory("redis", |_, options| {
//!         Ok(match options.and_then(|o| o.get("db")) {
//!             Some(ConfigValue::Integer(db)) => *db,
//!             _ => 0,
//!         })
//!     })
//!     .add_module(&module)
//!     .build()
//!     .unwrap();
//!
//! let db: Arc<i64> = get_as(&manager, "cache.session").unwrap();
//! assert_eq!(*db, 2);
//! ```

pub use wakil_container::*;
pub use wakil_support::*;
