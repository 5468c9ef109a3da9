//! wbmap_rs
//!
//! Map interaction, filtering and data-orchestration engine for exploring
//! World Bank country profiles on a clickable world map. Pairs with the `wbmap` CLI.
//!
//! ### Features
//! - Bind SVG map shapes to country identity and static name/region tables
//! - Combined free-text + region filtering with highlight/dim visual states
//! - Single selection persisted across sessions, with a 7-day profile cache
//! - Superseding profile + indicator fetches with retry of the last selection
//!
//! ### Example
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use wbmap_rs::{Client, CountryDirectory, Explorer, MapAsset, Palette, PersistenceStore};
//! use wbmap_rs::orchestrator::{DataOrchestrator, IndicatorSettings, ThreadSpawner};
//!
//! let palette = Palette::default();
//! let map = MapAsset::load("assets/map-image.svg", &palette)?;
//! let store = Arc::new(PersistenceStore::in_memory());
//! let orchestrator = DataOrchestrator::new(
//!     Arc::new(Client::default()),
//!     Box::new(ThreadSpawner),
//!     store.clone(),
//!     IndicatorSettings::default(),
//! );
//! let mut explorer = Explorer::new(map.shapes, CountryDirectory::builtin(), store, orchestrator, palette);
//! explorer.restore_from_persistence();
//! explorer.on_search_change("united");
//! if let Some(i) = explorer.find_element(&"us".parse()?) {
//!     explorer.click(i);
//! }
//! explorer.wait_idle(Duration::from_secs(30));
//! println!("{:#?}", explorer.data().profile);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod api;
pub mod chart;
pub mod config;
pub mod directory;
pub mod element;
pub mod error;
pub mod explorer;
pub mod filter;
pub mod map;
pub mod models;
pub mod orchestrator;
pub mod selection;
pub mod storage;
pub mod store;

pub use api::Client;
pub use config::ExplorerConfig;
pub use directory::{CountryDirectory, Region};
pub use element::{Color, Palette, ShapeElement, VisualElement};
pub use error::ExplorerError;
pub use explorer::Explorer;
pub use filter::{FilterState, VisualOutcome};
pub use map::MapAsset;
pub use models::{CountryCode, CountryProfile, DateSpec, IndicatorSeries};
pub use store::PersistenceStore;
