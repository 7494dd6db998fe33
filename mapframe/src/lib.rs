//! MapFrame - tile acquisition and frame rendering for interactive map viewers
//!
//! This library provides the pipeline between a raster tile server and a
//! map widget: a bounded worker pool fetching tiles into a shared cache, and
//! a double-buffered frame whose transform follows the view as it pans,
//! zooms and resizes.
//!
//! # Overview
//!
//! ```text
//! host ──► ViewModel ──► controllers ──► FrameBuffer ──► host.draw
//!                              │
//!                              ▼
//!                       LayerManager ──► TileLayer ──► JobQueue ──► WorkerPool
//!                              ▲                                        │
//!                              └──────────── redraw ◄── TileCache ◄─────┘
//! ```
//!
//! [`viewer::MapViewer`] assembles the pipeline. The host mutates the view
//! models, draws the frame buffer when asked to repaint and provides the
//! tile source and cache.

pub mod cache;
pub mod config;
pub mod controller;
pub mod coord;
pub mod error;
pub mod fetch;
pub mod frame;
pub mod job;
pub mod layer;
pub mod logging;
pub mod model;
pub mod observer;
pub mod pool;
pub mod queue;
pub mod source;
pub mod surface;
pub mod viewer;

pub use error::{ConfigError, FetchError};
pub use job::Job;
pub use viewer::{MapViewer, ViewerConfig, ViewerError};
