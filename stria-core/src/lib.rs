//! Board-agnostic receiver pipeline
//!
//! This crate contains everything between the datagram socket and the panel
//! driver, with no dependency on either:
//!
//! - Pixel conversion (RGB332 → RGB565)
//! - Scaling of 240, 180 and 120 pixel sources to the 240 × 240 raster
//! - Lock-free frame-slot pool with a four-state lifecycle
//! - Frame selection under reordering
//! - Double-buffered transfer pump
//! - Producer/consumer contexts and their counters
//!
//! Nothing allocates. The pool lives inside [`pipeline::Pipeline`], which is
//! built once and shared by reference between the two contexts.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

mod fmt;

pub mod config;
pub mod pipeline;
pub mod pixel;
pub mod pool;
pub mod pump;
pub mod scale;
pub mod select;
pub mod stats;

pub use config::{ConfigError, NormalizeStage, PipelineConfig};
pub use pipeline::{Consumer, ConsumerEvent, Pipeline, Producer, ProducerEvent};
pub use pool::{SlotPool, SlotState};
pub use pump::{PumpError, TransferPump};
pub use scale::{DstBand, ScaleError, ScaleMaps};
pub use select::SelectionPolicy;
pub use stats::{Stats, StatsSnapshot};
