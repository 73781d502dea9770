//! Stria band streaming protocol
//!
//! This crate defines the datagram format between the screen-capture sender
//! and the display receiver. The protocol is designed for low latency over a
//! lossy datagram transport: there is no acknowledgement, no retransmission
//! and no sequencing beyond an advisory frame counter.
//!
//! # Protocol Overview
//!
//! Every datagram carries exactly one band (a horizontal strip of the source
//! raster):
//! ```text
//! ┌──────────┬─────────┬───────┬──────────────────────────────────┐
//! │ FRAME_ID │ Y_START │ FLAGS │ PAYLOAD                          │
//! │ 2B (BE)  │ 2B (BE) │ 1B    │ width × lines × bytes-per-pixel  │
//! └──────────┴─────────┴───────┴──────────────────────────────────┘
//!
//! FLAGS: ┌────────────┬────────────┬────────────────┐
//!        │ RESOLUTION │ COLOR_MODE │ LINE_COUNT     │
//!        │ bits 7..6  │ bits 5..4  │ bits 3..0      │
//!        └────────────┴────────────┴────────────────┘
//! ```
//!
//! The source raster is always square; its side length is implied by the
//! resolution code. The receiver normalizes every band to one fixed
//! 240 × 240 RGB565 output raster.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

pub mod datagram;
pub mod header;

pub use datagram::{encode_datagram, encode_to_vec, MAX_DATAGRAM_LEN};
pub use header::{
    BandHeader, ColorMode, HeaderError, Resolution, HEADER_LEN, MAX_LINE_COUNT, MAX_PAYLOAD_LEN,
};

/// Side length of the square output raster, in pixels
pub const OUTPUT_SIDE: u16 = 240;

/// Bytes per pixel of the output raster (RGB565)
pub const OUTPUT_BYTES_PER_PIXEL: usize = 2;

/// UDP port the receiver listens on unless configured otherwise
pub const DEFAULT_UDP_PORT: u16 = 8888;
