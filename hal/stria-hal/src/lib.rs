//! Stria Hardware Abstraction Layer
//!
//! This crate defines the collaborator traits the receiver core is written
//! against. Board support code implements them for a concrete panel driver
//! and network stack; the core never touches either directly.
//!
//! # Architecture
//!
//! ```text
//!  ┌──────────────────┐        ┌──────────────────────────┐        ┌───────────────┐
//!  │ DatagramSource   │──────▶ │ stria-core               │──────▶ │ DisplaySink   │
//!  │ (UDP socket)     │        │ producer ─ pool ─ pump   │        │ (DMA panel)   │
//!  └──────────────────┘        └──────────────────────────┘        └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`net::DatagramSource`] - Non-blocking datagram reception
//! - [`display::DisplaySink`] - Asynchronous rectangle transfers to the panel
//!
//! With the `std` feature the crate also provides [`udp::UdpSource`], a
//! `std::net::UdpSocket` adapter, and the in-memory doubles in [`mock`].

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]

pub mod display;
pub mod net;

#[cfg(feature = "std")]
pub mod mock;
#[cfg(feature = "std")]
pub mod udp;

// Re-export key traits at crate root for convenience
pub use display::{Area, DisplaySink};
pub use net::DatagramSource;
