//! Core types for Arche.

pub mod message;

pub use message::*;
