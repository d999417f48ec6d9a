//! Shared types, adapter traits, and core utilities for the Mailgate
//! mail-dispatch pipeline.
//!
//! This crate contains the foundational types that are shared between the
//! dispatch crate and adapter implementations. The dispatch core only ever
//! talks to its collaborators (authorization gate, user/configuration store,
//! notification sink) through the traits defined here, so adapter crates can
//! be developed and tested independently.

pub mod auth_adapter;
pub mod error;
pub mod meta_adapter;
pub mod notify_adapter;
pub mod prelude;
pub mod types;

// vim: ts=4
