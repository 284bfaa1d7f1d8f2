//! # Outbound Core
//!
//! The domain layer of the outbound dispatcher.
//! This crate contains send requests, rate profiles and the provider ports,
//! with zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod ports;

pub use error::{DispatchError, DomainError, ProfileError, ResolveError};
