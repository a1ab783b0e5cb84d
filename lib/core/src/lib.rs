//! Core domain types and utilities for bookgate.
//!
//! This crate provides the foundational types and error handling shared by
//! the access library and the gateway server.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{IdentityId, ParseIdError, ProviderSubjectId};
