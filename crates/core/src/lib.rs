//! `hrms-core` — shared domain primitives for the HR workspace.
//!
//! This crate contains **pure domain** building blocks (no I/O).

pub mod entity;
pub mod error;
pub mod id;

pub use entity::Entity;
pub use error::DomainError;
pub use id::UserId;
