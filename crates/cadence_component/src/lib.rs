//! # cadence_component
//!
//! The data layer of the cadence ECS core — defines what a component is,
//! how it is stored, and how entities are identified.
//!
//! This crate provides:
//!
//! - [`Component`] trait — the contract all entity data must satisfy.
//! - [`ComponentTypeId`] — collision-free compile-time type identity.
//! - [`EntityId`] — lightweight, recyclable `u64` entity identifiers.
//! - [`Registry`] — dense, identity-indexed storage for one component type.
//! - [`AnyRegistry`] — the type-erased registry surface the world stores
//!   uniformly, one per component type.

pub mod component;
pub mod entity;
pub mod error;
pub mod registry;

pub use component::{Component, ComponentTypeId};
pub use entity::EntityId;
pub use error::ComponentError;
pub use registry::{AnyRegistry, ComponentRead, ComponentWrite, Registry};
