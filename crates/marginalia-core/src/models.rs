//! Core data models for marginalia.
//!
//! These types are shared across all marginalia crates and represent the
//! core domain entities.

mod annotation;
mod group;
mod principal;

pub use annotation::{
    Annotation, AnnotationFields, Permissions, Target, PROTECTED_FIELDS, SYSTEM_FLAGS,
};
pub use group::Group;
pub use principal::{Author, Principals};
