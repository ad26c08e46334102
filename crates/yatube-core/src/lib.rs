//! # Yatube Core
//!
//! The domain layer of yatube.
//! Entities, ports, the post form and the feed/ownership service live here,
//! with zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod form;
pub mod ports;
pub mod service;

pub use error::DomainError;
pub use form::{CleanedPost, FormErrors, PostForm};
pub use service::{BlogService, EditAccess, PostDetail};
