//! Domains module containing business logic organized by bounded contexts.
//!
//! The gateway has a single domain: tools that wrap calls to the external
//! API.

pub mod tools;
