//! Local library catalog application.
//!
//! Server-rendered CRUD pages over authors, genres, books, and book copies,
//! built on the catalog kernel's module lifecycle and HTTP facade.

pub mod bootstrap;
pub mod modules;
pub mod utils;
pub mod validation;
pub mod views;
