//! Folio Application Library
//!
//! Book catalog service modules: entity models, the store seam, and the
//! CRUD route handlers.

pub mod modules;
