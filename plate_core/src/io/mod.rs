//! # File Input
//!
//! Readers for the member input table and the plate library. Both accept a
//! workbook (`.xlsx`, `.xls`) or a CSV file and share the [`tables`] reader.

pub mod input;
pub mod library;
pub mod tables;

pub use input::read_members;
pub use library::load_library;
