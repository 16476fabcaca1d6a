//! ICS parsing and generation for VTODO components.
//!
//! This module handles reading and writing .ics text according to RFC 5545.

mod generate;
mod parse;

pub use generate::generate_ics;
pub use parse::parse_vtodo;
