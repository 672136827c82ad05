//! Tabular primitives shared by the extraction pipeline: A1 range addresses
//! and rectangular string tables.
pub mod range;
pub mod table;
