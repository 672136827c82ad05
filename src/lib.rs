//! # Rusty Drive Sheet
//!
//! A console client that signs in to a cloud identity provider, browses the
//! user's drive and reads spreadsheet documents stored there as plain text
//! tables.
//!
//! ## Features
//!
//! - **Device-code sign-in**: no browser needed on the machine running the client
//! - **Drive browsing**: drive information, root contents and spreadsheet files
//!   with their worksheets
//! - **Whole-document reads**: one table per worksheet, in worksheet order, with
//!   failing worksheets skipped instead of aborting the read
//! - **Range reads**: any A1-style address of one worksheet
//! - **Cell normalization**: booleans, numbers, line breaks and `M/DD/YYYY`
//!   dates are rendered consistently
//!
//! ## Modules
//!
//! - [`spreadsheet`]: extraction pipeline behind the [`spreadsheet::WorkbookSource`] trait
//! - [`graph`]: HTTP client implementing that trait, plus sign-in
//! - [`console`]: menu and command rendering
//! - [`config`]: settings file and environment overrides
pub mod config;
pub mod console;
pub mod database;
pub mod error;
pub mod graph;
pub mod spreadsheet;
