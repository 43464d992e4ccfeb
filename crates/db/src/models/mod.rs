//! Row structs for each table.
//!
//! Rows are never handed to the reconciler directly; each converts into its
//! `assetflow_core` entity through `TryFrom`, which is where validation
//! happens.

pub mod asset;
pub mod asset_request;
pub mod employee;
pub mod notification;
