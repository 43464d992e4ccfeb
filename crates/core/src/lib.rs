//! Domain types and collaborator traits for the asset request reconciler.
//!
//! This crate has no I/O of its own. Entities ([`asset::Asset`],
//! [`request::AssetRequest`], [`notification::NotificationRecord`]) are parsed
//! and validated at the store boundary; the traits in [`store`] and
//! [`identity`] are implemented by the database and delivery crates.

pub mod asset;
pub mod error;
pub mod identity;
pub mod notification;
pub mod request;
pub mod store;
pub mod types;
pub mod validation;
