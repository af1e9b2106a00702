//! Domain types and pure logic for the Fanray blogging platform.
//!
//! This crate holds everything that does not touch the network or the
//! database: ID/timestamp aliases, the [`error::CoreError`] domain error,
//! slug normalization and suffix probing ([`slug`]), the responsive-image
//! decision table and `srcset` rewriting ([`images`]), and upload
//! validation helpers ([`upload`]).

pub mod error;
pub mod images;
pub mod slug;
pub mod types;
pub mod upload;
