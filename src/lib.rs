//! Local-first photo album manager.
//!
//! Albums and their photos live in an [`state::AlbumStore`], which writes the
//! whole collection as one JSON document to a key-value storage backend after
//! every change and then notifies its subscribers.

pub mod config;
pub mod media;
pub mod state;
pub mod ui;
