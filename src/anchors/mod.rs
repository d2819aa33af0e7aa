//! Anchors module - Invisible markers that pin topics to document lines
//!
//! An anchor is a ` ^topic-xxxxxxxx` token at the end of a line. Only the
//! first line of a topic carries one.

pub mod codec;
pub mod reconcile;
