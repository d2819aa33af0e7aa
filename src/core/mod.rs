//! Core module - Contains the fundamental data structures and utilities
//!
//! This module provides:
//! - Error taxonomy (TopicError)
//! - Unified result model (ResultItem)
//! - Rendering functions for different output formats
//! - Path normalization utilities
//! - Line-oriented document text
//! - Common utilities

pub mod error;
pub mod model;
pub mod paths;
pub mod render;
pub mod text;
pub mod util;
