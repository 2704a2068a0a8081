//! # Scanner Module
//!
//! Lazily discovers candidate image files under a root directory.
//!
//! ## Supported Formats
//! Any extension can be configured; the default list covers common raster
//! formats (jpg, jpeg, png, gif, tif, tiff, bmp, webp). Matching is
//! case-insensitive on the trailing extension only.
//!
//! ## Example
//! ```rust,ignore
//! use image_dupe_finder::core::scanner::crawl;
//!
//! for path in crawl("/Users/photos", None)? {
//!     println!("{}", path.display());
//! }
//! ```

mod filter;
mod walker;

pub use filter::{ExtensionFilter, DEFAULT_EXTENSIONS};
pub use walker::{crawl, Crawler, ScanConfig};

use std::path::PathBuf;

/// A discovered file waiting to be fingerprinted.
///
/// Ownership moves to the worker that reads it.
pub type FileCandidate = PathBuf;
