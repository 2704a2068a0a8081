//! # image-dedup CLI
//!
//! Command-line interface for the duplicate image finder.
//!
//! ## Usage
//! ```bash
//! image-dedup scan ~/Pictures
//! image-dedup scan ~/Pictures --verbose --output json
//! ```

mod cli;

use image_dupe_finder::Result;

fn main() -> Result<()> {
    cli::run()
}
