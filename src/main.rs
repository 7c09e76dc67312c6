//! # photo-index CLI
//!
//! Command-line front end for the photo import pipeline.
//!
//! ## Usage
//! ```bash
//! photo-index import ~/Pictures
//! photo-index list --output json
//! photo-index delete 3 7 --mode complete --with-raw
//! ```

mod cli;

use photo_indexer::Result;

fn main() -> Result<()> {
    cli::run()
}
