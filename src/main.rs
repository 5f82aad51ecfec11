//! # fotofilter CLI
//!
//! Command-line front end for the photo culling library.
//!
//! ## Usage
//! ```bash
//! fotofilter import ~/Shoots/2024-06-01
//! fotofilter export ~/Shoots/2024-06-01 ~/Selects
//! ```

mod cli;

use fotofilter::Result;

fn main() -> Result<()> {
    cli::run()
}
