//! TidyDrop — keeps a download folder organized.
//!
//! Thin binary entry point. All logic lives in the `tidydrop-core`
//! and `tidydrop-cli` crates.

fn main() -> anyhow::Result<()> {
    tidydrop_cli::run()
}
