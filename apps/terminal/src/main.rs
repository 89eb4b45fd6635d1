//! # Tally Register Entry Point
//!
//! ```text
//! stdin ──► lines ──┐
//!                   ├──► Register ──► one JSON reply per line ──► stdout
//! scanner device ───┘        │
//!   (key bursts)             ├──► tally-core (cart, discounts, tax)
//!                            ├──► tally-db   (drafts, settings)
//!                            └──► back office (catalog, customers, sales)
//! ```
//!
//! Logs go to stderr. The actual setup is in lib.rs.

#[tokio::main]
async fn main() {
    if let Err(e) = tally_terminal::run().await {
        eprintln!("tally-terminal: {}", e);
        std::process::exit(1);
    }
}
