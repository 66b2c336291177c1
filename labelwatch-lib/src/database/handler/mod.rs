//! Database table handlers.
//!
//! All tables can be further inspected in the `migrations/2023-07-01-120000_labelwatch_database/up.sql` or
//! `schema.rs` file.

pub mod bitcoinabuse_address;
pub mod chainabuse_report;
pub mod walletexplorer_label;
