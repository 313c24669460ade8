//! One-way export of feedback records to a Google Sheets spreadsheet.
//!
//! [`SheetsExporter`] owns the sync rules and talks to the remote
//! spreadsheet only through the [`SheetStore`] trait. Production wires in
//! [`GoogleSheetsClient`]; tests use [`MemorySheetStore`].

pub mod error;
pub mod exporter;
pub mod google;
pub mod memory;
pub mod store;

pub use error::SheetsError;
pub use exporter::{SheetsExporter, SyncSummary};
pub use google::GoogleSheetsClient;
pub use memory::MemorySheetStore;
pub use store::SheetStore;
