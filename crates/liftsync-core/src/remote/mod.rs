//! Remote table gateway.
//!
//! [`RemoteTable`] is the seam between the sync logic and the spreadsheet
//! service; [`SheetsGateway`] talks to the Google Sheets `values` API and
//! [`LogTables`] layers date matching and the row codec on top.

pub mod sheets;
pub mod tables;
pub mod token;

pub use sheets::SheetsGateway;
pub use tables::LogTables;
pub use token::{StoredTokenProvider, TokenProvider};

use async_trait::async_trait;

use crate::codec::{CellWrite, Grid};
use crate::error::Result;

/// Authenticated positional access to the remote store.
///
/// Implementations raise [`SyncError::Auth`](crate::SyncError::Auth) when no
/// usable token exists and [`SyncError::Remote`](crate::SyncError::Remote) on
/// transport failure or a non-success response. They never touch the local
/// cache.
#[async_trait]
pub trait RemoteTable: Send + Sync {
    /// Read a range as rows of strings. Short rows are not padded.
    async fn read(&self, range: &str) -> Result<Grid>;

    /// Best-effort single-cell write.
    async fn write_cell(&self, range: &str, value: &str) -> Result<()>;

    /// All writes in one round trip. An error means none of them may be
    /// assumed applied.
    async fn batch_write(&self, writes: &[CellWrite]) -> Result<()>;

    /// Insert rows after the last row of the table named by `range_prefix`.
    async fn append(&self, range_prefix: &str, rows: &[Vec<String>]) -> Result<()>;
}
