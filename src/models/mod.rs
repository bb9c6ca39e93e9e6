pub mod auth;
pub mod entry;
pub mod ledger;
pub mod merge;
pub mod sync;

pub use auth::UserInfo;
pub use entry::{CodeEntry, EntryStatus};
pub use ledger::{LedgerError, WeekLedger};
pub use merge::{reconcile, MergeStrategy};
pub use sync::{AppFailure, SyncEvent, SyncOperation, SyncStatus, WeekDocument};
