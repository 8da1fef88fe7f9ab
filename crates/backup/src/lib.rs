//! Backup recovery points as rows.
//!
//! [`RecoveryPointTable`] plugs the backup service into the
//! [`vaultrow_hydrate`] pipeline: regions are the scopes, backup vaults the
//! parents and recovery points the rows. The service itself sits behind
//! [`api::BackupApi`], with an AWS SDK implementation (`aws` feature) and an
//! in-memory one (`mock` feature).
//!
//! ```no_run
//! # #[cfg(feature = "aws")]
//! # async fn example() {
//! use futures::StreamExt;
//! use vaultrow_backup::api::{AwsSessions, Credentials};
//! use vaultrow_backup::{RecoveryPointTable, RowExt};
//! use vaultrow_config::Config;
//! use vaultrow_hydrate::Request;
//!
//! let config = Config::load(None).expect("valid configuration");
//! let credentials = Credentials::new("key_id", "key_secret", None, None, "vaultrow");
//! let table = RecoveryPointTable::new(AwsSessions::new(credentials, config.aws.clone()));
//! let mut rows = table.query(&config).stream(Request::Scan);
//! while let Some(row) = rows.next().await {
//!     match row {
//!         Ok(row) => println!("{:?}", row.values()),
//!         Err(err) => eprintln!("{err:?}"),
//!     }
//! }
//! # }
//! ```

pub mod api;
mod columns;
mod models;
mod table;

pub use crate::columns::{COLUMNS, Column, ColumnType, RowExt, column, column_values};
pub use crate::models::{
    CalculatedLifecycle, Lifecycle, RecoveryPoint, RecoveryPointCreator, RecoveryPointDetail, RecoveryPointKey,
    RecoveryPointStatus, RecoveryPointSummary, StorageClass, Vault,
};
pub use crate::table::{RecoveryPointTable, TABLE_NAME};
