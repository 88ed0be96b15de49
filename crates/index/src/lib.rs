//! Key-value projection of a package registry.
//!
//! Publishing a version writes three kinds of data to a remote key-value
//! store that limits both single values and whole bulk requests:
//!
//! - **File blobs** under `<package>/<version>/<file>`.
//! - **Index documents**: the root list of packages (`/`), the versions of
//!   each package (`<package>`) and the files of each version
//!   (`<package>/<version>`).
//! - **Aggregated metadata**: one gzipped descriptor per package listing the
//!   files of every ingested version.
//!
//! Every write goes through [`BulkWriter`], which packs items into bulk
//! requests that respect the configured [`Limits`](pkgkv_config::Limits).
//! [`ingest_version`] runs the full sequence for one version and
//! [`ingest_all`] runs many versions on a bounded worker pool.

mod aggregate;
mod batch;
pub mod encode;
pub mod error;
mod event;
mod files;
mod ingest;
pub mod models;
mod purge;
mod records;
mod sorted;

pub use crate::aggregate::{AggregateOutcome, merge_aggregated, read_aggregated, update_aggregated_metadata};
pub use crate::batch::{Batch, BulkWriter, WriteItem, plan_batches};
pub use crate::event::VersionEvent;
pub use crate::files::{VersionFile, load_version_dir, sri};
pub use crate::ingest::{IngestEvent, IngestOutcome, VersionJob, ingest_all, ingest_version};
pub use crate::purge::purge_namespace;
pub use crate::records::{ROOT_KEY, RecordSet, build_records_for_version};
pub use crate::sorted::insert_if_absent;
