//! Publishing whole versions: index records, file blobs and aggregated
//! metadata, in that order.

mod stream;

pub use self::stream::{IngestEvent, ingest_all};
use crate::aggregate::prepare_aggregated;
use crate::batch::BulkWriter;
use crate::error::{ErrorKind, Result};
use crate::event::VersionEvent;
use crate::files::VersionFile;
use crate::models::Package;
use crate::records::build_records_for_version;
use pkgkv_config::Config;
use pkgkv_store::StoreHandle;
use tracing::instrument;

/// One version to publish.
#[derive(Debug, Clone)]
pub struct VersionJob {
    /// Package descriptor; its `name` is the package key.
    pub descriptor: Package,
    pub version: String,
    pub files: Vec<VersionFile>,
}
impl VersionJob {
    pub fn new(descriptor: Package, version: impl Into<String>, files: Vec<VersionFile>) -> Self {
        Self { descriptor, version: version.into(), files }
    }

    /// Job for a decoded notification and the files it points at.
    pub fn from_event(event: VersionEvent, files: Vec<VersionFile>) -> Self {
        Self { descriptor: event.config, version: event.version, files }
    }

    pub fn package(&self) -> &str {
        &self.descriptor.name
    }
}

/// Result of publishing one version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOutcome {
    /// Every key written, file and index keys first, aggregated key last.
    pub written: Vec<String>,
    /// Whether the package already had aggregated metadata.
    pub found: bool,
}

/// Publish one version.
///
/// Steps run strictly in order and the first failure stops the job: nothing
/// is written if building the records fails, and aggregated metadata is
/// only touched once every file and index key has been written.
///
/// Any failure is reported as [`Ingest`](ErrorKind::Ingest), carrying the
/// keys that were already written and, if it got that far, whether
/// aggregated metadata existed.
#[instrument(skip(store, config, job), fields(package = job.package(), version = %job.version, files = job.files.len()))]
pub async fn ingest_version(store: &StoreHandle, config: &Config, job: VersionJob) -> Result<IngestOutcome> {
    let mut written = Vec::new();
    let mut found = None;
    match publish(store, config, &job, &mut written, &mut found).await {
        Ok(existed) => {
            tracing::info!(keys = written.len(), found = existed, "Version ingested");
            Ok(IngestOutcome { written, found: existed })
        },
        Err(e) => {
            tracing::warn!(keys = written.len(), "Version ingest stopped");
            let package = job.package().to_string();
            Err(e.raise(ErrorKind::Ingest { package, version: job.version, written, found }))
        },
    }
}

/// The steps of [`ingest_version`], recording progress in `written` and
/// `found` as they go.
async fn publish(
    store: &StoreHandle,
    config: &Config,
    job: &VersionJob,
    written: &mut Vec<String>,
    found: &mut Option<bool>,
) -> Result<bool> {
    let records = build_records_for_version(store, config, job.package(), &job.version, &job.files).await?;
    let asset = records.asset(&job.version);
    let namespaces = &config.namespaces;
    if namespaces.files == namespaces.index {
        BulkWriter::new(store, &namespaces.files, config.limits).write_into(records.into_items(), written).await?;
    } else {
        BulkWriter::new(store, &namespaces.files, config.limits).write_into(records.files, written).await?;
        BulkWriter::new(store, &namespaces.index, config.limits).write_into(records.index, written).await?;
    }
    let (item, existed) = prepare_aggregated(store, config, &job.descriptor, &job.version, asset).await?;
    *found = Some(existed);
    BulkWriter::new(store, &namespaces.aggregated, config.limits).write_into(vec![item], written).await?;
    Ok(existed)
}
