use super::{IngestOutcome, VersionJob, ingest_version};
use crate::error::Result;
use async_stream::stream;
use futures::stream::FuturesUnordered;
use futures::{Stream, StreamExt};
use pkgkv_config::Config;
use pkgkv_store::StoreHandle;

/// Progress events emitted by [`ingest_all`].
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started), exactly once.
/// 2. [`Queued`](Self::Queued), exactly once, with the number of jobs.
/// 3. [`Ingested`](Self::Ingested) (or an `Err` item), once per job, in
///    completion order.
/// 4. [`Complete`](Self::Complete), exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestEvent {
    Started,
    Queued(usize),
    Ingested { package: String, version: String, outcome: IngestOutcome },
    Complete,
}

/// Publish every job, running at most `config.workers` of them at a time.
///
/// Jobs share nothing but the store handle. A failed job is yielded as an
/// `Err` item ([`Ingest`](crate::error::ErrorKind::Ingest), as returned by
/// [`ingest_version`]) and the remaining jobs carry on.
pub fn ingest_all<'a>(
    store: &'a StoreHandle,
    config: &'a Config,
    jobs: Vec<VersionJob>,
) -> impl Stream<Item = Result<IngestEvent>> + 'a {
    stream!({
        yield Ok(IngestEvent::Started);
        yield Ok(IngestEvent::Queued(jobs.len()));

        let mut pending = jobs.into_iter().map(move |job| async move {
            let package = job.package().to_string();
            let version = job.version.clone();
            ingest_version(store, config, job).await.map(|outcome| IngestEvent::Ingested { package, version, outcome })
        });
        let mut processing = FuturesUnordered::new();
        processing.extend(pending.by_ref().take(config.workers));
        while let Some(result) = processing.next().await {
            yield result;
            // Promote the next job in submission order.
            if let Some(next) = pending.next() {
                processing.push(next);
            }
        }

        yield Ok(IngestEvent::Complete);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::files::VersionFile;
    use crate::models::Package;
    use futures::TryStreamExt;
    use pkgkv_config::{Limits, Namespaces};
    use pkgkv_store::backend::MockStore;
    use pkgkv_store::error::ErrorKind as StoreErrorKind;
    use std::sync::Arc;

    fn config(workers: usize) -> Config {
        let namespaces = Namespaces { files: "files".into(), index: "index".into(), aggregated: "agg".into() };
        Config::new(namespaces, Limits::default()).unwrap().with_workers(workers).unwrap()
    }

    fn job(package: &str, version: &str) -> VersionJob {
        let files = vec![VersionFile::new("index.js", format!("{package}@{version}").into_bytes()).unwrap()];
        VersionJob::new(Package::new(package), version, files)
    }

    #[tokio::test]
    async fn test_event_order() {
        let mock = Arc::new(MockStore::default());
        let store: StoreHandle = mock.clone();
        let config = config(2);
        let jobs = vec![job("foo", "1.0.0"), job("bar", "1.0.0"), job("baz", "2.0.0")];
        let events: Vec<_> = ingest_all(&store, &config, jobs).try_collect().await.unwrap();
        assert_eq!(events.len(), 6);
        assert_eq!(events[0], IngestEvent::Started);
        assert_eq!(events[1], IngestEvent::Queued(3));
        assert_eq!(events[5], IngestEvent::Complete);
        let mut ingested: Vec<_> = events[2..5]
            .iter()
            .map(|event| match event {
                IngestEvent::Ingested { package, .. } => package.as_str(),
                other => panic!("unexpected event {other:?}"),
            })
            .collect();
        ingested.sort();
        assert_eq!(ingested, ["bar", "baz", "foo"]);
        assert_eq!(mock.keys("agg").await, ["bar", "baz", "foo"]);
    }

    #[tokio::test]
    async fn test_failed_job_does_not_stop_stream() {
        let mock = MockStore::default()
            .fail_reads(|key| (key == "bad").then(|| StoreErrorKind::PermissionDenied(key.to_string())));
        let store: StoreHandle = Arc::new(mock);
        let config = config(1);
        let jobs = vec![job("bad", "1.0.0"), job("good", "1.0.0")];
        let events: Vec<_> = ingest_all(&store, &config, jobs).collect().await;
        assert_eq!(events.len(), 5);
        let err = events[2].as_ref().unwrap_err();
        assert!(matches!(
            &**err,
            ErrorKind::Ingest { package, version, written, found: None }
                if package == "bad" && version == "1.0.0" && written.is_empty()
        ));
        assert!(matches!(&events[3], Ok(IngestEvent::Ingested { package, .. }) if package == "good"));
        assert!(matches!(&events[4], Ok(IngestEvent::Complete)));
    }

    #[tokio::test]
    async fn test_no_jobs() {
        let store: StoreHandle = Arc::new(MockStore::default());
        let config = config(4);
        let events: Vec<_> = ingest_all(&store, &config, Vec::new()).try_collect().await.unwrap();
        assert_eq!(events, [IngestEvent::Started, IngestEvent::Queued(0), IngestEvent::Complete]);
    }
}
