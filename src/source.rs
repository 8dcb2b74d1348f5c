//! Push sources. A `SnapshotSource` is a long-lived subscription to one logical collection that
//! publishes the collection's full value every time it changes.
//!
//! Note: `StaticSource` is compiled even in the "production" version of this crate so that the
//! whole pipeline can be run without any files.

use crate::multiplexer::Publisher;
use crate::snapshot::{Snapshots, SourceKey};
use crate::{Config, Result};
use anyhow::Context;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// A subscription to one collection.
#[async_trait::async_trait]
pub trait SnapshotSource: Send + Sync {
    /// The collection this source publishes.
    fn key(&self) -> SourceKey;

    /// Establishes the subscription. An error here means the source could not be attached at all.
    /// On success the returned task publishes every new value through `publisher` until it ends or
    /// is aborted.
    async fn attach(self: Box<Self>, publisher: Publisher) -> Result<JoinHandle<()>>;
}

/// Watches one JSON snapshot file, publishing its parsed value whenever the file content changes.
#[derive(Debug, Clone)]
pub struct FileSource {
    key: SourceKey,
    path: PathBuf,
    interval: Duration,
}

impl FileSource {
    pub fn new(key: SourceKey, path: impl Into<PathBuf>, interval: Duration) -> Self {
        Self {
            key,
            path: path.into(),
            interval,
        }
    }

    /// One `FileSource` per source key, at the paths and poll interval of `config`.
    pub fn all(config: &Config) -> Vec<Box<dyn SnapshotSource>> {
        SourceKey::ALL
            .into_iter()
            .map(|key| {
                Box::new(FileSource::new(
                    key,
                    config.snapshot_path(key),
                    config.poll_interval(),
                )) as Box<dyn SnapshotSource>
            })
            .collect()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the file once, `None` when it does not exist.
    pub async fn read(&self) -> Result<Option<Value>> {
        match read_text(&self.path).await? {
            Some(text) => parse(&self.path, &text).map(Some),
            None => Ok(None),
        }
    }
}

/// Reads every snapshot file of `config` once. Missing files are left unreported; files that
/// cannot be read or parsed are logged and left unreported as well.
pub async fn read_snapshots(config: &Config) -> Snapshots {
    let mut snapshots = Snapshots::new();
    for key in SourceKey::ALL {
        let source = FileSource::new(key, config.snapshot_path(key), config.poll_interval());
        match source.read().await {
            Ok(Some(value)) => snapshots.apply(key, value),
            Ok(None) => trace!("No snapshot for {key} at {}", source.path().display()),
            Err(e) => warn!("Skipping {key}: {e:#}"),
        }
    }
    debug!(
        "Read {} of {} snapshot file(s)",
        snapshots.reported(),
        SourceKey::ALL.len()
    );
    snapshots
}

#[async_trait::async_trait]
impl SnapshotSource for FileSource {
    fn key(&self) -> SourceKey {
        self.key
    }

    /// A missing file is a source that has not pushed yet. A file that exists but cannot be read or
    /// parsed fails the attach.
    async fn attach(self: Box<Self>, publisher: Publisher) -> Result<JoinHandle<()>> {
        let mut last = read_text(&self.path).await?;
        if let Some(text) = &last {
            let value = parse(&self.path, text)?;
            publisher.publish(self.key, value)?;
        }
        debug!("Watching {} for {}", self.path.display(), self.key);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            // the first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let current = match read_text(&self.path).await {
                    Ok(current) => current,
                    Err(e) => {
                        warn!("{e:#}");
                        continue;
                    }
                };
                if current == last {
                    continue;
                }
                let value = match &current {
                    Some(text) => match parse(&self.path, text) {
                        Ok(value) => value,
                        Err(e) => {
                            warn!("Ignoring change to {}: {e:#}", self.path.display());
                            last = current;
                            continue;
                        }
                    },
                    // a deleted file reads as an empty collection
                    None => Value::Null,
                };
                last = current;
                trace!("{} changed", self.path.display());
                if publisher.publish(self.key, value).is_err() {
                    break;
                }
            }
        });
        Ok(handle)
    }
}

/// Reads a file, `None` if it does not exist.
async fn read_text(path: &Path) -> Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Unable to read snapshot {}", path.display())),
    }
}

fn parse(path: &Path, text: &str) -> Result<Value> {
    serde_json::from_str(text)
        .with_context(|| format!("Failed to parse snapshot {}", path.display()))
}

/// Publishes a fixed sequence of values, in order, then ends.
#[derive(Debug, Clone)]
pub struct StaticSource {
    key: SourceKey,
    values: Vec<Value>,
}

impl StaticSource {
    pub fn new(key: SourceKey, values: impl IntoIterator<Item = Value>) -> Self {
        Self {
            key,
            values: values.into_iter().collect(),
        }
    }
}

#[async_trait::async_trait]
impl SnapshotSource for StaticSource {
    fn key(&self) -> SourceKey {
        self.key
    }

    async fn attach(self: Box<Self>, publisher: Publisher) -> Result<JoinHandle<()>> {
        let key = self.key;
        let values = self.values;
        Ok(tokio::spawn(async move {
            for value in values {
                if publisher.publish(key, value).is_err() {
                    break;
                }
                tokio::task::yield_now().await;
            }
        }))
    }
}
