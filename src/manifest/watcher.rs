//! Manifest hot reload.
//!
//! Export pipelines usually replace `routes.json` by writing a temporary
//! file and renaming it over the old one. A watch on the file itself dies
//! with the replaced inode, so the parent directory is watched and events
//! are filtered down to the manifest's file name.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use notify::event::{EventKind, ModifyKind};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::manifest::compile::Manifest;
use crate::manifest::loader::load_manifest;

/// Recompiles the manifest whenever its file is written or replaced.
pub struct ManifestWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<Manifest>,
}

/// Whether `event` touched the file called `file_name`.
pub fn is_manifest_event(event: &Event, file_name: &OsString) -> bool {
    let relevant = match event.kind {
        EventKind::Create(_) => true,
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        _ => false,
    };
    relevant
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name.as_os_str()))
}

fn reload(path: &Path, tx: &mpsc::UnboundedSender<Manifest>) {
    match load_manifest(path) {
        Ok(manifest) => {
            tracing::info!(path = %path.display(), routes = manifest.route_count(), "Manifest recompiled");
            if tx.send(manifest).is_err() {
                tracing::debug!("Manifest receiver closed, dropping update");
            }
        }
        // Partially written files land here.
        Err(e) => tracing::error!(path = %path.display(), error = %e, "Failed to reload manifest, keeping current routes"),
    }
}

impl ManifestWatcher {
    /// Returns the watcher and a receiver for compiled manifest updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<Manifest>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. The returned handle must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let file_name = self
            .path
            .file_name()
            .map(OsString::from)
            .ok_or_else(|| notify::Error::generic("manifest path has no file name"))?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let path = self.path.clone();
        let tx = self.update_tx;
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if is_manifest_event(&event, &file_name) => reload(&path, &tx),
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Manifest watch error"),
            },
            Config::default(),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        tracing::info!(dir = %dir.display(), file = ?self.path.file_name(), "Manifest watcher started");
        Ok(watcher)
    }
}
