//! Watches the configuration file for changes and emits reload events.
//! Supplemental ambient tooling (not named in the distilled spec, carried
//! because the teacher's configuration stack always exposes it).

use std::path::{Path, PathBuf};

use notify::{EventKind as NotifyEventKind, RecommendedWatcher, RecursiveMode, Watcher};

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigReloadEvent {
    Ready,
    Changed(PathBuf),
    Removed(PathBuf),
    Error { path: PathBuf, error: String },
}

/// Spawns a filesystem watcher on `config_path` and returns the receiving
/// half of a channel fed by it. The returned sender keeps the watcher task
/// alive for as long as it (or a clone) is held; drop it to stop watching.
pub async fn watch(
    config_path: &Path,
) -> Result<
    (
        tokio::sync::mpsc::Sender<ConfigReloadEvent>,
        tokio::sync::mpsc::Receiver<ConfigReloadEvent>,
    ),
    std::io::Error,
> {
    if !config_path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("config file not found: {}", config_path.display()),
        ));
    }

    let (tx, rx) = tokio::sync::mpsc::channel(100);
    let tx_task = tx.clone();
    let path_task = config_path.to_path_buf();

    let (notify_tx, mut notify_rx) = tokio::sync::mpsc::channel(100);
    let mut watcher: RecommendedWatcher =
        notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            let _ = notify_tx.blocking_send(res);
        })
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    watcher
        .watch(config_path, RecursiveMode::NonRecursive)
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    tokio::spawn(async move {
        let _watcher = watcher;
        let _ = tx_task.send(ConfigReloadEvent::Ready).await;
        while let Some(res) = notify_rx.recv().await {
            let event = match res {
                Ok(event) => match event.kind {
                    NotifyEventKind::Modify(_) => ConfigReloadEvent::Changed(path_task.clone()),
                    NotifyEventKind::Remove(_) => ConfigReloadEvent::Removed(path_task.clone()),
                    _ => continue,
                },
                Err(e) => ConfigReloadEvent::Error {
                    path: path_task.clone(),
                    error: e.to_string(),
                },
            };
            if tx_task.send(event).await.is_err() {
                break;
            }
        }
    });

    Ok((tx, rx))
}
