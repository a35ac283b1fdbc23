//! Watch command: run the file watcher until interrupted.

use std::sync::Arc;

use tokio::sync::Mutex;

use super::Workspace;
use crate::notifications::{NotificationBroadcaster, TrackerEvent};
use crate::tracking::RangeTracker;
use crate::watcher::AnnotationWatcher;

pub async fn run_watch(workspace: &Workspace) -> anyhow::Result<()> {
    let store = workspace.open_store()?;
    let broadcaster = NotificationBroadcaster::default();
    let mut events = broadcaster.subscribe();

    let tracker = Arc::new(Mutex::new(
        RangeTracker::new(store).with_broadcaster(broadcaster),
    ));

    let watcher = AnnotationWatcher::builder()
        .tracker(tracker)
        .workspace_root(workspace.documents.root().to_path_buf())
        .store_path(workspace.settings.resolved_store_path())
        .debounce_ms(workspace.settings.tracking.debounce_ms)
        .build()?;

    println!(
        "Watching annotated files under {} (Ctrl-C to stop)",
        workspace.documents.root().display()
    );

    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                TrackerEvent::AnnotationsChanged { path } => {
                    println!("updated {}", path.display());
                }
                TrackerEvent::PathRenamed { old, new } => {
                    println!("renamed {} -> {}", old.display(), new.display());
                }
                TrackerEvent::StoreReloaded => println!("reloaded annotations"),
            }
        }
    });

    let result = tokio::select! {
        result = watcher.watch() => result.map_err(anyhow::Error::from),
        signal = tokio::signal::ctrl_c() => {
            signal?;
            println!("Stopped.");
            Ok(())
        }
    };

    printer.abort();
    result
}
