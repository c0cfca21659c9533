//! Change watcher for the controller script file.

use std::ffi::OsString;
use std::path::Path;
use std::sync::mpsc::{self, Receiver};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

/// Watches the directory containing the controller script and answers, once
/// per poll, whether that exact file changed since the last check.
///
/// This is a level signal: however many events queued up between polls,
/// one poll reports one `true`. Events for sibling files are ignored.
pub struct ScriptWatcher {
    // Held for the lifetime of the subscription; events arrive through `rx`.
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    file_name: OsString,
}

impl ScriptWatcher {
    /// Subscribe to changes in `script_path`'s parent directory.
    ///
    /// Failure here (unreadable directory, watch limit exhausted) is fatal
    /// for controller construction; there is no retry.
    pub fn watch(script_path: &Path) -> Result<Self, notify::Error> {
        let file_name = script_path
            .file_name()
            .ok_or_else(|| notify::Error::generic("script path has no file name"))?
            .to_os_string();

        // A bare file name has an empty parent; watch the cwd then.
        let dir = match script_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(tx)?;
        watcher.watch(dir, RecursiveMode::NonRecursive)?;

        Ok(Self {
            _watcher: watcher,
            rx,
            file_name,
        })
    }

    /// Drain every queued event without blocking. True if any of them was a
    /// create, write, or rename landing on the watched file name.
    pub fn poll_changed(&self) -> bool {
        let mut changed = false;
        while let Ok(res) = self.rx.try_recv() {
            let event = match res {
                Ok(event) => event,
                Err(err) => {
                    tracing::warn!("script watch error: {err}");
                    continue;
                }
            };
            if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                continue;
            }
            if event
                .paths
                .iter()
                .any(|p| p.file_name().is_some_and(|n| n == self.file_name))
            {
                changed = true;
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    /// Filesystem events are asynchronous; poll with a bounded retry.
    fn poll_until_changed(watcher: &ScriptWatcher) -> bool {
        for _ in 0..100 {
            if watcher.poll_changed() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        false
    }

    #[test]
    fn quiet_directory_polls_false() {
        let tmp = tempfile::tempdir().unwrap();
        let script = tmp.path().join("camera.lua");
        std::fs::write(&script, "-- controller").unwrap();

        let watcher = ScriptWatcher::watch(&script).unwrap();
        assert!(!watcher.poll_changed());
    }

    #[test]
    fn write_is_reported_once() {
        let tmp = tempfile::tempdir().unwrap();
        let script = tmp.path().join("camera.lua");
        std::fs::write(&script, "-- v1").unwrap();

        let watcher = ScriptWatcher::watch(&script).unwrap();
        std::fs::write(&script, "-- v2").unwrap();
        std::fs::write(&script, "-- v3").unwrap();

        // Both writes coalesce into a single positive poll.
        assert!(poll_until_changed(&watcher));

        // Once stragglers from the burst are drained, the signal stays low.
        std::thread::sleep(Duration::from_millis(300));
        watcher.poll_changed();
        assert!(!watcher.poll_changed());
    }

    #[test]
    fn sibling_files_are_ignored() {
        let tmp = tempfile::tempdir().unwrap();
        let script = tmp.path().join("camera.lua");
        std::fs::write(&script, "-- controller").unwrap();

        let watcher = ScriptWatcher::watch(&script).unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "unrelated").unwrap();

        std::thread::sleep(Duration::from_millis(300));
        assert!(!watcher.poll_changed());
    }

    #[test]
    fn missing_directory_fails_subscription() {
        let script = Path::new("/definitely/not/a/real/dir/camera.lua");
        assert!(ScriptWatcher::watch(script).is_err());
    }
}
