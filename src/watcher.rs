//! Dev-time watcher: regenerate the sidebar and restart the dev server when
//! the content tree changes.
//!
//! ## State machine
//!
//! ```text
//!            mark_ready()
//! Scanning ─────────────→ Ready ──event in scope──→ Ready (deadline = now + window)
//!    ↑                                                   │
//!    └──────────── poll(now ≥ deadline): restart ────────┘
//! ```
//!
//! Events seen while `Scanning` are ignored, which keeps the initial bulk
//! scan (and the restart itself) from triggering restart storms. Each
//! qualifying event pushes the single pending deadline out by the debounce
//! window, so a burst of saves produces one restart.
//!
//! [`Debouncer`] is pure and driven by explicit [`Instant`]s; [`watch`] wires
//! it to a `notify` watcher and a child process.

use crate::config::{self, ConfigError, ProjectPaths};
use crate::metadata::Visibility;
use crate::sidebar::{self, SidebarError};
use notify::event::{CreateKind, RemoveKind};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::process::{Child, Command};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// How long the loop sleeps when no restart is pending.
const IDLE_TIMEOUT: Duration = Duration::from_secs(3600);

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("watch error: {0}")]
    Notify(#[from] notify::Error),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("sidebar error: {0}")]
    Sidebar(#[from] SidebarError),
}

/// A filesystem change, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsEvent {
    Added(PathBuf),
    Changed(PathBuf),
    Removed(PathBuf),
    DirAdded(PathBuf),
    DirRemoved(PathBuf),
}

impl FsEvent {
    pub fn path(&self) -> &Path {
        match self {
            FsEvent::Added(p)
            | FsEvent::Changed(p)
            | FsEvent::Removed(p)
            | FsEvent::DirAdded(p)
            | FsEvent::DirRemoved(p) => p,
        }
    }

    /// Translate a `notify` event. Access and unclassified events map to
    /// nothing.
    pub fn from_notify(event: &Event) -> Vec<FsEvent> {
        let tag: fn(PathBuf) -> FsEvent = match event.kind {
            EventKind::Create(CreateKind::Folder) => FsEvent::DirAdded,
            EventKind::Create(_) => FsEvent::Added,
            EventKind::Modify(_) => FsEvent::Changed,
            EventKind::Remove(RemoveKind::Folder) => FsEvent::DirRemoved,
            EventKind::Remove(_) => FsEvent::Removed,
            EventKind::Access(_) | EventKind::Any | EventKind::Other => return Vec::new(),
        };
        event.paths.iter().cloned().map(tag).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Scanning,
    Ready,
}

/// Which paths can trigger a restart: anything inside the content tree, and
/// the config file.
#[derive(Debug, Clone)]
pub struct WatchScope {
    content_root: String,
    config_file: String,
}

impl WatchScope {
    pub fn new(content_root: &Path, config_file: &Path) -> Self {
        Self {
            content_root: comparable(content_root),
            config_file: comparable(config_file),
        }
    }

    pub fn contains(&self, path: &Path) -> bool {
        let path = comparable(path);
        path == self.config_file
            || path == self.content_root
            || path
                .strip_prefix(&self.content_root)
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

/// Absolute, forward-slashed, lowercased form of a path for comparison.
fn comparable(path: &Path) -> String {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    absolute
        .to_string_lossy()
        .replace('\\', "/")
        .trim_end_matches('/')
        .to_lowercase()
}

/// The debounce/restart state machine.
#[derive(Debug)]
pub struct Debouncer {
    scope: WatchScope,
    window: Duration,
    phase: Phase,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(scope: WatchScope, window: Duration) -> Self {
        Self {
            scope,
            window,
            phase: Phase::Scanning,
            deadline: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The initial scan (or a restart) finished; start reacting to events.
    pub fn mark_ready(&mut self) {
        self.phase = Phase::Ready;
        self.deadline = None;
    }

    /// Feed one event. Returns whether it (re)armed the restart deadline.
    pub fn dispatch(&mut self, event: &FsEvent, now: Instant) -> bool {
        if self.phase != Phase::Ready || !self.scope.contains(event.path()) {
            return false;
        }
        debug!(event = ?event, "change detected");
        self.deadline = Some(now + self.window);
        true
    }

    /// Whether a restart is due at `now`. Firing returns to `Scanning`.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if self.phase == Phase::Ready && now >= deadline => {
                self.deadline = None;
                self.phase = Phase::Scanning;
                true
            }
            _ => false,
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

/// What a restart does: regenerate the sidebar and cycle the dev server.
pub struct DevSession {
    project_root: PathBuf,
    config_file: PathBuf,
    visibility: Visibility,
    command: Vec<String>,
    child: Option<Child>,
}

impl DevSession {
    pub fn new(
        project_root: &Path,
        config_file: &Path,
        visibility: Visibility,
        command: Vec<String>,
    ) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            config_file: config_file.to_path_buf(),
            visibility,
            command,
            child: None,
        }
    }

    /// Rebuild the sidebar from a fresh config load and write it out.
    pub fn regenerate(&self) -> Result<usize, WatchError> {
        let config = config::load_config(&self.project_root.join(&self.config_file))?;
        let paths = ProjectPaths::resolve(&config, &self.project_root, &self.config_file);
        let items = sidebar::build_sidebar(&config, &paths, self.visibility);
        sidebar::write_sidebar(&items, &paths.sidebar_output)?;
        Ok(items.len())
    }

    /// Stop the child (if any), regenerate, and start the child again.
    pub fn restart(&mut self) -> Result<(), WatchError> {
        self.stop_child();
        let regenerated = self.regenerate();
        self.spawn_child()?;
        let sections = regenerated?;
        info!(sections, "sidebar regenerated");
        Ok(())
    }

    fn spawn_child(&mut self) -> Result<(), WatchError> {
        let Some((program, args)) = self.command.split_first() else {
            return Ok(());
        };
        let child = Command::new(program)
            .args(args)
            .current_dir(&self.project_root)
            .spawn()?;
        info!(pid = child.id(), command = %self.command.join(" "), "started dev server");
        self.child = Some(child);
        Ok(())
    }

    fn stop_child(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                debug!(error = %e, "dev server already exited");
            }
            if let Err(e) = child.wait() {
                debug!(error = %e, "could not reap dev server");
            }
        }
    }
}

impl Drop for DevSession {
    fn drop(&mut self) {
        self.stop_child();
    }
}

/// Directories handed to `notify`: the content tree, plus the directory
/// holding the config file so a save that replaces the file is still seen.
/// [`WatchScope`] filters out the directory's other entries.
fn watch_targets(paths: &ProjectPaths) -> Vec<(PathBuf, RecursiveMode)> {
    let mut targets = vec![(paths.content_root.clone(), RecursiveMode::Recursive)];
    let content = WatchScope::new(&paths.content_root, &paths.config_file);
    let config_dir = paths
        .config_file
        .parent()
        .filter(|dir| dir.is_dir() && !content.contains(dir));
    if let Some(dir) = config_dir {
        targets.push((dir.to_path_buf(), RecursiveMode::NonRecursive));
    }
    targets
}

/// Run the watcher until the event channel closes.
///
/// Restart failures are logged and never end the loop.
pub fn watch(
    paths: &ProjectPaths,
    window: Duration,
    mut session: DevSession,
) -> Result<(), WatchError> {
    let (tx, rx) = mpsc::channel::<notify::Result<Event>>();
    let mut watcher = notify::recommended_watcher(tx)?;
    for (path, mode) in watch_targets(paths) {
        watcher.watch(&path, mode)?;
    }

    let mut debouncer = Debouncer::new(
        WatchScope::new(&paths.content_root, &paths.config_file),
        window,
    );
    if let Err(e) = session.restart() {
        warn!(error = %e, "initial build failed");
    }
    while rx.try_recv().is_ok() {}
    debouncer.mark_ready();
    info!(root = %paths.content_root.display(), "watching for changes");

    loop {
        let timeout = debouncer
            .next_deadline()
            .map(|d| d.saturating_duration_since(Instant::now()))
            .unwrap_or(IDLE_TIMEOUT);
        match rx.recv_timeout(timeout) {
            Ok(Ok(event)) => {
                let now = Instant::now();
                for fs_event in FsEvent::from_notify(&event) {
                    debouncer.dispatch(&fs_event, now);
                }
            }
            Ok(Err(e)) => warn!(error = %e, "watch error"),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if debouncer.poll(Instant::now()) {
            info!("content changed, restarting");
            if let Err(e) = session.restart() {
                warn!(error = %e, "restart failed");
            }
            while rx.try_recv().is_ok() {}
            debouncer.mark_ready();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, DataChange, ModifyKind};
    use tempfile::TempDir;

    const WINDOW: Duration = Duration::from_millis(200);

    fn scope(root: &Path) -> WatchScope {
        WatchScope::new(&root.join("src/content/docs"), &root.join("docs-nav.toml"))
    }

    fn ready(root: &Path) -> Debouncer {
        let mut d = Debouncer::new(scope(root), WINDOW);
        d.mark_ready();
        d
    }

    fn changed(root: &Path, rel: &str) -> FsEvent {
        FsEvent::Changed(root.join(rel))
    }

    // =========================================================================
    // Scope
    // =========================================================================

    #[test]
    fn scope_covers_content_tree_and_config() {
        let tmp = TempDir::new().unwrap();
        let s = scope(tmp.path());
        assert!(s.contains(&tmp.path().join("src/content/docs")));
        assert!(s.contains(&tmp.path().join("src/content/docs/guides/setup.md")));
        assert!(s.contains(&tmp.path().join("docs-nav.toml")));
        assert!(!s.contains(&tmp.path().join("src/content/docs2/x.md")));
        assert!(!s.contains(&tmp.path().join("src/pages/index.astro")));
        assert!(!s.contains(&tmp.path().join("other.toml")));
    }

    #[test]
    fn scope_ignores_case_and_separators() {
        let tmp = TempDir::new().unwrap();
        let s = scope(tmp.path());
        let upper = tmp.path().join("SRC/Content/Docs/Guides/setup.md");
        assert!(s.contains(&upper));
    }

    // =========================================================================
    // Debouncer
    // =========================================================================

    #[test]
    fn events_while_scanning_are_ignored() {
        let tmp = TempDir::new().unwrap();
        let mut d = Debouncer::new(scope(tmp.path()), WINDOW);
        let t0 = Instant::now();
        assert!(!d.dispatch(&changed(tmp.path(), "src/content/docs/a.md"), t0));
        assert_eq!(d.next_deadline(), None);
        assert!(!d.poll(t0 + WINDOW * 10));
    }

    #[test]
    fn single_event_restarts_after_window() {
        let tmp = TempDir::new().unwrap();
        let mut d = ready(tmp.path());
        let t0 = Instant::now();
        assert!(d.dispatch(&changed(tmp.path(), "src/content/docs/a.md"), t0));
        assert!(!d.poll(t0 + WINDOW / 2));
        assert!(d.poll(t0 + WINDOW));
        assert_eq!(d.phase(), Phase::Scanning);
        assert!(!d.poll(t0 + WINDOW * 2));
    }

    #[test]
    fn burst_of_events_restarts_once() {
        let tmp = TempDir::new().unwrap();
        let mut d = ready(tmp.path());
        let t0 = Instant::now();
        let step = Duration::from_millis(50);
        for i in 0..5 {
            d.dispatch(&changed(tmp.path(), "src/content/docs/a.md"), t0 + step * i);
            assert!(!d.poll(t0 + step * i + step));
        }
        let last = t0 + step * 4;
        assert_eq!(d.next_deadline(), Some(last + WINDOW));
        assert!(!d.poll(last + WINDOW - Duration::from_millis(1)));
        assert!(d.poll(last + WINDOW));
        assert!(!d.poll(last + WINDOW * 3));
    }

    #[test]
    fn events_outside_scope_are_ignored() {
        let tmp = TempDir::new().unwrap();
        let mut d = ready(tmp.path());
        let t0 = Instant::now();
        assert!(!d.dispatch(&changed(tmp.path(), "src/pages/index.astro"), t0));
        assert!(!d.poll(t0 + WINDOW));
    }

    #[test]
    fn every_event_kind_in_scope_triggers() {
        let tmp = TempDir::new().unwrap();
        let p = tmp.path().join("src/content/docs/new");
        for event in [
            FsEvent::Added(p.clone()),
            FsEvent::Changed(p.clone()),
            FsEvent::Removed(p.clone()),
            FsEvent::DirAdded(p.clone()),
            FsEvent::DirRemoved(p.clone()),
        ] {
            let mut d = ready(tmp.path());
            assert!(d.dispatch(&event, Instant::now()), "{event:?}");
        }
    }

    #[test]
    fn config_change_triggers_restart() {
        let tmp = TempDir::new().unwrap();
        let mut d = ready(tmp.path());
        let t0 = Instant::now();
        assert!(d.dispatch(&changed(tmp.path(), "docs-nav.toml"), t0));
        assert!(d.poll(t0 + WINDOW));
    }

    #[test]
    fn ready_again_after_restart() {
        let tmp = TempDir::new().unwrap();
        let mut d = ready(tmp.path());
        let t0 = Instant::now();
        d.dispatch(&changed(tmp.path(), "src/content/docs/a.md"), t0);
        assert!(d.poll(t0 + WINDOW));
        assert!(!d.dispatch(&changed(tmp.path(), "src/content/docs/a.md"), t0 + WINDOW));
        d.mark_ready();
        assert!(d.dispatch(&changed(tmp.path(), "src/content/docs/a.md"), t0 + WINDOW * 2));
        assert!(d.poll(t0 + WINDOW * 3));
    }

    // =========================================================================
    // notify mapping
    // =========================================================================

    #[test]
    fn notify_kinds_map_to_tagged_events() {
        let p = PathBuf::from("/site/src/content/docs/x");
        let cases = [
            (EventKind::Create(CreateKind::Folder), Some(FsEvent::DirAdded(p.clone()))),
            (EventKind::Create(CreateKind::File), Some(FsEvent::Added(p.clone()))),
            (
                EventKind::Modify(ModifyKind::Data(DataChange::Content)),
                Some(FsEvent::Changed(p.clone())),
            ),
            (EventKind::Remove(RemoveKind::Folder), Some(FsEvent::DirRemoved(p.clone()))),
            (EventKind::Remove(RemoveKind::File), Some(FsEvent::Removed(p.clone()))),
            (EventKind::Access(AccessKind::Any), None),
            (EventKind::Any, None),
        ];
        for (kind, expected) in cases {
            let event = Event::new(kind).add_path(p.clone());
            assert_eq!(FsEvent::from_notify(&event), expected.into_iter().collect::<Vec<_>>());
        }
    }

    #[test]
    fn notify_event_with_several_paths() {
        let event = Event::new(EventKind::Modify(ModifyKind::Any))
            .add_path(PathBuf::from("/a"))
            .add_path(PathBuf::from("/b"));
        assert_eq!(
            FsEvent::from_notify(&event),
            vec![
                FsEvent::Changed(PathBuf::from("/a")),
                FsEvent::Changed(PathBuf::from("/b"))
            ]
        );
    }

    // =========================================================================
    // Watch targets
    // =========================================================================

    #[test]
    fn config_directory_is_watched_instead_of_config_file() {
        let tmp = TempDir::new().unwrap();
        let paths = ProjectPaths::resolve(
            &config::SiteConfig::default(),
            tmp.path(),
            Path::new(config::CONFIG_FILENAME),
        );
        assert_eq!(
            watch_targets(&paths),
            vec![
                (tmp.path().join("src/content/docs"), RecursiveMode::Recursive),
                (tmp.path().to_path_buf(), RecursiveMode::NonRecursive),
            ]
        );
    }

    #[test]
    fn config_inside_content_tree_adds_no_watch() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("src/content/docs/settings");
        std::fs::create_dir_all(&nested).unwrap();
        let paths = ProjectPaths::resolve(
            &config::SiteConfig::default(),
            tmp.path(),
            Path::new("src/content/docs/settings/docs-nav.toml"),
        );
        assert_eq!(
            watch_targets(&paths),
            vec![(tmp.path().join("src/content/docs"), RecursiveMode::Recursive)]
        );
    }

    #[test]
    fn replaced_config_file_still_triggers_restart() {
        let tmp = TempDir::new().unwrap();
        let mut d = ready(tmp.path());
        let t0 = Instant::now();
        let config = tmp.path().join("docs-nav.toml");
        assert!(d.dispatch(&FsEvent::Removed(config.clone()), t0));
        assert!(d.dispatch(&FsEvent::Added(config), t0));
        assert!(!d.dispatch(&FsEvent::Added(tmp.path().join("docs-nav.toml.swp")), t0));
        assert!(d.poll(t0 + WINDOW));
    }

    // =========================================================================
    // Session
    // =========================================================================

    #[test]
    fn regenerate_writes_sidebar_json() {
        let tmp = TempDir::new().unwrap();
        let doc = tmp.path().join("src/content/docs/guides/setup.md");
        std::fs::create_dir_all(doc.parent().unwrap()).unwrap();
        std::fs::write(&doc, "---\ntitle: Setup\n---\n").unwrap();

        let session = DevSession::new(
            tmp.path(),
            Path::new(config::CONFIG_FILENAME),
            Visibility::default(),
            Vec::new(),
        );
        assert_eq!(session.regenerate().unwrap(), 1);
        let written = std::fs::read_to_string(tmp.path().join(".docs-nav/sidebar.json")).unwrap();
        assert!(written.contains("\"guides/setup\""));
    }

    #[test]
    fn restart_without_command_only_regenerates() {
        let tmp = TempDir::new().unwrap();
        let mut session = DevSession::new(
            tmp.path(),
            Path::new(config::CONFIG_FILENAME),
            Visibility::default(),
            Vec::new(),
        );
        session.restart().unwrap();
        assert!(tmp.path().join(".docs-nav/sidebar.json").is_file());
    }

    #[test]
    fn broken_config_fails_regeneration() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("docs-nav.toml"), "content_root = [").unwrap();
        let session = DevSession::new(
            tmp.path(),
            Path::new(config::CONFIG_FILENAME),
            Visibility::default(),
            Vec::new(),
        );
        assert!(matches!(session.regenerate(), Err(WatchError::Config(_))));
    }
}
