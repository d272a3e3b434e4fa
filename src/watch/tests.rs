use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crossbeam::channel;
use tempfile::TempDir;

use super::debouncer::{Debouncer, is_temp_file};
use super::roots::{dedupe_roots, literal_prefix};
use super::types::ChangeKind;
use super::*;
use crate::config::test_parse_config;
use crate::utils::path::normalize_path;

const DEBOUNCE: Duration = Duration::from_millis(300);
const COOLDOWN: Duration = Duration::from_millis(800);

fn debouncer() -> Debouncer {
    Debouncer::new(DEBOUNCE, COOLDOWN)
}

fn make_event(paths: Vec<&str>, kind: notify::EventKind) -> notify::Event {
    notify::Event {
        kind,
        paths: paths.into_iter().map(PathBuf::from).collect(),
        attrs: Default::default(),
    }
}

fn modify_kind() -> notify::EventKind {
    notify::EventKind::Modify(notify::event::ModifyKind::Data(
        notify::event::DataChange::Any,
    ))
}

fn metadata_kind() -> notify::EventKind {
    notify::EventKind::Modify(notify::event::ModifyKind::Metadata(
        notify::event::MetadataKind::WriteTime,
    ))
}

fn create_kind() -> notify::EventKind {
    notify::EventKind::Create(notify::event::CreateKind::File)
}

fn remove_kind() -> notify::EventKind {
    notify::EventKind::Remove(notify::event::RemoveKind::File)
}

// ============================================================================
// Debouncer
// ============================================================================

#[test]
fn test_debouncer_empty() {
    let debouncer = debouncer();
    assert!(!debouncer.is_ready());
}

#[test]
fn test_event_routing_by_kind() {
    let mut debouncer = debouncer();

    debouncer.add_event(&make_event(vec!["/nonexistent/a.less"], create_kind()));
    debouncer.add_event(&make_event(vec!["/nonexistent/b.less"], modify_kind()));
    debouncer.add_event(&make_event(vec!["/nonexistent/c.less"], remove_kind()));

    assert_eq!(debouncer.changes.len(), 3);
    assert_eq!(
        debouncer.changes[&PathBuf::from("/nonexistent/a.less")],
        ChangeKind::Created
    );
    assert_eq!(
        debouncer.changes[&PathBuf::from("/nonexistent/c.less")],
        ChangeKind::Removed
    );
}

#[test]
fn test_metadata_events_ignored() {
    let mut debouncer = debouncer();
    debouncer.add_event(&make_event(vec!["/nonexistent/app.js"], metadata_kind()));
    assert!(debouncer.changes.is_empty());
    assert!(debouncer.last_event.is_none());
}

#[test]
fn test_temp_file_ignored() {
    let mut debouncer = debouncer();

    debouncer.add_event(&make_event(vec!["/nonexistent/main.less"], modify_kind()));
    let first_time = debouncer.last_event.unwrap();

    std::thread::sleep(Duration::from_millis(5));

    debouncer.add_event(&make_event(vec!["/nonexistent/.main.less.swp"], modify_kind()));
    debouncer.add_event(&make_event(vec!["/nonexistent/main.less~"], modify_kind()));
    assert_eq!(debouncer.last_event.unwrap(), first_time);
    assert_eq!(debouncer.changes.len(), 1);
}

#[test]
fn test_record_temp_file_is_hidden() {
    assert!(is_temp_file(Path::new("/site/data/.css_hashsum.yml.tmp")));
    assert!(!is_temp_file(Path::new("/site/data/css_hashsum.yml")));
}

#[test]
fn test_dedup_first_event_wins() {
    let mut debouncer = debouncer();

    debouncer.add_event(&make_event(vec!["/nonexistent/a.js"], create_kind()));
    debouncer.add_event(&make_event(vec!["/nonexistent/a.js"], modify_kind()));

    assert_eq!(debouncer.changes.len(), 1);
    assert_eq!(
        debouncer.changes[&PathBuf::from("/nonexistent/a.js")],
        ChangeKind::Created
    );
}

#[test]
fn test_remove_then_create_restores() {
    let mut debouncer = debouncer();

    debouncer.add_event(&make_event(vec!["/nonexistent/a.js"], remove_kind()));
    debouncer.add_event(&make_event(vec!["/nonexistent/a.js"], create_kind()));
    assert_eq!(
        debouncer.changes[&PathBuf::from("/nonexistent/a.js")],
        ChangeKind::Created
    );
}

#[test]
fn test_create_then_remove_discards() {
    let mut debouncer = debouncer();

    debouncer.add_event(&make_event(vec!["/nonexistent/a.js"], create_kind()));
    debouncer.add_event(&make_event(vec!["/nonexistent/a.js"], remove_kind()));
    assert!(debouncer.changes.is_empty());
}

#[test]
fn test_modify_then_remove_upgrades() {
    let mut debouncer = debouncer();

    debouncer.add_event(&make_event(vec!["/nonexistent/a.js"], modify_kind()));
    debouncer.add_event(&make_event(vec!["/nonexistent/a.js"], remove_kind()));
    assert_eq!(
        debouncer.changes[&PathBuf::from("/nonexistent/a.js")],
        ChangeKind::Removed
    );
}

#[test]
fn test_sleep_duration_no_events() {
    assert!(debouncer().sleep_duration() >= Duration::from_secs(3600));
}

#[test]
fn test_sleep_duration_after_event() {
    let mut debouncer = debouncer();
    debouncer.last_event = Some(Instant::now());

    let dur = debouncer.sleep_duration();
    assert!(dur >= DEBOUNCE - Duration::from_millis(10));
    assert!(dur <= DEBOUNCE + Duration::from_millis(10));
}

#[test]
fn test_sleep_duration_respects_cooldown() {
    let mut debouncer = debouncer();
    debouncer.last_event = Some(Instant::now());
    debouncer.last_batch = Some(Instant::now());

    let dur = debouncer.sleep_duration();
    assert!(dur >= COOLDOWN - Duration::from_millis(10));
    assert!(dur <= COOLDOWN + Duration::from_millis(10));
}

#[test]
fn test_take_if_ready_after_debounce() {
    let mut debouncer = Debouncer::new(Duration::ZERO, Duration::ZERO);
    debouncer.add_event(&make_event(vec!["/nonexistent/a.js"], modify_kind()));

    let changes = debouncer.take_if_ready().unwrap();
    assert_eq!(changes.len(), 1);
    assert!(debouncer.changes.is_empty());
    assert!(debouncer.last_batch.is_some());
    assert!(debouncer.take_if_ready().is_none());
}

#[test]
fn test_take_if_ready_waits_for_quiet_period() {
    let mut debouncer = debouncer();
    debouncer.add_event(&make_event(vec!["/nonexistent/a.js"], modify_kind()));
    assert!(debouncer.take_if_ready().is_none());
    assert_eq!(debouncer.changes.len(), 1);
}

// ============================================================================
// Roots
// ============================================================================

#[test]
fn test_literal_prefix() {
    assert_eq!(literal_prefix("css/**/*.{less,css}"), PathBuf::from("css"));
    assert_eq!(literal_prefix("js/*.js"), PathBuf::from("js"));
    assert_eq!(literal_prefix("src/js/libs/*.js"), PathBuf::from("src/js/libs"));
    assert_eq!(literal_prefix("**/*.js"), PathBuf::new());
    assert_eq!(literal_prefix("bustle.toml"), PathBuf::new());
    assert_eq!(literal_prefix("js/app.js"), PathBuf::from("js"));
}

#[test]
fn test_dedupe_roots_drops_nested() {
    let roots = dedupe_roots(vec![
        PathBuf::from("/site/js/libs"),
        PathBuf::from("/site/css"),
        PathBuf::from("/site/js"),
        PathBuf::from("/site/css"),
    ]);
    assert_eq!(roots, vec![PathBuf::from("/site/css"), PathBuf::from("/site/js")]);
}

// ============================================================================
// Triggers
// ============================================================================

const CONFIG: &str = r#"
[style]
sources = ["css/libs/normalize.css", "css/main.less"]
watch = ["css/**/*.{less,css}"]

[[script]]
name = "app"
sources = ["js/plugins.js", "js/script.js"]
dest = "app.js"

[[script]]
name = "vendor"
sources = ["js/libs/observer.js"]
dest = "vendor.js"

[lint]
files = ["js/*.js"]
"#;

fn project() -> (TempDir, crate::config::PipelineConfig) {
    let dir = TempDir::new().unwrap();
    let root = normalize_path(dir.path());
    let config = test_parse_config(CONFIG, &root);
    (dir, config)
}

#[test]
fn test_style_glob_triggers_style() {
    let (_dir, config) = project();
    let triggers = TriggerSet::from_config(&config);
    let changed = [config.root_join("css/partials/buttons.less")];
    assert_eq!(
        triggers.targets(changed.iter()).into_iter().collect::<Vec<_>>(),
        [Target::Style]
    );
}

#[test]
fn test_script_source_triggers_only_its_bundle_and_lint() {
    let (_dir, config) = project();
    let triggers = TriggerSet::from_config(&config);

    let changed = [config.root_join("js/script.js")];
    assert_eq!(
        triggers.targets(changed.iter()).into_iter().collect::<Vec<_>>(),
        [Target::Script("app".into()), Target::Lint]
    );

    let changed = [config.root_join("js/libs/observer.js")];
    assert_eq!(
        triggers.targets(changed.iter()).into_iter().collect::<Vec<_>>(),
        [Target::Script("vendor".into())]
    );
}

#[test]
fn test_config_file_triggers_lint() {
    let (_dir, config) = project();
    let triggers = TriggerSet::from_config(&config);
    let changed = [config.config_path.clone()];
    assert_eq!(
        triggers.targets(changed.iter()).into_iter().collect::<Vec<_>>(),
        [Target::Lint]
    );
}

#[test]
fn test_unrelated_and_output_paths_ignored() {
    let (_dir, config) = project();
    let triggers = TriggerSet::from_config(&config);
    let changed = [
        config.root_join("README.md"),
        config.output.build_dir.join("app.js"),
        config.root_join("js/notes.txt"),
    ];
    assert!(triggers.targets(changed.iter()).is_empty());
}

#[test]
fn test_trigger_dirs() {
    let (_dir, config) = project();
    let triggers = TriggerSet::from_config(&config);
    let roots = dedupe_roots(triggers.dirs().to_vec());
    // The config file lives at the root, so lint needs the root itself.
    assert_eq!(roots, vec![config.root.clone()]);
}

#[test]
fn test_trigger_dirs_without_config_lint() {
    let (_dir, mut config) = project();
    config.lint.config = false;
    let triggers = TriggerSet::from_config(&config);
    let roots = dedupe_roots(triggers.dirs().to_vec());
    assert_eq!(roots, vec![config.root_join("css"), config.root_join("js")]);
}

// ============================================================================
// Registry
// ============================================================================

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn test_registry_runs_handler_and_stops() {
    let (_dir, mut config) = project();
    config.watch.debounce_ms = 50;
    config.watch.cooldown_ms = 0;
    let root = config.root.clone();
    write(&root, "css/main.less", ".a{}");
    write(&root, "js/script.js", "var a;");

    let (tx, rx) = channel::unbounded();
    let mut registry = WatchRegistry::start(&config, move |targets| {
        let _ = tx.send(targets.clone());
    })
    .unwrap();
    assert!(registry.is_running());
    assert!(!registry.roots().is_empty());

    write(&root, "css/main.less", ".a{color:red}");
    let targets = rx.recv_timeout(Duration::from_secs(10)).unwrap();
    assert!(targets.contains(&Target::Style));

    registry.stop();
    assert!(!registry.is_running());
    registry.stop();

    write(&root, "js/script.js", "var b;");
    assert!(rx.recv_timeout(Duration::from_millis(500)).is_err());
}

#[test]
fn test_registry_attaches_roots_created_later() {
    let dir = TempDir::new().unwrap();
    let root = normalize_path(dir.path());
    let mut config = test_parse_config(
        "[style]\nsources = [\"late/main.css\"]\nwatch = [\"late/*.css\"]\n[lint]\nfiles = []\nconfig = false\n",
        &root,
    );
    config.watch.debounce_ms = 50;
    config.watch.cooldown_ms = 0;

    let (tx, rx) = channel::unbounded();
    let registry = WatchRegistry::start(&config, move |targets| {
        let _ = tx.send(targets.clone());
    })
    .unwrap();
    assert_eq!(registry.roots(), [root.join("late")]);

    // Directory appears after start; roots are re-attached on the next tick.
    fs::create_dir_all(root.join("late")).unwrap();
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        write(&root, "late/main.css", ".a{}");
        if let Ok(targets) = rx.recv_timeout(Duration::from_millis(300)) {
            assert!(targets.contains(&Target::Style));
            return;
        }
    }
    panic!("no rebuild after the watched directory was created");
}
