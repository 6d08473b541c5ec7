//! Filter configuration: which messages are ignored or logged in detail.
//!
//! The file is JSON, one optional section per connection state:
//!
//! ```json
//! {
//!     "LogToConsole": true,
//!     "Play": {
//!         "ignored_clientbound": ["KeepAliveClientbound", 38],
//!         "ignored_serverbound": [0],
//!         "detailed_clientbound": ["ChatMessageClientbound"],
//!         "detailed_serverbound": []
//!     }
//! }
//! ```
//!
//! Entries are packet ids or message names; names are resolved against the
//! message catalogue. A section left out clears every filter for that state.

use crate::protocol::{message, ConnectionState, Origin};
use serde::Deserialize;
use std::{
    collections::{HashMap, HashSet},
    fs,
    path::{Path, PathBuf},
    time::{Duration, Instant, SystemTime},
};

/// Ids scanned when resolving a message name; some catalogues use ids well
/// past 0x40.
const NAME_SCAN_IDS: std::ops::Range<i32> = 0..256;

/// How often the watcher is willing to stat the config file.
pub const RELOAD_CHECK_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IdOrName {
    Id(i32),
    Name(String),
}

#[derive(Debug, Default, Deserialize)]
struct RawStateFilters {
    #[serde(default)]
    ignored_clientbound: Vec<IdOrName>,
    #[serde(default)]
    ignored_serverbound: Vec<IdOrName>,
    #[serde(default)]
    detailed_clientbound: Vec<IdOrName>,
    #[serde(default)]
    detailed_serverbound: Vec<IdOrName>,
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(rename = "LogToConsole", default)]
    log_to_console: bool,
    #[serde(rename = "Handshaking")]
    handshaking: Option<RawStateFilters>,
    #[serde(rename = "Status")]
    status: Option<RawStateFilters>,
    #[serde(rename = "Login")]
    login: Option<RawStateFilters>,
    #[serde(rename = "Play")]
    play: Option<RawStateFilters>,
}

/// Resolved filter sets, keyed by `(state, origin)` where the origin is the
/// peer that produced the packet: clientbound lists key on `Origin::Server`,
/// serverbound lists on `Origin::Client`.
#[derive(Debug, Default, Clone)]
pub struct FilterTable {
    pub log_to_console: bool,
    ignored: HashMap<(ConnectionState, Origin), HashSet<i32>>,
    detailed: HashMap<(ConnectionState, Origin), HashSet<i32>>,
}

impl FilterTable {
    pub fn is_ignored(&self, state: ConnectionState, origin: Origin, id: i32) -> bool {
        self.ignored
            .get(&(state, origin))
            .is_some_and(|set| set.contains(&id))
    }

    pub fn is_detailed(&self, state: ConnectionState, origin: Origin, id: i32) -> bool {
        self.detailed
            .get(&(state, origin))
            .is_some_and(|set| set.contains(&id))
    }

    fn from_raw(raw: RawConfig) -> Self {
        let mut table = FilterTable {
            log_to_console: raw.log_to_console,
            ..Default::default()
        };

        let sections = [
            (ConnectionState::Handshake, raw.handshaking),
            (ConnectionState::Status, raw.status),
            (ConnectionState::Login, raw.login),
            (ConnectionState::Play, raw.play),
        ];
        for (state, section) in sections {
            let section = section.unwrap_or_default();
            table.ignored.insert(
                (state, Origin::Server),
                resolve(&section.ignored_clientbound, state, Origin::Server),
            );
            table.ignored.insert(
                (state, Origin::Client),
                resolve(&section.ignored_serverbound, state, Origin::Client),
            );
            table.detailed.insert(
                (state, Origin::Server),
                resolve(&section.detailed_clientbound, state, Origin::Server),
            );
            table.detailed.insert(
                (state, Origin::Client),
                resolve(&section.detailed_serverbound, state, Origin::Client),
            );
        }
        table
    }
}

/// Resolves a list of filter entries to packet ids. Names that match
/// nothing in the catalogue are silently ignored.
fn resolve(entries: &[IdOrName], state: ConnectionState, origin: Origin) -> HashSet<i32> {
    let mut ids = HashSet::new();
    for entry in entries {
        match entry {
            IdOrName::Id(id) => {
                ids.insert(*id);
            }
            IdOrName::Name(name) => {
                for id in NAME_SCAN_IDS {
                    let message = match origin {
                        Origin::Server => message::create_clientbound(id, state),
                        Origin::Client => message::create_serverbound(id, state),
                    };
                    if message.is_some_and(|m| m.name() == name.as_str()) {
                        ids.insert(id);
                    }
                }
            }
        }
    }
    ids
}

/// Watches the filter config file and reloads it when its modification
/// timestamp changes. A file that fails to parse keeps the previous rules.
#[derive(Debug)]
pub struct ConfigWatcher {
    path: PathBuf,
    last_modified: Option<SystemTime>,
    last_checked: Option<Instant>,
    filters: FilterTable,
}

impl ConfigWatcher {
    /// Creates the watcher and performs the initial load.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let mut watcher = Self {
            path: path.into(),
            last_modified: None,
            last_checked: None,
            filters: FilterTable::default(),
        };
        watcher.reload_if_modified();
        watcher
    }

    pub fn filters(&self) -> &FilterTable {
        &self.filters
    }

    /// Rate-limited reload check; stats the file at most once per
    /// [`RELOAD_CHECK_INTERVAL`].
    pub fn poll(&mut self) {
        let now = Instant::now();
        if self
            .last_checked
            .is_some_and(|checked| now.duration_since(checked) < RELOAD_CHECK_INTERVAL)
        {
            return;
        }
        self.last_checked = Some(now);
        self.reload_if_modified();
    }

    /// Reloads the file if its mtime moved past the last loaded one.
    /// Returns whether a reload happened.
    pub fn reload_if_modified(&mut self) -> bool {
        let Ok(modified) = fs::metadata(&self.path).and_then(|m| m.modified()) else {
            return false;
        };
        if self.last_modified == Some(modified) {
            return false;
        }
        self.last_modified = Some(modified);

        match load(&self.path) {
            Ok(filters) => {
                tracing::info!("Loading updated conf file {}", self.path.display());
                self.filters = filters;
                true
            }
            Err(e) => {
                tracing::error!(
                    "Error parsing conf file at {}: {e:#}; keeping previous rules",
                    self.path.display()
                );
                false
            }
        }
    }
}

fn load(path: &Path) -> anyhow::Result<FilterTable> {
    let contents = fs::read_to_string(path)?;
    let raw: RawConfig = serde_json::from_str(&contents)?;
    Ok(FilterTable::from_raw(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs::File, io::Write as _};

    fn write_config(contents: &str) -> tempfile::TempPath {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.into_temp_path()
    }

    #[test]
    fn numeric_entries_are_taken_verbatim() {
        let path = write_config(r#"{"Play": {"ignored_serverbound": [0, 3]}}"#);
        let watcher = ConfigWatcher::new(path.to_path_buf());
        let filters = watcher.filters();

        assert!(filters.is_ignored(ConnectionState::Play, Origin::Client, 0));
        assert!(filters.is_ignored(ConnectionState::Play, Origin::Client, 3));
        assert!(!filters.is_ignored(ConnectionState::Play, Origin::Client, 1));
        // Clientbound traffic is untouched.
        assert!(!filters.is_ignored(ConnectionState::Play, Origin::Server, 0));
    }

    #[test]
    fn names_resolve_against_the_catalogue() {
        let path = write_config(
            r#"{"Login": {"detailed_clientbound": ["LoginSuccess"],
                         "detailed_serverbound": ["LoginStart"]}}"#,
        );
        let watcher = ConfigWatcher::new(path.to_path_buf());
        let filters = watcher.filters();

        // LoginSuccess is clientbound id 2; LoginStart serverbound id 0.
        assert!(filters.is_detailed(ConnectionState::Login, Origin::Server, 2));
        assert!(filters.is_detailed(ConnectionState::Login, Origin::Client, 0));
        assert!(!filters.is_detailed(ConnectionState::Login, Origin::Client, 2));
    }

    #[test]
    fn unknown_names_are_silently_dropped() {
        let path = write_config(r#"{"Play": {"ignored_clientbound": ["NoSuchMessage"]}}"#);
        let watcher = ConfigWatcher::new(path.to_path_buf());
        for id in 0..256 {
            assert!(!watcher
                .filters()
                .is_ignored(ConnectionState::Play, Origin::Server, id));
        }
    }

    #[test]
    fn absent_section_clears_filters() {
        let path = write_config(r#"{"Play": {"ignored_serverbound": [0]}}"#);
        let mut watcher = ConfigWatcher::new(path.to_path_buf());
        assert!(watcher
            .filters()
            .is_ignored(ConnectionState::Play, Origin::Client, 0));

        fs::write(&path, r#"{"Login": {"ignored_serverbound": [0]}}"#).unwrap();
        bump_mtime(&path);
        assert!(watcher.reload_if_modified());
        assert!(!watcher
            .filters()
            .is_ignored(ConnectionState::Play, Origin::Client, 0));
        assert!(watcher
            .filters()
            .is_ignored(ConnectionState::Login, Origin::Client, 0));
    }

    #[test]
    fn parse_failure_keeps_previous_rules() {
        let path = write_config(r#"{"Play": {"ignored_serverbound": [0]}}"#);
        let mut watcher = ConfigWatcher::new(path.to_path_buf());

        fs::write(&path, "{ not json").unwrap();
        bump_mtime(&path);
        assert!(!watcher.reload_if_modified());
        assert!(watcher
            .filters()
            .is_ignored(ConnectionState::Play, Origin::Client, 0));
    }

    #[test]
    fn unchanged_file_is_a_noop() {
        let path = write_config(r#"{"LogToConsole": true}"#);
        let mut watcher = ConfigWatcher::new(path.to_path_buf());
        assert!(watcher.filters().log_to_console);
        assert!(!watcher.reload_if_modified());
    }

    #[test]
    fn missing_file_yields_empty_filters() {
        let watcher = ConfigWatcher::new("/nonexistent/spyglass-conf.json");
        assert!(!watcher.filters().log_to_console);
        assert!(!watcher
            .filters()
            .is_ignored(ConnectionState::Play, Origin::Client, 0));
    }

    /// Filesystem mtime granularity can swallow a quick rewrite; force the
    /// timestamp forward instead of sleeping.
    fn bump_mtime(path: &Path) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(2))
            .unwrap();
    }
}
