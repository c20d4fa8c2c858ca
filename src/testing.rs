//! Scripted collaborators for driving the core without a real OS.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::cleaner::{Host, Locations};
use crate::config::{Config, EstimateConfig};
use crate::probe::{FileEntry, FileSystem};
use crate::shell::CommandShell;

enum Match {
    Exact(String),
    Contains(String),
}

impl Match {
    fn hits(&self, line: &str) -> bool {
        match self {
            Self::Exact(s) => line == s,
            Self::Contains(s) => line.contains(s.as_str()),
        }
    }
}

#[derive(Default)]
struct ShellScript {
    rules: Vec<(Match, String)>,
    calls: Vec<String>,
}

/// A shell that answers from a script and records every command line.
/// Later rules take precedence over earlier ones.
#[derive(Clone, Default)]
pub struct FakeShell {
    inner: Arc<Mutex<ShellScript>>,
}

impl FakeShell {
    /// Answer any command line containing `needle`.
    pub fn respond(&self, needle: &str, output: &str) {
        self.inner
            .lock()
            .unwrap()
            .rules
            .push((Match::Contains(needle.to_string()), output.to_string()));
    }

    /// Answer only the exact command line `program arg1 arg2 ...`.
    pub fn respond_exact(&self, line: &str, output: &str) {
        self.inner
            .lock()
            .unwrap()
            .rules
            .push((Match::Exact(line.to_string()), output.to_string()));
    }

    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn count(&self, needle: &str) -> usize {
        self.calls().iter().filter(|c| c.contains(needle)).count()
    }

    pub fn clear_calls(&self) {
        self.inner.lock().unwrap().calls.clear();
    }
}

impl CommandShell for FakeShell {
    fn run(&self, program: &str, args: &[&str], _timeout: Duration) -> String {
        let mut line = program.to_string();
        for arg in args {
            line.push(' ');
            line.push_str(arg);
        }
        let mut script = self.inner.lock().unwrap();
        let output = script
            .rules
            .iter()
            .rev()
            .find(|(m, _)| m.hits(&line))
            .map(|(_, out)| out.clone())
            .unwrap_or_default();
        script.calls.push(line);
        output
    }
}

struct FakeFile {
    name: String,
    size: u64,
    readable: bool,
    writable: bool,
    /// Deletions that will still fail; `u32::MAX` never succeeds.
    failures_left: u32,
}

#[derive(Default)]
struct FsState {
    dirs: BTreeMap<PathBuf, Vec<FakeFile>>,
    unavailable: BTreeSet<PathBuf>,
    delete_attempts: Vec<PathBuf>,
}

/// An in-memory directory tree.
#[derive(Clone, Default)]
pub struct FakeFs {
    inner: Arc<Mutex<FsState>>,
}

impl FakeFs {
    pub fn add_dir(&self, dir: impl AsRef<Path>) {
        let mut state = self.inner.lock().unwrap();
        for ancestor in dir.as_ref().ancestors() {
            if ancestor.as_os_str().is_empty() {
                continue;
            }
            state.dirs.entry(ancestor.to_path_buf()).or_default();
        }
    }

    fn insert(&self, dir: &str, file: FakeFile) {
        self.add_dir(dir);
        self.inner
            .lock()
            .unwrap()
            .dirs
            .entry(PathBuf::from(dir))
            .or_default()
            .push(file);
    }

    pub fn add_file(&self, dir: &str, name: &str, size: u64) {
        self.add_locked_file(dir, name, size, 0);
    }

    /// A file whose first `failures` deletions fail.
    pub fn add_locked_file(&self, dir: &str, name: &str, size: u64, failures: u32) {
        self.insert(
            dir,
            FakeFile {
                name: name.to_string(),
                size,
                readable: true,
                writable: true,
                failures_left: failures,
            },
        );
    }

    pub fn add_readonly_file(&self, dir: &str, name: &str, size: u64) {
        self.insert(
            dir,
            FakeFile {
                name: name.to_string(),
                size,
                readable: true,
                writable: false,
                failures_left: u32::MAX,
            },
        );
    }

    pub fn add_unreadable_file(&self, dir: &str, name: &str, size: u64) {
        self.insert(
            dir,
            FakeFile {
                name: name.to_string(),
                size,
                readable: false,
                writable: true,
                failures_left: 0,
            },
        );
    }

    /// Make listing `dir` fail with access denied.
    pub fn set_unavailable(&self, dir: &str) {
        self.inner
            .lock()
            .unwrap()
            .unavailable
            .insert(PathBuf::from(dir));
    }

    pub fn files_in(&self, dir: &str) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .dirs
            .get(Path::new(dir))
            .map(|files| files.iter().map(|f| f.name.clone()).collect())
            .unwrap_or_default()
    }

    pub fn delete_attempts(&self) -> Vec<PathBuf> {
        self.inner.lock().unwrap().delete_attempts.clone()
    }
}

fn check(state: &FsState, dir: &Path) -> io::Result<()> {
    if state.unavailable.contains(dir) {
        return Err(io::Error::new(io::ErrorKind::PermissionDenied, "access denied"));
    }
    if !state.dirs.contains_key(dir) {
        return Err(io::Error::new(io::ErrorKind::NotFound, "no such directory"));
    }
    Ok(())
}

impl FileSystem for FakeFs {
    fn list_immediate_files(&self, dir: &Path) -> io::Result<Vec<FileEntry>> {
        let state = self.inner.lock().unwrap();
        check(&state, dir)?;
        Ok(state.dirs[dir]
            .iter()
            .map(|f| FileEntry {
                name: f.name.clone(),
                path: dir.join(&f.name),
                size_bytes: f.size,
                readable: f.readable,
                writable: f.writable,
            })
            .collect())
    }

    fn list_immediate_dirs(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let state = self.inner.lock().unwrap();
        check(&state, dir)?;
        Ok(state
            .dirs
            .keys()
            .filter(|d| d.parent() == Some(dir))
            .cloned()
            .collect())
    }

    fn delete_file(&self, path: &Path) -> bool {
        let mut state = self.inner.lock().unwrap();
        state.delete_attempts.push(path.to_path_buf());
        let (Some(dir), Some(name)) = (path.parent(), path.file_name()) else {
            return false;
        };
        let Some(files) = state.dirs.get_mut(dir) else {
            return false;
        };
        let Some(idx) = files.iter().position(|f| f.name.as_str() == name) else {
            return false;
        };
        let file = &mut files[idx];
        if file.failures_left > 0 {
            if file.failures_left != u32::MAX {
                file.failures_left -= 1;
            }
            return false;
        }
        files.remove(idx);
        true
    }
}

pub fn test_locations() -> Locations {
    Locations {
        temp_dir: PathBuf::from("/t/temp"),
        windows_dir: PathBuf::from("/t/win"),
        cache_dir: Some(PathBuf::from("/t/cache")),
    }
}

/// Config pointing at the test locations. Timings keep their stock values.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.paths.temp_dir = Some(PathBuf::from("/t/temp"));
    config.paths.windows_dir = PathBuf::from("/t/win");
    config.paths.cache_dir = Some(PathBuf::from("/t/cache"));
    config
}

/// Owns the pieces a `Host` borrows.
pub struct TestHost {
    pub shell: FakeShell,
    pub fs: FakeFs,
    pub locations: Locations,
    pub estimates: EstimateConfig,
}

impl TestHost {
    pub fn new(shell: FakeShell, fs: FakeFs) -> Self {
        Self {
            shell,
            fs,
            locations: test_locations(),
            estimates: EstimateConfig::default(),
        }
    }

    pub fn host(&self) -> Host<'_> {
        Host {
            shell: &self.shell,
            fs: &self.fs,
            locations: &self.locations,
            estimates: &self.estimates,
            command_timeout: Duration::from_secs(5),
        }
    }
}
