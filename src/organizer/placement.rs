use crate::config::CollisionPolicy;
use crate::error::{OrganizerError, Result};
use crate::resolver::ResolvedDate;
use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const MAX_RENAME_ATTEMPTS: u32 = 9999;

/// Where a file ended up, or would end up in a dry run.
#[derive(Debug)]
pub enum FileOutcome {
    Moved {
        destination: PathBuf,
        date: ResolvedDate,
    },
    AlreadyInPlace {
        destination: PathBuf,
        date: ResolvedDate,
    },
    Planned {
        destination: PathBuf,
        date: ResolvedDate,
    },
    Failed {
        reason: OrganizerError,
    },
}

impl FileOutcome {
    pub fn date(&self) -> Option<&ResolvedDate> {
        match self {
            FileOutcome::Moved { date, .. }
            | FileOutcome::AlreadyInPlace { date, .. }
            | FileOutcome::Planned { date, .. } => Some(date),
            FileOutcome::Failed { .. } => None,
        }
    }

    pub fn destination(&self) -> Option<&Path> {
        match self {
            FileOutcome::Moved { destination, .. }
            | FileOutcome::AlreadyInPlace { destination, .. }
            | FileOutcome::Planned { destination, .. } => Some(destination),
            FileOutcome::Failed { .. } => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            FileOutcome::Moved { .. } => "moved",
            FileOutcome::AlreadyInPlace { .. } => "in_place",
            FileOutcome::Planned { .. } => "planned",
            FileOutcome::Failed { .. } => "failed",
        }
    }
}

/// Computes `<root>/<year>/<month>/` destinations and moves files into them.
pub struct Placement {
    root: PathBuf,
    on_collision: CollisionPolicy,
    dry_run: bool,
    /// Destinations handed out by a dry run, treated as occupied.
    planned: RefCell<HashSet<PathBuf>>,
}

impl Placement {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            on_collision: CollisionPolicy::default(),
            dry_run: false,
            planned: RefCell::new(HashSet::new()),
        }
    }

    pub fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.on_collision = policy;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn destination_dir(&self, date: &ResolvedDate) -> PathBuf {
        self.root.join(date.year()).join(date.month())
    }

    pub fn place(&self, source: &Path, date: &ResolvedDate) -> Result<FileOutcome> {
        let filename = source.file_name().ok_or_else(|| OrganizerError::InvalidPath {
            path: source.display().to_string(),
        })?;

        let target_dir = self.destination_dir(date);
        let destination = target_dir.join(filename);

        if destination == source {
            debug!(path = %source.display(), "already organized");
            return Ok(FileOutcome::AlreadyInPlace {
                destination,
                date: *date,
            });
        }

        let destination = self.resolve_collision(destination)?;

        if self.dry_run {
            self.planned.borrow_mut().insert(destination.clone());
            return Ok(FileOutcome::Planned {
                destination,
                date: *date,
            });
        }

        ensure_directory(&target_dir)?;
        move_file(source, &destination)?;
        info!(from = %source.display(), to = %destination.display(), "moved");

        Ok(FileOutcome::Moved {
            destination,
            date: *date,
        })
    }

    fn resolve_collision(&self, destination: PathBuf) -> Result<PathBuf> {
        if !self.is_taken(&destination) {
            return Ok(destination);
        }

        match self.on_collision {
            CollisionPolicy::Skip => Err(OrganizerError::DestinationExists {
                path: destination.display().to_string(),
            }),
            CollisionPolicy::Rename => next_free_name(&destination, |path| self.is_taken(path)),
        }
    }

    fn is_taken(&self, path: &Path) -> bool {
        path_taken(path) || self.planned.borrow().contains(path)
    }
}

/// Creates `<year>/` then `<year>/<month>/` when missing.
///
/// Creating a directory that appeared in the meantime is not an error.
pub fn ensure_directory(month_dir: &Path) -> Result<()> {
    let levels = [month_dir.parent(), Some(month_dir)];

    for dir in levels.into_iter().flatten() {
        if dir.is_dir() {
            continue;
        }

        match fs::create_dir(dir) {
            Ok(()) => debug!(path = %dir.display(), "created directory"),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && dir.is_dir() => {}
            Err(e) => {
                return Err(OrganizerError::CreateDirectory {
                    path: dir.display().to_string(),
                    source: e,
                })
            }
        }
    }

    Ok(())
}

/// Renames `source` to `destination`, copying across devices when needed.
pub fn move_file(source: &Path, destination: &Path) -> Result<()> {
    let move_error = |e: io::Error| OrganizerError::MoveFailed {
        from: source.display().to_string(),
        to: destination.display().to_string(),
        source: e,
    };

    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            debug!(from = %source.display(), "rename crosses devices, copying");
            copy_then_remove(source, destination).map_err(move_error)
        }
        Err(e) => Err(move_error(e)),
    }
}

/// Copies `source` to `destination`, carries over its timestamps, then removes
/// the source. On failure the destination is removed again, so the file is
/// only ever complete in exactly one place.
///
/// The copy gets a new birth time; the preserved modification time is what
/// keeps later filesystem-dated runs stable (see `FilesystemResolver`).
pub(crate) fn copy_then_remove(source: &Path, destination: &Path) -> io::Result<()> {
    if path_taken(destination) {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists", destination.display()),
        ));
    }

    let metadata = fs::metadata(source)?;
    if let Err(e) = fs::copy(source, destination) {
        discard_partial_copy(destination);
        return Err(e);
    }

    let accessed = filetime::FileTime::from_last_access_time(&metadata);
    let modified = filetime::FileTime::from_last_modification_time(&metadata);
    if let Err(e) = filetime::set_file_times(destination, accessed, modified) {
        warn!(path = %destination.display(), error = %e, "could not preserve file times");
    }

    if let Err(e) = fs::remove_file(source) {
        discard_partial_copy(destination);
        return Err(e);
    }

    Ok(())
}

fn discard_partial_copy(destination: &Path) {
    match fs::remove_file(destination) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %destination.display(), error = %e, "could not remove incomplete copy"),
    }
}

fn path_taken(path: &Path) -> bool {
    // symlink_metadata so a dangling link still counts as occupied
    fs::symlink_metadata(path).is_ok()
}

/// First unused `<stem> (N).<ext>` next to `destination`.
fn next_free_name(destination: &Path, is_taken: impl Fn(&Path) -> bool) -> Result<PathBuf> {
    let parent = destination.parent().unwrap_or_else(|| Path::new(""));
    let stem = destination
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let extension = destination
        .extension()
        .map(|e| e.to_string_lossy().to_string());

    for n in 1..=MAX_RENAME_ATTEMPTS {
        let name = match extension {
            Some(ref ext) => format!("{} ({}).{}", stem, n, ext),
            None => format!("{} ({})", stem, n),
        };
        let candidate = parent.join(name);
        if !is_taken(&candidate) {
            return Ok(candidate);
        }
    }

    Err(OrganizerError::DestinationExists {
        path: destination.display().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::DateSource;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn date(year: i32, month: u32) -> ResolvedDate {
        let datetime = NaiveDate::from_ymd_opt(year, month, 15)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        ResolvedDate::new(datetime, DateSource::Metadata)
    }

    #[test]
    fn test_destination_dir() {
        let placement = Placement::new("/photos");
        assert_eq!(
            placement.destination_dir(&date(2023, 6)),
            PathBuf::from("/photos/2023/06")
        );
    }

    #[test]
    fn test_moves_into_dated_directory() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let source = root.join("IMG_1.jpg");
        fs::write(&source, "pixels").unwrap();

        let outcome = Placement::new(root).place(&source, &date(2023, 6)).unwrap();

        let expected = root.join("2023").join("06").join("IMG_1.jpg");
        assert!(matches!(outcome, FileOutcome::Moved { ref destination, .. } if *destination == expected));
        assert!(expected.exists());
        assert!(!source.exists());
        assert_eq!(fs::read_to_string(expected).unwrap(), "pixels");
    }

    #[test]
    fn test_existing_directories_are_reused() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("2023/06")).unwrap();
        fs::write(root.join("2023/06/old.jpg"), "old").unwrap();
        fs::write(root.join("new.jpg"), "new").unwrap();

        Placement::new(root)
            .place(&root.join("new.jpg"), &date(2023, 6))
            .unwrap();

        assert!(root.join("2023/06/old.jpg").exists());
        assert!(root.join("2023/06/new.jpg").exists());
    }

    #[test]
    fn test_file_already_in_place() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("2023/06")).unwrap();
        let source = root.join("2023/06/IMG_1.jpg");
        fs::write(&source, "x").unwrap();

        let outcome = Placement::new(root).place(&source, &date(2023, 6)).unwrap();

        assert!(matches!(outcome, FileOutcome::AlreadyInPlace { .. }));
        assert!(source.exists());
    }

    #[test]
    fn test_collision_skip_leaves_both_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("2023/06")).unwrap();
        fs::write(root.join("2023/06/IMG_1.jpg"), "first").unwrap();
        let source = root.join("IMG_1.jpg");
        fs::write(&source, "second").unwrap();

        let result = Placement::new(root).place(&source, &date(2023, 6));

        assert!(matches!(result, Err(OrganizerError::DestinationExists { .. })));
        assert_eq!(fs::read_to_string(&source).unwrap(), "second");
        assert_eq!(
            fs::read_to_string(root.join("2023/06/IMG_1.jpg")).unwrap(),
            "first"
        );
    }

    #[test]
    fn test_collision_rename_picks_free_name() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("2023/06")).unwrap();
        fs::write(root.join("2023/06/IMG_1.jpg"), "first").unwrap();
        fs::write(root.join("2023/06/IMG_1 (1).jpg"), "second").unwrap();
        let source = root.join("IMG_1.jpg");
        fs::write(&source, "third").unwrap();

        let outcome = Placement::new(root)
            .with_collision_policy(CollisionPolicy::Rename)
            .place(&source, &date(2023, 6))
            .unwrap();

        let expected = root.join("2023/06/IMG_1 (2).jpg");
        assert_eq!(outcome.destination(), Some(expected.as_path()));
        assert_eq!(fs::read_to_string(expected).unwrap(), "third");
        assert_eq!(
            fs::read_to_string(root.join("2023/06/IMG_1.jpg")).unwrap(),
            "first"
        );
    }

    #[test]
    fn test_next_free_name_without_extension() {
        let temp_dir = TempDir::new().unwrap();
        let taken = temp_dir.path().join("scan");
        fs::write(&taken, "x").unwrap();

        assert_eq!(
            next_free_name(&taken, path_taken).unwrap(),
            temp_dir.path().join("scan (1)")
        );
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let source = root.join("IMG_1.jpg");
        fs::write(&source, "x").unwrap();

        let outcome = Placement::new(root)
            .with_dry_run(true)
            .place(&source, &date(2023, 6))
            .unwrap();

        assert!(matches!(outcome, FileOutcome::Planned { .. }));
        assert!(source.exists());
        assert!(!root.join("2023").exists());
    }

    #[test]
    fn test_year_path_blocked_by_file() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("2023"), "not a directory").unwrap();
        let source = root.join("IMG_1.jpg");
        fs::write(&source, "x").unwrap();

        let result = Placement::new(root).place(&source, &date(2023, 6));

        assert!(matches!(result, Err(OrganizerError::CreateDirectory { .. })));
        assert!(source.exists());
    }

    #[test]
    fn test_copy_then_remove_moves_and_keeps_mtime() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("IMG_1.jpg");
        let destination = temp_dir.path().join("IMG_1 copy.jpg");
        fs::write(&source, "pixels").unwrap();
        let old = filetime::FileTime::from_unix_time(1_000_000_000, 0);
        filetime::set_file_mtime(&source, old).unwrap();

        copy_then_remove(&source, &destination).unwrap();

        assert!(!source.exists());
        assert_eq!(fs::read_to_string(&destination).unwrap(), "pixels");
        let copied = fs::metadata(&destination).unwrap();
        assert_eq!(filetime::FileTime::from_last_modification_time(&copied), old);
    }

    #[test]
    fn test_copy_then_remove_never_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("a.jpg");
        let destination = temp_dir.path().join("b.jpg");
        fs::write(&source, "new").unwrap();
        fs::write(&destination, "old").unwrap();

        let err = copy_then_remove(&source, &destination).unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(fs::read_to_string(&source).unwrap(), "new");
        assert_eq!(fs::read_to_string(&destination).unwrap(), "old");
    }

    #[test]
    fn test_failed_copy_leaves_no_destination() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("gone.jpg");
        let destination = temp_dir.path().join("copy.jpg");

        assert!(copy_then_remove(&source, &destination).is_err());
        assert!(!destination.exists());
    }

    #[test]
    fn test_dry_run_reserves_planned_destinations() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("a")).unwrap();
        fs::create_dir_all(root.join("b")).unwrap();
        fs::write(root.join("a/IMG_1.jpg"), "first").unwrap();
        fs::write(root.join("b/IMG_1.jpg"), "second").unwrap();

        let skip = Placement::new(root).with_dry_run(true);
        assert!(skip.place(&root.join("a/IMG_1.jpg"), &date(2023, 6)).is_ok());
        assert!(matches!(
            skip.place(&root.join("b/IMG_1.jpg"), &date(2023, 6)),
            Err(OrganizerError::DestinationExists { .. })
        ));

        let rename = Placement::new(root)
            .with_collision_policy(CollisionPolicy::Rename)
            .with_dry_run(true);
        let first = rename.place(&root.join("a/IMG_1.jpg"), &date(2023, 6)).unwrap();
        let second = rename.place(&root.join("b/IMG_1.jpg"), &date(2023, 6)).unwrap();
        assert_eq!(first.destination(), Some(root.join("2023/06/IMG_1.jpg").as_path()));
        assert_eq!(second.destination(), Some(root.join("2023/06/IMG_1 (1).jpg").as_path()));
        assert!(!root.join("2023").exists());
    }

    #[test]
    fn test_ensure_directory_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let month_dir = temp_dir.path().join("2020").join("02");

        ensure_directory(&month_dir).unwrap();
        ensure_directory(&month_dir).unwrap();
        assert!(month_dir.is_dir());
    }
}
