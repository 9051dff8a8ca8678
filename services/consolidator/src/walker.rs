//! Period folder resolution and file enumeration.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::layout::is_spreadsheet;

/// Folder names tried for an export week, in priority order.
pub const EXPORT_WEEK_CONVENTIONS: &[&str] = &["Week {n}", "Week{n}", "Wk {n}", "Wk{n}", "W{n}", "{n}"];

/// Folder name of an import week.
pub const IMPORT_WEEK_CONVENTIONS: &[&str] = &["WK {n}"];

/// Outcome of resolving a period to its folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeriodFolder {
    Found(PathBuf),
    NotFound { searched: PathBuf },
}

/// Expand a convention template, replacing `{n}` with the period label.
pub fn folder_name(convention: &str, period: &str) -> String {
    convention.replace("{n}", period)
}

/// First convention that names an existing directory under `base` wins.
pub fn resolve_period_folder(base: &Path, period: &str, conventions: &[&str]) -> PeriodFolder {
    conventions
        .iter()
        .map(|c| base.join(folder_name(c, period)))
        .find(|candidate| candidate.is_dir())
        .map(PeriodFolder::Found)
        .unwrap_or_else(|| PeriodFolder::NotFound {
            searched: base.to_path_buf(),
        })
}

/// All files beneath `dir`, recursively, sorted by name within each directory.
/// Symlinked files are listed; symlinked directories are not descended into.
pub fn list_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(error = %e, "Error accessing entry");
                None
            }
        })
        .filter(|entry| entry.path().is_file())
        .map(|entry| entry.into_path())
        .collect()
}

/// Files counted two ways: everything on disk, and what the allow-list accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderListing {
    pub all_files: usize,
    pub spreadsheets: Vec<PathBuf>,
}

pub fn list_spreadsheets(dir: &Path) -> FolderListing {
    let all = list_files(dir);
    let spreadsheets = all
        .iter()
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map(is_spreadsheet)
                .unwrap_or(false)
        })
        .cloned()
        .collect();
    FolderListing {
        all_files: all.len(),
        spreadsheets,
    }
}

/// Subfolders whose name starts with `prefix`, numeric suffixes first in numeric order.
pub fn list_period_dirs(base: &Path, prefix: &str) -> std::io::Result<Vec<String>> {
    let mut names: Vec<String> = std::fs::read_dir(base)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.starts_with(prefix))
        .collect();
    names.sort_by_key(|name| {
        let suffix = name[prefix.len()..].trim().parse::<u32>().unwrap_or(u32::MAX);
        (suffix, name.clone())
    });
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    // -------------------------------------------------------------------------
    // RESOLUTION TESTS
    // -------------------------------------------------------------------------

    #[test]
    fn test_folder_name() {
        assert_eq!(folder_name("Week {n}", "26"), "Week 26");
        assert_eq!(folder_name("{n}", "7"), "7");
    }

    #[test]
    fn test_resolve_first_convention_wins() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("Wk 26")).unwrap();
        fs::create_dir_all(dir.path().join("26")).unwrap();

        let found = resolve_period_folder(dir.path(), "26", EXPORT_WEEK_CONVENTIONS);
        assert_eq!(found, PeriodFolder::Found(dir.path().join("Wk 26")));
    }

    #[test]
    fn test_resolve_bare_number() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("9")).unwrap();
        let found = resolve_period_folder(dir.path(), "9", EXPORT_WEEK_CONVENTIONS);
        assert_eq!(found, PeriodFolder::Found(dir.path().join("9")));
    }

    #[test]
    fn test_resolve_ignores_plain_files() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("Week 3"));
        let found = resolve_period_folder(dir.path(), "3", EXPORT_WEEK_CONVENTIONS);
        assert!(matches!(found, PeriodFolder::NotFound { .. }));
    }

    #[test]
    fn test_resolve_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let found = resolve_period_folder(dir.path(), "40", EXPORT_WEEK_CONVENTIONS);
        assert_eq!(
            found,
            PeriodFolder::NotFound {
                searched: dir.path().to_path_buf()
            }
        );
    }

    // -------------------------------------------------------------------------
    // ENUMERATION TESTS
    // -------------------------------------------------------------------------

    #[test]
    fn test_list_files_recursive_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("b.xlsx"));
        touch(&dir.path().join("a.csv"));
        touch(&dir.path().join("India/c.xls"));

        let files = list_files(dir.path());
        assert_eq!(
            files,
            vec![
                dir.path().join("India/c.xls"),
                dir.path().join("a.csv"),
                dir.path().join("b.xlsx"),
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_list_files_includes_symlinked_files() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("shared/export_longstandings.csv");
        touch(&target);
        let week = dir.path().join("Week 5");
        fs::create_dir_all(&week).unwrap();
        std::os::unix::fs::symlink(&target, week.join("export_longstandings.csv")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("missing.csv"), week.join("dangling.csv")).unwrap();

        let files = list_files(&week);
        assert_eq!(files, vec![week.join("export_longstandings.csv")]);
    }

    #[test]
    fn test_list_spreadsheets_counts_both_ways() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.csv"));
        touch(&dir.path().join("notes.txt"));
        touch(&dir.path().join("x/Thumbs.db"));
        touch(&dir.path().join("x/Lanka.XLSX"));

        let listing = list_spreadsheets(dir.path());
        assert_eq!(listing.all_files, 4);
        assert_eq!(listing.spreadsheets.len(), 2);
    }

    #[test]
    fn test_list_period_dirs_by_prefix() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("WK 2")).unwrap();
        fs::create_dir_all(dir.path().join("WK 1")).unwrap();
        fs::create_dir_all(dir.path().join("WK 10")).unwrap();
        fs::create_dir_all(dir.path().join("Archive")).unwrap();
        touch(&dir.path().join("WK notes.txt"));

        let dirs = list_period_dirs(dir.path(), "WK").unwrap();
        assert_eq!(dirs, vec!["WK 1", "WK 2", "WK 10"]);
    }
}
