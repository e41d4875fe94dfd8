use crate::config::RuleConfiguration;
use crate::loader::{self, LoadError};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use rayon::prelude::*;
use std::fmt;
use std::path::{Path, PathBuf};

/// File names treated as style files when no patterns are configured.
pub const DEFAULT_PATTERNS: &[&str] = &[".mdl.rb", "*.mdl.rb", ".mdl_style.rb"];

#[derive(Debug)]
pub enum DiscoverError {
    GlobParse(globset::Error),
}

impl fmt::Display for DiscoverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoverError::GlobParse(e) => write!(f, "invalid glob pattern: {}", e),
        }
    }
}

impl std::error::Error for DiscoverError {}

/// Outcome of loading one discovered style file.
#[derive(Debug)]
pub struct CheckOutcome {
    pub path: PathBuf,
    pub result: Result<RuleConfiguration, LoadError>,
}

pub struct CheckResult {
    pub outcomes: Vec<CheckOutcome>,
}

impl CheckResult {
    pub fn failures(&self) -> impl Iterator<Item = &CheckOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }
}

fn build_glob_set<S: AsRef<str>>(patterns: &[S]) -> Result<GlobSet, DiscoverError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern.as_ref()).map_err(DiscoverError::GlobParse)?);
    }
    builder.build().map_err(DiscoverError::GlobParse)
}

/// Collect style files under `targets`, honouring `.gitignore`.
///
/// Explicit file targets are always included; directories are walked and
/// their files kept when the file name matches one of `patterns`. The result
/// is sorted and deduplicated.
pub fn discover<S: AsRef<str>>(
    targets: &[PathBuf],
    patterns: &[S],
) -> Result<Vec<PathBuf>, DiscoverError> {
    let glob_set = if patterns.is_empty() {
        build_glob_set(DEFAULT_PATTERNS)?
    } else {
        build_glob_set(patterns)?
    };

    let mut files = Vec::new();
    for target in targets {
        if target.is_file() {
            files.push(target.clone());
            continue;
        }

        // Style files are dotfiles, so hidden entries must not be skipped.
        let walker = WalkBuilder::new(target).hidden(false).build();
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!("error walking {}: {}", target.display(), e);
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let path = entry.path();
            if path.components().any(|c| c.as_os_str() == ".git") {
                continue;
            }
            if matches_name(&glob_set, path) {
                files.push(path.to_path_buf());
            }
        }
    }

    files.sort();
    files.dedup();
    tracing::debug!(count = files.len(), "discovered style files");
    Ok(files)
}

fn matches_name(glob_set: &GlobSet, path: &Path) -> bool {
    let file_name = path.file_name().unwrap_or_default().to_string_lossy();
    glob_set.is_match(&*file_name) || glob_set.is_match(path)
}

/// Load every file in parallel; each file is an independent fold.
pub fn check_all(files: &[PathBuf]) -> CheckResult {
    let mut outcomes: Vec<CheckOutcome> = files
        .par_iter()
        .map(|path| CheckOutcome {
            path: path.clone(),
            result: loader::load_file(path),
        })
        .collect();
    outcomes.sort_by(|a, b| a.path.cmp(&b.path));
    CheckResult { outcomes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn default_patterns_match_style_names() {
        let set = build_glob_set(DEFAULT_PATTERNS).unwrap();
        assert!(matches_name(&set, Path::new("repo/.mdl.rb")));
        assert!(matches_name(&set, Path::new("repo/docs.mdl.rb")));
        assert!(!matches_name(&set, Path::new("repo/README.md")));
        assert!(!matches_name(&set, Path::new("repo/lib.rb")));
    }

    #[test]
    fn invalid_glob() {
        assert!(matches!(
            discover(&[PathBuf::from(".")], &["a[b"]),
            Err(DiscoverError::GlobParse(_))
        ));
    }

    #[test]
    fn walks_and_checks() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".mdl.rb"), "all\nexclude_rule 'MD033'\n").unwrap();
        fs::create_dir(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs/site.mdl.rb"), "rule 'MD013' 80\n").unwrap();
        fs::write(dir.path().join("docs/notes.md"), "# hi\n").unwrap();

        let files = discover::<&str>(&[dir.path().to_path_buf()], &[]).unwrap();
        assert_eq!(files.len(), 2);

        let result = check_all(&files);
        assert!(result.has_failures());
        let failed: Vec<_> = result.failures().map(|o| o.path.clone()).collect();
        assert_eq!(failed, vec![dir.path().join("docs/site.mdl.rb")]);
    }
}
