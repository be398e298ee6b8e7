use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Name of the user-declared ignore file at the project root, one
/// project-relative path per line.
pub const IGNORE_FILE_NAME: &str = ".grepignore";

/// Set of absolute path prefixes excluded from indexing.
///
/// Always contains the cache's own directory; extended by `.grepignore`
/// entries resolved against the project root.
#[derive(Debug, Clone)]
pub struct IgnorePolicy {
    prefixes: Vec<PathBuf>,
}

impl IgnorePolicy {
    pub async fn load(project_dir: &Path, cache_root: &Path) -> Self {
        let mut prefixes = vec![cache_root.to_path_buf()];

        let ignore_file = project_dir.join(IGNORE_FILE_NAME);
        match tokio::fs::read_to_string(&ignore_file).await {
            Ok(contents) => {
                for line in contents.lines() {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    prefixes.push(project_dir.join(line));
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                log::warn!("Could not read {}: {e}", ignore_file.display());
            }
        }

        Self { prefixes }
    }

    /// A path is ignored when it starts with any prefix in the set.
    #[must_use]
    pub fn is_ignored(&self, path: &Path) -> bool {
        self.prefixes.iter().any(|prefix| path.starts_with(prefix))
    }

    #[must_use]
    pub fn prefixes(&self) -> &[PathBuf] {
        &self.prefixes
    }
}
