//! Working directory layout and guarded cleanup
//!
//! Page images live in `<root>/images/page_NNNN.jpg`. The directory doubles
//! as a resumability cache: a page file larger than the minimum size is
//! considered complete and is never fetched again.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::app::models::DocumentId;
use crate::constants::files;
use crate::errors::{AssemblyError, AssemblyResult};

/// On-disk layout of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Default workspace for a document: `gallica_<id>`
    pub fn default_root(id: &DocumentId) -> PathBuf {
        PathBuf::from(default_dir_name(id))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn images_dir(&self) -> PathBuf {
        self.root.join(files::IMAGES_DIR)
    }

    /// Location of the page with the given 1-based ordinal
    pub fn page_path(&self, ordinal: usize) -> PathBuf {
        self.images_dir().join(format!(
            "{}{:04}.{}",
            files::PAGE_FILE_PREFIX,
            ordinal,
            files::PAGE_FILE_EXTENSION
        ))
    }

    /// Create the image directory
    pub async fn prepare(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(self.images_dir()).await
    }

    /// Page paths for ordinals `1..=count`, in document order
    pub fn expected_pages(&self, count: usize) -> Vec<PathBuf> {
        (1..=count).map(|ordinal| self.page_path(ordinal)).collect()
    }

    /// First expected page that is not on disk, in document order
    pub fn first_missing(&self, count: usize) -> Option<PathBuf> {
        self.expected_pages(count)
            .into_iter()
            .find(|path| !path.exists())
    }

    /// Check that every expected page exists before assembly
    ///
    /// # Errors
    ///
    /// Returns `AssemblyError::MissingPage` naming the first missing file.
    pub fn ensure_complete(&self, count: usize) -> AssemblyResult<Vec<PathBuf>> {
        if let Some(path) = self.first_missing(count) {
            let missing = self
                .expected_pages(count)
                .iter()
                .filter(|path| !path.exists())
                .count();
            return Err(AssemblyError::MissingPage { path, missing });
        }
        Ok(self.expected_pages(count))
    }
}

/// Whether a page file is present and larger than `min_bytes`
pub fn is_page_complete(path: &Path, min_bytes: u64) -> bool {
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.len() > min_bytes)
        .unwrap_or(false)
}

/// Temporary sibling used while a file is being written: `<path>.part`
pub fn partial_path(destination: &Path) -> PathBuf {
    let mut name = OsString::from(destination.as_os_str());
    name.push(files::TEMP_FILE_SUFFIX);
    PathBuf::from(name)
}

fn default_dir_name(id: &DocumentId) -> String {
    format!("{}{}", files::WORKSPACE_PREFIX, id)
}

/// Result of a cleanup request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// The directory was deleted
    Removed(PathBuf),
    /// The directory was left in place
    Refused(RefusalReason),
}

/// Why a directory was not deleted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefusalReason {
    /// Filesystem root, home directory or current directory
    CriticalDirectory(PathBuf),
    /// Directory name is not `gallica_<id>`
    UnexpectedName { found: String, expected: String },
}

impl fmt::Display for RefusalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefusalReason::CriticalDirectory(path) => {
                write!(f, "refusing to delete critical directory {}", path.display())
            }
            RefusalReason::UnexpectedName { found, expected } => write!(
                f,
                "refusing to delete '{}' (expected '{}'); keep it with --keep or use the default name",
                found, expected
            ),
        }
    }
}

/// Delete the workspace unless it looks like something other than ours
///
/// The resolved path must not be `/`, the home directory or the current
/// directory, and its name must be exactly `gallica_<id>`.
///
/// # Errors
///
/// Returns the I/O error if resolution or deletion fails.
pub fn safe_remove(root: &Path, id: &DocumentId) -> std::io::Result<CleanupOutcome> {
    let resolved = root.canonicalize()?;

    if let Some(reason) = refusal(&resolved, id, &critical_directories()) {
        debug!("Cleanup refused for {}", resolved.display());
        return Ok(CleanupOutcome::Refused(reason));
    }

    std::fs::remove_dir_all(&resolved)?;
    info!("Removed workspace {}", resolved.display());
    Ok(CleanupOutcome::Removed(resolved))
}

/// `/`, the home directory and the current directory, resolved where possible
fn critical_directories() -> Vec<PathBuf> {
    [
        Some(PathBuf::from("/")),
        dirs::home_dir(),
        std::env::current_dir().ok(),
    ]
    .into_iter()
    .flatten()
    .map(|candidate| candidate.canonicalize().unwrap_or(candidate))
    .collect()
}

fn refusal(resolved: &Path, id: &DocumentId, critical: &[PathBuf]) -> Option<RefusalReason> {
    if critical.iter().any(|candidate| candidate == resolved) {
        return Some(RefusalReason::CriticalDirectory(resolved.to_path_buf()));
    }

    let expected = default_dir_name(id);
    let found = resolved
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    (found != expected).then_some(RefusalReason::UnexpectedName { found, expected })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn doc() -> DocumentId {
        DocumentId::from_bare("bd6t54208770t").unwrap()
    }

    #[test]
    fn test_page_layout() {
        let workspace = Workspace::new("gallica_bd6t54208770t");
        assert_eq!(
            workspace.page_path(7),
            PathBuf::from("gallica_bd6t54208770t/images/page_0007.jpg")
        );
        assert_eq!(
            workspace.page_path(1234),
            PathBuf::from("gallica_bd6t54208770t/images/page_1234.jpg")
        );
        assert_eq!(
            Workspace::default_root(&doc()),
            PathBuf::from("gallica_bd6t54208770t")
        );
    }

    #[test]
    fn test_partial_path_appends_suffix() {
        let path = Path::new("gallica_x/images/page_0003.jpg");
        assert_eq!(
            partial_path(path),
            PathBuf::from("gallica_x/images/page_0003.jpg.part")
        );
    }

    #[test]
    fn test_page_completeness_threshold() {
        let temp_dir = tempdir().unwrap();
        let small = temp_dir.path().join("small.jpg");
        let exact = temp_dir.path().join("exact.jpg");
        let large = temp_dir.path().join("large.jpg");
        std::fs::write(&small, vec![0u8; 10]).unwrap();
        std::fs::write(&exact, vec![0u8; 50_000]).unwrap();
        std::fs::write(&large, vec![0u8; 50_001]).unwrap();

        assert!(!is_page_complete(&small, files::MIN_PAGE_BYTES));
        assert!(!is_page_complete(&exact, files::MIN_PAGE_BYTES));
        assert!(is_page_complete(&large, files::MIN_PAGE_BYTES));
        assert!(!is_page_complete(
            &temp_dir.path().join("absent.jpg"),
            files::MIN_PAGE_BYTES
        ));
    }

    #[tokio::test]
    async fn test_ensure_complete_names_first_missing_page() {
        let temp_dir = tempdir().unwrap();
        let workspace = Workspace::new(temp_dir.path().join("gallica_x"));
        workspace.prepare().await.unwrap();
        std::fs::write(workspace.page_path(1), b"jpeg").unwrap();
        std::fs::write(workspace.page_path(3), b"jpeg").unwrap();
        assert_eq!(workspace.first_missing(4), Some(workspace.page_path(2)));

        match workspace.ensure_complete(4) {
            Err(AssemblyError::MissingPage { path, missing }) => {
                assert_eq!(path, workspace.page_path(2));
                assert_eq!(missing, 2);
            }
            other => panic!("Expected MissingPage, got {:?}", other),
        }

        std::fs::write(workspace.page_path(2), b"jpeg").unwrap();
        assert_eq!(workspace.first_missing(3), None);
        let pages = workspace.ensure_complete(3).unwrap();
        assert_eq!(pages, workspace.expected_pages(3));
    }

    #[test]
    fn test_safe_remove_deletes_default_workspace() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path().join("gallica_bd6t54208770t");
        std::fs::create_dir_all(root.join("images")).unwrap();
        std::fs::write(root.join("images/page_0001.jpg"), b"jpeg").unwrap();

        let outcome = safe_remove(&root, &doc()).unwrap();
        assert!(matches!(outcome, CleanupOutcome::Removed(_)));
        assert!(!root.exists());
    }

    #[test]
    fn test_safe_remove_refuses_unexpected_name() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path().join("my_scans");
        std::fs::create_dir_all(&root).unwrap();

        let outcome = safe_remove(&root, &doc()).unwrap();
        match outcome {
            CleanupOutcome::Refused(RefusalReason::UnexpectedName { found, expected }) => {
                assert_eq!(found, "my_scans");
                assert_eq!(expected, "gallica_bd6t54208770t");
            }
            other => panic!("Expected refusal, got {:?}", other),
        }
        assert!(root.exists());
    }

    #[test]
    fn test_safe_remove_refuses_home_directory() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        if !home.exists() {
            return;
        }

        let outcome = safe_remove(&home, &doc()).unwrap();
        assert!(matches!(
            outcome,
            CleanupOutcome::Refused(RefusalReason::CriticalDirectory(_))
        ));
        assert!(home.exists());
    }

    #[test]
    fn test_safe_remove_refuses_current_directory() {
        let cwd = std::env::current_dir().unwrap();
        let outcome = safe_remove(&cwd, &doc()).unwrap();
        assert!(matches!(
            outcome,
            CleanupOutcome::Refused(RefusalReason::CriticalDirectory(_))
        ));
        assert!(cwd.exists());
    }

    #[test]
    fn test_current_directory_refused_even_with_workspace_name() {
        let temp_dir = tempdir().unwrap();
        let cwd = temp_dir.path().join("gallica_bd6t54208770t");
        std::fs::create_dir_all(&cwd).unwrap();
        let cwd = cwd.canonicalize().unwrap();

        assert_eq!(refusal(&cwd, &doc(), &[]), None);
        assert_eq!(
            refusal(&cwd, &doc(), &[cwd.clone()]),
            Some(RefusalReason::CriticalDirectory(cwd.clone()))
        );
    }

    #[test]
    fn test_safe_remove_refuses_filesystem_root() {
        let outcome = safe_remove(Path::new("/"), &doc()).unwrap();
        assert!(matches!(outcome, CleanupOutcome::Refused(_)));
    }

    #[test]
    fn test_refusal_reason_is_readable() {
        let reason = RefusalReason::UnexpectedName {
            found: "scans".to_string(),
            expected: "gallica_x".to_string(),
        };
        assert!(reason.to_string().contains("--keep"));
    }
}
