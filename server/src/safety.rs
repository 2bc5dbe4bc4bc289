//! Checks that decide whether a local file may be served to a preview window.
//!
//! Every check runs at request time. Files are outside of our control and may
//! be moved, replaced or turned into symlinks after content was registered.

use std::path::{Component, Path, PathBuf, Prefix};

use unicase::UniCase;

#[cfg(windows)]
const DENYLIST: &[&str] = &[
    r"C:\Windows",
    r"C:\Program Files",
    r"C:\Program Files (x86)",
    r"C:\ProgramData",
    r"C:\Users\All Users",
];

#[cfg(target_os = "macos")]
const DENYLIST: &[&str] = &[
    "/System",
    "/Library",
    "/bin",
    "/sbin",
    "/usr",
    "/etc",
    "/dev",
    "/cores",
    "/var/root",
    "/private/etc",
    "/private/var/root",
    "/private/var/db",
];

#[cfg(all(unix, not(target_os = "macos")))]
const DENYLIST: &[&str] = &[
    "/etc", "/usr", "/var", "/bin", "/sbin", "/lib", "/lib64", "/boot", "/root", "/sys",
    "/proc", "/dev",
];

#[cfg(not(any(unix, windows)))]
const DENYLIST: &[&str] = &[];

/// Whether `path` names an existing regular file outside of the system
/// directories on the denylist.
///
/// Never fails: unresolvable paths, I/O errors and permission problems all
/// count as unsafe.
pub async fn is_path_safe(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();

    let Some(normalized) = normalize(path) else {
        tracing::debug!("cannot resolve path {}", path.display());
        return false;
    };

    if is_denylisted(&normalized) {
        tracing::warn!("blocked access to system path {}", normalized.display());
        return false;
    }

    // Follow symlinks so a link cannot smuggle a system file out.
    let resolved = match tokio::fs::canonicalize(&normalized).await {
        Ok(resolved) => resolved,
        Err(error) => {
            tracing::debug!("cannot resolve {}: {error}", normalized.display());
            return false;
        }
    };

    if is_denylisted(&resolved) {
        tracing::warn!(
            "blocked access to system path {} (via {})",
            resolved.display(),
            normalized.display()
        );
        return false;
    }

    match tokio::fs::metadata(&resolved).await {
        Ok(metadata) => metadata.is_file(),
        Err(error) => {
            tracing::debug!("cannot stat {}: {error}", resolved.display());
            false
        }
    }
}

/// Whether `requested` resolved against `base_dir` stays inside `base_dir`
/// and passes [`is_path_safe`].
pub async fn is_static_asset_safe(requested: &str, base_dir: impl AsRef<Path>) -> bool {
    resolve_static_asset(requested, base_dir).await.is_some()
}

/// Resolve a static asset request to the file that should be served.
pub async fn resolve_static_asset(requested: &str, base_dir: impl AsRef<Path>) -> Option<PathBuf> {
    let base = normalize(base_dir.as_ref())?;
    let target = normalize(&base.join(requested))?;

    if target == base || !target.starts_with(&base) {
        tracing::warn!("path traversal attempt blocked: {requested}");
        return None;
    }

    is_path_safe(&target).await.then_some(target)
}

/// Make `path` absolute and collapse `.` and `..` without touching the
/// filesystem. An empty path means the current directory.
pub fn normalize(path: &Path) -> Option<PathBuf> {
    let path = if path.as_os_str().is_empty() {
        Path::new(".")
    } else {
        path
    };
    let absolute = std::path::absolute(path).ok()?;
    let mut normalized = PathBuf::new();

    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `pop` refuses to remove the root, which clamps `/..` to `/`.
                normalized.pop();
            }
            component => normalized.push(component),
        }
    }

    Some(normalized)
}

fn is_denylisted(path: &Path) -> bool {
    DENYLIST
        .iter()
        .any(|root| starts_with_ignore_case(path, Path::new(root)))
}

fn starts_with_ignore_case(path: &Path, root: &Path) -> bool {
    let mut path = path.components();
    root.components().all(|expected| {
        path.next().is_some_and(|actual| {
            UniCase::new(component_key(actual)) == UniCase::new(component_key(expected))
        })
    })
}

fn component_key(component: Component) -> String {
    match component {
        // Treat `\\?\C:` (as returned by canonicalize) like `C:`.
        Component::Prefix(prefix) => match prefix.kind() {
            Prefix::Disk(letter) | Prefix::VerbatimDisk(letter) => {
                format!("{}:", letter as char)
            }
            _ => prefix.as_os_str().to_string_lossy().into_owned(),
        },
        component => component.as_os_str().to_string_lossy().into_owned(),
    }
}

#[cfg(all(test, unix, not(target_os = "macos")))]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_parent_segments() {
        assert_eq!(
            normalize(Path::new("/tmp/demo/../demo/./index.html")),
            Some(PathBuf::from("/tmp/demo/index.html"))
        );
        assert_eq!(normalize(Path::new("/../etc")), Some(PathBuf::from("/etc")));
    }

    #[test]
    fn test_normalize_empty_path() {
        let empty = normalize(Path::new("")).unwrap();
        assert!(empty.is_absolute());
        assert_eq!(normalize(&empty.join("b/..")), Some(empty));
    }

    #[test]
    fn test_denylist_ignores_case() {
        assert!(is_denylisted(Path::new("/etc/passwd")));
        assert!(is_denylisted(Path::new("/ETC/passwd")));
        assert!(is_denylisted(Path::new("/Usr/share/doc")));
        assert!(!is_denylisted(Path::new("/etcetera/file")));
        assert!(!is_denylisted(Path::new("/home/user/etc/file")));
    }

    #[tokio::test]
    async fn test_regular_file_is_safe() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file = temp_dir.path().join("index.html");
        std::fs::write(&file, "<p>hi</p>").unwrap();

        assert!(is_path_safe(&file).await);
    }

    #[tokio::test]
    async fn test_missing_file_is_unsafe() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(!is_path_safe(temp_dir.path().join("missing.html")).await);
    }

    #[tokio::test]
    async fn test_directory_is_unsafe() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(!is_path_safe(temp_dir.path()).await);
    }

    #[tokio::test]
    async fn test_system_paths_are_unsafe() {
        assert!(!is_path_safe("/etc/passwd").await);
        assert!(!is_path_safe("/etc/does-not-exist").await);
        assert!(!is_path_safe("/ETC/passwd").await);
        assert!(!is_path_safe("/tmp/../etc/hostname").await);
    }

    #[tokio::test]
    async fn test_symlink_into_system_path_is_unsafe() {
        let temp_dir = tempfile::tempdir().unwrap();
        let link = temp_dir.path().join("passwd.html");
        std::os::unix::fs::symlink("/etc/passwd", &link).unwrap();

        assert!(!is_path_safe(&link).await);
    }

    #[tokio::test]
    async fn test_static_asset_inside_base_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(temp_dir.path().join("img")).unwrap();
        std::fs::write(temp_dir.path().join("img/logo.png"), b"png").unwrap();

        assert!(is_static_asset_safe("img/logo.png", temp_dir.path()).await);
        assert!(is_static_asset_safe("img/../img/logo.png", temp_dir.path()).await);
        assert_eq!(
            resolve_static_asset("./img/logo.png", temp_dir.path()).await,
            Some(temp_dir.path().join("img/logo.png"))
        );
    }

    #[tokio::test]
    async fn test_static_asset_traversal_is_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let base = temp_dir.path().join("site");
        std::fs::create_dir(&base).unwrap();
        std::fs::write(temp_dir.path().join("secret.txt"), "secret").unwrap();

        assert!(!is_static_asset_safe("../secret.txt", &base).await);
        assert!(!is_static_asset_safe("a/../../secret.txt", &base).await);
        assert!(!is_static_asset_safe("../../../../etc/passwd", &base).await);
        assert!(!is_static_asset_safe("/etc/passwd", &base).await);
        assert!(!is_static_asset_safe("", &base).await);
    }

    #[tokio::test]
    async fn test_static_asset_sibling_prefix_is_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let base = temp_dir.path().join("site");
        let sibling = temp_dir.path().join("site2");
        std::fs::create_dir(&base).unwrap();
        std::fs::create_dir(&sibling).unwrap();
        std::fs::write(sibling.join("page.html"), "x").unwrap();

        assert!(!is_static_asset_safe("../site2/page.html", &base).await);
    }
}
