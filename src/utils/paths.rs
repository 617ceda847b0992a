use std::path::{Component, Path, PathBuf};

/// Joins `rel` under `root` keeping only normal components, so `..`, root
/// and prefix components cannot escape `root`.
pub(crate) fn sanitize_join(root: &Path, rel: &str) -> PathBuf {
    let mut out = root.to_path_buf();
    for comp in Path::new(rel).components() {
        if let Component::Normal(s) = comp {
            out.push(s);
        }
    }
    out
}

/// True when `path` exists and is a regular file.
pub(crate) async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .is_ok_and(|meta| meta.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traversal_stays_under_root() {
        let root = Path::new("/srv/site");
        assert_eq!(
            sanitize_join(root, "../../etc/passwd"),
            PathBuf::from("/srv/site/etc/passwd")
        );
        assert_eq!(
            sanitize_join(root, "/assets/js/app.js"),
            PathBuf::from("/srv/site/assets/js/app.js")
        );
        assert_eq!(sanitize_join(root, "./a/./b"), PathBuf::from("/srv/site/a/b"));
    }
}
