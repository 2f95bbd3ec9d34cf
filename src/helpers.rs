use std::path::{Component, Path, PathBuf};

/// Sanitizes a remote file name so it stays relative: root, drive and `..`
/// components are removed, backslashes count as separators.
pub fn sanitize_input(input: &str) -> String {
    let normalized = input.replace('\\', "/");
    Path::new(&normalized)
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Local counterpart of a remote file: same name, inside `local_dir`.
pub fn resolve_local_path(local_dir: &Path, filename: &str) -> PathBuf {
    local_dir.join(sanitize_input(filename))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_input() {
        assert_eq!(sanitize_input("report.pdf"), "report.pdf");
        assert_eq!(sanitize_input("/etc/passwd"), "etc/passwd");
        assert_eq!(sanitize_input("../../secret"), "secret");
        assert_eq!(sanitize_input("a/./b/../c"), "a/b/c");
        assert_eq!(sanitize_input("..\\..\\win.ini"), "win.ini");
    }

    #[test]
    fn test_sanitize_input_leaves_no_parent_component() {
        for name in ["....//x", "..././x", ".../...//../x", "....\\\\x"] {
            let sanitized = sanitize_input(name);
            assert!(
                Path::new(&sanitized)
                    .components()
                    .all(|c| matches!(c, Component::Normal(_))),
                "{} -> {}",
                name,
                sanitized
            );
        }
    }

    #[test]
    fn test_resolve_local_path() {
        let path = resolve_local_path(Path::new("/tmp/downloads"), "../data.bin");
        assert_eq!(path, PathBuf::from("/tmp/downloads/data.bin"));

        let nested = resolve_local_path(Path::new("/tmp/downloads"), "....//x");
        assert!(nested.starts_with("/tmp/downloads"));
        assert_eq!(nested, PathBuf::from("/tmp/downloads/..../x"));
    }
}
