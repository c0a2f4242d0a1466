//! Request sub-path sanitizing.
//!
//! Every content and metadata lookup goes through [`sanitize`] before touching
//! storage. The result is always a descendant of the root it was given.

use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};

/// Page served when a request names no page.
pub const DEFAULT_PAGE: &str = "intro";

/// Join a requested sub-path onto `root` without letting it escape.
///
/// `.` and empty segments are dropped, `..` pops the previous segment, and a
/// `..` with nothing left to pop fails with [`CoreError::PathTraversal`].
/// Leading separators are ignored, so `/intro` and `intro` are equivalent.
/// An empty request resolves to [`DEFAULT_PAGE`] rather than to `root` itself.
///
/// This is purely lexical; it does not consult the filesystem.
pub fn sanitize(root: &Path, requested: &str) -> Result<PathBuf> {
    let mut segments: Vec<&str> = Vec::new();

    for segment in requested.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(CoreError::traversal(requested));
                }
            }
            s if s.contains('\0') => return Err(CoreError::traversal(requested)),
            // Drive prefixes such as `C:` would replace the root on Windows.
            s if is_drive_prefix(s) => return Err(CoreError::traversal(requested)),
            s => segments.push(s),
        }
    }

    if segments.is_empty() {
        segments.push(DEFAULT_PAGE);
    }

    let path = segments
        .iter()
        .fold(root.to_path_buf(), |path, segment| path.join(segment));

    debug_assert!(path.starts_with(root));
    Ok(path)
}

fn is_drive_prefix(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}
