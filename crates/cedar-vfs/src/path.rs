//! Path resolution.
//!
//! Resolution is pure: the same input, cwd, user and bookmark snapshot always
//! produce the same absolute path. Only relative inputs get `.`/`..`
//! handling; an absolute input is split and rejoined as-is.

use std::borrow::Cow;
use std::collections::BTreeMap;

/// Split a path into its non-empty segments.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Join segments into an absolute path. No segments yields `/`.
pub fn join_segments<S: AsRef<str>>(segments: &[S]) -> String {
    let mut out = String::from("/");
    for (i, seg) in segments.iter().enumerate() {
        if i > 0 {
            out.push('/');
        }
        out.push_str(seg.as_ref());
    }
    out
}

/// Absolute path of `name` inside directory `dir`.
pub fn child_path(dir: &str, name: &str) -> String {
    if dir == "/" {
        format!("/{name}")
    } else {
        format!("{dir}/{name}")
    }
}

/// Last segment of a path, empty for the root.
pub fn leaf_name(path: &str) -> &str {
    split_path(path).last().copied().unwrap_or("")
}

/// Resolve user input to an absolute path.
///
/// In priority order:
/// 1. `@name` returns the bookmarked path verbatim; an unknown bookmark falls
///    through and is treated as a literal segment.
/// 2. `#/rest` (and bare `#`) is rooted at `/`.
/// 3. `~` and `~/rest` expand to `/home/<user>`.
/// 4. Absolute input is normalized by splitting and rejoining.
/// 5. Relative input is applied to `cwd`; `..` above the root is a no-op.
///
/// Empty input resolves to `cwd`.
pub fn resolve_path(
    input: &str,
    cwd: &str,
    user: &str,
    bookmarks: &BTreeMap<String, String>,
) -> String {
    if input.is_empty() {
        return cwd.to_string();
    }

    if let Some(name) = input.strip_prefix('@')
        && let Some(target) = bookmarks.get(name)
    {
        return target.clone();
    }

    let mut input: Cow<'_, str> = Cow::Borrowed(input);
    if let Some(rest) = input.strip_prefix("#/") {
        input = Cow::Owned(format!("/{rest}"));
    } else if input == "#" {
        input = Cow::Borrowed("/");
    }

    if input == "~" || input.starts_with("~/") {
        input = Cow::Owned(format!("/home/{user}{}", &input[1..]));
    }

    if input.starts_with('/') {
        return join_segments(&split_path(&input));
    }

    let mut out: Vec<&str> = split_path(cwd);
    for seg in split_path(&input) {
        match seg {
            "." => {},
            ".." => {
                out.pop();
            },
            other => out.push(other),
        }
    }
    join_segments(&out)
}
