//! Path resolution module
//!
//! Turns an untrusted request path into a filesystem path confined to the
//! content root. Everything here is lexical: the filesystem is never touched
//! after the root itself has been canonicalized.

use percent_encoding::percent_decode_str;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Canonical, absolute directory every served path must live under
#[derive(Debug, Clone)]
pub struct ContentRoot(PathBuf);

impl ContentRoot {
    /// Canonicalize `path` and make sure it is a directory
    pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
        let canonical = path.as_ref().canonicalize()?;
        if !canonical.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Content root is not a directory: {}", canonical.display()),
            ));
        }
        Ok(Self(canonical))
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Segment-wise containment: `/srv/root-evil` is not inside `/srv/root`
    pub fn contains(&self, candidate: &Path) -> bool {
        candidate.starts_with(&self.0)
    }
}

impl fmt::Display for ContentRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Absolute path guaranteed to lie inside a `ContentRoot`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath(PathBuf);

impl ResolvedPath {
    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

/// Why a request path could not be mapped under the root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Undecodable or unsafe input (400)
    Malformed(&'static str),
    /// Path would land outside the content root (403)
    Forbidden,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(reason) => write!(f, "malformed request path: {reason}"),
            Self::Forbidden => f.write_str("request path escapes the content root"),
        }
    }
}

impl std::error::Error for Rejection {}

/// Map a raw (still percent-encoded) URL path under `root`.
///
/// The path is decoded exactly once, normalized lexically (`.`, `..` and
/// empty segments collapse; `..` never climbs above the root) and joined onto
/// the root, then checked for containment.
pub fn resolve(root: &ContentRoot, raw_path: &str) -> Result<ResolvedPath, Rejection> {
    let decoded = decode_path(raw_path)?;
    let segments = normalize_segments(&decoded);
    let mut candidate = root.as_path().to_path_buf();
    candidate.extend(segments);
    confine(root, candidate)
}

/// Final containment gate for a candidate absolute path
pub fn confine(root: &ContentRoot, candidate: PathBuf) -> Result<ResolvedPath, Rejection> {
    if root.contains(&candidate) {
        Ok(ResolvedPath(candidate))
    } else {
        Err(Rejection::Forbidden)
    }
}

/// Percent-decode once, refusing anything the filesystem layer should never see
fn decode_path(raw_path: &str) -> Result<String, Rejection> {
    // percent_decode_str passes broken escapes through untouched; reject them instead
    let escapes_valid = raw_path.split('%').skip(1).all(|rest| {
        rest.as_bytes()
            .get(..2)
            .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit))
    });
    if !escapes_valid {
        return Err(Rejection::Malformed("invalid percent escape"));
    }

    let decoded = percent_decode_str(raw_path)
        .decode_utf8()
        .map_err(|_| Rejection::Malformed("path is not valid UTF-8"))?;

    if decoded.chars().any(char::is_control) {
        return Err(Rejection::Malformed("control character in path"));
    }
    // A decoded backslash is a separator on Windows
    if decoded.contains('\\') {
        return Err(Rejection::Malformed("backslash in path"));
    }

    Ok(decoded.into_owned())
}

/// Collapse `.`, `..` and empty segments without touching the filesystem.
/// Leading `..` segments have nothing to pop and are dropped.
fn normalize_segments(path: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            normal => segments.push(normal),
        }
    }
    segments
}
