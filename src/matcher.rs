//! Request path to mock file resolution.
//!
//! Every `.json` file under the mock root describes a route. Its path minus
//! the `.json` suffix (and minus a trailing `index` segment) is split into
//! segments, where `_` matches any single non-empty request segment. When
//! several routes match, the one with the fewest wildcards wins.

use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

/// Segment value that acts as a wildcard in a route template.
pub const WILDCARD: &str = "_";

const MOCK_EXTENSION: &str = ".json";
const INDEX_SEGMENT: &str = "index";

/// Request segments captured by wildcards, left to right.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(Vec<String>);

impl PathParams {
    pub fn new(values: Vec<String>) -> Self {
        Self(values)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl<S: Into<String>> FromIterator<S> for PathParams {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Wildcard,
}

impl Segment {
    fn parse(raw: &str) -> Self {
        if raw == WILDCARD {
            Segment::Wildcard
        } else {
            Segment::Literal(raw.to_string())
        }
    }

    /// Whether this segment could line up with the given request segment.
    fn accepts(&self, request_segment: &str) -> bool {
        match self {
            Segment::Wildcard => !request_segment.is_empty(),
            Segment::Literal(lit) => lit == request_segment,
        }
    }
}

/// Route derived from a mock file path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTemplate {
    segments: Vec<Segment>,
}

impl RouteTemplate {
    /// Parses a `/`-separated route such as `users/_/profile`.
    pub fn parse(route: &str) -> Self {
        let segments = if route.is_empty() {
            Vec::new()
        } else {
            route.split('/').map(Segment::parse).collect()
        };
        Self { segments }
    }

    /// Derives the route for a mock file, given its path relative to the
    /// mock root. Returns `None` for anything that is not a `.json` file or
    /// whose path is not valid UTF-8.
    pub fn from_relative_path(relative: &Path) -> Option<Self> {
        let mut names = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(name) => names.push(name.to_str()?),
                Component::CurDir => {}
                _ => return None,
            }
        }

        let file_name = names.pop()?;
        let stem = file_name.strip_suffix(MOCK_EXTENSION)?;
        if stem != INDEX_SEGMENT {
            names.push(stem);
        }

        Some(Self {
            segments: names.into_iter().map(Segment::parse).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn wildcards(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Wildcard))
            .count()
    }

    /// Specificity: segment count minus wildcard count.
    pub fn score(&self) -> usize {
        self.len() - self.wildcards()
    }

    /// Matches the template against already split request segments,
    /// returning the captured wildcard values on success.
    pub fn matches(&self, request: &[&str]) -> Option<PathParams> {
        if self.segments.len() != request.len() {
            return None;
        }

        let mut captured = Vec::new();
        for (segment, value) in self.segments.iter().zip(request) {
            if !segment.accepts(value) {
                return None;
            }
            if let Segment::Wildcard = segment {
                captured.push((*value).to_string());
            }
        }

        Some(PathParams(captured))
    }
}

/// Winning mock file for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub file: PathBuf,
    pub params: PathParams,
    pub score: usize,
}

/// Scans the mock root for the best matching mock file.
///
/// `request_path` must already have its leading `/` stripped. Directory
/// read errors are logged and only skip the affected subtree. Among routes
/// with the same score the first one found wins; directory entries are
/// visited in name order. Request segments are percent-decoded before
/// matching, so captured values are decoded too.
pub fn find_mock(root: &Path, request_path: &str) -> Option<RouteMatch> {
    let decoded: Vec<String> = request_path.split('/').map(decode_segment).collect();
    let request: Vec<&str> = decoded.iter().map(String::as_str).collect();
    let mut best = None;
    scan_dir(root, root, 0, &request, &mut best);

    match &best {
        Some(found) => debug!(
            file = %found.file.display(),
            params = ?found.params.as_slice(),
            score = found.score,
            "matched mock file"
        ),
        None => debug!(path = request_path, "no mock file matched"),
    }

    best
}

fn scan_dir(
    root: &Path,
    dir: &Path,
    depth: usize,
    request: &[&str],
    best: &mut Option<RouteMatch>,
) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(dir = %dir.display(), error = %err, "skipping unreadable directory");
            return;
        }
    };

    let mut entries: Vec<_> = entries
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(dir = %dir.display(), error = %err, "skipping unreadable entry");
                None
            }
        })
        .collect();
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let path = entry.path();
        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping entry");
                continue;
            }
        };

        let (is_dir, is_file) = if file_type.is_symlink() {
            match fs::metadata(&path) {
                Ok(meta) => (meta.is_dir(), meta.is_file()),
                // Dangling links stay candidates; reading them fails later.
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "cannot resolve symlink");
                    (false, true)
                }
            }
        } else {
            (file_type.is_dir(), file_type.is_file())
        };

        if is_dir {
            // Every route below this directory starts with its name at
            // `depth`, so the subtree can be skipped when that cannot line up.
            let Some(request_segment) = request.get(depth) else {
                continue;
            };
            let accepted = entry
                .file_name()
                .to_str()
                .is_some_and(|name| Segment::parse(name).accepts(request_segment));
            if accepted {
                scan_dir(root, &path, depth + 1, request, best);
            }
        } else if is_file {
            consider_file(root, path, request, best);
        }
    }
}

/// Decodes `%XX` escapes in one path segment. Malformed escapes are kept
/// as is; invalid UTF-8 is replaced.
fn decode_segment(segment: &str) -> String {
    if !segment.contains('%') {
        return segment.to_string();
    }

    let bytes = segment.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let byte = segment
                .get(i + 1..i + 3)
                .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
                .and_then(|hex| u8::from_str_radix(hex, 16).ok());
            if let Some(byte) = byte {
                decoded.push(byte);
                i += 3;
                continue;
            }
        }
        decoded.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&decoded).into_owned()
}

fn consider_file(root: &Path, path: PathBuf, request: &[&str], best: &mut Option<RouteMatch>) {
    let Ok(relative) = path.strip_prefix(root) else {
        return;
    };
    let Some(template) = RouteTemplate::from_relative_path(relative) else {
        return;
    };
    let Some(params) = template.matches(request) else {
        return;
    };

    let score = template.score();
    if best.as_ref().is_none_or(|current| score > current.score) {
        *best = Some(RouteMatch {
            file: path,
            params,
            score,
        });
    }
}
