//! Asset paths and their mapping onto fetch URLs.
//!
//! Sprite folders use human-readable names (`2-Enemy-Bald Pirate`,
//! `11-Throw (Bomb)`), so every `/`-separated segment is percent-encoded on
//! its own before it is joined onto the asset origin. Separators are never
//! encoded.
//!
//! Root-relative (`/Sprites/..`) and dot-relative (`./Sprites/..`) inputs
//! normalize to one relative form. Absolute URLs are kept as written and
//! stripped of the origin when resolved, so an absolute URL under the origin
//! and its relative variants all resolve to the same resource.

use std::fmt;

use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetPath(String);

impl AssetPath {
    pub fn new(raw: &str) -> Self {
        Self(normalize(raw, None))
    }

    /// Like `new`, but also strips `origin` when `raw` is an absolute URL under it.
    pub fn under_origin(raw: &str, origin: &Url) -> Self {
        Self(normalize(raw, Some(origin)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append one path segment (unencoded).
    pub fn join(&self, segment: &str) -> Self {
        let segment = segment.trim_matches('/');
        if self.0.is_empty() {
            Self(segment.to_string())
        } else {
            Self(format!("{}/{}", self.0, segment))
        }
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Percent-encode each segment, keeping `/` separators.
    pub fn encoded(&self) -> String {
        self.segments()
            .map(encode_segment)
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Whether this path is a full URL rather than one relative to the origin.
    pub fn is_absolute(&self) -> bool {
        is_absolute(&self.0)
    }

    /// Resolve against the asset origin into the final fetch URL. Absolute
    /// URLs under the origin resolve exactly like their relative form; other
    /// absolute URLs are used as they are.
    pub fn resolve(&self, origin: &Url) -> Result<Url, String> {
        if self.is_absolute() {
            return match strip_origin(&self.0, origin) {
                Some(rest) => Self(collapse(rest)).resolve(origin),
                None => Url::parse(&self.0)
                    .map_err(|e| format!("Invalid asset URL '{}': {e}", self.0)),
            };
        }
        let base = directory_base(origin);
        base.join(&self.encoded())
            .map_err(|e| format!("Failed to resolve '{}' against '{}': {e}", self.0, origin))
    }
}

impl fmt::Display for AssetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetPath {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

pub fn encode_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

pub fn decode_segment(encoded: &str) -> Result<String, String> {
    urlencoding::decode(encoded)
        .map(|s| s.into_owned())
        .map_err(|e| format!("Segment '{encoded}' is not valid UTF-8 after decoding: {e}"))
}

fn normalize(raw: &str, origin: Option<&Url>) -> String {
    let raw = raw.trim();
    if !is_absolute(raw) {
        return collapse(raw);
    }
    match origin.and_then(|origin| strip_origin(raw, origin)) {
        Some(rest) => collapse(rest),
        None => raw.trim_end_matches('/').to_string(),
    }
}

fn collapse(raw: &str) -> String {
    raw.split('/')
        .filter(|seg| !seg.is_empty() && *seg != ".")
        .collect::<Vec<_>>()
        .join("/")
}

fn is_absolute(raw: &str) -> bool {
    raw.split_once("://").is_some_and(|(scheme, _)| {
        !scheme.is_empty()
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

/// The part of `raw` below `origin`, if `raw` is under it.
fn strip_origin<'a>(raw: &'a str, origin: &Url) -> Option<&'a str> {
    let prefix = origin.as_str().trim_end_matches('/');
    let rest = raw.strip_prefix(prefix)?;
    (rest.is_empty() || rest.starts_with('/')).then_some(rest)
}

// Url::join drops the last segment of a base without a trailing slash.
fn directory_base(origin: &Url) -> Url {
    if origin.path().ends_with('/') {
        return origin.clone();
    }
    let mut base = origin.clone();
    let path = format!("{}/", origin.path());
    base.set_path(&path);
    base
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("http://localhost:3000/").expect("valid origin")
    }

    #[test]
    fn encodes_spaces_and_parentheses_per_segment() {
        let path = AssetPath::new("Sprites/2-Enemy-Bald Pirate/11-Throw (Bomb)");
        assert_eq!(
            path.encoded(),
            "Sprites/2-Enemy-Bald%20Pirate/11-Throw%20%28Bomb%29"
        );
    }

    #[test]
    fn encoded_segments_decode_back_to_original() {
        for folder in ["2-Enemy-Bald Pirate", "3-Jump Anticipation", "8-Swalow (Bomb)"] {
            let path = AssetPath::new("Sprites").join(folder);
            let url = path.resolve(&origin()).expect("resolves");
            let last = url
                .path_segments()
                .and_then(|mut segs| segs.next_back())
                .expect("has segments")
                .to_string();
            assert_eq!(decode_segment(&last).expect("decodes"), folder);
        }
    }

    #[test]
    fn absolute_and_relative_variants_resolve_identically() {
        let origin = origin();
        let variants = [
            "Sprites/1-Player-Bomb Guy/1-Idle/1.png",
            "./Sprites/1-Player-Bomb Guy/1-Idle/1.png",
            "/Sprites/1-Player-Bomb Guy/1-Idle/1.png",
            "http://localhost:3000/Sprites/1-Player-Bomb Guy/1-Idle/1.png",
        ];
        let urls: Vec<Url> = variants
            .iter()
            .map(|v| AssetPath::under_origin(v, &origin).resolve(&origin).unwrap())
            .collect();
        for url in &urls {
            assert_eq!(url, &urls[0]);
        }
        assert_eq!(
            urls[0].as_str(),
            "http://localhost:3000/Sprites/1-Player-Bomb%20Guy/1-Idle/1.png"
        );
    }

    #[test]
    fn absolute_paths_are_resolved_against_the_origin() {
        let origin = origin();
        let absolute = AssetPath::new("http://localhost:3000/Sprites/1-Player-Bomb Guy/1-Idle");
        assert!(absolute.is_absolute());
        let url = absolute.join("1.png").resolve(&origin).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:3000/Sprites/1-Player-Bomb%20Guy/1-Idle/1.png"
        );

        let foreign = AssetPath::new("https://cdn.example.com/Sprites/a.png");
        assert_eq!(
            foreign.resolve(&origin).unwrap().as_str(),
            "https://cdn.example.com/Sprites/a.png"
        );
        // Same host, different port: not under the origin.
        let other_port = AssetPath::new("http://localhost:30001/a.png");
        assert_eq!(
            other_port.resolve(&origin).unwrap().as_str(),
            "http://localhost:30001/a.png"
        );
    }

    #[test]
    fn origin_with_subdirectory_keeps_its_path() {
        let origin = Url::parse("https://cdn.example.com/game").unwrap();
        let url = AssetPath::new("Sprites/8-Tile-Sets/blocks.png")
            .resolve(&origin)
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://cdn.example.com/game/Sprites/8-Tile-Sets/blocks.png"
        );
    }

    #[test]
    fn join_trims_slashes() {
        let path = AssetPath::new("Sprites/").join("/1-Idle/");
        assert_eq!(path.as_str(), "Sprites/1-Idle");
        assert_eq!(AssetPath::new("").join("a").as_str(), "a");
    }
}
