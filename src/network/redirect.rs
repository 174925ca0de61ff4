// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Alternate-extension redirect resolution

use url::Url;

use super::request::file_name;

/// Compute the redirect target for a request to an alternate-extension file
///
/// The final path segment is split on `.`, its last piece dropped and the
/// source suffix appended, so `/lib/foo.min.js` becomes `/lib/foo.min.ts`.
/// Query and fragment are kept. Returns `None` when the final segment has no
/// extension to replace.
pub fn resolve_redirect(url: &Url, source_suffix: &str) -> Option<Url> {
    let name = file_name(url)?;
    let stem = file_stem(name)?;

    // Work on the serialized path so existing percent-escapes are kept as is
    let path = url.path();
    let dir = &path[..path.len() - name.len()];

    let mut target = url.clone();
    target.set_path(&format!("{}{}.{}", dir, stem, source_suffix));
    Some(target)
}

/// File name minus its last `.`-separated piece; `None` for names without an
/// extension or with only a leading dot (`.js`)
pub(crate) fn file_stem(name: &str) -> Option<&str> {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(stem),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_simple_redirect() {
        let target = resolve_redirect(&url("https://localhost/app.js"), "ts").unwrap();
        assert_eq!(target.as_str(), "https://localhost/app.ts");
    }

    #[test]
    fn test_only_last_extension_replaced() {
        let target = resolve_redirect(&url("http://localhost:8080/v1.2/foo.min.js?x=1#top"), "ts")
            .unwrap();
        assert_eq!(target.as_str(), "http://localhost:8080/v1.2/foo.min.ts?x=1#top");
    }

    #[test]
    fn test_differs_only_in_extension() {
        let original = url("https://localhost/a/b/c.js?q");
        let target = resolve_redirect(&original, "ts").unwrap();
        assert_eq!(target.scheme(), original.scheme());
        assert_eq!(target.host_str(), original.host_str());
        assert_eq!(target.query(), original.query());
        assert_eq!(
            original.path().trim_end_matches("js"),
            target.path().trim_end_matches("ts")
        );
    }

    #[test]
    fn test_no_extension() {
        assert!(resolve_redirect(&url("https://localhost/app"), "ts").is_none());
        assert!(resolve_redirect(&url("https://localhost/.js"), "ts").is_none());
        assert!(resolve_redirect(&url("https://localhost/app."), "ts").is_none());
        assert!(resolve_redirect(&url("https://localhost/dir/"), "ts").is_none());
    }

    #[test]
    fn test_escapes_preserved() {
        let target = resolve_redirect(&url("https://localhost/my%20app.js"), "ts").unwrap();
        assert_eq!(target.path(), "/my%20app.ts");
    }
}
