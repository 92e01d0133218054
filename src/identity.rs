// src/identity.rs
//! Stable post identity.
//!
//! A post id is `<source id>_<base64url(canonical url)>`. The same
//! (source, URL) pair yields the same id in every run and process, which is
//! what makes re-running the pipeline safe.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

/// Strip query string and fragment.
pub fn canonicalize(url: &str) -> String {
    let url = url.trim();
    let end = url.find(['?', '#']).unwrap_or(url.len());
    url[..end].to_string()
}

pub fn derive_id(source_id: &str, canonical_url: &str) -> String {
    format!("{source_id}_{}", URL_SAFE_NO_PAD.encode(canonical_url.as_bytes()))
}

/// Convenience for the common "raw feed link" case.
pub fn post_id_for_link(source_id: &str, link: &str) -> String {
    derive_id(source_id, &canonicalize(link))
}

/// Recover the canonical URL from an id produced by [`derive_id`].
pub fn canonical_url_from_id(source_id: &str, id: &str) -> Option<String> {
    let encoded = id.strip_prefix(source_id)?.strip_prefix('_')?;
    let bytes = URL_SAFE_NO_PAD.decode(encoded).ok()?;
    String::from_utf8(bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize_strips_query_and_fragment() {
        assert_eq!(canonicalize("https://x/y?a=1"), "https://x/y");
        assert_eq!(canonicalize("https://x/y#top"), "https://x/y");
        assert_eq!(canonicalize("https://x/y#frag?notquery"), "https://x/y");
        assert_eq!(canonicalize(" https://x/y "), "https://x/y");
    }

    #[test]
    fn ids_are_stable_and_key_safe() {
        let a = post_id_for_link("campus1", "https://blog.naver.com/abc/223?fromRss=true");
        let b = post_id_for_link("campus1", "https://blog.naver.com/abc/223");
        assert_eq!(a, b);
        assert!(!a.contains('/'));
        assert!(!a.contains('='));
        assert_ne!(a, post_id_for_link("campus1", "https://blog.naver.com/abc/224"));
        assert_ne!(a, post_id_for_link("campus2", "https://blog.naver.com/abc/223"));
    }

    #[test]
    fn id_decodes_back_to_url() {
        let id = derive_id("c", "https://x/y");
        assert_eq!(canonical_url_from_id("c", &id).as_deref(), Some("https://x/y"));
        assert_eq!(canonical_url_from_id("other", &id), None);
    }
}
