use std::collections::HashSet;

use url::Url;

/// Binary file extensions that are never worth fetching.
const EXCLUDED_EXTENSIONS: [&str; 7] = [".pdf", ".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg"];

/// Decides whether a discovered URL is eligible for crawling.
///
/// A candidate passes when it shares the seed's scheme and host, starts with
/// the seed URL as a string prefix, has not been visited, does not point at a
/// binary asset, and is not on the exact-URL deny list. The string-prefix
/// rule is stricter than a same-host check: same-host pages outside the
/// subtree rooted at the seed path are excluded.
#[derive(Debug, Clone)]
pub struct LinkFilter {
    base: Url,
    base_str: String,
    deny_urls: Vec<String>,
}

impl LinkFilter {
    pub fn new(base: &Url, extra_skip_urls: &[String]) -> Self {
        let base_str = base.as_str().to_owned();
        // Known logout/anchor traps relative to the seed, plus any the caller
        // names explicitly.
        let mut deny_urls = vec![format!("{base_str}#!"), format!("{base_str}?logout=true")];
        deny_urls.extend(extra_skip_urls.iter().cloned());

        Self {
            base: base.clone(),
            base_str,
            deny_urls,
        }
    }

    /// Full eligibility check for a candidate discovered on a page.
    pub fn is_eligible(&self, candidate: &Url, visited: &HashSet<String>) -> bool {
        self.is_internal(candidate) && self.passes_prefetch(candidate, visited)
    }

    /// The subset of checks applied to a URL again right before it is
    /// fetched: dedup, extension deny list and exact-URL deny list.
    pub fn passes_prefetch(&self, candidate: &Url, visited: &HashSet<String>) -> bool {
        !visited.contains(candidate.as_str())
            && !has_excluded_extension(candidate)
            && !self.is_denied(candidate)
    }

    fn is_internal(&self, candidate: &Url) -> bool {
        candidate.scheme() == self.base.scheme()
            && candidate.host_str() == self.base.host_str()
            && candidate.as_str().starts_with(&self.base_str)
    }

    fn is_denied(&self, candidate: &Url) -> bool {
        self.deny_urls.iter().any(|deny| deny == candidate.as_str())
    }
}

fn has_excluded_extension(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    EXCLUDED_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}
