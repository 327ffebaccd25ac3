//! Referrer classification: maps a referring URL to the search engine it
//! came from and the phrase that was searched for.

use keyword_core::types::SearchEngine;
use url::Url;

/// Host substrings checked in precedence order.
const HOST_RULES: [(&str, SearchEngine); 3] = [
    ("google", SearchEngine::Google),
    ("bing", SearchEngine::Msn),
    ("yahoo", SearchEngine::Yahoo),
];

/// Parse the referrer and match its authority. Blank or unparseable
/// referrers classify as `None`.
fn classify_url(referrer: Option<&str>) -> Option<(Url, SearchEngine)> {
    let referrer = referrer.filter(|r| !r.is_empty())?;
    let url = Url::parse(referrer).ok()?;
    url.host_str()?;
    let engine = engine_for_host(raw_authority(referrer)?)?;
    Some((url, engine))
}

/// Authority exactly as written in the referrer (userinfo and port
/// included). The parsed host is lower-cased, so matching uses this instead.
fn raw_authority(referrer: &str) -> Option<&str> {
    let (_, rest) = referrer.split_once("//")?;
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    Some(&rest[..end])
}

/// Case-sensitive substring match against the host; first rule wins.
pub fn engine_for_host(host: &str) -> Option<SearchEngine> {
    HOST_RULES
        .iter()
        .find(|(needle, _)| host.contains(needle))
        .map(|(_, engine)| *engine)
}

/// Search engine the referrer points at, if any.
pub fn classify_domain(referrer: Option<&str>) -> Option<SearchEngine> {
    classify_url(referrer).map(|(_, engine)| engine)
}

/// Search phrase carried in the referrer's query string (`q` for Google and
/// Bing, `p` for Yahoo). Repeated parameters are concatenated without a
/// separator. Case is left untouched.
pub fn extract_keyword(referrer: Option<&str>) -> Option<String> {
    let (url, engine) = classify_url(referrer)?;
    let param = engine.keyword_param();

    let values: Vec<String> = url
        .query_pairs()
        .filter(|(name, value)| *name == param && !value.is_empty())
        .map(|(_, value)| value.into_owned())
        .collect();

    if values.is_empty() {
        None
    } else {
        Some(values.concat())
    }
}
