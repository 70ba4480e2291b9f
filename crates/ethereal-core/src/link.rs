//! Content paths, share links and deep links.
//!
//! An animation `x` is served at `data/x.html`; a share link is the viewer's
//! base URL with `?animation=x`.

pub const DEEP_LINK_PARAM: &str = "animation";

/// Path of an animation document relative to the content root.
pub fn content_path(animation: &str) -> String {
    format!("data/{}.html", animation)
}

/// Absolute URL of an animation document under `base`.
pub fn content_url(base: &str, animation: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        content_path(&urlencoding::encode(animation))
    )
}

/// Share link that opens the viewer on `animation`.
pub fn share_url(base: &str, animation: &str) -> String {
    let base = base.split(['?', '#']).next().unwrap_or(base);
    format!(
        "{}?{}={}",
        base,
        DEEP_LINK_PARAM,
        urlencoding::encode(animation)
    )
}

/// The `animation` parameter of a query string (with or without the leading
/// `?`).  Empty values count as absent.
pub fn deep_link_from_query(query: &str) -> Option<String> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == DEEP_LINK_PARAM)
        .and_then(|(_, value)| {
            urlencoding::decode(&value.replace('+', " "))
                .ok()
                .map(|decoded| decoded.into_owned())
        })
        .filter(|value| !value.is_empty())
}

/// The `animation` parameter of a full URL, if it has a query.
pub fn deep_link_from_url(url: &str) -> Option<String> {
    let (_, query) = url.split_once('?')?;
    let query = query.split('#').next().unwrap_or(query);
    deep_link_from_query(query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_links_round_trip_through_deep_link_parsing() {
        let url = share_url("http://127.0.0.1:8990/", "aurora veil");
        assert_eq!(url, "http://127.0.0.1:8990/?animation=aurora%20veil");
        assert_eq!(deep_link_from_url(&url).as_deref(), Some("aurora veil"));
    }

    #[test]
    fn share_url_replaces_existing_query() {
        assert_eq!(
            share_url("https://ethereal.example/?animation=old#top", "b"),
            "https://ethereal.example/?animation=b"
        );
    }

    #[test]
    fn deep_link_parsing() {
        assert_eq!(deep_link_from_query("?animation=b").as_deref(), Some("b"));
        assert_eq!(deep_link_from_query("x=1&animation=c&y=2").as_deref(), Some("c"));
        assert_eq!(deep_link_from_query("animation="), None);
        assert_eq!(deep_link_from_query("other=b"), None);
        assert_eq!(deep_link_from_url("https://ethereal.example/"), None);
        assert_eq!(
            deep_link_from_url("https://ethereal.example/?animation=b#frag").as_deref(),
            Some("b")
        );
    }

    #[test]
    fn deep_link_values_are_decoded() {
        assert_eq!(
            deep_link_from_query("animation=aurora+veil").as_deref(),
            Some("aurora veil")
        );
        assert_eq!(
            deep_link_from_query("animation=n%C3%A9on").as_deref(),
            Some("néon")
        );
        assert_eq!(deep_link_from_query("animation=%FF"), None);
    }

    #[test]
    fn content_locations() {
        assert_eq!(content_path("b"), "data/b.html");
        assert_eq!(content_url("http://127.0.0.1:8990/", "b"), "http://127.0.0.1:8990/data/b.html");
    }
}
