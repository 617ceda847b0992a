use axum::{
    http::{HeaderMap, header::REFERER},
    response::Redirect,
};
use url::form_urlencoded::byte_serialize;

/// 303 See Other to `location`.
pub fn to(location: &str) -> Redirect {
    Redirect::to(location)
}

/// Back to the referring page, or `base_url` when there is none.
pub fn back(headers: &HeaderMap, base_url: &str) -> Redirect {
    let referer = headers
        .get(REFERER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty());
    to(referer.unwrap_or(base_url))
}

/// Public URL of a view, e.g. `url_for("/", "dashboard/stats.html", &[("tab", "week")])`
/// gives `/dashboard/stats?tab=week`.
pub fn url_for(base_url: &str, view_path: &str, params: &[(&str, &str)]) -> String {
    let view = view_path.strip_suffix(".html").unwrap_or(view_path);
    let mut url = format!("{base_url}{view}");

    for (i, (key, value)) in params.iter().enumerate() {
        let separator = if i == 0 && !url.contains('?') { '?' } else { '&' };
        url.push(separator);
        url.extend(byte_serialize(key.as_bytes()));
        url.push('=');
        url.extend(byte_serialize(value.as_bytes()));
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{HeaderValue, StatusCode, header::LOCATION},
        response::IntoResponse,
    };

    #[test]
    fn url_for_strips_extension_and_encodes_params() {
        assert_eq!(url_for("/", "home.html", &[]), "/home");
        assert_eq!(
            url_for("/app/", "dashboard/stats.html", &[("tab", "this week"), ("n", "1&2")]),
            "/app/dashboard/stats?tab=this+week&n=1%262"
        );
        assert_eq!(
            url_for("/index?page=", "about", &[("lang", "en")]),
            "/index?page=about&lang=en"
        );
    }

    #[test]
    fn back_prefers_referer() {
        let mut headers = HeaderMap::new();
        let resp = back(&headers, "/").into_response();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[LOCATION], "/");

        headers.insert(REFERER, HeaderValue::from_static("/dashboard/stats"));
        let resp = back(&headers, "/").into_response();
        assert_eq!(resp.headers()[LOCATION], "/dashboard/stats");
    }
}
