use axum::{
    extract::Request,
    http::header::{self, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};

use crate::ui::routes::STATIC;

pub async fn add_headers(request: Request, next: Next) -> Response {
    let cache_policy = cache_policy_for_path(request.uri().path());

    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(header::X_FRAME_OPTIONS, SAMEORIGIN.clone());
    headers.insert(header::X_CONTENT_TYPE_OPTIONS, NOSNIFF.clone());
    headers.insert(header::REFERRER_POLICY, STRICT_ORIGIN.clone());
    headers.insert(header::CONTENT_SECURITY_POLICY, CSP.clone());
    headers.insert(PERMISSIONS_POLICY.clone(), PERMISSIONS.clone());
    headers.insert(COOP.clone(), SAME_ORIGIN.clone());
    headers.insert(header::X_DNS_PREFETCH_CONTROL, OFF.clone());
    headers.insert(CROSS_DOMAIN_POLICIES.clone(), NONE.clone());

    match cache_policy {
        CachePolicy::NoStore => {
            headers.insert(header::CACHE_CONTROL, NO_CACHE.clone());
            headers.insert(header::PRAGMA, NO_CACHE_PRAGMA.clone());
            headers.insert(header::EXPIRES, EXPIRES_ZERO.clone());
        }
        CachePolicy::Immutable => {
            headers.insert(header::CACHE_CONTROL, IMMUTABLE.clone());
        }
        CachePolicy::Revalidate => {
            headers.insert(header::CACHE_CONTROL, REVALIDATE.clone());
        }
    }

    response
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CachePolicy {
    NoStore,
    Immutable,
    Revalidate,
}

/// Pages carry per-user state and are never cached. Static files are
/// revalidated unless their name carries a content hash
/// (`app.3f2a9c1b.css`), which makes them safe to cache for good.
fn cache_policy_for_path(path: &str) -> CachePolicy {
    let Some(static_pos) = path.find(STATIC) else {
        return CachePolicy::NoStore;
    };
    let Some(file) = path[static_pos + STATIC.len()..].strip_prefix('/') else {
        return CachePolicy::NoStore;
    };

    let name = file.rsplit('/').next().unwrap_or(file);
    let Some((stem, ext)) = name.rsplit_once('.') else {
        return CachePolicy::Revalidate;
    };

    let cacheable_ext = matches!(
        ext,
        "js" | "css" | "woff" | "woff2" | "ttf" | "eot" | "png" | "jpg" | "jpeg" | "gif" | "ico"
            | "svg"
    );

    if cacheable_ext && is_fingerprinted(stem) {
        CachePolicy::Immutable
    } else {
        CachePolicy::Revalidate
    }
}

fn is_fingerprinted(stem: &str) -> bool {
    stem.rsplit_once('.').is_some_and(|(_, hash)| {
        hash.len() >= 8 && hash.chars().all(|c| c.is_ascii_hexdigit())
    })
}

static SAMEORIGIN: HeaderValue = HeaderValue::from_static("SAMEORIGIN");
static NOSNIFF: HeaderValue = HeaderValue::from_static("nosniff");
static STRICT_ORIGIN: HeaderValue = HeaderValue::from_static("strict-origin-when-cross-origin");
// Entry content embeds images and media from the feeds' own hosts.
static CSP: HeaderValue = HeaderValue::from_static(
    "default-src 'self'; script-src 'self'; style-src 'self'; img-src * data:; media-src *; frame-src *; font-src 'self' data:; connect-src 'self'; frame-ancestors 'self'; base-uri 'self'; form-action 'self';",
);
static PERMISSIONS_POLICY: HeaderName = HeaderName::from_static("permissions-policy");
static PERMISSIONS: HeaderValue =
    HeaderValue::from_static("camera=(), microphone=(), geolocation=()");
static COOP: HeaderName = HeaderName::from_static("cross-origin-opener-policy");
static CROSS_DOMAIN_POLICIES: HeaderName =
    HeaderName::from_static("x-permitted-cross-domain-policies");
static SAME_ORIGIN: HeaderValue = HeaderValue::from_static("same-origin");
static OFF: HeaderValue = HeaderValue::from_static("off");
static NONE: HeaderValue = HeaderValue::from_static("none");
static NO_CACHE: HeaderValue = HeaderValue::from_static("no-cache, no-store, must-revalidate");
static NO_CACHE_PRAGMA: HeaderValue = HeaderValue::from_static("no-cache");
static EXPIRES_ZERO: HeaderValue = HeaderValue::from_static("0");
static IMMUTABLE: HeaderValue = HeaderValue::from_static("public, max-age=31536000, immutable");
static REVALIDATE: HeaderValue = HeaderValue::from_static("no-cache");
