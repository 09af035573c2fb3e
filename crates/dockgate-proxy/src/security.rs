//! Registry-header hygiene: the client-facing surface never gets to set
//! `X-Registry-Auth`/`X-Registry-Config` directly — only credentials this
//! proxy resolves itself reach the engine. The backend here is a fixed
//! local Unix socket rather than a validated URL, so there's no SSRF
//! surface to guard, but the same "isolate the security-sensitive
//! transform, test it on its own" shape still applies to header
//! stripping/injection.

use http::{HeaderMap, HeaderName, HeaderValue};

const CLIENT_REGISTRY_AUTH: HeaderName = HeaderName::from_static("x-registry-auth");
const CLIENT_REGISTRY_CONFIG: HeaderName = HeaderName::from_static("x-registry-config");

/// Remove any client-supplied registry-credential headers before the
/// request is forwarded. Called unconditionally, even on routes that never
/// touch images, since a client could attach the header anywhere.
pub fn strip_client_registry_headers(headers: &mut HeaderMap) {
    headers.remove(CLIENT_REGISTRY_AUTH);
    headers.remove(CLIENT_REGISTRY_CONFIG);
}

/// Build the single `X-Registry-Auth` header the proxy injects from its
/// own brokered credentials. Only ever called with a value the proxy
/// itself produced (`RegistryCredential::encode_header_value`), never with
/// anything client-supplied.
pub fn registry_auth_header(value: &str) -> Result<(HeaderName, HeaderValue), http::header::InvalidHeaderValue> {
    Ok((CLIENT_REGISTRY_AUTH, HeaderValue::from_str(value)?))
}
