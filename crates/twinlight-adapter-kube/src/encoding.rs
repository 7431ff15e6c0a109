//! Path encoding for Kubernetes resource URLs.
//!
//! Resource names are DNS-1123 subdomains in practice, but device ids come
//! from configuration, so every segment is percent-encoded before it is
//! placed in a URL path.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Characters that must be percent-encoded in a single path segment.
const SEGMENT_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'?')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'\\');

/// Percent-encode one URL path segment.
///
/// # Examples
///
/// ```
/// use twinlight_adapter_kube::encode_path_segment;
///
/// assert_eq!(encode_path_segment("light-01"), "light-01");
/// assert_eq!(encode_path_segment("a/b"), "a%2Fb");
/// ```
#[must_use]
pub fn encode_path_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT_ESCAPE).to_string()
}

/// Build the path of a namespaced custom resource.
///
/// # Examples
///
/// ```
/// use twinlight_adapter_kube::resource_path;
///
/// let path = resource_path("devices.kubeedge.io", "v1alpha2", "default", "devices", "light-01");
/// assert_eq!(path, "/apis/devices.kubeedge.io/v1alpha2/namespaces/default/devices/light-01");
/// ```
#[must_use]
pub fn resource_path(group: &str, version: &str, namespace: &str, plural: &str, name: &str) -> String {
    format!(
        "/apis/{}/{}/namespaces/{}/{}/{}",
        encode_path_segment(group),
        encode_path_segment(version),
        encode_path_segment(namespace),
        encode_path_segment(plural),
        encode_path_segment(name)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_names_unchanged() {
        assert_eq!(encode_path_segment("light-01"), "light-01");
        assert_eq!(encode_path_segment("devices.kubeedge.io"), "devices.kubeedge.io");
    }

    #[test]
    fn separators_escaped() {
        let encoded = encode_path_segment("../kube-system/secrets");
        assert!(!encoded.contains('/'));

        let encoded = encode_path_segment("light 01?x#y");
        assert_eq!(encoded, "light%2001%3Fx%23y");
    }

    #[test]
    fn resource_path_escapes_every_segment() {
        let path = resource_path("g", "v1", "my ns", "devices", "a/b");
        assert_eq!(path, "/apis/g/v1/namespaces/my%20ns/devices/a%2Fb");
    }
}
