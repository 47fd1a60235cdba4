//! Content-type resolution for ingested media.

/// Fallback when nothing identifies the payload.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Identify common image and video containers from their leading bytes.
pub fn sniff_mime(data: &[u8]) -> Option<&'static str> {
    match data {
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => Some("image/png"),
        [b'G', b'I', b'F', b'8', b'7' | b'9', b'a', ..] => Some("image/gif"),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some("image/webp"),
        [0x1A, 0x45, 0xDF, 0xA3, ..] => Some("video/webm"),
        [_, _, _, _, b'f', b't', b'y', b'p', b'q', b't', b' ', b' ', ..] => Some("video/quicktime"),
        [_, _, _, _, b'f', b't', b'y', b'p', ..] => Some("video/mp4"),
        _ => None,
    }
}

/// Resolve the MIME type of an ingested payload.
///
/// Order: explicit argument, magic bytes, the response `Content-Type`
/// (parameters stripped, `application/octet-stream` ignored), a guess from
/// the URL or filename extension, then `application/octet-stream`.
pub fn resolve_mime(
    explicit: Option<&str>,
    data: &[u8],
    content_type: Option<&str>,
    name: Option<&str>,
) -> String {
    if let Some(explicit) = explicit.map(str::trim).filter(|m| !m.is_empty()) {
        return explicit.to_ascii_lowercase();
    }
    if let Some(sniffed) = sniff_mime(data) {
        return sniffed.to_string();
    }
    if let Some(header) = content_type
        .and_then(|h| h.split(';').next())
        .map(|h| h.trim().to_ascii_lowercase())
        .filter(|h| !h.is_empty() && h != OCTET_STREAM)
    {
        return header;
    }
    name.and_then(|n| mime_guess::from_path(strip_query(n)).first())
        .map(|m| m.essence_str().to_string())
        .unwrap_or_else(|| OCTET_STREAM.to_string())
}

/// File extension (without the dot) to store a payload of `mime_type` under.
pub fn extension_for(mime_type: &str) -> String {
    let preferred = match mime_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        "video/mp4" => Some("mp4"),
        "video/quicktime" => Some("mov"),
        "video/webm" => Some("webm"),
        _ => None,
    };
    preferred
        .or_else(|| {
            mime_guess::get_mime_extensions_str(mime_type).and_then(|exts| exts.first().copied())
        })
        .unwrap_or("bin")
        .to_string()
}

/// Extension of the last path segment of a URL or filename, lowercased.
pub fn extension_of(name: &str) -> Option<String> {
    let segment = strip_query(name).rsplit('/').next()?;
    let (stem, ext) = segment.rsplit_once('.')?;
    (!stem.is_empty() && !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .then(|| ext.to_ascii_lowercase())
}

fn strip_query(name: &str) -> &str {
    name.split(['?', '#']).next().unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0];
    const MOV: &[u8] = b"\0\0\0\x14ftypqt  \0\0";

    #[test]
    fn test_sniff_known_containers() {
        assert_eq!(sniff_mime(JPEG), Some("image/jpeg"));
        assert_eq!(sniff_mime(b"\x89PNG\r\n\x1a\n...."), Some("image/png"));
        assert_eq!(sniff_mime(b"GIF89a...."), Some("image/gif"));
        assert_eq!(sniff_mime(b"RIFF\0\0\0\0WEBPVP8 "), Some("image/webp"));
        assert_eq!(sniff_mime(b"\0\0\0\x18ftypisom"), Some("video/mp4"));
        assert_eq!(sniff_mime(MOV), Some("video/quicktime"));
        assert_eq!(sniff_mime(&[0x1A, 0x45, 0xDF, 0xA3, 1]), Some("video/webm"));
        assert_eq!(sniff_mime(b"hello"), None);
    }

    #[test]
    fn test_resolution_order() {
        assert_eq!(
            resolve_mime(Some("image/png"), JPEG, Some("image/gif"), None),
            "image/png"
        );
        assert_eq!(resolve_mime(None, JPEG, Some("image/gif"), None), "image/jpeg");
        assert_eq!(
            resolve_mime(None, b"??", Some("image/gif; charset=binary"), Some("a.png")),
            "image/gif"
        );
        assert_eq!(
            resolve_mime(None, b"??", Some(OCTET_STREAM), Some("https://x/a.png?w=200")),
            "image/png"
        );
        assert_eq!(resolve_mime(None, b"??", None, None), OCTET_STREAM);
    }

    #[test]
    fn test_extensions() {
        assert_eq!(extension_for("image/jpeg"), "jpg");
        assert_eq!(extension_for("video/quicktime"), "mov");
        assert_eq!(extension_for("application/x-unknown-thing"), "bin");
        assert_eq!(extension_of("https://x/y/photo.JPG?size=large").as_deref(), Some("jpg"));
        assert_eq!(extension_of("https://x/y/photo"), None);
        assert_eq!(extension_of(".hidden"), None);
    }
}
