use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

/// A parsed `data:<mime>;base64,<data>` string, borrowing from the original.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataUri<'a> {
    pub mime: &'a str,
    pub base64: &'a str,
}

/// Parse a data URI. Only the base64 form is accepted, because that is the
/// only form the upload layer produces.
pub fn parse_data_uri(s: &str) -> Option<DataUri<'_>> {
    let rest = s.strip_prefix("data:")?;
    let (mime, base64) = rest.split_once(";base64,")?;
    if mime.is_empty() || !mime.contains('/') {
        return None;
    }
    Some(DataUri { mime, base64 })
}

pub fn is_data_uri(s: &str) -> bool {
    parse_data_uri(s).is_some()
}

/// Build a data URI from raw bytes.
pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, BASE64.encode(bytes))
}

/// Decode the payload of a parsed data URI back into bytes.
pub fn decode_data_uri(uri: &DataUri<'_>) -> Result<Vec<u8>, base64::DecodeError> {
    BASE64.decode(uri.base64)
}

pub fn extension_from_mime(mime: &str) -> &str {
    match mime {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/bmp" => "bmp",
        "image/tiff" => "tiff",
        "image/svg+xml" => "svg",
        _ => "bin",
    }
}

pub fn mime_from_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "tif" | "tiff" => Some("image/tiff"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}
