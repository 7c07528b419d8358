use std::path::Path;
use url::Url;

pub(crate) const FALLBACK_FILENAME: &str = "download";
pub(crate) const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Extracts the plain `filename=` parameter of a Content-Disposition header.
///
/// Only the final path component is kept so a server can't point outside
/// the target directory. The RFC 5987 `filename*` form is not decoded.
pub(crate) fn from_content_disposition(value: &str) -> Option<String> {
    value.split(';').skip(1).find_map(|param| {
        let (key, raw) = param.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("filename") {
            return None;
        }
        let name = raw.trim().trim_matches('"');
        let name = Path::new(name).file_name()?.to_str()?;
        (!name.is_empty()).then(|| name.to_string())
    })
}

/// Last non-empty path segment of the URL.
pub(crate) fn from_url(url: &Url) -> Option<String> {
    url.path_segments()?
        .filter(|segment| !segment.is_empty())
        .next_back()
        .map(str::to_string)
}

/// MIME essence of a Content-Type header, without parameters.
pub(crate) fn mime_essence(content_type: &str) -> Option<String> {
    let essence = content_type.split(';').next()?.trim();
    (!essence.is_empty()).then(|| essence.to_ascii_lowercase())
}
