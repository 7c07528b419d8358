use std::path::{Path, PathBuf};

/// Appends the MIME subtype (the part after the last `/`) as an extension.
pub fn filename_from_mime(name: &str, mime: &str) -> String {
    let extension = mime.rsplit('/').next().unwrap_or(mime);
    format!("{name}.{extension}")
}

/// Returns true when the name already carries an extension, including a bare trailing dot.
pub fn has_extension(name: &str) -> bool {
    Path::new(name).extension().is_some()
}

/// Computes where a transfer is written.
///
/// An explicitly requested filename always wins. Otherwise the engine-supplied
/// name is used as-is when it already has an extension, and gets one derived
/// from the MIME type when it doesn't.
///
/// `overwrite` is accepted but does not change the result: there is no
/// suffixing or collision avoidance, an existing file at the path is replaced
/// by the engine.
pub fn resolve_save_path(
    requested_filename: Option<&str>,
    engine_filename: &str,
    mime_type: &str,
    directory: &Path,
    _overwrite: bool,
) -> PathBuf {
    if let Some(requested) = requested_filename {
        return join_below(directory, requested);
    }

    let name = if has_extension(engine_filename) {
        engine_filename.to_string()
    } else {
        filename_from_mime(engine_filename, mime_type)
    };

    join_below(directory, &name)
}

// A leading separator must not replace the directory.
fn join_below(directory: &Path, name: &str) -> PathBuf {
    directory.join(name.trim_start_matches(['/', '\\']))
}
