//! Static extension tables: which files are stored as data URIs, and with what MIME type.

use crate::path::extension_of;

/// Extensions whose contents are stored as base64 data URIs rather than text.
///
/// Images, audio, video, archives, fonts, documents and executables.
pub const BINARY_EXTENSIONS: &[&str] = &[
    // images
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "webp", "avif", "tif", "tiff",
    // audio
    "mp3", "wav", "ogg", "flac", "aac", "m4a",
    // video
    "mp4", "webm", "avi", "mov", "mkv",
    // archives
    "zip", "rar", "7z", "tar", "gz", "bz2", "xz",
    // fonts
    "ttf", "otf", "woff", "woff2", "eot",
    // documents
    "pdf",
    // executables and raw blobs
    "exe", "dll", "so", "dylib", "bin", "wasm",
];

/// Whether `path` is stored as a data URI. Pure function of the (case-insensitive) extension.
pub fn is_binary_path(path: &str) -> bool {
    let ext = extension_of(path).to_ascii_lowercase();
    !ext.is_empty() && BINARY_EXTENSIONS.contains(&ext.as_str())
}

/// MIME type used when a binary file is rebuilt as a data URI.
pub fn mime_for_path(path: &str) -> &'static str {
    mime_for_extension(&extension_of(path))
}

pub fn mime_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "tif" | "tiff" => "image/tiff",
        "svg" => "image/svg+xml",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "flac" => "audio/flac",
        "aac" => "audio/aac",
        "m4a" => "audio/mp4",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "zip" => "application/zip",
        "rar" => "application/vnd.rar",
        "7z" => "application/x-7z-compressed",
        "tar" => "application/x-tar",
        "gz" => "application/gzip",
        "bz2" => "application/x-bzip2",
        "xz" => "application/x-xz",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "eot" => "application/vnd.ms-fontobject",
        "pdf" => "application/pdf",
        "wasm" => "application/wasm",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" | "mjs" => "text/javascript",
        "json" => "application/json",
        "md" => "text/markdown",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}
