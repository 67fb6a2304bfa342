//! MIME type detection module
//!
//! Returns the corresponding Content-Type based on file extension.

use std::path::Path;

/// Fallback for extensions missing from the table
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Get MIME Content-Type for a dotted, lowercase extension (`".html"`)
pub fn get_content_type(extension: &str) -> &'static str {
    match extension {
        // Text
        ".html" => "text/html; charset=utf-8",
        ".css" => "text/css; charset=utf-8",
        ".csv" => "text/csv; charset=utf-8",
        ".txt" => "text/plain; charset=utf-8",
        ".xml" => "application/xml; charset=utf-8",

        // Scripts/WASM
        ".js" => "application/javascript; charset=utf-8",
        ".ts" => "application/typescript; charset=utf-8",
        ".json" => "application/json; charset=utf-8",
        ".wasm" => "application/wasm",

        // Images
        ".png" => "image/png",
        ".jpg" | ".jpeg" => "image/jpeg",
        ".gif" => "image/gif",
        ".svg" => "image/svg+xml",
        ".ico" => "image/vnd.microsoft.icon",
        ".webp" => "image/webp",

        // 3D models
        ".glb" => "model/gltf-binary",
        ".gltf" => "model/gltf+json",
        ".obj" => "model/obj",

        // Audio/Video
        ".aac" => "audio/aac",
        ".mp3" => "audio/mpeg",
        ".mp4" => "video/mp4",
        ".avi" => "video/x-msvideo",

        // Fonts
        ".otf" => "font/otf",
        ".ttf" => "font/ttf",
        ".woff" => "font/woff",
        ".woff2" => "font/woff2",

        // Archives
        ".zip" => "application/zip",

        _ => DEFAULT_CONTENT_TYPE,
    }
}

/// Content-Type for a file path, keyed by its lowercased extension
pub fn content_type_for_path(path: &Path) -> &'static str {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(DEFAULT_CONTENT_TYPE, |ext| {
            get_content_type(&format!(".{}", ext.to_ascii_lowercase()))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_types() {
        assert_eq!(get_content_type(".html"), "text/html; charset=utf-8");
        assert_eq!(get_content_type(".css"), "text/css; charset=utf-8");
        assert_eq!(get_content_type(".js"), "application/javascript; charset=utf-8");
        assert_eq!(get_content_type(".json"), "application/json; charset=utf-8");
        assert_eq!(get_content_type(".png"), "image/png");
        assert_eq!(get_content_type(".glb"), "model/gltf-binary");
        assert_eq!(get_content_type(".woff2"), "font/woff2");
    }

    #[test]
    fn test_unknown_extension() {
        assert_eq!(get_content_type(".xyz"), DEFAULT_CONTENT_TYPE);
        assert_eq!(get_content_type("html"), DEFAULT_CONTENT_TYPE);
        assert_eq!(content_type_for_path(Path::new("README")), DEFAULT_CONTENT_TYPE);
        assert_eq!(content_type_for_path(Path::new(".bashrc")), DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        assert_eq!(content_type_for_path(Path::new("a/LOGO.PNG")), "image/png");
        assert_eq!(
            content_type_for_path(Path::new("site/Index.Html")),
            "text/html; charset=utf-8"
        );
        assert_eq!(content_type_for_path(Path::new("archive.tar.ZIP")), "application/zip");
    }
}
