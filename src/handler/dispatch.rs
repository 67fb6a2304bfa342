//! Response dispatch module
//!
//! Inspects what a resolved path points at and turns it into exactly one
//! response: a redirect, a streamed file, or a fixed status body.
//!
//! Metadata is read before the file is opened, so the entity may change in
//! between. That window is accepted: a file that vanishes after the check
//! yields a 500 instead of a 404.

use hyper::{Response, StatusCode};
use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};

use super::resolve::{ContentRoot, Rejection, ResolvedPath};
use crate::config::Site;
use crate::http::{self, mime, ResponseBody};
use crate::logger;

/// Request details the dispatcher needs
pub struct RequestContext<'a> {
    /// Raw request path, still percent-encoded
    pub path: &'a str,
    pub is_head: bool,
}

/// Why a filesystem entity could not be used
#[derive(Debug)]
pub enum EntityError {
    /// Nothing at the path (404)
    Missing,
    /// The path exists but resolves outside the content root through a symlink (403)
    Escape(PathBuf),
    /// Any other I/O failure (500)
    Other(io::Error),
}

impl From<io::Error> for EntityError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::NotADirectory => Self::Missing,
            _ => Self::Other(err),
        }
    }
}

/// Produce the response for a resolution outcome
pub async fn dispatch(
    site: &Site,
    resolution: Result<ResolvedPath, Rejection>,
    ctx: &RequestContext<'_>,
) -> Response<ResponseBody> {
    let resolved = match resolution {
        Ok(resolved) => resolved,
        Err(Rejection::Forbidden) => {
            logger::log_warning(&format!("Path traversal attempt blocked: {}", ctx.path));
            return http::build_403_response();
        }
        Err(rejection @ Rejection::Malformed(_)) => {
            logger::log_debug(&format!("Rejected {}: {rejection}", ctx.path));
            return http::build_400_response();
        }
    };

    // `/`, `/.`, `/website/..` and the like all land on the root itself
    if resolved.as_path() == site.root.as_path() {
        return http::build_redirect_response_with_code(&site.landing_path, StatusCode::FOUND);
    }

    let (canonical, metadata) = match inspect(&site.root, resolved.as_path()).await {
        Ok(entity) => entity,
        Err(err) => return error_response(ctx.path, err),
    };

    if metadata.is_dir() {
        if !ctx.path.ends_with('/') {
            return http::build_redirect_response_with_code(
                &directory_location(ctx.path),
                StatusCode::MOVED_PERMANENTLY,
            );
        }
        return serve_index(site, &canonical, ctx).await;
    }

    if !metadata.is_file() {
        // Sockets, FIFOs and devices are never served
        return http::build_404_response();
    }

    serve_file(&canonical, resolved.as_path(), ctx).await
}

/// Redirect target for a directory requested without its trailing slash.
///
/// A leading `//` would make the `Location` protocol-relative and send the
/// client to another host, so the leading run of slashes collapses to one.
fn directory_location(request_path: &str) -> String {
    format!("/{}/", request_path.trim_start_matches('/'))
}

/// Canonicalize an existing path and stat it, refusing symlinks that leave the root
async fn inspect(root: &ContentRoot, path: &Path) -> Result<(PathBuf, Metadata), EntityError> {
    let canonical = fs::canonicalize(path).await?;
    if !root.contains(&canonical) {
        return Err(EntityError::Escape(canonical));
    }
    let metadata = fs::metadata(&canonical).await?;
    Ok((canonical, metadata))
}

/// Serve the index file of a directory; anything short of a readable file is a 404
async fn serve_index(site: &Site, dir: &Path, ctx: &RequestContext<'_>) -> Response<ResponseBody> {
    let index_path = dir.join(&site.index_file);
    let canonical = match inspect(&site.root, &index_path).await {
        Ok((canonical, metadata)) if metadata.is_file() => canonical,
        Ok(_) | Err(EntityError::Missing) => return http::build_404_response(),
        Err(EntityError::Escape(target)) => {
            logger::log_warning(&format!(
                "Index symlink leaves content root: {} -> {}",
                index_path.display(),
                target.display()
            ));
            return http::build_404_response();
        }
        Err(EntityError::Other(e)) => {
            logger::log_warning(&format!(
                "Index file not accessible '{}': {e}",
                index_path.display()
            ));
            return http::build_404_response();
        }
    };

    match File::open(&canonical).await {
        Ok(file) => stream_file(file, &index_path, ctx).await,
        Err(e) => {
            logger::log_warning(&format!(
                "Index file not readable '{}': {e}",
                index_path.display()
            ));
            http::build_404_response()
        }
    }
}

/// Serve a regular file. `name` supplies the extension used for Content-Type.
async fn serve_file(canonical: &Path, name: &Path, ctx: &RequestContext<'_>) -> Response<ResponseBody> {
    match File::open(canonical).await {
        Ok(file) => stream_file(file, name, ctx).await,
        Err(e) => {
            logger::log_error(&format!(
                "Failed to open file '{}': {e}",
                canonical.display()
            ));
            http::build_500_response()
        }
    }
}

async fn stream_file(file: File, name: &Path, ctx: &RequestContext<'_>) -> Response<ResponseBody> {
    // Length comes from the open handle, not the earlier stat
    let content_length = match file.metadata().await {
        Ok(metadata) => metadata.len(),
        Err(e) => {
            logger::log_error(&format!(
                "Failed to stat open file '{}': {e}",
                name.display()
            ));
            return http::build_500_response();
        }
    };

    http::build_file_response(
        file,
        content_length,
        mime::content_type_for_path(name),
        ctx.is_head,
    )
}

fn error_response(request_path: &str, err: EntityError) -> Response<ResponseBody> {
    match err {
        EntityError::Missing => http::build_404_response(),
        EntityError::Escape(target) => {
            logger::log_warning(&format!(
                "Symlink escape blocked: {request_path} -> {}",
                target.display()
            ));
            http::build_403_response()
        }
        EntityError::Other(e) => {
            logger::log_error(&format!("Failed to inspect '{request_path}': {e}"));
            http::build_500_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::resolve;
    use http_body_util::BodyExt;
    use hyper::header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE, LOCATION};

    struct Fixture {
        _dir: tempfile::TempDir,
        site: Site,
    }

    /// root/website/index.html, root/docs/ without index, secret.txt outside the root
    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root");
        std::fs::create_dir_all(root.join("website/img")).unwrap();
        std::fs::create_dir_all(root.join("docs")).unwrap();
        std::fs::write(root.join("website/index.html"), b"<h1>home</h1>").unwrap();
        std::fs::write(root.join("website/app.JS"), b"console.log(1);").unwrap();
        std::fs::write(root.join("website/empty.txt"), b"").unwrap();
        std::fs::write(root.join("docs/readme.txt"), b"docs").unwrap();
        std::fs::write(dir.path().join("secret.txt"), b"top secret").unwrap();

        let site = Site::new(ContentRoot::new(&root).unwrap(), "/website/", "index.html");
        Fixture { _dir: dir, site }
    }

    async fn get(site: &Site, path: &str) -> Response<ResponseBody> {
        request(site, path, false).await
    }

    async fn request(site: &Site, path: &str, is_head: bool) -> Response<ResponseBody> {
        let ctx = RequestContext { path, is_head };
        dispatch(site, resolve::resolve(&site.root, path), &ctx).await
    }

    async fn body_bytes(response: Response<ResponseBody>) -> Vec<u8> {
        response.into_body().collect().await.unwrap().to_bytes().to_vec()
    }

    #[tokio::test]
    async fn test_root_redirects_to_landing_path() {
        let fx = fixture();
        let response = get(&fx.site, "/").await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[LOCATION], "/website/");
    }

    #[tokio::test]
    async fn test_paths_normalizing_to_root_redirect_to_landing_path() {
        let fx = fixture();
        for path in ["/.", "//", "/website/..", "/%2e", "/./.", "//evil.example/.."] {
            let response = get(&fx.site, path).await;
            assert_eq!(response.status(), StatusCode::FOUND, "{path}");
            assert_eq!(response.headers()[LOCATION], "/website/", "{path}");
        }
    }

    #[tokio::test]
    async fn test_directory_redirect_stays_on_host() {
        let fx = fixture();
        for (path, location) in [
            ("//evil.example/..%2fwebsite", "/evil.example/..%2fwebsite/"),
            ("//evil.example/../website", "/evil.example/../website/"),
            ("///website", "/website/"),
        ] {
            let response = get(&fx.site, path).await;
            assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY, "{path}");
            let target = response.headers()[LOCATION].to_str().unwrap();
            assert_eq!(target, location);
            assert!(!target.starts_with("//"), "{path} -> {target}");
        }
    }

    #[tokio::test]
    async fn test_directory_without_slash_redirects() {
        let fx = fixture();
        for (path, location) in [
            ("/website", "/website/"),
            ("/docs", "/docs/"),
            ("/website/img", "/website/img/"),
            ("/website/./img", "/website/./img/"),
        ] {
            let response = get(&fx.site, path).await;
            assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY, "{path}");
            assert_eq!(response.headers()[LOCATION], location);
        }
    }

    #[tokio::test]
    async fn test_directory_with_index_serves_it() {
        let fx = fixture();
        let response = get(&fx.site, "/website/").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/html; charset=utf-8");
        assert_eq!(
            response.headers()[CACHE_CONTROL],
            "no-store, no-cache, must-revalidate"
        );
        assert_eq!(body_bytes(response).await, b"<h1>home</h1>");
    }

    #[tokio::test]
    async fn test_directory_without_index_is_404() {
        let fx = fixture();
        assert_eq!(get(&fx.site, "/docs/").await.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            get(&fx.site, "/website/img/").await.status(),
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn test_index_that_is_a_directory_is_404() {
        let fx = fixture();
        std::fs::create_dir(fx.site.root.as_path().join("docs/index.html")).unwrap();
        assert_eq!(get(&fx.site, "/docs/").await.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_missing_paths_are_404() {
        let fx = fixture();
        for path in [
            "/website/missing.png",
            "/nope/",
            "/website/index.html/extra",
        ] {
            let response = get(&fx.site, path).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");
            assert_eq!(body_bytes(response).await, b"404 Not Found");
        }
    }

    #[tokio::test]
    async fn test_traversal_never_serves_outside_root() {
        let fx = fixture();
        for path in [
            "/website/../../secret.txt",
            "/../secret.txt",
            "/../../../secret.txt",
            "/%2e%2e/secret.txt",
            "/website/%2E%2E/%2E%2E/secret.txt",
        ] {
            let status = get(&fx.site, path).await.status();
            assert!(
                status == StatusCode::NOT_FOUND || status == StatusCode::FORBIDDEN,
                "{path} -> {status}"
            );
        }
    }

    #[tokio::test]
    async fn test_rejections_map_to_status() {
        let fx = fixture();
        let ctx = RequestContext { path: "/x", is_head: false };
        let response = dispatch(&fx.site, Err(Rejection::Forbidden), &ctx).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_bytes(response).await, b"403 Forbidden");

        let response = dispatch(&fx.site, Err(Rejection::Malformed("bad")), &ctx).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        assert_eq!(get(&fx.site, "/a%zz").await.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            get(&fx.site, "/website/index.html%00").await.status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_file_headers() {
        let fx = fixture();
        let response = get(&fx.site, "/website/app.JS").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[CONTENT_TYPE],
            "application/javascript; charset=utf-8"
        );
        assert_eq!(response.headers()[CONTENT_LENGTH], "15");

        let response = get(&fx.site, "/docs/readme.txt").await;
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain; charset=utf-8");
    }

    #[tokio::test]
    async fn test_empty_file_round_trip() {
        let fx = fixture();
        let response = get(&fx.site, "/website/empty.txt").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_LENGTH], "0");
        assert!(body_bytes(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_large_binary_round_trip() {
        let fx = fixture();
        let content: Vec<u8> = (0u32..300_000)
            .map(|i| (i.wrapping_mul(2_654_435_761) >> 24) as u8)
            .collect();
        std::fs::write(fx.site.root.as_path().join("website/blob.unknownext"), &content).unwrap();

        let response = get(&fx.site, "/website/blob.unknownext").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/octet-stream");
        assert_eq!(body_bytes(response).await, content);
    }

    #[tokio::test]
    async fn test_encoded_names_are_served() {
        let fx = fixture();
        std::fs::write(fx.site.root.as_path().join("docs/two words.txt"), b"spaced").unwrap();
        let response = get(&fx.site, "/docs/two%20words.txt").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, b"spaced");
    }

    #[tokio::test]
    async fn test_head_sends_headers_only() {
        let fx = fixture();
        let response = request(&fx.site, "/website/", true).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_LENGTH], "13");
        assert!(body_bytes(response).await.is_empty());
    }

    #[test]
    fn test_io_error_classification() {
        let missing = EntityError::from(io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(missing, EntityError::Missing));

        let denied = EntityError::from(io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(denied, EntityError::Other(_)));
        assert_eq!(
            error_response("/x", denied).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            error_response("/x", EntityError::Missing).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_loop_is_500() {
        let fx = fixture();
        let root = fx.site.root.as_path();
        std::os::unix::fs::symlink("loop", root.join("loop")).unwrap();

        let response = get(&fx.site, "/loop").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_bytes(response).await, b"500 Internal Server Error");
        assert_eq!(
            get(&fx.site, "/loop/index.html").await.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_overlong_name_is_500_without_leaking_path() {
        let fx = fixture();
        let path = format!("/website/{}", "a".repeat(300));

        let response = get(&fx.site, &path).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_bytes(response).await;
        assert_eq!(body, b"500 Internal Server Error");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_inside_root_is_served() {
        let fx = fixture();
        let root = fx.site.root.as_path();
        std::os::unix::fs::symlink(root.join("docs/readme.txt"), root.join("website/readme.txt"))
            .unwrap();
        let response = get(&fx.site, "/website/readme.txt").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, b"docs");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_escape_is_forbidden() {
        let fx = fixture();
        let root = fx.site.root.as_path();
        let outside = root.parent().unwrap();
        std::os::unix::fs::symlink(outside.join("secret.txt"), root.join("website/leak.txt"))
            .unwrap();
        std::os::unix::fs::symlink(outside, root.join("escape")).unwrap();

        let response = get(&fx.site, "/website/leak.txt").await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_bytes(response).await, b"403 Forbidden");
        assert_eq!(
            get(&fx.site, "/escape/secret.txt").await.status(),
            StatusCode::FORBIDDEN
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_index_symlink_escape_is_404() {
        let fx = fixture();
        let root = fx.site.root.as_path();
        std::os::unix::fs::symlink(
            root.parent().unwrap().join("secret.txt"),
            root.join("docs/index.html"),
        )
        .unwrap();
        assert_eq!(get(&fx.site, "/docs/").await.status(), StatusCode::NOT_FOUND);
    }
}
