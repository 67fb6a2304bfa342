//! Request routing module
//!
//! Entry point for HTTP request processing: method policy, then path
//! resolution and dispatch. Every method other than GET and HEAD is answered
//! here without touching the filesystem.

use hyper::{Method, Request, Response};

use super::dispatch::{dispatch, RequestContext};
use super::resolve::resolve;
use crate::config::Site;
use crate::http::{self, ResponseBody};
use crate::logger;

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(req: Request<B>, site: &Site) -> Response<ResponseBody> {
    let method = req.method();
    if let Some(resp) = check_http_method(method) {
        return resp;
    }

    let ctx = RequestContext {
        path: req.uri().path(),
        is_head: *method == Method::HEAD,
    };
    let resolution = resolve(&site.root, ctx.path);
    dispatch(site, resolution, &ctx).await
}

/// Check HTTP method and return appropriate response for non-GET/HEAD methods
fn check_http_method(method: &Method) -> Option<Response<ResponseBody>> {
    match *method {
        Method::GET | Method::HEAD => None,
        Method::OPTIONS => Some(http::build_options_response()),
        _ => {
            logger::log_debug(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}
