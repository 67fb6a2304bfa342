//! HTTP protocol layer module
//!
//! Response bodies, status builders and content-type detection, decoupled from
//! path resolution and filesystem dispatch.

pub mod body;
pub mod mime;
pub mod response;

pub use body::ResponseBody;
pub use response::{
    build_400_response, build_403_response, build_404_response, build_405_response,
    build_500_response, build_file_response, build_options_response,
    build_redirect_response_with_code,
};
