//! HTTP transport: builds requests from a coordinator-supplied skeleton and
//! captures the full request/response exchange (§4.7 "HTTPCaller").

mod capture;
mod caller;
mod skeleton;

pub use capture::Capture;
pub use caller::{CallerError, HttpCaller};
pub use skeleton::RequestSkeleton;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skeleton_defaults_have_no_body_or_query() {
        let skeleton = RequestSkeleton::new("GET", "/pets/1");
        assert!(skeleton.body.is_none());
        assert!(skeleton.query.is_empty());
    }
}
