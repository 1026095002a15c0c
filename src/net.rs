//! Network layer: request descriptors, request building, the transport seam,
//! certificate pinning and response text decoding.

pub mod builder;
pub mod pinning;
pub mod request;
pub mod response;
pub mod text;
pub mod transport;

pub use builder::{build_request, HttpRequest};
pub use pinning::PinningHashes;
pub use request::{Method, RequestBody, RequestDescriptor, RequestId};
pub use response::Response;
pub use transport::{ReqwestTransport, Transport};
