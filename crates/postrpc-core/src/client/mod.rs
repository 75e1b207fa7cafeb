//! Client side: transports, stubs and the declared-function API.

mod api;
mod stub;
mod transport;

pub use api::{CallMode, RpcApi, RpcApiConfig, Stub};
pub use stub::{AsyncStub, BlockingStub, PendingCall};
pub use transport::{
    parse_endpoint, rpc_url, AsyncTransport, BlockingHttpTransport, BlockingTransport,
    HttpTransport, TransportResponse,
};
