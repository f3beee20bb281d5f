pub mod http;

#[cfg(test)]
pub(crate) mod scripted;

pub use http::ReqwestTransport;
