pub mod http;
pub mod requests;
