pub mod chat_request;
pub mod chat_route;
pub mod chat_stream_route;
pub mod stats_route;
