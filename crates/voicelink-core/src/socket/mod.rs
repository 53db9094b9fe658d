//! Unix domain socket transport for the native helper.

mod line_decoder;
mod server;

pub use {
    line_decoder::LineDecoder,
    server::{SocketEvent, SocketServer},
};
