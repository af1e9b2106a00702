//! MetaWeblog XML-RPC compatibility surface.
//!
//! Desktop blogging clients (Open Live Writer and friends) speak
//! XML-RPC against a single endpoint. The codec parses method calls and
//! renders responses/faults; the handler maps the MetaWeblog and
//! Blogger methods onto the same repositories and helpers the JSON API
//! uses.

pub mod codec;
pub mod handler;

pub use handler::handle_xmlrpc;
