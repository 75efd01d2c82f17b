//! Service bindings for the `keybase.1.*` RPC surface.
//!
//! One module per service. Each carries its wire types (records, integer
//! enums, tagged unions), a server-side interface trait with a
//! `…_protocol()` factory producing the dispatch table, and a `…Client`
//! stub issuing calls over an injected [`kbrpc::GenericClient`].
//!
//! Wire fidelity rules, applied throughout:
//! - records encode as msgpack maps under their exact field tags;
//! - arguments ride as one-element positional tuples, even when empty;
//! - optional fields are omitted when absent, never encoded as nil;
//! - enums encode as their exact integer values;
//! - fixed-size identifiers encode as exact-length msgpack bin.
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

pub mod account;
pub mod block;
pub mod common;
pub mod config;
pub mod constants;
pub mod crypto;
pub mod ctl;
pub mod kbfs;
pub mod simple_fs;
