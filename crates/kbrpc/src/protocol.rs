//! Service registration and name-based dispatch.
//!
//! Each service contributes a [`Protocol`]: its wire name (e.g.
//! `keybase.1.block`) plus a table mapping bare method names to handlers. A
//! [`ProtocolRegistry`] owns the protocols for one server and routes a full
//! wire method name (`keybase.1.block.putBlock`) by splitting at the last
//! dot.

use std::collections::HashMap;

use futures_util::future::BoxFuture;
use rmpv::Value;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::RpcError;
use crate::packet::value_kind;

/// A registered method handler: decodes the argument tuple, invokes the
/// service, and encodes the result.
pub type ServeHandler =
    Box<dyn Fn(Value) -> BoxFuture<'static, Result<Value, RpcError>> + Send + Sync>;

/// Decodes a one-element positional argument tuple into a typed argument.
///
/// A shape mismatch produces the structured type error (expected Rust type,
/// actual wire shape plus the decoder's complaint) rather than a panic.
///
/// # Errors
///
/// Returns [`RpcError::TypeMismatch`] when the tuple does not decode.
pub fn decode_args<A: DeserializeOwned>(args: Value) -> Result<A, RpcError> {
    let actual_kind = value_kind(&args);
    rmpv::ext::from_value::<(A,)>(args)
        .map(|(a,)| a)
        .map_err(|e| RpcError::TypeMismatch {
            expected: std::any::type_name::<(A,)>(),
            actual: format!("{actual_kind}: {e}"),
        })
}

/// Wraps a typed async closure as a [`ServeHandler`].
///
/// The closure receives the decoded argument record; its result is encoded
/// back to a msgpack value for the response packet.
pub fn handler<A, R, F, Fut>(f: F) -> ServeHandler
where
    A: DeserializeOwned + Send + 'static,
    R: Serialize,
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<R, RpcError>> + Send + 'static,
{
    Box::new(
        move |args: Value| -> BoxFuture<'static, Result<Value, RpcError>> {
            match decode_args::<A>(args) {
                Ok(arg) => {
                    let fut = f(arg);
                    Box::pin(async move {
                        let res = fut.await?;
                        Ok(rmpv::ext::to_value(&res)?)
                    })
                }
                Err(e) => Box::pin(std::future::ready(Err(e))),
            }
        },
    )
}

/// One service's dispatch table: a wire name plus its methods.
pub struct Protocol {
    name: &'static str,
    methods: HashMap<&'static str, ServeHandler>,
}

impl Protocol {
    /// Creates an empty protocol with the given wire name.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            methods: HashMap::new(),
        }
    }

    /// Adds a method handler, consuming and returning the protocol.
    #[must_use]
    pub fn method(mut self, name: &'static str, handler: ServeHandler) -> Self {
        self.methods.insert(name, handler);
        self
    }

    /// Returns the protocol's wire name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the number of registered methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Returns true if the protocol has no methods.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// The set of protocols served by one server.
#[derive(Default)]
pub struct ProtocolRegistry {
    protocols: HashMap<&'static str, Protocol>,
}

impl ProtocolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a protocol under its wire name.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::AlreadyRegistered`] if the name is taken.
    pub fn register(&mut self, protocol: Protocol) -> Result<(), RpcError> {
        let name = protocol.name();
        if self.protocols.contains_key(name) {
            return Err(RpcError::AlreadyRegistered(name.to_owned()));
        }
        self.protocols.insert(name, protocol);
        Ok(())
    }

    /// Dispatches a full wire method name to its handler.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::UnknownProtocol`] or [`RpcError::UnknownMethod`]
    /// when nothing is registered for the name, or the handler's own error.
    pub async fn dispatch(&self, method: &str, args: Value) -> Result<Value, RpcError> {
        let Some((protocol_name, method_name)) = method.rsplit_once('.') else {
            return Err(RpcError::UnknownMethod(method.to_owned()));
        };
        let protocol = self
            .protocols
            .get(protocol_name)
            .ok_or_else(|| RpcError::UnknownProtocol(protocol_name.to_owned()))?;
        let handler = protocol
            .methods
            .get(method_name)
            .ok_or_else(|| RpcError::UnknownMethod(method.to_owned()))?;
        handler(args).await
    }
}
