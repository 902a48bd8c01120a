//! Request/response RPC over broker channels.
//!
//! Each established channel carries calls in one direction: the client half
//! assigns channel-scoped sequence numbers and parks a waiter per in-flight
//! call; the server half dispatches every inbound request on its own task so
//! a handler can itself issue RPC calls (or block on the peer) without
//! stalling the dispatch loop.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::oneshot;

use quill_proto::rpc::{Request, Response, RpcMessage};

use crate::channel::{Channel, ChannelSender};
use crate::error::{MuxError, RpcError};

/// A method-set handler served over a channel.
#[async_trait]
pub trait Service: Send + Sync {
    /// Handles one call. Unknown methods return
    /// [`RpcError::MethodNotFound`]; a call whose peer method is missing
    /// fails cleanly rather than hanging.
    async fn handle(&self, method: &str, params: Value) -> Result<Value, RpcError>;
}

type PendingCalls = Arc<Mutex<HashMap<u64, oneshot::Sender<Response>>>>;

/// The calling side of a channel.
///
/// Cheap to clone; clones share the sequence counter and the pending-call
/// map, so any number of tasks can have calls in flight concurrently.
#[derive(Clone)]
pub struct RpcClient {
    sender: ChannelSender,
    pending: PendingCalls,
    next_id: Arc<AtomicU64>,
}

impl RpcClient {
    /// Wraps a channel, spawning the response-matching task.
    #[must_use]
    pub fn new(channel: Channel) -> Self {
        let (sender, mut receiver) = channel.split();
        let pending: PendingCalls = Arc::default();

        let matcher = Arc::clone(&pending);
        tokio::spawn(async move {
            while let Ok(value) = receiver.recv().await {
                match serde_json::from_value::<RpcMessage>(value) {
                    Ok(RpcMessage::Response(resp)) => {
                        let waiter = matcher.lock().remove(&resp.id);
                        match waiter {
                            Some(waiter) => drop(waiter.send(resp)),
                            None => tracing::warn!(id = resp.id, "response for unknown call"),
                        }
                    }
                    Ok(RpcMessage::Request(req)) => {
                        tracing::warn!(method = %req.method, "unexpected request on client channel");
                    }
                    Err(e) => tracing::warn!(error = %e, "discarding malformed rpc message"),
                }
            }
            // Channel died: dropping the waiters fails every pending call.
            matcher.lock().clear();
        });

        Self {
            sender,
            pending,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Issues one call and suspends until the matched response arrives.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::Remote`] for an error response,
    /// [`RpcError::TransportClosed`] if the channel dies mid-call.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (waiter, response) = oneshot::channel();
        self.pending.lock().insert(id, waiter);

        let payload = serde_json::to_value(RpcMessage::Request(Request {
            id,
            method: method.to_string(),
            params,
        }))?;
        if let Err(e) = self.sender.send(payload).await {
            self.pending.lock().remove(&id);
            return Err(e.into());
        }

        let resp = response.await.map_err(|_| RpcError::TransportClosed)?;
        match resp.error {
            Some(err) => Err(RpcError::Remote {
                code: err.code,
                message: err.message,
            }),
            None => Ok(resp.result.unwrap_or(Value::Null)),
        }
    }
}

/// Serves a channel with the given service until the channel closes.
///
/// Every request is dispatched on its own task; responses are written back
/// through the channel's single sender.
///
/// # Errors
///
/// Currently always returns `Ok(())` on channel close; the signature leaves
/// room for fatal serve-side failures.
pub async fn serve<S>(channel: Channel, service: Arc<S>) -> Result<(), MuxError>
where
    S: Service + ?Sized + 'static,
{
    let (sender, mut receiver) = channel.split();
    loop {
        let Ok(value) = receiver.recv().await else {
            return Ok(());
        };
        match serde_json::from_value::<RpcMessage>(value) {
            Ok(RpcMessage::Request(req)) => {
                let service = Arc::clone(&service);
                let sender = sender.clone();
                tokio::spawn(async move {
                    tracing::debug!(id = req.id, method = %req.method, "handling request");
                    let response = match service.handle(&req.method, req.params).await {
                        Ok(value) => Response::success(req.id, value),
                        Err(e) => Response::error(req.id, e.code(), e.to_string()),
                    };
                    match serde_json::to_value(RpcMessage::Response(response)) {
                        Ok(payload) => {
                            if sender.send(payload).await.is_err() {
                                tracing::debug!(id = req.id, "response dropped: channel closed");
                            }
                        }
                        Err(e) => tracing::error!(id = req.id, error = %e, "unencodable response"),
                    }
                });
            }
            Ok(RpcMessage::Response(resp)) => {
                tracing::warn!(id = resp.id, "unexpected response on server channel");
            }
            Err(e) => tracing::warn!(error = %e, "discarding malformed rpc message"),
        }
    }
}

/// Parses params into a typed struct.
///
/// # Errors
///
/// Returns [`RpcError::InvalidParams`] when the shape does not match.
pub fn parse_params<T: for<'de> Deserialize<'de>>(params: Value) -> Result<T, RpcError> {
    serde_json::from_value(params).map_err(|e| RpcError::InvalidParams(e.to_string()))
}

/// Converts a result to a JSON value.
///
/// # Errors
///
/// Returns [`RpcError::Json`] on serialization failure.
pub fn to_json<T: Serialize>(value: T) -> Result<Value, RpcError> {
    serde_json::to_value(value).map_err(RpcError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::Broker;
    use quill_proto::rpc::METHOD_NOT_FOUND;
    use serde_json::json;
    use std::time::Duration;

    struct EchoService;

    #[async_trait]
    impl Service for EchoService {
        async fn handle(&self, method: &str, params: Value) -> Result<Value, RpcError> {
            match method {
                "echo" => Ok(params),
                "slow_echo" => {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    Ok(params)
                }
                "never" => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(Value::Null)
                }
                _ => Err(RpcError::MethodNotFound(method.to_string())),
            }
        }
    }

    fn rpc_pair() -> (Broker, RpcClient, Broker) {
        let (a, b) = tokio::io::duplex(16 * 1024);
        let (broker_a, primary_a) = Broker::new(a);
        let (broker_b, primary_b) = Broker::new(b);
        tokio::spawn(serve(primary_b, Arc::new(EchoService)));
        (broker_a, RpcClient::new(primary_a), broker_b)
    }

    #[tokio::test]
    async fn call_round_trips() {
        let (_ba, client, _bb) = rpc_pair();
        let result = client.call("echo", json!({"n": 3})).await.unwrap();
        assert_eq!(result["n"], 3);
    }

    #[tokio::test]
    async fn unknown_method_fails_cleanly() {
        let (_ba, client, _bb) = rpc_pair();
        let err = client.call("no_such_method", Value::Null).await.unwrap_err();
        match err {
            RpcError::Remote { code, message } => {
                assert_eq!(code, METHOD_NOT_FOUND);
                assert!(message.contains("no_such_method"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn concurrent_calls_are_independently_matched() {
        let (_ba, client, _bb) = rpc_pair();

        let slow = tokio::spawn({
            let client = client.clone();
            async move { client.call("slow_echo", json!("slow")).await }
        });
        let fast = client.call("echo", json!("fast")).await.unwrap();
        assert_eq!(fast, json!("fast"));

        let slow = slow.await.unwrap().unwrap();
        assert_eq!(slow, json!("slow"));
    }

    #[tokio::test]
    async fn pending_call_fails_when_transport_closes() {
        let (broker_a, client, _bb) = rpc_pair();

        let pending = tokio::spawn({
            let client = client.clone();
            async move { client.call("never", Value::Null).await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        broker_a.close();

        let result = tokio::time::timeout(Duration::from_secs(1), pending)
            .await
            .expect("pending call must fail within bounded time")
            .unwrap();
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn peer_serve_loop_ends_when_transport_closes() {
        let (a, b) = tokio::io::duplex(16 * 1024);
        let (broker_a, _primary_a) = Broker::new(a);
        let (_broker_b, primary_b) = Broker::new(b);
        let server = tokio::spawn(serve(primary_b, Arc::new(EchoService)));

        broker_a.close();

        tokio::time::timeout(Duration::from_secs(1), server)
            .await
            .expect("serve must return once the transport closes")
            .unwrap()
            .unwrap();
    }
}
