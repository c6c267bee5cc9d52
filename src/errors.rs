// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Error Types for the Session Manager
//!
//! This module provides the error type shared by every operation in the crate.
//! The `AmqpError` enum covers connection and channel establishment, topology
//! declaration, publishing, consuming, and the repair paths that tie them
//! together. Each variant carries the name of the entity the operation failed
//! against so callers can log and react without re-deriving context.

use thiserror::Error;

/// Represents errors that can occur while managing broker sessions.
///
/// Variants fall into a few behavioral classes: configuration errors
/// (`MissingBrokerUri`) mean the process cannot proceed and must be escalated
/// by the caller; network-class errors (`ConnectionError`, `ChannelError`)
/// and declare-class errors are recoverable, in that the periodic health
/// loop re-runs the declaration from the stored topology; lookup errors
/// (`QueueNotFound`, `ChannelClosed`) drive the send/listen paths' single
/// reconnect attempt, and `ReconnectError` reports that the attempt was
/// spent.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AmqpError {
    /// Internal errors that don't fit into other categories
    #[error("internal error")]
    InternalError,

    /// The environment variable that should hold the broker URI is not set
    #[error("broker uri environment variable `{0}` is not set")]
    MissingBrokerUri(String),

    /// Error establishing a connection to the broker
    #[error("failure to connect")]
    ConnectionError,

    /// Error creating a channel from an established connection
    #[error("failure to create a channel")]
    ChannelError,

    /// Error declaring an exchange with the given name
    #[error("failure to declare an exchange `{0}`")]
    DeclareExchangeError(String),

    /// Error declaring a queue with the given name
    #[error("failure to declare a queue `{0}`")]
    DeclareQueueError(String),

    /// Error binding a queue to an exchange
    #[error("failure to bind queue `{0}` to exchange `{1}`")]
    BindQueueError(String, String),

    /// The queue was never declared with the manager
    #[error("queue `{0}` was never declared")]
    QueueNotFound(String),

    /// The stored connection for the queue reports a closed channel
    #[error("connection for queue `{0}` is closed")]
    ChannelClosed(String),

    /// The single repair attempt on the send/listen path failed
    #[error("failure to reconnect queue `{0}`")]
    ReconnectError(String),

    /// Error serializing a payload before publishing
    #[error("failure to serialize payload")]
    SerializationError,

    /// Error publishing a message
    #[error("failure to publish")]
    PublishingError,

    /// The publish did not complete within its deadline
    #[error("publish deadline exceeded")]
    PublishTimeout,

    /// Error registering or driving a consumer
    #[error("failure to consume: `{0}`")]
    ConsumerError(String),
}
