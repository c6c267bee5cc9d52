// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Broker Client Capability
//!
//! This module defines the narrow capability the session manager needs from
//! a broker client (dial, declare, bind, publish, consume, and a
//! channel-open predicate) and implements it once over `lapin`. The wire
//! protocol itself is entirely the client library's business; everything
//! above this module talks to the [`BrokerClient`] and [`BrokerChannel`]
//! traits, which keeps the connection lifecycle logic testable without a
//! running broker.

use crate::{errors::AmqpError, publisher::JSON_CONTENT_TYPE, topology::ExchangeKind};
use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use lapin::{
    options::{
        BasicConsumeOptions, BasicPublishOptions, ExchangeDeclareOptions, QueueBindOptions,
        QueueDeclareOptions,
    },
    types::{FieldTable, ShortString},
    BasicProperties, Channel, Connection, ConnectionProperties,
};
use std::{pin::Pin, sync::Arc};
use tracing::{debug, error};
use uuid::Uuid;

/// A message handed to a consumer, reduced to what handlers need.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub exchange: String,
    pub routing_key: String,
    pub data: Vec<u8>,
}

/// Stream of deliveries produced by [`BrokerChannel::consume`].
pub type DeliveryStream = Pin<Box<dyn Stream<Item = Result<Delivery, AmqpError>> + Send>>;

/// Capability to dial a broker and obtain a live channel.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BrokerClient: Send + Sync {
    /// Connects to the broker at `uri` and opens one channel on the new
    /// connection.
    async fn dial(&self, uri: &str) -> Result<Arc<dyn BrokerChannel>, AmqpError>;
}

/// Operations the session manager performs against one broker channel.
///
/// Declaration options are fixed by this crate's contract: exchanges and
/// queues are durable, never auto-deleted, non-internal and non-exclusive,
/// and every operation waits for broker confirmation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BrokerChannel: Send + Sync {
    /// Declares a durable exchange of the given kind.
    async fn declare_exchange(&self, name: &str, kind: ExchangeKind) -> Result<(), AmqpError>;

    /// Declares a durable queue.
    async fn declare_queue(&self, name: &str) -> Result<(), AmqpError>;

    /// Binds a queue to an exchange under a routing key.
    async fn bind_queue(
        &self,
        queue: &str,
        routing_key: &str,
        exchange: &str,
    ) -> Result<(), AmqpError>;

    /// Publishes a payload to an exchange under a routing key,
    /// non-mandatory and non-immediate.
    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        payload: &[u8],
    ) -> Result<(), AmqpError>;

    /// Registers an auto-acknowledging consumer on a queue and returns its
    /// delivery stream.
    async fn consume(&self, queue: &str, consumer_tag: &str) -> Result<DeliveryStream, AmqpError>;

    /// Whether the channel still reports open.
    fn is_open(&self) -> bool;
}

/// `lapin`-backed [`BrokerClient`].
pub struct AmqpClient;

impl AmqpClient {
    pub fn new() -> Arc<AmqpClient> {
        Arc::new(AmqpClient)
    }
}

#[async_trait]
impl BrokerClient for AmqpClient {
    async fn dial(&self, uri: &str) -> Result<Arc<dyn BrokerChannel>, AmqpError> {
        debug!("creating amqp connection...");
        let connection = match Connection::connect(uri, ConnectionProperties::default()).await {
            Ok(c) => Ok(c),
            Err(err) => {
                error!(error = err.to_string(), "failure to connect");
                Err(AmqpError::ConnectionError)
            }
        }?;
        debug!("amqp connected");

        debug!("creating amqp channel...");
        match connection.create_channel().await {
            Ok(channel) => {
                debug!("channel created");
                Ok(Arc::new(AmqpChannel {
                    _connection: connection,
                    channel,
                }))
            }
            Err(err) => {
                error!(error = err.to_string(), "error to create the channel");
                Err(AmqpError::ChannelError)
            }
        }
    }
}

/// A live `lapin` channel together with the connection that owns it.
pub struct AmqpChannel {
    // The connection must outlive the channel handle; dropping it tears the
    // channel down with it.
    _connection: Connection,
    channel: Channel,
}

#[async_trait]
impl BrokerChannel for AmqpChannel {
    async fn declare_exchange(&self, name: &str, kind: ExchangeKind) -> Result<(), AmqpError> {
        match self
            .channel
            .exchange_declare(
                name,
                kind.into(),
                ExchangeDeclareOptions {
                    passive: false,
                    durable: true,
                    auto_delete: false,
                    internal: false,
                    nowait: false,
                },
                FieldTable::default(),
            )
            .await
        {
            Err(err) => {
                error!(
                    error = err.to_string(),
                    name = name,
                    "error to declare the exchange"
                );
                Err(AmqpError::DeclareExchangeError(name.to_owned()))
            }
            _ => Ok(()),
        }
    }

    async fn declare_queue(&self, name: &str) -> Result<(), AmqpError> {
        match self
            .channel
            .queue_declare(
                name,
                QueueDeclareOptions {
                    passive: false,
                    durable: true,
                    exclusive: false,
                    auto_delete: false,
                    nowait: false,
                },
                FieldTable::default(),
            )
            .await
        {
            Err(err) => {
                error!(
                    error = err.to_string(),
                    name = name,
                    "error to declare the queue"
                );
                Err(AmqpError::DeclareQueueError(name.to_owned()))
            }
            _ => Ok(()),
        }
    }

    async fn bind_queue(
        &self,
        queue: &str,
        routing_key: &str,
        exchange: &str,
    ) -> Result<(), AmqpError> {
        match self
            .channel
            .queue_bind(
                queue,
                exchange,
                routing_key,
                QueueBindOptions { nowait: false },
                FieldTable::default(),
            )
            .await
        {
            Err(err) => {
                error!(error = err.to_string(), "error to bind queue to exchange");
                Err(AmqpError::BindQueueError(
                    queue.to_owned(),
                    exchange.to_owned(),
                ))
            }
            _ => Ok(()),
        }
    }

    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        payload: &[u8],
    ) -> Result<(), AmqpError> {
        match self
            .channel
            .basic_publish(
                exchange,
                routing_key,
                BasicPublishOptions {
                    mandatory: false,
                    immediate: false,
                },
                payload,
                BasicProperties::default()
                    .with_content_type(ShortString::from(JSON_CONTENT_TYPE))
                    .with_message_id(ShortString::from(Uuid::new_v4().to_string())),
            )
            .await
        {
            Err(err) => {
                error!(error = err.to_string(), "error publishing message");
                Err(AmqpError::PublishingError)
            }
            _ => Ok(()),
        }
    }

    async fn consume(&self, queue: &str, consumer_tag: &str) -> Result<DeliveryStream, AmqpError> {
        let consumer = match self
            .channel
            .basic_consume(
                queue,
                consumer_tag,
                BasicConsumeOptions {
                    no_local: false,
                    // Deliveries count as acknowledged the moment the client
                    // receives them, independent of handler outcome.
                    no_ack: true,
                    exclusive: false,
                    nowait: false,
                },
                FieldTable::default(),
            )
            .await
        {
            Err(err) => {
                error!(error = err.to_string(), "error to create the consumer");
                Err(AmqpError::ConsumerError(err.to_string()))
            }
            Ok(c) => Ok(c),
        }?;

        Ok(Box::pin(consumer.map(|result| match result {
            Ok(delivery) => Ok(Delivery {
                exchange: delivery.exchange.to_string(),
                routing_key: delivery.routing_key.to_string(),
                data: delivery.data,
            }),
            Err(err) => Err(AmqpError::ConsumerError(err.to_string())),
        })))
    }

    fn is_open(&self) -> bool {
        self.channel.status().connected()
    }
}
