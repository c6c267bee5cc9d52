// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Topology Descriptors and Registry
//!
//! This module provides the types that describe how a queue receives
//! messages: the exchange it hangs off, the exchange type, the routing key,
//! and the environment variable naming the broker URI. One
//! [`TopologyDescriptor`] is stored per queue name in a [`TopologyRegistry`],
//! and that stored descriptor is the sole source of truth when a broken
//! connection has to be re-declared.

use std::collections::HashMap;

/// Queue the manager declares unconditionally at construction, carrying
/// audit events.
pub const AUDIT_QUEUE: &str = "operation.events";
/// Topic exchange the audit queue is bound to.
pub const AUDIT_EXCHANGE: &str = "local.omi.audit";
/// Routing key for the audit binding.
pub const AUDIT_ROUTING_KEY: &str = "userEvents";
/// Environment variable holding the broker URI for the audit topology.
pub const AUDIT_BROKER_URI_ENV: &str = "RABBITMQ_URI";

/// Represents the types of exchanges available in RabbitMQ.
///
/// Each exchange type has specific routing behavior:
/// - Direct: Routes messages to queues based on an exact match of routing keys
/// - Topic: Routes messages based on wildcard pattern matching of routing keys
/// - Fanout: Broadcasts messages to all bound queues regardless of routing keys
/// - Headers: Routes based on message header values instead of routing keys
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExchangeKind {
    #[default]
    Direct,
    Topic,
    Fanout,
    Headers,
}

impl From<ExchangeKind> for lapin::ExchangeKind {
    fn from(kind: ExchangeKind) -> lapin::ExchangeKind {
        match kind {
            ExchangeKind::Direct => lapin::ExchangeKind::Direct,
            ExchangeKind::Topic => lapin::ExchangeKind::Topic,
            ExchangeKind::Fanout => lapin::ExchangeKind::Fanout,
            ExchangeKind::Headers => lapin::ExchangeKind::Headers,
        }
    }
}

/// Everything needed to declare a queue's topology from scratch.
///
/// A descriptor is written once, on the first successful declaration of its
/// queue, and never changes afterwards. The health loop and the reconnect
/// path both replay it verbatim to repair a broken connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyDescriptor {
    pub(crate) env_var: String,
    pub(crate) exchange: String,
    pub(crate) kind: ExchangeKind,
    pub(crate) routing_key: String,
    pub(crate) queue: String,
}

impl TopologyDescriptor {
    /// Creates a descriptor for a queue bound to an exchange.
    ///
    /// # Parameters
    /// * `env_var` - Name of the environment variable holding the broker URI
    /// * `exchange` - Exchange the queue is bound to
    /// * `kind` - Exchange type
    /// * `routing_key` - Routing key of the binding
    /// * `queue` - Queue name, the descriptor's unique key
    pub fn new(
        env_var: &str,
        exchange: &str,
        kind: ExchangeKind,
        routing_key: &str,
        queue: &str,
    ) -> TopologyDescriptor {
        TopologyDescriptor {
            env_var: env_var.to_owned(),
            exchange: exchange.to_owned(),
            kind,
            routing_key: routing_key.to_owned(),
            queue: queue.to_owned(),
        }
    }

    /// The queue name this descriptor declares.
    pub fn queue(&self) -> &str {
        &self.queue
    }
}

/// Holds one descriptor per queue name.
///
/// Registration is idempotent with first-write-wins semantics: once a
/// descriptor is stored for a queue name, later registrations under the same
/// name leave the stored values untouched.
#[derive(Debug, Default)]
pub struct TopologyRegistry {
    entries: HashMap<String, TopologyDescriptor>,
}

impl TopologyRegistry {
    pub fn new() -> TopologyRegistry {
        TopologyRegistry {
            entries: HashMap::default(),
        }
    }

    /// Stores the descriptor under its queue name unless one is already
    /// present.
    pub fn register(&mut self, descriptor: TopologyDescriptor) {
        self.entries
            .entry(descriptor.queue.clone())
            .or_insert(descriptor);
    }

    /// Looks up the descriptor stored for a queue name.
    pub fn lookup(&self, queue: &str) -> Option<&TopologyDescriptor> {
        self.entries.get(queue)
    }

    /// Snapshot of every stored descriptor, for the health loop.
    pub fn descriptors(&self) -> Vec<TopologyDescriptor> {
        self.entries.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orders_descriptor() -> TopologyDescriptor {
        TopologyDescriptor::new(
            "ORDERS_BROKER_URI",
            "app.events",
            ExchangeKind::Topic,
            "order.created",
            "orders",
        )
    }

    #[test]
    fn register_and_lookup() {
        let mut registry = TopologyRegistry::new();
        registry.register(orders_descriptor());

        let descriptor = registry.lookup("orders").unwrap();
        assert_eq!(descriptor.exchange, "app.events");
        assert_eq!(descriptor.kind, ExchangeKind::Topic);
        assert_eq!(descriptor.routing_key, "order.created");
    }

    #[test]
    fn lookup_unknown_queue() {
        let registry = TopologyRegistry::new();
        assert!(registry.lookup("orders").is_none());
    }

    #[test]
    fn register_is_first_write_wins() {
        let mut registry = TopologyRegistry::new();
        registry.register(orders_descriptor());

        registry.register(TopologyDescriptor::new(
            "OTHER_URI",
            "other.exchange",
            ExchangeKind::Fanout,
            "other.key",
            "orders",
        ));

        let descriptor = registry.lookup("orders").unwrap();
        assert_eq!(descriptor, &orders_descriptor());
        assert_eq!(registry.descriptors().len(), 1);
    }
}
