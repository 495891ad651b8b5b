//! # KafkaUser Operator
//!
//! A Kubernetes operator that provisions Kafka users declared as `KafkaUser`
//! custom resources and removes them again when the resource is deleted.
//!
//! ## Overview
//!
//! 1. **Finalizer first** - a finalizer is persisted before any user is created
//! 2. **Idempotent provisioning** - an existing user is reported, never recreated
//! 3. **Status conditions** - the `Created` condition records the outcome
//! 4. **Ordered teardown** - the user is deleted before the finalizer is released
//!
//! Tests are included in the module files and under `tests/`.

pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod observability;
pub mod prelude;
pub mod provider;
pub mod runtime;
