//! Core types and trait definitions for the Pawlog pet-care journal.
//!
//! This crate is deliberately free of database and notification backends.
//! Storage and delivery are reached through the [`store::CareStore`],
//! [`store::PetStore`] and [`schedule::NotificationSink`] traits; everything
//! else (due-window policy, reminder aggregation, notification planning) is
//! pure logic over the types defined here.

pub mod aggregate;
pub mod care;
pub mod error;
pub mod pet;
pub mod policy;
pub mod report;
pub mod schedule;
pub mod store;

pub use aggregate::ReminderAggregator;
pub use care::{CareKind, CareRecord};
pub use error::{Error, Result};
pub use report::ReminderReport;
