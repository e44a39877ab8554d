// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;

use crate::event::{Email, Notification};

/// Best-effort delivery of in-app notifications.
///
/// The manager logs a failed delivery and moves on; a notification that does
/// not arrive must never fail or roll back the state transition that produced
/// it.
#[async_trait]
pub trait NotificationSink {
    /// Defines the user-specified error type.
    ///
    /// This error type should implement the `Error` and `Debug` traits from
    /// the standard library.
    type AdapterError: std::error::Error + std::fmt::Debug + Send + Sync + 'static;

    async fn deliver_notification(
        &self,
        notification: Notification,
    ) -> Result<(), Self::AdapterError>;
}

/// Best-effort delivery of emails. Same contract as [`NotificationSink`]: a
/// failed email never rolls back a completed pickup or a credited ledger
/// entry.
#[async_trait]
pub trait EmailSink {
    /// Defines the user-specified error type.
    ///
    /// This error type should implement the `Error` and `Debug` traits from
    /// the standard library.
    type AdapterError: std::error::Error + std::fmt::Debug + Send + Sync + 'static;

    async fn deliver_email(&self, email: Email) -> Result<(), Self::AdapterError>;
}
