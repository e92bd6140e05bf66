//! Order tracking workflow: stage changes and deletions from the provider
//! dashboard.
//!
//! Both operations check the session first and make no request without
//! one. Stage changes go out over the direct transport with the client
//! transport as fallback; deletions go the other way round and accept
//! "not found" as success.

use std::sync::Arc;

use chrono::Utc;
use feedme_core::order::{Order, TrackingUpdate};
use feedme_core::{OrderId, OrderStage};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::api::orders::{delete_request, tracking_request};
use crate::client::ApiClient;
use crate::notify::{Notification, Notifier};
use crate::session::{AuthContext, AuthError};
use crate::transport::{ChainOutcome, FallbackChain, FallbackError, OutcomePolicy, Transport};

/// Why a workflow operation did not happen.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("all transports failed: {0}")]
    Exhausted(#[from] FallbackError),
}

/// Result of a successful stage change.
#[derive(Debug, Clone)]
pub struct StageChange {
    pub order_id: OrderId,
    pub stage: OrderStage,
    /// The update appended to the local order.
    pub update: TrackingUpdate,
    /// Transport that carried the change.
    pub transport: Transport,
    /// Refetched order collection; `None` when the refetch failed.
    pub refreshed: Option<Arc<Vec<Order>>>,
}

/// Result of a successful deletion.
#[derive(Debug, Clone)]
pub struct DeleteOutcome {
    pub order_id: OrderId,
    pub transport: Transport,
    /// The backend no longer knew the order.
    pub already_gone: bool,
    pub refreshed: Option<Arc<Vec<Order>>>,
}

/// Stage changes and deletions with fallback, notifications and refetch.
#[derive(Clone)]
pub struct TrackingWorkflow {
    client: ApiClient,
    notifier: Arc<dyn Notifier>,
    update_chain: FallbackChain,
    delete_chain: FallbackChain,
}

impl TrackingWorkflow {
    #[must_use]
    pub fn new(client: ApiClient, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            client,
            notifier,
            update_chain: FallbackChain::new(
                vec![Transport::Direct, Transport::Client],
                OutcomePolicy::Strict,
            ),
            delete_chain: FallbackChain::new(
                vec![Transport::Client, Transport::Direct],
                OutcomePolicy::IdempotentDelete,
            ),
        }
    }

    /// Move `order` to `stage`.
    ///
    /// An empty `message` becomes "Order <stage> successfully". On success
    /// the update is appended to `order` and the order list is refetched.
    /// Backward moves are allowed.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::Auth` without any request when there is no
    /// usable session, and `WorkflowError::Exhausted` when every transport
    /// failed. `order` is unchanged in both cases.
    #[instrument(skip(self, order, message), fields(order_id = %order.id, stage = %stage))]
    pub async fn update_stage(
        &self,
        order: &mut Order,
        stage: OrderStage,
        message: &str,
    ) -> Result<StageChange, WorkflowError> {
        let ctx = self.authenticate()?;

        let message = if message.trim().is_empty() {
            format!("Order {stage} successfully")
        } else {
            message.trim().to_owned()
        };

        if let Some(current) = order.current_stage().stage()
            && !stage.is_forward_from(current)
        {
            warn!(from = %current, to = %stage, "Moving order to an earlier stage");
        }

        let request = tracking_request(&order.id, stage, &message);
        let outcome = match self.update_chain.run(&self.client, &request).await {
            Ok(outcome) => outcome,
            Err(e) => {
                let reason = e
                    .last_error()
                    .map_or_else(|| e.to_string(), ToString::to_string);
                self.notifier.notify(Notification::error(
                    "Update Failed",
                    format!("Update failed: {reason}"),
                ));
                return Err(e.into());
            }
        };

        let update = order.append_tracking_update(stage, message, Utc::now());
        self.notifier.notify(Notification::success(
            "Order Updated",
            format!("Order status updated to {}", stage.label()),
        ));
        info!(transport = %outcome.transport(), "Order stage updated");

        Ok(StageChange {
            order_id: order.id.clone(),
            stage,
            update,
            transport: outcome.transport(),
            refreshed: self.refetch(&ctx).await,
        })
    }

    /// Delete an order. An order the backend no longer knows counts as
    /// deleted.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::Auth` without any request when there is no
    /// usable session, and `WorkflowError::Exhausted` when every transport
    /// failed.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn delete_order(&self, order_id: &OrderId) -> Result<DeleteOutcome, WorkflowError> {
        let ctx = self.authenticate()?;

        let request = delete_request(order_id);
        let outcome = match self.delete_chain.run(&self.client, &request).await {
            Ok(outcome) => outcome,
            Err(e) => {
                let reason = e
                    .last_error()
                    .map_or_else(|| e.to_string(), ToString::to_string);
                self.notifier.notify(Notification::error(
                    "Delete Failed",
                    format!("Failed to delete order: {reason}"),
                ));
                return Err(e.into());
            }
        };

        let already_gone = matches!(outcome, ChainOutcome::AlreadyGone { .. });
        if already_gone {
            info!(transport = %outcome.transport(), "Order was already deleted");
        }
        self.notifier.notify(Notification::success(
            "Order Deleted",
            "The order has been successfully deleted.",
        ));

        Ok(DeleteOutcome {
            order_id: order_id.clone(),
            transport: outcome.transport(),
            already_gone,
            refreshed: self.refetch(&ctx).await,
        })
    }

    fn authenticate(&self) -> Result<AuthContext, AuthError> {
        self.client.session().require_auth().inspect_err(|e| {
            self.notifier
                .notify(Notification::error("Authentication Required", e.to_string()));
        })
    }

    async fn refetch(&self, ctx: &AuthContext) -> Option<Arc<Vec<Order>>> {
        match self.client.refetch_orders(ctx).await {
            Ok(orders) => Some(orders),
            Err(e) => {
                warn!(error = %e, "Refetching orders failed");
                None
            }
        }
    }
}

impl std::fmt::Debug for TrackingWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackingWorkflow")
            .field("client", &self.client)
            .field("update_chain", &self.update_chain)
            .field("delete_chain", &self.delete_chain)
            .finish_non_exhaustive()
    }
}
