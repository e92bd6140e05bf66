//! Order endpoints.

use std::sync::Arc;

use feedme_core::order::Order;
use feedme_core::{OrderId, OrderStage, ProviderId, UserRole};
use serde_json::json;
use tracing::{debug, instrument};

use super::segment;
use crate::cache::{CacheKey, CacheValue, Tag};
use crate::client::ApiClient;
use crate::error::ApiError;
use crate::session::AuthContext;
use crate::transport::ApiRequest;

/// `PATCH orders/{id}/tracking` with the lowercase stage and message.
#[must_use]
pub fn tracking_request(order_id: &OrderId, stage: OrderStage, message: &str) -> ApiRequest {
    ApiRequest::patch(
        format!("orders/{}/tracking", segment(order_id.as_str())),
        json!({ "stage": stage.as_str(), "message": message }),
    )
    .authenticated()
    .invalidating(Tag::Orders)
}

/// `DELETE orders/{id}`; only an explicit `success: true` counts as deleted.
///
/// The check also applies on the direct transport, where a bare 2xx would
/// otherwise be enough. A direct refusal that still answers 200 falls through
/// instead of being reported as a delete.
#[must_use]
pub fn delete_request(order_id: &OrderId) -> ApiRequest {
    ApiRequest::delete(format!("orders/{}", segment(order_id.as_str())))
        .authenticated()
        .requiring_success()
        .invalidating(Tag::Orders)
}

impl ApiClient {
    /// All orders (admin view).
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the session is missing or the request fails.
    #[instrument(skip(self))]
    pub async fn orders(&self) -> Result<Arc<Vec<Order>>, ApiError> {
        self.cached_orders(CacheKey::Orders, ApiRequest::get("orders"))
            .await
    }

    /// Most recent orders.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the session is missing or the request fails.
    #[instrument(skip(self))]
    pub async fn recent_orders(&self) -> Result<Arc<Vec<Order>>, ApiError> {
        self.cached_orders(CacheKey::RecentOrders, ApiRequest::get("orders/recent"))
            .await
    }

    /// Orders placed with one provider.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the session is missing or the request fails.
    #[instrument(skip(self), fields(provider_id = %provider_id))]
    pub async fn provider_orders(
        &self,
        provider_id: &ProviderId,
    ) -> Result<Arc<Vec<Order>>, ApiError> {
        let path = format!("orders/provider/{}", segment(provider_id.as_str()));
        self.cached_orders(
            CacheKey::ProviderOrders(provider_id.clone()),
            ApiRequest::get(path),
        )
        .await
    }

    /// Drop cached orders and fetch the collection `ctx` sees: a provider's
    /// own orders, or every order for other roles.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self, ctx), fields(user_id = %ctx.user_id, role = %ctx.role))]
    pub async fn refetch_orders(&self, ctx: &AuthContext) -> Result<Arc<Vec<Order>>, ApiError> {
        self.cache().invalidate_tag(Tag::Orders).await;
        if ctx.role == UserRole::Provider {
            self.provider_orders(&ProviderId::new(ctx.user_id.as_str()))
                .await
        } else {
            self.orders().await
        }
    }

    async fn cached_orders(
        &self,
        key: CacheKey,
        request: ApiRequest,
    ) -> Result<Arc<Vec<Order>>, ApiError> {
        if let Some(CacheValue::Orders(orders)) = self.cache().get(&key).await {
            debug!(?key, "Cache hit");
            return Ok(orders);
        }

        let orders = Arc::new(self.fetch(&request.authenticated()).await?.into_list::<Order>()?);
        self.cache()
            .insert(key, CacheValue::Orders(Arc::clone(&orders)))
            .await;
        Ok(orders)
    }
}

#[cfg(test)]
mod tests {
    use reqwest::Method;

    use super::*;

    #[test]
    fn test_tracking_request_body() {
        let req = tracking_request(&OrderId::new("o 1"), OrderStage::Delivered, "Arrived");
        assert_eq!(req.method, Method::PATCH);
        assert_eq!(req.path, "orders/o%201/tracking");
        assert_eq!(
            req.body,
            Some(json!({"stage": "delivered", "message": "Arrived"}))
        );
        assert!(req.auth);
    }

    #[test]
    fn test_delete_request_requires_success() {
        let req = delete_request(&OrderId::new("o-9"));
        assert_eq!(req.method, Method::DELETE);
        assert!(req.require_success);
        assert_eq!(req.invalidates, vec![Tag::Orders]);
    }
}
