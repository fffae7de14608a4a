//! Boundaries to the collaborators the engine reads from: catalog,
//! customer/courier directory, coupons and orders. Every call made through
//! these traits goes through [`bounded`] so a slow backend surfaces as
//! [`AppError::Unavailable`] instead of hanging the request.

pub mod memory;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;
use crate::geo::Coordinate;
use crate::models::catalog::{MenuItem, Restaurant};
use crate::models::coupon::Coupon;
use crate::models::courier::Courier;
use crate::models::customer::Customer;
use crate::models::order::Order;

#[async_trait]
pub trait Catalog: Send + Sync {
    async fn restaurant(&self, id: Uuid) -> Result<Option<Restaurant>, AppError>;
    async fn menu_item(&self, id: Uuid) -> Result<Option<MenuItem>, AppError>;
}

#[async_trait]
pub trait Directory: Send + Sync {
    async fn customer(&self, id: Uuid) -> Result<Option<Customer>, AppError>;
    async fn courier(&self, id: Uuid) -> Result<Option<Courier>, AppError>;
    async fn couriers(&self) -> Result<Vec<Courier>, AppError>;
    /// Returns the updated courier, or `None` when the id is unknown.
    async fn set_courier_location(
        &self,
        id: Uuid,
        location: Coordinate,
    ) -> Result<Option<Courier>, AppError>;
}

#[async_trait]
pub trait CouponDirectory: Send + Sync {
    async fn coupon(&self, id: Uuid) -> Result<Option<Coupon>, AppError>;
}

#[async_trait]
pub trait OrderBook: Send + Sync {
    async fn order(&self, id: Uuid) -> Result<Option<Order>, AppError>;
}

pub async fn bounded<F, T>(limit: Duration, what: &str, fut: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(AppError::Unavailable(format!(
            "{what} did not respond within {}ms",
            limit.as_millis()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::bounded;
    use crate::error::AppError;

    #[tokio::test]
    async fn slow_calls_become_unavailable() {
        let result: Result<(), AppError> = bounded(Duration::from_millis(10), "catalog", async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(())
        })
        .await;

        let err = result.unwrap_err();
        assert!(matches!(err, AppError::Unavailable(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn fast_calls_pass_through() {
        let value = bounded(Duration::from_millis(100), "catalog", async { Ok(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }
}
