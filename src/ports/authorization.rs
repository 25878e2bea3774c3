//! Budget authorization port.
//!
//! Every use case asks this service before loading or changing anything.
//! A lookup error is not a denial: callers report it separately.

use async_trait::async_trait;
use uuid::Uuid;

use super::PersistenceError;

#[async_trait]
pub trait BudgetAuthorizationService: Send + Sync {
    /// Whether `user_id` may read and change `budget_id`.
    async fn can_access_budget(&self, user_id: Uuid, budget_id: Uuid)
        -> Result<bool, PersistenceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorization_service_is_object_safe() {
        fn _accepts_dyn(_service: &dyn BudgetAuthorizationService) {}
    }
}
