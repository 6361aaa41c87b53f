//! User directory trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use domain::CustomerId;
use tokio::sync::RwLock;

/// Resolves customers to contact addresses.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Returns the customer's email, if one is on file.
    async fn email_of(&self, customer_id: CustomerId) -> Option<String>;
}

/// In-memory user directory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDirectory {
    emails: Arc<RwLock<HashMap<CustomerId, String>>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records or replaces a customer's email.
    pub async fn register(&self, customer_id: CustomerId, email: impl Into<String>) {
        self.emails.write().await.insert(customer_id, email.into());
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn email_of(&self, customer_id: CustomerId) -> Option<String> {
        self.emails.read().await.get(&customer_id).cloned()
    }
}
