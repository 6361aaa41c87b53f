//! Address book trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use domain::{AddressId, CustomerId};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::{CheckoutError, Result};

/// A shipping address owned by one customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: AddressId,
    pub customer_id: CustomerId,
    pub name: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
}

/// Fields for a new address.
#[derive(Debug, Clone)]
pub struct NewAddress {
    pub name: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
}

/// Lookup of shipping addresses.
#[async_trait]
pub trait AddressBook: Send + Sync {
    /// Stores an address for a customer.
    async fn add(&self, customer_id: CustomerId, address: NewAddress) -> Result<Address>;

    /// Returns the address only if it belongs to `customer_id`.
    async fn find(&self, customer_id: CustomerId, address_id: AddressId)
    -> Result<Option<Address>>;
}

/// In-memory address book.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAddressBook {
    addresses: Arc<RwLock<HashMap<AddressId, Address>>>,
}

impl InMemoryAddressBook {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AddressBook for InMemoryAddressBook {
    async fn add(&self, customer_id: CustomerId, address: NewAddress) -> Result<Address> {
        let required = [
            &address.name,
            &address.street,
            &address.city,
            &address.postal_code,
        ];
        if required.iter().any(|field| field.trim().is_empty()) {
            return Err(CheckoutError::Validation(
                "Name, street, city and postal code are required".to_string(),
            ));
        }

        let address = Address {
            id: AddressId::new(),
            customer_id,
            name: address.name.trim().to_string(),
            street: address.street.trim().to_string(),
            city: address.city.trim().to_string(),
            postal_code: address.postal_code.trim().to_string(),
        };
        self.addresses
            .write()
            .await
            .insert(address.id, address.clone());
        Ok(address)
    }

    async fn find(
        &self,
        customer_id: CustomerId,
        address_id: AddressId,
    ) -> Result<Option<Address>> {
        let addresses = self.addresses.read().await;
        Ok(addresses
            .get(&address_id)
            .filter(|address| address.customer_id == customer_id)
            .cloned())
    }
}
