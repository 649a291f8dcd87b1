//! Seams for the excluded collaborators: the product catalog and the partner
//! directory. The core only ever reads from these; barcode decoding happens
//! entirely upstream and hands the core a plain string.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::ServiceError;

/// Read-only view of a catalog product.
#[derive(Debug, Clone)]
pub struct ProductRef {
    pub id: Uuid,
    pub name: String,
    /// LWIN-style trade identifier, e.g. "LWIN1234567".
    pub code: String,
}

/// Read-only view of a partner (stock owner).
#[derive(Debug, Clone)]
pub struct PartnerRef {
    pub id: Uuid,
    pub name: String,
}

#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn product(&self, id: Uuid) -> Result<Option<ProductRef>, ServiceError>;
}

#[async_trait]
pub trait PartnerDirectory: Send + Sync {
    async fn partner(&self, id: Uuid) -> Result<Option<PartnerRef>, ServiceError>;
}

/// In-memory catalog used by the binary's bootstrap and by tests.
#[derive(Default, Clone)]
pub struct InMemoryCatalog {
    products: Arc<RwLock<HashMap<Uuid, ProductRef>>>,
    partners: Arc<RwLock<HashMap<Uuid, PartnerRef>>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_product(&self, product: ProductRef) {
        self.products.write().await.insert(product.id, product);
    }

    pub async fn insert_partner(&self, partner: PartnerRef) {
        self.partners.write().await.insert(partner.id, partner);
    }
}

#[async_trait]
impl ProductCatalog for InMemoryCatalog {
    async fn product(&self, id: Uuid) -> Result<Option<ProductRef>, ServiceError> {
        Ok(self.products.read().await.get(&id).cloned())
    }
}

#[async_trait]
impl PartnerDirectory for InMemoryCatalog {
    async fn partner(&self, id: Uuid) -> Result<Option<PartnerRef>, ServiceError> {
        Ok(self.partners.read().await.get(&id).cloned())
    }
}
