//! Catalog entities.
//!
//! Ids are assigned by the store; on create the incoming `id` is ignored
//! (and defaults to `0` when omitted from JSON).

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use ims_core::{
    CategoryId, DomainError, DomainResult, Entity, HubId, ProductId, SellerId, SkuId, TenantId,
};

/// A catalog row that can be stored, listed and validated generically.
pub trait CatalogEntity:
    Entity<Id: Into<i64> + From<i64> + Send + Sync>
    + Clone
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    /// Human-readable kind, used in logs and not-found errors.
    const KIND: &'static str;

    /// Field-level checks applied before create and update.
    fn validate(&self) -> DomainResult<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    #[serde(default)]
    pub id: TenantId,
    pub tenant_name: String,
    #[serde(default)]
    pub registered_address: String,
    #[serde(default)]
    pub tenant_contact: String,
    #[serde(default)]
    pub tenant_email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hub {
    #[serde(default)]
    pub id: HubId,
    pub tenant_id: TenantId,
    pub manager_name: String,
    #[serde(default)]
    pub manager_contact: String,
    #[serde(default)]
    pub manager_email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seller {
    #[serde(default)]
    pub id: SellerId,
    pub hub_id: HubId,
    pub tenant_id: TenantId,
    pub seller_name: String,
    #[serde(default)]
    pub seller_contact: String,
    #[serde(default)]
    pub seller_email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    #[serde(default)]
    pub id: ProductId,
    pub product_name: String,
    pub seller_id: SellerId,
    #[serde(default)]
    pub general_description: String,
    pub category_id: CategoryId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sku {
    #[serde(default)]
    pub id: SkuId,
    pub seller_id: SellerId,
    pub product_id: ProductId,
    #[serde(default)]
    pub images: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub fragile: bool,
    #[serde(default)]
    pub dimensions: String,
}

macro_rules! impl_entity {
    ($t:ty, $id:ty) => {
        impl Entity for $t {
            type Id = $id;

            fn id(&self) -> Self::Id {
                self.id
            }

            fn with_id(mut self, id: Self::Id) -> Self {
                self.id = id;
                self
            }
        }
    };
}

impl_entity!(Tenant, TenantId);
impl_entity!(Hub, HubId);
impl_entity!(Seller, SellerId);
impl_entity!(Product, ProductId);
impl_entity!(Sku, SkuId);

impl CatalogEntity for Tenant {
    const KIND: &'static str = "tenant";

    fn validate(&self) -> DomainResult<()> {
        require_text("tenant_name", &self.tenant_name)?;
        optional_email("tenant_email", &self.tenant_email)
    }
}

impl CatalogEntity for Hub {
    const KIND: &'static str = "hub";

    fn validate(&self) -> DomainResult<()> {
        require_ref("tenant_id", self.tenant_id.get())?;
        require_text("manager_name", &self.manager_name)?;
        optional_email("manager_email", &self.manager_email)
    }
}

impl CatalogEntity for Seller {
    const KIND: &'static str = "seller";

    fn validate(&self) -> DomainResult<()> {
        require_ref("hub_id", self.hub_id.get())?;
        require_ref("tenant_id", self.tenant_id.get())?;
        require_text("seller_name", &self.seller_name)?;
        optional_email("seller_email", &self.seller_email)
    }
}

impl CatalogEntity for Product {
    const KIND: &'static str = "product";

    fn validate(&self) -> DomainResult<()> {
        require_ref("seller_id", self.seller_id.get())?;
        require_ref("category_id", self.category_id.get())?;
        require_text("product_name", &self.product_name)
    }
}

impl CatalogEntity for Sku {
    const KIND: &'static str = "sku";

    fn validate(&self) -> DomainResult<()> {
        require_ref("seller_id", self.seller_id.get())?;
        require_ref("product_id", self.product_id.get())
    }
}

fn require_text(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

fn optional_email(field: &str, value: &str) -> DomainResult<()> {
    if !value.is_empty() && !value.contains('@') {
        return Err(DomainError::validation(format!("{field} must be an e-mail address")));
    }
    Ok(())
}

fn require_ref(field: &str, id: i64) -> DomainResult<()> {
    if id <= 0 {
        return Err(DomainError::validation(format!("{field} must reference an existing row")));
    }
    Ok(())
}
