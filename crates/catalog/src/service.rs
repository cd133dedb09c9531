//! Validated CRUD over a catalog repository.

use std::sync::Arc;

use tracing::info;

use crate::entities::CatalogEntity;
use crate::error::CatalogResult;
use crate::repository::CatalogRepository;

/// Application service for one catalog entity kind.
///
/// Validation runs before the repository is touched; ids are owned by the
/// repository (create) or the caller's path (update).
pub struct CatalogService<E: CatalogEntity> {
    repo: Arc<dyn CatalogRepository<E>>,
}

impl<E: CatalogEntity> Clone for CatalogService<E> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
        }
    }
}

impl<E: CatalogEntity> CatalogService<E> {
    pub fn new(repo: Arc<dyn CatalogRepository<E>>) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> CatalogResult<Vec<E>> {
        self.repo.list().await
    }

    pub async fn get(&self, id: E::Id) -> CatalogResult<E> {
        self.repo.get(id).await
    }

    pub async fn create(&self, entity: E) -> CatalogResult<E> {
        entity.validate()?;
        let created = self.repo.create(entity).await?;
        info!(kind = E::KIND, id = %created.id(), "catalog row created");
        Ok(created)
    }

    /// Full replace of the row `id`; any id in the body is overridden.
    pub async fn update(&self, id: E::Id, entity: E) -> CatalogResult<E> {
        let entity = entity.with_id(id);
        entity.validate()?;
        let updated = self.repo.update(entity).await?;
        info!(kind = E::KIND, %id, "catalog row updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: E::Id) -> CatalogResult<E> {
        let deleted = self.repo.delete(id).await?;
        info!(kind = E::KIND, %id, "catalog row deleted");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use ims_core::{Entity, TenantId};

    use super::*;
    use crate::entities::Tenant;
    use crate::error::CatalogError;

    #[derive(Default)]
    struct VecRepo {
        rows: Mutex<Vec<Tenant>>,
    }

    #[async_trait]
    impl CatalogRepository<Tenant> for VecRepo {
        async fn list(&self) -> CatalogResult<Vec<Tenant>> {
            Ok(self.rows.lock().unwrap().clone())
        }

        async fn get(&self, id: TenantId) -> CatalogResult<Tenant> {
            self.rows
                .lock()
                .unwrap()
                .iter()
                .find(|t| t.id == id)
                .cloned()
                .ok_or_else(|| CatalogError::not_found(Tenant::KIND, id))
        }

        async fn create(&self, entity: Tenant) -> CatalogResult<Tenant> {
            let mut rows = self.rows.lock().unwrap();
            let created = entity.with_id(TenantId::new(rows.len() as i64 + 1));
            rows.push(created.clone());
            Ok(created)
        }

        async fn update(&self, entity: Tenant) -> CatalogResult<Tenant> {
            let mut rows = self.rows.lock().unwrap();
            let slot = rows
                .iter_mut()
                .find(|t| t.id == entity.id)
                .ok_or_else(|| CatalogError::not_found(Tenant::KIND, entity.id))?;
            *slot = entity.clone();
            Ok(entity)
        }

        async fn delete(&self, id: TenantId) -> CatalogResult<Tenant> {
            let mut rows = self.rows.lock().unwrap();
            let pos = rows
                .iter()
                .position(|t| t.id == id)
                .ok_or_else(|| CatalogError::not_found(Tenant::KIND, id))?;
            Ok(rows.remove(pos))
        }
    }

    fn tenant(name: &str) -> Tenant {
        Tenant {
            id: TenantId::new(0),
            tenant_name: name.to_string(),
            registered_address: String::new(),
            tenant_contact: String::new(),
            tenant_email: String::new(),
        }
    }

    fn service() -> (Arc<VecRepo>, CatalogService<Tenant>) {
        let repo = Arc::new(VecRepo::default());
        (repo.clone(), CatalogService::new(repo))
    }

    #[tokio::test]
    async fn create_assigns_id() {
        let (_, svc) = service();
        let created = svc.create(tenant("Acme")).await.unwrap();
        assert_eq!(created.id(), TenantId::new(1));
        assert_eq!(svc.get(TenantId::new(1)).await.unwrap().tenant_name, "Acme");
    }

    #[tokio::test]
    async fn invalid_entity_never_reaches_repository() {
        let (repo, svc) = service();
        let err = svc.create(tenant("  ")).await.unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
        assert!(repo.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_uses_path_id() {
        let (_, svc) = service();
        svc.create(tenant("Acme")).await.unwrap();

        let mut body = tenant("Acme Ltd");
        body.id = TenantId::new(99);
        let updated = svc.update(TenantId::new(1), body).await.unwrap();

        assert_eq!(updated.id, TenantId::new(1));
        assert_eq!(svc.list().await.unwrap(), vec![updated]);
    }

    #[tokio::test]
    async fn delete_of_missing_row_is_not_found() {
        let (_, svc) = service();
        let err = svc.delete(TenantId::new(5)).await.unwrap_err();
        assert_eq!(err, CatalogError::not_found("tenant", 5i64));
    }
}
