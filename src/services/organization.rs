use serde::Deserialize;
use uuid::Uuid;

use super::error::ServiceError;
use super::tree::{ForeignKey, NodeDetail, NodeListing, TreeService};
use super::validate::FieldErrors;
use crate::database::models::Organization;
use crate::database::Tables;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
}

impl OrganizationInput {
    fn validate(&self) -> Result<(), ServiceError> {
        FieldErrors::new()
            .required("name", &self.name)
            .max_len("name", &self.name, 32)
            .max_len("description", &self.description, 56)
            .finish()
    }
}

pub struct OrganizationService {
    tree: TreeService<Organization>,
}

impl OrganizationService {
    pub fn new(tables: &Tables) -> Self {
        let dependents = vec![
            ForeignKey::probe(tables.positions.clone(), "organization_id", "positions"),
            ForeignKey::probe(tables.accounts.clone(), "organization_id", "accounts"),
        ];
        Self { tree: TreeService::new(tables.organizations.clone(), dependents) }
    }

    pub async fn create(&self, input: OrganizationInput) -> Result<Organization, ServiceError> {
        input.validate()?;
        let org = Organization::new(input.name.trim(), input.description, input.parent_id);
        self.tree.create(org).await
    }

    pub async fn get(&self, id: Uuid) -> Result<NodeDetail<Organization>, ServiceError> {
        self.tree.get(id).await
    }

    pub async fn list(&self, name: Option<&str>) -> Result<NodeListing<Organization>, ServiceError> {
        self.tree.list(name).await
    }

    pub async fn update(&self, id: Uuid, input: OrganizationInput) -> Result<Organization, ServiceError> {
        input.validate()?;
        let OrganizationInput { name, description, parent_id } = input;
        self.tree
            .update(id, parent_id, move |org| {
                org.name = name.trim().to_string();
                org.description = description;
            })
            .await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        self.tree.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Position;

    fn input(name: &str, parent_id: Option<Uuid>) -> OrganizationInput {
        OrganizationInput { name: name.to_string(), description: String::new(), parent_id }
    }

    #[tokio::test]
    async fn name_is_required_and_bounded() {
        let service = OrganizationService::new(&Tables::memory());
        let err = service.create(input(" ", None)).await.unwrap_err();
        assert!(matches!(err, ServiceError::ValidationFailed { .. }));

        let err = service.create(input(&"x".repeat(33), None)).await.unwrap_err();
        assert!(matches!(err, ServiceError::ValidationFailed { ref field_errors, .. } if field_errors.contains_key("name")));
    }

    #[tokio::test]
    async fn positions_block_delete() {
        let tables = Tables::memory();
        let service = OrganizationService::new(&tables);
        let org = service.create(input("HQ", None)).await.unwrap();
        tables.positions.insert(Position::new("CEO", org.id)).await.unwrap();

        assert!(matches!(service.delete(org.id).await.unwrap_err(), ServiceError::HasDependents(_)));
    }

    #[tokio::test]
    async fn get_reports_breadcrumb() {
        let service = OrganizationService::new(&Tables::memory());
        let root = service.create(input("Acme", None)).await.unwrap();
        let child = service.create(input("R&D", Some(root.id))).await.unwrap();

        let detail = service.get(child.id).await.unwrap();
        assert_eq!(detail.breadcrumb, "Acme/R&D");
        assert_eq!(detail.ancestors.len(), 2);
        assert_eq!(detail.node.level, 2);
    }
}
