use serde::Deserialize;
use uuid::Uuid;

use super::error::ServiceError;
use super::tree::{ForeignKey, NodeDetail, NodeListing, TreeService};
use super::validate::FieldErrors;
use crate::database::models::{Menu, MenuAttributes};
use crate::database::Tables;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuInput {
    #[serde(flatten)]
    pub attributes: MenuAttributes,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
}

fn validate(attrs: &MenuAttributes) -> Result<(), ServiceError> {
    FieldErrors::new()
        .required("path", &attrs.path)
        .max_len("path", &attrs.path, 32)
        .required("name", &attrs.name)
        .max_len("name", &attrs.name, 32)
        .max_len("component", &attrs.component, 255)
        .max_len("redirect", &attrs.redirect, 255)
        .required("title", &attrs.title)
        .max_len("title", &attrs.title, 26)
        .max_len("icon", &attrs.icon, 32)
        .max_len("frameSrc", &attrs.frame_src, 255)
        .finish()
}

pub struct MenuService {
    tree: TreeService<Menu>,
}

impl MenuService {
    pub fn new(tables: &Tables) -> Self {
        let dependents = vec![ForeignKey::probe(tables.role_menus.clone(), "menu_id", "role bindings")];
        Self { tree: TreeService::new(tables.menus.clone(), dependents) }
    }

    pub async fn create(&self, input: MenuInput) -> Result<Menu, ServiceError> {
        validate(&input.attributes)?;
        self.tree.create(Menu::new(input.attributes, input.parent_id)).await
    }

    pub async fn get(&self, id: Uuid) -> Result<NodeDetail<Menu>, ServiceError> {
        self.tree.get(id).await
    }

    pub async fn list(&self, name: Option<&str>) -> Result<NodeListing<Menu>, ServiceError> {
        self.tree.list(name).await
    }

    pub async fn update(&self, id: Uuid, input: MenuInput) -> Result<Menu, ServiceError> {
        validate(&input.attributes)?;
        let MenuInput { attributes, parent_id } = input;
        self.tree.update(id, parent_id, move |menu| menu.apply(attributes)).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        self.tree.delete(id).await
    }
}
