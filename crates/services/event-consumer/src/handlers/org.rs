//! Org-structure propagation handlers.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use domain::{IdEvent, IdsEvent, LogicResult, OrgNameChangedEvent, OrgObjectType};

use super::app::ID_SCHEMA;
use super::{drop_invalid, settle, EventHandler};
use crate::client::OrgPropagation;
use crate::validation::{Field, FieldKind, Schema};

const IDS_SCHEMA: Schema = Schema::new(&[Field::required("ids", FieldKind::StringArray)]);

const NAME_CHANGED_SCHEMA: Schema = Schema::new(&[
    Field::required("id", FieldKind::String),
    Field::required("new_name", FieldKind::String),
    Field::required("type", FieldKind::String),
]);

/// Cleans up directory state owned by a deleted user.
pub struct UserDeletedHandler {
    org: Arc<dyn OrgPropagation>,
}

impl UserDeletedHandler {
    pub fn new(org: Arc<dyn OrgPropagation>) -> Self {
        Self { org }
    }
}

#[async_trait]
impl EventHandler for UserDeletedHandler {
    fn name(&self) -> &'static str {
        "user-deleted"
    }

    async fn handle(&self, payload: &[u8]) -> LogicResult<()> {
        let event: IdEvent = match ID_SCHEMA.decode_valid(payload) {
            Ok(event) => event,
            Err(e) => return drop_invalid(self.name(), e),
        };

        let result = self.org.on_user_deleted(&event.id).await;
        if result.is_ok() {
            info!(id = %event.id, "Propagated user deletion");
        }
        settle(self.name(), &event.id, result)
    }
}

/// Cleans up directory state owned by a deleted department.
pub struct DepartmentDeletedHandler {
    org: Arc<dyn OrgPropagation>,
}

impl DepartmentDeletedHandler {
    pub fn new(org: Arc<dyn OrgPropagation>) -> Self {
        Self { org }
    }
}

#[async_trait]
impl EventHandler for DepartmentDeletedHandler {
    fn name(&self) -> &'static str {
        "department-deleted"
    }

    async fn handle(&self, payload: &[u8]) -> LogicResult<()> {
        let event: IdEvent = match ID_SCHEMA.decode_valid(payload) {
            Ok(event) => event,
            Err(e) => return drop_invalid(self.name(), e),
        };

        let result = self.org.on_department_deleted(&event.id).await;
        if result.is_ok() {
            info!(id = %event.id, "Propagated department deletion");
        }
        settle(self.name(), &event.id, result)
    }
}

pub struct OrgManagerChangedHandler {
    org: Arc<dyn OrgPropagation>,
}

impl OrgManagerChangedHandler {
    pub fn new(org: Arc<dyn OrgPropagation>) -> Self {
        Self { org }
    }
}

#[async_trait]
impl EventHandler for OrgManagerChangedHandler {
    fn name(&self) -> &'static str {
        "org-manager-changed"
    }

    async fn handle(&self, payload: &[u8]) -> LogicResult<()> {
        let event: IdsEvent = match IDS_SCHEMA.decode_valid(payload) {
            Ok(event) => event,
            Err(e) => return drop_invalid(self.name(), e),
        };

        let ids = event.ids.join(",");
        let result = self.org.on_org_manager_changed(&event.ids).await;
        if result.is_ok() {
            info!(count = event.ids.len(), "Propagated org manager change");
        }
        settle(self.name(), &ids, result)
    }
}

/// Propagates renames of org objects. Only user renames affect the directory.
pub struct OrgNameChangedHandler {
    org: Arc<dyn OrgPropagation>,
}

impl OrgNameChangedHandler {
    pub fn new(org: Arc<dyn OrgPropagation>) -> Self {
        Self { org }
    }
}

#[async_trait]
impl EventHandler for OrgNameChangedHandler {
    fn name(&self) -> &'static str {
        "org-name-changed"
    }

    async fn handle(&self, payload: &[u8]) -> LogicResult<()> {
        let event: OrgNameChangedEvent = match NAME_CHANGED_SCHEMA.decode_valid(payload) {
            Ok(event) => event,
            Err(e) => return drop_invalid(self.name(), e),
        };

        match event.object_type() {
            OrgObjectType::User => {
                let result = self.org.on_user_renamed(&event.id, &event.new_name).await;
                if result.is_ok() {
                    info!(id = %event.id, new_name = %event.new_name, "Propagated user rename");
                }
                settle(self.name(), &event.id, result)
            }
            other => {
                debug!(id = %event.id, object_type = %other, "Ignoring rename of non-user org object");
                Ok(())
            }
        }
    }
}
