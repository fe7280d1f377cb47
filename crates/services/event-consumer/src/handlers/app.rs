//! App lifecycle handlers.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use domain::{AppRenamedEvent, IdEvent, LogicResult};

use super::{drop_invalid, settle, EventHandler};
use crate::client::AppLifecycle;
use crate::validation::{Field, FieldKind, Schema};

pub(super) const ID_SCHEMA: Schema = Schema::new(&[Field::required("id", FieldKind::String)]);

const RENAME_SCHEMA: Schema = Schema::new(&[
    Field::required("id", FieldKind::String),
    Field::required("new_name", FieldKind::String),
]);

/// Removes an app and everything granted to it.
pub struct DeleteAppHandler {
    apps: Arc<dyn AppLifecycle>,
}

impl DeleteAppHandler {
    pub fn new(apps: Arc<dyn AppLifecycle>) -> Self {
        Self { apps }
    }
}

#[async_trait]
impl EventHandler for DeleteAppHandler {
    fn name(&self) -> &'static str {
        "delete-app"
    }

    async fn handle(&self, payload: &[u8]) -> LogicResult<()> {
        let event: IdEvent = match ID_SCHEMA.decode_valid(payload) {
            Ok(event) => event,
            Err(e) => return drop_invalid(self.name(), e),
        };

        let result = self.apps.delete_app(&event.id).await;
        if result.is_ok() {
            info!(id = %event.id, "App deleted");
        }
        settle(self.name(), &event.id, result)
    }
}

pub struct RenameAppHandler {
    apps: Arc<dyn AppLifecycle>,
}

impl RenameAppHandler {
    pub fn new(apps: Arc<dyn AppLifecycle>) -> Self {
        Self { apps }
    }
}

#[async_trait]
impl EventHandler for RenameAppHandler {
    fn name(&self) -> &'static str {
        "rename-app"
    }

    async fn handle(&self, payload: &[u8]) -> LogicResult<()> {
        let event: AppRenamedEvent = match RENAME_SCHEMA.decode_valid(payload) {
            Ok(event) => event,
            Err(e) => return drop_invalid(self.name(), e),
        };

        let result = self.apps.rename_app(&event.id, &event.new_name).await;
        if result.is_ok() {
            info!(id = %event.id, new_name = %event.new_name, "App renamed");
        }
        settle(self.name(), &event.id, result)
    }
}
