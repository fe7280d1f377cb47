//! Topic to handler binding.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::client::{AccountLifecycle, AppLifecycle, OrgPropagation};
use crate::handlers::{
    CreateAnonymousAccountHandler, DeleteAnonymousAccountsHandler, DeleteAppHandler, DepartmentDeletedHandler,
    EventHandler, OrgManagerChangedHandler, OrgNameChangedHandler, RenameAppHandler, UserDeletedHandler,
};

pub const TOPIC_ANONYMOUS_ACCOUNT_CREATE: &str = "user_management.anonymous_account.create";
pub const TOPIC_ANONYMOUS_ACCOUNT_DELETE: &str = "user_management.anonymous_account.delete";
pub const TOPIC_APP_DELETED: &str = "user_management.app.deleted";
pub const TOPIC_APP_NAME_MODIFIED: &str = "user_management.app.name.modified";
pub const TOPIC_USER_DELETE: &str = "core.user.delete";
pub const TOPIC_DEPT_DELETE: &str = "core.dept.delete";
pub const TOPIC_ORG_MANAGER_CHANGE: &str = "core.org.manager.change";
pub const TOPIC_ORG_NAME_MODIFY: &str = "core.org.name.modify";

/// Fixed mapping from topic to handler, built once at startup.
#[derive(Clone)]
pub struct DispatchTable {
    handlers: BTreeMap<&'static str, Arc<dyn EventHandler>>,
}

impl DispatchTable {
    pub fn new(
        accounts: Arc<dyn AccountLifecycle>,
        apps: Arc<dyn AppLifecycle>,
        org: Arc<dyn OrgPropagation>,
    ) -> Self {
        let bindings: [(&'static str, Arc<dyn EventHandler>); 8] = [
            (
                TOPIC_ANONYMOUS_ACCOUNT_CREATE,
                Arc::new(CreateAnonymousAccountHandler::new(accounts.clone())),
            ),
            (
                TOPIC_ANONYMOUS_ACCOUNT_DELETE,
                Arc::new(DeleteAnonymousAccountsHandler::new(accounts)),
            ),
            (TOPIC_APP_DELETED, Arc::new(DeleteAppHandler::new(apps.clone()))),
            (TOPIC_APP_NAME_MODIFIED, Arc::new(RenameAppHandler::new(apps))),
            (TOPIC_USER_DELETE, Arc::new(UserDeletedHandler::new(org.clone()))),
            (TOPIC_DEPT_DELETE, Arc::new(DepartmentDeletedHandler::new(org.clone()))),
            (
                TOPIC_ORG_MANAGER_CHANGE,
                Arc::new(OrgManagerChangedHandler::new(org.clone())),
            ),
            (TOPIC_ORG_NAME_MODIFY, Arc::new(OrgNameChangedHandler::new(org))),
        ];

        Self {
            handlers: bindings.into_iter().collect(),
        }
    }

    pub fn get(&self, topic: &str) -> Option<Arc<dyn EventHandler>> {
        self.handlers.get(topic).cloned()
    }

    /// Bound topics, in order
    pub fn topics(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handlers.keys().copied()
    }

    /// All bindings, in topic order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Arc<dyn EventHandler>)> + '_ {
        self.handlers.iter().map(|(topic, handler)| (*topic, handler.clone()))
    }
}
