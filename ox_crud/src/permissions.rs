use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CrudAction {
    View,
    Create,
    Edit,
    Delete,
}

impl fmt::Display for CrudAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CrudAction::View => "view",
            CrudAction::Create => "create",
            CrudAction::Edit => "edit",
            CrudAction::Delete => "delete",
        };
        f.write_str(name)
    }
}

pub type PermissionCheck = Arc<dyn Fn(CrudAction, Option<&Value>) -> bool + Send + Sync>;

/// Gate for row and toolbar actions. Without a check everything is allowed.
#[derive(Clone, Default)]
pub struct Permissions {
    check: Option<PermissionCheck>,
}

impl Permissions {
    pub fn allow_all() -> Self {
        Self::default()
    }

    pub fn with_check<F>(check: F) -> Self
    where
        F: Fn(CrudAction, Option<&Value>) -> bool + Send + Sync + 'static,
    {
        Self {
            check: Some(Arc::new(check)),
        }
    }

    pub fn allows(&self, action: CrudAction, record: Option<&Value>) -> bool {
        self.check.as_ref().map_or(true, |check| check(action, record))
    }
}
