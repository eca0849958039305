use thiserror::Error;

use ox_forms::FormError;

use crate::permissions::CrudAction;

#[derive(Debug, Error)]
pub enum CrudError {
    #[error("permission denied for {0}")]
    PermissionDenied(CrudAction),
    #[error("no editor is open")]
    NoEditor,
    #[error("unexpected response shape: {0}")]
    UnexpectedResponse(String),
    #[error("provider call failed: {0}")]
    Provider(String),
    #[error("route mode requires a navigator")]
    NoNavigator,
    #[error("container has been unmounted")]
    Unmounted,
    #[error(transparent)]
    Form(#[from] FormError),
}

impl CrudError {
    pub fn provider(err: anyhow::Error) -> Self {
        CrudError::Provider(format!("{:#}", err))
    }
}
