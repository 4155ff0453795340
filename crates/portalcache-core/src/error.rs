use thiserror::Error;

use crate::api::ApiError;
use crate::cache::StoreError;
use crate::mapper::MapperError;

/// Everything a portal read can fail with.
#[derive(Error, Debug)]
pub enum PortalError {
    #[error(transparent)]
    Transport(#[from] ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Could not convert portal data: {0}")]
    Mapping(#[from] MapperError),
}

impl PortalError {
    /// True if the failure came from talking to the server
    pub fn is_transport(&self) -> bool {
        matches!(self, PortalError::Transport(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PortalError::Transport(ApiError::NotFound(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_classification() {
        let err: PortalError = ApiError::NotFound("/events/nope/".to_string()).into();
        assert!(err.is_transport());
        assert!(err.is_not_found());

        let err: PortalError = MapperError::IncompleteWindow("publish").into();
        assert!(!err.is_transport());
        assert!(err.to_string().contains("publish"));
    }
}
