//! Navigation state shared by every HTML page.

use crate::middleware::{AdminSource, Viewer};
use crate::state::AppState;

/// Header/nav fields every page template renders.
#[derive(Debug, Clone)]
pub struct PageChrome {
    pub user_email: Option<String>,
    pub is_admin: bool,
    /// Admin flag comes from the developer toggle rather than a role.
    pub is_override: bool,
    pub dev_controls: bool,
}

impl PageChrome {
    #[must_use]
    pub fn new(state: &AppState, viewer: &Viewer) -> Self {
        Self {
            user_email: viewer.email(),
            is_admin: viewer.is_admin,
            is_override: viewer.admin_source == AdminSource::DevOverride,
            dev_controls: state.config().dev_controls,
        }
    }
}
