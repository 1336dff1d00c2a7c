// Application state for HTTP handlers
use crate::application::session::SessionRegistry;

pub struct AppState {
    pub sessions: SessionRegistry,
}
