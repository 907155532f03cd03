use std::sync::Arc;
use std::time::Duration;

use storage::CompetitionStore;

use crate::deadline::Deadline;
use crate::media::MediaUploader;

/// Shared handles cloned into every request
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CompetitionStore>,
    pub uploader: Arc<dyn MediaUploader>,
    pub request_timeout: Duration,
    pub media_root: Arc<str>,
}

impl AppState {
    pub fn deadline(&self) -> Deadline {
        Deadline::after(self.request_timeout)
    }
}
