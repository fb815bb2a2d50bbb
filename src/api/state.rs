use std::ops::Deref;

use derive_new::new;

use crate::service::Service;

/// Shared state of every handler.
#[derive(Debug, Clone, new)]
pub struct App {
    pub service: Service,
}

impl Deref for App {
    type Target = Service;

    fn deref(&self) -> &Self::Target {
        &self.service
    }
}
