//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::rc::Rc;
use std::sync::Arc;

use crate::application::services::PresentationService;
use crate::config::Settings;
use crate::domain::IdGenerator;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};

/// Container holding all application services.
///
/// One container is one editing session: it owns the id generator every
/// presentation opened through it draws from.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    ids: Rc<IdGenerator>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealFileSystem))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>) -> Self {
        let settings = Arc::new(settings);

        Self {
            settings,
            fs,
            ids: Rc::new(IdGenerator::new()),
        }
    }

    pub fn presentation_service(&self) -> PresentationService {
        PresentationService::with_ids(
            Arc::clone(&self.fs),
            self.settings.presentation_options(),
            Rc::clone(&self.ids),
        )
    }
}
