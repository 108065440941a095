//! Save-listener registry.
//!
//! The application shell owns one registry and re-attaches a listener each
//! time a project is opened. Attaching replaces whatever was registered for
//! that project, so there is never more than one active listener per
//! project and no global state is involved.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// At most one listener per open project, keyed by artifact path.
#[derive(Debug)]
pub struct ListenerRegistry<L> {
    listeners: HashMap<PathBuf, L>,
}

impl<L> Default for ListenerRegistry<L> {
    fn default() -> Self {
        Self {
            listeners: HashMap::new(),
        }
    }
}

impl<L> ListenerRegistry<L> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` for `project`, returning the one it replaced.
    pub fn attach(&mut self, project: impl Into<PathBuf>, listener: L) -> Option<L> {
        let project = project.into();
        let previous = self.listeners.insert(project.clone(), listener);
        if previous.is_some() {
            tracing::debug!(project = %project.display(), "Replaced existing save listener");
        }
        previous
    }

    /// Removes the listener for `project` (on close).
    pub fn detach(&mut self, project: &Path) -> Option<L> {
        self.listeners.remove(project)
    }

    pub fn get(&self, project: &Path) -> Option<&L> {
        self.listeners.get(project)
    }

    pub fn get_mut(&mut self, project: &Path) -> Option<&mut L> {
        self.listeners.get_mut(project)
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}
