// In-memory container engine that records every call

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use super::{ContainerEngine, EngineError, ImageListing};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum EngineCall {
    Exists(String),
    Tag { source: String, target: String },
    List(String),
    Remove(String),
}

/// Fake engine holding an image store in memory.
///
/// Tagging adds the target reference to the store, so a listing taken after a
/// tag call includes the new tag just like a real engine would.
#[derive(Debug, Default)]
pub(crate) struct RecordingEngine {
    images: RefCell<HashSet<String>>,
    calls: RefCell<Vec<EngineCall>>,
    failing_tags: HashMap<String, i32>,
    failing_lists: HashMap<String, i32>,
    failing_removes: HashMap<String, i32>,
}

impl RecordingEngine {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_images<I, S>(self, references: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.images
            .borrow_mut()
            .extend(references.into_iter().map(Into::into));
        self
    }

    /// Make `tag(source, _)` fail with the given exit code
    pub(crate) fn fail_tag(mut self, source: &str, code: i32) -> Self {
        self.failing_tags.insert(source.to_string(), code);
        self
    }

    /// Make `list_images(repository)` fail with the given exit code
    pub(crate) fn fail_list(mut self, repository: &str, code: i32) -> Self {
        self.failing_lists.insert(repository.to_string(), code);
        self
    }

    /// Make `remove_image(reference)` fail with the given exit code
    pub(crate) fn fail_remove(mut self, reference: &str, code: i32) -> Self {
        self.failing_removes.insert(reference.to_string(), code);
        self
    }

    pub(crate) fn calls(&self) -> Vec<EngineCall> {
        self.calls.borrow().clone()
    }

    pub(crate) fn has_image(&self, reference: &str) -> bool {
        self.images.borrow().contains(reference)
    }

    fn record(&self, call: EngineCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl ContainerEngine for RecordingEngine {
    fn image_exists(&self, reference: &str) -> Result<bool, EngineError> {
        self.record(EngineCall::Exists(reference.to_string()));
        Ok(self.has_image(reference))
    }

    fn tag(&self, source: &str, target: &str) -> Result<(), EngineError> {
        self.record(EngineCall::Tag {
            source: source.to_string(),
            target: target.to_string(),
        });
        if let Some(code) = self.failing_tags.get(source) {
            return Err(EngineError::Failed {
                command: format!("fake tag {} {}", source, target),
                code: Some(*code),
            });
        }
        self.images.borrow_mut().insert(target.to_string());
        Ok(())
    }

    fn list_images(&self, repository: &str) -> Result<Vec<ImageListing>, EngineError> {
        self.record(EngineCall::List(repository.to_string()));
        if let Some(code) = self.failing_lists.get(repository) {
            return Err(EngineError::Failed {
                command: format!("fake images {}", repository),
                code: Some(*code),
            });
        }
        let prefix = format!("{}:", repository);
        let mut listing: Vec<ImageListing> = self
            .images
            .borrow()
            .iter()
            .filter(|reference| reference.starts_with(&prefix))
            .map(|reference| ImageListing {
                reference: reference.clone(),
                created_at: "2024-01-01 00:00:00 +0000 UTC".to_string(),
            })
            .collect();
        // HashSet order is arbitrary; keep listings deterministic
        listing.sort_by(|a, b| a.reference.cmp(&b.reference));
        Ok(listing)
    }

    fn remove_image(&self, reference: &str) -> Result<(), EngineError> {
        self.record(EngineCall::Remove(reference.to_string()));
        if let Some(code) = self.failing_removes.get(reference) {
            return Err(EngineError::Failed {
                command: format!("fake rmi {}", reference),
                code: Some(*code),
            });
        }
        self.images.borrow_mut().remove(reference);
        Ok(())
    }
}
