// Container engine access - the four image operations the retention run needs
//
// Production code talks to docker or podman through `CliEngine`; tests swap in
// `RecordingEngine` to observe the exact call sequence.

mod cli;
mod error;
#[cfg(test)]
mod recording;

pub(crate) use cli::CliEngine;
pub(crate) use error::EngineError;
#[cfg(test)]
pub(crate) use recording::{EngineCall, RecordingEngine};

/// Go template passed to `images --format`
pub(crate) const LISTING_FORMAT: &str = "{{.Repository}}:{{.Tag}} {{.CreatedAt}}";

/// One line of an image listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImageListing {
    /// Full `repository:tag` reference
    pub reference: String,
    /// Creation time as reported by the engine, unparsed
    pub created_at: String,
}

/// Image operations offered by a container engine
pub(crate) trait ContainerEngine {
    /// Whether an image with the given reference exists locally.
    ///
    /// A non-zero status from the probe means "absent" and is not an error;
    /// only a failure to run the engine at all is reported as `Err`.
    fn image_exists(&self, reference: &str) -> Result<bool, EngineError>;

    /// Point `target` at the same image content as `source`
    fn tag(&self, source: &str, target: &str) -> Result<(), EngineError>;

    /// List every tag known for a repository path
    fn list_images(&self, repository: &str) -> Result<Vec<ImageListing>, EngineError>;

    /// Remove an image reference
    fn remove_image(&self, reference: &str) -> Result<(), EngineError>;
}

/// Parse `images --format` output produced with [`LISTING_FORMAT`].
///
/// The first whitespace-separated token is the reference; whatever follows is
/// kept verbatim as the creation time. Blank lines are ignored.
pub(crate) fn parse_listing(output: &str) -> Vec<ImageListing> {
    output
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            let reference = line.split_whitespace().next()?;
            let created_at = line[reference.len()..].trim().to_string();
            Some(ImageListing {
                reference: reference.to_string(),
                created_at,
            })
        })
        .collect()
}
