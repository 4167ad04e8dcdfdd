// Retention manager - retag `latest` with the run timestamp and prune old tags
//
// Each component runs CHECK -> {absent: skip, present: TAG -> LIST -> FILTER ->
// SORT -> PRUNE}. The first failing tag, list or remove call aborts the whole
// run; work already done for earlier components is left as is.

mod plan;

pub(crate) use plan::RetentionPlan;

use std::io::Write;
use thiserror::Error;
use tracing::{debug, info};

use crate::engine::{ContainerEngine, EngineError, ImageListing};

#[derive(Debug, Error)]
pub(crate) enum RetentionError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Failed to write status output")]
    Output(#[from] std::io::Error),
}

impl RetentionError {
    pub(crate) fn exit_code(&self) -> i32 {
        match self {
            RetentionError::Engine(err) => err.exit_code(),
            RetentionError::Output(_) => 1,
        }
    }
}

/// What happened to a single component
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ComponentOutcome {
    /// `latest` did not exist, nothing was touched
    Skipped,
    Retained {
        tagged: String,
        removed: Vec<String>,
    },
}

#[derive(Debug, Default)]
pub(crate) struct RunSummary {
    pub outcomes: Vec<(String, ComponentOutcome)>,
}

impl RunSummary {
    pub(crate) fn tagged(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, ComponentOutcome::Retained { .. }))
            .count()
    }

    pub(crate) fn skipped(&self) -> usize {
        self.outcomes.len() - self.tagged()
    }

    pub(crate) fn removed(&self) -> usize {
        self.outcomes
            .iter()
            .map(|(_, o)| match o {
                ComponentOutcome::Retained { removed, .. } => removed.len(),
                ComponentOutcome::Skipped => 0,
            })
            .sum()
    }
}

/// Pick the references to delete from a tag listing.
///
/// Everything except `latest_reference` is a candidate. Candidates are sorted
/// in descending string order and the first `keep` survive. Only tags in the
/// fixed-width timestamp format are guaranteed to sort chronologically; other
/// tags end up wherever string comparison puts them.
pub(crate) fn select_stale_tags(
    listing: &[ImageListing],
    latest_reference: &str,
    keep: usize,
) -> Vec<String> {
    let mut candidates: Vec<&str> = listing
        .iter()
        .map(|entry| entry.reference.as_str())
        .filter(|reference| *reference != latest_reference)
        .collect();

    candidates.sort_unstable_by(|a, b| b.cmp(a));

    candidates
        .into_iter()
        .skip(keep)
        .map(str::to_string)
        .collect()
}

/// Retag and prune a single component
pub(crate) fn retain_component(
    engine: &dyn ContainerEngine,
    plan: &RetentionPlan,
    component: &str,
    out: &mut dyn Write,
) -> Result<ComponentOutcome, RetentionError> {
    let source = plan.latest_reference(component);

    if !engine.image_exists(&source)? {
        writeln!(out, "Image not found: {}, skipping", source)?;
        return Ok(ComponentOutcome::Skipped);
    }

    let target = plan.timestamp_reference(component);
    engine.tag(&source, &target)?;
    writeln!(out, "✓ Tagged {} -> {}", source, target)?;

    let listing = engine.list_images(&plan.repository(component))?;
    debug!(
        component = component,
        tags = listing.len(),
        "Listed image tags"
    );

    let stale = select_stale_tags(&listing, &source, plan.keep());
    for reference in &stale {
        engine.remove_image(reference)?;
        writeln!(out, "Removed old image: {}", reference)?;
    }

    Ok(ComponentOutcome::Retained {
        tagged: target,
        removed: stale,
    })
}

/// Run every component of the plan in order, stopping at the first fatal error
pub(crate) fn run(
    engine: &dyn ContainerEngine,
    plan: &RetentionPlan,
    out: &mut dyn Write,
) -> Result<RunSummary, RetentionError> {
    info!(
        timestamp = plan.timestamp(),
        components = plan.components().len(),
        keep = plan.keep(),
        "Starting retention run"
    );

    let mut summary = RunSummary::default();
    for component in plan.components() {
        let outcome = retain_component(engine, plan, component, out)?;
        if let ComponentOutcome::Retained { tagged, removed } = &outcome {
            debug!(
                component = component.as_str(),
                tagged = tagged.as_str(),
                removed = removed.len(),
                "Component retained"
            );
        }
        summary.outcomes.push((component.clone(), outcome));
    }

    info!(
        tagged = summary.tagged(),
        skipped = summary.skipped(),
        removed = summary.removed(),
        "Retention run complete"
    );

    Ok(summary)
}
