//! Attribution: finding the frame that actually raised an error.

use crate::{
    frame::{self, Frame, FrameConfig},
    helpers::HelperRegistry,
};

/// Returns the nearest frame, `skip` frames above the caller, that is not a
/// registered helper.
///
/// Returns `None` only when no frame is available at all (the skip exceeds
/// the stack depth, or the binary lacks debug information).
///
/// # Panics
///
/// Panics if every inspected frame is a helper: the registry and the call
/// depth disagree, and any frame returned would be wrong.
#[must_use]
pub fn resolve_caller(registry: &HelperRegistry, skip: usize) -> Option<Frame> {
    let mut inspected = 0usize;
    let mut found = None;
    frame::walk(skip, FrameConfig::get().max_depth, |frame| {
        inspected += 1;
        if registry.is_helper(frame.function()) {
            true
        } else {
            found = Some(frame);
            false
        }
    });

    if found.is_none() {
        assert!(
            inspected == 0,
            "all {inspected} candidate caller frames are registered helpers"
        );
        tracing::debug!(skip, "no frames available for caller attribution");
    }
    found
}

/// Captures the stack `skip` frames above the caller with every helper frame
/// removed, wherever it occurs.
#[must_use]
pub fn resolve_stack(registry: &HelperRegistry, skip: usize) -> Vec<Frame> {
    let mut stack = frame::capture(skip);
    stack.retain(|frame| !registry.is_helper(frame.function()));
    stack
}
