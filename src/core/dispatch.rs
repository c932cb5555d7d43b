//! Event dispatch along the ancestor chain

use super::error_manager::{ErrorCode, ErrorManager};
use super::handler::{guarded, publish_reporting};
use super::log_event::LogEvent;
use super::node::LoggerNode;
use super::resource_bundle::ResourceBundle;
use std::sync::Arc;

/// Deliver `event` starting at `origin`
///
/// 1. binds the nearest ancestor's resource bundle if the event has none,
/// 2. runs the origin's filter; rejection stops everything,
/// 3. publishes to each node's handlers from `origin` upward, stopping after
///    the first node that disables parent delegation.
///
/// Handler and filter failures go to their error channels and never stop the
/// walk.
pub(crate) fn dispatch(
    origin: &Arc<LoggerNode>,
    mut event: LogEvent,
    errors: &dyn ErrorManager,
) {
    if event.needs_localization() {
        if let Some(bundle) = nearest_bundle(origin) {
            event.set_resource_bundle(bundle);
        }
    }

    if let Some(filter) = origin.filter() {
        match guarded("filter", || Ok(filter.is_loggable(&event))) {
            Ok(true) => {}
            Ok(false) => return,
            Err(e) => errors.error(
                &format!("Filter on logger '{}' failed", origin.name()),
                Some(&e),
                ErrorCode::FilterFailure,
            ),
        }
    }

    let mut current = Some(Arc::clone(origin));
    while let Some(node) = current {
        for handler in node.handlers().iter() {
            publish_reporting(handler.as_ref(), &event);
        }
        if !node.use_parent_handlers() {
            break;
        }
        current = node.parent();
    }
}

fn nearest_bundle(origin: &Arc<LoggerNode>) -> Option<Arc<dyn ResourceBundle>> {
    let mut current = Some(Arc::clone(origin));
    while let Some(node) = current {
        if let Some(bundle) = node.resource_bundle() {
            return Some(bundle);
        }
        current = node.parent();
    }
    None
}
