//! Path navigation over the live state graph.

use crate::mutate::MutateError;
use crate::Inspect;

/// Resolve a path to the container of its final segment.
///
/// Walks every segment but the last through [`Inspect::field_mut`] and
/// returns the object holding the last segment together with that
/// segment's name. The final field is neither read nor written here;
/// callers decide what to do with it.
///
/// A missing or non-navigable step fails with
/// [`MutateError::PathNotFound`] naming the step: a reported failure,
/// never a panic.
pub fn resolve_mut<'a>(
    root: &'a mut dyn Inspect,
    path: &'a [String],
) -> Result<(&'a mut dyn Inspect, &'a str), MutateError> {
    let (last, steps) = path.split_last().ok_or(MutateError::EmptyPath)?;

    let mut current = root;
    for (depth, key) in steps.iter().enumerate() {
        let container = current;
        current = container
            .field_mut(key)
            .ok_or_else(|| MutateError::PathNotFound {
                key: key.clone(),
                depth,
            })?;
    }

    Ok((current, last.as_str()))
}
