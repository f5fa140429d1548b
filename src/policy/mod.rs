//! Format choice policies.
//!
//! At every hop of a node-path the negotiator hands the sorted set of
//! legal formats to a [`FormatPolicy`], which returns the formats it is
//! willing to use in priority order. An empty answer vetoes the hop.
//!
//! Answers are filtered by the negotiator: formats outside the candidate
//! set and repeated formats are dropped, so a policy cannot make a route
//! illegal.

pub mod bounded;
pub mod preference;

pub use bounded::BoundedPolicy;
pub use preference::{AcceptAll, PreferenceOrder};

use crate::types::{ConnectionFormat, Route, SinkId, SourceId};

/// Input of one format decision.
#[derive(Debug, Clone, Copy)]
pub struct FormatChoiceRequest<'a> {
    /// Source of the hop being decided.
    pub source_id: SourceId,
    /// Sink of the hop being decided.
    pub sink_id: SinkId,
    /// Route so far, with every earlier hop already resolved.
    pub route: &'a Route,
    /// Legal formats for this hop, sorted and duplicate-free.
    pub candidates: &'a [ConnectionFormat],
}

/// Decides which formats to try at a hop.
pub trait FormatPolicy {
    /// Priority-ordered subset of `request.candidates`. May be empty.
    fn choose_formats(&self, request: &FormatChoiceRequest<'_>) -> Vec<ConnectionFormat>;
}

/// Policy backed by a closure. See [`from_fn`].
#[derive(Clone)]
pub struct FnPolicy<F>(F);

impl<F> std::fmt::Debug for FnPolicy<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FnPolicy")
    }
}

impl<F> FormatPolicy for FnPolicy<F>
where
    F: Fn(&FormatChoiceRequest<'_>) -> Vec<ConnectionFormat>,
{
    fn choose_formats(&self, request: &FormatChoiceRequest<'_>) -> Vec<ConnectionFormat> {
        (self.0)(request)
    }
}

/// Wrap a closure as a policy.
pub fn from_fn<F>(f: F) -> FnPolicy<F>
where
    F: Fn(&FormatChoiceRequest<'_>) -> Vec<ConnectionFormat>,
{
    FnPolicy(f)
}

impl<P: FormatPolicy + ?Sized> FormatPolicy for Box<P> {
    fn choose_formats(&self, request: &FormatChoiceRequest<'_>) -> Vec<ConnectionFormat> {
        (**self).choose_formats(request)
    }
}

impl<P: FormatPolicy + ?Sized> FormatPolicy for std::sync::Arc<P> {
    fn choose_formats(&self, request: &FormatChoiceRequest<'_>) -> Vec<ConnectionFormat> {
        (**self).choose_formats(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_policy() {
        let route = Route::new(SourceId::new(1), SinkId::new(2), Vec::new());
        let candidates = [ConnectionFormat::MONO, ConnectionFormat::STEREO];
        let request = FormatChoiceRequest {
            source_id: SourceId::new(1),
            sink_id: SinkId::new(2),
            route: &route,
            candidates: &candidates,
        };

        let reverse = from_fn(|req: &FormatChoiceRequest<'_>| req.candidates.iter().rev().copied().collect());
        assert_eq!(
            reverse.choose_formats(&request),
            vec![ConnectionFormat::STEREO, ConnectionFormat::MONO]
        );

        let boxed: Box<dyn FormatPolicy> = Box::new(reverse);
        assert_eq!(boxed.choose_formats(&request).len(), 2);
    }
}
