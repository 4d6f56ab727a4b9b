//! Message capabilities consulted by pipelines and aspects.

use super::Outcome;

/// Capability letting a filter halt the remaining filters of a pipeline run.
///
/// Pipelines only read the flag. It is never reset automatically: callers
/// that reuse a message must clear it themselves.
pub trait StopProcessing {
    /// Returns true once processing should stop.
    fn stop(&self) -> bool;

    /// Sets the stop flag.
    fn set_stop(&mut self, stop: bool);
}

/// A value that can travel through a pipeline or an aspect chain.
///
/// The stop capability is an optional facet queried per filter boundary, so
/// plain payloads only need an empty `impl Message for MyPayload {}`.
pub trait Message {
    /// Returns the stop capability if this message carries one.
    fn stop_processing(&self) -> Option<&dyn StopProcessing> {
        None
    }

    /// Returns true if the message carries the stop capability and its flag is set.
    fn is_stopped(&self) -> bool {
        self.stop_processing().is_some_and(|capability| capability.stop())
    }

    /// Returns the short runtime type name of the message.
    fn type_name(&self) -> &'static str {
        short_type_name(std::any::type_name::<Self>())
    }
}

/// A message whose filters report their result through an [`Outcome`].
pub trait OutcomeMessage: Message {
    /// The success payload.
    type Value;
    /// The failure payload.
    type Error;

    /// Returns the outcome, if a filter has produced one yet.
    fn outcome(&self) -> Option<&Outcome<Self::Value, Self::Error>>;
}

/// Strips the module path from a fully qualified type name.
///
/// Generic arguments are kept as-is: `my_app::Envelope<alloc::string::String>`
/// becomes `Envelope<alloc::string::String>`. Tuples, references, slices and
/// arrays are returned unchanged.
#[must_use]
pub fn short_type_name(full: &'static str) -> &'static str {
    if full.starts_with(|c: char| matches!(c, '(' | '&' | '[')) {
        return full;
    }
    let base = full.split('<').next().unwrap_or(full);
    match base.rfind("::") {
        Some(index) => &full[index + 2..],
        None => full,
    }
}

macro_rules! impl_plain_message {
    ($($ty:ty),* $(,)?) => {
        $(impl Message for $ty {})*
    };
}

impl_plain_message!(
    String,
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    u64,
    usize,
    serde_json::Value,
);
