//! Per-index concatenation of streamed tool-call fragments

use std::collections::BTreeMap;

use crate::types::{ToolCall, ToolCallFunction};

/// Progress of one streamed tool call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolCallState {
    /// No fragment with this index has been seen
    NotStarted,
    /// Fragments are still arriving
    Accumulating,
    /// The stream closed; arguments are final
    Complete,
}

#[derive(Debug, Clone)]
struct PendingCall {
    call: ToolCall,
    state: ToolCallState,
}

/// Tool calls assembled from stream fragments, keyed by index
///
/// Arguments are concatenated as raw text and never validated; whether they
/// form valid JSON is the consumer's concern once the stream has closed.
#[derive(Debug, Clone, Default)]
pub struct ToolCallAccumulator {
    calls: BTreeMap<u32, PendingCall>,
}

impl ToolCallAccumulator {
    /// Merge the fragments carried by one chunk
    pub fn apply(&mut self, fragments: &[ToolCall]) {
        for fragment in fragments {
            let pending = self.calls.entry(fragment.index).or_insert_with(|| PendingCall {
                call: ToolCall {
                    index: fragment.index,
                    id: None,
                    call_type: fragment.call_type.clone(),
                    function: ToolCallFunction::default(),
                },
                state: ToolCallState::Accumulating,
            });

            if pending.state == ToolCallState::Complete {
                tracing::debug!(index = fragment.index, "tool call fragment after completion");
            }

            if fragment.id.is_some() {
                pending.call.id.clone_from(&fragment.id);
            }
            if fragment.function.name.is_some() {
                pending.call.function.name.clone_from(&fragment.function.name);
            }
            pending.call.function.arguments.push_str(&fragment.function.arguments);
        }
    }

    /// Mark every call complete
    pub fn complete(&mut self) {
        for pending in self.calls.values_mut() {
            pending.state = ToolCallState::Complete;
        }
    }

    pub fn state(&self, index: u32) -> ToolCallState {
        self.calls
            .get(&index)
            .map_or(ToolCallState::NotStarted, |pending| pending.state)
    }

    pub fn get(&self, index: u32) -> Option<&ToolCall> {
        self.calls.get(&index).map(|pending| &pending.call)
    }

    /// Accumulated calls in index order
    pub fn calls(&self) -> Vec<ToolCall> {
        self.calls.values().map(|pending| pending.call.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}
