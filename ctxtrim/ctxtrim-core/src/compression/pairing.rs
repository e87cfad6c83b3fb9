//! Tool call/result exchange detection.
//!
//! An exchange is an assistant `tool-call` part and a tool `tool-result` part
//! sharing a call identifier. Every position from the call to the result,
//! inclusive, is protected from deletion so that anything said between them
//! stays in order around the exchange.

use std::collections::{BTreeSet, HashMap};
use std::ops::RangeInclusive;

use crate::completion::Message;

/// Inclusive position spans of every matched exchange, in no particular order.
///
/// When an identifier is used more than once, only its last call and last
/// result are paired. Unmatched calls and results yield no span.
pub fn exchange_spans(messages: &[Message]) -> Vec<RangeInclusive<usize>> {
    let mut calls: HashMap<&str, usize> = HashMap::new();
    let mut results: HashMap<&str, usize> = HashMap::new();

    for (idx, message) in messages.iter().enumerate() {
        for id in message.tool_call_ids() {
            calls.insert(id, idx);
        }
        for id in message.tool_result_ids() {
            results.insert(id, idx);
        }
    }

    calls
        .into_iter()
        .filter_map(|(id, call_idx)| {
            let result_idx = *results.get(id)?;
            Some(call_idx.min(result_idx)..=call_idx.max(result_idx))
        })
        .collect()
}

/// Positions that must survive trimming because they fall inside an exchange.
pub fn protected_indices(messages: &[Message]) -> BTreeSet<usize> {
    exchange_spans(messages).into_iter().flatten().collect()
}
