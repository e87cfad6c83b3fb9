//! Post-trim repair of broken tool call/result references.
//!
//! Deleting messages can leave a tool result whose call is gone, or a call
//! whose result is gone. Providers reject both, so the trimmed transcript is
//! filtered once more before it is returned.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::completion::{Message, Role};

/// How thoroughly [`repair`] restores exchange integrity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RepairMode {
    /// Drop orphaned results from the pinned end and any remaining dangling
    /// call or result outside the pinned start.
    #[default]
    Strict,
    /// Only drop pinned-end tool messages whose results point at a call that
    /// no longer exists.
    EndFilter,
}

/// Reassemble the trimmed regions and drop messages with broken references.
///
/// Messages in `pinned_start` are never dropped.
pub fn repair(
    pinned_start: Vec<Message>,
    middle: Vec<Message>,
    pinned_end: Vec<Message>,
    mode: RepairMode,
) -> Vec<Message> {
    let pinned_end = drop_orphaned_results(&pinned_start, &middle, pinned_end);

    let protected_prefix = pinned_start.len();
    let mut messages = pinned_start;
    messages.extend(middle);
    messages.extend(pinned_end);

    match mode {
        RepairMode::EndFilter => messages,
        RepairMode::Strict => drop_dangling_exchanges(messages, protected_prefix),
    }
}

/// Drop tool messages in `pinned_end` holding any result whose call id does not
/// appear in `pinned_start`, `middle` or an earlier kept `pinned_end` message.
fn drop_orphaned_results(
    pinned_start: &[Message],
    middle: &[Message],
    pinned_end: Vec<Message>,
) -> Vec<Message> {
    let mut live_calls: HashSet<&str> = pinned_start
        .iter()
        .chain(middle)
        .flat_map(Message::tool_call_ids)
        .collect();

    let keep: Vec<bool> = pinned_end
        .iter()
        .map(|message| {
            let orphaned = message.role == Role::Tool
                && message.tool_result_ids().any(|id| !live_calls.contains(id));
            if orphaned {
                tracing::debug!("Dropping pinned tool message with orphaned result");
            } else {
                live_calls.extend(message.tool_call_ids());
            }
            !orphaned
        })
        .collect();

    pinned_end
        .into_iter()
        .zip(keep)
        .filter_map(|(message, kept)| kept.then_some(message))
        .collect()
}

/// Repeatedly drop messages holding a result with no earlier call, or a call
/// never answered later, until none remain outside the protected prefix.
fn drop_dangling_exchanges(messages: Vec<Message>, protected_prefix: usize) -> Vec<Message> {
    let mut keep = vec![true; messages.len()];

    // Dropping one side of an exchange can orphan a sibling part in the same
    // message, so iterate to a fixed point.
    loop {
        let mut changed = false;
        for idx in dangling_positions(&messages, &keep) {
            if idx >= protected_prefix && keep[idx] {
                tracing::debug!(position = idx, role = ?messages[idx].role, "Dropping dangling exchange message");
                keep[idx] = false;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    messages
        .into_iter()
        .zip(keep)
        .filter_map(|(message, kept)| kept.then_some(message))
        .collect()
}

fn dangling_positions(messages: &[Message], keep: &[bool]) -> Vec<usize> {
    let mut seen_calls: HashSet<&str> = HashSet::new();
    let mut pending: HashMap<&str, usize> = HashMap::new();
    let mut dangling = Vec::new();

    for (idx, message) in messages.iter().enumerate().filter(|(idx, _)| keep[*idx]) {
        for id in message.tool_call_ids() {
            seen_calls.insert(id);
            pending.insert(id, idx);
        }
        for id in message.tool_result_ids() {
            if seen_calls.contains(id) {
                pending.remove(id);
            } else {
                dangling.push(idx);
            }
        }
    }

    dangling.extend(pending.into_values());
    dangling
}
