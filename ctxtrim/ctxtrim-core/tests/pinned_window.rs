use std::collections::HashSet;

use ctxtrim::completion::{Message, Part, Role};
use ctxtrim::compression::{
    CompressionConfig, ContextCompressor, PinnedWindowCompressor, estimate_messages_tokens,
};
use proptest::prelude::*;
use serde_json::json;
use tracing_subscriber::EnvFilter;

const FILLER: &str =
    "the quick brown fox jumps over the lazy dog again and again and again until it tires";

fn call(id: &str) -> Message {
    Message::with_parts(
        Role::Assistant,
        vec![Part::tool_call(id, "lookup", r#"{"q":"rust"}"#).unwrap()],
    )
}

fn result(id: &str) -> Message {
    Message::with_parts(
        Role::Tool,
        vec![Part::tool_result(id, "lookup", json!({ "hits": 3 })).unwrap()],
    )
}

/// Twenty messages: four pinned, eight fillers around an exchange at 10..=12, five pinned.
fn twenty_message_transcript() -> Vec<Message> {
    let mut messages: Vec<Message> = (0..4).map(|i| Message::user(format!("pinned {i}"))).collect();
    messages.extend((4..10).map(|_| Message::assistant(FILLER)));
    messages.push(call("call_1"));
    messages.push(Message::user("while waiting"));
    messages.push(result("call_1"));
    messages.extend((13..15).map(|_| Message::assistant(FILLER)));
    messages.extend((15..20).map(|i| Message::user(format!("recent {i}"))));
    messages
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn compressor(max_input_tokens: usize) -> PinnedWindowCompressor {
    PinnedWindowCompressor::from_config(CompressionConfig {
        max_input_tokens,
        pinned_start_count: 4,
        pinned_end_count: 5,
        ..Default::default()
    })
}

#[test]
fn test_keeps_pins_and_exchange_when_budget_unreachable() {
    init_tracing();
    let messages = twenty_message_transcript();
    assert_eq!(estimate_messages_tokens(&messages), 222);

    let report = compressor(50).compress_with_report(&messages);

    let mut expected = messages[..4].to_vec();
    expected.extend_from_slice(&messages[10..13]);
    expected.extend_from_slice(&messages[15..]);
    assert_eq!(report.messages, expected);
    assert_eq!(report.messages_removed, 8);
    assert_eq!(report.orphans_removed, 0);
    assert!(report.over_budget);
    assert_eq!(report.tokens_after, 86);
}

#[test]
fn test_stops_once_within_budget() {
    init_tracing();
    let messages = twenty_message_transcript();
    let report = compressor(200).compress_with_report(&messages);

    assert_eq!(report.messages.len(), 18);
    assert_eq!(report.tokens_after, 188);
    assert!(!report.over_budget);
    // Oldest fillers go first
    assert_eq!(report.messages[..4], messages[..4]);
    assert_eq!(report.messages[4..], messages[6..]);
}

#[test]
fn test_never_deletes_inside_exchange() {
    let mut messages = vec![Message::system("sys")];
    messages.push(Message::assistant(FILLER));
    messages.push(call("x"));
    messages.push(Message::user("one"));
    messages.push(Message::assistant(FILLER));
    messages.push(result("x"));
    messages.push(Message::assistant(FILLER));
    messages.push(Message::user("last"));

    let out = PinnedWindowCompressor::new()
        .with_pinned_start(1)
        .with_pinned_end(1)
        .compress(messages.clone(), 1)
        .unwrap();

    assert_eq!(out[0], messages[0]);
    assert_eq!(out[1..5], messages[2..6]);
    assert_eq!(out[5], messages[7]);
}

#[test]
fn test_trailing_exchange_kept_when_pinned() {
    let messages = vec![
        Message::user("word word"),
        call("call_1"),
        Message::user("meanwhile"),
        result("call_1"),
        Message::user(vec!["word"; 9].join(" ")),
    ];
    let out = PinnedWindowCompressor::new()
        .with_pinned_start(0)
        .with_pinned_end(4)
        .compress(messages.clone(), 0)
        .unwrap();
    assert_eq!(out, messages[1..]);
}

#[test]
fn test_within_budget_returns_input() {
    let messages = twenty_message_transcript();
    let out = compressor(10_000).compress(messages.clone(), 10_000).unwrap();
    assert_eq!(out, messages);
}

#[test]
fn test_trait_budget_overrides_config() {
    let messages = twenty_message_transcript();
    let compressor = compressor(10_000);
    assert!(compressor.needs_compression(&messages, 50));
    assert_eq!(compressor.compress(messages, 50).unwrap().len(), 12);
}

#[test]
fn test_compressor_from_json_config() -> anyhow::Result<()> {
    let config = CompressionConfig::from_json(
        r#"{"maxInputTokens": 50, "pinnedStartCount": 4, "pinnedEndCount": 5}"#,
    )?;
    let report =
        PinnedWindowCompressor::from_config(config).compress_with_report(&twenty_message_transcript());
    assert_eq!(report.messages.len(), 12);
    Ok(())
}

#[derive(Debug, Clone)]
enum Turn {
    User(usize),
    Assistant(usize),
    Exchange { interleaved: bool },
}

fn turn() -> impl Strategy<Value = Turn> {
    prop_oneof![
        (1..12usize).prop_map(Turn::User),
        (1..12usize).prop_map(Turn::Assistant),
        any::<bool>().prop_map(|interleaved| Turn::Exchange { interleaved }),
    ]
}

fn build(turns: &[Turn]) -> Vec<Message> {
    let mut messages = Vec::new();
    for (n, turn) in turns.iter().enumerate() {
        match turn {
            Turn::User(words) => messages.push(Message::user(vec!["word"; *words].join(" "))),
            Turn::Assistant(words) => {
                messages.push(Message::assistant(vec!["reply,"; *words].join(" ")))
            }
            Turn::Exchange { interleaved } => {
                let id = format!("call_{n}");
                messages.push(call(&id));
                if *interleaved {
                    messages.push(Message::user("meanwhile"));
                }
                messages.push(result(&id));
            }
        }
    }
    messages
}

fn is_subsequence(needle: &[Message], haystack: &[Message]) -> bool {
    let mut rest = haystack.iter();
    needle.iter().all(|m| rest.any(|h| h == m))
}

proptest! {
    #[test]
    fn compression_preserves_invariants(
        turns in prop::collection::vec(turn(), 0..24),
        budget in 0..400usize,
        pinned_start in 0..6usize,
        pinned_end in 0..6usize,
    ) {
        let messages = build(&turns);
        let compressor = PinnedWindowCompressor::new()
            .with_pinned_start(pinned_start)
            .with_pinned_end(pinned_end);
        let out = compressor.compress(messages.clone(), budget).unwrap();

        prop_assert!(out.len() <= messages.len());
        prop_assert!(estimate_messages_tokens(&out) <= estimate_messages_tokens(&messages));
        prop_assert!(is_subsequence(&out, &messages));

        let start = pinned_start.min(messages.len());
        let end = pinned_end.min(messages.len() - start);
        prop_assert_eq!(&out[..start], &messages[..start]);
        prop_assert_eq!(&out[out.len() - end..], &messages[messages.len() - end..]);

        let mut open: HashSet<&str> = HashSet::new();
        let mut answered: HashSet<&str> = HashSet::new();
        for message in &out {
            open.extend(message.tool_call_ids());
            for id in message.tool_result_ids() {
                prop_assert!(open.contains(id), "result {} has no earlier call", id);
                answered.insert(id);
            }
        }
        prop_assert_eq!(open, answered);
    }

    #[test]
    fn under_budget_is_identity(turns in prop::collection::vec(turn(), 0..12)) {
        let messages = build(&turns);
        let budget = estimate_messages_tokens(&messages);
        let out = PinnedWindowCompressor::new().compress(messages.clone(), budget).unwrap();
        prop_assert_eq!(out, messages);
    }
}
