#![no_main]

use libfuzzer_sys::fuzz_target;
use specstream_rs::{snapshot, DiscoveredNode, TestNode};

fuzz_target!(|data: &[u8]| {
    // A discovered node deserializes from arbitrary JSON with defaulted
    // fields; the snapshot walk must never panic on the result
    let Ok(node) = serde_json::from_slice::<DiscoveredNode>(data) else {
        return;
    };

    let snap = snapshot(&node);

    fn count(node: &DiscoveredNode) -> usize {
        1 + node.children.iter().map(count).sum::<usize>()
    }

    // Snapshot preserves the node count and serializes cleanly
    assert_eq!(snap.node_count(), count(&node));
    let line = serde_json::to_string(&snap).unwrap();
    let _round: serde_json::Value = serde_json::from_str(&line).unwrap();

    // Leaves are specs, everything else is a suite
    match (&snap, node.children.is_empty()) {
        (TestNode::Spec { .. }, true) | (TestNode::Suite { .. }, false) => {}
        _ => panic!("Structural classification violated"),
    }
});
