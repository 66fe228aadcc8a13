//! Pre-execution snapshot of the discovered suite tree
//!
//! Converts the engine's heterogeneous node shape (one record for suites and
//! specs alike) into a tagged tree suitable for serialization. The snapshot
//! is computed once, before any spec runs, and is purely a read of the input.

use crate::engine::DiscoveredNode;
use serde::Serialize;

/// A snapshot node, tagged by its structural role
///
/// Serializes as `{"type":"suite",...,"children":[...]}` or
/// `{"type":"spec",...}` with no `children` key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TestNode {
    Suite {
        id: String,
        #[serde(rename = "fullName")]
        full_name: String,
        description: String,
        children: Vec<TestNode>,
    },
    Spec {
        id: String,
        #[serde(rename = "fullName")]
        full_name: String,
        description: String,
    },
}

impl TestNode {
    /// The node id, whichever the variant
    pub fn id(&self) -> &str {
        match self {
            TestNode::Suite { id, .. } | TestNode::Spec { id, .. } => id,
        }
    }

    /// Total number of nodes in this subtree, including self
    pub fn node_count(&self) -> usize {
        match self {
            TestNode::Spec { .. } => 1,
            TestNode::Suite { children, .. } => {
                1 + children.iter().map(TestNode::node_count).sum::<usize>()
            }
        }
    }
}

/// Map a discovered tree to its snapshot form
///
/// Classification is structural: a node with no children is a spec, anything
/// else is a suite. Child order is preserved exactly at every depth. The walk
/// never fails and does not modify the input.
pub fn snapshot(node: &DiscoveredNode) -> TestNode {
    if node.children.is_empty() {
        TestNode::Spec {
            id: node.id.clone(),
            full_name: node.full_name.clone(),
            description: node.description.clone(),
        }
    } else {
        TestNode::Suite {
            id: node.id.clone(),
            full_name: node.full_name.clone(),
            description: node.description.clone(),
            children: node.children.iter().map(snapshot).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(id: &str, description: &str) -> DiscoveredNode {
        DiscoveredNode {
            id: id.to_string(),
            description: description.to_string(),
            full_name: description.to_string(),
            children: Vec::new(),
        }
    }

    fn suite(id: &str, description: &str, children: Vec<DiscoveredNode>) -> DiscoveredNode {
        DiscoveredNode {
            id: id.to_string(),
            description: description.to_string(),
            full_name: description.to_string(),
            children,
        }
    }

    #[test]
    fn test_structural_classification() {
        let tree = suite(
            "suite1",
            "outer",
            vec![spec("spec0", "a"), suite("suite2", "empty", vec![])],
        );

        let snap = snapshot(&tree);
        let TestNode::Suite { children, .. } = &snap else {
            panic!("root should be a suite");
        };
        // A node with no children is a spec, even if it was declared a suite
        assert!(matches!(children[0], TestNode::Spec { .. }));
        assert!(matches!(children[1], TestNode::Spec { .. }));
    }

    #[test]
    fn test_node_count_matches_input() {
        let tree = suite(
            "suite1",
            "outer",
            vec![
                spec("spec0", "a"),
                suite(
                    "suite2",
                    "inner",
                    vec![spec("spec1", "b"), spec("spec2", "c")],
                ),
                spec("spec3", "d"),
            ],
        );

        assert_eq!(snapshot(&tree).node_count(), 6);
    }

    #[test]
    fn test_child_order_preserved() {
        let tree = suite(
            "suite1",
            "outer",
            vec![
                spec("spec2", "third"),
                spec("spec0", "first"),
                spec("spec1", "second"),
            ],
        );

        let snap = snapshot(&tree);
        let TestNode::Suite { children, .. } = &snap else {
            panic!("root should be a suite");
        };
        let ids: Vec<&str> = children.iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec!["spec2", "spec0", "spec1"]);
    }

    #[test]
    fn test_arbitrary_depth() {
        let mut tree = spec("spec0", "leaf");
        for depth in 0..200 {
            tree = suite(&format!("suite{}", depth), "nested", vec![tree]);
        }

        let snap = snapshot(&tree);
        assert_eq!(snap.node_count(), 201);
    }

    #[test]
    fn test_serialized_shape() {
        let tree = suite("suite1", "outer", vec![spec("spec0", "a")]);
        let value = serde_json::to_value(snapshot(&tree)).unwrap();

        assert_eq!(value["type"], "suite");
        assert_eq!(value["id"], "suite1");
        assert_eq!(value["fullName"], "outer");
        assert_eq!(value["description"], "outer");

        let child = &value["children"][0];
        assert_eq!(child["type"], "spec");
        // Specs carry no children key at all
        assert!(child.as_object().unwrap().get("children").is_none());
    }
}
