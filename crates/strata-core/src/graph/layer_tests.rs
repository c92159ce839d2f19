//! Tests for Layer module.

use super::layer::Layer;
use crate::distance::{Distance, DistanceMetric};
use crate::error::Error;

fn euclidean_layer(level: usize, max_edges: usize) -> Layer {
    Layer::new(level, max_edges, Distance::default())
}

fn neighbor_ids<'a>(layer: &'a Layer, id: &str) -> Vec<&'a str> {
    layer
        .get(id)
        .map(|node| node.neighbor_ids().collect())
        .unwrap_or_default()
}

/// a=[0.1,0.1], b=[0.2,0.2], c=[0.9,0.9] with two edges per node.
fn abc_layer(level: usize) -> Layer {
    let mut layer = euclidean_layer(level, 2);
    layer.add_node("a", vec![0.1, 0.1]);
    layer.add_node("b", vec![0.2, 0.2]);
    layer.add_node("c", vec![0.9, 0.9]);
    layer
}

#[test]
fn test_layer_new_empty() {
    let layer = euclidean_layer(0, 4);
    assert!(layer.is_empty());
    assert_eq!(layer.len(), 0);
    assert_eq!(layer.level(), 0);
    assert_eq!(layer.max_edges(), 4);
}

#[test]
fn test_first_node_has_no_neighbors() {
    let mut layer = euclidean_layer(0, 4);
    layer.add_node("a", vec![0.5]);

    assert!(layer.contains("a"));
    assert_eq!(layer.get("a").map(|n| n.degree()), Some(0));
}

#[test]
fn test_add_node_links_both_ways() {
    let layer = abc_layer(0);

    assert_eq!(neighbor_ids(&layer, "a"), vec!["b", "c"]);
    assert_eq!(neighbor_ids(&layer, "b"), vec!["a", "c"]);
    assert_eq!(neighbor_ids(&layer, "c"), vec!["b", "a"]);
}

#[test]
fn test_add_node_records_layer_level() {
    let layer = abc_layer(2);
    assert!(layer.nodes().all(|node| node.layer() == 2));
}

#[test]
fn test_connection_takes_exact_nearest() {
    let mut layer = euclidean_layer(0, 1);
    layer.add_node("x", vec![0.0]);
    layer.add_node("far", vec![1.0]);
    layer.add_node("near", vec![0.1]);

    assert_eq!(neighbor_ids(&layer, "near"), vec!["x"]);
    assert_eq!(neighbor_ids(&layer, "x"), vec!["near"]);
}

/// "left" and "right" are both exactly 0.25 away from [0.5, 0.5].
fn equidistant_pair(max_edges: usize) -> Layer {
    let mut layer = euclidean_layer(0, max_edges);
    layer.add_node("left", vec![0.25, 0.5]);
    layer.add_node("right", vec![0.75, 0.5]);
    layer
}

#[test]
fn test_connection_tie_keeps_layer_order() {
    // Arrange
    let mut capped = equidistant_pair(1);
    let mut roomy = equidistant_pair(2);

    // Act
    capped.add_node("mid", vec![0.5, 0.5]);
    roomy.add_node("mid", vec![0.5, 0.5]);

    // Assert
    assert_eq!(neighbor_ids(&capped, "mid"), vec!["left"]);
    assert_eq!(neighbor_ids(&roomy, "mid"), vec!["left", "right"]);
}

#[test]
fn test_search_does_not_move_on_a_tie() {
    let mut layer = equidistant_pair(2);
    layer.add_node("corner", vec![1.0, 1.0]);

    assert_eq!(layer.search(Some("left"), &[0.5, 0.5], 1).unwrap(), vec!["left"]);
    assert_eq!(layer.search(Some("right"), &[0.5, 0.5], 1).unwrap(), vec!["right"]);
    assert_eq!(layer.search(None, &[0.5, 0.5], 1).unwrap(), vec!["left"]);
}

#[test]
fn test_neighbor_cap_and_no_self_edges() {
    let mut layer = euclidean_layer(0, 3);
    for i in 0..30u8 {
        let v = f32::from(i) / 30.0;
        layer.add_node(&format!("n{i}"), vec![v, 1.0 - v]);
    }

    for node in layer.nodes() {
        assert!(node.degree() <= 3, "{} has {} edges", node.id(), node.degree());
        assert!(!node.has_neighbor(node.id()));
    }
}

#[test]
fn test_node_ids_keep_insertion_order() {
    let layer = abc_layer(0);
    assert_eq!(layer.node_ids().collect::<Vec<_>>(), vec!["a", "b", "c"]);
}

#[test]
fn test_add_node_with_existing_id_replaces_it() {
    let mut layer = abc_layer(0);
    layer.add_node("a", vec![0.95, 0.95]);

    assert_eq!(layer.len(), 3);
    assert_eq!(layer.get("a").map(|n| n.vector().to_vec()), Some(vec![0.95, 0.95]));
    assert_eq!(layer.node_ids().collect::<Vec<_>>(), vec!["b", "c", "a"]);
    assert_eq!(neighbor_ids(&layer, "a").first(), Some(&"c"));
}

#[test]
fn test_remove_unknown_is_noop() {
    let mut layer = abc_layer(0);

    assert!(!layer.remove_node("ghost"));
    assert_eq!(layer.len(), 3);
    assert_eq!(neighbor_ids(&layer, "a"), vec!["b", "c"]);
}

#[test]
fn test_remove_node_drops_all_references() {
    let mut layer = abc_layer(0);

    assert!(layer.remove_node("b"));

    assert_eq!(layer.len(), 2);
    assert!(!layer.contains("b"));
    for node in layer.nodes() {
        assert!(!node.has_neighbor("b"));
    }
    assert_eq!(neighbor_ids(&layer, "a"), vec!["c"]);
    assert_eq!(neighbor_ids(&layer, "c"), vec!["a"]);
}

#[test]
fn test_remove_node_scrubs_one_way_edges() {
    // With one edge per node, z links to y but y keeps x, so z -> y is one-way.
    let mut layer = euclidean_layer(0, 1);
    layer.add_node("x", vec![0.0]);
    layer.add_node("y", vec![0.1]);
    layer.add_node("z", vec![0.5]);
    assert_eq!(neighbor_ids(&layer, "z"), vec!["y"]);
    assert_eq!(neighbor_ids(&layer, "y"), vec!["x"]);

    layer.remove_node("y");

    assert_eq!(neighbor_ids(&layer, "x"), vec!["z"]);
    assert_eq!(neighbor_ids(&layer, "z"), vec!["x"]);
}

#[test]
fn test_remove_repairs_own_neighbors_first_then_referrers() {
    // Arrange: c's list is [e, a]; a sees d and e at exactly 0.5
    let mut layer = euclidean_layer(0, 2);
    for (id, v) in [("a", 0.5), ("b", 0.6), ("c", 0.1), ("d", 1.0), ("e", 0.0)] {
        layer.add_node(id, vec![v]);
    }
    assert_eq!(neighbor_ids(&layer, "c"), vec!["e", "a"]);

    // Act
    layer.remove_node("c");

    // Assert: e is repaired before a, so e claims a's second slot and a's
    // own re-ranking cannot displace it with the equally distant d
    assert_eq!(neighbor_ids(&layer, "a"), vec!["b", "e"]);
    assert_eq!(neighbor_ids(&layer, "b"), vec!["a", "d"]);
    assert_eq!(neighbor_ids(&layer, "d"), vec!["b", "a"]);
    assert_eq!(neighbor_ids(&layer, "e"), vec!["a", "b"]);
}

#[test]
fn test_remove_is_idempotent() {
    let mut layer = abc_layer(0);
    layer.remove_node("a");
    let after_once: Vec<(String, Vec<String>)> = layer
        .nodes()
        .map(|n| {
            (
                n.id().to_string(),
                n.neighbor_ids().map(str::to_string).collect(),
            )
        })
        .collect();

    layer.remove_node("a");
    let after_twice: Vec<(String, Vec<String>)> = layer
        .nodes()
        .map(|n| {
            (
                n.id().to_string(),
                n.neighbor_ids().map(str::to_string).collect(),
            )
        })
        .collect();

    assert_eq!(after_once, after_twice);
}

#[test]
fn test_clear_neighbors_detaches_node() {
    let mut layer = abc_layer(0);

    layer.clear_neighbors("a");

    assert!(layer.contains("a"));
    assert!(neighbor_ids(&layer, "a").is_empty());
    assert!(!layer.get("b").is_some_and(|n| n.has_neighbor("a")));
    assert!(!layer.get("c").is_some_and(|n| n.has_neighbor("a")));
}

#[test]
fn test_search_empty_layer_fails() {
    let layer = euclidean_layer(0, 2);
    let result = layer.search(None, &[0.1, 0.1], 1);
    assert!(matches!(result, Err(Error::EmptyStructure(_))));
}

#[test]
fn test_search_single_result() {
    let layer = abc_layer(0);

    let result = layer.search(None, &[0.85, 0.85], 1).unwrap();

    assert_eq!(result, vec!["c"]);
}

#[test]
fn test_search_from_given_start() {
    let layer = abc_layer(0);

    let result = layer.search(Some("c"), &[0.12, 0.12], 1).unwrap();

    assert_eq!(result, vec!["a"]);
}

#[test]
fn test_search_unknown_start_falls_back_to_first_node() {
    let layer = abc_layer(0);

    let result = layer.search(Some("ghost"), &[0.1, 0.1], 1).unwrap();

    assert_eq!(result, vec!["a"]);
}

#[test]
fn test_search_base_layer_returns_final_node_neighbors() {
    let layer = abc_layer(0);

    // Converges on "a"; the result is a's own neighbor list, not a itself.
    let result = layer.search(None, &[0.1, 0.1], 2).unwrap();
    assert_eq!(result, vec!["b", "c"]);

    let result = layer.search(None, &[0.1, 0.1], 1).unwrap();
    assert_eq!(result, vec!["a"]);
}

#[test]
fn test_search_base_layer_truncates_to_n_closest() {
    let mut layer = euclidean_layer(0, 4);
    for (id, v) in [("a", 0.1), ("b", 0.2), ("c", 0.3), ("d", 0.4), ("e", 0.5)] {
        layer.add_node(id, vec![v]);
    }

    let result = layer.search(None, &[0.5], 2).unwrap();

    assert_eq!(result.len(), 2);
    assert_eq!(result, vec!["d", "c"]);
}

#[test]
fn test_search_upper_layer_always_single() {
    let layer = abc_layer(1);

    let result = layer.search(None, &[0.1, 0.1], 3).unwrap();

    assert_eq!(result, vec!["a"]);
}

#[test]
fn test_search_stops_at_local_optimum() {
    // One edge per node: "best" links to mid but mid keeps far, so far -> mid
    // is a dead end.
    let mut layer = euclidean_layer(0, 1);
    layer.add_node("far", vec![1.0]);
    layer.add_node("mid", vec![0.7]);
    layer.add_node("best", vec![0.0]);

    let result = layer.search(Some("far"), &[0.0], 1).unwrap();

    assert_eq!(result, vec!["mid"]);
}

#[test]
fn test_cosine_layer_ranks_by_similarity() {
    let mut layer = Layer::new(0, 2, Distance::from(DistanceMetric::Cosine));
    layer.add_node("x", vec![1.0, 0.0]);
    layer.add_node("y", vec![0.0, 1.0]);
    layer.add_node("xy", vec![0.9, 0.1]);

    assert_eq!(neighbor_ids(&layer, "xy"), vec!["x", "y"]);

    let result = layer.search(Some("y"), &[1.0, 0.05], 1).unwrap();
    assert_eq!(result, vec!["x"]);
}
