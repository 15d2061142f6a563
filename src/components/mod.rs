/// Canvas view of the thought graph.
pub mod thought_graph;
