//! Opaque string identifiers shared across every AgentMesh component.

/// Identity of an agent process participating in the mesh.
pub type AgentId = String;

/// Identity of a directed edge, always `"<source>-><target>"`.
pub type EdgeId = String;

/// Identity of a proposal tracked by the consensus service.
pub type ProposalId = String;

/// Identity of an insight tracked by the knowledge aggregator.
pub type InsightId = String;

/// Error returned when an `EdgeId` does not decode as `"<source>-><target>"`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed edge id: {0:?}")]
pub struct MalformedEdgeId(pub String);

/// Deterministically derives the id for the edge `source -> target`.
///
/// This is the one place the `"->"` separator is defined; every producer
/// and consumer can compute an `EdgeId` from endpoints without a lookup.
pub fn edge_id(source: &str, target: &str) -> EdgeId {
    format!("{source}->{target}")
}

/// Splits an `EdgeId` back into its `(source, target)` endpoints.
///
/// Returns `Err` if the id does not contain exactly one `"->"` separator.
pub fn split_edge_id(id: &str) -> Result<(&str, &str), MalformedEdgeId> {
    match id.split_once("->") {
        Some((source, target)) if !source.is_empty() && !target.is_empty() => Ok((source, target)),
        _ => Err(MalformedEdgeId(id.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_edge_id_from_endpoints() {
        assert_eq!(edge_id("a", "b"), "a->b");
    }

    #[test]
    fn splits_edge_id_back_into_endpoints() {
        assert_eq!(split_edge_id("a->b").unwrap(), ("a", "b"));
    }

    #[test]
    fn rejects_edge_id_without_separator() {
        assert!(split_edge_id("a-b").is_err());
    }

    #[test]
    fn rejects_edge_id_with_empty_endpoint() {
        assert!(split_edge_id("->b").is_err());
        assert!(split_edge_id("a->").is_err());
    }
}
