//! Canned-response query gateway.
//!
//! Stands in for the ODBC layer: responses are keyed by the exact query
//! text, so runs stay deterministic and offline. A query with no canned
//! response is an execution failure, which the interpreter treats as
//! fatal, the same way a live database error would be.

use report_script_core::{ConnectionInfo, QueryError, QueryGateway, RowSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A [`QueryGateway`] backed by a fixed query-to-rows table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticQueryGateway {
    /// Canned responses, keyed by literal query text.
    #[serde(default)]
    pub responses: BTreeMap<String, RowSet>,
    /// When set, every connection attempt is refused.
    #[serde(default)]
    pub refuse_connections: bool,
}

impl StaticQueryGateway {
    /// An empty gateway; every query fails to execute.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a canned response for the exact query text.
    #[must_use]
    pub fn with_response(mut self, query: &str, rows: RowSet) -> Self {
        self.responses.insert(query.to_owned(), rows);
        self
    }

    /// A gateway that refuses every connection.
    pub fn refusing_connections() -> Self {
        Self {
            refuse_connections: true,
            ..Self::default()
        }
    }
}

impl QueryGateway for StaticQueryGateway {
    fn run_query(&self, connection: &ConnectionInfo, query: &str) -> Result<RowSet, QueryError> {
        if self.refuse_connections {
            return Err(QueryError::Connect {
                server: connection.server_name.clone(),
                message: "connection refused".to_owned(),
            });
        }
        self.responses
            .get(query)
            .cloned()
            .ok_or_else(|| QueryError::Execute {
                message: format!("no response defined for query {query:?}"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canned_response_round_trips() {
        let rows = RowSet {
            columns: vec!["id".into()],
            rows: vec![vec!["1".into()]],
        };
        let gateway = StaticQueryGateway::new().with_response("SELECT * FROM t", rows.clone());
        assert_eq!(
            gateway
                .run_query(&ConnectionInfo::default(), "SELECT * FROM t")
                .unwrap(),
            rows
        );
    }

    #[test]
    fn unknown_query_is_an_execute_error() {
        let err = StaticQueryGateway::new()
            .run_query(&ConnectionInfo::default(), "SELECT 1")
            .unwrap_err();
        assert!(matches!(err, QueryError::Execute { .. }));
    }

    #[test]
    fn refusing_gateway_names_the_server() {
        let conn = ConnectionInfo {
            server_name: "srv".into(),
            ..ConnectionInfo::default()
        };
        let err = StaticQueryGateway::refusing_connections()
            .run_query(&conn, "SELECT 1")
            .unwrap_err();
        assert!(matches!(err, QueryError::Connect { server, .. } if server == "srv"));
    }
}
