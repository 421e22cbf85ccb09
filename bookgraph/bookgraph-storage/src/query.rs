//! Query construction for graph traversals.
//!
//! Every value that comes from a caller is bound as a parameter; only table
//! and field names from [`crate::schema`] are spliced into query text.

use crate::schema;
use bookgraph_core::types::RelationKind;
use serde_json::{Map, Value};

/// A parameterised SurrealQL request.
///
/// Multi-statement requests are allowed; the store returns the rows of the
/// last statement.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphQuery {
    text: String,
    params: Map<String, Value>,
}

impl GraphQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            params: Map::new(),
        }
    }

    /// Bind a `$name` parameter
    pub fn bind(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// Append the statements and parameters of `next`. Rows still come from
    /// the last statement, so `next` decides what the request returns.
    pub fn then(mut self, next: GraphQuery) -> Self {
        self.text = format!("{};\n{}", self.text.trim_end().trim_end_matches(';'), next.text);
        self.params.extend(next.params);
        self
    }
}

/// Query builder for constructing SurrealQL SELECT statements.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    query: String,
    has_where: bool,
}

impl QueryBuilder {
    /// Create a new query builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a SELECT statement
    pub fn select(mut self, fields: &str, from: &str) -> Self {
        self.query = format!("SELECT {} FROM {}", fields, from);
        self
    }

    /// Add a WHERE condition. Repeated calls are joined with AND.
    pub fn where_clause(mut self, condition: &str) -> Self {
        let keyword = if self.has_where { "AND" } else { "WHERE" };
        self.query.push_str(&format!(" {} {}", keyword, condition));
        self.has_where = true;
        self
    }

    /// Build the query string
    pub fn build(self) -> String {
        self.query
    }
}

/// Which end of the edge the anchor user sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// anchor → far node
    Outgoing,
    /// far node → anchor
    Incoming,
}

impl Direction {
    fn anchor_side(self) -> &'static str {
        match self {
            Self::Outgoing => "in",
            Self::Incoming => "out",
        }
    }

    fn far_side(self) -> &'static str {
        match self {
            Self::Outgoing => "out",
            Self::Incoming => "in",
        }
    }
}

/// Builds the single-hop pattern "user --[kind {filters}]--> node".
///
/// The anchor user is matched on its id property, the edge is matched on
/// its relation table, and property filters become WHERE conditions on the
/// edge so the store only returns matching edges. One row per edge.
#[derive(Debug, Clone)]
pub struct EdgeTraversal {
    kind: RelationKind,
    direction: Direction,
    anchor_id: String,
    node_fields: &'static [&'static str],
    with_edge: bool,
    filters: Vec<(&'static str, Value)>,
}

impl EdgeTraversal {
    /// Edges leaving the user with the given id
    pub fn outgoing(kind: RelationKind, user_id: impl Into<String>) -> Self {
        Self::new(kind, Direction::Outgoing, user_id.into())
    }

    /// Edges arriving at the user with the given id
    pub fn incoming(kind: RelationKind, user_id: impl Into<String>) -> Self {
        Self::new(kind, Direction::Incoming, user_id.into())
    }

    fn new(kind: RelationKind, direction: Direction, anchor_id: String) -> Self {
        Self {
            kind,
            direction,
            anchor_id,
            node_fields: schema::USER_FIELDS,
            with_edge: false,
            filters: Vec::new(),
        }
    }

    /// Properties to read from the node at the far end of the edge
    pub fn nodes(mut self, fields: &'static [&'static str]) -> Self {
        self.node_fields = fields;
        self
    }

    /// Return `{ node, edge }` pair rows instead of bare node rows
    pub fn with_edge(mut self) -> Self {
        self.with_edge = true;
        self
    }

    /// Only match edges whose `field` equals `value`
    pub fn filter(mut self, field: &'static str, value: impl Into<Value>) -> Self {
        self.filters.push((field, value.into()));
        self
    }

    pub fn build(self) -> GraphQuery {
        let far = self.direction.far_side();
        let projection = if self.with_edge {
            pair_projection(self.kind, self.direction, self.node_fields)
        } else {
            self.node_fields
                .iter()
                .map(|field| format!("{}.{} AS {}", far, field, field))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let mut builder = QueryBuilder::new()
            .select(&projection, self.kind.as_str())
            .where_clause(&format!(
                "{}.{} = $anchor",
                self.direction.anchor_side(),
                schema::USER_KEY
            ));

        let mut query_params = Vec::with_capacity(self.filters.len());
        for (index, (field, value)) in self.filters.into_iter().enumerate() {
            let param = format!("filter_{}", index);
            builder = builder.where_clause(&format!("{} = ${}", field, param));
            query_params.push((param, value));
        }

        let mut query = GraphQuery::new(builder.build()).bind("anchor", self.anchor_id);
        for (param, value) in query_params {
            query = query.bind(&param, value);
        }
        query
    }
}

/// `{ ..far node.. } AS node, { ..edge.. } AS edge` for edges of `kind`
pub fn pair_projection(
    kind: RelationKind,
    direction: Direction,
    node_fields: &[&str],
) -> String {
    format!(
        "{} AS node, {} AS edge",
        object_projection(Some(direction.far_side()), node_fields),
        object_projection(None, schema::edge_fields(kind)),
    )
}

/// `{ a: prefix.a, b: prefix.b }`, or `{ a: a, b: b }` without a prefix
fn object_projection(prefix: Option<&str>, fields: &[&str]) -> String {
    let entries = fields
        .iter()
        .map(|field| match prefix {
            Some(prefix) => format!("{}: {}.{}", field, prefix, field),
            None => format!("{}: {}", field, field),
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{ {} }}", entries)
}

/// Comma-separated field list for SELECT and RETURN clauses
pub fn field_list(fields: &[&str]) -> String {
    fields.join(", ")
}
