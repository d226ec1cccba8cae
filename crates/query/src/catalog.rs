//! Schema catalog.
//!
//! Consumes externally-loaded schema descriptions (tables, fields, keys,
//! indexes, named queries) and resolves them against the type registry into
//! an immutable catalog: short names from the fixed dictionary, a
//! `TypeOps` handle per field, byte offsets for the fixed-width prefix of
//! each row payload, and cross-referenced query descriptors. The catalog
//! never changes after `prepare`.

use std::collections::HashMap;
use std::sync::OnceLock;

use chainview_types::{ByteReader, Name};
use serde::Deserialize;
use snafu::{OptionExt, ResultExt, ensure};

use crate::error::{
    FieldPositionUnknownSnafu, InvalidNameSnafu, KeyPositionOutOfRangeSnafu, Result,
    UnknownFieldSnafu, UnknownQuerySnafu, UnknownTableSnafu, UnknownTypeSnafu,
};
use crate::registry::{self, TypeOps};

/// Fixed mapping from schema table names to on-disk short names.
///
/// `contract_index128` and `contract_index256` intentionally share the
/// `c.index128` short name: both secondary-key tables live in one on-disk
/// namespace.
const TABLE_NAMES: &[(&str, &str)] = &[
    ("block_info", "block.info"),
    ("transaction_trace", "ttrace"),
    ("action_trace", "atrace"),
    ("account", "account"),
    ("account_metadata", "account.meta"),
    ("code", "code"),
    ("contract_table", "c.table"),
    ("contract_row", "c.row"),
    ("contract_index64", "c.index64"),
    ("contract_index128", "c.index128"),
    ("contract_index256", "c.index128"),
    ("contract_index_double", "c.index.d"),
    ("contract_index_long_double", "c.index.ld"),
    ("global_property", "glob.prop"),
    ("generated_transaction", "gen.tx"),
    ("protocol_state", "protocol.st"),
    ("permission", "permission"),
    ("permission_link", "perm.link"),
    ("resource_limits", "res.lim"),
    ("resource_usage", "res.usage"),
    ("resource_limits_state", "res.lim.stat"),
    ("resource_limits_config", "res.lim.conf"),
];

/// Resolves a schema table name to its on-disk short name.
pub fn table_short_name(name: &str) -> Option<Name> {
    static NAMES: OnceLock<HashMap<&'static str, Name>> = OnceLock::new();
    let map = NAMES.get_or_init(|| {
        TABLE_NAMES
            .iter()
            .map(|(long, short)| (*long, short.parse().expect("short-name literal")))
            .collect()
    });
    map.get(name).copied()
}

// ---------------------------------------------------------------------------
// Externally-loaded schema description (deserialized from JSON)
// ---------------------------------------------------------------------------

/// Top-level schema description.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaDef {
    /// Declared tables.
    pub tables: Vec<TableDef>,
    /// Declared queries.
    #[serde(default)]
    pub queries: Vec<QueryDef>,
}

impl SchemaDef {
    /// Parses a schema description from JSON text.
    pub fn from_json(text: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// One table declaration.
#[derive(Debug, Clone, Deserialize)]
pub struct TableDef {
    /// Schema table name; must appear in the short-name dictionary.
    pub name: String,
    /// Ordered row fields.
    pub fields: Vec<FieldDef>,
    /// Field names forming the primary key.
    #[serde(default)]
    pub primary_key: Vec<String>,
    /// Field names forming the history key.
    #[serde(default)]
    pub history_keys: Vec<String>,
    /// Named secondary indexes.
    #[serde(default)]
    pub indexes: Vec<IndexDef>,
}

/// One field declaration.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldDef {
    /// Field name.
    pub name: String,
    /// Schema type name; must appear in the type registry.
    #[serde(rename = "type")]
    pub type_name: String,
}

/// One secondary-index declaration.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexDef {
    /// Index name, packed into index keys.
    pub name: String,
    /// Field names forming the index key.
    pub keys: Vec<String>,
}

/// One named-query declaration.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryDef {
    /// Query name; clients address the query by this name, and index
    /// entries for it are keyed under it.
    pub name: String,
    /// Table the query scans.
    pub table: String,
    /// Scalar filter argument types. Declaring any makes the query
    /// unimplemented at execution time.
    #[serde(default)]
    pub arg_types: Vec<String>,
    /// Types of the index range bounds, in index-field order.
    pub range_types: Vec<String>,
    /// Server-side cap on returned groups.
    pub max_results: u32,
    /// Whether the query accepts an as-of block ceiling.
    #[serde(default)]
    pub limit_block_num: bool,
    /// Whether the table is versioned per block.
    #[serde(default)]
    pub is_state: bool,
    /// Join linkage, if the query lifts fields from a second table.
    #[serde(default)]
    pub join: Option<JoinDef>,
}

/// Join linkage of a query declaration.
#[derive(Debug, Clone, Deserialize)]
pub struct JoinDef {
    /// Joined table.
    pub table: String,
    /// Query whose index locates join rows.
    pub query: String,
    /// Fields of the outer query's table forming the join key.
    pub key_values: Vec<String>,
    /// Fields lifted from the join row into each result row.
    pub fields_from_join: Vec<String>,
}

// ---------------------------------------------------------------------------
// Prepared catalog
// ---------------------------------------------------------------------------

/// A resolved row field.
#[derive(Debug)]
pub struct Field {
    /// Field name.
    pub name: String,
    /// Schema type name.
    pub type_name: String,
    /// Resolved type capabilities.
    pub ops: &'static TypeOps,
    /// Byte offset inside the row payload; `None` past the first
    /// variable-width field.
    pub byte_position: Option<u32>,
}

/// A named reference to one field of a table.
#[derive(Debug)]
pub struct KeyRef {
    /// Field name as declared.
    pub name: String,
    /// Index into the owning table's field list.
    pub field: usize,
}

/// A resolved table.
#[derive(Debug)]
pub struct Table {
    /// Schema table name.
    pub name: String,
    /// On-disk short name.
    pub short_name: Name,
    /// Row fields in payload order.
    pub fields: Vec<Field>,
    /// Primary-key fields.
    pub primary_key: Vec<KeyRef>,
    /// History-key fields.
    pub history_keys: Vec<KeyRef>,
    /// Secondary indexes: packed index name and key fields.
    pub indexes: Vec<(Name, Vec<KeyRef>)>,
}

impl Table {
    /// Extracts `keys` fields from a row payload and appends them to
    /// `dest`, in key form when `as_key` is set and canonical form
    /// otherwise.
    ///
    /// Every participating field must carry a known byte position, and that
    /// position must fall inside the payload.
    pub fn append_fields(
        &self,
        dest: &mut Vec<u8>,
        payload: &[u8],
        keys: &[KeyRef],
        as_key: bool,
    ) -> Result<()> {
        for key in keys {
            let field = &self.fields[key.field];
            let position = field
                .byte_position
                .context(FieldPositionUnknownSnafu { field: field.name.clone() })?;
            ensure!(
                (position as usize) <= payload.len(),
                KeyPositionOutOfRangeSnafu { position, len: payload.len() }
            );
            let mut src = ByteReader::new(&payload[position as usize..]);
            let encode = if as_key { field.ops.encode_key } else { field.ops.encode_value };
            encode(dest, &mut src)?;
        }
        Ok(())
    }
}

/// A resolved named query.
#[derive(Debug)]
pub struct Query {
    /// Packed query name.
    pub name: Name,
    /// Index of the scanned table in the catalog.
    pub table: usize,
    /// Scalar filter argument types.
    pub arg_types: Vec<&'static TypeOps>,
    /// Range bound types, in index-field order.
    pub range_types: Vec<&'static TypeOps>,
    /// Server-side result cap.
    pub max_results: u32,
    /// Whether the query accepts an as-of block ceiling.
    pub limit_block_num: bool,
    /// Whether the scanned table is versioned per block.
    pub is_state: bool,
    /// Join linkage, if any.
    pub join: Option<Join>,
}

/// Resolved join linkage.
#[derive(Debug)]
pub struct Join {
    /// Index of the joined table in the catalog.
    pub table: usize,
    /// Name of the query whose index locates join rows.
    pub query: Name,
    /// Join-key fields on the outer query's table.
    pub key_values: Vec<KeyRef>,
    /// Fields lifted from the join row.
    pub fields_from_join: Vec<KeyRef>,
}

/// The immutable prepared catalog.
#[derive(Debug)]
pub struct Catalog {
    tables: Vec<Table>,
    by_name: HashMap<String, usize>,
    queries: HashMap<Name, Query>,
}

impl Catalog {
    /// Resolves a schema description into a prepared catalog.
    pub fn prepare(schema: &SchemaDef) -> Result<Self> {
        let mut tables = Vec::with_capacity(schema.tables.len());
        let mut by_name = HashMap::new();

        for def in &schema.tables {
            let short_name =
                table_short_name(&def.name).context(UnknownTableSnafu { name: def.name.clone() })?;

            let mut fields = Vec::with_capacity(def.fields.len());
            let mut position = Some(0u32);
            for field in &def.fields {
                let ops = registry::lookup(&field.type_name)
                    .context(UnknownTypeSnafu { name: field.type_name.clone() })?;
                fields.push(Field {
                    name: field.name.clone(),
                    type_name: field.type_name.clone(),
                    ops,
                    byte_position: position,
                });
                // The first variable-width field still has a known start;
                // everything after it does not.
                position = match (position, ops.fixed_size) {
                    (Some(_), 0) => None,
                    (Some(pos), size) => Some(pos + size),
                    (None, _) => None,
                };
            }

            let resolve_keys = |names: &[String]| -> Result<Vec<KeyRef>> {
                names
                    .iter()
                    .map(|name| {
                        let field = fields
                            .iter()
                            .position(|f| &f.name == name)
                            .context(UnknownFieldSnafu {
                                table: def.name.clone(),
                                field: name.clone(),
                            })?;
                        Ok(KeyRef { name: name.clone(), field })
                    })
                    .collect()
            };

            let primary_key = resolve_keys(&def.primary_key)?;
            let history_keys = resolve_keys(&def.history_keys)?;
            let mut indexes = Vec::with_capacity(def.indexes.len());
            for index in &def.indexes {
                let name: Name =
                    index.name.parse().context(InvalidNameSnafu { input: index.name.clone() })?;
                indexes.push((name, resolve_keys(&index.keys)?));
            }

            by_name.insert(def.name.clone(), tables.len());
            tables.push(Table {
                name: def.name.clone(),
                short_name,
                fields,
                primary_key,
                history_keys,
                indexes,
            });
        }

        let mut queries = HashMap::new();
        for def in &schema.queries {
            let name: Name =
                def.name.parse().context(InvalidNameSnafu { input: def.name.clone() })?;
            let table = *by_name
                .get(&def.table)
                .context(UnknownTableSnafu { name: def.table.clone() })?;

            let resolve_types = |names: &[String]| -> Result<Vec<&'static TypeOps>> {
                names
                    .iter()
                    .map(|n| registry::lookup(n).context(UnknownTypeSnafu { name: n.clone() }))
                    .collect()
            };

            let join = def
                .join
                .as_ref()
                .map(|join| -> Result<Join> {
                    let join_table = *by_name
                        .get(&join.table)
                        .context(UnknownTableSnafu { name: join.table.clone() })?;
                    let query: Name = join
                        .query
                        .parse()
                        .context(InvalidNameSnafu { input: join.query.clone() })?;
                    Ok(Join {
                        table: join_table,
                        query,
                        key_values: resolve_keys_on(&tables[table], &join.key_values)?,
                        fields_from_join: resolve_keys_on(
                            &tables[join_table],
                            &join.fields_from_join,
                        )?,
                    })
                })
                .transpose()?;

            queries.insert(
                name,
                Query {
                    name,
                    table,
                    arg_types: resolve_types(&def.arg_types)?,
                    range_types: resolve_types(&def.range_types)?,
                    max_results: def.max_results,
                    limit_block_num: def.limit_block_num,
                    is_state: def.is_state,
                    join,
                },
            );
        }

        // Join queries must themselves be declared.
        for query in queries.values() {
            if let Some(join) = &query.join {
                ensure!(
                    queries.contains_key(&join.query),
                    UnknownQuerySnafu { name: join.query.to_string() }
                );
            }
        }

        Ok(Self { tables, by_name, queries })
    }

    /// Returns a table by catalog index.
    pub fn table(&self, index: usize) -> &Table {
        &self.tables[index]
    }

    /// Looks up a table by schema name.
    pub fn table_by_name(&self, name: &str) -> Option<&Table> {
        self.by_name.get(name).map(|&i| &self.tables[i])
    }

    /// Looks up a query by packed name.
    pub fn query(&self, name: Name) -> Option<&Query> {
        self.queries.get(&name)
    }
}

fn resolve_keys_on(table: &Table, names: &[String]) -> Result<Vec<KeyRef>> {
    names
        .iter()
        .map(|name| {
            let field = table
                .fields
                .iter()
                .position(|f| &f.name == name)
                .context(UnknownFieldSnafu { table: table.name.clone(), field: name.clone() })?;
            Ok(KeyRef { name: name.clone(), field })
        })
        .collect()
}
