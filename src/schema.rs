//! Table schema: clustering columns, static and regular columns, options.
//!
//! A [`Schema`] is immutable once built and is shared as [`SchemaRef`]. Every
//! partition operation borrows it for column definitions, the clustering
//! comparator and the gc grace period.

use std::{collections::HashSet, fmt, sync::Arc};

use crate::{
    cell::{CollectionKind, CollectionType},
    error::{PartitionError, SchemaError},
    key::ClusteringComparator,
    mvcc::GcTime,
    option::TableOption,
};

/// Column position within its kind, assigned in declaration order.
pub type ColumnId = u32;

/// Shared, immutable schema handle.
pub type SchemaRef = Arc<Schema>;

/// Which row a column lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    /// Shared by all rows of the partition.
    Static,
    /// Stored per clustering row.
    Regular,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Static => f.write_str("static"),
            ColumnKind::Regular => f.write_str("regular"),
        }
    }
}

/// Declared type of a column, as far as reconciliation is concerned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// One value per cell.
    Atomic,
    /// A multi-cell collection.
    Collection(CollectionType),
}

impl ColumnType {
    /// Collection column of the given kind.
    pub const fn collection(kind: CollectionKind) -> Self {
        ColumnType::Collection(CollectionType::new(kind))
    }
}

/// Definition of one static or regular column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnDefinition {
    id: ColumnId,
    name: String,
    kind: ColumnKind,
    ty: ColumnType,
}

impl ColumnDefinition {
    /// Column id within its kind.
    pub fn id(&self) -> ColumnId {
        self.id
    }

    /// Column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Static or regular.
    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    /// Declared type.
    pub fn column_type(&self) -> ColumnType {
        self.ty
    }

    /// Whether the column holds atomic cells.
    pub fn is_atomic(&self) -> bool {
        matches!(self.ty, ColumnType::Atomic)
    }

    /// Collection codec for a collection column.
    pub fn collection_type(&self) -> Option<&CollectionType> {
        match &self.ty {
            ColumnType::Atomic => None,
            ColumnType::Collection(ct) => Some(ct),
        }
    }
}

/// Sort direction of a clustering column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ClusteringOrder {
    /// Ascending value order.
    #[default]
    Asc,
    /// Descending value order.
    Desc,
}

/// Definition of one clustering column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusteringColumn {
    name: String,
    order: ClusteringOrder,
}

impl ClusteringColumn {
    /// Column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sort direction.
    pub fn order(&self) -> ClusteringOrder {
        self.order
    }
}

/// Immutable table descriptor.
#[derive(Debug)]
pub struct Schema {
    clustering: Vec<ClusteringColumn>,
    static_columns: Vec<ColumnDefinition>,
    regular_columns: Vec<ColumnDefinition>,
    comparator: ClusteringComparator,
    option: TableOption,
}

impl Schema {
    /// Start declaring a schema.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Number of clustering columns; a full clustering key has this many
    /// components.
    pub fn clustering_key_size(&self) -> usize {
        self.clustering.len()
    }

    /// Clustering column definitions in key order.
    pub fn clustering_columns(&self) -> &[ClusteringColumn] {
        &self.clustering
    }

    /// Comparator over clustering keys and prefixes.
    pub fn comparator(&self) -> &ClusteringComparator {
        &self.comparator
    }

    /// Table options.
    pub fn option(&self) -> &TableOption {
        &self.option
    }

    /// Tombstone grace period in seconds.
    pub fn gc_grace_seconds(&self) -> u32 {
        self.option.gc_grace_seconds
    }

    /// Purge horizon for work running at `query_time`.
    pub fn gc_before(&self, query_time: GcTime) -> GcTime {
        self.option.gc_before(query_time)
    }

    /// Static column definitions in id order.
    pub fn static_columns(&self) -> &[ColumnDefinition] {
        &self.static_columns
    }

    /// Regular column definitions in id order.
    pub fn regular_columns(&self) -> &[ColumnDefinition] {
        &self.regular_columns
    }

    /// Whether any static column is declared.
    pub fn has_static_columns(&self) -> bool {
        !self.static_columns.is_empty()
    }

    /// Look up a column by kind and id.
    pub fn column_at(&self, kind: ColumnKind, id: ColumnId) -> Result<&ColumnDefinition, PartitionError> {
        let columns = match kind {
            ColumnKind::Static => &self.static_columns,
            ColumnKind::Regular => &self.regular_columns,
        };
        columns
            .get(id as usize)
            .ok_or(PartitionError::NoSuchColumn { kind, id })
    }

    /// Look up a static column by id.
    pub fn static_column_at(&self, id: ColumnId) -> Result<&ColumnDefinition, PartitionError> {
        self.column_at(ColumnKind::Static, id)
    }

    /// Look up a regular column by id.
    pub fn regular_column_at(&self, id: ColumnId) -> Result<&ColumnDefinition, PartitionError> {
        self.column_at(ColumnKind::Regular, id)
    }

    /// Definition of a column that stored data refers to. Rows only ever
    /// hold cells for declared columns, so a miss is a broken contract.
    pub(crate) fn column(&self, kind: ColumnKind, id: ColumnId) -> &ColumnDefinition {
        match self.column_at(kind, id) {
            Ok(def) => def,
            Err(err) => panic!("row holds a cell the schema does not declare: {err}"),
        }
    }

    /// Find a static or regular column by name.
    pub fn column_by_name(&self, name: &str) -> Option<&ColumnDefinition> {
        self.static_columns
            .iter()
            .chain(&self.regular_columns)
            .find(|def| def.name == name)
    }
}

/// Builder for [`Schema`].
///
/// Column ids are assigned per kind in declaration order.
#[derive(Clone, Debug, Default)]
pub struct SchemaBuilder {
    clustering: Vec<ClusteringColumn>,
    static_columns: Vec<(String, ColumnType)>,
    regular_columns: Vec<(String, ColumnType)>,
    option: TableOption,
}

impl SchemaBuilder {
    /// Append a clustering column.
    pub fn clustering_column(mut self, name: impl Into<String>, order: ClusteringOrder) -> Self {
        self.clustering.push(ClusteringColumn {
            name: name.into(),
            order,
        });
        self
    }

    /// Append a static column.
    pub fn static_column(mut self, name: impl Into<String>, ty: ColumnType) -> Self {
        self.static_columns.push((name.into(), ty));
        self
    }

    /// Append a regular column.
    pub fn regular_column(mut self, name: impl Into<String>, ty: ColumnType) -> Self {
        self.regular_columns.push((name.into(), ty));
        self
    }

    /// Replace the table options.
    pub fn option(mut self, option: TableOption) -> Self {
        self.option = option;
        self
    }

    /// Validate and finalise the schema.
    pub fn build(self) -> Result<SchemaRef, SchemaError> {
        let mut seen = HashSet::new();
        let names = self
            .clustering
            .iter()
            .map(|c| c.name.as_str())
            .chain(self.static_columns.iter().map(|(n, _)| n.as_str()))
            .chain(self.regular_columns.iter().map(|(n, _)| n.as_str()));
        for name in names {
            if !seen.insert(name) {
                return Err(SchemaError::DuplicateColumn(name.to_owned()));
            }
        }

        let static_columns = define(ColumnKind::Static, self.static_columns)?;
        let regular_columns = define(ColumnKind::Regular, self.regular_columns)?;
        let comparator =
            ClusteringComparator::new(self.clustering.iter().map(|c| c.order).collect());

        Ok(Arc::new(Schema {
            clustering: self.clustering,
            static_columns,
            regular_columns,
            comparator,
            option: self.option,
        }))
    }
}

fn define(
    kind: ColumnKind,
    columns: Vec<(String, ColumnType)>,
) -> Result<Vec<ColumnDefinition>, SchemaError> {
    let count = columns.len();
    if ColumnId::try_from(count).is_err() {
        return Err(SchemaError::TooManyColumns { kind, count });
    }
    Ok(columns
        .into_iter()
        .enumerate()
        .map(|(idx, (name, ty))| ColumnDefinition {
            id: idx as ColumnId,
            name,
            kind,
            ty,
        })
        .collect())
}
