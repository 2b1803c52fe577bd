//! Handles over the datasource a query reads from.

/// Kind of a [`DataSourceRef`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataSourceKind {
    Table,
    Derived,
}

/// The datasource of a query plan node.
///
/// Only tables are ever matched against masked keys. A derived source (a
/// sub-query, a union) is never masked itself; masking is pushed down to the
/// tables it reads, see [`DataSourceRef::leaf_tables`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DataSourceRef {
    Table { name: String },
    Derived { inputs: Vec<DataSourceRef> },
}

impl DataSourceRef {
    pub fn table(name: impl Into<String>) -> Self {
        Self::Table { name: name.into() }
    }

    pub fn derived(inputs: impl IntoIterator<Item = DataSourceRef>) -> Self {
        Self::Derived {
            inputs: inputs.into_iter().collect(),
        }
    }

    pub fn kind(&self) -> DataSourceKind {
        match self {
            Self::Table { .. } => DataSourceKind::Table,
            Self::Derived { .. } => DataSourceKind::Derived,
        }
    }

    /// Returns the table name, or `None` for derived sources.
    pub fn table_name(&self) -> Option<&str> {
        match self {
            Self::Table { name } => Some(name),
            Self::Derived { .. } => None,
        }
    }

    /// Returns every table this source ultimately reads, depth first.
    pub fn leaf_tables(&self) -> Vec<&DataSourceRef> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves<'a>(&'a self, leaves: &mut Vec<&'a DataSourceRef>) {
        match self {
            Self::Table { .. } => leaves.push(self),
            Self::Derived { inputs } => {
                for input in inputs {
                    input.collect_leaves(leaves);
                }
            }
        }
    }
}
