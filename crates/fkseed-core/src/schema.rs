use serde::{Deserialize, Serialize};

/// Column metadata as reported by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub ordinal_position: i16,
    pub name: String,
    /// Formatted catalog type (e.g. `character varying(32)`).
    pub data_type: String,
}

impl ColumnDef {
    pub fn new(ordinal_position: i16, name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            ordinal_position,
            name: name.into(),
            data_type: data_type.into(),
        }
    }

    pub fn declared_type(&self) -> DeclaredType {
        DeclaredType::classify(&self.data_type)
    }
}

/// One column pair of a foreign key where the inspected table is the dependent side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyRef {
    pub parent_table: String,
    pub parent_column: String,
    pub child_column: String,
}

impl ForeignKeyRef {
    pub fn new(
        parent_table: impl Into<String>,
        parent_column: impl Into<String>,
        child_column: impl Into<String>,
    ) -> Self {
        Self {
            parent_table: parent_table.into(),
            parent_column: parent_column.into(),
            child_column: child_column.into(),
        }
    }
}

/// Declared column type family used for value generation and assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredType {
    SmallInt,
    Integer,
    BigInt,
    Numeric {
        precision: Option<u32>,
        scale: Option<u32>,
    },
    Float,
    Text { max_len: Option<usize> },
    Boolean,
    Date,
    Timestamp,
    TimestampNoTz,
    TimestampTz,
    Uuid,
    Other(String),
}

impl DeclaredType {
    /// Classify a formatted catalog type such as `numeric(10,2)` or
    /// `timestamp(3) without time zone`.
    pub fn classify(data_type: &str) -> Self {
        let lowered = data_type.trim().to_lowercase();
        let modifiers = type_modifiers(&lowered);
        let base = strip_modifiers(&lowered);

        match base.as_str() {
            "smallint" | "int2" => DeclaredType::SmallInt,
            "integer" | "int" | "int4" => DeclaredType::Integer,
            "bigint" | "int8" => DeclaredType::BigInt,
            "numeric" | "decimal" => DeclaredType::Numeric {
                precision: modifiers.first().copied(),
                scale: modifiers
                    .get(1)
                    .copied()
                    .or_else(|| modifiers.first().map(|_| 0)),
            },
            "real" | "double precision" | "float4" | "float8" => DeclaredType::Float,
            "text" => DeclaredType::Text { max_len: None },
            "varchar" | "character varying" | "character" | "char" | "bpchar" => {
                DeclaredType::Text {
                    max_len: modifiers.first().map(|len| *len as usize),
                }
            }
            "boolean" | "bool" => DeclaredType::Boolean,
            "date" => DeclaredType::Date,
            "timestamp" => DeclaredType::Timestamp,
            "timestamp without time zone" => DeclaredType::TimestampNoTz,
            "timestamp with time zone" | "timestamptz" => DeclaredType::TimestampTz,
            "uuid" => DeclaredType::Uuid,
            _ => DeclaredType::Other(base),
        }
    }
}

fn strip_modifiers(data_type: &str) -> String {
    let mut base = String::with_capacity(data_type.len());
    let mut depth = 0_usize;
    for ch in data_type.chars() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => base.push(ch),
            _ => {}
        }
    }
    base.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn type_modifiers(data_type: &str) -> Vec<u32> {
    let Some(start) = data_type.find('(') else {
        return Vec::new();
    };
    let Some(len) = data_type[start..].find(')') else {
        return Vec::new();
    };
    data_type[start + 1..start + len]
        .split(',')
        .filter_map(|part| part.trim().parse::<u32>().ok())
        .collect()
}
