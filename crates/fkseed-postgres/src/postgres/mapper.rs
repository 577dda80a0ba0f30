use fkseed_core::{ColumnDef, ForeignKeyRef};

use super::queries::{RawColumn, RawForeignKeyColumn};

pub fn map_columns(raw: Vec<RawColumn>) -> Vec<ColumnDef> {
    let mut columns: Vec<ColumnDef> = raw
        .into_iter()
        .map(|col| ColumnDef::new(col.ordinal_position, col.name, col.data_type))
        .collect();
    columns.sort_by_key(|col| col.ordinal_position);
    columns
}

pub fn map_foreign_keys(raw: Vec<RawForeignKeyColumn>) -> Vec<ForeignKeyRef> {
    raw.into_iter()
        .map(|fk| ForeignKeyRef::new(fk.parent_table, fk.parent_column, fk.child_column))
        .collect()
}

pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Single-row insert with one text parameter per column, cast to the
/// column's formatted type so enums and domains accept the literal.
/// `OVERRIDING SYSTEM VALUE` lets `GENERATED ALWAYS AS IDENTITY` keys take
/// the supplied value, which dependents inherit.
pub fn build_insert_sql(schema: &str, table: &str, columns: &[ColumnDef]) -> String {
    let names = columns
        .iter()
        .map(|col| quote_ident(&col.name))
        .collect::<Vec<_>>()
        .join(", ");
    let params = columns
        .iter()
        .enumerate()
        .map(|(idx, col)| format!("CAST(${} AS {})", idx + 1, col.data_type))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "INSERT INTO {}.{} ({names}) OVERRIDING SYSTEM VALUE VALUES ({params})",
        quote_ident(schema),
        quote_ident(table)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_sql_casts_each_parameter() {
        let columns = vec![
            ColumnDef::new(1, "id", "integer"),
            ColumnDef::new(2, "status", "app.order_status"),
        ];

        let sql = build_insert_sql("app", "orders", &columns);

        assert_eq!(
            sql,
            r#"INSERT INTO "app"."orders" ("id", "status") OVERRIDING SYSTEM VALUE VALUES (CAST($1 AS integer), CAST($2 AS app.order_status))"#
        );
    }

    #[test]
    fn quotes_embedded_quotes() {
        assert_eq!(quote_ident(r#"we"ird"#), r#""we""ird""#);
    }

    #[test]
    fn columns_follow_catalog_order() {
        let columns = map_columns(vec![
            RawColumn {
                ordinal_position: 2,
                name: "order_id".to_string(),
                data_type: "integer".to_string(),
            },
            RawColumn {
                ordinal_position: 1,
                name: "id".to_string(),
                data_type: "integer".to_string(),
            },
        ]);

        let names: Vec<&str> = columns.iter().map(|col| col.name.as_str()).collect();
        assert_eq!(names, vec!["id", "order_id"]);
    }
}
