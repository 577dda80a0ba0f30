use sqlx::PgPool;

use fkseed_core::Result;

pub struct RawColumn {
    pub ordinal_position: i16,
    pub name: String,
    pub data_type: String,
}

/// Insertable columns of `schema.table`; generated columns are left to the database.
pub async fn list_columns(pool: &PgPool, schema: &str, table: &str) -> Result<Vec<RawColumn>> {
    let rows = sqlx::query_as::<_, (i16, String, String)>(
        r#"
        select
          a.attnum,
          a.attname::text,
          pg_catalog.format_type(a.atttypid, a.atttypmod)
        from pg_attribute a
        join pg_class c on c.oid = a.attrelid
        join pg_namespace n on n.oid = c.relnamespace
        where n.nspname = $1
          and c.relname = $2
          and c.relkind in ('r', 'p')
          and a.attnum > 0
          and not a.attisdropped
          and a.attgenerated = ''
        order by a.attnum
        "#,
    )
    .bind(schema)
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(|err| fkseed_core::Error::Db(err.to_string()))?;

    Ok(rows
        .into_iter()
        .map(|(ordinal_position, name, data_type)| RawColumn {
            ordinal_position,
            name,
            data_type,
        })
        .collect())
}

pub struct RawForeignKeyColumn {
    pub constraint_name: String,
    pub parent_table: String,
    pub parent_column: String,
    pub child_column: String,
}

/// Column pairs of every FK declared on `schema.table`, paired by position.
pub async fn list_foreign_key_columns(
    pool: &PgPool,
    schema: &str,
    table: &str,
) -> Result<Vec<RawForeignKeyColumn>> {
    let rows = sqlx::query_as::<_, (String, String, String, String)>(
        r#"
        select
          con.conname::text,
          ref_rel.relname::text,
          ref_att.attname::text,
          src_att.attname::text
        from pg_constraint con
        join pg_class src_rel on src_rel.oid = con.conrelid
        join pg_namespace src_nsp on src_nsp.oid = src_rel.relnamespace
        join pg_class ref_rel on ref_rel.oid = con.confrelid
        join unnest(con.conkey, con.confkey) with ordinality as cols(src_attnum, ref_attnum, ord)
          on true
        join pg_attribute src_att
          on src_att.attrelid = src_rel.oid and src_att.attnum = cols.src_attnum
        join pg_attribute ref_att
          on ref_att.attrelid = ref_rel.oid and ref_att.attnum = cols.ref_attnum
        where src_nsp.nspname = $1
          and src_rel.relname = $2
          and con.contype = 'f'
        order by con.conname, cols.ord
        "#,
    )
    .bind(schema)
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(|err| fkseed_core::Error::Db(err.to_string()))?;

    Ok(rows
        .into_iter()
        .map(
            |(constraint_name, parent_table, parent_column, child_column)| RawForeignKeyColumn {
                constraint_name,
                parent_table,
                parent_column,
                child_column,
            },
        )
        .collect())
}
