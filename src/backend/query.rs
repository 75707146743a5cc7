use super::catalog::{self, TableSpec};
use super::{Backend, BackendError};
use rusqlite::params_from_iter;
use rusqlite::types::{Value as SqlValue, ValueRef};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use uuid::Uuid;

/// A row as it travels between the backend and the screens.
pub type Row = Map<String, Value>;

#[derive(Debug, Clone)]
pub enum Filter {
    Eq(String, Value),
    In(String, Vec<Value>),
    /// Case-insensitive `LIKE`; the pattern carries its own `%` wildcards.
    ILike(String, String),
    Gte(String, Value),
    Lte(String, Value),
}

/// Attaches columns of the row referenced by `foreign_key` under `alias`.
#[derive(Debug, Clone)]
pub struct Embed {
    alias: String,
    table: String,
    foreign_key: String,
    columns: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Select {
    table: String,
    columns: Vec<String>,
    filters: Vec<Filter>,
    order: Vec<(String, bool)>,
    limit: Option<usize>,
    embed: Option<Embed>,
}

impl Select {
    pub fn from(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: Vec::new(),
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
            embed: None,
        }
    }

    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq(column.to_string(), value.into()));
        self
    }

    pub fn in_list<V: Into<Value>>(
        mut self,
        column: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.filters.push(Filter::In(
            column.to_string(),
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn ilike(mut self, column: &str, pattern: &str) -> Self {
        self.filters.push(Filter::ILike(column.to_string(), pattern.to_string()));
        self
    }

    pub fn gte(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Gte(column.to_string(), value.into()));
        self
    }

    pub fn lte(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Lte(column.to_string(), value.into()));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.order.push((column.to_string(), ascending));
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn embed(mut self, alias: &str, table: &str, foreign_key: &str, columns: &[&str]) -> Self {
        self.embed = Some(Embed {
            alias: alias.to_string(),
            table: table.to_string(),
            foreign_key: foreign_key.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        });
        self
    }

    fn build(&self) -> Result<BuiltSelect, BackendError> {
        let spec = catalog::table(&self.table)?;
        let base_columns: Vec<&'static str> = if self.columns.is_empty() {
            spec.columns.to_vec()
        } else {
            self.columns
                .iter()
                .map(|c| spec.column(c))
                .collect::<Result<_, _>>()?
        };

        let mut select_list: Vec<String> = base_columns.iter().map(|c| format!("t.{c}")).collect();
        let mut outputs: Vec<Output> = base_columns.iter().map(|c| Output::Base(*c)).collect();
        let mut join = String::new();
        let mut embed_alias = None;
        if let Some(e) = &self.embed {
            let embedded = catalog::table(&e.table)?;
            let fk = spec.column(&e.foreign_key)?;
            join = format!(" LEFT JOIN {} e ON e.id = t.{}", embedded.name, fk);
            for c in &e.columns {
                let c = embedded.column(c)?;
                select_list.push(format!("e.{c}"));
                outputs.push(Output::Embedded(c));
            }
            select_list.push("e.id".to_string());
            outputs.push(Output::EmbedPresence);
            embed_alias = Some(e.alias.clone());
        }

        let mut clauses: Vec<String> = Vec::new();
        let mut params: Vec<SqlValue> = Vec::new();
        for f in &self.filters {
            match f {
                Filter::Eq(c, v) => {
                    let c = spec.column(c)?;
                    if v.is_null() {
                        clauses.push(format!("t.{c} IS NULL"));
                    } else {
                        clauses.push(format!("t.{c} = ?"));
                        params.push(to_sql(c, v)?);
                    }
                }
                Filter::In(c, values) => {
                    let c = spec.column(c)?;
                    if values.is_empty() {
                        clauses.push("0".to_string());
                    } else {
                        let marks = vec!["?"; values.len()].join(", ");
                        clauses.push(format!("t.{c} IN ({marks})"));
                        for v in values {
                            params.push(to_sql(c, v)?);
                        }
                    }
                }
                Filter::ILike(c, pattern) => {
                    let c = spec.column(c)?;
                    clauses.push(format!("fold_case(t.{c}) LIKE fold_case(?)"));
                    params.push(SqlValue::Text(pattern.clone()));
                }
                Filter::Gte(c, v) => {
                    let c = spec.column(c)?;
                    clauses.push(format!("t.{c} >= ?"));
                    params.push(to_sql(c, v)?);
                }
                Filter::Lte(c, v) => {
                    let c = spec.column(c)?;
                    clauses.push(format!("t.{c} <= ?"));
                    params.push(to_sql(c, v)?);
                }
            }
        }

        let mut sql = format!("SELECT {} FROM {} t{}", select_list.join(", "), spec.name, join);
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        let mut order_terms: Vec<String> = Vec::new();
        for (c, ascending) in &self.order {
            let c = spec.column(c)?;
            order_terms.push(format!("t.{c} {}", if *ascending { "ASC" } else { "DESC" }));
        }
        // Insertion order breaks ties so equal sort keys come back stable.
        order_terms.push("t.rowid ASC".to_string());
        sql.push_str(" ORDER BY ");
        sql.push_str(&order_terms.join(", "));
        if let Some(n) = self.limit {
            sql.push_str(&format!(" LIMIT {n}"));
        }

        Ok(BuiltSelect {
            sql,
            params,
            outputs,
            embed_alias,
        })
    }
}

enum Output {
    Base(&'static str),
    Embedded(&'static str),
    EmbedPresence,
}

struct BuiltSelect {
    sql: String,
    params: Vec<SqlValue>,
    outputs: Vec<Output>,
    embed_alias: Option<String>,
}

impl Backend {
    pub fn select(&self, query: &Select) -> Result<Vec<Row>, BackendError> {
        let built = query.build()?;
        log::debug!("select: {}", built.sql);
        let mut stmt = self.conn.prepare(&built.sql)?;
        let rows = stmt
            .query_map(params_from_iter(built.params.iter()), |r| {
                let mut row = Row::new();
                let mut nested = Row::new();
                let mut present = false;
                for (i, out) in built.outputs.iter().enumerate() {
                    let v = from_sql(r.get_ref(i)?);
                    match out {
                        Output::Base(c) => {
                            row.insert(c.to_string(), v);
                        }
                        Output::Embedded(c) => {
                            nested.insert(c.to_string(), v);
                        }
                        Output::EmbedPresence => present = !v.is_null(),
                    }
                }
                if let Some(alias) = &built.embed_alias {
                    let value = if present {
                        Value::Object(nested)
                    } else {
                        Value::Null
                    };
                    row.insert(alias.clone(), value);
                }
                Ok(row)
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn select_as<T: DeserializeOwned>(&self, query: &Select) -> Result<Vec<T>, BackendError> {
        self.select(query)?
            .into_iter()
            .map(|row| serde_json::from_value(Value::Object(row)).map_err(BackendError::from))
            .collect()
    }

    /// Zero or one row; more than one is an error.
    pub fn select_maybe_single(&self, query: &Select) -> Result<Option<Row>, BackendError> {
        let mut rows = self.select(&query.clone().limit(2))?;
        match rows.len() {
            0 => Ok(None),
            1 => Ok(rows.pop()),
            _ => Err(BackendError::NotSingle(query.table.clone())),
        }
    }

    /// Exactly one row.
    pub fn select_single(&self, query: &Select) -> Result<Row, BackendError> {
        self.select_maybe_single(query)?
            .ok_or_else(|| BackendError::NotSingle(query.table.clone()))
    }

    /// Inserts every row in one transaction and returns them with generated
    /// `id`/`created_at` filled in.
    pub fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, BackendError> {
        let spec = catalog::table(table)?;
        let tx = self.conn.unchecked_transaction()?;
        let mut out = Vec::with_capacity(rows.len());
        for mut row in rows {
            fill_generated(spec, &mut row);
            let (columns, values) = row_params(spec, &row)?;
            let sql = format!(
                "INSERT INTO {}({}) VALUES({})",
                spec.name,
                columns.join(", "),
                vec!["?"; columns.len()].join(", ")
            );
            tx.execute(&sql, params_from_iter(values))?;
            out.push(row);
        }
        tx.commit()?;
        Ok(out)
    }

    /// Inserts rows, or overwrites the row already holding the same values in
    /// `on_conflict`. Returns the number of rows written.
    pub fn upsert(
        &self,
        table: &str,
        rows: Vec<Row>,
        on_conflict: &[&str],
    ) -> Result<usize, BackendError> {
        let spec = catalog::table(table)?;
        let conflict: Vec<&'static str> = on_conflict
            .iter()
            .map(|c| spec.column(c))
            .collect::<Result<_, _>>()?;
        let tx = self.conn.unchecked_transaction()?;
        let mut written = 0usize;
        for mut row in rows {
            fill_generated(spec, &mut row);
            let (columns, values) = row_params(spec, &row)?;
            let updates: Vec<String> = columns
                .iter()
                .filter(|c| !matches!(**c, "id" | "created_at") && !conflict.contains(*c))
                .map(|c| format!("{c} = excluded.{c}"))
                .collect();
            let action = if updates.is_empty() {
                "DO NOTHING".to_string()
            } else {
                format!("DO UPDATE SET {}", updates.join(", "))
            };
            let sql = format!(
                "INSERT INTO {}({}) VALUES({}) ON CONFLICT({}) {}",
                spec.name,
                columns.join(", "),
                vec!["?"; columns.len()].join(", "),
                conflict.join(", "),
                action
            );
            written += tx.execute(&sql, params_from_iter(values))?;
        }
        tx.commit()?;
        Ok(written)
    }

    /// Applies `patch` to the row with `id`; returns the number of rows changed.
    pub fn update(&self, table: &str, id: &str, mut patch: Row) -> Result<usize, BackendError> {
        let spec = catalog::table(table)?;
        patch.remove("id");
        if patch.is_empty() {
            return Ok(0);
        }
        let (columns, mut values) = row_params(spec, &patch)?;
        let sets: Vec<String> = columns.iter().map(|c| format!("{c} = ?")).collect();
        let sql = format!("UPDATE {} SET {} WHERE id = ?", spec.name, sets.join(", "));
        values.push(SqlValue::Text(id.to_string()));
        Ok(self.conn.execute(&sql, params_from_iter(values))?)
    }

    pub fn delete(&self, table: &str, id: &str) -> Result<usize, BackendError> {
        let spec = catalog::table(table)?;
        let sql = format!("DELETE FROM {} WHERE id = ?", spec.name);
        Ok(self.conn.execute(&sql, [id])?)
    }
}

fn fill_generated(spec: &TableSpec, row: &mut Row) {
    let missing = |row: &Row, key: &str| row.get(key).map(|v| v.is_null()).unwrap_or(true);
    if missing(row, "id") {
        row.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
    }
    if spec.has_column("created_at") && missing(row, "created_at") {
        row.insert(
            "created_at".to_string(),
            Value::String(
                chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true),
            ),
        );
    }
}

fn row_params(
    spec: &TableSpec,
    row: &Row,
) -> Result<(Vec<&'static str>, Vec<SqlValue>), BackendError> {
    let mut columns = Vec::with_capacity(row.len());
    let mut values = Vec::with_capacity(row.len());
    for (k, v) in row {
        let c = spec.column(k)?;
        columns.push(c);
        values.push(to_sql(c, v)?);
    }
    Ok((columns, values))
}

fn to_sql(column: &str, v: &Value) -> Result<SqlValue, BackendError> {
    match v {
        Value::Null => Ok(SqlValue::Null),
        Value::Bool(b) => Ok(SqlValue::Integer(i64::from(*b))),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(SqlValue::Integer(i))
            } else if let Some(f) = n.as_f64() {
                Ok(SqlValue::Real(f))
            } else {
                Err(BackendError::UnsupportedValue(column.to_string()))
            }
        }
        Value::String(s) => Ok(SqlValue::Text(s.clone())),
        Value::Array(_) | Value::Object(_) => {
            Err(BackendError::UnsupportedValue(column.to_string()))
        }
    }
}

fn from_sql(v: ValueRef<'_>) -> Value {
    match v {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(_) => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn backend() -> Backend {
        let ws = std::env::temp_dir().join(format!("agora-query-{}", Uuid::new_v4()));
        Backend::open(&ws, 12).expect("open backend")
    }

    fn row(v: Value) -> Row {
        match v {
            Value::Object(m) => m,
            _ => panic!("not an object"),
        }
    }

    fn student(legajo: &str, apellido: &str, curso: &str) -> Row {
        row(json!({
            "legajo": legajo,
            "nombre": "Test",
            "apellido": apellido,
            "dni": format!("4000{legajo}"),
            "curso": curso,
            "division": "A",
            "estado": "ACTIVO"
        }))
    }

    #[test]
    fn insert_fills_id_and_created_at() {
        let b = backend();
        let out = b
            .insert("alumnos", vec![student("1", "Paz", "1º")])
            .expect("insert");
        assert_eq!(out.len(), 1);
        assert!(out[0].get("id").and_then(|v| v.as_str()).is_some());
        assert!(out[0].get("created_at").and_then(|v| v.as_str()).is_some());
    }

    #[test]
    fn select_orders_filters_and_limits() {
        let b = backend();
        b.insert(
            "alumnos",
            vec![
                student("1", "Zapata", "1º"),
                student("2", "Alvarez", "1º"),
                student("3", "Medina", "2º"),
            ],
        )
        .expect("insert");
        let rows = b
            .select(
                &Select::from("alumnos")
                    .columns(&["apellido"])
                    .eq("curso", "1º")
                    .order("apellido", true),
            )
            .expect("select");
        let names: Vec<&str> = rows
            .iter()
            .filter_map(|r| r.get("apellido").and_then(|v| v.as_str()))
            .collect();
        assert_eq!(names, vec!["Alvarez", "Zapata"]);

        let limited = b
            .select(&Select::from("alumnos").ilike("apellido", "%a%").limit(1))
            .expect("select");
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn ilike_folds_accented_letters() {
        let b = backend();
        b.insert(
            "alumnos",
            vec![student("1", "Álvarez", "1º"), student("2", "Paz", "1º")],
        )
        .expect("insert");
        for pattern in ["%Álv%", "%álv%", "%ÁLVAREZ%"] {
            let rows = b
                .select(&Select::from("alumnos").ilike("apellido", pattern))
                .expect("select");
            assert_eq!(rows.len(), 1, "pattern {pattern}");
            assert_eq!(rows[0]["apellido"], json!("Álvarez"));
        }
    }

    #[test]
    fn in_list_with_no_values_matches_nothing() {
        let b = backend();
        b.insert("alumnos", vec![student("1", "Paz", "1º")])
            .expect("insert");
        let rows = b
            .select(&Select::from("alumnos").in_list::<String>("id", Vec::new()))
            .expect("select");
        assert!(rows.is_empty());
    }

    #[test]
    fn upsert_overwrites_on_conflict_key() {
        let b = backend();
        let s = b
            .insert("alumnos", vec![student("1", "Paz", "1º")])
            .expect("insert");
        let sid = s[0].get("id").cloned().expect("id");
        let rec = |estado: &str| {
            row(json!({ "alumno_id": sid, "fecha": "2024-03-01", "estado": estado }))
        };
        b.upsert("asistencias", vec![rec("PRESENTE")], &["alumno_id", "fecha"])
            .expect("first");
        b.upsert("asistencias", vec![rec("AUSENTE")], &["alumno_id", "fecha"])
            .expect("second");
        let rows = b.select(&Select::from("asistencias")).expect("select");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("estado"), Some(&json!("AUSENTE")));
    }

    #[test]
    fn embed_attaches_related_columns_or_null() {
        let b = backend();
        let s = b
            .insert("alumnos", vec![student("1", "Paz", "1º")])
            .expect("insert");
        let sid = s[0].get("id").cloned().expect("id");
        b.insert(
            "pagos",
            vec![row(json!({
                "alumno_id": sid,
                "periodo": "2024-03",
                "monto": 1500,
                "estado": "PAGADO"
            }))],
        )
        .expect("pago");
        let rows = b
            .select(&Select::from("pagos").embed(
                "alumno",
                "alumnos",
                "alumno_id",
                &["apellido", "dni"],
            ))
            .expect("select");
        assert_eq!(rows[0]["alumno"]["apellido"], json!("Paz"));
        assert_eq!(rows[0]["monto"].as_f64(), Some(1500.0));
    }

    #[test]
    fn unknown_column_is_rejected_before_sql() {
        let b = backend();
        let err = b
            .select(&Select::from("alumnos").eq("password", "x"))
            .expect_err("should fail");
        assert!(matches!(err, BackendError::UnknownColumn { .. }));
    }

    #[test]
    fn update_and_delete_report_affected_rows() {
        let b = backend();
        let s = b
            .insert("actividades", vec![row(json!({
                "nombre": "Coro",
                "dia_semana": "Lunes",
                "horario": "14:00 - 15:00",
                "cupo": 20,
                "responsable": "Gómez"
            }))])
            .expect("insert");
        let id = s[0]["id"].as_str().expect("id").to_string();
        assert_eq!(
            b.update("actividades", &id, row(json!({ "cupo": 25 })))
                .expect("update"),
            1
        );
        assert_eq!(
            b.update("actividades", "missing", row(json!({ "cupo": 1 }))).expect("update"),
            0
        );
        assert_eq!(b.delete("actividades", &id).expect("delete"), 1);
        assert_eq!(b.delete("actividades", &id).expect("delete"), 0);
    }
}
