// 통합 테스트 공용 fixture
//
// SQLite in-memory 데이터베이스 위의 `Person` source. pushdown 경로는 실제로
// SQL 을 실행하고, in-memory 경로는 테이블 전체를 읽어 같은 데이터를 돌려준다.

#![allow(dead_code)]

use dbx_stream::sql::SqliteDialect;
use dbx_stream::{
    ColumnNamer, Cursor, DbType, Dialect, EntitySource, Field, Row, ScalarValue, SqlQuery,
    Statement, StreamError, StreamResult, TableMapping, TypeLookup, VecCursor,
};
use parking_lot::Mutex;
use rusqlite::types::Value;
use rusqlite::{Connection, params_from_iter};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

// ─── Entity ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Person {
    pub id: i64,
    pub name: Option<String>,
    pub age: Option<i64>,
    pub city: Option<String>,
    /// 텍스트 컬럼에 콤마 인코딩으로 저장되는 컬렉션
    pub tags: Vec<i64>,
}

pub fn person(id: i64, name: Option<&str>, age: Option<i64>, city: Option<&str>) -> Person {
    Person {
        id,
        name: name.map(str::to_string),
        age,
        city: city.map(str::to_string),
        tags: Vec::new(),
    }
}

impl Person {
    pub fn with_tags(mut self, tags: Vec<i64>) -> Self {
        self.tags = tags;
        self
    }

    fn encoded_tags(&self) -> String {
        self.tags
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

pub fn id() -> Field<Person> {
    Field::new("id", |p: &Person| ScalarValue::Int64(p.id))
}

pub fn name() -> Field<Person> {
    Field::new("name", |p: &Person| ScalarValue::from(p.name.clone()))
}

pub fn age() -> Field<Person> {
    Field::new("age", |p: &Person| ScalarValue::from(p.age))
}

pub fn city() -> Field<Person> {
    Field::new("city", |p: &Person| ScalarValue::from(p.city.clone()))
}

pub fn tags() -> Field<Person> {
    Field::new("tags", |p: &Person| ScalarValue::from(p.tags.clone()))
}

pub fn mapping() -> TableMapping {
    TableMapping::new("people")
        .with_column("id", "id", DbType::Integer)
        .with_column("name", "name", DbType::Text)
        .with_column("age", "age", DbType::Integer)
        .with_column("city", "home_city", DbType::Text)
        .with_column("tags", "tags", DbType::Text)
}

/// NULL, 대소문자 혼합, LIKE 메타문자를 포함한 고정 데이터
pub fn people() -> Vec<Person> {
    vec![
        person(1, Some("Alice"), Some(34), Some("Seoul")),
        person(2, Some("bob"), None, Some("Busan")),
        person(3, None, Some(19), None),
        person(4, Some("alice"), Some(27), Some("seoul")),
        person(5, Some("100%_sure"), Some(40), Some("Incheon")),
        person(6, Some("Carol"), Some(19), Some("")),
        person(7, Some(""), Some(61), Some("Daegu")),
        person(8, Some("dave_o"), Some(27), Some("Busan")),
    ]
}

// ─── Value conversion ───────────────────────────────────

pub fn to_sql_value(value: &ScalarValue) -> Value {
    match value {
        ScalarValue::Null => Value::Null,
        ScalarValue::Int32(v) => Value::Integer(i64::from(*v)),
        ScalarValue::Int64(v) => Value::Integer(*v),
        ScalarValue::Float64(v) => Value::Real(*v),
        ScalarValue::Utf8(v) => Value::Text(v.clone()),
        ScalarValue::Boolean(v) => Value::Integer(i64::from(*v)),
        ScalarValue::List(_) => match value.as_text() {
            Some(text) => Value::Text(text.into_owned()),
            None => Value::Null,
        },
    }
}

pub fn from_sql_value(value: Value) -> ScalarValue {
    match value {
        Value::Null => ScalarValue::Null,
        Value::Integer(v) => ScalarValue::Int64(v),
        Value::Real(v) => ScalarValue::Float64(v),
        Value::Text(v) => ScalarValue::Utf8(v),
        Value::Blob(_) => ScalarValue::Null,
    }
}

fn text(value: ScalarValue) -> Option<String> {
    match value {
        ScalarValue::Utf8(v) => Some(v),
        _ => None,
    }
}

pub fn person_from_row(row: Row) -> StreamResult<Person> {
    let mut values = row.0.into_iter();
    let mut next = || values.next().unwrap_or(ScalarValue::Null);
    let id = match next() {
        ScalarValue::Int64(v) => v,
        other => return Err(StreamError::RowMapping(format!("bad id: {other:?}"))),
    };
    let name = text(next());
    let age = match next() {
        ScalarValue::Int64(v) => Some(v),
        _ => None,
    };
    let city = text(next());
    let tags = text(next())
        .unwrap_or_default()
        .split(',')
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>()
                .map_err(|e| StreamError::RowMapping(format!("bad tag {part:?}: {e}")))
        })
        .collect::<StreamResult<Vec<_>>>()?;
    Ok(Person {
        id,
        name,
        age,
        city,
        tags,
    })
}

// ─── SQLite source ──────────────────────────────────────

/// SQLite 위의 `Person` source.
///
/// 실행한 SQL 을 기록하고, 돌려준 cursor 가 닫힌 횟수를 센다.
pub struct SqliteSource {
    conn: Mutex<Connection>,
    mapping: TableMapping,
    issued: Mutex<Vec<Statement>>,
    closes: Arc<AtomicUsize>,
}

impl SqliteSource {
    pub fn open(rows: &[Person]) -> Self {
        let conn = Connection::open_in_memory().unwrap();
        // LIKE 를 대소문자 구분으로 (in-memory starts_with 등과 동일하게)
        conn.execute_batch(
            "PRAGMA case_sensitive_like = ON;
             CREATE TABLE people (
                 id INTEGER PRIMARY KEY,
                 name TEXT,
                 age INTEGER,
                 home_city TEXT,
                 tags TEXT NOT NULL
             );",
        )
        .unwrap();
        for p in rows {
            conn.execute(
                "INSERT INTO people (id, name, age, home_city, tags) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![p.id, p.name, p.age, p.city, p.encoded_tags()],
            )
            .unwrap();
        }
        Self {
            conn: Mutex::new(conn),
            mapping: mapping(),
            issued: Mutex::new(Vec::new()),
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn shared(rows: &[Person]) -> Arc<Self> {
        Arc::new(Self::open(rows))
    }

    pub fn issued_sql(&self) -> Vec<String> {
        self.issued.lock().iter().map(|s| s.sql.clone()).collect()
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    fn run(&self, statement: Statement) -> StreamResult<Vec<Row>> {
        let fetch_error = |e: rusqlite::Error| StreamError::Fetch {
            message: e.to_string(),
            sql: statement.sql.clone(),
        };
        let rows = {
            let conn = self.conn.lock();
            let mut stmt = conn.prepare(&statement.sql).map_err(fetch_error)?;
            let width = stmt.column_count();
            let mapped = stmt
                .query_map(
                    params_from_iter(statement.params.iter().map(to_sql_value)),
                    |r| {
                        (0..width)
                            .map(|i| r.get::<_, Value>(i).map(from_sql_value))
                            .collect::<rusqlite::Result<Vec<_>>>()
                    },
                )
                .map_err(fetch_error)?;
            let collected = mapped
                .map(|r| r.map(Row).map_err(fetch_error))
                .collect::<StreamResult<Vec<_>>>()?;
            collected
        };
        self.issued.lock().push(statement);
        Ok(rows)
    }

    fn cursor<T: Send + 'static>(&self, items: Vec<T>) -> Box<dyn Cursor<T>> {
        let closes = Arc::clone(&self.closes);
        Box::new(VecCursor::new(items).with_close_hook(move || {
            closes.fetch_add(1, Ordering::SeqCst);
        }))
    }
}

impl EntitySource<Person> for SqliteSource {
    fn table(&self) -> &str {
        self.mapping.table()
    }

    fn dialect(&self) -> &dyn Dialect {
        &SqliteDialect
    }

    fn column_namer(&self) -> &dyn ColumnNamer {
        &self.mapping
    }

    fn type_lookup(&self) -> &dyn TypeLookup {
        &self.mapping
    }

    fn native_rows(&self, query: &SqlQuery) -> StreamResult<Box<dyn Cursor<Row>>> {
        let prefix = format!(
            "SELECT id, name, age, home_city, tags FROM {}",
            self.dialect().quote_identifier(self.table())
        );
        let rows = self.run(query.render(self.dialect(), &prefix))?;
        Ok(self.cursor(rows))
    }

    fn map_row(&self, row: Row) -> StreamResult<Person> {
        person_from_row(row)
    }

    fn native_sequence(&self) -> StreamResult<Box<dyn Cursor<Person>>> {
        let rows = self.run(Statement {
            sql: "SELECT id, name, age, home_city, tags FROM \"people\" ORDER BY id".to_string(),
            params: Vec::new(),
        })?;
        let people = rows
            .into_iter()
            .map(person_from_row)
            .collect::<StreamResult<Vec<_>>>()?;
        Ok(self.cursor(people))
    }

    fn native_count(&self, query: &SqlQuery) -> StreamResult<Option<u64>> {
        let rows = self.run(query.render_count(self.dialect(), self.table()))?;
        match rows.first().and_then(|row| row.get(0)) {
            Some(ScalarValue::Int64(n)) => Ok(Some(u64::try_from(*n).unwrap_or(0))),
            other => Err(StreamError::RowMapping(format!("bad count: {other:?}"))),
        }
    }
}
