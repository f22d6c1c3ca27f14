//! 단위 테스트 공용 fixture: `User` 엔티티, 필드, 테이블 매핑, in-memory source

use crate::error::{StreamError, StreamResult};
use crate::executor::{Cursor, EntitySource, Row, VecCursor};
use crate::field::{ColumnNamer, Field, TableMapping, TypeLookup};
use crate::sql::{AnsiDialect, Dialect, SqlQuery, Statement};
use crate::value::{DbType, ScalarValue};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct User {
    pub id: i64,
    pub name: Option<String>,
    pub age: Option<i32>,
    pub email: String,
    pub tags: Vec<String>,
}

pub fn user(id: i64, name: Option<&str>, age: Option<i32>, email: &str) -> User {
    User {
        id,
        name: name.map(str::to_string),
        age,
        email: email.to_string(),
        tags: Vec::new(),
    }
}

pub fn id() -> Field<User> {
    Field::new("id", |u: &User| ScalarValue::Int64(u.id))
}

pub fn name() -> Field<User> {
    Field::new("name", |u: &User| ScalarValue::from(u.name.clone()))
}

pub fn age() -> Field<User> {
    Field::new("age", |u: &User| ScalarValue::from(u.age))
}

pub fn email() -> Field<User> {
    Field::new("email", |u: &User| ScalarValue::from(&u.email))
}

pub fn tags() -> Field<User> {
    Field::new("tags", |u: &User| ScalarValue::from(u.tags.clone()))
}

pub fn mapping() -> TableMapping {
    TableMapping::new("users")
        .with_column("id", "id", DbType::Integer)
        .with_column("name", "name", DbType::Text)
        .with_column("age", "age", DbType::Integer)
        .with_column("email", "email", DbType::Text)
        .with_column("tags", "tags", DbType::Text)
}

pub fn users() -> Vec<User> {
    vec![
        user(1, Some("amy"), Some(31), "amy@example.com"),
        user(2, Some("bob"), None, "bob@example.org"),
        user(3, None, Some(19), "anon@example.com"),
        user(4, Some("cat"), Some(42), "cat@example.com"),
        user(5, Some("Dan"), Some(19), "dan@example.org"),
    ]
}

pub fn to_row(u: &User) -> Row {
    Row(vec![
        ScalarValue::Int64(u.id),
        ScalarValue::from(u.name.clone()),
        ScalarValue::from(u.age),
        ScalarValue::from(&u.email),
        ScalarValue::from(u.tags.join(",")),
    ])
}

pub fn from_row(row: Row) -> StreamResult<User> {
    let mut values = row.0.into_iter();
    let mut next = || values.next().unwrap_or(ScalarValue::Null);
    let id = match next() {
        ScalarValue::Int64(v) => v,
        other => return Err(StreamError::RowMapping(format!("bad id: {other:?}"))),
    };
    let name = match next() {
        ScalarValue::Utf8(v) => Some(v),
        _ => None,
    };
    let age = match next() {
        ScalarValue::Int32(v) => Some(v),
        _ => None,
    };
    let email = match next() {
        ScalarValue::Utf8(v) => v,
        _ => String::new(),
    };
    let tags = match next() {
        ScalarValue::Utf8(v) if !v.is_empty() => v.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    };
    Ok(User {
        id,
        name,
        age,
        email,
        tags,
    })
}

/// 실행한 쿼리를 기록하고 고정된 행을 돌려주는 source.
///
/// SQL 을 해석하지 않으므로 pushdown 경로에서는 `pushed` 행을 그대로 반환한다.
pub struct MemorySource {
    pub mapping: TableMapping,
    pub all: Vec<User>,
    pub pushed: Vec<User>,
    pub count: Option<u64>,
    pub issued: Mutex<Vec<Statement>>,
    pub closes: Arc<AtomicUsize>,
}

impl MemorySource {
    pub fn new(all: Vec<User>) -> Self {
        Self {
            mapping: mapping(),
            pushed: all.clone(),
            all,
            count: None,
            issued: Mutex::new(Vec::new()),
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_pushed(mut self, pushed: Vec<User>) -> Self {
        self.pushed = pushed;
        self
    }

    pub fn with_count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    pub fn issued_sql(&self) -> Vec<String> {
        self.issued.lock().iter().map(|s| s.sql.clone()).collect()
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl EntitySource<User> for MemorySource {
    fn table(&self) -> &str {
        self.mapping.table()
    }

    fn dialect(&self) -> &dyn Dialect {
        &AnsiDialect
    }

    fn column_namer(&self) -> &dyn ColumnNamer {
        &self.mapping
    }

    fn type_lookup(&self) -> &dyn TypeLookup {
        &self.mapping
    }

    fn native_rows(&self, query: &SqlQuery) -> StreamResult<Box<dyn Cursor<Row>>> {
        self.issued
            .lock()
            .push(query.render_select(self.dialect(), self.table()));
        let rows = self.pushed.iter().map(to_row).collect();
        let closes = Arc::clone(&self.closes);
        Ok(Box::new(VecCursor::new(rows).with_close_hook(move || {
            closes.fetch_add(1, Ordering::SeqCst);
        })))
    }

    fn map_row(&self, row: Row) -> StreamResult<User> {
        from_row(row)
    }

    fn native_sequence(&self) -> StreamResult<Box<dyn Cursor<User>>> {
        let closes = Arc::clone(&self.closes);
        Ok(Box::new(VecCursor::new(self.all.clone()).with_close_hook(
            move || {
                closes.fetch_add(1, Ordering::SeqCst);
            },
        )))
    }

    fn native_count(&self, query: &SqlQuery) -> StreamResult<Option<u64>> {
        if self.count.is_some() {
            self.issued
                .lock()
                .push(query.render_count(self.dialect(), self.table()));
        }
        Ok(self.count)
    }
}
