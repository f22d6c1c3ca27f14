//! 스칼라 값 — 필드 값, 바인딩 파라미터, SQL 삼치 논리 비교

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;

/// 필드 값 / 쿼리 파라미터 값
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScalarValue {
    Null,
    Int32(i32),
    Int64(i64),
    Float64(f64),
    Utf8(String),
    Boolean(bool),
    /// 컬렉션 타입 필드 (데이터베이스에는 콤마로 이어 붙인 문자열로 저장)
    List(Vec<ScalarValue>),
}

/// 컬럼의 데이터베이스 타입 태그
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DbType {
    Integer,
    Real,
    Text,
    Boolean,
    Timestamp,
    Blob,
}

impl DbType {
    /// 문자열 전용 규칙(`= ''`, LIKE)을 적용할 수 있는 타입인가
    pub fn is_textual(self) -> bool {
        matches!(self, DbType::Text)
    }
}

impl ScalarValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    /// 문자열 표현. 컬렉션은 콤마로 이어 붙인 인코딩을 사용한다.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            ScalarValue::Null => None,
            ScalarValue::Utf8(v) => Some(Cow::Borrowed(v.as_str())),
            ScalarValue::Int32(v) => Some(Cow::Owned(v.to_string())),
            ScalarValue::Int64(v) => Some(Cow::Owned(v.to_string())),
            ScalarValue::Float64(v) => Some(Cow::Owned(format!("{v}"))),
            ScalarValue::Boolean(v) => Some(Cow::Owned(v.to_string())),
            ScalarValue::List(items) => Some(Cow::Owned(
                items
                    .iter()
                    .map(|item| item.as_text().unwrap_or_default())
                    .collect::<Vec<_>>()
                    .join(","),
            )),
        }
    }

    /// SQL 비교 의미론: NULL 이 포함되거나 비교 불가능한 타입이면 `None` (unknown).
    pub fn sql_cmp(&self, other: &Self) -> Option<Ordering> {
        use ScalarValue::*;
        match (self, other) {
            (Null, _) | (_, Null) => None,
            // 컬렉션은 바인딩과 같은 콤마 인코딩 텍스트로 비교
            (List(_), _) | (_, List(_)) => {
                let (a, b) = (self.as_text()?, other.as_text()?);
                Some(a.as_ref().cmp(b.as_ref()))
            }
            (Int32(a), Int32(b)) => Some(a.cmp(b)),
            (Int32(a), Int64(b)) => Some(i64::from(*a).cmp(b)),
            (Int64(a), Int32(b)) => Some(a.cmp(&i64::from(*b))),
            (Int64(a), Int64(b)) => Some(a.cmp(b)),
            (Float64(a), Float64(b)) => a.partial_cmp(b),
            (Float64(a), Int32(b)) => a.partial_cmp(&f64::from(*b)),
            (Float64(a), Int64(b)) => a.partial_cmp(&(*b as f64)),
            (Int32(a), Float64(b)) => f64::from(*a).partial_cmp(b),
            (Int64(a), Float64(b)) => (*a as f64).partial_cmp(b),
            (Utf8(a), Utf8(b)) => Some(a.cmp(b)),
            (Boolean(a), Boolean(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// 정렬용 전순서 (NULL 이 아닌 값 전용). 타입이 다르면 타입 순위로 비교한다.
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        match self.sql_cmp(other) {
            Some(ordering) => ordering,
            None => match (self, other) {
                (ScalarValue::Float64(a), ScalarValue::Float64(b)) => a.total_cmp(b),
                _ => self.type_rank().cmp(&other.type_rank()),
            },
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            ScalarValue::Null => 0,
            ScalarValue::Boolean(_) => 1,
            ScalarValue::Int32(_) | ScalarValue::Int64(_) | ScalarValue::Float64(_) => 2,
            ScalarValue::Utf8(_) => 3,
            ScalarValue::List(_) => 4,
        }
    }

    /// 데이터베이스 바인딩용 인코딩.
    ///
    /// 컬렉션은 텍스트 컬럼일 때만 콤마 인코딩으로 바인딩할 수 있고,
    /// 그 외에는 `None` (번역 불가).
    pub fn encode_for(&self, db_type: DbType) -> Option<ScalarValue> {
        match self {
            ScalarValue::List(_) if db_type.is_textual() => {
                self.as_text().map(|text| ScalarValue::Utf8(text.into_owned()))
            }
            ScalarValue::List(_) => None,
            other => Some(other.clone()),
        }
    }

    /// SQL 리터럴 문자열로 변환 (explain 출력용)
    pub fn to_sql_literal(&self) -> String {
        match self {
            ScalarValue::Null => "NULL".to_string(),
            ScalarValue::Int32(v) => v.to_string(),
            ScalarValue::Int64(v) => v.to_string(),
            ScalarValue::Float64(v) => format!("{v}"),
            ScalarValue::Utf8(v) => format!("'{}'", v.replace('\'', "''")),
            ScalarValue::Boolean(v) => {
                if *v {
                    "TRUE".to_string()
                } else {
                    "FALSE".to_string()
                }
            }
            ScalarValue::List(_) => match self.as_text() {
                Some(text) => format!("'{}'", text.replace('\'', "''")),
                None => "NULL".to_string(),
            },
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql_literal())
    }
}

impl From<i32> for ScalarValue {
    fn from(v: i32) -> Self {
        ScalarValue::Int32(v)
    }
}

impl From<i64> for ScalarValue {
    fn from(v: i64) -> Self {
        ScalarValue::Int64(v)
    }
}

impl From<f64> for ScalarValue {
    fn from(v: f64) -> Self {
        ScalarValue::Float64(v)
    }
}

impl From<bool> for ScalarValue {
    fn from(v: bool) -> Self {
        ScalarValue::Boolean(v)
    }
}

impl From<&str> for ScalarValue {
    fn from(v: &str) -> Self {
        ScalarValue::Utf8(v.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(v: String) -> Self {
        ScalarValue::Utf8(v)
    }
}

impl From<&String> for ScalarValue {
    fn from(v: &String) -> Self {
        ScalarValue::Utf8(v.clone())
    }
}

impl<T: Into<ScalarValue>> From<Option<T>> for ScalarValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(ScalarValue::Null, Into::into)
    }
}

impl<T: Into<ScalarValue>> From<Vec<T>> for ScalarValue {
    fn from(v: Vec<T>) -> Self {
        ScalarValue::List(v.into_iter().map(Into::into).collect())
    }
}
