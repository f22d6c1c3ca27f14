//! Fragment — SQL 텍스트 조각 + 위치 파라미터

use super::Dialect;
use crate::value::ScalarValue;
use smallvec::SmallVec;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
enum Part {
    Sql(String),
    Param(ScalarValue),
}

/// 방언 독립 SQL 조각. placeholder 는 렌더링 시점에 번호가 매겨진다.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fragment {
    parts: SmallVec<[Part; 4]>,
}

impl Fragment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(text: impl Into<String>) -> Self {
        let mut fragment = Self::new();
        fragment.push_sql(&text.into());
        fragment
    }

    pub fn push_sql(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Part::Sql(last)) = self.parts.last_mut() {
            last.push_str(text);
        } else {
            self.parts.push(Part::Sql(text.to_string()));
        }
    }

    pub fn push_param(&mut self, value: ScalarValue) {
        self.parts.push(Part::Param(value));
    }

    pub fn append(&mut self, other: Fragment) {
        for part in other.parts {
            match part {
                Part::Sql(text) => self.push_sql(&text),
                param => self.parts.push(param),
            }
        }
    }

    /// `(NOT <self>)`
    pub fn negate(self) -> Self {
        let mut out = Fragment::raw("(NOT ");
        out.append(self);
        out.push_sql(")");
        out
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn params(&self) -> impl Iterator<Item = &ScalarValue> {
        self.parts.iter().filter_map(|part| match part {
            Part::Param(value) => Some(value),
            Part::Sql(_) => None,
        })
    }

    pub fn param_count(&self) -> usize {
        self.params().count()
    }

    /// `?` placeholder 로 표기한 텍스트
    pub fn sql(&self) -> String {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                Part::Sql(text) => out.push_str(text),
                Part::Param(_) => out.push('?'),
            }
        }
        out
    }

    /// 방언 placeholder 로 렌더링하며 파라미터를 수집한다
    pub(crate) fn render_into(
        &self,
        dialect: &dyn Dialect,
        out: &mut String,
        params: &mut Vec<ScalarValue>,
    ) {
        for part in &self.parts {
            match part {
                Part::Sql(text) => out.push_str(text),
                Part::Param(value) => {
                    params.push(value.clone());
                    out.push_str(&dialect.placeholder(params.len()));
                }
            }
        }
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql())
    }
}
