//! 필드 predicate / comparator → SQL fragment 번역
//!
//! 번역할 수 없으면 `None` 을 반환하고 호출자는 in-memory 평가로 대체한다.
//! 번역 실패는 오류가 아니다.

use super::{Dialect, Fragment};
use crate::comparator::{FieldComparator, NullOrder};
use crate::field::{ColumnNamer, FieldId, TypeLookup};
use crate::predicate::{FieldPredicate, LikeMode, Shape};
use crate::value::ScalarValue;

/// 번역에 필요한 외부 조회: 컬럼 이름, 데이터베이스 타입, 방언
#[derive(Clone, Copy)]
pub struct TranslationContext<'a> {
    pub namer: &'a dyn ColumnNamer,
    pub types: &'a dyn TypeLookup,
    pub dialect: &'a dyn Dialect,
}

impl<'a> TranslationContext<'a> {
    pub fn new(
        namer: &'a dyn ColumnNamer,
        types: &'a dyn TypeLookup,
        dialect: &'a dyn Dialect,
    ) -> Self {
        Self {
            namer,
            types,
            dialect,
        }
    }

    fn column(&self, field: &FieldId) -> Option<String> {
        self.namer
            .column_name(field)
            .map(|name| self.dialect.quote_identifier(&name))
    }
}

/// 필드 predicate → WHERE 조각
pub fn translate_predicate<E>(
    predicate: &FieldPredicate<E>,
    ctx: &TranslationContext<'_>,
) -> Option<Fragment> {
    let shape = predicate.shape();
    if let Shape::Constant(value) = shape {
        let literal = if value {
            ctx.dialect.true_literal()
        } else {
            ctx.dialect.false_literal()
        };
        return Some(Fragment::raw(format!("({literal})")));
    }

    let id = predicate.field().id();
    let column = ctx.column(id)?;
    let db_type = ctx.types.database_type(id)?;
    let bind = |value: &ScalarValue| value.encode_for(db_type);

    let fragment = match shape {
        Shape::Constant(_) => return None,
        Shape::Null { negated } => {
            let not = if negated { "NOT " } else { "" };
            Fragment::raw(format!("({column} IS {not}NULL)"))
        }
        Shape::Empty { negated } => {
            if !db_type.is_textual() {
                return None;
            }
            let op = if negated { "<>" } else { "=" };
            Fragment::raw(format!("({column} {op} '')"))
        }
        Shape::Compare {
            op,
            operand,
            ignore_case,
            negated,
        } => {
            if ignore_case && !db_type.is_textual() {
                return None;
            }
            let value = bind(operand)?;
            let mut f = Fragment::raw("(");
            if ignore_case {
                let fold = ctx.dialect.case_fold_function();
                f.push_sql(&format!("{fold}({column}) {} {fold}(", op.sql()));
                f.push_param(value);
                f.push_sql("))");
            } else {
                f.push_sql(&format!("{column} {} ", op.sql()));
                f.push_param(value);
                f.push_sql(")");
            }
            negate_if(f, negated)
        }
        Shape::Between {
            from,
            to,
            inclusion,
            negated,
        } => {
            let (from, to) = (bind(from)?, bind(to)?);
            let mut f = Fragment::raw("(");
            if inclusion.start_inclusive() && inclusion.end_inclusive() {
                f.push_sql(&format!("{column} BETWEEN "));
                f.push_param(from);
                f.push_sql(" AND ");
                f.push_param(to);
            } else {
                let lower = if inclusion.start_inclusive() { ">=" } else { ">" };
                let upper = if inclusion.end_inclusive() { "<=" } else { "<" };
                f.push_sql(&format!("{column} {lower} "));
                f.push_param(from);
                f.push_sql(&format!(" AND {column} {upper} "));
                f.push_param(to);
            }
            f.push_sql(")");
            negate_if(f, negated)
        }
        Shape::InList { values, negated } => {
            let mut f = Fragment::raw(format!("({column} IN ("));
            for (i, value) in values.iter().enumerate() {
                if i > 0 {
                    f.push_sql(", ");
                }
                f.push_param(bind(value)?);
            }
            f.push_sql("))");
            negate_if(f, negated)
        }
        Shape::Like {
            mode,
            operand,
            ignore_case,
            negated,
        } => {
            if !db_type.is_textual() {
                return None;
            }
            let text = operand.as_text()?;
            let escaped = escape_like(&text);
            let pattern = match mode {
                LikeMode::Prefix => format!("{escaped}%"),
                LikeMode::Suffix => format!("%{escaped}"),
                LikeMode::Infix => format!("%{escaped}%"),
            };
            let mut f = Fragment::raw("(");
            if ignore_case {
                let fold = ctx.dialect.case_fold_function();
                f.push_sql(&format!("{fold}({column}) LIKE {fold}("));
                f.push_param(ScalarValue::Utf8(pattern));
                f.push_sql(")");
            } else {
                f.push_sql(&format!("{column} LIKE "));
                f.push_param(ScalarValue::Utf8(pattern));
            }
            if let Some(escape) = ctx.dialect.like_escape_clause() {
                f.push_sql(escape);
            }
            f.push_sql(")");
            negate_if(f, negated)
        }
    };
    Some(fragment)
}

/// 필드 comparator → ORDER BY 키
///
/// 방언의 기본 NULL 배치와 다를 때만 `NULLS FIRST|LAST` 를 붙이고,
/// 방언이 그 배치를 표현할 수 없으면 번역 불가.
/// `NullOrder::None` 은 어느 방언으로도 표현되지 않는다.
pub fn translate_comparator<E>(
    comparator: &FieldComparator<E>,
    ctx: &TranslationContext<'_>,
) -> Option<Fragment> {
    if comparator.null_order() == NullOrder::None {
        return None;
    }
    let column = ctx.column(comparator.field().id())?;
    let reversed = comparator.is_reversed();
    let direction = if reversed { "DESC" } else { "ASC" };
    let mut text = format!("{column} {direction}");

    let nulls_first = comparator.nulls_first();
    let native_first = ctx.dialect.nulls_sort_low() != reversed;
    if nulls_first != native_first {
        text.push_str(ctx.dialect.null_ordering(nulls_first)?);
    }
    Some(Fragment::raw(text))
}

fn negate_if(fragment: Fragment, negated: bool) -> Fragment {
    if negated {
        fragment.negate()
    } else {
        fragment
    }
}

/// LIKE 메타문자 escape (`\` 를 escape 문자로 사용)
pub(crate) fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

