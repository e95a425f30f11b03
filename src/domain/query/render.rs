//! Postgres rendering of predicate lists.

use crate::domain::query::predicate::{Predicate, PRICE_COLUMNS};
use crate::domain::query::SqlParam;

/// Accumulates bound values and hands out `$n` placeholders in bind order.
#[derive(Debug, Default)]
pub struct Renderer {
    params: Vec<SqlParam>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, value: SqlParam) -> String {
        self.params.push(value);
        format!("${}", self.params.len())
    }

    /// Renders one fragment per predicate, binding values as it goes.
    pub fn fragments(&mut self, predicates: &[Predicate]) -> Vec<String> {
        predicates.iter().map(|p| self.fragment(p)).collect()
    }

    /// ` WHERE a AND b ...`, or an empty string for no predicates.
    pub fn where_clause(&mut self, predicates: &[Predicate]) -> String {
        let fragments = self.fragments(predicates);
        if fragments.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", fragments.join(" AND "))
        }
    }

    pub fn into_params(self) -> Vec<SqlParam> {
        self.params
    }

    fn fragment(&mut self, predicate: &Predicate) -> String {
        match predicate {
            Predicate::Equals(col, v) => format!("{} = {}", col.qualified(), self.bind(v.clone())),
            Predicate::GreaterOrEqual(col, v) => {
                format!("{} >= {}", col.qualified(), self.bind(v.clone()))
            }
            Predicate::LessOrEqual(col, v) => {
                format!("{} <= {}", col.qualified(), self.bind(v.clone()))
            }
            Predicate::Between(col, lo, hi) => {
                let lo = self.bind(lo.clone());
                let hi = self.bind(hi.clone());
                format!("{} BETWEEN {} AND {}", col.qualified(), lo, hi)
            }
            Predicate::AnyPricedVariant { min, max } => {
                let mut sql = String::from(
                    "EXISTS (SELECT 1 FROM phone_pricing pp WHERE pp.phone_id = p.phone_id",
                );
                if let Some(min) = min {
                    sql.push_str(" AND ");
                    sql.push_str(&self.any_price(">=", min));
                }
                if let Some(max) = max {
                    sql.push_str(" AND ");
                    sql.push_str(&self.any_price("<=", max));
                }
                sql.push(')');
                sql
            }
        }
    }

    // `(pp.price_unofficial >= $n OR pp.price_official >= $m)`
    fn any_price(&mut self, op: &str, value: &SqlParam) -> String {
        let parts: Vec<String> = PRICE_COLUMNS
            .iter()
            .map(|col| format!("pp.{} {} {}", col.name(), op, self.bind(value.clone())))
            .collect();
        format!("({})", parts.join(" OR "))
    }
}
