use sea_orm::{
    Condition, QueryFilter,
    sea_query::{Expr, LikeExpr, SimpleExpr},
};

use crate::util::fold_text;

/// Injects a free-text predicate into a query.
pub trait SearchFilter {
    /// Restrict `query` to rows whose `column` matches `term`.
    ///
    /// `column` holds text already passed through the same folding the
    /// filter applies to `term`.
    fn apply<Q>(&self, term: &str, query: Q, column: SimpleExpr) -> Q
    where
        Q: QueryFilter;
}

/// Case-insensitive token match: every whitespace separated token of the
/// term must occur somewhere in the column.
///
/// The term is NFKC-normalized and lowercased; the column is expected to be
/// stored the same way, so non-ASCII letters match regardless of case.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokenSearch;

impl SearchFilter for TokenSearch {
    fn apply<Q>(&self, term: &str, query: Q, column: SimpleExpr) -> Q
    where
        Q: QueryFilter,
    {
        let folded = fold_text(term);
        let mut condition = Condition::all();
        let mut any = false;
        for token in folded.split_whitespace() {
            any = true;
            let pattern = format!("%{}%", escape_like(token));
            condition =
                condition.add(Expr::expr(column.clone()).like(LikeExpr::new(pattern).escape('\\')));
        }
        if any { query.filter(condition) } else { query }
    }
}

fn escape_like(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    for c in token.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_like_wildcards() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("coffee"), "coffee");
    }
}
