use std::borrow::Cow;

mod scanner;

/// Count the positional `?` placeholders in `sql`.
///
/// Markers inside string literals, quoted identifiers, comments, and
/// dollar-quoted bodies do not count.
#[must_use]
pub fn count_placeholders(sql: &str) -> usize {
    let mut count = 0;
    scanner::scan(sql, |_| count += 1);
    count
}

/// Rewrite positional `?` placeholders to Postgres-style `$1..$N`, left to right.
///
/// Returns a borrowed `Cow` when the statement has no placeholders.
#[must_use]
pub fn to_numbered(sql: &str) -> Cow<'_, str> {
    let mut out: Option<String> = None;
    let mut copied = 0;
    let mut n = 0;
    scanner::scan(sql, |idx| {
        n += 1;
        let buf = out.get_or_insert_with(|| String::with_capacity(sql.len() + 8));
        buf.push_str(&sql[copied..idx]);
        buf.push('$');
        buf.push_str(&n.to_string());
        copied = idx + 1;
    });

    match out {
        Some(mut buf) => {
            buf.push_str(&sql[copied..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(sql),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_bare_markers() {
        assert_eq!(count_placeholders("select * from t"), 0);
        assert_eq!(count_placeholders("insert into t values (?, ?, ?)"), 3);
        assert_eq!(count_placeholders("select * from t where a=?"), 1);
    }

    #[test]
    fn skips_inside_literals_and_comments() {
        let sql = "select '?', \"col?\" -- ?\n/* ? /* ? */ */ from t where a = ? and b = 'it''s?'";
        assert_eq!(count_placeholders(sql), 1);
    }

    #[test]
    fn skips_dollar_quoted_blocks() {
        let sql = "select $body$ ? $body$, ? from t";
        assert_eq!(count_placeholders(sql), 1);
    }

    #[test]
    fn numbers_markers_left_to_right() {
        let sql = "update t set a = ?, b = '?' where id = ?";
        assert_eq!(to_numbered(sql), "update t set a = $1, b = '?' where id = $2");
    }

    #[test]
    fn numbering_borrows_when_unchanged() {
        let sql = "select 1";
        assert!(matches!(to_numbered(sql), Cow::Borrowed(_)));
    }
}
