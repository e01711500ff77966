//! SQL text helpers
//!
//! Everything here works on raw SQL text with regexes. There is no parser:
//! the analysis pipeline only needs a safety gate, the table names a query
//! touches and a bounded version of the query for sampling.

use once_cell::sync::Lazy;
use regex::Regex;

/// Statement keywords that make a query unsafe to run against a target.
pub const FORBIDDEN_KEYWORDS: &[&str] =
    &["insert", "update", "delete", "drop", "truncate", "alter", "create", "replace"];

static FORBIDDEN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\b(?:{})\b", FORBIDDEN_KEYWORDS.join("|"))).unwrap()
});

static LIMIT_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\blimit\b").unwrap());

static TABLE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:from|join)\s+((?:`?\w+`?\.)*`?\w+`?)").unwrap()
});

static CTE_TABLE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)\bwith\s+\w+\s+as\s*\(\s*select.*?\s+from\s+((?:`?\w+`?\.)*`?\w+`?)")
        .unwrap()
});

static NON_WORD_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W+").unwrap());

/// Aggregate headers rewritten before the generic cleanup. Order matters:
/// `COUNT(*)` must go before the closing parenthesis is dropped.
const AGGREGATE_REWRITES: &[(&str, &str)] = &[
    ("COUNT(*)", "total_count"),
    ("SUM(", "sum_"),
    (")", ""),
    ("AVG(", "avg_"),
    ("MAX(", "max_"),
    ("MIN(", "min_"),
    ("GROUP_CONCAT(", "group_concat_"),
    ("STDDEV(", "stddev_"),
    ("VARIANCE(", "variance_"),
];

/// True when the text mentions a data-modifying or DDL keyword anywhere.
pub fn contains_forbidden_keyword(sql: &str) -> bool {
    FORBIDDEN_REGEX.is_match(sql)
}

/// Only a single plain `SELECT` statement or CTE passes.
pub fn is_select_only(sql: &str) -> bool {
    let q = sql.trim().to_lowercase();
    if contains_forbidden_keyword(&q) || has_multiple_statements(&q) {
        return false;
    }
    q.starts_with("select") || q.starts_with("with")
}

/// True when a `;` outside quotes remains after the trailing terminators.
///
/// The text is scanned twice, with and without backslash escapes inside
/// literals, since the server's `NO_BACKSLASH_ESCAPES` mode is unknown. A
/// literal left open counts as a separator too.
pub fn has_multiple_statements(sql: &str) -> bool {
    let body = strip_terminator(sql);
    scan_for_separator(body, true) || scan_for_separator(body, false)
}

fn scan_for_separator(body: &str, backslash_escapes: bool) -> bool {
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in body.chars() {
        match quote {
            Some(_) if escaped => escaped = false,
            Some(q) if c == '\\' && backslash_escapes && q != '`' => escaped = true,
            Some(q) if c == q => quote = None,
            Some(_) => {},
            None => match c {
                '\'' | '"' | '`' => quote = Some(c),
                ';' => return true,
                _ => {},
            },
        }
    }
    quote.is_some()
}

/// Trim surrounding whitespace and any trailing statement terminators.
pub fn strip_terminator(sql: &str) -> &str {
    sql.trim().trim_end_matches(';').trim_end()
}

pub fn has_limit_clause(sql: &str) -> bool {
    LIMIT_REGEX.is_match(sql)
}

/// Bound a query for sampling.
///
/// A query that already carries `LIMIT` runs unchanged; anything else is
/// wrapped in a derived table so aggregates and ordering keep working.
pub fn build_sample_query(sql: &str, limit: u32) -> String {
    let q = strip_terminator(sql);
    if has_limit_clause(q) {
        q.to_string()
    } else {
        format!("SELECT * FROM ({}) AS subq LIMIT {}", q, limit)
    }
}

/// Extract the tables referenced after `FROM`/`JOIN`, including the first
/// table of a CTE body.
///
/// Schema qualifiers and backticks are dropped; duplicates are removed while
/// keeping the order of first appearance.
pub fn extract_tables(sql: &str) -> Vec<String> {
    let direct = TABLE_REGEX.captures_iter(sql).filter_map(|c| c.get(1));
    let cte = CTE_TABLE_REGEX.captures_iter(sql).filter_map(|c| c.get(1));

    let mut tables: Vec<String> = Vec::new();
    for m in direct.chain(cte) {
        let cleaned = m.as_str().replace('`', "");
        let name = cleaned.rsplit('.').next().unwrap_or_default();
        if name.is_empty() || tables.iter().any(|t| t == name) {
            continue;
        }
        tables.push(name.to_string());
    }
    tables
}

/// Turn a result-set column header into a stable snake_case key.
pub fn normalize_column_key(name: &str) -> String {
    let rewritten = AGGREGATE_REWRITES
        .iter()
        .fold(name.to_string(), |acc, (from, to)| acc.replace(from, to));
    NON_WORD_REGEX
        .replace_all(&rewritten, "_")
        .trim_matches('_')
        .to_lowercase()
}

/// Back-tick quote an identifier for statements that cannot take a bind
/// parameter (`DESCRIBE`).
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_and_cte_are_allowed() {
        assert!(is_select_only("SELECT * FROM customers"));
        assert!(is_select_only("  select id from t;"));
        assert!(is_select_only("WITH recent AS (SELECT * FROM sales) SELECT * FROM recent"));
    }

    #[test]
    fn test_modifying_statements_are_rejected() {
        assert!(!is_select_only("DELETE FROM customers"));
        assert!(!is_select_only("SELECT 1; DROP TABLE customers"));
        assert!(!is_select_only("select * from t where x = 1 union select replace('a','b','c')"));
        assert!(!is_select_only("SHOW TABLES"));
        assert!(!is_select_only(""));
    }

    #[test]
    fn test_stacked_statements_are_rejected() {
        assert!(!is_select_only("SELECT 1; RENAME TABLE sales TO gone"));
        assert!(!is_select_only("SELECT 1; GRANT ALL ON *.* TO 'x'@'%'"));
        assert!(!is_select_only("select 1; set global read_only=1;"));
        assert!(!is_select_only("WITH a AS (SELECT 1) SELECT * FROM a; SET @x = 1"));
    }

    #[test]
    fn test_semicolons_inside_literals_are_allowed() {
        assert!(is_select_only("SELECT * FROM notes WHERE body = 'a;b';"));
        assert!(is_select_only("SELECT \"x;y\" AS label, `odd;col` FROM t"));
        assert!(is_select_only("SELECT 'it''s; fine'"));
        assert!(!has_multiple_statements("SELECT 1 ;; "));
    }

    #[test]
    fn test_ambiguous_escapes_are_rejected() {
        // Without backslash escapes the literal closes at `\'` and RENAME runs
        assert!(has_multiple_statements("SELECT 'x\\'; RENAME TABLE a TO b; -- '"));
        assert!(has_multiple_statements("SELECT 'unterminated; RENAME TABLE a TO b"));
        assert!(has_multiple_statements("SELECT 'a\\'b;c'"));
        assert!(!has_multiple_statements("SELECT 'a\\\\b;c'"));
    }

    #[test]
    fn test_keywords_match_whole_words_only() {
        assert!(is_select_only("SELECT updated_at, created_by FROM audit_log"));
        assert!(!contains_forbidden_keyword("select deleted_flag from t"));
        assert!(contains_forbidden_keyword("Update t set a = 1"));
    }

    #[test]
    fn test_strip_terminator() {
        assert_eq!(strip_terminator("  SELECT 1 ;; \n"), "SELECT 1");
        assert_eq!(strip_terminator("SELECT 1"), "SELECT 1");
    }

    #[test]
    fn test_build_sample_query_wraps_without_limit() {
        assert_eq!(
            build_sample_query("SELECT region, SUM(amount) FROM sales GROUP BY region;", 5),
            "SELECT * FROM (SELECT region, SUM(amount) FROM sales GROUP BY region) AS subq LIMIT 5"
        );
    }

    #[test]
    fn test_build_sample_query_keeps_existing_limit() {
        assert_eq!(
            build_sample_query("select * from sales Limit 20;", 5),
            "select * from sales Limit 20"
        );
    }

    #[test]
    fn test_extract_tables_from_joins() {
        let sql = "SELECT c.customer_name, s.product_name FROM customers c \
                   JOIN sales s ON c.customer_id = s.customer_id \
                   LEFT JOIN `shop`.`products` p ON p.id = s.product_id";
        assert_eq!(extract_tables(sql), vec!["customers", "sales", "products"]);
    }

    #[test]
    fn test_extract_tables_schema_qualified_and_deduplicated() {
        let sql = "select * from testdb.sales where id in (select sale_id from sales)";
        assert_eq!(extract_tables(sql), vec!["sales"]);
    }

    #[test]
    fn test_extract_tables_from_cte() {
        let sql = "WITH big AS (\n  SELECT customer_id\n  FROM orders\n  WHERE total > 10\n)\nSELECT * FROM big JOIN customers USING (customer_id)";
        let tables = extract_tables(sql);
        assert_eq!(tables, vec!["orders", "big", "customers"]);
    }

    #[test]
    fn test_extract_tables_ignores_derived_tables() {
        assert!(extract_tables("SELECT * FROM (SELECT 1) AS x").is_empty());
    }

    #[test]
    fn test_normalize_column_key() {
        assert_eq!(normalize_column_key("COUNT(*)"), "total_count");
        assert_eq!(normalize_column_key("SUM(s.sale_amount)"), "sum_s_sale_amount");
        assert_eq!(normalize_column_key("AVG(price)"), "avg_price");
        assert_eq!(normalize_column_key("Customer Name"), "customer_name");
        assert_eq!(normalize_column_key("GROUP_CONCAT(tag)"), "group_concat_tag");
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("sales"), "`sales`");
        assert_eq!(quote_identifier("we`ird"), "`we``ird`");
    }
}
