// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Scanner Registry
 * Closed scanner taxonomy and dispatch to implementations
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::errors::{ScannerError, ScannerResult};
use crate::http_client::RequestEngine;
use crate::scanners::sqli::SqliScanner;
use crate::types::{CandidateParameter, Finding, ScanContext};
use serde::{Deserialize, Serialize};

/// The closed set of vulnerability classes this infrastructure serves.
/// Dispatch goes through this enum, never through strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScannerKind {
    Basic,
    Xss,
    SqlInjection,
    HttpMethods,
    FileUpload,
}

impl ScannerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScannerKind::Basic => "basic",
            ScannerKind::Xss => "xss",
            ScannerKind::SqlInjection => "sql_injection",
            ScannerKind::HttpMethods => "http_methods",
            ScannerKind::FileUpload => "file_upload",
        }
    }

    pub fn all() -> &'static [ScannerKind] {
        &[
            ScannerKind::Basic,
            ScannerKind::Xss,
            ScannerKind::SqlInjection,
            ScannerKind::HttpMethods,
            ScannerKind::FileUpload,
        ]
    }
}

impl std::str::FromStr for ScannerKind {
    type Err = ScannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "basic" => Ok(ScannerKind::Basic),
            "xss" => Ok(ScannerKind::Xss),
            "sql_injection" | "sqli" | "sql" => Ok(ScannerKind::SqlInjection),
            "http_methods" => Ok(ScannerKind::HttpMethods),
            "file_upload" => Ok(ScannerKind::FileUpload),
            other => Err(ScannerError::UnsupportedScanType(other.to_string())),
        }
    }
}

impl std::fmt::Display for ScannerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Capability shared by all vulnerability-class scanners: probe one
/// parameter, return zero or one finding.
pub trait Scanner {
    fn kind(&self) -> ScannerKind;

    fn scan_parameter<'a>(
        &'a self,
        param: &'a CandidateParameter,
        ctx: &'a ScanContext,
    ) -> impl std::future::Future<Output = Option<Finding>> + Send + 'a;
}

impl Scanner for SqliScanner {
    fn kind(&self) -> ScannerKind {
        ScannerKind::SqlInjection
    }

    fn scan_parameter<'a>(
        &'a self,
        param: &'a CandidateParameter,
        ctx: &'a ScanContext,
    ) -> impl std::future::Future<Output = Option<Finding>> + Send + 'a {
        SqliScanner::scan_parameter(self, param, ctx)
    }
}

/// Registry mapping scanner kinds to their implementations. SQL injection
/// is the class implemented in this crate; the other kinds share this
/// infrastructure but ship separately.
pub struct ScannerRegistry {
    sqli: SqliScanner,
}

impl ScannerRegistry {
    pub fn new(engine: RequestEngine) -> Self {
        Self {
            sqli: SqliScanner::new(engine),
        }
    }

    pub fn supports(&self, kind: ScannerKind) -> bool {
        matches!(kind, ScannerKind::SqlInjection)
    }

    pub fn sqli(&self) -> &SqliScanner {
        &self.sqli
    }

    /// Dispatch one parameter probe to the implementation for `kind`
    pub async fn scan_parameter(
        &self,
        kind: ScannerKind,
        param: &CandidateParameter,
        ctx: &ScanContext,
    ) -> ScannerResult<Option<Finding>> {
        match kind {
            ScannerKind::SqlInjection => Ok(Scanner::scan_parameter(&self.sqli, param, ctx).await),
            other => Err(ScannerError::UnsupportedScanType(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn kind_parsing_accepts_aliases() {
        assert_eq!(
            ScannerKind::from_str("sqli").unwrap(),
            ScannerKind::SqlInjection
        );
        assert_eq!(
            ScannerKind::from_str("SQL_INJECTION").unwrap(),
            ScannerKind::SqlInjection
        );
        assert_eq!(ScannerKind::from_str("xss").unwrap(), ScannerKind::Xss);
        assert!(ScannerKind::from_str("voodoo").is_err());
    }

    #[test]
    fn taxonomy_is_closed_and_stable() {
        assert_eq!(ScannerKind::all().len(), 5);
        for kind in ScannerKind::all() {
            assert_eq!(
                ScannerKind::from_str(kind.as_str()).unwrap(),
                *kind
            );
        }
    }

    #[tokio::test]
    async fn unimplemented_kinds_are_rejected() {
        use crate::config::ScannerConfig;
        use crate::types::{CandidateParameter, ScanContext, ScanIntensity};

        let ctx = ScanContext::new(ScannerConfig::default(), ScanIntensity::Low);
        let engine = RequestEngine::new(
            ctx.config.request_timeout_secs,
            ctx.config.max_retries,
            ctx.rate_limiter.clone(),
            ctx.stats.clone(),
        )
        .unwrap();
        let registry = ScannerRegistry::new(engine);

        assert!(registry.supports(ScannerKind::SqlInjection));
        assert!(!registry.supports(ScannerKind::Xss));

        let param = CandidateParameter::query("http://localhost/x?id=1", "id", "1");
        let result = registry
            .scan_parameter(ScannerKind::FileUpload, &param, &ctx)
            .await;
        assert!(matches!(
            result,
            Err(ScannerError::UnsupportedScanType(_))
        ));
    }
}
