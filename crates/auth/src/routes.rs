//! Route classification: the one table both enforcement layers read.
//!
//! The edge gate (server, pre-handler) and the protected-route guard (client,
//! render time) both consult a [`RouteTable`]; neither keeps its own list of
//! protected paths.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Capability;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteTableError {
    #[error("invalid path pattern '{0}': must start with '/'")]
    InvalidPattern(String),

    #[error("bootstrap path '{0}' cannot be public")]
    PublicBootstrap(String),
}

/// Path matcher: `"/login"` matches exactly, `"/payroll/*"` matches
/// `/payroll` and everything below it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PathPattern {
    Exact(String),
    Prefix(String),
}

impl PathPattern {
    pub fn matches(&self, path: &str) -> bool {
        let path = normalize(path);
        match self {
            PathPattern::Exact(p) => path == p.as_str(),
            PathPattern::Prefix(base) => {
                if base == "/" {
                    return true;
                }
                path == base.as_str()
                    || path
                        .strip_prefix(base.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            }
        }
    }

    /// Longer bases win; for equal bases an exact pattern beats a prefix.
    fn specificity(&self) -> (usize, u8) {
        match self {
            PathPattern::Exact(p) => (p.len(), 1),
            PathPattern::Prefix(p) => (p.len(), 0),
        }
    }
}

impl FromStr for PathPattern {
    type Err = RouteTableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.starts_with('/') {
            return Err(RouteTableError::InvalidPattern(s.to_string()));
        }
        match s.strip_suffix("/*") {
            Some("") => Ok(PathPattern::Prefix("/".to_string())),
            Some(base) => Ok(PathPattern::Prefix(normalize(base).to_string())),
            None => Ok(PathPattern::Exact(normalize(s).to_string())),
        }
    }
}

impl TryFrom<String> for PathPattern {
    type Error = RouteTableError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PathPattern> for String {
    fn from(value: PathPattern) -> Self {
        match value {
            PathPattern::Exact(p) => p,
            PathPattern::Prefix(p) if p == "/" => "/*".to_string(),
            PathPattern::Prefix(p) => format!("{p}/*"),
        }
    }
}

/// Access class of a route.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "access", rename_all = "snake_case")]
pub enum RouteAccess {
    /// No principal required.
    Public,
    /// Principal required, optionally holding one capability.
    Protected { required: Option<Capability> },
}

impl RouteAccess {
    pub const AUTHENTICATED: RouteAccess = RouteAccess::Protected { required: None };

    pub fn requires(capability: Capability) -> Self {
        RouteAccess::Protected { required: Some(capability) }
    }

    pub fn required_capability(&self) -> Option<Capability> {
        match self {
            RouteAccess::Public => None,
            RouteAccess::Protected { required } => *required,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    pub pattern: PathPattern,
    pub access: RouteAccess,
}

/// Central route classification, immutable after startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
    sign_in_path: String,
    bootstrap_path: String,
    /// Paths the edge gate never intercepts (API surfaces authenticate in
    /// their own handlers, static assets carry no data).
    excluded_prefixes: Vec<String>,
    static_extensions: Vec<String>,
}

impl RouteTable {
    /// Empty table; the sign-in page is always public.
    pub fn new(sign_in_path: &str, bootstrap_path: &str) -> Result<Self, RouteTableError> {
        let sign_in: PathPattern = sign_in_path.parse()?;
        let bootstrap: PathPattern = bootstrap_path.parse()?;
        Ok(Self {
            entries: vec![RouteEntry {
                pattern: sign_in.clone(),
                access: RouteAccess::Public,
            }],
            sign_in_path: String::from(sign_in),
            bootstrap_path: String::from(bootstrap),
            excluded_prefixes: Vec::new(),
            static_extensions: Vec::new(),
        })
    }

    pub fn with_route(mut self, pattern: &str, access: RouteAccess) -> Result<Self, RouteTableError> {
        let pattern: PathPattern = pattern.parse()?;
        if access == RouteAccess::Public && pattern.matches(&self.bootstrap_path) {
            if let PathPattern::Exact(p) = &pattern {
                return Err(RouteTableError::PublicBootstrap(p.clone()));
            }
        }
        self.entries.retain(|e| e.pattern != pattern);
        self.entries.push(RouteEntry { pattern, access });
        Ok(self)
    }

    /// Skip the edge gate for `prefix` and everything below it, matched on
    /// whole path segments.
    pub fn exclude_prefix(mut self, prefix: &str) -> Self {
        self.excluded_prefixes.push(prefix.trim_end_matches('/').to_string());
        self
    }

    pub fn static_extension(mut self, ext: &str) -> Self {
        self.static_extensions.push(ext.trim_start_matches('.').to_ascii_lowercase());
        self
    }

    pub fn sign_in_path(&self) -> &str {
        &self.sign_in_path
    }

    pub fn bootstrap_path(&self) -> &str {
        &self.bootstrap_path
    }

    pub fn is_bootstrap(&self, path: &str) -> bool {
        normalize(path) == self.bootstrap_path
    }

    /// Whether the edge gate looks at this path at all.
    pub fn is_intercepted(&self, path: &str) -> bool {
        let path = normalize(path);
        if self
            .excluded_prefixes
            .iter()
            .any(|p| path == p || path.strip_prefix(p.as_str()).is_some_and(|rest| rest.starts_with('/')))
        {
            return false;
        }
        let last = path.rsplit('/').next().unwrap_or("");
        match last.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => !self
                .static_extensions
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext)),
            _ => true,
        }
    }

    /// Most specific matching entry wins; unmatched paths require a principal.
    pub fn classify(&self, path: &str) -> RouteAccess {
        self.entries
            .iter()
            .filter(|e| e.pattern.matches(path))
            .max_by_key(|e| e.pattern.specificity())
            .map(|e| e.access)
            .unwrap_or(RouteAccess::AUTHENTICATED)
    }

    pub fn required_capability(&self, path: &str) -> Option<Capability> {
        self.classify(path).required_capability()
    }

    /// Sign-in location that brings the user back to `path` afterwards.
    pub fn sign_in_location(&self, path: &str) -> String {
        let path = normalize(path);
        if path == self.sign_in_path || path == self.bootstrap_path {
            return self.sign_in_path.clone();
        }
        format!("{}?next={}", self.sign_in_path, urlencoding::encode(path))
    }
}

impl Default for RouteTable {
    /// The HR application's route map.
    fn default() -> Self {
        use Capability::*;

        let routes: [(&str, RouteAccess); 16] = [
            ("/forgot-password", RouteAccess::Public),
            ("/", RouteAccess::AUTHENTICATED),
            ("/dashboard/*", RouteAccess::AUTHENTICATED),
            ("/profile/*", RouteAccess::AUTHENTICATED),
            ("/leave/*", RouteAccess::AUTHENTICATED),
            ("/employees/*", RouteAccess::requires(CanManageEmployees)),
            ("/payroll/*", RouteAccess::requires(CanViewPayroll)),
            ("/payroll/process", RouteAccess::requires(CanProcessPayroll)),
            ("/analytics/*", RouteAccess::requires(CanViewAnalytics)),
            ("/documents/*", RouteAccess::requires(CanManageDocuments)),
            ("/settings/*", RouteAccess::requires(CanManageSettings)),
            ("/attendance/*", RouteAccess::requires(CanViewAttendance)),
            ("/attendance/manage", RouteAccess::requires(CanManageAttendance)),
            ("/performance/*", RouteAccess::requires(CanViewPerformance)),
            ("/performance/manage", RouteAccess::requires(CanManagePerformance)),
            ("/reports/*", RouteAccess::requires(CanViewAnalytics)),
        ];

        let mut table = RouteTable {
            entries: vec![RouteEntry {
                pattern: PathPattern::Exact("/login".to_string()),
                access: RouteAccess::Public,
            }],
            sign_in_path: "/login".to_string(),
            bootstrap_path: "/".to_string(),
            excluded_prefixes: Vec::new(),
            static_extensions: Vec::new(),
        };
        for (pattern, access) in routes {
            // Patterns above are literals starting with '/'.
            if let Ok(pattern) = pattern.parse::<PathPattern>() {
                table.entries.push(RouteEntry { pattern, access });
            }
        }

        table
            .exclude_prefix("/api/")
            .exclude_prefix("/auth/")
            .exclude_prefix("/static/")
            .exclude_prefix("/assets/")
            .exclude_prefix("/favicon.ico")
            .exclude_prefix("/health")
            .static_extension("css")
            .static_extension("js")
            .static_extension("png")
            .static_extension("jpg")
            .static_extension("svg")
            .static_extension("ico")
            .static_extension("woff2")
            .static_extension("map")
    }
}

fn normalize(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    if path.len() > 1 {
        let trimmed = path.trim_end_matches('/');
        if trimmed.is_empty() { "/" } else { trimmed }
    } else if path.is_empty() {
        "/"
    } else {
        path
    }
}
