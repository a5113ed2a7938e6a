//! Known-issue registry
//!
//! A process-global classification table, built once on first access and
//! read-only afterwards. Readers take shared access; the only write is the
//! one-time initialization. Entries match in registration order so
//! classification is deterministic.

use std::sync::{OnceLock, RwLock};

use regex::Regex;

use logsift_core::Severity;

/// A pre-registered error pattern with a stable identifier
#[derive(Debug, Clone)]
pub struct KnownIssue {
    pub id: String,
    pub name: String,
    pub category: String,
    pub severity: Severity,
    // case-insensitive disjunction of the configured patterns
    pub pattern: Regex,
    // empty list or "*" matches any service
    pub services: Vec<String>,
}

pub struct KnownIssueRegistry {
    issues: RwLock<Vec<KnownIssue>>,
}

static REGISTRY: OnceLock<KnownIssueRegistry> = OnceLock::new();

/// The global registry, initialized with the predefined issues on first use.
pub fn registry() -> &'static KnownIssueRegistry {
    REGISTRY.get_or_init(KnownIssueRegistry::with_predefined)
}

impl KnownIssueRegistry {
    pub fn new() -> Self {
        Self {
            issues: RwLock::new(Vec::new()),
        }
    }

    fn with_predefined() -> Self {
        let registry = Self::new();

        registry.register(
            "ISSUE-001",
            "Index mismatch",
            "logic",
            Severity::High,
            &["mismatch index", "index out of range"],
            &["pp-slot-api", "pp-slot-replay"],
        );
        registry.register(
            "ISSUE-002",
            "JSON parse failure",
            "parsing",
            Severity::High,
            &["unexpected end of json input", "invalid json", "unmarshal error"],
            &["pp-slot-api", "pp-slot-session"],
        );
        registry.register(
            "ISSUE-003",
            "Insufficient player balance",
            "business_logic",
            Severity::Medium,
            &["insufficient points", "balance not enough", "insufficient funds"],
            &["pp-slot-api"],
        );
        registry.register(
            "ISSUE-004",
            "Empty session key",
            "authentication",
            Severity::High,
            &["empty mgckey", "invalid mgckey", "mgckey not found"],
            &["pp-slot-api", "pp-slot-session"],
        );
        registry.register(
            "ISSUE-005",
            "Redis cache read failure",
            "infrastructure",
            Severity::High,
            &["redis message is nil", "redis connection refused", "redis timeout"],
            &["pp-slot-api", "pp-slot-index"],
        );
        registry.register(
            "ISSUE-006",
            "Player record not found",
            "data",
            Severity::Medium,
            &["player not found", "account not found", "no such account"],
            &["pp-slot-api", "pp-slot-session"],
        );
        registry.register(
            "ISSUE-007",
            "Missing game configuration",
            "configuration",
            Severity::Medium,
            &["game config does not exist", "game not found", "invalid game id"],
            &["pp-slot-api"],
        );
        registry.register(
            "ISSUE-008",
            "Account locked",
            "security",
            Severity::High,
            &["account is locked", "account suspended", "login blocked"],
            &["pp-slot-session"],
        );
        registry.register(
            "ISSUE-009",
            "Unsupported spin type combination",
            "business_logic",
            Severity::Low,
            &["does not support spin type", "unsupported game mode", "invalid configuration"],
            &["pp-slot-api"],
        );
        registry.register(
            "ISSUE-010",
            "Wallet operation failure",
            "payment",
            Severity::High,
            &["wallet fail", "wallet error", "transaction failed", "insufficient balance"],
            &["pp-slot-api"],
        );

        registry
    }

    /// Append one issue. Only called during initialization.
    pub fn register(
        &self,
        id: &str,
        name: &str,
        category: &str,
        severity: Severity,
        patterns: &[&str],
        services: &[&str],
    ) {
        let disjunction = format!("(?i)({})", patterns.join("|"));
        let pattern = Regex::new(&disjunction).unwrap();

        self.issues.write().unwrap().push(KnownIssue {
            id: id.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            severity,
            pattern,
            services: services.iter().map(|s| s.to_string()).collect(),
        });
    }

    /// First entry whose pattern matches the content and whose service list
    /// covers the service (empty list or "*" covers everything; otherwise a
    /// listed name must be a substring of the service).
    pub fn match_content_and_service(&self, content: &str, service: &str) -> Option<KnownIssue> {
        let issues = self.issues.read().unwrap();

        for issue in issues.iter() {
            if !issue.pattern.is_match(content) {
                continue;
            }
            if issue.services.is_empty() {
                return Some(issue.clone());
            }
            if issue
                .services
                .iter()
                .any(|s| s == "*" || service.contains(s.as_str()))
            {
                return Some(issue.clone());
            }
        }

        None
    }

    pub fn issue(&self, id: &str) -> Option<KnownIssue> {
        self.issues
            .read()
            .unwrap()
            .iter()
            .find(|issue| issue.id == id)
            .cloned()
    }

    pub fn all(&self) -> Vec<KnownIssue> {
        self.issues.read().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.issues.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for KnownIssueRegistry {
    fn default() -> Self {
        Self::new()
    }
}
