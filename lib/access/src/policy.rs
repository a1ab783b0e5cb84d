//! Path-based authorization.
//!
//! The policy is an ordered, immutable list of `(pattern, requirement)`
//! rules built once at startup. [`AuthorizationPolicy::decide`] walks the
//! list and the first matching rule decides. A path no rule matches requires
//! authentication. The decision is pure and runs on every request.

use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

use crate::error::PolicyError;
use crate::principal::Principal;
use crate::role::{Role, RoleSet};

/// One segment of a compiled path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// `*`: exactly one segment.
    Any,
    /// `**`: zero or more segments.
    AnyDepth,
}

/// An Ant-style path pattern such as `/admin/**` or `/api/v1/*/books`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Parses a pattern.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::InvalidPattern` if the pattern does not start
    /// with `/` or mixes wildcards with literal text inside a segment.
    pub fn parse(pattern: &str) -> Result<Self, PolicyError> {
        let invalid = |reason: &str| PolicyError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        if !pattern.starts_with('/') {
            return Err(invalid("must start with '/'"));
        }

        let segments = split_path(pattern)
            .map(|segment| match segment {
                "**" => Ok(Segment::AnyDepth),
                "*" => Ok(Segment::Any),
                s if s.contains('*') => Err(invalid("wildcards must fill a whole segment")),
                s => Ok(Segment::Literal(s.to_string())),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            raw: pattern.to_string(),
            segments,
        })
    }

    /// Returns true if `path` matches. Empty segments are ignored.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        let path: Vec<&str> = split_path(path).collect();
        matches_segments(&self.segments, &path)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn matches_segments(pattern: &[Segment], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((Segment::AnyDepth, rest)) => {
            (0..=path.len()).any(|skip| matches_segments(rest, &path[skip..]))
        }
        Some((Segment::Any, rest)) => !path.is_empty() && matches_segments(rest, &path[1..]),
        Some((Segment::Literal(literal), rest)) => {
            path.first() == Some(&literal.as_str()) && matches_segments(rest, &path[1..])
        }
    }
}

/// What a rule demands of the caller.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    /// Anyone, with or without a session.
    Public,
    /// Any authenticated principal.
    Authenticated,
    /// An authenticated principal whose role is in the set.
    AnyRole(RoleSet),
}

/// One `(pattern, requirement)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRule {
    pattern: PathPattern,
    requirement: Requirement,
}

impl AuthorizationRule {
    /// Creates a rule.
    #[must_use]
    pub fn new(pattern: PathPattern, requirement: Requirement) -> Self {
        Self {
            pattern,
            requirement,
        }
    }

    /// Returns the rule's pattern.
    #[must_use]
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    /// Returns the rule's requirement.
    #[must_use]
    pub fn requirement(&self) -> &Requirement {
        &self.requirement
    }
}

/// Rule as written in configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleConfig {
    pub pattern: String,
    pub requirement: Requirement,
}

/// Why a request was denied. Callers see only the kind, never the rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// Authentication is required and no principal is present.
    Unauthenticated,
    /// The principal's role is not allowed.
    Forbidden,
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "authentication required"),
            Self::Forbidden => write!(f, "forbidden"),
        }
    }
}

/// Outcome of an authorization decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Denial),
}

impl Decision {
    /// Returns true for `Allow`.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Ordered, immutable rule list. Cheap to clone and share across tasks.
#[derive(Debug, Clone)]
pub struct AuthorizationPolicy {
    rules: Arc<[AuthorizationRule]>,
}

impl AuthorizationPolicy {
    /// Creates a policy from rules in evaluation order.
    #[must_use]
    pub fn new(rules: Vec<AuthorizationRule>) -> Self {
        Self {
            rules: rules.into(),
        }
    }

    /// Compiles configured rules, in order.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid pattern.
    pub fn from_config(rules: &[RuleConfig]) -> bookgate_core::Result<Self, PolicyError> {
        let rules = rules
            .iter()
            .map(|rule| {
                PathPattern::parse(&rule.pattern)
                    .map(|pattern| AuthorizationRule::new(pattern, rule.requirement.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(rules))
    }

    /// The catalog's built-in rule table.
    ///
    /// # Errors
    ///
    /// Never fails for the built-in patterns; the signature matches
    /// `from_config`.
    pub fn catalog_default() -> bookgate_core::Result<Self, PolicyError> {
        let public = ["/", "/error", "/login/**", "/logout", "/css/**", "/js/**", "/webjars/**"];
        let mut rules: Vec<RuleConfig> = public
            .into_iter()
            .map(|pattern| rule(pattern, Requirement::Public))
            .collect();
        rules.push(rule("/profile", Requirement::Authenticated));
        rules.push(rule("/api/v1/authors/**", Requirement::AnyRole(RoleSet::any())));
        rules.push(rule("/api/v1/books/**", Requirement::AnyRole(RoleSet::any())));
        rules.push(rule("/admin/**", Requirement::AnyRole(RoleSet::admin())));
        Self::from_config(&rules)
    }

    /// Returns the rules in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[AuthorizationRule] {
        &self.rules
    }

    /// Decides whether a request for `path` may proceed.
    ///
    /// Paths with `.` or `..` segments are ambiguous and always denied.
    #[must_use]
    pub fn decide(&self, path: &str, principal: Option<&Principal>) -> Decision {
        let role = principal.map(Principal::role);

        if split_path(path).any(|segment| segment == "." || segment == "..") {
            return Decision::Deny(deny_reason(role));
        }

        match self.rules.iter().find(|rule| rule.pattern.matches(path)) {
            Some(rule) => evaluate(&rule.requirement, role),
            None => evaluate(&Requirement::Authenticated, role),
        }
    }
}

fn rule(pattern: &str, requirement: Requirement) -> RuleConfig {
    RuleConfig {
        pattern: pattern.to_string(),
        requirement,
    }
}

fn evaluate(requirement: &Requirement, role: Option<Role>) -> Decision {
    match (requirement, role) {
        (Requirement::Public, _) => Decision::Allow,
        (_, None) => Decision::Deny(Denial::Unauthenticated),
        (Requirement::Authenticated, Some(_)) => Decision::Allow,
        (Requirement::AnyRole(roles), Some(role)) if roles.contains(role) => Decision::Allow,
        (Requirement::AnyRole(_), Some(_)) => Decision::Deny(Denial::Forbidden),
    }
}

fn deny_reason(role: Option<Role>) -> Denial {
    match role {
        None => Denial::Unauthenticated,
        Some(_) => Denial::Forbidden,
    }
}
