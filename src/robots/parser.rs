//! Robots.txt parser implementation
//!
//! The parser is line oriented and understands `User-agent`, `Disallow`,
//! `Allow`, `Crawl-delay` and `Sitemap` (keys are case-insensitive). Rules are
//! kept per user-agent token and the most specific group is selected at query
//! time, falling back to the `*` group.

use crate::robots::pattern_matches;
use serde::{Deserialize, Serialize};

/// Rules of one user-agent group
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RobotsDirective {
    /// Lowercased user-agent token (`*` for the wildcard group)
    pub user_agent: String,
    pub allow: Vec<String>,
    pub disallow: Vec<String>,
    /// Seconds between requests
    pub crawl_delay: Option<f64>,
    pub sitemap: Vec<String>,
}

impl RobotsDirective {
    /// Checks a path against this group
    ///
    /// A path is blocked when it matches a `Disallow` pattern and no `Allow`
    /// pattern. `Allow` overrides `Disallow` regardless of which pattern is
    /// longer; when nothing matches the path is allowed.
    pub fn allows(&self, path: &str) -> bool {
        let disallowed = self.disallow.iter().any(|p| pattern_matches(p, path));
        if !disallowed {
            return true;
        }
        self.allow.iter().any(|p| pattern_matches(p, path))
    }

    fn merge(&mut self, other: &GroupRules) {
        self.allow.extend(other.allow.iter().cloned());
        self.disallow.extend(other.disallow.iter().cloned());
        if other.crawl_delay.is_some() {
            self.crawl_delay = other.crawl_delay;
        }
    }
}

/// Parsed robots.txt data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedRobots {
    groups: Vec<RobotsDirective>,
    sitemaps: Vec<String>,
}

/// Rules collected for the group currently being parsed
#[derive(Default)]
struct GroupRules {
    agents: Vec<String>,
    allow: Vec<String>,
    disallow: Vec<String>,
    crawl_delay: Option<f64>,
    has_rules: bool,
}

impl ParsedRobots {
    /// Parses raw robots.txt content
    ///
    /// Unknown directives and malformed lines are ignored. Rules that appear
    /// before any `User-agent` line apply to `*`.
    pub fn from_content(content: &str) -> Self {
        let mut robots = Self::default();
        let mut current = GroupRules::default();

        for line in content.lines() {
            let line = match line.split_once('#') {
                Some((before, _)) => before,
                None => line,
            }
            .trim();

            if line.is_empty() {
                continue;
            }

            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    // A User-agent line after rules starts a new group;
                    // consecutive User-agent lines share one group
                    if current.has_rules {
                        robots.push_group(std::mem::take(&mut current));
                    }
                    if !value.is_empty() {
                        current.agents.push(value.to_lowercase());
                    }
                }
                "disallow" => {
                    current.has_rules = true;
                    if !value.is_empty() {
                        current.disallow.push(value.to_string());
                    }
                }
                "allow" => {
                    current.has_rules = true;
                    if !value.is_empty() {
                        current.allow.push(value.to_string());
                    }
                }
                "crawl-delay" => {
                    current.has_rules = true;
                    if let Ok(delay) = value.parse::<f64>() {
                        if delay.is_finite() && delay >= 0.0 {
                            current.crawl_delay = Some(delay);
                        }
                    }
                }
                "sitemap" => {
                    if !value.is_empty() {
                        robots.sitemaps.push(value.to_string());
                    }
                }
                _ => {}
            }
        }

        robots.push_group(current);

        let sitemaps = robots.sitemaps.clone();
        for group in &mut robots.groups {
            group.sitemap = sitemaps.clone();
        }

        robots
    }

    /// Creates a permissive ParsedRobots that allows everything
    ///
    /// This is the fail-open value used when robots.txt cannot be fetched.
    pub fn allow_all() -> Self {
        Self::default()
    }

    fn push_group(&mut self, mut group: GroupRules) {
        if !group.has_rules && group.agents.is_empty() {
            return;
        }
        if group.agents.is_empty() {
            group.agents.push("*".to_string());
        }

        for agent in &group.agents {
            match self.groups.iter_mut().find(|g| &g.user_agent == agent) {
                Some(existing) => existing.merge(&group),
                None => {
                    let mut directive = RobotsDirective {
                        user_agent: agent.clone(),
                        ..RobotsDirective::default()
                    };
                    directive.merge(&group);
                    self.groups.push(directive);
                }
            }
        }
    }

    /// Selects the group that applies to a user agent
    ///
    /// The group whose token is the longest case-insensitive substring of the
    /// user agent wins; otherwise the `*` group applies.
    pub fn directive_for(&self, user_agent: &str) -> Option<&RobotsDirective> {
        let agent = user_agent.to_lowercase();

        self.groups
            .iter()
            .filter(|g| g.user_agent != "*" && agent.contains(g.user_agent.as_str()))
            .max_by_key(|g| g.user_agent.len())
            .or_else(|| self.groups.iter().find(|g| g.user_agent == "*"))
    }

    /// Checks if a path (with optional `?query`) is allowed for the given user agent
    ///
    /// # Arguments
    ///
    /// * `path` - The URL path, starting with `/`, plus any query string
    /// * `user_agent` - The full User-Agent header; the longest group token it
    ///   contains wins, falling back to the `*` group
    ///
    /// # Returns
    ///
    /// `true` unless a `Disallow` pattern matches and no `Allow` pattern does
    pub fn is_allowed(&self, path: &str, user_agent: &str) -> bool {
        self.directive_for(user_agent)
            .map(|d| d.allows(path))
            .unwrap_or(true)
    }

    /// Gets the crawl delay for a user agent, in seconds
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        self.directive_for(user_agent).and_then(|d| d.crawl_delay)
    }

    /// Sitemap URLs declared anywhere in the file
    pub fn sitemaps(&self) -> &[String] {
        &self.sitemaps
    }

    /// All parsed groups, one per user-agent token
    pub fn groups(&self) -> &[RobotsDirective] {
        &self.groups
    }
}
