//! Allow/block command policy.

use serde::{Deserialize, Serialize};

/// Block patterns shipped with the server, appended after user patterns.
pub fn default_blocked_commands() -> Vec<String> {
    let patterns: &[&str] = if cfg!(windows) {
        &[
            "format",
            "del /s",
            "rd /s",
            "rmdir /s",
            "reg delete",
            "net user",
            "net localgroup",
            "shutdown",
            "restart",
        ]
    } else {
        &[
            "rm -rf /",
            "rm -rf /*",
            "mkfs",
            "dd if=",
            ":(){:|:&};:",
            "chmod -R 777 /",
            "chown -R",
            "> /dev/sda",
            "shutdown",
            "reboot",
            "halt",
            "poweroff",
            "init 0",
            "init 6",
        ]
    };
    patterns.iter().map(|p| p.to_string()).collect()
}

/// Split a comma-separated pattern list, dropping blank entries.
pub fn parse_command_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Immutable allow/block configuration for command validation.
///
/// Both lists are ordered sets: entries are trimmed, blank entries and
/// duplicates are dropped, declaration order is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    allow_patterns: Vec<String>,
    block_patterns: Vec<String>,
}

impl Policy {
    pub fn new<A, B>(allow: A, block: B) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        B: IntoIterator,
        B::Item: Into<String>,
    {
        Self {
            allow_patterns: ordered_set(allow),
            block_patterns: ordered_set(block),
        }
    }

    /// Allow everything, block nothing.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Append the default blocklist after the configured block patterns.
    pub fn with_default_blocklist(self) -> Self {
        let block = self
            .block_patterns
            .into_iter()
            .chain(default_blocked_commands());
        Self {
            allow_patterns: self.allow_patterns,
            block_patterns: ordered_set(block),
        }
    }

    pub fn allow_patterns(&self) -> &[String] {
        &self.allow_patterns
    }

    pub fn block_patterns(&self) -> &[String] {
        &self.block_patterns
    }

    /// True when no allow-list is configured.
    pub fn allows_all(&self) -> bool {
        self.allow_patterns.is_empty()
    }
}

fn ordered_set<I>(items: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    let mut out: Vec<String> = Vec::new();
    for item in items {
        let item: String = item.into();
        let item = item.trim();
        if item.is_empty() || out.iter().any(|existing| existing == item) {
            continue;
        }
        out.push(item.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_list() {
        assert_eq!(
            parse_command_list(" git, npm ,,ls "),
            vec!["git".to_string(), "npm".to_string(), "ls".to_string()]
        );
        assert!(parse_command_list("").is_empty());
        assert!(parse_command_list(" , ,").is_empty());
    }

    #[test]
    fn test_policy_drops_blank_and_duplicate_entries() {
        let policy = Policy::new(["git", " git ", "", "npm"], ["  ", "curl"]);
        assert_eq!(policy.allow_patterns(), ["git", "npm"]);
        assert_eq!(policy.block_patterns(), ["curl"]);
        assert!(!policy.allows_all());
    }

    #[test]
    fn test_default_blocklist_appended_after_user_patterns() {
        let policy = Policy::new(Vec::<String>::new(), ["curl"]).with_default_blocklist();
        let blocked = policy.block_patterns();
        assert_eq!(blocked[0], "curl");
        assert_eq!(blocked.len(), 1 + default_blocked_commands().len());
        assert!(policy.allows_all());
    }

    #[test]
    fn test_default_blocklist_not_empty() {
        let defaults = default_blocked_commands();
        assert!(!defaults.is_empty());
        assert!(defaults.iter().any(|p| p.contains("shutdown")));
    }
}
