//! Command validation against an allow/block policy.

use crate::policy::Policy;

/// Why a command was refused.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("blocked: matches pattern '{0}'")]
    Blocked(String),

    #[error("not allowed: no matching prefix")]
    NotAllowed,
}

/// Decide whether `command` may run under `policy`.
///
/// Comparison is case-insensitive on the trimmed command. Block patterns are
/// checked first and match anywhere in the command, so a pattern also catches
/// commands chained or piped behind an innocent prefix. Allow patterns only
/// match the start of the command.
pub fn validate(command: &str, policy: &Policy) -> Result<(), Rejection> {
    let folded = command.trim().to_lowercase();

    for pattern in policy.block_patterns() {
        // A prefix match is a substring match at offset zero.
        if folded.contains(&pattern.to_lowercase()) {
            return Err(Rejection::Blocked(pattern.clone()));
        }
    }

    if policy.allows_all() {
        return Ok(());
    }

    if policy
        .allow_patterns()
        .iter()
        .any(|pattern| folded.starts_with(&pattern.to_lowercase()))
    {
        Ok(())
    } else {
        Err(Rejection::NotAllowed)
    }
}

/// The leading program of a command line, e.g. `git` for `git status -s`.
pub fn command_name(command: &str) -> String {
    if let Some(first) = shlex::split(command).and_then(|parts| parts.into_iter().next()) {
        return first;
    }
    command
        .split_whitespace()
        .next()
        .unwrap_or(command)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allow(patterns: &[&str]) -> Policy {
        Policy::new(patterns.iter().copied(), Vec::<String>::new())
    }

    fn block(patterns: &[&str]) -> Policy {
        Policy::new(Vec::<String>::new(), patterns.iter().copied())
    }

    #[test]
    fn test_empty_allow_list_accepts_everything() {
        let policy = Policy::allow_all();
        assert!(validate("echo hello", &policy).is_ok());
        assert!(validate("cat /etc/passwd", &policy).is_ok());
    }

    #[test]
    fn test_allow_list_is_prefix_only() {
        let policy = allow(&["git", "npm"]);
        assert!(validate("git status", &policy).is_ok());
        assert!(validate("  npm install", &policy).is_ok());
        assert_eq!(
            validate("cat /etc/passwd", &policy),
            Err(Rejection::NotAllowed)
        );
        // "git" appearing later in the command is not enough.
        assert_eq!(validate("echo git", &policy), Err(Rejection::NotAllowed));
    }

    #[test]
    fn test_block_matches_prefix() {
        let policy = block(&["rm -rf /"]);
        assert_eq!(
            validate("rm -rf /", &policy),
            Err(Rejection::Blocked("rm -rf /".to_string()))
        );
    }

    #[test]
    fn test_block_matches_substring_behind_chaining() {
        let policy = block(&["rm -rf /"]);
        assert!(validate("echo hi && rm -rf /", &policy).is_err());
        assert!(validate("ls | rm -rf /tmp/x", &policy).is_err());
    }

    #[test]
    fn test_block_wins_over_allow() {
        let policy = Policy::new(["rm"], ["rm -rf /"]);
        assert!(validate("rm file.txt", &policy).is_ok());
        assert!(matches!(
            validate("rm -rf /", &policy),
            Err(Rejection::Blocked(_))
        ));
    }

    #[test]
    fn test_case_insensitive() {
        let policy = Policy::new(["GIT"], ["ShutDown"]);
        assert!(validate("git log", &policy).is_ok());
        assert!(validate("Git Log", &policy).is_ok());
        assert!(matches!(
            validate("SHUTDOWN -h now", &policy),
            Err(Rejection::Blocked(_))
        ));
    }

    #[test]
    fn test_first_block_pattern_reported() {
        let policy = block(&["mkfs", "dd if="]);
        assert_eq!(
            validate("dd if=/dev/zero of=x; mkfs.ext4 x", &policy),
            Err(Rejection::Blocked("mkfs".to_string()))
        );
    }

    /// Substring blocking is intentionally broad: any command that merely
    /// mentions a blocked pattern is refused, even inside a quoted string.
    #[test]
    fn test_substring_blocking_is_intentionally_broad() {
        let policy = block(&["dd if="]);
        assert!(validate("echo 'how to use dd if=/dev/zero'", &policy).is_err());
        assert!(validate("grep 'halt' notes.txt", &block(&["halt"])).is_err());
    }

    #[test]
    fn test_rejection_messages() {
        assert_eq!(
            Rejection::Blocked("mkfs".to_string()).to_string(),
            "blocked: matches pattern 'mkfs'"
        );
        assert_eq!(
            Rejection::NotAllowed.to_string(),
            "not allowed: no matching prefix"
        );
    }

    #[test]
    fn test_validate_is_idempotent() {
        let policy = Policy::new(["git"], ["push --force"]).with_default_blocklist();
        for command in ["git status", "git push --force", "ls", "rm -rf /"] {
            assert_eq!(validate(command, &policy), validate(command, &policy));
        }
    }

    #[test]
    fn test_default_blocklist_rejects_dangerous_commands() {
        let policy = Policy::allow_all().with_default_blocklist();
        if cfg!(windows) {
            assert!(validate("format c:", &policy).is_err());
        } else {
            assert!(validate("rm -rf /", &policy).is_err());
            assert!(validate("sudo reboot", &policy).is_err());
            assert!(validate("echo hello", &policy).is_ok());
        }
    }

    #[test]
    fn test_command_name() {
        assert_eq!(command_name("git status -s"), "git");
        assert_eq!(command_name("'my tool' --flag"), "my tool");
        assert_eq!(command_name("  ls"), "ls");
        // Unbalanced quotes fall back to whitespace splitting.
        assert_eq!(command_name("echo 'unterminated"), "echo");
        assert_eq!(command_name(""), "");
    }
}
