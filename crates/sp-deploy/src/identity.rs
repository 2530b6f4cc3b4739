//! Actor and commit metadata stamped on every audit record

use crate::git::VersionControl;

/// Environment variable holding the commit being deployed in CI
pub const COMMIT_ENV_VAR: &str = "GITHUB_SHA";

/// Environment variables consulted for the actor, in priority order
pub const ACTOR_ENV_VARS: &[&str] = &["GITHUB_ACTOR", "USER", "USERNAME"];

/// Placeholder when no source yields a value
pub const UNKNOWN: &str = "unknown";

/// Who deployed which commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub commit_id: String,
    pub actor: String,
}

impl Identity {
    pub fn new(commit_id: impl Into<String>, actor: impl Into<String>) -> Self {
        Self {
            commit_id: commit_id.into(),
            actor: actor.into(),
        }
    }

    /// Resolve identity from explicit overrides, the CI environment, and git.
    ///
    /// Commit: `commit` > `GITHUB_SHA` > `head` resolved through `vcs` > `"unknown"`.
    /// Actor: `actor` > `GITHUB_ACTOR` > `USER` > `USERNAME` > `"unknown"`.
    pub fn resolve(
        commit: Option<&str>,
        actor: Option<&str>,
        vcs: &dyn VersionControl,
        head: &str,
    ) -> Self {
        let commit_id = non_empty(commit)
            .or_else(|| env_value(COMMIT_ENV_VAR))
            .or_else(|| match vcs.resolve_revision(head) {
                Ok(id) => Some(id),
                Err(e) => {
                    log::warn!("Could not resolve commit for {}: {}", head, e);
                    None
                }
            })
            .unwrap_or_else(|| UNKNOWN.to_string());

        let actor = non_empty(actor)
            .or_else(|| ACTOR_ENV_VARS.iter().find_map(|v| env_value(v)))
            .unwrap_or_else(|| UNKNOWN.to_string());

        Self { commit_id, actor }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

fn env_value(name: &str) -> Option<String> {
    non_empty(std::env::var(name).ok().as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DeployError, DeployResult};
    use serial_test::serial;

    struct FixedRevision(Option<&'static str>);

    impl VersionControl for FixedRevision {
        fn changed_files(&self, _: &str, _: &str, _: &str) -> DeployResult<Vec<String>> {
            Ok(Vec::new())
        }

        fn resolve_revision(&self, _rev: &str) -> DeployResult<String> {
            self.0
                .map(String::from)
                .ok_or_else(|| DeployError::VersionControl("not a repository".to_string()))
        }
    }

    fn clear_env() {
        std::env::remove_var(COMMIT_ENV_VAR);
        for var in ACTOR_ENV_VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_explicit_values_win() {
        clear_env();
        std::env::set_var(COMMIT_ENV_VAR, "env-sha");
        std::env::set_var("GITHUB_ACTOR", "env-actor");
        let id = Identity::resolve(
            Some("flag-sha"),
            Some("flag-actor"),
            &FixedRevision(Some("git-sha")),
            "HEAD",
        );
        assert_eq!(id, Identity::new("flag-sha", "flag-actor"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_environment_before_git() {
        clear_env();
        std::env::set_var(COMMIT_ENV_VAR, "env-sha");
        std::env::set_var("GITHUB_ACTOR", "octocat");
        std::env::set_var("USER", "runner");
        let id = Identity::resolve(None, None, &FixedRevision(Some("git-sha")), "HEAD");
        assert_eq!(id, Identity::new("env-sha", "octocat"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_git_and_user_fallbacks() {
        clear_env();
        std::env::set_var("USER", "runner");
        let id = Identity::resolve(Some("  "), None, &FixedRevision(Some("git-sha")), "HEAD");
        assert_eq!(id, Identity::new("git-sha", "runner"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_username_fallback() {
        clear_env();
        std::env::set_var("USERNAME", "winrunner");
        let id = Identity::resolve(None, None, &FixedRevision(Some("git-sha")), "HEAD");
        assert_eq!(id, Identity::new("git-sha", "winrunner"));

        std::env::set_var("USER", "runner");
        let id = Identity::resolve(None, None, &FixedRevision(Some("git-sha")), "HEAD");
        assert_eq!(id.actor, "runner");
        clear_env();
    }

    #[test]
    #[serial]
    fn test_unknown_when_nothing_available() {
        clear_env();
        let id = Identity::resolve(None, None, &FixedRevision(None), "HEAD");
        assert_eq!(id, Identity::new(UNKNOWN, UNKNOWN));
    }
}
