//! Actor identity resolution for CLI commands.
//!
//! Name chain: `--actor` flag > `RUNBOOK_ACTOR` env > `ACTOR` env > `USER`
//! env (TTY only). Email: `--email` flag > `RUNBOOK_EMAIL` env, falling
//! back to `<name>@local`. Role: `--role` flag > `RUNBOOK_ROLE` env,
//! defaulting to `member`. Mutating commands require an identity;
//! read-only commands work without one.

use std::env;

use runbook_core::model::{Actor, Role};

/// Errors from actor resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorResolutionError {
    /// Human-readable description.
    pub message: String,
    /// Machine error code.
    pub code: &'static str,
}

impl std::fmt::Display for ActorResolutionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ActorResolutionError {}

/// Flags passed through from the top-level CLI.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActorFlags<'a> {
    pub name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub role: Option<&'a str>,
}

/// Environment reader trait for dependency injection in tests.
trait EnvReader {
    fn get(&self, key: &str) -> Option<String>;
    fn is_tty(&self) -> bool;
}

/// Real environment reader.
struct RealEnv;

impl EnvReader for RealEnv {
    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok().filter(|v| !v.is_empty())
    }

    fn is_tty(&self) -> bool {
        use std::io::IsTerminal;
        std::io::stdin().is_terminal()
    }
}

fn resolve_name(flag: Option<&str>, env: &dyn EnvReader) -> Option<String> {
    if let Some(name) = flag {
        if !name.is_empty() {
            return Some(name.to_string());
        }
    }
    if let Some(val) = env.get("RUNBOOK_ACTOR") {
        return Some(val);
    }
    if let Some(val) = env.get("ACTOR") {
        return Some(val);
    }
    // USER only counts in interactive sessions.
    if env.is_tty() {
        if let Some(val) = env.get("USER") {
            return Some(val);
        }
    }
    None
}

fn resolve_actor_with(
    flags: ActorFlags<'_>,
    env: &dyn EnvReader,
) -> Result<Actor, ActorResolutionError> {
    let Some(name) = resolve_name(flags.name, env) else {
        return Err(ActorResolutionError {
            message: "Actor identity required for this command. \
                      Set --actor, RUNBOOK_ACTOR, or ACTOR environment variable."
                .to_string(),
            code: "missing_actor",
        });
    };

    let email = flags
        .email
        .map(ToString::to_string)
        .filter(|e| !e.is_empty())
        .or_else(|| env.get("RUNBOOK_EMAIL"))
        .unwrap_or_else(|| format!("{name}@local"));

    let role = match flags
        .role
        .map(ToString::to_string)
        .filter(|r| !r.is_empty())
        .or_else(|| env.get("RUNBOOK_ROLE"))
    {
        Some(raw) => raw.parse::<Role>().map_err(|err| ActorResolutionError {
            message: err.to_string(),
            code: "invalid_role",
        })?,
        None => Role::default(),
    };

    Ok(Actor::new(name, email, role))
}

/// Resolve the acting identity, erroring when no name can be found.
///
/// Use this for mutating commands that require an actor.
pub fn require_actor(flags: ActorFlags<'_>) -> Result<Actor, ActorResolutionError> {
    resolve_actor_with(flags, &RealEnv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Test environment reader with configurable values.
    struct MockEnv {
        vars: HashMap<String, String>,
        tty: bool,
    }

    impl MockEnv {
        fn new() -> Self {
            Self {
                vars: HashMap::new(),
                tty: false,
            }
        }

        fn var(mut self, key: &str, val: &str) -> Self {
            self.vars.insert(key.to_string(), val.to_string());
            self
        }

        fn tty(mut self) -> Self {
            self.tty = true;
            self
        }
    }

    impl EnvReader for MockEnv {
        fn get(&self, key: &str) -> Option<String> {
            self.vars.get(key).filter(|v| !v.is_empty()).cloned()
        }

        fn is_tty(&self) -> bool {
            self.tty
        }
    }

    fn flags<'a>(
        name: Option<&'a str>,
        email: Option<&'a str>,
        role: Option<&'a str>,
    ) -> ActorFlags<'a> {
        ActorFlags { name, email, role }
    }

    #[test]
    fn flag_takes_priority_over_env() {
        let env = MockEnv::new()
            .var("RUNBOOK_ACTOR", "env-actor")
            .var("ACTOR", "plain-actor");
        let actor =
            resolve_actor_with(flags(Some("flag-actor"), None, None), &env).expect("resolve");
        assert_eq!(actor.name, "flag-actor");
    }

    #[test]
    fn env_chain_order() {
        let env = MockEnv::new()
            .var("RUNBOOK_ACTOR", "runbook")
            .var("ACTOR", "plain")
            .var("USER", "user")
            .tty();
        assert_eq!(
            resolve_actor_with(flags(None, None, None), &env)
                .expect("resolve")
                .name,
            "runbook"
        );

        let env = MockEnv::new().var("ACTOR", "plain").var("USER", "user").tty();
        assert_eq!(
            resolve_actor_with(flags(None, None, None), &env)
                .expect("resolve")
                .name,
            "plain"
        );
    }

    #[test]
    fn user_env_only_in_tty() {
        let env = MockEnv::new().var("USER", "bob");
        assert!(resolve_actor_with(flags(None, None, None), &env).is_err());

        let env = MockEnv::new().var("USER", "bob").tty();
        assert_eq!(
            resolve_actor_with(flags(None, None, None), &env)
                .expect("resolve")
                .name,
            "bob"
        );
    }

    #[test]
    fn missing_identity_is_an_error() {
        let err = resolve_actor_with(flags(None, None, None), &MockEnv::new()).unwrap_err();
        assert_eq!(err.code, "missing_actor");
    }

    #[test]
    fn email_falls_back_to_local_suffix() {
        let env = MockEnv::new().var("ACTOR", "ana");
        let actor = resolve_actor_with(flags(None, None, None), &env).expect("resolve");
        assert_eq!(actor.email, "ana@local");

        let env = MockEnv::new().var("ACTOR", "ana").var("RUNBOOK_EMAIL", "ana@co");
        let actor = resolve_actor_with(flags(None, None, None), &env).expect("resolve");
        assert_eq!(actor.email, "ana@co");

        let actor =
            resolve_actor_with(flags(None, Some("flag@co"), None), &env).expect("resolve");
        assert_eq!(actor.email, "flag@co");
    }

    #[test]
    fn role_resolution_and_validation() {
        let env = MockEnv::new().var("ACTOR", "ana");
        let actor = resolve_actor_with(flags(None, None, None), &env).expect("resolve");
        assert_eq!(actor.role, Role::Member);

        let env = MockEnv::new().var("ACTOR", "ana").var("RUNBOOK_ROLE", "reviewer");
        let actor = resolve_actor_with(flags(None, None, None), &env).expect("resolve");
        assert_eq!(actor.role, Role::Reviewer);

        let actor =
            resolve_actor_with(flags(None, None, Some("admin")), &env).expect("resolve");
        assert_eq!(actor.role, Role::Admin);

        let err = resolve_actor_with(flags(None, None, Some("boss")), &env).unwrap_err();
        assert_eq!(err.code, "invalid_role");
    }
}
