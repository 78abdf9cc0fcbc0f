use std::env;

use anyhow::{anyhow, Context as _, Result};
use uuid::Uuid;

/// Caller identity and active group, resolved once from flags/env and passed to every command.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Context {
    pub user_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
}

impl Context {
    /// Flags win over `MEAL_USER_ID` / `MEAL_GROUP_ID`.
    pub fn resolve(user: Option<String>, group: Option<String>) -> Result<Self> {
        let user = user.or_else(|| env::var("MEAL_USER_ID").ok());
        let group = group.or_else(|| env::var("MEAL_GROUP_ID").ok());
        Ok(Context {
            user_id: parse_id("user", user.as_deref())?,
            group_id: parse_id("group", group.as_deref())?,
        })
    }

    pub fn require_user(&self) -> Result<Uuid> {
        self.user_id.ok_or_else(|| anyhow!("Please provide --user or set MEAL_USER_ID"))
    }

    pub fn require_group(&self) -> Result<Uuid> {
        self.group_id.ok_or_else(|| anyhow!("Please provide --group or set MEAL_GROUP_ID"))
    }
}

fn parse_id(what: &str, raw: Option<&str>) -> Result<Option<Uuid>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => Uuid::parse_str(s).map(Some).with_context(|| format!("Invalid {} id: {}", what, s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_ids_are_treated_as_missing() {
        assert_eq!(parse_id("group", None).unwrap(), None);
        assert_eq!(parse_id("group", Some("  ")).unwrap(), None);
    }

    #[test]
    fn malformed_id_names_the_field() {
        let err = parse_id("group", Some("not-a-uuid")).unwrap_err();
        assert!(err.to_string().contains("Invalid group id"));
    }

    #[test]
    fn missing_group_is_reported() {
        let ctx = Context { user_id: Some(Uuid::new_v4()), group_id: None };
        assert!(ctx.require_user().is_ok());
        assert!(ctx.require_group().unwrap_err().to_string().contains("--group"));
    }
}
