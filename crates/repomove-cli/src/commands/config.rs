use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use super::{Context, print_json};
use repomove_core::EnvSource;
use repomove_core::config::RootConfig;
use repomove_infrastructure::ProcessEnv;

/// What `repomove config` prints. Environment variables are reported by
/// presence only.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfigView<'a> {
    config_path: &'a Path,
    state_file: &'a Path,
    config: &'a RootConfig,
    env_present: BTreeMap<String, bool>,
}

pub fn print(ctx: &Context) -> Result<()> {
    let view = ConfigView {
        config_path: &ctx.config_path,
        state_file: ctx.store.path(),
        config: &ctx.config,
        env_present: env_presence(&ctx.config, &ProcessEnv),
    };
    print_json(&view)
}

fn env_presence(config: &RootConfig, env: &dyn EnvSource) -> BTreeMap<String, bool> {
    let names = &config.credentials;
    [
        &names.origin.env,
        &names.target.env,
        &names.secondary.env,
        &names.shared_env,
    ]
    .into_iter()
    .map(|name| (name.clone(), env.var(name).is_some()))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_env_presence_reports_names_only() {
        let env: HashMap<String, String> =
            [("GH_PAT".to_string(), "super-secret".to_string())].into();

        let presence = env_presence(&RootConfig::default(), &env);

        assert_eq!(presence.len(), 4);
        assert_eq!(presence.get("GH_PAT"), Some(&true));
        assert_eq!(presence.get("ADO_PAT"), Some(&false));

        let json = serde_json::to_string(&presence).unwrap();
        assert!(!json.contains("super-secret"));
    }
}
