use std::fs;
use std::path::{Path, PathBuf};

use fkseed_core::{RuleSpec, SeedPlan};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading seed file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing seed file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("no target tables given; pass --table or list targets in the seed file")]
    NoTargets,
}

pub fn read_plan(path: &Path) -> Result<SeedPlan, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Combine the seed file (if any) with command line inputs. File targets and
/// rules come first, so a file rule wins over a CLI rule for the same column.
pub fn resolve_plan(
    config: Option<&Path>,
    targets: Vec<String>,
    rules: Vec<RuleSpec>,
    seed: Option<u64>,
) -> Result<SeedPlan, ConfigError> {
    let mut plan = match config {
        Some(path) => read_plan(path)?,
        None => SeedPlan::default(),
    };
    plan.merge(SeedPlan {
        targets,
        rules,
        seed,
    });

    if plan.targets.is_empty() {
        return Err(ConfigError::NoTargets);
    }
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_seed_file(contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("fkseed-{}.toml", uuid::Uuid::new_v4()));
        fs::write(&path, contents).expect("write seed file");
        path
    }

    #[test]
    fn cli_inputs_follow_file_inputs() {
        let path = write_seed_file(
            r#"
targets = ["payments"]
seed = 7

[[rules]]
table = "payments"
column = "order_id"
value = 11
"#,
        );

        let plan = resolve_plan(
            Some(&path),
            vec!["order_items".to_string(), "payments".to_string()],
            vec!["payments.order_id=12".parse().expect("parse rule")],
            Some(9),
        )
        .expect("resolve");

        assert_eq!(plan.targets, ["payments", "order_items"]);
        assert_eq!(plan.seed, Some(9));
        let rules = plan.rules().expect("rules");
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].value, fkseed_core::SeedValue::Int(11));

        fs::remove_file(path).expect("cleanup");
    }

    #[test]
    fn missing_targets_are_rejected() {
        let err = resolve_plan(None, Vec::new(), Vec::new(), None).unwrap_err();
        assert!(matches!(err, ConfigError::NoTargets));
    }

    #[test]
    fn unreadable_seed_file_names_the_path() {
        let err = read_plan(Path::new("/nonexistent/seed.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/seed.toml"));
    }

    #[test]
    fn malformed_seed_file_is_a_parse_error() {
        let path = write_seed_file("targets = 3");
        let err = read_plan(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        fs::remove_file(path).expect("cleanup");
    }
}
