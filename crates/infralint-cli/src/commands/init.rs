//! Init command implementation.

use std::path::Path;

use anyhow::{bail, Context, Result};

const CONFIG_NAME: &str = "infralint.toml";

const DEFAULT_CONFIG: &str = r#"# infralint configuration

[analyzer]
# Glob patterns skipped when walking directories
exclude = [
    "**/.git/**",
    "**/node_modules/**",
    "**/vendor/**",
]

# Respect .gitignore files
respect_gitignore = true

# Files checked at once (default: number of CPUs)
# parallelism = 4

# Abort the run after this many seconds
# timeout_secs = 60

# Skip files larger than this many bytes
# max_file_size = 1048576

[dockerfile]
allow_latest_tag = false
require_healthcheck = true

# Each rule can be disabled or have its severity overridden
# [dockerfile.rules.dockerfile-latest-tag]
# severity = "error"

[makefile]
require_phony = true

[env]
check_weak_passwords = true
sensitive_markers = ["password", "secret", "token"]
min_secret_length = 8
min_secret_entropy = 24.0
# allowed_weak_patterns = ["dev-*"]
# weak_values = ["admin", "123456", "qwerty"]

[systemd]
require_restart = true

# [crontab.rules.crontab-every-minute]
# enabled = false
"#;

/// Writes a starter configuration into `dir`.
pub fn run(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_NAME);

    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write {}", config_path.display()))?;

    println!("Created {CONFIG_NAME}");
    println!("\nNext steps:");
    println!("  1. Edit {CONFIG_NAME} to configure rules");
    println!("  2. Run: infralint check");

    Ok(())
}
