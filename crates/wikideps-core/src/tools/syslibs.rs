//! System libraries needed by headless Chromium (Mermaid CLI rendering)
//!
//! Unlike the other tools this is not a [`crate::Resource`]: missing
//! packages are installed in one batch and the batch is trusted, with no
//! per-package re-check.

use std::sync::Arc;

use tracing::{info, warn};

use crate::exec::{run_checked, CommandRunner, CommandSpec};
use crate::Result;

/// Debian/Ubuntu packages Puppeteer's Chromium needs
pub const MERMAID_SYSTEM_LIBRARIES: &[&str] = &[
    "libatk1.0-0t64",
    "libatk-bridge2.0-0t64",
    "libcups2t64",
    "libdrm2",
    "libxkbcommon0",
    "libxdamage1",
    "libxfixes3",
    "libxrandr2",
    "libasound2t64",
    "libatspi2.0-0t64",
    "libpangocairo-1.0-0",
    "libpango-1.0-0",
    "libcairo2",
    "libgbm1",
    "libnss3",
    "libxshmfence1",
    "libxcomposite1",
    "libxext6",
    "libx11-6",
    "libx11-xcb1",
    "libxcb1",
    "libxrender1",
    "fonts-liberation",
    "libgtk-3-0t64",
];

/// A fixed list of OS packages checked with `dpkg -s`
pub struct SystemLibraries {
    packages: Vec<String>,
    runner: Arc<dyn CommandRunner>,
}

impl SystemLibraries {
    pub fn new(packages: Vec<String>, runner: Arc<dyn CommandRunner>) -> Self {
        SystemLibraries { packages, runner }
    }

    pub fn packages(&self) -> &[String] {
        &self.packages
    }

    /// Packages not currently installed, in list order
    pub fn missing(&self) -> Vec<String> {
        self.packages
            .iter()
            .filter(|pkg| {
                let spec = CommandSpec::new("dpkg").args(["-s", pkg.as_str()]);
                !matches!(self.runner.run(&spec), Ok(output) if output.success())
            })
            .cloned()
            .collect()
    }

    /// Install whatever is missing in a single privileged batch.
    ///
    /// Returns the packages that were installed (empty when nothing was missing).
    pub fn ensure_present(&self) -> Result<Vec<String>> {
        info!("verifying required system libraries");
        let missing = self.missing();
        if missing.is_empty() {
            info!("all required system libraries are installed");
            return Ok(missing);
        }

        warn!(count = missing.len(), packages = %missing.join(" "), "missing system libraries");
        info!("installing missing libraries (requires sudo)");

        run_checked(
            self.runner.as_ref(),
            &CommandSpec::new("sudo")
                .args(["apt-get", "update", "-q"])
                .streamed(),
        )?;
        run_checked(
            self.runner.as_ref(),
            &CommandSpec::new("sudo")
                .args(["apt-get", "install", "-y"])
                .args(missing.iter().cloned())
                .streamed(),
        )?;

        info!("all required libraries installed");
        Ok(missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::CommandOutput;
    use crate::fakes::ScriptedRunner;

    fn libs(runner: Arc<ScriptedRunner>) -> SystemLibraries {
        SystemLibraries::new(
            vec!["libnss3".into(), "libgbm1".into(), "fonts-liberation".into()],
            runner,
        )
    }

    #[test]
    fn test_nothing_missing_installs_nothing() {
        let runner = Arc::new(ScriptedRunner::new());
        for pkg in ["libnss3", "libgbm1", "fonts-liberation"] {
            runner.succeed(format!("dpkg -s {pkg}"), "Status: install ok installed");
        }

        let installed = libs(runner.clone()).ensure_present().unwrap();
        assert!(installed.is_empty());
        assert!(!runner.ran_prefix("sudo"));
    }

    #[test]
    fn test_only_missing_subset_is_installed_once() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.succeed("dpkg -s libnss3", "Status: install ok installed");
        runner.respond(
            "dpkg -s libgbm1",
            CommandOutput::failed(1, "package 'libgbm1' is not installed"),
        );
        // fonts-liberation unscripted: dpkg cannot even answer
        runner.succeed("sudo apt-get update -q", "");
        runner.succeed("sudo apt-get install -y libgbm1 fonts-liberation", "");

        let installed = libs(runner.clone()).ensure_present().unwrap();

        assert_eq!(installed, vec!["libgbm1", "fonts-liberation"]);
        assert_eq!(runner.count("sudo apt-get install -y libgbm1 fonts-liberation"), 1);
        // batch install is trusted: no dpkg re-check afterwards
        assert_eq!(runner.count("dpkg -s libgbm1"), 1);
    }

    #[test]
    fn test_failed_update_stops_before_install() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.respond("sudo apt-get update -q", CommandOutput::failed(100, "lock held"));

        assert!(libs(runner.clone()).ensure_present().is_err());
        assert!(!runner.ran_prefix("sudo apt-get install"));
    }
}
