//! Wiring: builds every resource from one config and one set of capabilities

use std::sync::Arc;

use crate::config::DepsConfig;
use crate::credential::{
    AppKeyDependency, ClusterControl, CredentialResolver, DockerSwarm, Environment, ProcessEnv,
    SecretProvisioner,
};
use crate::exec::{CommandRunner, SystemRunner};
use crate::fetch::{Fetcher, HttpFetcher};
use crate::platform::Platform;
use crate::resource::{Resource, SelfHealing};
use crate::tools::{
    DockerEngine, GitClient, GoToolchain, MermaidCli, RendererDependency, SystemLibraries,
};
use crate::Result;

/// Factory for resources sharing a runner, fetcher, environment and cluster
#[derive(Clone)]
pub struct Toolbox {
    config: DepsConfig,
    runner: Arc<dyn CommandRunner>,
    fetcher: Arc<dyn Fetcher>,
    env: Arc<dyn Environment>,
    cluster: Arc<dyn ClusterControl>,
    platform: Platform,
}

impl Toolbox {
    /// Real processes, real HTTP, the process environment and Docker Swarm
    pub fn system(config: DepsConfig) -> Result<Self> {
        let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner);
        let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new()?);
        Ok(Self::new(config, runner, fetcher, Arc::new(ProcessEnv)))
    }

    /// Cluster control defaults to Docker Swarm over `runner`.
    pub fn new(
        config: DepsConfig,
        runner: Arc<dyn CommandRunner>,
        fetcher: Arc<dyn Fetcher>,
        env: Arc<dyn Environment>,
    ) -> Self {
        let cluster: Arc<dyn ClusterControl> = Arc::new(DockerSwarm::new(runner.clone()));
        Toolbox {
            config,
            runner,
            fetcher,
            env,
            cluster,
            platform: Platform::current(),
        }
    }

    pub fn with_cluster(mut self, cluster: Arc<dyn ClusterControl>) -> Self {
        self.cluster = cluster;
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn config(&self) -> &DepsConfig {
        &self.config
    }

    pub fn runner(&self) -> Arc<dyn CommandRunner> {
        self.runner.clone()
    }

    fn healing<R: Resource>(&self, resource: R) -> SelfHealing<R> {
        let healing = SelfHealing::new(resource);
        if self.config.drift_check {
            healing.with_drift_check(self.fetcher.clone())
        } else {
            healing
        }
    }

    pub fn go(&self) -> SelfHealing<GoToolchain> {
        self.healing(
            GoToolchain::new(self.config.go_pin(), self.runner.clone(), self.fetcher.clone())
                .with_platform(self.platform.clone())
                .with_install_root(&self.config.install_root)
                .with_staging_dir(&self.config.staging_dir),
        )
    }

    pub fn mermaid(&self) -> SelfHealing<MermaidCli> {
        self.healing(MermaidCli::new(self.config.mermaid_pin(), self.runner.clone()))
    }

    pub fn system_libraries(&self) -> SystemLibraries {
        SystemLibraries::new(self.config.system_libraries.clone(), self.runner.clone())
    }

    pub fn renderer(&self) -> RendererDependency {
        RendererDependency::new(self.system_libraries(), self.mermaid())
    }

    pub fn git(&self) -> GitClient {
        GitClient::new(self.runner.clone())
    }

    pub fn docker(&self) -> SelfHealing<DockerEngine> {
        SelfHealing::new(DockerEngine::new(self.runner.clone()))
    }

    pub fn resolver(&self) -> CredentialResolver {
        CredentialResolver::new(self.config.app_key.clone(), self.env.clone())
    }

    pub fn provisioner(&self) -> SecretProvisioner {
        SecretProvisioner::new(
            self.cluster.clone(),
            &self.config.app_key.secret_name,
            &self.config.app_key.mount_path,
        )
    }

    pub fn app_key(&self) -> AppKeyDependency {
        AppKeyDependency::new(self.resolver(), self.provisioner())
    }
}
