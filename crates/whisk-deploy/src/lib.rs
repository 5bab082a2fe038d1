//! # Whisk Deploy
//!
//! Deploys a serverless service described by a manifest onto a
//! [`PlatformClient`](whisk_platform::PlatformClient), and removes it again.
//!
//! ## Pipeline
//!
//! ```text
//! serverless.yml ──► Manifest ──► compile() ──► CompiledResources ──► Deployer
//!                        │                                            (fail-fast)
//!                        └──────► RemovalPlan ──────────────────────► Remover
//!                                                                     (fail-soft)
//! ```
//!
//! - **[manifest]**: typed YAML input.
//! - **[runtime]**: picks a language runtime per function and repackages its
//!   code archive for it.
//! - **[compile]**: actions, packages, triggers, feeds, rules, the API
//!   gateway document and service bindings.
//! - **[ordering]**: the stage order of both directions.
//! - **[deploy]** and **[remove]**: the two orchestrators.
//! - **[info]**: report of what is currently deployed.
//!
//! ## Example
//!
//! ```rust
//! use whisk_deploy::compile::compile;
//! use whisk_deploy::deploy::{CliBindingTool, Deployer};
//! use whisk_deploy::manifest::Manifest;
//! use whisk_platform::LocalPlatform;
//!
//! #[tokio::main]
//! async fn main() {
//!     let manifest = Manifest::from_yaml_str(
//!         "service: demo\nfunctions:\n  hello:\n    handler: me/hello\n    runtime: docker\n",
//!     )
//!     .unwrap();
//!     let resources = compile(&manifest).unwrap();
//!
//!     let platform = LocalPlatform::new("guest");
//!     let binder = CliBindingTool::new();
//!     Deployer::new(&platform, &binder).deploy(&resources).await.unwrap();
//!     platform.shutdown().await.unwrap();
//! }
//! ```

pub mod compile;
pub mod deploy;
pub mod error;
pub mod info;
pub mod manifest;
pub mod naming;
pub mod ordering;
pub mod remove;
pub mod runtime;

pub use error::{DeployError, RemovalError, RemovalReport};
