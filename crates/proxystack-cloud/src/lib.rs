//! Tinyproxy stack declaration
//!
//! This crate turns a [`StackInputs`](proxystack_config::StackInputs) into an
//! AWS CloudFormation template describing the proxy server. It never talks to
//! AWS itself: deployment goes through the [`StackDeployer`] trait, and the
//! provisioning engine behind it owns diffing, ordering and rollback.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │               proxystack CLI                 │
//! │        (synth / diff / deploy / destroy)     │
//! └──────────────────┬───────────────────────────┘
//!                    │
//! ┌──────────────────▼───────────────────────────┐
//! │              proxystack-cloud                │
//! │  ┌──────────────┐  ┌──────────────────────┐  │
//! │  │   declare()  │  │  trait StackDeployer │  │
//! │  └──────┬───────┘  └──────────┬───────────┘  │
//! │  ┌──────▼───────┐             │              │
//! │  │   Template   │─────────────┘              │
//! │  └──────┬───────┘                            │
//! │  ┌──────▼───────┐                            │
//! │  │CloudAssembly │  (cdk.out/*.template.json) │
//! │  └──────────────┘                            │
//! └──────────────────┬───────────────────────────┘
//!                    │
//!            ┌───────▼────────┐
//!            │ cloudformation │
//!            │   (aws crate)  │
//!            └────────────────┘
//! ```

pub mod action;
pub mod assembly;
pub mod error;
pub mod policy;
pub mod provider;
pub mod stack;
pub mod template;
pub mod user_data;

// Re-exports
pub use action::{Action, ActionType, Plan, PlanSummary};
pub use assembly::{AssemblyArtifact, AssemblyManifest, CloudAssembly};
pub use error::{CloudError, Result};
pub use provider::{AuthStatus, DeployResult, StackDeployer, StackOutput, WaitConfig};
pub use stack::{DeclareOptions, NetworkContext, declare};
pub use template::{Output, Resource, Template};
pub use user_data::{UserData, UserDataMode};
