//! Images: content-addressed package sets and their deployment

pub mod deployer;
pub mod identifier;
pub mod observer;
pub mod specifier;

pub use deployer::{DeployOutcome, ImageDeployer};
pub use identifier::ImageIdentifier;
pub use observer::{DeployObserver, DeployState, TracingObserver};
pub use specifier::ImageSpecifier;
