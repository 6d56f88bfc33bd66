pub mod error;
pub mod extract;
pub mod routes;
pub mod tenant;

// Switch this to the deployment you want to use
pub type DeploymentImpl = local_deployment::LocalDeployment;
