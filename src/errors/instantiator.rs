#[derive(thiserror::Error, Debug)]
pub enum InstantiatorErrorKind<DepsErr, FactoryErr> {
    #[error("Failed to resolve dependency: {0}")]
    Deps(DepsErr),
    #[error("Factory failed: {0}")]
    Factory(FactoryErr),
    #[error("Post-processor failed: {0}")]
    PostProcessor(FactoryErr),
}
