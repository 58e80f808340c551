mod container;
mod dependency_graph;
mod instantiate;
mod instantiator;
mod intercept;
mod resolve;

pub use container::CreateErrorKind;
pub use dependency_graph::DFSErrorKind;
pub use instantiate::InstantiateErrorKind;
pub use instantiator::InstantiatorErrorKind;
pub use intercept::InterceptErrorKind;
pub use resolve::ResolveErrorKind;
