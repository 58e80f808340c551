pub(crate) mod any;
pub(crate) mod cache;
pub(crate) mod config;
pub(crate) mod container;
pub(crate) mod dependency;
pub(crate) mod dependency_graph;
pub(crate) mod descriptor;
pub(crate) mod errors;
pub(crate) mod instantiator;
pub(crate) mod interceptor;
pub(crate) mod post_processor;
pub(crate) mod registry;
pub(crate) mod scope;
pub(crate) mod token;
pub(crate) mod utils;

pub use any::{Instance, TypeInfo};
pub use config::Config;
pub use container::Container;
pub use dependency::Dependency;
pub use dependency_graph::resolve;
pub use descriptor::{Descriptor, Metadata, INTERCEPTOR_KEY, POST_PROCESSOR_KEY};
pub use errors::{CreateErrorKind, DFSErrorKind, InstantiateErrorKind, InstantiatorErrorKind, InterceptErrorKind, ResolveErrorKind};
pub use instantiator::{instance, Dependencies, Instantiator};
pub use interceptor::{build_chain, entries_by_method, AdviceEntry, AdviceKind, Chain, ChainBuilder, Interceptor, Invocation, Proceed, Target};
pub use post_processor::PostProcessor;
pub use scope::Scope;
pub use token::Token;

pub use async_trait::async_trait;
