use std::{
    any::Any,
    borrow::Cow,
    collections::BTreeMap,
    fmt::{self, Debug, Formatter},
    sync::Arc,
};

use crate::{
    config::Config,
    dependency::Dependency,
    instantiator::{boxed_instantiator, BoxedCloneInstantiator, Instantiator},
    interceptor::{cast_interceptor, Interceptor, InterceptorCaster},
    post_processor::{cast_post_processor, PostProcessor, PostProcessorCaster},
    scope::Scope,
    token::Token,
};

/// Metadata key set to `true` on descriptors registered with [`Descriptor::as_post_processor`].
pub const POST_PROCESSOR_KEY: &str = "post_processor";
/// Metadata key set to `true` on descriptors registered with [`Descriptor::as_interceptor`].
pub const INTERCEPTOR_KEY: &str = "interceptor";

/// Free-form values attached to a descriptor by the front-end that produced it.
#[derive(Clone, Default)]
pub struct Metadata {
    entries: BTreeMap<Cow<'static, str>, Arc<dyn Any + Send + Sync>>,
}

impl Metadata {
    #[inline]
    pub fn insert<T: Send + Sync + 'static>(&mut self, key: impl Into<Cow<'static, str>>, value: T) {
        self.entries.insert(key.into(), Arc::new(value));
    }

    #[inline]
    #[must_use]
    pub fn get<T: 'static>(&self, key: &str) -> Option<&T> {
        self.entries.get(key).and_then(|value| value.downcast_ref())
    }

    #[inline]
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    #[inline]
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|key| &**key)
    }

    #[inline]
    #[must_use]
    pub fn is_flagged(&self, key: &str) -> bool {
        self.get::<bool>(key).copied().unwrap_or(false)
    }
}

impl Debug for Metadata {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.keys()).finish()
    }
}

/// Immutable description of how to build and manage one component.
#[derive(Clone)]
pub struct Descriptor {
    pub(crate) token: Token,
    pub(crate) config: Config,
    pub(crate) dependencies: Vec<Dependency>,
    pub(crate) instantiator: BoxedCloneInstantiator,
    pub(crate) metadata: Metadata,
    pub(crate) post_processor: Option<PostProcessorCaster>,
    pub(crate) interceptor: Option<InterceptorCaster>,
}

impl Descriptor {
    #[must_use]
    pub fn new<Inst: Instantiator>(token: impl Into<Token>, instantiator: Inst) -> Self {
        Self {
            token: token.into(),
            config: Config::default(),
            dependencies: Vec::new(),
            instantiator: boxed_instantiator(instantiator),
            metadata: Metadata::default(),
            post_processor: None,
            interceptor: None,
        }
    }

    /// Creates a descriptor registered under the type its instantiator provides.
    #[inline]
    #[must_use]
    pub fn of<Inst: Instantiator>(instantiator: Inst) -> Self {
        Self::new(Token::of::<Inst::Provides>(), instantiator)
    }

    #[inline]
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    #[inline]
    #[must_use]
    pub fn scope(mut self, scope: Scope) -> Self {
        self.config.scope = scope;
        self
    }

    #[inline]
    #[must_use]
    pub fn eager(mut self, eager: bool) -> Self {
        self.config.eager = eager;
        self
    }

    /// Declares the next required dependency. Resolved values are passed to the instantiator in declaration order.
    #[inline]
    #[must_use]
    pub fn depends_on(mut self, token: impl Into<Token>) -> Self {
        self.dependencies.push(Dependency::required(token));
        self
    }

    #[inline]
    #[must_use]
    pub fn depends_on_optional(mut self, token: impl Into<Token>) -> Self {
        self.dependencies.push(Dependency::optional(token));
        self
    }

    #[inline]
    #[must_use]
    pub fn with_metadata<T: Send + Sync + 'static>(mut self, key: impl Into<Cow<'static, str>>, value: T) -> Self {
        self.metadata.insert(key, value);
        self
    }

    /// Marks the component as a post-processor of type `T`.
    /// Only singleton post-processors take part in the pipeline.
    #[inline]
    #[must_use]
    pub fn as_post_processor<T: PostProcessor + 'static>(mut self) -> Self {
        self.post_processor = Some(cast_post_processor::<T>);
        self.with_metadata(POST_PROCESSOR_KEY, true)
    }

    /// Marks the component as an interceptor of type `T`, usable as advice in method chains.
    #[inline]
    #[must_use]
    pub fn as_interceptor<T: Interceptor + 'static>(mut self) -> Self {
        self.interceptor = Some(cast_interceptor::<T>);
        self.with_metadata(INTERCEPTOR_KEY, true)
    }
}

impl Descriptor {
    #[inline]
    #[must_use]
    pub fn token(&self) -> &Token {
        &self.token
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> Config {
        self.config
    }

    #[inline]
    #[must_use]
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    #[inline]
    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    #[inline]
    #[must_use]
    pub fn is_eager(&self) -> bool {
        self.config.eager
    }

    #[inline]
    #[must_use]
    pub fn is_post_processor(&self) -> bool {
        self.post_processor.is_some()
    }

    #[inline]
    #[must_use]
    pub fn is_interceptor(&self) -> bool {
        self.interceptor.is_some()
    }
}

impl Debug for Descriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("token", &self.token)
            .field("config", &self.config)
            .field("dependencies", &self.dependencies)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}
