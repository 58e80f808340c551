use std::{any::type_name, future::Future, sync::Arc};

use parking_lot::RwLock;
use tracing::{debug, debug_span, error, info, info_span, warn, Instrument as _};

use crate::{
    any::Instance,
    cache::Cache,
    dependency::Dependency,
    descriptor::{Descriptor, POST_PROCESSOR_KEY},
    errors::{CreateErrorKind, InstantiateErrorKind, InstantiatorErrorKind, ResolveErrorKind},
    instantiator::Dependencies,
    interceptor::{AdviceEntry, Chain, ChainBuilder, Interceptor, Target},
    post_processor::PostProcessor,
    registry::Registry,
    token::Token,
    utils::future::BoxFuture,
};

#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

struct ContainerInner {
    registry: Registry,
    cache: Cache,
    post_processors: RwLock<Vec<Arc<dyn PostProcessor>>>,
}

impl Container {
    /// Creates a container from the descriptors produced by the front-end.
    ///
    /// The descriptors are ordered by their dependencies and validated, then singleton post-processors
    /// are built and registered, then eager components are built, all in resolution order.
    /// Every call creates an independent container with its own singleton cache.
    ///
    /// # Errors
    /// - Returns [`CreateErrorKind::Dfs`] if the dependencies contain a cycle
    /// - Returns [`CreateErrorKind::MissingDependency`] if a required dependency isn't registered
    /// - Returns [`CreateErrorKind::Instantiate`] if a post-processor or an eager component can't be built
    pub fn create(descriptors: impl IntoIterator<Item = Descriptor>) -> impl Future<Output = Result<Self, CreateErrorKind>> + Send {
        let descriptors: Vec<Descriptor> = descriptors.into_iter().collect();
        Self::build(descriptors).instrument(info_span!("create"))
    }

    async fn build(descriptors: Vec<Descriptor>) -> Result<Self, CreateErrorKind> {
        let registry = Registry::new(descriptors)?;
        let container = Self {
            inner: Arc::new(ContainerInner {
                cache: Cache::new(registry.len()),
                registry,
                post_processors: RwLock::new(Vec::new()),
            }),
        };

        container.register_post_processors().await?;
        let eager = container.instantiate_eager().await?;

        let post_processors = container.inner.post_processors.read().len();
        info!(
            components = container.inner.registry.len(),
            eager, post_processors, "Container created"
        );
        Ok(container)
    }

    /// Gets the instance registered under `token`, building it if needed.
    ///
    /// # Notes
    /// Singletons are built at most once and the cached, post-processed instance is returned on every call.
    /// Prototypes are built and post-processed anew on every call.
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::NoSuchBean`] if nothing is registered under `token`
    /// - Returns [`ResolveErrorKind::Instantiator`] if the component or one of its dependencies can't be built.
    ///   The container stays usable and a failed singleton is built again on the next call.
    pub async fn get(&self, token: &Token) -> Result<Instance, ResolveErrorKind> {
        let span = debug_span!("get", token = %token);

        let Some(position) = self.inner.registry.position(token) else {
            let err = ResolveErrorKind::NoSuchBean { token: token.clone() };
            span.in_scope(|| error!("{}", err));
            return Err(err);
        };

        self.resolve_at(position).instrument(span).await
    }

    /// Gets the instance registered under the type token of `T`.
    ///
    /// # Errors
    /// Same as [`Self::get`], and [`ResolveErrorKind::IncorrectType`] if the final instance isn't `T`,
    /// which can happen when a post-processor substitutes it.
    pub async fn get_typed<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ResolveErrorKind> {
        let token = Token::of::<T>();
        let instance = self.get(&token).await?;

        instance.downcast::<T>().map_err(|_| {
            let err = ResolveErrorKind::IncorrectType {
                token,
                expected: type_name::<T>(),
            };
            error!("{}", err);
            err
        })
    }

    /// Composes the chain of `method` from its advice entries, resolving every interceptor through this container.
    /// Entries for other methods are ignored.
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::NoSuchBean`] if an interceptor isn't registered
    /// - Returns [`ResolveErrorKind::NotInterceptor`] if a component isn't registered as an interceptor
    /// - Returns any error of building the interceptor itself
    pub async fn build_chain(&self, method: &str, entries: &[AdviceEntry], target: Target) -> Result<Chain, ResolveErrorKind> {
        let mut builder = ChainBuilder::new(method);
        for entry in entries.iter().filter(|entry| entry.method_name == method) {
            let interceptor = self.interceptor(&entry.interceptor_token).await?;
            builder = builder.advice(entry, interceptor);
        }
        Ok(builder.build(target))
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, token: &Token) -> bool {
        self.inner.registry.position(token).is_some()
    }

    #[inline]
    #[must_use]
    pub fn descriptor(&self, token: &Token) -> Option<&Descriptor> {
        self.inner.registry.position(token).map(|position| &self.inner.registry[position])
    }

    /// Registered tokens in resolution order: every dependency precedes its dependents.
    #[inline]
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.inner.registry.iter().map(Descriptor::token)
    }

    /// Count of singletons built so far.
    #[inline]
    #[must_use]
    pub fn cached_len(&self) -> usize {
        self.inner.cache.len()
    }
}

impl Container {
    async fn register_post_processors(&self) -> Result<(), ResolveErrorKind> {
        for (position, descriptor) in self.inner.registry.iter().enumerate() {
            let Some(caster) = descriptor.post_processor else {
                if descriptor.metadata.is_flagged(POST_PROCESSOR_KEY) {
                    let err = ResolveErrorKind::NotPostProcessor {
                        token: descriptor.token.clone(),
                    };
                    error!("{}", err);
                    return Err(err);
                }
                continue;
            };
            if !descriptor.config.scope.is_cached() {
                warn!(token = %descriptor.token, "Post-processor isn't a singleton, ignored");
                continue;
            }

            // The capability is taken from the factory's own instance, earlier post-processors may substitute it
            let mut constructed = None;
            let slot = &mut constructed;
            let instance = self
                .inner
                .cache
                .cell(position)
                .get_or_try_init(|| async move {
                    let instance = self.construct(descriptor).await?;
                    *slot = caster(&instance);
                    let instance = self.post_process(descriptor, instance)?;
                    debug!(token = %descriptor.token, "Cached");
                    Ok::<_, ResolveErrorKind>(instance)
                })
                .await?;

            let Some(post_processor) = constructed.or_else(|| caster(instance)) else {
                let err = ResolveErrorKind::IncorrectType {
                    token: descriptor.token.clone(),
                    expected: type_name::<dyn PostProcessor>(),
                };
                error!("{}", err);
                return Err(err);
            };

            self.inner.post_processors.write().push(post_processor);
            debug!(token = %descriptor.token, "Post-processor registered");
        }
        Ok(())
    }

    async fn instantiate_eager(&self) -> Result<usize, ResolveErrorKind> {
        let mut count = 0;
        for (position, descriptor) in self.inner.registry.iter().enumerate() {
            if !descriptor.config.eager {
                continue;
            }

            // An eager prototype is built once to surface its failures, the instance is dropped
            self.resolve_at(position)
                .instrument(debug_span!("eager", token = %descriptor.token))
                .await?;
            count += 1;
        }
        Ok(count)
    }

    async fn interceptor(&self, token: &Token) -> Result<Arc<dyn Interceptor>, ResolveErrorKind> {
        let Some(position) = self.inner.registry.position(token) else {
            let err = ResolveErrorKind::NoSuchBean { token: token.clone() };
            error!("{}", err);
            return Err(err);
        };
        let Some(caster) = self.inner.registry[position].interceptor else {
            let err = ResolveErrorKind::NotInterceptor { token: token.clone() };
            error!("{}", err);
            return Err(err);
        };

        let instance = self.resolve_at(position).await?;
        caster(&instance).ok_or_else(|| {
            let err = ResolveErrorKind::IncorrectType {
                token: token.clone(),
                expected: type_name::<dyn Interceptor>(),
            };
            error!("{}", err);
            err
        })
    }

    fn resolve_at(&self, position: usize) -> BoxFuture<'_, Result<Instance, ResolveErrorKind>> {
        Box::pin(async move {
            let descriptor = &self.inner.registry[position];
            if !descriptor.config.scope.is_cached() {
                return self.instantiate(descriptor).await;
            }

            if let Some(instance) = self.inner.cache.get(position) {
                debug!(token = %descriptor.token, "Found in cache");
                return Ok(instance);
            }
            debug!(token = %descriptor.token, "Not found in cache");

            // Concurrent callers wait for the one that builds the instance
            let instance = self
                .inner
                .cache
                .cell(position)
                .get_or_try_init(|| async {
                    let instance = self.instantiate(descriptor).await?;
                    debug!(token = %descriptor.token, "Cached");
                    Ok::<_, ResolveErrorKind>(instance)
                })
                .await?;
            Ok(instance.clone())
        })
    }

    async fn instantiate(&self, descriptor: &Descriptor) -> Result<Instance, ResolveErrorKind> {
        let instance = self.construct(descriptor).await?;
        self.post_process(descriptor, instance)
    }

    async fn construct(&self, descriptor: &Descriptor) -> Result<Instance, ResolveErrorKind> {
        debug!(token = %descriptor.token, scope = descriptor.config.scope.name(), "Instantiating");

        let mut dependencies = Vec::with_capacity(descriptor.dependencies.len());
        for Dependency { token, optional } in &descriptor.dependencies {
            let instance = match self.inner.registry.position(token) {
                Some(position) => Some(
                    self.resolve_at(position)
                        .await
                        .map_err(|err| instantiator_error(descriptor, InstantiatorErrorKind::Deps(Box::new(err))))?,
                ),
                None if *optional => {
                    debug!(dependency = %token, "Optional dependency is absent");
                    None
                }
                None => {
                    let err = ResolveErrorKind::NoSuchBean { token: token.clone() };
                    error!("{}", err);
                    return Err(instantiator_error(descriptor, InstantiatorErrorKind::Deps(Box::new(err))));
                }
            };
            dependencies.push((token.clone(), instance));
        }

        descriptor
            .instantiator
            .call(Dependencies::new(dependencies))
            .await
            .map_err(|err| {
                let err = instantiator_error(descriptor, InstantiatorErrorKind::Factory(err));
                error!("{}", err);
                err
            })
    }

    fn post_process(&self, descriptor: &Descriptor, mut instance: Instance) -> Result<Instance, ResolveErrorKind> {
        let post_processors = self.inner.post_processors.read().clone();
        let post_processor_error = |err: anyhow::Error| {
            let err = instantiator_error(descriptor, InstantiatorErrorKind::PostProcessor(InstantiateErrorKind::Custom(err)));
            error!("{}", err);
            err
        };
        for post_processor in &post_processors {
            instance = post_processor.before_init(instance, descriptor).map_err(post_processor_error)?;
        }
        for post_processor in &post_processors {
            instance = post_processor.after_init(instance, descriptor).map_err(post_processor_error)?;
        }
        if !post_processors.is_empty() {
            debug!(token = %descriptor.token, count = post_processors.len(), "Post-processed");
        }

        Ok(instance)
    }
}

fn instantiator_error(
    descriptor: &Descriptor,
    source: InstantiatorErrorKind<Box<ResolveErrorKind>, InstantiateErrorKind>,
) -> ResolveErrorKind {
    ResolveErrorKind::Instantiator {
        token: descriptor.token.clone(),
        source,
    }
}
