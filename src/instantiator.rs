use std::{any::type_name, future::Future, sync::Arc};

use anyhow::anyhow;
use tracing::debug;

use crate::{any::Instance, errors::InstantiateErrorKind, token::Token, utils::future::BoxFuture};

/// Resolved dependency values, in the order the descriptor declared them.
///
/// A missing optional dependency is kept in place as `None`, so positions always match the declaration.
#[derive(Clone, Default)]
pub struct Dependencies {
    entries: Vec<(Token, Option<Instance>)>,
}

impl Dependencies {
    #[inline]
    #[must_use]
    pub(crate) fn new(entries: Vec<(Token, Option<Instance>)>) -> Self {
        Self { entries }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn token(&self, index: usize) -> Option<&Token> {
        self.entries.get(index).map(|(token, _)| token)
    }

    #[inline]
    #[must_use]
    pub fn instance(&self, index: usize) -> Option<&Instance> {
        self.entries.get(index).and_then(|(_, instance)| instance.as_ref())
    }

    /// Gets a present dependency by position.
    ///
    /// # Errors
    /// Fails if the position is out of range, the dependency is absent or has another type.
    pub fn get<T: Send + Sync + 'static>(&self, index: usize) -> anyhow::Result<Arc<T>> {
        self.optional(index)?.ok_or_else(|| {
            let token = self.entries[index].0.clone();
            anyhow!("Dependency `{token}` at position {index} is absent")
        })
    }

    /// Gets a dependency that may be absent by position.
    ///
    /// # Errors
    /// Fails if the position is out of range or the dependency has another type.
    pub fn optional<T: Send + Sync + 'static>(&self, index: usize) -> anyhow::Result<Option<Arc<T>>> {
        let Some((token, instance)) = self.entries.get(index) else {
            return Err(anyhow!("No dependency at position {index}, declared {}", self.entries.len()));
        };
        match instance {
            Some(instance) => instance
                .clone()
                .downcast::<T>()
                .map(Some)
                .map_err(|_| anyhow!("Dependency `{token}` at position {index} isn't `{}`", type_name::<T>())),
            None => Ok(None),
        }
    }

    #[inline]
    #[must_use]
    pub fn into_instances(self) -> Vec<Option<Instance>> {
        self.entries.into_iter().map(|(_, instance)| instance).collect()
    }
}

/// Construction function of a component.
///
/// Implemented for every `Fn(Dependencies) -> impl Future<Output = Result<T, E>>`,
/// so synchronous factories are written as `|deps| async move { ... }`.
pub trait Instantiator: Send + Sync + 'static {
    type Provides: Send + Sync + 'static;
    type Error: Into<InstantiateErrorKind>;

    fn instantiate(&self, dependencies: Dependencies) -> impl Future<Output = Result<Self::Provides, Self::Error>> + Send;
}

impl<F, Fut, Response, Err> Instantiator for F
where
    F: Fn(Dependencies) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, Err>> + Send,
    Response: Send + Sync + 'static,
    Err: Into<InstantiateErrorKind>,
{
    type Provides = Response;
    type Error = Err;

    #[inline]
    fn instantiate(&self, dependencies: Dependencies) -> impl Future<Output = Result<Self::Provides, Self::Error>> + Send {
        self(dependencies)
    }
}

#[derive(Clone)]
pub(crate) struct BoxedCloneInstantiator(
    Arc<dyn Fn(Dependencies) -> BoxFuture<'static, Result<Instance, InstantiateErrorKind>> + Send + Sync>,
);

impl BoxedCloneInstantiator {
    #[inline]
    pub(crate) fn call(&self, dependencies: Dependencies) -> BoxFuture<'static, Result<Instance, InstantiateErrorKind>> {
        (self.0)(dependencies)
    }
}

#[must_use]
pub(crate) fn boxed_instantiator<Inst>(instantiator: Inst) -> BoxedCloneInstantiator
where
    Inst: Instantiator,
{
    let instantiator = Arc::new(instantiator);
    BoxedCloneInstantiator(Arc::new(move |dependencies| {
        let instantiator = instantiator.clone();
        Box::pin(async move {
            let dependency = instantiator.instantiate(dependencies).await.map_err(Into::into)?;

            debug!("Constructed");

            Ok(Arc::new(dependency) as Instance)
        })
    }))
}

/// Wrapper to create an instantiator that just returns passed value.
/// It can be used when the value was created outside the container.
#[inline]
#[must_use]
pub fn instance<T: Clone + Send + Sync + 'static>(val: T) -> impl Instantiator<Provides = T, Error = InstantiateErrorKind> {
    move |_: Dependencies| {
        let val = val.clone();
        async move { Ok::<_, InstantiateErrorKind>(val) }
    }
}
