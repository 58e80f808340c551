//! Method interception: advice entries composed into a single invocable [`Chain`].
//!
//! A chain runs `Around` advice outermost first. The innermost layer runs every `Before` advice,
//! the target, then every `After` advice. Within each kind, advice with an explicit order runs first,
//! ascending; advice without an order follows in declaration order.

use std::{
    any::type_name,
    borrow::Cow,
    collections::BTreeMap,
    fmt::{self, Debug, Formatter},
    future::Future,
    sync::Arc,
};

use async_trait::async_trait;
use tracing::{debug, error, Instrument as _};

use crate::{any::Instance, errors::InterceptErrorKind, token::Token, utils::future::BoxFuture};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AdviceKind {
    Before,
    Around,
    After,
}

/// One piece of advice attached to a method, as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdviceEntry {
    pub method_name: Cow<'static, str>,
    pub interceptor_token: Token,
    pub kind: AdviceKind,
    pub order: Option<i32>,
}

impl AdviceEntry {
    #[must_use]
    pub fn new(method_name: impl Into<Cow<'static, str>>, interceptor_token: impl Into<Token>, kind: AdviceKind) -> Self {
        Self {
            method_name: method_name.into(),
            interceptor_token: interceptor_token.into(),
            kind,
            order: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn before(method_name: impl Into<Cow<'static, str>>, interceptor_token: impl Into<Token>) -> Self {
        Self::new(method_name, interceptor_token, AdviceKind::Before)
    }

    #[inline]
    #[must_use]
    pub fn around(method_name: impl Into<Cow<'static, str>>, interceptor_token: impl Into<Token>) -> Self {
        Self::new(method_name, interceptor_token, AdviceKind::Around)
    }

    #[inline]
    #[must_use]
    pub fn after(method_name: impl Into<Cow<'static, str>>, interceptor_token: impl Into<Token>) -> Self {
        Self::new(method_name, interceptor_token, AdviceKind::After)
    }

    #[inline]
    #[must_use]
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }
}

/// Groups a component's advice table by method name, keeping declaration order inside each group.
#[must_use]
pub fn entries_by_method<'a>(entries: impl IntoIterator<Item = &'a AdviceEntry>) -> BTreeMap<Cow<'static, str>, Vec<AdviceEntry>> {
    let mut methods: BTreeMap<Cow<'static, str>, Vec<AdviceEntry>> = BTreeMap::new();
    for entry in entries {
        methods.entry(entry.method_name.clone()).or_default().push(entry.clone());
    }
    methods
}

/// Call of an intercepted method: its name and arguments.
#[derive(Clone)]
pub struct Invocation {
    method: Arc<str>,
    args: Arc<[Instance]>,
}

impl Invocation {
    #[must_use]
    pub fn new(method: impl Into<Arc<str>>, args: Vec<Instance>) -> Self {
        Self {
            method: method.into(),
            args: args.into(),
        }
    }

    #[inline]
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    #[inline]
    #[must_use]
    pub fn args(&self) -> &[Instance] {
        &self.args
    }

    #[inline]
    #[must_use]
    pub fn arg<T: Send + Sync + 'static>(&self, index: usize) -> Option<Arc<T>> {
        self.args.get(index).and_then(|arg| arg.clone().downcast().ok())
    }
}

impl Debug for Invocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("method", &self.method)
            .field("args", &self.args.len())
            .finish()
    }
}

/// Advice implementation. A component provides the hooks for the advice kinds it is attached with.
///
/// The default `around` just proceeds, `before` and `after` do nothing.
#[async_trait]
pub trait Interceptor: Send + Sync {
    async fn before(&self, _invocation: &Invocation) -> anyhow::Result<()> {
        Ok(())
    }

    /// Wraps the next inner layer. Not calling [`Proceed::proceed`] short-circuits the call,
    /// and the returned value becomes the result of the whole chain.
    async fn around(&self, _invocation: &Invocation, proceed: Proceed) -> anyhow::Result<Instance> {
        Ok(proceed.proceed().await?)
    }

    async fn after(&self, _invocation: &Invocation, _result: &Instance) -> anyhow::Result<()> {
        Ok(())
    }
}

pub(crate) type InterceptorCaster = fn(&Instance) -> Option<Arc<dyn Interceptor>>;

pub(crate) fn cast_interceptor<T: Interceptor + 'static>(instance: &Instance) -> Option<Arc<dyn Interceptor>> {
    instance.clone().downcast::<T>().ok().map(|val| val as Arc<dyn Interceptor>)
}

/// Core method behind a chain.
#[derive(Clone)]
pub struct Target(Arc<dyn Fn(Invocation) -> BoxFuture<'static, anyhow::Result<Instance>> + Send + Sync>);

impl Target {
    #[must_use]
    pub fn new<F, Fut, Response>(f: F) -> Self
    where
        F: Fn(Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Response>> + Send + 'static,
        Response: Send + Sync + 'static,
    {
        Self(Arc::new(move |invocation| {
            let fut = f(invocation);
            Box::pin(async move { fut.await.map(|response| Arc::new(response) as Instance) })
        }))
    }

    #[inline]
    fn call(&self, invocation: Invocation) -> BoxFuture<'static, anyhow::Result<Instance>> {
        (self.0)(invocation)
    }
}

/// Capability handed to `Around` advice to run the next inner layer.
pub struct Proceed {
    chain: Arc<ChainInner>,
    depth: usize,
    invocation: Invocation,
}

impl Proceed {
    #[inline]
    #[must_use]
    pub fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    /// Runs the next `Around` advice, or the `Before` advice, target and `After` advice if none remain.
    ///
    /// # Errors
    /// Returns the first failure of any inner layer.
    pub async fn proceed(self) -> Result<Instance, InterceptErrorKind> {
        self.chain.run(self.depth, self.invocation).await
    }
}

impl Debug for Proceed {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proceed")
            .field("method", &self.chain.method)
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}

struct Advice {
    token: Token,
    kind: AdviceKind,
    order: Option<i32>,
    interceptor: Arc<dyn Interceptor>,
}

struct ChainInner {
    method: Arc<str>,
    around: Box<[Advice]>,
    before: Box<[Advice]>,
    after: Box<[Advice]>,
    target: Target,
}

impl ChainInner {
    fn run(self: Arc<Self>, depth: usize, invocation: Invocation) -> BoxFuture<'static, Result<Instance, InterceptErrorKind>> {
        Box::pin(async move {
            let Some(advice) = self.around.get(depth) else {
                return self.run_innermost(invocation).await;
            };

            debug!(interceptor = %advice.token, depth, "Around");
            let proceed = Proceed {
                chain: self.clone(),
                depth: depth + 1,
                invocation: invocation.clone(),
            };
            advice
                .interceptor
                .around(&invocation, proceed)
                .await
                .map_err(|err| self.advice_error(advice, err))
        })
    }

    async fn run_innermost(&self, invocation: Invocation) -> Result<Instance, InterceptErrorKind> {
        for advice in self.before.iter() {
            debug!(interceptor = %advice.token, "Before");
            advice
                .interceptor
                .before(&invocation)
                .await
                .map_err(|err| self.advice_error(advice, err))?;
        }

        debug!("Target");
        let result = self.target.call(invocation.clone()).await.map_err(|source| {
            let err = InterceptErrorKind::Target {
                method: self.method.to_string(),
                source,
            };
            error!("{}", err);
            err
        })?;

        for advice in self.after.iter() {
            debug!(interceptor = %advice.token, "After");
            advice
                .interceptor
                .after(&invocation, &result)
                .await
                .map_err(|err| self.advice_error(advice, err))?;
        }

        Ok(result)
    }

    /// Failures coming up through `proceed` unchanged keep their origin, anything else is attributed to `advice`.
    /// A failure the advice wrapped with context stays whole as the source, so the context isn't lost.
    fn advice_error(&self, advice: &Advice, err: anyhow::Error) -> InterceptErrorKind {
        let bare = err.chain().next().is_some_and(|outer| outer.is::<InterceptErrorKind>());
        let source = if bare {
            match err.downcast::<InterceptErrorKind>() {
                Ok(err) => return err,
                Err(err) => err,
            }
        } else {
            err
        };

        let err = InterceptErrorKind::Advice {
            method: self.method.to_string(),
            interceptor: advice.token.clone(),
            kind: advice.kind,
            source,
        };
        error!("{}", err);
        err
    }
}

/// Composed wrapper around one method.
#[derive(Clone)]
pub struct Chain {
    inner: Arc<ChainInner>,
}

impl Chain {
    #[inline]
    #[must_use]
    pub fn method(&self) -> &str {
        &self.inner.method
    }

    /// Invokes the method through all of its advice.
    ///
    /// # Errors
    /// Returns the first failure of any advice or of the target. Nothing runs after it.
    pub async fn invoke(&self, args: Vec<Instance>) -> Result<Instance, InterceptErrorKind> {
        let invocation = Invocation::new(self.inner.method.clone(), args);
        self.inner
            .clone()
            .run(0, invocation)
            .instrument(tracing::debug_span!("invoke", method = %self.inner.method))
            .await
    }

    /// Same as [`Self::invoke`], with the result downcast to `T`.
    ///
    /// # Errors
    /// Besides chain failures, fails with [`InterceptErrorKind::Target`] if the result isn't `T`.
    pub async fn invoke_typed<T: Send + Sync + 'static>(&self, args: Vec<Instance>) -> Result<Arc<T>, InterceptErrorKind> {
        self.invoke(args).await?.downcast::<T>().map_err(|_| InterceptErrorKind::Target {
            method: self.inner.method.to_string(),
            source: anyhow::anyhow!("Result isn't `{}`", type_name::<T>()),
        })
    }
}

impl Debug for Chain {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let tokens = |advice: &[Advice]| advice.iter().map(|advice| advice.token.clone()).collect::<Vec<_>>();

        f.debug_struct("Chain")
            .field("method", &self.inner.method)
            .field("around", &tokens(&self.inner.around))
            .field("before", &tokens(&self.inner.before))
            .field("after", &tokens(&self.inner.after))
            .finish_non_exhaustive()
    }
}

/// Collects advice for one method and composes it into a [`Chain`].
pub struct ChainBuilder {
    method: Arc<str>,
    advice: Vec<Advice>,
}

impl ChainBuilder {
    #[inline]
    #[must_use]
    pub fn new(method: impl Into<Arc<str>>) -> Self {
        Self {
            method: method.into(),
            advice: Vec::new(),
        }
    }

    #[must_use]
    pub fn advice(mut self, entry: &AdviceEntry, interceptor: Arc<dyn Interceptor>) -> Self {
        self.advice.push(Advice {
            token: entry.interceptor_token.clone(),
            kind: entry.kind,
            order: entry.order,
            interceptor,
        });
        self
    }

    #[must_use]
    pub fn build(self, target: Target) -> Chain {
        let (mut around, mut before, mut after) = (Vec::new(), Vec::new(), Vec::new());
        for advice in self.advice {
            match advice.kind {
                AdviceKind::Around => around.push(advice),
                AdviceKind::Before => before.push(advice),
                AdviceKind::After => after.push(advice),
            }
        }
        for group in [&mut around, &mut before, &mut after] {
            // Stable, so declaration order breaks ties
            group.sort_by_key(|advice| match advice.order {
                Some(order) => (false, order),
                None => (true, 0),
            });
        }

        debug!(
            method = %self.method,
            around = around.len(),
            before = before.len(),
            after = after.len(),
            "Chain built"
        );

        Chain {
            inner: Arc::new(ChainInner {
                method: self.method,
                around: around.into(),
                before: before.into(),
                after: after.into(),
                target,
            }),
        }
    }
}

/// Composes `advice` for `method` around `target`. Entries for other methods are ignored.
#[must_use]
pub fn build_chain(
    method: impl Into<Arc<str>>,
    advice: impl IntoIterator<Item = (AdviceEntry, Arc<dyn Interceptor>)>,
    target: Target,
) -> Chain {
    let builder = ChainBuilder::new(method);
    let method = builder.method.clone();
    advice
        .into_iter()
        .filter(|(entry, _)| *entry.method_name == *method)
        .fold(builder, |builder, (entry, interceptor)| builder.advice(&entry, interceptor))
        .build(target)
}
