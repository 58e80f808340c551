use crate::scope::Scope;

/// Config for a descriptor
/// ## Fields
/// - `scope`:
///   Lifecycle of the provided instance. [`Scope::Singleton`] instances are cached and reused,
///   [`Scope::Prototype`] instances are built again on every resolution.
///
///   This does **not** affect the dependencies of the instance.
///   Only the final, post-processed result is cached if caching is applicable.
/// - `eager`:
///   If `true`, the instance is built while the container is created instead of on first lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub scope: Scope,
    pub eager: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scope: Scope::Singleton,
            eager: false,
        }
    }
}
