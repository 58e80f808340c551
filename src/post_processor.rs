use std::sync::Arc;

use crate::{any::Instance, descriptor::Descriptor};

/// Hook invoked around the construction of every component.
///
/// For each instantiation the container first runs `before_init` of every registered post-processor,
/// then `after_init` of every registered post-processor, both in registration order.
/// Returning another value substitutes it as the current instance for the rest of the pipeline.
pub trait PostProcessor: Send + Sync {
    #[allow(unused_variables)]
    fn before_init(&self, instance: Instance, descriptor: &Descriptor) -> anyhow::Result<Instance> {
        Ok(instance)
    }

    #[allow(unused_variables)]
    fn after_init(&self, instance: Instance, descriptor: &Descriptor) -> anyhow::Result<Instance> {
        Ok(instance)
    }
}

pub(crate) type PostProcessorCaster = fn(&Instance) -> Option<Arc<dyn PostProcessor>>;

pub(crate) fn cast_post_processor<T: PostProcessor + 'static>(instance: &Instance) -> Option<Arc<dyn PostProcessor>> {
    instance.clone().downcast::<T>().ok().map(|val| val as Arc<dyn PostProcessor>)
}

#[cfg(test)]
mod tests {
    use super::{cast_post_processor, PostProcessor};
    use crate::{any::Instance, instance, Descriptor, Token};

    use std::sync::Arc;

    struct Noop;

    impl PostProcessor for Noop {}

    #[test]
    fn test_cast_post_processor() {
        let noop: Instance = Arc::new(Noop);
        let other: Instance = Arc::new(1u8);

        assert!(cast_post_processor::<Noop>(&noop).is_some());
        assert!(cast_post_processor::<Noop>(&other).is_none());
    }

    #[test]
    fn test_default_hooks_pass_through() {
        let descriptor = Descriptor::new(Token::of::<u8>(), instance(1u8));
        let value: Instance = Arc::new(1u8);

        let before = Noop.before_init(value.clone(), &descriptor).unwrap();
        let after = Noop.after_init(before, &descriptor).unwrap();

        assert!(Arc::ptr_eq(&value, &after));
    }
}
