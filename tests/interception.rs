use beanstalk::{
    async_trait, entries_by_method, instance, AdviceEntry, Container, Dependencies, Descriptor, Instance, InterceptErrorKind, Interceptor,
    Invocation, Proceed, ResolveErrorKind, Target, Token,
};
use parking_lot::Mutex;
use std::{collections::HashMap, sync::Arc};

type Log = Arc<Mutex<Vec<String>>>;

struct Tracer {
    name: &'static str,
    log: Log,
}

#[async_trait]
impl Interceptor for Tracer {
    async fn before(&self, _invocation: &Invocation) -> anyhow::Result<()> {
        self.log.lock().push(format!("{}:before", self.name));
        Ok(())
    }

    async fn around(&self, _invocation: &Invocation, proceed: Proceed) -> anyhow::Result<Instance> {
        self.log.lock().push(format!("{}:enter", self.name));
        let result = proceed.proceed().await?;
        self.log.lock().push(format!("{}:exit", self.name));
        Ok(result)
    }

    async fn after(&self, _invocation: &Invocation, _result: &Instance) -> anyhow::Result<()> {
        self.log.lock().push(format!("{}:after", self.name));
        Ok(())
    }
}

/// Answers repeated calls from memory without reaching the target.
struct Memoizer {
    answers: Mutex<HashMap<u32, Instance>>,
}

#[async_trait]
impl Interceptor for Memoizer {
    async fn around(&self, invocation: &Invocation, proceed: Proceed) -> anyhow::Result<Instance> {
        let key = *invocation.arg::<u32>(0).ok_or_else(|| anyhow::anyhow!("Missing argument"))?;
        let cached = self.answers.lock().get(&key).cloned();
        if let Some(answer) = cached {
            return Ok(answer);
        }

        let answer = proceed.proceed().await?;
        self.answers.lock().insert(key, answer.clone());
        Ok(answer)
    }
}

fn tracer(token: &'static str, log: &Log) -> Descriptor {
    let log = log.clone();
    Descriptor::new(token, move |_: Dependencies| {
        let log = log.clone();
        async move { Ok::<_, anyhow::Error>(Tracer { name: token, log }) }
    })
    .as_interceptor::<Tracer>()
}

fn recording_target(log: &Log) -> Target {
    let log = log.clone();
    Target::new(move |invocation: Invocation| {
        let log = log.clone();
        async move {
            log.lock().push(String::from("target"));
            let value = invocation.arg::<u32>(0).map_or(0, |value| *value);
            Ok(value * 2)
        }
    })
}

#[tokio::test]
async fn test_advice_order() {
    let log = Log::default();
    let container = Container::create([
        tracer("around", &log),
        tracer("first", &log),
        tracer("second", &log),
        tracer("audit", &log),
    ])
    .await
    .unwrap();
    let entries = [
        AdviceEntry::after("transfer", "audit"),
        AdviceEntry::before("transfer", "second").with_order(2),
        AdviceEntry::around("transfer", "around").with_order(1),
        AdviceEntry::before("transfer", "first").with_order(1),
    ];

    let chain = container
        .build_chain("transfer", &entries, recording_target(&log))
        .await
        .unwrap();
    let result = chain.invoke_typed::<u32>(vec![Arc::new(21u32) as Instance]).await.unwrap();

    assert_eq!(*result, 42);
    assert_eq!(
        *log.lock(),
        ["around:enter", "first:before", "second:before", "target", "audit:after", "around:exit"]
    );
}

#[tokio::test]
async fn test_chains_per_method() {
    let log = Log::default();
    let container = Container::create([tracer("audit", &log), tracer("metrics", &log)]).await.unwrap();
    let entries = [
        AdviceEntry::before("deposit", "audit"),
        AdviceEntry::before("withdraw", "metrics"),
        AdviceEntry::after("withdraw", "audit"),
    ];
    let methods = entries_by_method(&entries);

    let mut chains = Vec::new();
    for (method, entries) in &methods {
        chains.push(container.build_chain(method, entries, recording_target(&log)).await.unwrap());
    }
    for chain in &chains {
        chain.invoke(vec![Arc::new(1u32) as Instance]).await.unwrap();
    }

    assert_eq!(methods.len(), 2);
    assert_eq!(chains[0].method(), "deposit");
    assert_eq!(
        *log.lock(),
        ["audit:before", "target", "metrics:before", "target", "audit:after"]
    );
}

#[tokio::test]
async fn test_short_circuit_with_singleton_interceptor() {
    let log = Log::default();
    let container = Container::create([Descriptor::of(|_: Dependencies| async {
        Ok::<_, anyhow::Error>(Memoizer {
            answers: Mutex::default(),
        })
    })
    .as_interceptor::<Memoizer>()])
    .await
    .unwrap();
    let entries = [AdviceEntry::around("double", Token::of::<Memoizer>())];

    let first = container
        .build_chain("double", &entries, recording_target(&log))
        .await
        .unwrap();
    let second = container
        .build_chain("double", &entries, recording_target(&log))
        .await
        .unwrap();

    assert_eq!(*first.invoke_typed::<u32>(vec![Arc::new(4u32) as Instance]).await.unwrap(), 8);
    assert_eq!(*second.invoke_typed::<u32>(vec![Arc::new(4u32) as Instance]).await.unwrap(), 8);
    assert_eq!(*second.invoke_typed::<u32>(vec![Arc::new(5u32) as Instance]).await.unwrap(), 10);
    // Both chains share the singleton interceptor and its memory
    assert_eq!(log.lock().len(), 2);
}

#[tokio::test]
async fn test_target_failure_propagates_through_around() {
    let log = Log::default();
    let container = Container::create([tracer("around", &log), tracer("audit", &log)]).await.unwrap();
    let entries = [AdviceEntry::around("load", "around"), AdviceEntry::after("load", "audit")];

    let chain = container
        .build_chain(
            "load",
            &entries,
            Target::new(|_: Invocation| async { Err::<(), _>(anyhow::anyhow!("not found")) }),
        )
        .await
        .unwrap();
    let err = chain.invoke(Vec::new()).await.err().unwrap();

    assert!(matches!(err, InterceptErrorKind::Target { .. }));
    assert_eq!(err.method(), "load");
    assert_eq!(*log.lock(), ["around:enter"]);
}

#[tokio::test]
async fn test_unresolvable_interceptors() {
    let log = Log::default();
    let container = Container::create([tracer("audit", &log), Descriptor::new("plain", instance(()))])
        .await
        .unwrap();

    let missing = container
        .build_chain("load", &[AdviceEntry::before("load", "missing")], recording_target(&log))
        .await
        .err()
        .unwrap();
    let plain = container
        .build_chain("load", &[AdviceEntry::before("load", "plain")], recording_target(&log))
        .await
        .err()
        .unwrap();
    let ignored = container
        .build_chain("load", &[AdviceEntry::before("store", "missing")], recording_target(&log))
        .await;

    assert!(matches!(missing, ResolveErrorKind::NoSuchBean { .. }));
    assert!(matches!(plain, ResolveErrorKind::NotInterceptor { ref token } if *token == Token::named("plain")));
    assert!(ignored.is_ok());
}
