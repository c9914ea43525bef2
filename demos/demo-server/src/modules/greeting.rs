use stanza::prelude::*;

pub struct GreetingService;

impl Injectable for GreetingService {
    fn construct(_deps: &Deps<'_>) -> Result<Self> {
        Ok(Self)
    }
}

impl GreetingService {
    pub fn greet(&self, name: &str) -> String {
        format!("Hello, {name}!")
    }
}

pub struct GreetingApi {
    service: Arc<GreetingService>,
}

impl Injectable for GreetingApi {
    fn dependencies() -> Vec<Target> {
        vec![Target::of::<GreetingService>()]
    }

    fn construct(deps: &Deps<'_>) -> Result<Self> {
        Ok(Self { service: deps.get(0)? })
    }
}

pub fn register(store: &Store) {
    Api::<GreetingApi>::new("/greetings")
        .member(
            Member::new("greet", |api: Arc<GreetingApi>, args: Args| async move {
                let name = args.string(0).unwrap_or_else(|| "stranger".to_string());
                Ok(Reply::from(api.service.greet(&name)))
            })
            .get("/{name}")
            .param(0, ParamSource::PathParams, Some("name")),
        )
        .register(store);
}
