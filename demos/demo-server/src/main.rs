use stanza::prelude::*;

mod modules;

use modules::greeting::{GreetingApi, GreetingService};
use modules::user::{UserApi, UserService};

/// The single route group of this demo.
struct AppRoute;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    tracing::info!("starting demo server");

    // 1. Register services
    let store = Arc::new(Store::new());
    store.define_injectable::<GreetingService>();
    store.define_injectable::<UserService>();

    // 2. Register controllers and the route group
    modules::greeting::register(&store);
    modules::user::register(&store);
    RouteGroup::<AppRoute>::new()
        .api::<GreetingApi>()
        .api::<UserApi>()
        .middleware(request_logger())
        .register(&store);

    // 3. Compile the route table
    let mut router = Router::new(store);
    router.attach("/api/v1", &[Target::of::<AppRoute>()])?;
    let app = router.finish();

    // 4. Serve
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "4000".to_string());
    let listener = tokio::net::TcpListener::bind(format!("{host}:{port}")).await?;

    tracing::info!("server is up; visit http://127.0.0.1:{port}/api/v1/greetings/world");
    axum::serve(listener, app).await?;
    Ok(())
}

fn request_logger() -> Middleware {
    Middleware::new(|ctx, _res| {
        let line = format!("{} {}", ctx.method(), ctx.path());
        async move {
            tracing::info!("{line}");
            Ok(())
        }
    })
}
