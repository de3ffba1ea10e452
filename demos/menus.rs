//! Menu API demo: one controller, two routes, one of them multi-verb.
//!
//! ```sh
//! cargo run --example menus
//! curl http://127.0.0.1:8080/menus
//! curl -X PATCH http://127.0.0.1:8080/menus/update -d '{"name":"blog","value":"Blog"}'
//! ```

use std::sync::Mutex;

use bitroute::dispatch::Dispatcher;
use bitroute::reply::Reply;
use bitroute::router::{MethodMask, RouteDeclaration, RouteProvider};
use bitroute::server::Server;
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Deserialize)]
struct MenuUpdate {
    name: String,
    #[serde(default)]
    value: Value,
}

struct MenuController {
    menus: std::sync::Arc<Mutex<Value>>,
}

impl MenuController {
    fn new() -> Self {
        Self {
            menus: std::sync::Arc::new(Mutex::new(json!({
                "home": "Home",
                "about_us": "About us",
                "contact": "Contact"
            }))),
        }
    }
}

impl RouteProvider for MenuController {
    fn routes(&self) -> Vec<RouteDeclaration> {
        let menus = self.menus.clone();
        let index = RouteDeclaration::new("/menus", MethodMask::GET, move |_payload| {
            Reply::json(json!({"menus": menus.lock().unwrap().clone()}))
        });

        let menus = self.menus.clone();
        let update = RouteDeclaration::new(
            "/menus/update",
            MethodMask::PUT | MethodMask::PATCH,
            move |payload| {
                let Ok(update) = serde_json::from_value::<MenuUpdate>(Value::Object(payload))
                else {
                    return Reply::json(json!({"message": "Menu was not found"}));
                };
                let mut menus = menus.lock().unwrap();
                menus[update.name.as_str()] = update.value;
                Reply::json(json!({"menus": menus.clone()}))
            },
        );

        vec![index, update]
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bitroute=debug".into()),
        )
        .init();

    let dispatcher = Dispatcher::from_providers(&[&MenuController::new()]);
    let server = Server::bind("127.0.0.1:8080").await?;
    println!("Listening on http://{}", server.local_addr());
    server.serve(dispatcher).await?;
    Ok(())
}
