use lambda_http::{run, service_fn, Error};
use std::sync::Arc;

use items_api::{config, lambda, logger, store};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let cfg = config::Config::load()?;
    logger::init(&cfg.logging)?;

    let item_store = store::build_store(&cfg.store).await?;
    let state = Arc::new(config::AppState::new(cfg, item_store));

    run(service_fn(|event| {
        let state = Arc::clone(&state);
        async move { lambda::handle_event(event, &state).await }
    }))
    .await
}
