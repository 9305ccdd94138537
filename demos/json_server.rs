//! JSON Server - answers every request with a small JSON document.
//!
//! This example demonstrates:
//! - Binding a server with the builder pattern
//! - Inspecting the request line from a handler
//! - Replacing a preset `content-type` with `json()`
//!
//! # Running
//!
//! ```text
//! RUST_LOG=debug cargo run --example json_server
//! curl -i http://localhost:3000/anything
//! ```

use httpwire::{Request, ResponseWriter, Server};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Body sent for every request.
#[derive(Serialize, Debug)]
struct Status {
    status: u16,
    text: &'static str,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let server = Server::builder()
        .server_name("my-custom-server")
        .bind("0.0.0.0:3000")
        .await?;

    tracing::info!("Listening on {}", server.local_addr()?);

    server
        .serve(|req: Request, mut res: ResponseWriter| async move {
            tracing::info!("{} - {}", req.method(), req.url());

            // json() overrides this with application/json
            res.set_header("content-type", "text/plain");
            res.json(&Status {
                status: 200,
                text: "success",
            })
            .await
        })
        .await?;

    Ok(())
}
