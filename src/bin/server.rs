//! Oracle Ball prediction server
//!
//! Configuration comes from the environment, see `ServerSettings`.

#[cfg(not(target_arch = "wasm32"))]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use std::net::SocketAddr;
    use std::sync::Arc;

    use anyhow::Context;
    use oracle_ball::server::{AppState, Oracle, build_router, load_settings};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = load_settings();
    let oracle = Oracle::from_settings(&settings, rand::random())
        .context("failed to configure the Gemini client")?;

    if oracle.gemini_configured() {
        log::info!("Gemini model: {}", settings.gemini_model);
    } else {
        log::warn!("GEMINI_API_KEY not found, using fallback responses");
    }
    if let Some(dir) = &settings.static_dir {
        log::info!("Serving front-end from {}", dir.display());
    }

    let state = AppState::new(oracle).with_static_dir(settings.static_dir.clone());
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings
        .bind
        .parse()
        .with_context(|| format!("invalid bind address {:?}", settings.bind))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    log::info!("Oracle Ball server listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {}
