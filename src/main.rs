use anyhow::{Context, Result};
use chargesim::collector::HttpCollector;
use chargesim::logging::{get_logger, init_logging};
use chargesim::{Config, SessionMachine};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    init_logging(&config.logging).context("Failed to initialize logging")?;
    let logger = get_logger("main");
    logger.info(&format!("chargesim {} starting up", env!("APP_VERSION")));

    let collector = Arc::new(
        HttpCollector::new(&config.collector).context("Failed to create collector client")?,
    );
    let (machine, handle) = SessionMachine::new(&config.simulation, collector)
        .context("Failed to create session machine")?;
    let machine_task = tokio::spawn(machine.run());

    let web_task = if config.web.enabled {
        let web_handle = handle.clone();
        let host = config.web.host.clone();
        let port = config.web.port;
        Some(tokio::spawn(async move {
            if let Err(e) = chargesim::web::serve(web_handle, &host, port).await {
                get_logger("web").error(&format!("Web server error: {}", e));
            }
        }))
    } else {
        logger.info("Control surface disabled");
        None
    };

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    logger.info("Shutdown requested");

    if let Some(task) = web_task {
        task.abort();
    }
    if let Err(e) = handle.shutdown() {
        logger.warn(&format!("Session machine already stopped: {}", e));
    }
    match machine_task.await {
        Ok(Ok(())) => {
            logger.info("Shutdown complete");
            Ok(())
        }
        Ok(Err(e)) => Err(anyhow::anyhow!("Session machine error: {}", e)),
        Err(e) => Err(anyhow::anyhow!("Session machine task failed: {}", e)),
    }
}
