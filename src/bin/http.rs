#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::net::SocketAddr;

    use capacity_tool::{Portfolio, http_api, load_portfolio_from_json, logging};

    let verbosity = std::env::var("CAPACITY_TOOL_VERBOSITY")
        .ok()
        .and_then(|v| v.parse::<u8>().ok())
        .unwrap_or(1);
    logging::init(verbosity);

    let addr: SocketAddr = std::env::var("CAPACITY_TOOL_HTTP_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        .parse()?;

    let portfolio = match std::env::var("CAPACITY_TOOL_PORTFOLIO") {
        Ok(path) => {
            let portfolio = load_portfolio_from_json(&path)?;
            tracing::info!(
                %path,
                resources = portfolio.resources().len(),
                allocations = portfolio.allocations().len(),
                "loaded portfolio"
            );
            portfolio
        }
        Err(_) => Portfolio::new(),
    };

    println!("capacity-tool HTTP API listening on http://{addr}");
    http_api::serve(addr, portfolio).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
