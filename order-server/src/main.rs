use order_server::{Server, ServerState, setup_environment};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 设置环境 (dotenv, 日志) 并加载配置
    let config = setup_environment();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        "Order server starting..."
    );

    // 2. 打开存储并确认可用 (监听之前)
    let state = match ServerState::initialize(&config).await {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Failed to initialize order store: {}", e);
            return Err(e.into());
        }
    };

    // 3. 运行 HTTP 服务器，收到信号后优雅关闭
    let server = Server::new(config, state);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
