use refract_rpc::{Server, Transport};

pub mod call;
pub mod schema;
pub mod serve;

/// Let running tasks finish, or cancel them on Ctrl-C, then shut down.
pub async fn drain<T: Transport>(server: &mut Server<T>) {
    if server.running_tasks() > 0 {
        tracing::info!(tasks = server.running_tasks(), "waiting for running tasks");
        tokio::select! {
            () = server.wait_for_tasks() => {}
            _ = tokio::signal::ctrl_c() => tracing::info!("interrupted, cancelling tasks"),
        }
    }
    server.shutdown().await;
}
