#[tokio::main]
async fn main() {
    if let Err(e) = campus_portal_backend::run().await {
        eprintln!("campus-portal-backend failed to start: {}", e);
        std::process::exit(1);
    }
}
