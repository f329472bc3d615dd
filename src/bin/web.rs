#![cfg(not(tarpaulin_include))]

use algoviz::app;
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Vec<String> = env::args().collect();

    let mut port: u16 = 3000;
    if args.len() >= 2 {
        port = args[1].parse().unwrap_or(3000);
    }

    let addr = format!("127.0.0.1:{}", port);
    println!("Starting algorithm visualizer API on port {}", port);
    app::run(&addr).await
}
