use backup_warden::core::system::System;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let system = match System::initialize().await {
        Ok(system) => system,
        Err(err) => {
            eprintln!("Failed to initialize: {err}");
            return ExitCode::FAILURE;
        }
    };
    system.run().await;
    system.terminate().await;
    ExitCode::SUCCESS
}
