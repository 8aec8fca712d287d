use std::env;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    #[cfg(feature = "cli")]
    {
        let code = gdrive_dl::cli::run(env::args().skip(1).collect()).await;
        std::process::exit(code);
    }
    #[cfg(not(feature = "cli"))]
    {
        let _ = env::args();
        eprintln!("CLI support not compiled in");
        std::process::exit(1);
    }
}
