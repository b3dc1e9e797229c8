use elecmate_api::run;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("elecmate-api: {err}");
        std::process::exit(1);
    }
}
