use story_spoiler_e2e::configuration::get_configuration;
use story_spoiler_e2e::runner::Runner;
use story_spoiler_e2e::stories::story_suite;
use story_spoiler_e2e::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber("story-spoiler-e2e".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber);

    let configuration = get_configuration()?;
    let report = Runner::new(story_suite())
        .on_teardown(|| tracing::info!("story api client released"))
        .execute(&configuration)
        .await?;

    for case in report.cases() {
        match case.outcome() {
            Ok(()) => println!("PASS {}", case.name()),
            Err(failure) => println!("FAIL {} - {}", case.name(), failure),
        }
    }

    if !report.passed() {
        anyhow::bail!(
            "{} of {} cases failed",
            report.failed_count(),
            report.cases().len()
        );
    }
    Ok(())
}
