//! Load test driver for Plaid's webhook endpoints.

use crate::loadtest::error::LoadTestError;
use crate::loadtest::options::{self, Scenario};
use crate::loadtest::runner::{self, RunConfig};
use crate::loadtest::webhook_get::WebhookGetUser;
use crate::loadtest::webhook_post::WebhookPostUser;

mod common;
mod loadtest;

#[tokio::main]
async fn main() -> Result<(), LoadTestError> {
    common::init_logger();

    let options: options::LoadTestOptions = options::parse_options();
    let config = RunConfig::try_from(&options)?;

    common::print_banner("Webhook load test");
    println!("Target: {}", config.host);
    println!("Users: {}, spawn rate: {}/s, wait: {}-{}s\n", config.users, config.spawn_rate,
             options.min_wait, options.max_wait);

    let report = match options.scenario {
        Scenario::Post { json_body } => {
            runner::run(config, move |_| WebhookPostUser::new(json_body.clone())).await?
        }
        Scenario::Get { webhook } => {
            runner::run(config, move |_| WebhookGetUser::new(webhook.clone())).await?
        }
    };

    println!("{}", report);
    Ok(())
}
