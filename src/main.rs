use std::env;

use clap::Parser;

use swp::api::{self, Cli};
use swp::core::{SwpInput, SwpResult, run_swp_projection};

#[tokio::main]
async fn main() {
    env_logger::init();

    let raw_args: Vec<String> = env::args().collect();
    if raw_args.get(1).map(|s| s.as_str()) == Some("serve") {
        let port = raw_args
            .get(2)
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(8080);
        if let Err(e) = api::run_http_server(port).await {
            eprintln!("Server error: {e}");
            std::process::exit(1);
        }
        return;
    }

    let cli = Cli::parse();
    let inputs = match api::build_inputs(cli) {
        Ok(inputs) => inputs,
        Err(msg) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
    };

    match run_swp_projection(&inputs) {
        Ok(result) => print_projection(&inputs, &result),
        Err(msg) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
    }
}

fn print_projection(inputs: &SwpInput, result: &SwpResult) {
    println!(
        "SWP projection: {:.2} invested, {:.2}/month at {:.2}% over {} years",
        inputs.total_investment,
        inputs.monthly_withdrawal,
        inputs.annual_rate_percent,
        inputs.period_years
    );
    println!();
    println!(
        "{:>5}  {:>14}  {:>12}  {:>12}  {:>14}",
        "Month", "Beginning", "Withdrawal", "Interest", "Ending"
    );
    for row in &result.schedule {
        println!(
            "{:>5}  {:>14.2}  {:>12.2}  {:>12.2}  {:>14.2}",
            row.month, row.beginning_balance, row.withdrawal, row.interest, row.ending_balance
        );
    }
    println!();
    println!("Final value:           {:.2}", result.final_value);
    println!("Total interest earned: {:.2}", result.total_interest_earned);
    println!("Total withdrawn:       {:.2}", result.total_withdrawn);
}
