//! Value a block of seller listings from CSV
//!
//! Reads listing-form rows, values every policy in parallel and writes one
//! report row per listing. Failed rows are reported, not dropped.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use policy_valuation::assumptions::loader::{load_assumptions, load_default_assumptions};
use policy_valuation::policy::{load_listings, Listing};
use policy_valuation::valuation::quote_listing;
use policy_valuation::{MarketAssumptions, ScenarioRunner, ValuationResult};
use rayon::prelude::*;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "value_block", about = "Value a CSV block of policy listings")]
struct Args {
    /// Listings CSV (listing-form columns)
    #[arg(default_value = "data/listings.csv")]
    input: PathBuf,

    /// Report CSV
    #[arg(short, long, default_value = "block_valuation_output.csv")]
    output: PathBuf,

    #[arg(long)]
    assumptions: Option<PathBuf>,

    /// Valuation date, YYYY-MM-DD (defaults to today)
    #[arg(long)]
    as_of: Option<NaiveDate>,
}

/// One row of the block report
#[derive(Debug, Default, Serialize)]
struct ReportRow {
    row: usize,
    policy_id: String,
    company: String,
    policy_type: String,
    currency: String,
    status: String,
    surrender_value: Option<f64>,
    dcf_value: Option<f64>,
    recommended_price: Option<f64>,
    floor_binding: Option<bool>,
    risk_grade: String,
    risk_score: Option<f64>,
    platform_adjusted_irr: Option<f64>,
    recommendation: String,
    asking_price: Option<f64>,
    asking_to_recommended: Option<f64>,
    error: String,
}

fn report_row(
    row: usize,
    listing: &Listing,
    outcome: policy_valuation::error::Result<ValuationResult>,
    assumptions: &MarketAssumptions,
) -> ReportRow {
    let policy = &listing.policy;
    let mut report = ReportRow {
        row,
        policy_id: policy.policy_id.clone().unwrap_or_default(),
        company: policy.issuer_name().to_string(),
        policy_type: policy.policy_type.to_string(),
        currency: policy.currency.clone(),
        asking_price: listing.asking_price,
        ..Default::default()
    };

    let result = match outcome {
        Ok(result) => result,
        Err(err) => {
            report.status = err.kind().as_str().to_string();
            report.error = err.to_string();
            return report;
        }
    };

    report.status = "ok".to_string();
    report.surrender_value = Some(result.surrender_value);
    report.dcf_value = Some(result.dcf_value);
    report.recommended_price = Some(result.recommended_price);
    report.floor_binding = Some(result.floor_binding);
    report.risk_grade = format!("{:?}", result.risk_profile.grade);
    report.risk_score = Some(result.risk_profile.composite_score);
    report.platform_adjusted_irr = Some(result.irr_analysis.platform_adjusted_irr);
    report.recommendation = result.recommendation_tier.as_str().to_string();

    if let Some(asking) = listing.asking_price {
        match quote_listing(policy, &result, asking, assumptions) {
            Ok(quote) => report.asking_to_recommended = Some(quote.asking_to_recommended),
            Err(err) => report.error = err.to_string(),
        }
    }
    report
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let assumptions = match &args.assumptions {
        Some(path) => load_assumptions(path)
            .with_context(|| format!("loading assumptions {}", path.display()))?,
        None => load_default_assumptions().context("loading default assumptions")?,
    };
    let as_of = args.as_of.unwrap_or_else(|| chrono::Local::now().date_naive());

    let start = Instant::now();
    println!("Loading listings from {}...", args.input.display());
    let listings = load_listings(&args.input)
        .with_context(|| format!("loading listings {}", args.input.display()))?;
    println!("Loaded {} listings in {:?}", listings.len(), start.elapsed());

    println!("Running valuations...");
    let val_start = Instant::now();
    let runner = ScenarioRunner::with_assumptions(assumptions.clone(), as_of);
    let rows: Vec<ReportRow> = listings
        .par_iter()
        .enumerate()
        .map(|(idx, listing)| report_row(idx + 1, listing, runner.run(&listing.policy), &assumptions))
        .collect();
    println!("Valuations complete in {:?}", val_start.elapsed());

    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    for row in &rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    let valued: Vec<&ReportRow> = rows.iter().filter(|r| r.status == "ok").collect();
    let total_price: f64 = valued.iter().filter_map(|r| r.recommended_price).sum();
    let at_floor = valued.iter().filter(|r| r.floor_binding == Some(true)).count();

    println!("\n=== Block Summary ===");
    println!("Listings:           {}", rows.len());
    println!("Valued:             {}", valued.len());
    println!("Failed:             {}", rows.len() - valued.len());
    println!("Priced at floor:    {}", at_floor);
    println!("Total recommended:  {:.2}", total_price);
    println!("\nResults written to: {}", args.output.display());
    println!("Total time: {:?}", start.elapsed());

    Ok(())
}
