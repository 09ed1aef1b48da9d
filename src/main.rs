//! Policy Valuation CLI
//!
//! Values one policy, read from a JSON file or from listing-form flags, and
//! prints the price breakdown (or the full result as JSON).

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use policy_valuation::assumptions::loader::{load_assumptions, load_default_assumptions};
use policy_valuation::valuation::{quote_listing, valuate_as_of, ListingQuote};
use policy_valuation::{PolicyForm, PolicyRecord, ValuationResult};
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "policy_valuation", version, about = "Value an in-force policy for transfer")]
struct Args {
    /// Policy record as JSON; overrides the form flags
    #[arg(long)]
    policy: Option<PathBuf>,

    /// Market assumptions JSON (defaults to data/market_assumptions.json when present)
    #[arg(long)]
    assumptions: Option<PathBuf>,

    /// Valuation date, YYYY-MM-DD (defaults to today)
    #[arg(long)]
    as_of: Option<NaiveDate>,

    /// Seller asking price to quote against the valuation
    #[arg(long)]
    asking_price: Option<f64>,

    /// Print the full result as JSON
    #[arg(long)]
    json: bool,

    #[arg(long)]
    policy_type: Option<String>,

    #[arg(long)]
    company: Option<String>,

    #[arg(long)]
    annual_premium: Option<String>,

    #[arg(long)]
    paid_years: Option<String>,

    /// Premium term in years, or "lifetime"
    #[arg(long)]
    total_term: Option<String>,

    #[arg(long)]
    accumulated_amount: Option<String>,

    /// YYYY-MM-DD
    #[arg(long)]
    join_date: Option<String>,

    #[arg(long)]
    currency: Option<String>,

    #[arg(long)]
    concierge: bool,
}

#[derive(Serialize)]
struct Output<'a> {
    valuation: &'a ValuationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    listing: Option<&'a ListingQuote>,
}

fn read_policy(args: &Args) -> Result<PolicyRecord> {
    if let Some(path) = &args.policy {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let policy = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing policy {}", path.display()))?;
        return Ok(policy);
    }

    if args.policy_type.is_none() && args.company.is_none() {
        bail!("either --policy <json> or the policy form flags are required");
    }

    let form = PolicyForm {
        policy_type: args.policy_type.clone().unwrap_or_default(),
        company: args.company.clone().unwrap_or_default(),
        annual_premium: args.annual_premium.clone().unwrap_or_default(),
        paid_years: args.paid_years.clone().unwrap_or_default(),
        total_term: args.total_term.clone().unwrap_or_default(),
        accumulated_amount: args.accumulated_amount.clone().unwrap_or_default(),
        join_date: args.join_date.clone().unwrap_or_default(),
        currency: args.currency.clone().unwrap_or_default(),
        concierge_help: args.concierge,
        ..Default::default()
    };
    Ok(form.into_record()?)
}

fn print_summary(policy: &PolicyRecord, result: &ValuationResult, listing: Option<&ListingQuote>) {
    let cur = &result.currency;

    println!("Policy Valuation v{}", env!("CARGO_PKG_VERSION"));
    println!("========================\n");
    println!("Policy: {} / {} ({} term)", policy.issuer_name(), policy.policy_type, policy.total_term);
    println!("  Annual Premium:     {} {:>14.2}", cur, policy.annual_premium);
    println!("  Paid Years:         {:>18}", policy.paid_years);
    println!("  Accumulated Value:  {} {:>14.2}", cur, policy.accumulated_amount);
    println!("  Valuation Date:     {:>18}", result.valuation_date);
    println!();

    println!("Pricing:");
    println!("  Surrender Value:    {} {:>14.2}", cur, result.surrender_value);
    println!("  DCF Value:          {} {:>14.2}", cur, result.dcf_value);
    println!("  Risk-Adjusted:      {} {:>14.2}", cur, result.risk_adjusted_value);
    println!("  Market Premium:     {} {:>14.2}", cur, result.market_premium);
    println!("  Platform Fees:      {} {:>14.2}", cur, result.platform_fees);
    println!("  Net to Buyer:       {} {:>14.2}", cur, result.net_value_to_buyer);
    println!(
        "  Recommended Price:  {} {:>14.2}{}",
        cur,
        result.recommended_price,
        if result.floor_binding { "  (floor)" } else { "" }
    );
    println!("  Above Surrender:    {} {:>14.2}", cur, result.profit_above_surrender);
    println!();

    let risk = &result.risk_profile;
    let irr = &result.irr_analysis;
    println!("Risk: grade {:?}, score {:.4}", risk.grade, risk.composite_score);
    println!(
        "Returns: buyer {:.2}%, after fees {:.2}%, excess {:.2}%, sharpe {:.2}",
        irr.buyer_irr * 100.0,
        irr.platform_adjusted_irr * 100.0,
        irr.excess_return * 100.0,
        irr.sharpe_ratio
    );
    match irr.original_irr {
        Some(rate) => println!("Original holder IRR: {:.2}%", rate * 100.0),
        None => println!("Original holder IRR: n/a"),
    }
    println!(
        "Recommendation: {} (confidence {:.1}%)",
        result.recommendation_tier.as_str(),
        result.confidence_score * 100.0
    );

    if let Some(quote) = listing {
        println!();
        println!("Listing at {} {:.2}:", cur, quote.asking_price);
        println!("  Platform Fee:       {} {:>14.2}", cur, quote.platform_fee);
        println!("  Seller Receives:    {} {:>14.2}", cur, quote.seller_net);
        println!("  vs Recommended:     {:>17.1}%", quote.asking_to_recommended * 100.0);
        println!("  Buyer IRR:          {:>17.2}%", quote.buyer_returns.platform_adjusted_irr * 100.0);
        if quote.below_surrender {
            println!("  WARNING: asking price is at or below surrender value");
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let assumptions = match &args.assumptions {
        Some(path) => load_assumptions(path)
            .with_context(|| format!("loading assumptions {}", path.display()))?,
        None => load_default_assumptions().context("loading default assumptions")?,
    };
    let policy = read_policy(&args)?;
    let as_of = args.as_of.unwrap_or_else(|| chrono::Local::now().date_naive());

    let result = valuate_as_of(&policy, Some(&assumptions), as_of);
    let result = match result {
        Ok(result) => result,
        Err(err) if args.json => {
            println!("{}", serde_json::to_string_pretty(&err.report())?);
            std::process::exit(1);
        }
        Err(err) => return Err(err).context("valuation failed"),
    };

    let listing = args
        .asking_price
        .map(|price| quote_listing(&policy, &result, price, &assumptions))
        .transpose()?;

    if args.json {
        let output = Output {
            valuation: &result,
            listing: listing.as_ref(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_summary(&policy, &result, listing.as_ref());
    }

    Ok(())
}
