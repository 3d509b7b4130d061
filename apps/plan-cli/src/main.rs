#![deny(warnings)]

//! Headless CLI: load a planning snapshot and print scenario summaries.

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use plan_catalog::load_snapshot;
use plan_core::EngineConfig;
use plan_econ::gold::GoldPriceCache;
use plan_econ::{price_per_gram_from_troy_ounce, EconError, GoldPricing};
use plan_engine::report::{scenario_report, ScenarioReport};
use plan_engine::EvaluationInputs;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Args {
    snapshot: Option<String>,
    scenario: Option<String>,
    gold_price: Option<f64>,
    gold_price_oz: Option<f64>,
    fx: Option<f64>,
    json: bool,
}

fn parse_args() -> Result<Args> {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--snapshot" => args.snapshot = it.next(),
            "--scenario" => args.scenario = it.next(),
            "--gold-price" => args.gold_price = Some(number(&arg, it.next())?),
            "--gold-price-oz" => args.gold_price_oz = Some(number(&arg, it.next())?),
            "--fx" => args.fx = Some(number(&arg, it.next())?),
            "--json" => args.json = true,
            other => bail!("unknown argument: {other}"),
        }
    }
    Ok(args)
}

fn number(flag: &str, value: Option<String>) -> Result<f64> {
    let value = value.ok_or_else(|| anyhow!("{flag} needs a value"))?;
    value
        .parse()
        .with_context(|| format!("{flag}: not a number: {value}"))
}

/// Per-gram gold quote from the command line, in the quote currency.
fn quote_per_gram(args: &Args) -> Result<f64> {
    match (args.gold_price, args.gold_price_oz) {
        (Some(per_gram), _) => Ok(per_gram),
        (None, Some(per_oz)) => Ok(price_per_gram_from_troy_ounce(per_oz)?),
        (None, None) => bail!("--gold-price or --gold-price-oz is required"),
    }
}

fn pricing(args: &Args, config: &EngineConfig) -> Result<GoldPricing> {
    let fx = match args.fx {
        Some(fx) => fx,
        None => {
            info!("no --fx given; gold price taken as local currency (fx 1.0)");
            1.0
        }
    };
    let quote = quote_per_gram(args)?;
    let mut cache = GoldPriceCache::from_config(config);
    let per_gram = cache
        .get_or_fetch(Utc::now(), || Ok::<f64, EconError>(quote))
        .ok_or_else(|| anyhow!("gold price {quote} is not usable"))?;
    Ok(GoldPricing::new(per_gram, fx)?)
}

/// Currency rounded to whole units for display.
fn money(v: f64) -> Decimal {
    Decimal::from_f64(v).unwrap_or_default().round_dp(0)
}

fn print_report(report: &ScenarioReport) {
    let t = &report.totals;
    println!("Scenario {} | {}", report.scenario_id, report.scenario_name);
    for row in &report.rows {
        println!(
            "  {:<12} {:<8} x{:<5} area {:>10} m2 | cost {:>16} | revenue {:>16}",
            row.section,
            row.code,
            row.count,
            money(row.area_m2),
            money(row.cost),
            money(row.revenue),
        );
    }
    println!(
        "  TOTAL units: {} | area: {} m2 | cost: {} | revenue: {}",
        t.units,
        money(t.build_area_m2),
        money(t.cost),
        money(t.revenue),
    );
    println!(
        "  surplus: {} ({:.1}%) | break-even: {:.1} months | population: {} | period: {}y",
        money(t.surplus),
        t.surplus_percent,
        t.break_even_months,
        t.population.round(),
        t.rental_period_years,
    );
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args()?;
    info!(?args, "starting CLI");

    let path = args
        .snapshot
        .as_deref()
        .ok_or_else(|| anyhow!("--snapshot <file.yaml> is required"))?;
    let snapshot = load_snapshot(path).with_context(|| format!("loading {path}"))?;
    let inputs = EvaluationInputs::from_snapshot(&snapshot, pricing(&args, &snapshot.config)?);

    let scenarios: Vec<_> = match &args.scenario {
        Some(id) => vec![snapshot
            .scenario(id)
            .ok_or_else(|| anyhow!("scenario {id} not found"))?],
        None => snapshot.scenarios.iter().collect(),
    };

    let mut reports = Vec::with_capacity(scenarios.len());
    for scenario in scenarios {
        reports.push(scenario_report(&snapshot.project, scenario, &inputs)?);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            print_report(report);
        }
    }
    Ok(())
}
