use crate::infra::{build_verdict_service, verdict_service_with_corpus};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use steward_ai::config::AppConfig;
use steward_ai::error::AppError;
use steward_ai::precedents::{BlendMode, FaultEstimate, IncidentCorpus};
use steward_ai::verdict::{FaultEstimateResponse, PrecedentView, VerdictRequest, VerdictResponse};

#[derive(Args, Debug, Default)]
pub(crate) struct AssessArgs {
    /// Incident type as offered by the intake form, e.g. "Divebomb / Late lunge"
    #[arg(long)]
    pub(crate) incident_type: Option<String>,
    /// Free-text steward notes describing the contact
    #[arg(long)]
    pub(crate) notes: Option<String>,
    /// Video title, used for keyword detection when no incident type is given
    #[arg(long)]
    pub(crate) title: Option<String>,
    /// YouTube link to the incident
    #[arg(long)]
    pub(crate) url: Option<String>,
    #[arg(long)]
    pub(crate) series: Option<String>,
    /// Description of Car A, e.g. "Red Porsche #24"
    #[arg(long)]
    pub(crate) car_a: Option<String>,
    /// Description of Car B
    #[arg(long)]
    pub(crate) car_b: Option<String>,
    /// Steward-entered fault for Car A (0-100); skips precedent matching
    #[arg(long)]
    pub(crate) manual_fault: Option<f32>,
    /// Precedent CSV (overrides STEWARD_CORPUS_PATH); must exist and parse
    #[arg(long)]
    pub(crate) corpus: Option<PathBuf>,
    /// Tip book (overrides STEWARD_TIPS_PATH)
    #[arg(long)]
    pub(crate) tips: Option<PathBuf>,
    /// Blend mode: "precedent" or "rule" (overrides STEWARD_BLEND_MODE)
    #[arg(long, value_parser = parse_mode)]
    pub(crate) mode: Option<BlendMode>,
    /// Render the full verdict instead of the fault estimate only
    #[arg(long)]
    pub(crate) verdict: bool,
    /// Print JSON instead of a text report
    #[arg(long)]
    pub(crate) json: bool,
}

fn parse_mode(raw: &str) -> Result<BlendMode, String> {
    raw.parse()
}

pub(crate) async fn run_assess(args: AssessArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    if let Some(path) = args.tips {
        config.corpus.tips_path = path;
    }
    if let Some(mode) = args.mode {
        config.blend_mode = mode;
    }

    // An explicitly named corpus is loaded strictly.
    let service = match args.corpus {
        Some(path) => {
            let incidents = IncidentCorpus::from_path(&path)?;
            config.corpus.dataset_path = path;
            verdict_service_with_corpus(&config, incidents)
        }
        None => build_verdict_service(&config),
    };
    let request = VerdictRequest {
        url: args.url,
        incident_type: args.incident_type,
        steward_notes: args.notes,
        series: args.series,
        car_a: args.car_a,
        car_b: args.car_b,
        video_title: args.title,
        manual_fault: args.manual_fault,
    };

    if args.verdict {
        let response = service.evaluate(request).await?;
        if args.json {
            print_json(&response)?;
        } else {
            render_verdict(&response);
        }
    } else {
        let response = service.estimate(request)?;
        if args.json {
            print_json(&response)?;
        } else {
            render_estimate(&response);
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value).map_err(std::io::Error::from)?;
    println!("{rendered}");
    Ok(())
}

fn render_estimate(response: &FaultEstimateResponse) {
    let label = response
        .incident_kind
        .map(|kind| kind.label())
        .unwrap_or("Unclassified incident");
    println!("Fault estimate: {label}");
    render_split(&response.estimate);
    render_precedents(&response.precedents);
}

fn render_verdict(response: &VerdictResponse) {
    let verdict = &response.verdict;
    println!("Verdict: {}", verdict.video_title);
    println!("- Rule: {}", verdict.rule);
    println!("- {}", verdict.car_identification);
    render_split(&response.estimate);
    println!("\n{}", verdict.explanation);
    println!("\nCoaching");
    println!("- Overtaker: {}", verdict.overtake_tip);
    println!("- Defender: {}", verdict.defend_tip);
    println!(
        "- Spotter: {} / {}",
        verdict.spotter_advice.overtaker, verdict.spotter_advice.defender
    );
    render_precedents(&response.precedents);
}

fn render_split(estimate: &FaultEstimate) {
    println!(
        "- Car A {}% | Car B {}% | {} confidence ({:?})",
        estimate.fault_a, estimate.fault_b, estimate.confidence, estimate.method
    );
    if let Some(rule) = estimate.rule {
        println!("- Rulebook: {}", rule.citation());
    }
    println!("Signals:");
    for component in &estimate.components {
        println!(
            "  - {:?}: {:.1} x {:.2} ({})",
            component.signal, component.value, component.weight, component.notes
        );
    }
}

fn render_precedents(precedents: &[PrecedentView]) {
    if precedents.is_empty() {
        println!("No matching precedents.");
        return;
    }
    println!("Precedents:");
    for (index, precedent) in precedents.iter().enumerate() {
        let fault = precedent
            .fault_a
            .map(|fault| format!("{fault:.0}%"))
            .unwrap_or_else(|| "n/a".to_string());
        println!(
            "  {}. [{}] {} -> {} (Car A {fault})",
            index + 1,
            precedent.score,
            precedent.title,
            precedent.ruling
        );
    }
}
