//! A terminal front end for the quote teams.

#[macro_use]
extern crate tracing;

use std::env;
use std::fmt::Display;
use std::io::Write as _;
use std::pin::pin;
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use quote_crew::collector::{FormError, LeadForm, QuickEstimate, QuoteRequest};
use quote_crew::core::RunOutcome;
use quote_crew::pipeline::{APPROVER, DEFAULT_ENQUIRY, RoadPipeline, Stage};
use quote_crew::team::builders_team;
use quote_crew::{AppConfig, Error, render_result};
use quote_crew_openai_model::OpenAIProvider;
use tokio::io::{self, AsyncBufReadExt, BufReader, Stdin};
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::sleep;

enum UiEvent {
    Message { speaker: String, content: String },
    Stage { stage: Stage, output: String },
}

const BAR_CHAR: &str = "▎";
const USAGE: &str = "usage: quote-crew [quote|estimate|lead|road]";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mode = env::args().nth(1).unwrap_or_else(|| "quote".to_owned());
    let mut input = Input::new();
    let result = match mode.as_str() {
        "quote" => run_quote(&mut input).await,
        "estimate" => run_estimate(&mut input).await,
        "lead" => run_lead(&mut input).await,
        "road" => run_road(&mut input).await,
        _ => {
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            debug!("run failed: {err:?}");
            eprintln!("{} {err}", "Error:".bright_red().bold());
            ExitCode::FAILURE
        }
    }
}

async fn run_quote(input: &mut Input) -> Result<(), Error> {
    let config = AppConfig::from_env()?;

    println!("{}", "🏡 Tell us about your dream home".bold());
    let defaults = QuoteRequest::default();
    let request = QuoteRequest {
        city: input.ask("City", &defaults.city).await?,
        built_up_sqft: input
            .ask_number(
                "built-up area",
                "Built-up area (sq.ft)",
                Some(defaults.built_up_sqft),
            )
            .await?,
        floors: input
            .ask("Floors (Single/Duplex/G+2/Other)", &defaults.floors.to_string())
            .await?
            .parse()?,
        bedrooms: input
            .ask_number("bedrooms", "Bedrooms (1-5)", Some(defaults.bedrooms))
            .await?,
        finish: input
            .ask("Finish level (basic/standard/premium)", &defaults.finish.to_string())
            .await?
            .parse()?,
        plot: input.ask("Plot size", &defaults.plot).await?,
        special: input.ask("Special requirements", &defaults.special).await?,
        contact: input.ask("Contact (phone/email), optional", "").await?,
    };
    let task = request.to_task()?;

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let team = builders_team(OpenAIProvider::new(config.openai_config()))
        .on_message(move |msg| {
            event_tx
                .send(UiEvent::Message {
                    speaker: msg.speaker().to_string(),
                    content: msg.content().to_owned(),
                })
                .ok();
        })
        .build()?;
    let result = drive(team.run(&task), &mut event_rx).await?;

    println!("{}", "Reply to Client".bright_white().bold());
    println!("{}", render_result(result.final_text()));
    if result.outcome() == RunOutcome::TurnLimitReached {
        println!(
            "\n{}",
            "⚠️  The team ran out of turns, this reply may be incomplete."
                .bright_yellow()
        );
    }
    Ok(())
}

async fn run_estimate(input: &mut Input) -> Result<(), Error> {
    let estimate = QuickEstimate {
        location: input.ask("📍 Location", "").await?,
        size_sqft: input
            .ask_number("home size", "📐 Home size (sq.ft)", None)
            .await?,
        budget: input.ask_number("budget", "💰 Budget (₹)", None).await?,
    };
    println!("✅ {}", estimate.summary()?.bright_green());
    println!("{}", "*Final quote after site inspection.".dimmed());
    Ok(())
}

async fn run_lead(input: &mut Input) -> Result<(), Error> {
    let form = LeadForm {
        name: input.ask("Name", "").await?,
        phone: input.ask("Phone", "").await?,
        location: input.ask("Location", "").await?,
        sqft: input.ask_number("area", "Sq.Ft.", None).await?,
        requirements: input.ask("Special requirements", "").await?,
    };
    println!("✅ {}", form.submit()?.bright_green());
    Ok(())
}

async fn run_road(input: &mut Input) -> Result<(), Error> {
    let config = AppConfig::from_env()?;

    let enquiry = input.ask("Enquiry", DEFAULT_ENQUIRY).await?;
    let pipeline = RoadPipeline::new(OpenAIProvider::new(config.openai_config()))?;
    println!("📨 Input: {enquiry}");

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let report = drive(
        pipeline.run(&enquiry, move |stage, output| {
            event_tx
                .send(UiEvent::Stage {
                    stage,
                    output: output.to_owned(),
                })
                .ok();
        }),
        &mut event_rx,
    )
    .await?;

    println!("\n{}", "✅------ FINAL DECISION ------✅".bright_white().bold());
    println!("{}", render_result(&report.decision));
    println!("\n📌 Approved by: {APPROVER}");
    Ok(())
}

/// Polls `fut` to completion, showing a spinner while nothing is printed.
async fn drive<F: Future>(
    fut: F,
    event_rx: &mut mpsc::UnboundedReceiver<UiEvent>,
) -> F::Output {
    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .map(|style| style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"))
        .unwrap_or_else(|_| ProgressStyle::default_spinner());

    let mut fut = pin!(fut);
    let mut progress_bar: Option<ProgressBar> = None;
    let output = loop {
        // Create a new progress bar if it has been finished.
        progress_bar
            .get_or_insert_with(|| {
                let progress_bar = ProgressBar::new_spinner();
                progress_bar.set_style(progress_style.clone());
                progress_bar.set_message("🤔 Thinking...");
                progress_bar
            })
            .inc(1);

        select! {
            output = &mut fut => break output,
            Some(event) = event_rx.recv() => {
                // Finish the progress bar before printing anything else.
                if let Some(progress_bar) = progress_bar.take() {
                    progress_bar.finish_and_clear();
                }
                print_event(event);
            }
            _ = sleep(Duration::from_millis(100)) => {}
        }
    };

    if let Some(progress_bar) = progress_bar.take() {
        progress_bar.finish_and_clear();
    }
    while let Ok(event) = event_rx.try_recv() {
        print_event(event);
    }
    output
}

fn print_event(event: UiEvent) {
    match event {
        UiEvent::Message { speaker, content } => {
            let bar = BAR_CHAR.bright_cyan();
            println!("{bar}🤖 {}", speaker.bright_cyan().bold());
            for line in content.lines() {
                println!("{bar}{}", line.bright_white());
            }
            println!();
        }
        UiEvent::Stage { stage, output } => {
            let bar = BAR_CHAR.bright_green();
            println!("{bar}✅ {}", stage.bright_green().bold());
            println!("{bar}{output}\n");
        }
    }
}

struct Input {
    reader: BufReader<Stdin>,
}

impl Input {
    fn new() -> Self {
        Self {
            reader: BufReader::new(io::stdin()),
        }
    }

    /// Prompts for one line. A blank answer or the end of input picks
    /// `default`.
    async fn ask(&mut self, prompt: &str, default: &str) -> Result<String, Error> {
        if default.is_empty() {
            print!("{prompt}: ");
        } else {
            print!("{prompt} [{}]: ", default.dimmed());
        }
        std::io::stdout().flush()?;

        let mut line = String::new();
        let count = self.reader.read_line(&mut line).await?;
        let answer = line.trim();
        if count == 0 || answer.is_empty() {
            return Ok(default.to_owned());
        }
        Ok(answer.to_owned())
    }

    async fn ask_number<T>(
        &mut self,
        field: &'static str,
        prompt: &str,
        default: Option<T>,
    ) -> Result<T, Error>
    where
        T: FromStr + Display,
    {
        let default = default.map(|value| value.to_string()).unwrap_or_default();
        let answer = self.ask(prompt, &default).await?;
        if answer.is_empty() {
            return Err(FormError::Missing(field).into());
        }
        answer.parse().map_err(|_| {
            Error::Form(FormError::Invalid {
                field,
                value: answer.clone(),
            })
        })
    }
}
