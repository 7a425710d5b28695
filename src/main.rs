use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{debug, info, warn};

use matchcast::accuracy::{evaluate, load_final_scores};
use matchcast::config::EngineConfig;
use matchcast::fixtures::{ApiFixtureSource, FileFixtureSource, FixtureSource};
use matchcast::persist::{load_predictions, save_predictions};
use matchcast::{MatchRequest, PredictionResult, Predictor};

#[derive(Debug, clap::Parser, Clone)]
#[clap(name = "matchcast", about = "Football outcome predictions from team and league profiles")]
struct Args {
    /// JSON file with extra or replacement team/league profiles
    #[clap(long, global = true)]
    profiles: Option<PathBuf>,

    /// seed for the score sampler; a random one is picked and logged when omitted
    #[clap(long, global = true)]
    seed: Option<u64>,

    /// Poisson trials per predicted scoreline
    #[clap(long, global = true)]
    draws: Option<usize>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, clap::Subcommand, Clone)]
enum Command {
    /// predict a single fixture
    Predict {
        #[clap(long)]
        home: String,

        #[clap(long)]
        away: String,

        #[clap(long)]
        league: String,

        /// kick-off date, defaults to today
        #[clap(long)]
        date: Option<String>,
    },

    /// predict every fixture from a JSON file or the fixture API
    Fixtures {
        /// file holding an api-sports response or a plain fixture array
        #[clap(short = 'f', long)]
        file: Option<PathBuf>,

        /// fetch from the fixture API (needs API_FOOTBALL_KEY)
        #[clap(long)]
        api: bool,

        #[clap(long = "league-id")]
        league_id: Option<u32>,

        #[clap(long)]
        season: Option<u16>,

        #[clap(long)]
        date: Option<String>,

        /// write predictions here instead of stdout
        #[clap(short = 'o', long)]
        out: Option<PathBuf>,
    },

    /// score saved predictions against final results
    Evaluate {
        #[clap(short = 'p', long)]
        predictions: PathBuf,

        #[clap(short = 'r', long)]
        results: PathBuf,
    },
}

impl Args {
    fn validate(&self) -> Result<()> {
        if let Command::Fixtures { file, api, .. } = &self.command {
            if file.is_some() == *api {
                bail!("exactly one of --file or --api must be given");
            }
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let args = Args::parse();
    args.validate()?;
    debug!("args: {args:?}");

    let mut cfg = EngineConfig::from_env();
    if let Some(path) = &args.profiles {
        cfg.profiles_path = Some(path.clone());
    }
    if let Some(seed) = args.seed {
        cfg.seed = Some(seed);
    }
    if let Some(draws) = args.draws {
        cfg.set_sample_draws(draws);
    }
    let sampler = cfg.sampler();
    debug!(
        "sampler: {} draws, half-time ratio {:?}",
        sampler.draws(),
        sampler.halftime_ratio()
    );

    match args.command {
        Command::Predict {
            home,
            away,
            league,
            date,
        } => {
            let store = cfg.profile_store()?;
            let predictor = Predictor::new(&store, sampler);
            let date = date.unwrap_or_else(|| chrono::Local::now().date_naive().to_string());
            let request = MatchRequest::new(&home, &away, &league, &date);
            let result = predictor.predict_seeded(&request, run_seed(&cfg))?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Fixtures {
            file,
            api: _,
            league_id,
            season,
            date,
            out,
        } => {
            let source: Box<dyn FixtureSource> = match file {
                Some(path) => Box::new(FileFixtureSource::new(path)),
                None => Box::new(ApiFixtureSource {
                    base_url: cfg.api_base.clone(),
                    api_key: cfg.api_key.clone().unwrap_or_default(),
                    league_id,
                    season,
                    date,
                }),
            };
            let requests = source.fixtures()?;
            info!("predicting {} fixtures", requests.len());

            let store = cfg.profile_store()?;
            let predictor = Predictor::new(&store, sampler);
            let mut predictions: Vec<PredictionResult> = Vec::with_capacity(requests.len());
            for (request, result) in requests
                .iter()
                .zip(predictor.predict_batch(&requests, run_seed(&cfg)))
            {
                match result {
                    Ok(p) => predictions.push(p),
                    Err(err) => warn!(
                        "skipping {} v {}: {err}",
                        request.home_team, request.away_team
                    ),
                }
            }

            match out {
                Some(path) => save_predictions(&path, &predictions)?,
                None => println!("{}", serde_json::to_string_pretty(&predictions)?),
            }
        }
        Command::Evaluate {
            predictions,
            results,
        } => {
            let stored = load_predictions(&predictions)?;
            let finals = load_final_scores(&results)?;
            let metrics = evaluate(&stored, &finals);
            if metrics.samples == 0 {
                warn!("no prediction matched a final result");
            }
            println!(
                "{}",
                serde_json::to_string_pretty(&metrics).context("serialize metrics")?
            );
        }
    }

    Ok(())
}

fn run_seed(cfg: &EngineConfig) -> u64 {
    cfg.seed.unwrap_or_else(|| {
        let seed = rand::random::<u64>();
        info!("sampler seed {seed}");
        seed
    })
}
