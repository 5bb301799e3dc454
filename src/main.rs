use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};

use cardiorisk::api::{self, AppState};
use cardiorisk::common::config::AppCfg;
use cardiorisk::common::log;
use cardiorisk::inference::service as inference_service;
use cardiorisk::inference::{Evidence, PatientForm};
use cardiorisk::training::service as training_service;
use cardiorisk::training::{ModelCache, RiskModel, TrainConfig, TrainOverrides};

#[derive(Parser, Debug)]
#[command(name = "cardiorisk", version, about = "Cardiac risk prediction with a Bayesian network")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fits the network on a CSV dataset and writes the model artefact.
    Train {
        #[arg(long)]
        data: Option<PathBuf>,
        #[arg(long)]
        out: Option<PathBuf>,
        #[command(flatten)]
        fit: FitArgs,
    },
    /// Serves the interactive form page.
    Serve {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        fit: FitArgs,
        #[arg(long)]
        bind: Option<String>,
    },
    /// Prints the outcome posterior for one patient.
    Predict {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        fit: FitArgs,
        #[command(flatten)]
        patient: PatientArgs,
    },
}

/// Where the model comes from: train on load (`--data`) or a saved artefact (`--model`).
#[derive(Args, Debug)]
struct SourceArgs {
    #[arg(long, conflicts_with = "model")]
    data: Option<PathBuf>,
    #[arg(long)]
    model: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct FitArgs {
    #[arg(long)]
    test_size: Option<String>,
    #[arg(long)]
    seed: Option<u64>,
    /// `mle` or `bayes`.
    #[arg(long)]
    estimator: Option<String>,
    /// Equivalent sample size of the BDeu prior.
    #[arg(long)]
    ess: Option<f64>,
}

#[derive(Args, Debug)]
struct PatientArgs {
    /// Jeune, Moyen or Adulte.
    #[arg(long)]
    age: Option<String>,
    /// Homme or Femme.
    #[arg(long)]
    sexe: Option<String>,
    #[arg(long)]
    tabagisme: Option<String>,
    #[arg(long)]
    hypertension: Option<String>,
    #[arg(long)]
    cholesterol: Option<String>,
    #[arg(long)]
    antecedents: Option<String>,
    #[arg(long)]
    activite: Option<String>,
    #[arg(long)]
    diabete: Option<String>,
    #[arg(long)]
    stress: Option<String>,
}

impl From<PatientArgs> for PatientForm {
    fn from(args: PatientArgs) -> Self {
        PatientForm {
            age: args.age,
            sex: args.sexe,
            smoking: args.tabagisme,
            hypertension: args.hypertension,
            high_cholesterol: args.cholesterol,
            family_history: args.antecedents,
            physical_activity: args.activite,
            diabetes: args.diabete,
            chronic_stress: args.stress,
        }
    }
}

impl From<&FitArgs> for TrainOverrides {
    fn from(fit: &FitArgs) -> Self {
        TrainOverrides {
            test_size: fit.test_size.clone(),
            seed: fit.seed,
            estimator: fit.estimator.clone(),
            ess: fit.ess,
        }
    }
}

fn train_config(cfg: &AppCfg, fit: &FitArgs) -> Result<TrainConfig> {
    Ok(TrainConfig::with_overrides(cfg, &TrainOverrides::from(fit))?)
}

fn resolve_model(cfg: &AppCfg, source: &SourceArgs, fit: &FitArgs) -> Result<Arc<RiskModel>> {
    if let Some(path) = &source.model {
        let model = training_service::load_model(path)
            .with_context(|| format!("loading model artefact {}", path.display()))?;
        return Ok(Arc::new(model));
    }
    let data = source.data.clone().unwrap_or_else(|| cfg.dataset_path());
    let train = train_config(cfg, fit)?;
    ModelCache::global()
        .get_or_train(&data, &train)
        .with_context(|| format!("training on {}", data.display()))
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    log::init();
    let cfg = AppCfg::try_load()?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Train { data, out, fit } => {
            let data = data.unwrap_or_else(|| cfg.dataset_path());
            let out = out.unwrap_or_else(|| cfg.artefact_path());
            let train = train_config(&cfg, &fit)?;
            let (model, path) = training_service::train_to_file(&data, &out, &train)
                .with_context(|| format!("training on {}", data.display()))?;
            println!(
                "{} | accuracy {:.2}% on {} test rows | {}",
                model.id,
                model.accuracy() * 100.0,
                model.evaluation.n_test,
                path.display()
            );
            Ok(())
        }
        Commands::Serve { source, fit, bind } => {
            let model = resolve_model(&cfg, &source, &fit)?;
            let bind = bind.unwrap_or_else(|| cfg.bind.clone());
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(api::serve(&bind, AppState::new(model)))
        }
        Commands::Predict {
            source,
            fit,
            patient,
        } => {
            let model = resolve_model(&cfg, &source, &fit)?;
            let form = PatientForm::from(patient);
            let evidence = Evidence::from_form(&form)?;
            if evidence.is_empty() {
                bail!("no risk factor given; pass at least one of --age, --sexe, ...");
            }
            let posterior = inference_service::query_risk(&model, &evidence)?.rounded(4);
            println!("{:<18} {:>8}", posterior.variable, "p");
            for row in &posterior.rows {
                println!("{:<18} {:>8.4}", format!("{} ({})", row.state, row.code), row.probability);
            }
            println!("accuracy (test set): {:.2}%", model.accuracy() * 100.0);
            Ok(())
        }
    }
}
