//! medpredict CLI - run the heart, diabetes and COVID-19 prediction flows

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use medpredict::artifacts::FsArtifactStore;
use medpredict::common::config::AppCfg;
use medpredict::common::log;
use medpredict::features::domain::{DiabetesInput, HeartInput, Sex, YesNo, DIABETES_SCHEMA, HEART_SCHEMA};
use medpredict::inference::{Prediction, Predictor};

#[derive(Parser)]
#[command(name = "medpredict", version, about = "Multiple disease prediction")]
struct Cli {
    /// Directory the artefact paths resolve under (overrides MEDPREDICT_DATA_ROOT)
    #[arg(long, global = true)]
    data_root: Option<PathBuf>,

    /// Log filter directive (overrides MEDPREDICT_LOG_LEVEL)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Print the full prediction record as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Heart disease risk from patient data
    Heart(HeartArgs),
    /// Diabetes risk from patient data
    Diabetes(DiabetesArgs),
    /// COVID-19 detection from a chest image (.jpg/.png)
    Covid {
        image: PathBuf,
    },
    /// Print the input fields of a tabular flow
    Schema {
        #[arg(value_enum)]
        flow: SchemaFlow,
    },
}

#[derive(Copy, Clone, ValueEnum)]
enum SchemaFlow {
    Heart,
    Diabetes,
}

#[derive(Copy, Clone, ValueEnum)]
enum SexArg {
    Male,
    Female,
}

#[derive(Copy, Clone, ValueEnum)]
enum YesNoArg {
    Yes,
    No,
}

impl From<SexArg> for Sex {
    fn from(value: SexArg) -> Self {
        match value {
            SexArg::Male => Sex::Male,
            SexArg::Female => Sex::Female,
        }
    }
}

impl From<YesNoArg> for YesNo {
    fn from(value: YesNoArg) -> Self {
        match value {
            YesNoArg::Yes => YesNo::Yes,
            YesNoArg::No => YesNo::No,
        }
    }
}

fn bounded(s: &str, min: f64, max: f64) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|_| format!("'{s}' is not a number"))?;
    if v < min || v > max {
        return Err(format!("{v} is not in {min}..={max}"));
    }
    Ok(v)
}

fn st_depression(s: &str) -> Result<f64, String> {
    bounded(s, 0.0, 10.0)
}

fn bmi(s: &str) -> Result<f64, String> {
    bounded(s, 0.0, 100.0)
}

fn pedigree(s: &str) -> Result<f64, String> {
    bounded(s, 0.0, 3.0)
}

#[derive(clap::Args)]
struct HeartArgs {
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(1..=80))]
    age: u32,
    #[arg(long, value_enum, ignore_case = true, default_value = "male")]
    sex: SexArg,
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u32).range(0..=3))]
    chest_pain_type: u32,
    #[arg(long, default_value_t = 120, value_parser = clap::value_parser!(u32).range(80..=200))]
    resting_bp: u32,
    #[arg(long, default_value_t = 200, value_parser = clap::value_parser!(u32).range(100..=600))]
    cholesterol: u32,
    #[arg(long, value_enum, ignore_case = true, default_value = "yes")]
    fasting_blood_sugar: YesNoArg,
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u32).range(0..=2))]
    resting_ecg: u32,
    #[arg(long, default_value_t = 150, value_parser = clap::value_parser!(u32).range(60..=220))]
    max_heart_rate: u32,
    #[arg(long, value_enum, ignore_case = true, default_value = "yes")]
    exercise_angina: YesNoArg,
    #[arg(long, default_value_t = 0.0, value_parser = st_depression)]
    st_depression: f64,
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u32).range(0..=2))]
    st_slope: u32,
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u32).range(0..=4))]
    vessels_colored: u32,
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..=3))]
    thalassemia: u32,
}

impl From<HeartArgs> for HeartInput {
    fn from(a: HeartArgs) -> Self {
        HeartInput {
            age: a.age,
            sex: a.sex.into(),
            chest_pain_type: a.chest_pain_type,
            resting_bp: a.resting_bp,
            cholesterol: a.cholesterol,
            fasting_blood_sugar: a.fasting_blood_sugar.into(),
            resting_ecg: a.resting_ecg,
            max_heart_rate: a.max_heart_rate,
            exercise_angina: a.exercise_angina.into(),
            st_depression: a.st_depression,
            st_slope: a.st_slope,
            vessels_colored: a.vessels_colored,
            thalassemia: a.thalassemia,
        }
    }
}

#[derive(clap::Args)]
struct DiabetesArgs {
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u32).range(0..=20))]
    pregnancies: u32,
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u32).range(0..=200))]
    glucose: u32,
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u32).range(0..=200))]
    blood_pressure: u32,
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u32).range(0..=100))]
    skin_thickness: u32,
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u32).range(0..=900))]
    insulin: u32,
    #[arg(long, default_value_t = 0.0, value_parser = bmi)]
    bmi: f64,
    #[arg(long, default_value_t = 0.0, value_parser = pedigree)]
    diabetes_pedigree_function: f64,
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u32).range(0..=120))]
    age: u32,
}

impl From<DiabetesArgs> for DiabetesInput {
    fn from(a: DiabetesArgs) -> Self {
        DiabetesInput {
            pregnancies: a.pregnancies,
            glucose: a.glucose,
            blood_pressure: a.blood_pressure,
            skin_thickness: a.skin_thickness,
            insulin: a.insulin,
            bmi: a.bmi,
            diabetes_pedigree_function: a.diabetes_pedigree_function,
            age: a.age,
        }
    }
}

fn report(prediction: &Prediction, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(prediction)?);
    } else {
        println!("{}", prediction.message);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut cfg = AppCfg::load()?;
    if let Some(root) = cli.data_root {
        cfg = cfg.with_data_root(root);
    }
    log::init(cli.log_level.as_deref().unwrap_or(&cfg.log_level));

    let predictor = Predictor::new(FsArtifactStore::new(&cfg), cfg.resize_filter);

    match cli.command {
        Command::Heart(args) => {
            let prediction = predictor.predict_heart(&args.into())?;
            report(&prediction, cli.json)?;
        }
        Command::Diabetes(args) => {
            let prediction = predictor.predict_diabetes(&args.into())?;
            report(&prediction, cli.json)?;
        }
        Command::Covid { image } => {
            let bytes = fs::read(&image)
                .with_context(|| format!("failed to read {}", image.display()))?;
            if !cli.json {
                println!("Uploaded image: {}", image.display());
                println!("Predicting...");
            }
            let prediction = predictor.predict_covid(&bytes)?;
            report(&prediction, cli.json)?;
        }
        Command::Schema { flow } => {
            let schema = match flow {
                SchemaFlow::Heart => &HEART_SCHEMA,
                SchemaFlow::Diabetes => &DIABETES_SCHEMA,
            };
            println!("{}", serde_json::to_string_pretty(schema)?);
        }
    }

    Ok(())
}
