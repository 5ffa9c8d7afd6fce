// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// The entry point for all user interaction; `clap` parses the
// arguments and all business logic is delegated to Layer 2.
//
// Three commands are supported:
//   1. `correlate` — rebuilds a labeled manifest from finished anaglyphs
//   2. `train`     — trains the chooser and persists the artifact pair
//   3. `choose`    — predicts a HALD and prints the conversion parameters

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{ChooseArgs, Commands, CorrelateArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "stereo-hald-chooser",
    version = "0.1.0",
    about = "Train a stereo-aware classifier that picks the HALD LUT and gamma for anaglyph conversion."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    /// This keeps the CLI layer thin — it only routes, never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Correlate(args) => Self::run_correlate(args),
            Commands::Train(args) => Self::run_train(args),
            Commands::Choose(args) => Self::run_choose(args),
        }
    }

    fn run_correlate(args: CorrelateArgs) -> Result<()> {
        use crate::application::correlate_use_case::CorrelateUseCase;

        let out_manifest = args.out_manifest.clone();
        let report = CorrelateUseCase::new(args.into()).execute()?;
        println!(
            "Manifest written to '{}': {} mapping(s), {} duplicate(s).",
            out_manifest,
            report.mappings.len(),
            report.duplicates
        );
        Ok(())
    }

    fn run_train(args: TrainArgs) -> Result<()> {
        use crate::application::train_use_case::TrainUseCase;
        use crate::ml::trainer::TrainOutcome;

        tracing::info!("Starting training on manifest: {}", args.manifest);

        let summary = TrainUseCase::new(args.into()).execute()?;
        match &summary.outcome {
            TrainOutcome::StoppedSufficient { epoch, val_accuracy } => println!(
                "Training stopped early at epoch {epoch}: accuracy {val_accuracy:.2}% is sufficient."
            ),
            TrainOutcome::StoppedStagnant { epoch, val_accuracy } => println!(
                "Training aborted at epoch {epoch}: accuracy {val_accuracy:.2}% no longer grows. Nothing saved."
            ),
            TrainOutcome::Exhausted => println!(
                "Epoch budget consumed; ultimate loss per batch: {:.4}",
                summary.avg_loss_per_batch
            ),
        }
        if let Some(artifact) = &summary.artifact {
            println!("Artifact pair saved under token {}.", artifact.token);
        }
        Ok(())
    }

    fn run_choose(args: ChooseArgs) -> Result<()> {
        use crate::application::choose_use_case::ChooseUseCase;
        use std::path::Path;

        let use_case = ChooseUseCase::new((&args).into())?;
        let request = use_case.choose(Path::new(&args.sbs_path))?;

        println!("Chosen HALD:  {}", request.label);
        println!("Gamma:        {}", request.gamma);
        match &request.lut_path {
            Some(lut) => println!("LUT file:     {}", lut.display()),
            None => println!("LUT file:     (identity — none needed)"),
        }
        println!("Output path:  {}", request.out_path.display());
        Ok(())
    }
}
