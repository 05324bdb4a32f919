// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All training logic is delegated to Layer 2 (application).
//
// There are no subcommands: one invocation is one training run.
// The CLI layer owns the process-level concerns:
//   - installing the logger once the run directory exists
//   - choosing the concrete backend (Autodiff<Wgpu>)
//   - turning "no accelerator" into exit status 1
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

// Declare the arguments submodule
pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::TrainArgs;

use crate::application::train_use_case::{RunOutcome, TrainUseCase};
use crate::infra::{
    device::WgpuProbe,
    logging::{self, TracingSink},
};
use crate::ml::TrainBackend;

/// The main CLI struct — clap reads the fields and generates
/// argument parsing code automatically via the Parser derive macro.
#[derive(Parser, Debug)]
#[command(
    name = "sci-train",
    version = "0.1.0",
    about = "Train the SCI low-light enhancement network with self-calibrated illumination learning."
)]
pub struct Cli {
    #[command(flatten)]
    pub args: TrainArgs,
}

impl Cli {
    /// Prepare the run directory, start logging, then hand off to Layer 2.
    pub fn run(self) -> Result<()> {
        let use_case = TrainUseCase::new(self.args.into());

        // The run directory has to exist before log.txt can be opened
        let layout = use_case.prepare()?;
        println!("Experiment dir : {}", layout.root.display());
        logging::init(&layout.log_file)?;

        match use_case.execute::<TrainBackend, _, _>(&layout, &WgpuProbe, &TracingSink)? {
            RunOutcome::Completed(summary) => {
                println!(
                    "Training complete: {} epochs, {} steps. Output in {}",
                    summary.epochs,
                    summary.total_steps,
                    layout.root.display()
                );
                if let Some(loss) = summary.last_loss {
                    println!("Final loss     : {loss:.6}");
                }
                Ok(())
            }
            // Already logged through TracingSink; nothing was trained.
            RunOutcome::NoDevice => std::process::exit(1),
        }
    }
}
