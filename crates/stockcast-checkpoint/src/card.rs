//! Markdown model card written next to every artifact.

use std::fmt::Write as _;

use crate::artifact::TrainingArtifact;
use crate::Result;

/// Renders the model card for `artifact`.
///
/// `run_dir` is the run directory name, `summary` the model's layer table.
///
/// # Errors
///
/// Returns [`CheckpointError::Config`](crate::CheckpointError::Config) if the
/// stored configuration cannot be serialized.
pub fn render_model_card(artifact: &TrainingArtifact, run_dir: &str, summary: &str) -> Result<String> {
    let fmt_loss = |loss: Option<f64>| loss.map_or_else(|| "n/a".to_string(), |l| format!("{:.6}", l));
    let config = &artifact.config;
    let config_json = config.to_json()?;

    let mut card = String::new();
    let _ = writeln!(card, "# Model Card: {}\n", artifact.model_name());

    let _ = writeln!(card, "## Model Overview");
    let _ = writeln!(card, "- **Model Type:** LSTM for Time Series Forecasting");
    let _ = writeln!(card, "- **Saved At:** {}", run_dir);
    let _ = writeln!(card, "- **Created:** {}", artifact.created_at.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(card, "- **Target:** `{}` from `{}`\n", config.target_column, config.ticker);

    let _ = writeln!(card, "## Performance");
    let _ = writeln!(
        card,
        "- **Final Training Loss:** `{}`",
        fmt_loss(artifact.history.final_train())
    );
    let _ = writeln!(
        card,
        "- **Final Validation Loss:** `{}`",
        fmt_loss(artifact.history.final_validation())
    );
    let _ = writeln!(
        card,
        "- **Epochs Completed:** {} of {}",
        artifact.history.len(),
        config.training.epochs
    );
    if let Some(best) = artifact.history.best_validation_epoch() {
        let _ = writeln!(card, "- **Best Validation Epoch:** {}", best);
    }
    let _ = writeln!(card, "- **Loss Function:** {}\n", config.training.loss_function.name());
    let _ = writeln!(card, "Per-epoch losses are in `loss_history.csv`.\n");

    let _ = writeln!(card, "## Scaling");
    let _ = writeln!(
        card,
        "Min-max parameters fit on {} training rows: min = `{}`, max = `{}`.\n",
        artifact.scaler.rows, artifact.scaler.min, artifact.scaler.max
    );

    let _ = writeln!(card, "## Model Architecture");
    let _ = writeln!(card, "```\n{}\n```\n", summary);

    let _ = writeln!(card, "## Configuration");
    let _ = writeln!(card, "The model was trained with the following configuration:");
    let _ = writeln!(card, "```json\n{}\n```\n", config_json);

    let _ = writeln!(card, "## How to Use");
    let _ = writeln!(
        card,
        "Inputs are windows of {} scaled observations with one feature.",
        config.window_size
    );
    let _ = writeln!(card, "```sh");
    let _ = writeln!(
        card,
        "stockcast predict --data data/{} --model-dir <model_dir> --model-folder {} --start-date {}",
        config.ticker, run_dir, config.prediction.start_date
    );
    let _ = writeln!(card, "```");
    Ok(card)
}
