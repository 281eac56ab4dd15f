mod hls;

use hlsgrab_engine::{CancellationToken, HlsDownloader, Outcome, SeriesItem};
use tracing::info;

use crate::error::AppError;
use crate::utils::expand_name_template;
use crate::utils::progress::ProgressManager;

/// What to download and how to name it.
pub struct InputPlan<'a> {
    pub inputs: &'a [String],
    pub titles: &'a [String],
    pub name_template: &'a str,
    pub series: bool,
}

/// Download every input, either one by one or as a single series.
pub async fn process_inputs(
    plan: &InputPlan<'_>,
    downloader: &HlsDownloader,
    progress_manager: &ProgressManager,
    cancel: &CancellationToken,
) -> Result<(), AppError> {
    if plan.inputs.is_empty() {
        return Err(AppError::InvalidInput(
            "No playlist URLs provided".to_string(),
        ));
    }

    let inputs_len = plan.inputs.len();
    info!(
        inputs_count = inputs_len,
        "Starting processing of {} input{}",
        inputs_len,
        if inputs_len == 1 { "" } else { "s" }
    );

    if plan.series {
        let base_name = expand_name_template(plan.name_template, &plan.inputs[0], 1)?;
        let items = series_items(plan.inputs, plan.titles);
        let outcome = hls::process_series(
            downloader,
            &items,
            &base_name,
            progress_manager,
            cancel,
        )
        .await?;
        if outcome.is_aborted() {
            info!("Download cancelled by user");
        }
        return Ok(());
    }

    for (input_index, input) in (1..).zip(plan.inputs) {
        let output_name = match plan.titles.get(input_index - 1) {
            Some(title) => title.clone(),
            None => expand_name_template(plan.name_template, input, input_index)?,
        };

        let outcome = hls::process_playlist(
            downloader,
            input,
            &output_name,
            progress_manager,
            cancel,
        )
        .await?;
        if let Outcome::Aborted = outcome {
            info!(
                completed = input_index - 1,
                total = inputs_len,
                "Download cancelled by user"
            );
            break;
        }
    }

    Ok(())
}

/// Pairs inputs with titles by position. Missing titles stay `None`.
fn series_items(inputs: &[String], titles: &[String]) -> Vec<SeriesItem> {
    inputs
        .iter()
        .enumerate()
        .map(|(i, input)| SeriesItem::new(input.clone(), titles.get(i).cloned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_items_pairs_titles_by_position() {
        let inputs = vec!["http://a/1.m3u8".to_string(), "http://a/2.m3u8".to_string()];
        let titles = vec!["Pilot".to_string()];
        let items = series_items(&inputs, &titles);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title.as_deref(), Some("Pilot"));
        assert_eq!(items[1].title, None);
        assert_eq!(items[1].locator, "http://a/2.m3u8");
    }
}
