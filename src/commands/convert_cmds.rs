use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::convert::{run_conversion, ConversionEngine, ConversionOutcome, ConversionRequest};
use crate::history::ConversionRecord;
use super::history_cmds::record_conversion;
use super::AppState;

/// Convert `input` in the background and log it on success.
///
/// Returns `Ok(None)` when cancelled. Failed and cancelled conversions leave
/// the history untouched.
pub async fn convert_file(
    state: &AppState,
    engine: Arc<dyn ConversionEngine>,
    input: PathBuf,
    input_format: &str,
    output_format: &str,
    cancel: CancellationToken,
) -> Result<Option<ConversionRecord>, String> {
    let output_dir = {
        let config = state.config.lock().map_err(|e| e.to_string())?;
        config.settings.output_dir_for(&input)
    };
    let request = ConversionRequest {
        input,
        input_format: input_format.to_string(),
        output_format: output_format.to_string(),
        output_dir,
    };
    let input_file_name = request.input_file_name();

    match run_conversion(engine, request, cancel).await {
        ConversionOutcome::Completed(output) => {
            record_conversion(state, &input_file_name, input_format, output_format, &output)
                .map(Some)
        }
        ConversionOutcome::Failed(e) => Err(e.to_string()),
        ConversionOutcome::Cancelled => Ok(None),
    }
}
