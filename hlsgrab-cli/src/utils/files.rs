use crate::error::AppError;

const MAX_URL_NAME_CHARS: usize = 30;

/// Extracts a file name from a URL: the last path segment without its
/// extension, truncated to 30 characters.
pub fn extract_filename_from_url(url_str: &str) -> Result<String, AppError> {
    let url = url::Url::parse(url_str).map_err(|e| AppError::InvalidInput(format!("{url_str}: {e}")))?;

    let file_name = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .unwrap_or("stream");

    let url_name = match file_name.rfind('.') {
        Some(pos) if pos > 0 => &file_name[..pos],
        _ => file_name,
    };

    // we dont want large filenames
    let filename = if url_name.chars().count() > MAX_URL_NAME_CHARS {
        let head: String = url_name.chars().take(MAX_URL_NAME_CHARS - 3).collect();
        format!("{head}...")
    } else {
        url_name.to_string()
    };

    Ok(filename)
}

/// Expands `%u` (name taken from the URL) and `%i` (1-based input index).
pub fn expand_name_template(
    name_template: &str,
    url_str: &str,
    index: usize,
) -> Result<String, AppError> {
    let mut name = name_template.replace("%i", &index.to_string());
    if name.contains("%u") {
        name = name.replace("%u", &extract_filename_from_url(url_str)?);
    }
    Ok(name)
}
