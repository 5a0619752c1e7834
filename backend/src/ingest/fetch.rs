use crate::ingest::error::IngestError;
use log::{error, info, warn};
use regex::Regex;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Response, Url};
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::OnceLock;
use tempfile::NamedTempFile;

pub fn drive_download_url(base: &str, file_id: &str) -> String {
    format!("{}/uc?id={}&export=download", base.trim_end_matches('/'), file_id)
}

pub fn spreadsheet_export_url(base: &str, file_id: &str) -> String {
    format!(
        "{}/spreadsheets/d/{}/export?format=csv",
        base.trim_end_matches('/'),
        file_id
    )
}

/// Downloads a Drive file into a fresh temporary file.
///
/// Large files are served behind a "can't scan for viruses" page. Its
/// download form is submitted once; any other HTML answer is an error.
/// The file lives until the returned handle is dropped, whichever way the
/// job ends.
pub async fn download_drive_file(
    client: &reqwest::Client,
    base: &str,
    file_id: &str,
    temp_dir: Option<&Path>,
) -> Result<NamedTempFile, IngestError> {
    let url = drive_download_url(base, file_id);
    info!("Starting Google Drive download. fileId={}", file_id);

    match stream_to_temp_file(client, &url, temp_dir).await {
        Ok((file, bytes)) => {
            info!(
                "Download finished: {} bytes saved to {}",
                bytes,
                file.path().display()
            );
            Ok(file)
        }
        Err(e) => {
            error!("Failed to download CSV from Google Drive: {}", e);
            Err(e)
        }
    }
}

async fn stream_to_temp_file(
    client: &reqwest::Client,
    url: &str,
    temp_dir: Option<&Path>,
) -> Result<(NamedTempFile, u64), IngestError> {
    let mut response = client.get(url).send().await?.error_for_status()?;
    if is_html(&response) {
        let page_url = response.url().to_string();
        let page = response.text().await?;
        let Some(confirm) = confirm_download_url(&page, &page_url) else {
            warn!("Google Drive returned a page without a download form: {}", page_url);
            return Err(IngestError::DrivePage);
        };
        info!("Google Drive asked for confirmation, following {}", confirm);
        response = client.get(confirm).send().await?.error_for_status()?;
        if is_html(&response) {
            return Err(IngestError::DrivePage);
        }
    }

    let mut builder = tempfile::Builder::new();
    builder.prefix("drive-").suffix(".csv");
    let mut file = match temp_dir {
        Some(dir) => builder.tempfile_in(dir)?,
        None => builder.tempfile()?,
    };

    let mut written = 0u64;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk)?;
        written += chunk.len() as u64;
    }
    file.flush()?;
    Ok((file, written))
}

fn is_html(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.trim_start().to_ascii_lowercase().starts_with("text/html"))
}

fn form_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<form([^>]*)>(.*?)</form>").expect("static regex"))
}

fn input_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<input([^>]*)>").expect("static regex"))
}

fn attribute() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"([A-Za-z-]+)="([^"]*)""#).expect("static regex"))
}

fn confirm_link() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"href="(/uc\?export=download[^"]+)""#).expect("static regex"))
}

fn attributes(tag: &str) -> HashMap<&str, &str> {
    attribute()
        .captures_iter(tag)
        .filter_map(|c| Some((c.get(1)?.as_str(), c.get(2)?.as_str())))
        .collect()
}

fn unescape(value: &str) -> String {
    value.replace("&amp;", "&")
}

/// Finds where Drive's warning page wants the browser to go next: the
/// `download-form` action with its hidden fields, or an older
/// `/uc?export=download&confirm=...` link.
fn confirm_download_url(page: &str, page_url: &str) -> Option<Url> {
    let page_url = Url::parse(page_url).ok()?;

    for form in form_tag().captures_iter(page) {
        let form_attrs = attributes(form.get(1).map_or("", |m| m.as_str()));
        if form_attrs.get("id").copied() != Some("download-form") {
            continue;
        }
        let action = form_attrs.get("action")?;
        let mut url = page_url.join(&unescape(action)).ok()?;
        {
            let mut query = url.query_pairs_mut();
            for input in input_tag().captures_iter(form.get(2).map_or("", |m| m.as_str())) {
                let input_attrs = attributes(input.get(1).map_or("", |m| m.as_str()));
                if input_attrs.get("type").copied() != Some("hidden") {
                    continue;
                }
                if let Some(name) = input_attrs.get("name") {
                    let value = input_attrs.get("value").copied().unwrap_or("");
                    query.append_pair(name, &unescape(value));
                }
            }
        }
        return Some(url);
    }

    let link = confirm_link().captures(page)?;
    page_url.join(&unescape(link.get(1)?.as_str())).ok()
}

/// Fetches a spreadsheet's CSV export into memory.
pub async fn fetch_spreadsheet_csv(
    client: &reqwest::Client,
    base: &str,
    file_id: &str,
) -> Result<Vec<u8>, IngestError> {
    let url = spreadsheet_export_url(base, file_id);
    info!("Fetching spreadsheet export. fileId={}", file_id);
    let body = client
        .get(&url)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;
    Ok(body.to_vec())
}
