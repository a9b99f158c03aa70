//! `cbank upload`, `preview`, `commit` and `cancel`: the upload workflow.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use serde::Serialize;

use commentbank_io::{ImportError, ImportId};
use commentbank_upload::strings::COMMENTS_ADDED;
use commentbank_upload::{Preview, UploadError, Uploader};

use crate::{CliError, Env};

#[derive(Serialize)]
struct PreviewOutput<'a> {
    iid: String,
    columns: &'a [String],
    preview: &'a Preview,
}

#[derive(Serialize)]
struct CommitOutput {
    iid: String,
    uploaded: usize,
}

fn parse_iid(iid: &str) -> Result<ImportId, CliError> {
    iid.parse::<ImportId>()
        .map_err(|e: ImportError| CliError::upload(e.into()))
}

fn output_err(e: io::Error) -> CliError {
    CliError::upload(UploadError::from(e))
}

pub fn cmd_upload(
    env: &Env,
    file: PathBuf,
    encoding: Option<String>,
    delimiter: Option<String>,
    previewrows: Option<usize>,
    json: bool,
) -> Result<(), CliError> {
    let user = env.user()?;
    let options = env.upload_options(encoding, delimiter, previewrows)?;
    let content = fs::read(&file)
        .map_err(|e| CliError::args(format!("cannot read {}: {}", file.display(), e)))?;

    let store = env.open_store()?;
    let uploader = Uploader::new(&env.temp_dir, user);
    let mut upload = uploader.ingest(&content, &options).map_err(CliError::upload)?;
    let iid = upload.iid();

    let preview = upload.preview(&store, options.preview_rows).map_err(CliError::upload)?;
    print_preview(iid, upload.columns(), &preview, json)?;

    eprintln!("import id: {}", iid);
    Ok(())
}

pub fn cmd_preview(env: &Env, iid: &str, previewrows: Option<usize>, json: bool) -> Result<(), CliError> {
    let user = env.user()?;
    let iid = parse_iid(iid)?;
    let rows = previewrows.unwrap_or(env.settings.preview_rows);

    let store = env.open_store()?;
    let mut upload = Uploader::new(&env.temp_dir, user)
        .resume(iid)
        .map_err(CliError::upload)?;
    let preview = upload.preview(&store, rows).map_err(CliError::upload)?;
    print_preview(iid, upload.columns(), &preview, json)
}

pub fn cmd_commit(env: &Env, iid: &str, json: bool) -> Result<(), CliError> {
    let user = env.user()?;
    let iid = parse_iid(iid)?;

    let store = env.open_store()?;
    let upload = Uploader::new(&env.temp_dir, user)
        .resume(iid)
        .map_err(CliError::upload)?;

    if json {
        let summary = upload.commit(&store, &mut io::sink()).map_err(CliError::upload)?;
        let output = CommitOutput { iid: iid.to_string(), uploaded: summary.uploaded };
        let text = serde_json::to_string_pretty(&output)
            .map_err(|e| CliError::upload(UploadError::Output(e.to_string())))?;
        println!("{}", text);
    } else {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        let summary = upload.commit(&store, &mut out).map_err(CliError::upload)?;
        writeln!(out, "{}: {}", COMMENTS_ADDED, summary.uploaded).map_err(output_err)?;
    }
    Ok(())
}

pub fn cmd_cancel(env: &Env, iid: &str) -> Result<(), CliError> {
    let user = env.user()?;
    let iid = parse_iid(iid)?;
    Uploader::new(&env.temp_dir, user)
        .discard(iid)
        .map_err(CliError::upload)?;
    eprintln!("discarded uploads for user {}", user.id);
    Ok(())
}

fn print_preview(iid: ImportId, columns: &[String], preview: &Preview, json: bool) -> Result<(), CliError> {
    if json {
        let output = PreviewOutput { iid: iid.to_string(), columns, preview };
        let text = serde_json::to_string_pretty(&output)
            .map_err(|e| CliError::upload(UploadError::Output(e.to_string())))?;
        println!("{}", text);
    } else {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        preview.render_html(&mut out).map_err(output_err)?;
    }

    let problems = preview.problem_count();
    if problems > 0 {
        eprintln!("{} previewed row(s) have problems; they will still be added on commit", problems);
    }
    Ok(())
}
