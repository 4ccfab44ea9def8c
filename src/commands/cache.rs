//! Implementation of the `promptbatch cache` commands.
//!
//! Thin wrappers over the `cachedContents` operations of the generation
//! client. The API key and default model come from the project settings.

use super::{read_text_file, update_project};
use crate::cli::{CacheCreateArgs, CacheNameArgs, CacheTtlArgs};
use chrono::{DateTime, Utc};
use promptbatch::error::{PromptBatchError, Result};
use promptbatch::generate::GeminiClient;
use promptbatch::generate::cache::{CachedContent, CreateCache, parse_ttl, remaining};
use promptbatch::project::Project;
use std::path::Path;

fn client_for(path: &Path) -> Result<(Project, GeminiClient)> {
    let project = Project::load_or_default(path)?;
    let client = GeminiClient::from_settings(&project.settings)?;
    Ok((project, client))
}

fn ttl_argument(input: &str) -> Result<std::time::Duration> {
    parse_ttl(input).map_err(PromptBatchError::UserError)
}

pub fn cmd_list(path: &Path) -> Result<()> {
    let (project, client) = client_for(path)?;
    let caches = client.list_caches()?;

    if caches.is_empty() {
        eprintln!("No cached contents.");
        return Ok(());
    }

    let now = Utc::now();
    let selected = project.settings.cached_content.as_deref();
    for cache in &caches {
        let marker = if selected == Some(cache.name.as_str()) {
            "*"
        } else {
            " "
        };
        println!("{} {}", marker, summary_line(cache, now));
    }
    Ok(())
}

pub fn cmd_show(path: &Path, args: CacheNameArgs) -> Result<()> {
    let (_, client) = client_for(path)?;
    let cache = client.get_cache(&args.name)?;
    print!("{}", details(&cache, Utc::now()));
    Ok(())
}

pub fn cmd_create(path: &Path, args: CacheCreateArgs) -> Result<()> {
    let (project, client) = client_for(path)?;

    let contents = read_text_file(&args.file)?;
    let system_instruction = match &args.system {
        Some(file) => Some(read_text_file(file)?),
        None => None,
    };
    let display_name = args.display_name.clone().unwrap_or_else(|| {
        args.file
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default()
    });

    let params = CreateCache {
        display_name,
        model: args
            .model
            .clone()
            .unwrap_or_else(|| project.settings.model_name.clone()),
        contents,
        system_instruction,
        ttl: ttl_argument(&args.ttl)?,
    };

    eprintln!("Creating cached content from {}...", args.file.display());
    let cache = client.create_cache(&params)?;
    println!("{}", cache.name);

    if args.select {
        update_project(path, |project| {
            project.settings.cached_content = Some(cache.name.clone());
            Ok(())
        })?;
        eprintln!("Selected {} for runs", cache.name);
    }
    Ok(())
}

pub fn cmd_ttl(path: &Path, args: CacheTtlArgs) -> Result<()> {
    let ttl = ttl_argument(&args.ttl)?;
    let (_, client) = client_for(path)?;
    let cache = client.update_cache_ttl(&args.name, ttl)?;
    println!("{}", summary_line(&cache, Utc::now()));
    Ok(())
}

pub fn cmd_rm(path: &Path, args: CacheNameArgs) -> Result<()> {
    let (project, client) = client_for(path)?;
    client.delete_cache(&args.name)?;
    println!("Deleted {}", args.name);

    let deleted = promptbatch::generate::cache::cache_path(&args.name);
    if project.settings.cached_content.as_deref() == Some(deleted.as_str()) {
        update_project(path, |project| {
            project.settings.cached_content = None;
            Ok(())
        })?;
        eprintln!("Cleared the project's selected cache");
    }
    Ok(())
}

// ============================================================================
// Formatting
// ============================================================================

fn time_left(cache: &CachedContent, now: DateTime<Utc>) -> String {
    cache
        .expire_time
        .map(|expire| remaining(expire, now))
        .unwrap_or_else(|| "unknown".to_string())
}

/// One-line listing entry: name, display name, model, time left.
fn summary_line(cache: &CachedContent, now: DateTime<Utc>) -> String {
    format!(
        "{}\t{}\t{}\t{}",
        cache.name,
        cache.display_name,
        cache.model,
        time_left(cache, now)
    )
}

fn details(cache: &CachedContent, now: DateTime<Utc>) -> String {
    let time = |t: Option<DateTime<Utc>>| {
        t.map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "-".to_string())
    };
    let tokens = cache
        .total_tokens()
        .map(|n| n.to_string())
        .unwrap_or_else(|| "-".to_string());

    format!(
        "Name:         {}\n\
         Display name: {}\n\
         Model:        {}\n\
         Tokens:       {}\n\
         Created:      {}\n\
         Updated:      {}\n\
         Expires:      {}\n\
         Time left:    {}\n",
        cache.name,
        cache.display_name,
        cache.model,
        tokens,
        time(cache.create_time),
        time(cache.update_time),
        time(cache.expire_time),
        time_left(cache, now)
    )
}
